//! Policy Framework 控制器工具集
//!
//! 该模块为各策略控制器提供统一的合规状态上报契约：按命名空间选择器确定适用范围，
//! 在状态中维护 `Compliant` 条件，并通过事件把合规结论传递给父策略。
//! 实际的策略评估由构建在该契约之上的各个控制器负责。

pub mod config;
pub mod policy;

pub use crate::config::FrameworkConfig;
pub use policy::*;
