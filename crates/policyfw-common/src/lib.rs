//! Policy Framework Common - 策略控制器共享的数据结构与错误类型
//!
//! 该模块定义了所有基于策略框架构建的控制器共用的契约：合规状态、命名空间选择器、
//! 策略规格与状态、关联对象，以及统一的错误处理机制。

pub mod error;
pub mod models;

/// 重新导出常用类型，方便使用
pub use error::Error;
pub use error::Result;
pub use models::compliance::*;
pub use models::policy::*;
