//! 数据模型模块
//!
//! 该模块定义了策略框架的核心数据模型，包括合规状态、关联对象、
//! 策略规格与状态，并提供序列化/反序列化功能。

pub mod compliance;
pub mod policy;
