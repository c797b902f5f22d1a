//! 错误处理模块

use thiserror::Error;

/// 协调过程中的错误
#[derive(Error, Debug)]
pub enum Error {
    /// 策略框架返回的错误，原样透传
    #[error(transparent)]
    Framework(#[from] policyfw_common::Error),

    /// 更新状态时的 Kubernetes API 错误
    #[error("Kubernetes API 错误: {0}")]
    Kube(#[from] kube::Error),
}

/// 协调结果类型别名
pub type Result<T> = std::result::Result<T, Error>;
