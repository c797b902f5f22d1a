//! 错误处理模块
//!
//! 策略框架只区分两类运行期错误：通配符模式非法（致命的配置错误），
//! 以及注入的读写能力（列举命名空间、发送事件、更新状态）失败。
//! 两者都原样返回给外部协调循环，由其决定重试策略。

use thiserror::Error;

/// 策略框架统一错误类型
#[derive(Error, Debug)]
pub enum Error {
    /// 命名空间选择器中的通配符模式不合法
    #[error("无效的命名空间匹配模式 {pattern:?}: {source}")]
    Pattern {
        /// 出错的原始模式
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// 外部读写能力失败，错误信息原样透传
    #[error(transparent)]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    /// 启动配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl Error {
    /// 包装外部能力（Kubernetes API、事件记录器等）返回的错误
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Transport(err.into())
    }

    /// 是否为通配符模式错误
    pub fn is_pattern(&self) -> bool {
        matches!(self, Error::Pattern { .. })
    }

    /// 是否为外部能力错误
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// 策略框架结果类型别名
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_is_verbatim() {
        let err = Error::transport("namespaces is forbidden");
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "namespaces is forbidden");
    }

    #[test]
    fn test_pattern_error_keeps_pattern() {
        let source = glob::Pattern::new("[kube").unwrap_err();
        let err = Error::Pattern {
            pattern: "[kube".to_string(),
            source,
        };
        assert!(err.is_pattern());
        assert!(err.to_string().contains("\"[kube\""));
    }
}
