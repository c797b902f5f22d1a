//! 合规事件模块
//!
//! 该模块在策略的父对象（ownerReferences 中的第一个）上创建合规事件，
//! 父策略的控制器通过识别这些事件来汇总子策略的合规状态。
//! 事件消息带有 "Compliant; " 或 "NonCompliant; " 前缀，reason 固定为
//! `policy: <namespace>/<name>`，便于父对象的监听者关联到具体的子策略。

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Client, ResourceExt};
use policyfw_common::{ComplianceState, Error, PolicyTyper, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// 合规事件消息前缀
pub const COMPLIANT_PREFIX: &str = "Compliant; ";

/// 不合规事件消息前缀
pub const NON_COMPLIANT_PREFIX: &str = "NonCompliant; ";

/// 合规事件的 action 字段
pub const COMPLIANCE_EVENT_ACTION: &str = "ComplianceStatusUpdate";

/// 事件严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComplianceEventType {
    Normal,
    Warning,
}

impl fmt::Display for ComplianceEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplianceEventType::Normal => write!(f, "Normal"),
            ComplianceEventType::Warning => write!(f, "Warning"),
        }
    }
}

impl From<ComplianceEventType> for EventType {
    fn from(value: ComplianceEventType) -> Self {
        match value {
            ComplianceEventType::Normal => EventType::Normal,
            ComplianceEventType::Warning => EventType::Warning,
        }
    }
}

/// 待发送到父对象上的合规事件
#[derive(Debug, Clone, PartialEq)]
pub struct ComplianceEvent {
    /// 父对象引用
    pub regarding: ObjectReference,
    /// 事件严重程度
    pub event_type: ComplianceEventType,
    /// `policy: <namespace>/<name>`
    pub reason: String,
    /// 带前缀的消息
    pub message: String,
}

/// 合规事件配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceEventConfig {
    /// 合规状态未知时是否按违规上报
    pub unknown_compliancy_means_violation: bool,
}

impl Default for ComplianceEventConfig {
    fn default() -> Self {
        Self {
            unknown_compliancy_means_violation: true,
        }
    }
}

/// 根据合规状态选择事件类型和消息前缀
fn classify(state: Option<ComplianceState>, config: &ComplianceEventConfig) -> (ComplianceEventType, &'static str) {
    match state {
        Some(ComplianceState::Compliant) => (ComplianceEventType::Normal, COMPLIANT_PREFIX),
        Some(ComplianceState::NonCompliant) => (ComplianceEventType::Warning, NON_COMPLIANT_PREFIX),
        _ if config.unknown_compliancy_means_violation => (ComplianceEventType::Warning, NON_COMPLIANT_PREFIX),
        _ => (ComplianceEventType::Normal, COMPLIANT_PREFIX),
    }
}

/// 计算策略对应的合规事件，策略没有 owner 时返回 `None`
///
/// 只使用第一个 ownerReference。父对象的命名空间取自子策略：
/// Kubernetes 要求命名空间级对象的 owner 位于同一命名空间。
pub fn compliance_event<P: PolicyTyper>(
    policy: &P,
    message: &str,
    config: &ComplianceEventConfig,
) -> Option<ComplianceEvent> {
    let owner = policy.owner_references().first()?;
    let namespace = policy.namespace();

    let regarding = ObjectReference {
        api_version: Some(owner.api_version.clone()),
        kind: Some(owner.kind.clone()),
        name: Some(owner.name.clone()),
        namespace: namespace.clone(),
        uid: Some(owner.uid.clone()),
        ..Default::default()
    };

    let (event_type, prefix) = classify(policy.compliance_state(), config);
    let reason = format!("policy: {}/{}", namespace.unwrap_or_default(), policy.name_any());

    Some(ComplianceEvent {
        regarding,
        event_type,
        reason,
        message: format!("{prefix}{message}"),
    })
}

/// 事件记录能力
///
/// 使用 kube 客户端时需要 events 资源的 create/patch 权限。
#[async_trait]
pub trait EventSink: Send + Sync {
    /// 在事件引用的对象上记录一条事件
    async fn record(&self, event: &ComplianceEvent) -> Result<()>;
}

/// 基于 kube-runtime `Recorder` 的事件记录器
#[derive(Clone)]
pub struct KubeEventSink {
    client: Client,
    reporter: Reporter,
}

impl KubeEventSink {
    /// 创建事件记录器，`controller_name` 作为事件的上报者
    pub fn new(client: Client, controller_name: impl Into<String>) -> Self {
        let reporter = Reporter {
            controller: controller_name.into(),
            instance: std::env::var("CONTROLLER_POD_NAME").ok(),
        };
        Self { client, reporter }
    }
}

#[async_trait]
impl EventSink for KubeEventSink {
    async fn record(&self, event: &ComplianceEvent) -> Result<()> {
        let recorder = Recorder::new(self.client.clone(), self.reporter.clone(), event.regarding.clone());
        recorder
            .publish(Event {
                type_: event.event_type.into(),
                reason: event.reason.clone(),
                note: Some(event.message.clone()),
                action: COMPLIANCE_EVENT_ACTION.to_string(),
                secondary: None,
            })
            .await
            .map_err(Error::transport)
    }
}

/// 合规事件发布器
pub struct ComplianceEventPublisher<S> {
    sink: S,
    config: ComplianceEventConfig,
}

impl<S: EventSink> ComplianceEventPublisher<S> {
    /// 创建发布器，配置在构造后不再改变
    pub fn new(sink: S, config: ComplianceEventConfig) -> Self {
        Self { sink, config }
    }

    /// 发布器配置
    pub fn config(&self) -> &ComplianceEventConfig {
        &self.config
    }

    /// 在策略的父对象上记录合规事件
    ///
    /// 没有 owner 的策略是合法的独立对象，直接返回。记录失败时原样返回错误，不重试。
    pub async fn publish<P>(&self, policy: &P, message: &str) -> Result<()>
    where
        P: PolicyTyper + Sync,
    {
        let Some(event) = compliance_event(policy, message, &self.config) else {
            debug!("策略 {} 没有 owner，跳过合规事件", policy.name_any());
            return Ok(());
        };

        if policy.owner_references().len() > 1 {
            debug!("策略 {} 有多个 owner，仅向第一个发送合规事件", policy.name_any());
        }

        self.sink.record(&event).await?;
        debug!(
            "已向 {}/{} 发送 {} 合规事件: {}",
            event.regarding.kind.as_deref().unwrap_or_default(),
            event.regarding.name.as_deref().unwrap_or_default(),
            event.event_type,
            event.reason
        );

        Ok(())
    }
}
