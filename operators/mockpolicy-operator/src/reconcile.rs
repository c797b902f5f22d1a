//! 资源协调模块
//!
//! 该模块实现 MockPolicy 的协调逻辑：根据 `foo` 字段选择命名空间或设置合规状态，
//! 更新 `Compliant` 条件并写回状态，最后向父策略发送合规事件。

use chrono::{DateTime, Utc};
use kube::{
    api::{Api, Patch, PatchParams},
    client::Client,
    runtime::controller::Action,
    ResourceExt,
};
use policyfw_common::{
    ComplianceState, REASON_POLICY_COMPLIANT, REASON_POLICY_ERROR, REASON_VIOLATIONS_FOUND,
};
use policyfw_controller::{
    get_namespaces, upsert_compliance_condition_at, ComplianceEventPublisher, KubeEventSink, NamespaceLister,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::crd::{MockPolicy, MockPolicyStatus};
use crate::error::Result;

/// 发送到父策略的合规事件消息
pub const COMPLIANCE_EVENT_MESSAGE: &str = "because test";

/// 协调成功后的重新检查间隔
const REQUEUE_INTERVAL: Duration = Duration::from_secs(300);

/// 协调失败后的重试间隔
const ERROR_REQUEUE_INTERVAL: Duration = Duration::from_secs(60);

/// 协调器共享上下文
pub struct Context {
    /// Kubernetes 客户端
    pub client: Client,
    /// 合规事件发布器
    pub publisher: ComplianceEventPublisher<KubeEventSink>,
}

/// 根据合规状态选择 `Compliant` 条件的原因和消息
fn condition_reason(state: Option<ComplianceState>) -> (&'static str, &'static str) {
    match state {
        Some(ComplianceState::Compliant) => (REASON_POLICY_COMPLIANT, "MockPolicy 合规"),
        Some(ComplianceState::NonCompliant) => (REASON_VIOLATIONS_FOUND, "MockPolicy 存在违规"),
        _ => (REASON_POLICY_ERROR, "MockPolicy 合规状态未知"),
    }
}

/// 评估策略并计算新的状态
pub async fn evaluate<L>(policy: &MockPolicy, lister: &L, now: DateTime<Utc>) -> Result<MockPolicyStatus>
where
    L: NamespaceLister + ?Sized,
{
    let mut status = policy.status.clone().unwrap_or_default();

    match policy.spec.foo.as_deref() {
        Some("nstest") => {
            let selected = get_namespaces(lister, &policy.spec.policy.namespace_selector).await?;
            status.debug = Some(selected.join(","));
        }
        Some("compliant") => status.policy.compliance_state = Some(ComplianceState::Compliant),
        Some("noncompliant") => status.policy.compliance_state = Some(ComplianceState::NonCompliant),
        other => debug!("未知的 foo 取值 {:?}，保持当前合规状态", other),
    }

    let (reason, message) = condition_reason(status.policy.compliance_state);
    upsert_compliance_condition_at(&mut status.policy, reason, message, now);

    Ok(status)
}

/// 一次协调的状态写回计划
pub struct StatusUpdate {
    /// 需要提交的 merge patch，状态未变化时为 `None`
    pub patch: Option<serde_json::Value>,
    /// 带有新状态的策略对象，合规事件基于它生成
    pub policy: MockPolicy,
}

/// 比较新旧状态，决定是否需要写回
///
/// 无论是否写回，返回的策略对象都携带新状态。
pub fn plan_status_update(policy: &MockPolicy, status: MockPolicyStatus) -> StatusUpdate {
    let patch = (policy.status.as_ref() != Some(&status)).then(|| serde_json::json!({ "status": status }));
    let mut updated = policy.clone();
    updated.status = Some(status);
    StatusUpdate { patch, policy: updated }
}

/// 协调 MockPolicy 资源
pub async fn reconcile(policy: Arc<MockPolicy>, ctx: Arc<Context>) -> Result<Action> {
    let name = policy.name_any();
    let namespace = policy.namespace().unwrap_or_else(|| "default".into());

    info!("协调 MockPolicy {}/{}", namespace, name);

    let status = evaluate(&policy, &ctx.client, Utc::now()).await?;
    let update = plan_status_update(&policy, status);

    match update.patch {
        Some(patch) => {
            let api: Api<MockPolicy> = Api::namespaced(ctx.client.clone(), &namespace);
            api.patch_status(&name, &PatchParams::default(), &Patch::Merge(patch))
                .await?;
            info!("已更新 MockPolicy {}/{} 的状态", namespace, name);
        }
        None => debug!("MockPolicy {}/{} 状态未变化，无需更新", namespace, name),
    }

    ctx.publisher.publish(&update.policy, COMPLIANCE_EVENT_MESSAGE).await?;

    Ok(Action::requeue(REQUEUE_INTERVAL))
}

/// 处理协调错误
pub fn error_policy(policy: Arc<MockPolicy>, error: &crate::error::Error, _ctx: Arc<Context>) -> Action {
    let name = policy.name_any();
    let namespace = policy.namespace().unwrap_or_else(|| "default".into());

    error!("协调 MockPolicy {}/{} 失败: {}", namespace, name, error);

    Action::requeue(ERROR_REQUEUE_INTERVAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use policyfw_common::{NamespaceSelector, PolicyTyper, COMPLIANCE_CONDITION_TYPE};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
    use policyfw_controller::{compliance_event, find_status_condition, ComplianceEventConfig, ComplianceEventType};

    use crate::crd::MockPolicySpec;

    struct StaticLister(Vec<&'static str>);

    #[async_trait]
    impl NamespaceLister for StaticLister {
        async fn list_namespaces(&self) -> policyfw_common::Result<Vec<String>> {
            Ok(self.0.iter().map(|ns| ns.to_string()).collect())
        }
    }

    struct BrokenLister;

    #[async_trait]
    impl NamespaceLister for BrokenLister {
        async fn list_namespaces(&self) -> policyfw_common::Result<Vec<String>> {
            Err(policyfw_common::Error::transport("namespaces is forbidden"))
        }
    }

    fn mock_policy(foo: &str, include: &[&str], exclude: &[&str]) -> MockPolicy {
        let mut spec = MockPolicySpec {
            foo: Some(foo.to_string()),
            ..Default::default()
        };
        spec.policy.namespace_selector = NamespaceSelector::new(include.to_vec(), exclude.to_vec());
        let mut policy = MockPolicy::new(foo, spec);
        policy.metadata.namespace = Some("default".to_string());
        policy
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test_log::test(tokio::test)]
    async fn test_nstest_records_selected_namespaces() {
        let lister = StaticLister(vec!["default", "foo", "bar", "kube-test", "openshift"]);
        let policy = mock_policy("nstest", &["*"], &["kube-*", "openshift", "default"]);

        let status = evaluate(&policy, &lister, now()).await.unwrap();

        assert_eq!(status.debug.as_deref(), Some("foo,bar"));
        assert_eq!(status.policy.compliance_state, None);
        let cond = find_status_condition(&status.policy.conditions, COMPLIANCE_CONDITION_TYPE).unwrap();
        assert_eq!(cond.status, "Unknown");
        assert_eq!(cond.reason, REASON_POLICY_ERROR);
    }

    #[test_log::test(tokio::test)]
    async fn test_compliant_sets_state_and_condition() {
        let policy = mock_policy("compliant", &["*"], &[]);

        let status = evaluate(&policy, &BrokenLister, now()).await.unwrap();

        assert_eq!(status.policy.compliance_state, Some(ComplianceState::Compliant));
        let cond = find_status_condition(&status.policy.conditions, COMPLIANCE_CONDITION_TYPE).unwrap();
        assert_eq!(cond.status, "True");
        assert_eq!(cond.reason, REASON_POLICY_COMPLIANT);
    }

    #[test_log::test(tokio::test)]
    async fn test_repeated_evaluation_is_stable() {
        let mut policy = mock_policy("noncompliant", &["*"], &[]);
        let first = evaluate(&policy, &BrokenLister, now()).await.unwrap();
        policy.status = Some(first.clone());

        let second = evaluate(&policy, &BrokenLister, now() + chrono::Duration::minutes(5))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(policy.compliance_state(), Some(ComplianceState::NonCompliant));
    }

    #[test_log::test(tokio::test)]
    async fn test_nstest_surfaces_listing_error() {
        let policy = mock_policy("nstest", &["*"], &[]);
        let err = evaluate(&policy, &BrokenLister, now()).await.unwrap_err();
        assert_eq!(err.to_string(), "namespaces is forbidden");
    }

    #[test_log::test(tokio::test)]
    async fn test_nstest_surfaces_pattern_error() {
        let lister = StaticLister(vec!["default"]);
        let policy = mock_policy("nstest", &["[default"], &[]);
        let err = evaluate(&policy, &lister, now()).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Framework(ref e) if e.is_pattern()));
    }

    fn owned(mut policy: MockPolicy) -> MockPolicy {
        policy.metadata.owner_references = Some(vec![OwnerReference {
            api_version: "policy.open-cluster-management.io/v1".to_string(),
            kind: "Policy".to_string(),
            name: "parent".to_string(),
            uid: "08bae967-4262-498a-84e9-d1f0e321b41e".to_string(),
            ..Default::default()
        }]);
        policy
    }

    #[test_log::test(tokio::test)]
    async fn test_unchanged_status_skips_patch_but_still_emits_event() {
        let mut policy = owned(mock_policy("noncompliant", &["*"], &[]));
        let first = evaluate(&policy, &BrokenLister, now()).await.unwrap();
        policy.status = Some(first);

        let second = evaluate(&policy, &BrokenLister, now() + chrono::Duration::minutes(5))
            .await
            .unwrap();
        let update = plan_status_update(&policy, second.clone());

        assert!(update.patch.is_none());
        assert_eq!(update.policy.status, Some(second));

        let event = compliance_event(&update.policy, COMPLIANCE_EVENT_MESSAGE, &ComplianceEventConfig::default())
            .unwrap();
        assert_eq!(event.event_type, ComplianceEventType::Warning);
        assert_eq!(event.reason, "policy: default/noncompliant");
        assert_eq!(event.message, "NonCompliant; because test");
    }

    #[test_log::test(tokio::test)]
    async fn test_changed_status_produces_merge_patch() {
        let policy = owned(mock_policy("compliant", &["*"], &[]));
        let status = evaluate(&policy, &BrokenLister, now()).await.unwrap();

        let update = plan_status_update(&policy, status.clone());

        let patch = update.patch.unwrap();
        assert_eq!(patch["status"]["compliant"], "Compliant");
        assert_eq!(patch, serde_json::json!({ "status": status }));
        assert_eq!(update.policy.status, Some(status));

        let event = compliance_event(&update.policy, COMPLIANCE_EVENT_MESSAGE, &ComplianceEventConfig::default())
            .unwrap();
        assert_eq!(event.event_type, ComplianceEventType::Normal);
        assert_eq!(event.message, "Compliant; because test");
    }
}
