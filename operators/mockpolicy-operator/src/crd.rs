//! 自定义资源定义模块
//!
//! 该模块定义了 MockPolicy 自定义资源。它在 spec/status 中内嵌策略框架的通用字段，
//! 并通过 `foo` 字段控制参考控制器的行为，用于验证框架的各项能力。

use kube::CustomResource;
use policyfw_common::{PolicyTypeSpec, PolicyTypeStatus, PolicyTyper};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// MockPolicy 规范
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "policy.open-cluster-management.io",
    version = "v1alpha1",
    kind = "MockPolicy",
    namespaced
)]
#[kube(status = "MockPolicyStatus")]
#[kube(printcolumn = r#"{"name":"Compliance", "type":"string", "jsonPath":".status.compliant"}"#)]
pub struct MockPolicySpec {
    /// 策略框架通用字段
    #[serde(flatten)]
    pub policy: PolicyTypeSpec,

    /// 控制器行为：nstest、compliant、noncompliant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foo: Option<String>,
}

/// MockPolicy 状态
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct MockPolicyStatus {
    /// 策略框架通用字段
    #[serde(flatten)]
    pub policy: PolicyTypeStatus,

    /// nstest 模式下选中的命名空间，以逗号分隔
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

impl PolicyTyper for MockPolicy {
    fn policy_spec(&self) -> &PolicyTypeSpec {
        &self.spec.policy
    }

    fn policy_status(&self) -> Option<&PolicyTypeStatus> {
        self.status.as_ref().map(|status| &status.policy)
    }

    fn policy_status_mut(&mut self) -> &mut PolicyTypeStatus {
        &mut self.status.get_or_insert_with(MockPolicyStatus::default).policy
    }
}
