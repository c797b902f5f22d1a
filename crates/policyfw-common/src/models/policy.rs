//! 策略类型模型
//!
//! 该模块定义了策略框架中所有策略类型都应实现的规格与状态字段，
//! 以及一个通用的 `PolicyType` 自定义资源和 `PolicyTyper` 能力接口。
//! 具体的策略控制器只需在自己的资源上实现 `PolicyTyper`，即可复用框架的
//! 命名空间选择、条件更新和合规事件上报逻辑。

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::{CustomResource, Resource};
use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, ObjectValidation, Schema, SchemaObject, StringValidation};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::compliance::{ComplianceState, RelatedObject};

/// 策略 API 组
pub const POLICY_GROUP: &str = "policy.open-cluster-management.io";

/// 策略 API 版本
pub const POLICY_VERSION: &str = "v1alpha1";

/// 策略不合规时的严重程度
///
/// 大小写两种写法都被接受，CRD 校验同样允许两种写法。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(alias = "low")]
    Low,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
    #[serde(alias = "critical")]
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// 策略不合规时控制器应采取的动作
///
/// 并非所有控制器都会自动修复，即使设置为 `Enforce`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemediationAction {
    /// 仅报告
    #[serde(alias = "inform")]
    Inform,
    /// 尝试修复
    #[serde(alias = "enforce")]
    Enforce,
}

impl fmt::Display for RemediationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemediationAction::Inform => write!(f, "inform"),
            RemediationAction::Enforce => write!(f, "enforce"),
        }
    }
}

impl JsonSchema for Severity {
    fn schema_name() -> String {
        "Severity".to_string()
    }

    fn is_referenceable() -> bool {
        false
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        string_enum_schema(&[
            "low", "Low", "medium", "Medium", "high", "High", "critical", "Critical",
        ])
    }
}

impl JsonSchema for RemediationAction {
    fn schema_name() -> String {
        "RemediationAction".to_string()
    }

    fn is_referenceable() -> bool {
        false
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        string_enum_schema(&["Inform", "inform", "Enforce", "enforce"])
    }
}

fn string_enum_schema(values: &[&str]) -> Schema {
    SchemaObject {
        instance_type: Some(InstanceType::String.into()),
        enum_values: Some(values.iter().map(|v| serde_json::Value::from(*v)).collect()),
        ..Default::default()
    }
    .into()
}

/// 标签选择器：键值均为非空字符串
fn label_selector_schema(_: &mut SchemaGenerator) -> Schema {
    let value = SchemaObject {
        instance_type: Some(InstanceType::String.into()),
        string: Some(Box::new(StringValidation {
            min_length: Some(1),
            ..Default::default()
        })),
        ..Default::default()
    };

    SchemaObject {
        instance_type: Some(InstanceType::Object.into()),
        object: Some(Box::new(ObjectValidation {
            additional_properties: Some(Box::new(value.into())),
            ..Default::default()
        })),
        ..Default::default()
    }
    .into()
}

/// 命名空间选择器
///
/// `include` 与 `exclude` 中的条目均支持 UNIX 风格通配符，例如 `kube-*`
/// 同时匹配 `kube-system` 和 `kube-public`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NamespaceSelector {
    /// 策略适用的命名空间
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    /// 策略不适用的命名空间
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl NamespaceSelector {
    /// 由 include/exclude 模式构造选择器
    pub fn new<I, E, S>(include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include: include.into_iter().map(Into::into).collect(),
            exclude: exclude.into_iter().map(Into::into).collect(),
        }
    }
}

/// 所有策略类型的 spec 中都应包含的字段
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "policy.open-cluster-management.io",
    version = "v1alpha1",
    kind = "PolicyType",
    namespaced
)]
#[kube(status = "PolicyTypeStatus")]
#[kube(printcolumn = r#"{"name":"Compliance", "type":"string", "jsonPath":".status.compliant"}"#)]
#[serde(rename_all = "camelCase")]
pub struct PolicyTypeSpec {
    /// 策略不合规时的严重程度
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// 策略不合规时控制器应采取的动作
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation_action: Option<RemediationAction>,

    /// 作用于命名空间级对象时，策略适用的命名空间
    #[serde(default)]
    pub namespace_selector: NamespaceSelector,

    /// 策略适用资源必须具备的全部标签
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[schemars(schema_with = "label_selector_schema")]
    pub label_selector: BTreeMap<String, String>,
}

/// 策略状态中用于上报合规情况的字段
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyTypeStatus {
    /// 策略当前是否合规
    #[serde(rename = "compliant", default, skip_serializing_if = "Option::is_none")]
    pub compliance_state: Option<ComplianceState>,

    /// 为得出合规结论而检查的集群对象
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_objects: Vec<RelatedObject>,

    /// 对象状态的最新观察结果
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// 策略对象能力接口
///
/// 框架只通过该接口访问策略对象：元数据（名称、命名空间、ownerReferences）
/// 来自 `kube::Resource`，其余字段由各策略类型提供。
pub trait PolicyTyper: Resource<DynamicType = ()> {
    /// 框架通用的 spec 字段
    fn policy_spec(&self) -> &PolicyTypeSpec;

    /// 框架通用的 status 字段，尚未写入过状态时为 `None`
    fn policy_status(&self) -> Option<&PolicyTypeStatus>;

    /// 可写的 status 字段，不存在时初始化为默认值
    fn policy_status_mut(&mut self) -> &mut PolicyTypeStatus;

    /// 当前合规状态，未设置时为 `None`
    fn compliance_state(&self) -> Option<ComplianceState> {
        self.policy_status().and_then(|status| status.compliance_state)
    }
}

impl PolicyTyper for PolicyType {
    fn policy_spec(&self) -> &PolicyTypeSpec {
        &self.spec
    }

    fn policy_status(&self) -> Option<&PolicyTypeStatus> {
        self.status.as_ref()
    }

    fn policy_status_mut(&mut self) -> &mut PolicyTypeStatus {
        self.status.get_or_insert_with(PolicyTypeStatus::default)
    }
}
