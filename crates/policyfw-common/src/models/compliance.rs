//! 合规状态模型
//!
//! 该模块定义了策略的三态合规结论、`Compliant` 条件使用的类型与原因常量，
//! 以及评估过程中检查过的集群对象（关联对象）。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// 表示策略是否合规的条件类型。使用 `status.conditions` 的策略应在该类型上报告合规状态。
pub const COMPLIANCE_CONDITION_TYPE: &str = "Compliant";

/// 集群中存在导致违规的对象。因其他原因（例如评估出错）不合规时应使用其他原因。
pub const REASON_VIOLATIONS_FOUND: &str = "ViolationsFound";

/// 策略要求的对象在集群中不存在。与 `ViolationsFound`（对象存在但不符合期望）相对。
pub const REASON_NO_COMPLIANT_OBJECTS: &str = "NoCompliantObjects";

/// 评估策略时发生错误，条件状态应为 False 或 Unknown。
pub const REASON_POLICY_ERROR: &str = "PolicyError";

/// 策略评估无误且合规，条件状态应为 True。
pub const REASON_POLICY_COMPLIANT: &str = "PolicyCompliant";

/// 合规状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ComplianceState {
    /// 合规
    Compliant,
    /// 不合规
    NonCompliant,
    /// 无法判定
    UnknownCompliancy,
}

impl fmt::Display for ComplianceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplianceState::Compliant => write!(f, "Compliant"),
            ComplianceState::NonCompliant => write!(f, "NonCompliant"),
            ComplianceState::UnknownCompliancy => write!(f, "UnknownCompliancy"),
        }
    }
}

impl FromStr for ComplianceState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "compliant" => Ok(ComplianceState::Compliant),
            "noncompliant" => Ok(ComplianceState::NonCompliant),
            "unknowncompliancy" => Ok(ComplianceState::UnknownCompliancy),
            _ => Err(Error::Config(format!("无效的合规状态: {}", s))),
        }
    }
}

/// 被引用对象的元数据
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ObjectMetadata {
    /// 对象名称
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// 对象所在命名空间，集群级对象为空
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

/// 评估过程中处理的集群对象
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMetadata,
}

/// 关联对象：为得出合规结论而检查过的集群对象及其单独的合规结论
///
/// 列表由具体控制器在每次评估时整体重建，框架本身不修改它。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RelatedObject {
    #[serde(default)]
    pub object: ObjectRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliant: Option<ComplianceState>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

impl RelatedObject {
    /// 返回用于排序的键：apiVersion + kind + namespace + name + reason
    pub fn sort_string(&self) -> String {
        let object = &self.object;
        format!(
            "{}{}{}{}{}",
            object.api_version, object.kind, object.metadata.namespace, object.metadata.name, self.reason
        )
    }
}

/// 按排序键对关联对象做稳定排序，便于比较差异与展示
pub fn sort_related_objects(objects: &mut [RelatedObject]) {
    objects.sort_by_cached_key(RelatedObject::sort_string);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn related(api_version: &str, kind: &str, namespace: &str, name: &str, reason: &str) -> RelatedObject {
        RelatedObject {
            object: ObjectRef {
                api_version: api_version.to_string(),
                kind: kind.to_string(),
                metadata: ObjectMetadata {
                    name: name.to_string(),
                    namespace: namespace.to_string(),
                },
            },
            compliant: Some(ComplianceState::NonCompliant),
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_compliance_state_parse() {
        assert_eq!("Compliant".parse::<ComplianceState>().unwrap(), ComplianceState::Compliant);
        assert_eq!("noncompliant".parse::<ComplianceState>().unwrap(), ComplianceState::NonCompliant);
        assert_eq!(
            "UnknownCompliancy".parse::<ComplianceState>().unwrap(),
            ComplianceState::UnknownCompliancy
        );
        assert!("maybe".parse::<ComplianceState>().is_err());
    }

    #[test]
    fn test_compliance_state_serde() {
        let json = serde_json::to_string(&ComplianceState::NonCompliant).unwrap();
        assert_eq!(json, "\"NonCompliant\"");
        let state: ComplianceState = serde_json::from_str("\"UnknownCompliancy\"").unwrap();
        assert_eq!(state, ComplianceState::UnknownCompliancy);
    }

    #[test]
    fn test_sort_string() {
        let obj = related("v1", "ConfigMap", "default", "settings", "found");
        assert_eq!(obj.sort_string(), "v1ConfigMapdefaultsettingsfound");
    }

    #[test]
    fn test_sort_related_objects_is_deterministic() {
        let mut objects = vec![
            related("v1", "Secret", "default", "b", "found"),
            related("v1", "ConfigMap", "kube-system", "a", "found"),
            related("v1", "ConfigMap", "default", "z", "missing"),
            related("apps/v1", "Deployment", "default", "web", "found"),
        ];
        sort_related_objects(&mut objects);

        let names: Vec<&str> = objects.iter().map(|o| o.object.metadata.name.as_str()).collect();
        assert_eq!(names, vec!["web", "z", "a", "b"]);
    }

    #[test]
    fn test_related_object_wire_format() {
        let obj = related("v1", "Pod", "default", "nginx", "found");
        let value = serde_json::to_value(&obj).unwrap();
        assert_eq!(value["object"]["apiVersion"], "v1");
        assert_eq!(value["object"]["metadata"]["namespace"], "default");
        assert_eq!(value["compliant"], "NonCompliant");
    }
}
