//! 合规条件模块
//!
//! 该模块维护策略状态中的 `Compliant` 条件。遵循 Kubernetes 条件约定：
//! 每个类型至多一条记录，只有 status 改变时才刷新 lastTransitionTime，
//! 仅 reason/message 改变不会触碰时间戳，下游监听者依赖这一点避免空转更新。

use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition, Time};
use policyfw_common::{ComplianceState, PolicyTypeStatus, COMPLIANCE_CONDITION_TYPE};
use tracing::debug;

/// 条件状态 True
pub const CONDITION_TRUE: &str = "True";
/// 条件状态 False
pub const CONDITION_FALSE: &str = "False";
/// 条件状态 Unknown
pub const CONDITION_UNKNOWN: &str = "Unknown";

/// 将合规状态映射为条件状态，未设置视为 Unknown
pub fn condition_status(state: Option<ComplianceState>) -> &'static str {
    match state {
        Some(ComplianceState::Compliant) => CONDITION_TRUE,
        Some(ComplianceState::NonCompliant) => CONDITION_FALSE,
        _ => CONDITION_UNKNOWN,
    }
}

/// 按类型查找条件
pub fn find_status_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// 指定类型的条件是否存在且为 True
pub fn is_status_condition_true(conditions: &[Condition], type_: &str) -> bool {
    find_status_condition(conditions, type_).map_or(false, |c| c.status == CONDITION_TRUE)
}

/// 移除指定类型的条件，返回是否有条件被移除
pub fn remove_status_condition(conditions: &mut Vec<Condition>, type_: &str) -> bool {
    let before = conditions.len();
    conditions.retain(|c| c.type_ != type_);
    conditions.len() != before
}

/// 将新条件合并进条件列表，返回新的列表
///
/// 同类型条件不存在时追加到末尾；存在时原位更新。status 未变时保留原有的
/// lastTransitionTime 和 observedGeneration，status 改变时两者取自新条件。
/// reason 和 message 总是被覆盖。
pub fn set_status_condition(conditions: &[Condition], new_condition: Condition) -> Vec<Condition> {
    let mut merged = conditions.to_vec();

    match merged.iter_mut().find(|c| c.type_ == new_condition.type_) {
        None => merged.push(new_condition),
        Some(existing) => {
            if existing.status != new_condition.status {
                debug!(
                    "条件 {} 状态由 {} 变为 {}",
                    existing.type_, existing.status, new_condition.status
                );
                existing.status = new_condition.status;
                existing.last_transition_time = new_condition.last_transition_time;
                existing.observed_generation = new_condition.observed_generation;
            }
            existing.reason = new_condition.reason;
            existing.message = new_condition.message;
        }
    }

    merged
}

/// 根据状态中的合规结论更新 `Compliant` 条件
///
/// 条件不存在时会被初始化；status 改变时 lastTransitionTime 更新为当前时间。
pub fn upsert_compliance_condition(status: &mut PolicyTypeStatus, reason: &str, message: &str) {
    upsert_compliance_condition_at(status, reason, message, Utc::now());
}

/// 与 [`upsert_compliance_condition`] 相同，但由调用方提供当前时间
pub fn upsert_compliance_condition_at(
    status: &mut PolicyTypeStatus,
    reason: &str,
    message: &str,
    now: DateTime<Utc>,
) {
    let observed_generation =
        find_status_condition(&status.conditions, COMPLIANCE_CONDITION_TYPE).and_then(|c| c.observed_generation);

    let condition = Condition {
        type_: COMPLIANCE_CONDITION_TYPE.to_string(),
        status: condition_status(status.compliance_state).to_string(),
        reason: reason.to_string(),
        message: message.to_string(),
        last_transition_time: Time(now),
        observed_generation,
    };

    status.conditions = set_status_condition(&status.conditions, condition);
}
