//! 合规状态协调模块
//!
//! 提供三个互不依赖的组件：命名空间选择、`Compliant` 条件更新、合规事件上报。
//! 它们都不持有跨调用状态，可以被不同对象的协调循环并发调用。

mod compliance_events;
mod conditions;
mod namespace_selector;

pub use compliance_events::{
    compliance_event, ComplianceEvent, ComplianceEventConfig, ComplianceEventPublisher, ComplianceEventType,
    EventSink, KubeEventSink, COMPLIANCE_EVENT_ACTION, COMPLIANT_PREFIX, NON_COMPLIANT_PREFIX,
};
pub use conditions::{
    condition_status, find_status_condition, is_status_condition_true, remove_status_condition,
    set_status_condition, upsert_compliance_condition, upsert_compliance_condition_at, CONDITION_FALSE,
    CONDITION_TRUE, CONDITION_UNKNOWN,
};
pub use namespace_selector::{get_namespaces, match_namespaces, NamespaceLister, NamespaceMatcher};
