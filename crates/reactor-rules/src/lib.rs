pub mod api;
pub mod audit;
pub mod db;
pub mod error;
pub mod manager;
pub mod model;
pub mod storage;
pub mod trigger;

pub use api::{RuleApi, RuleQuery};
pub use audit::{
    AuditAction, AuditEvent, AuditSink, BroadcastAuditSink, MemoryAuditSink, TracingAuditSink,
};
pub use db::{rules, SeaOrmRuleStore};
pub use error::{ConversionError, Result, RuleError, StoreError};
pub use manager::RuleLifecycleManager;
pub use model::{ActionSpec, CriteriaOperator, Criterion, Rule, TriggerRef};
pub use storage::{InMemoryRuleStore, ListOptions, RuleStore};
pub use trigger::{StaticTriggerRegistry, TriggerRegistry, SYSTEM_TRIGGER_TYPES};
