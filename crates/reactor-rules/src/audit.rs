use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::info;

/// 审计动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "rule.created")]
    RuleCreated,
    #[serde(rename = "rule.updated")]
    RuleUpdated,
    #[serde(rename = "rule.deleted")]
    RuleDeleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::RuleCreated => "rule.created",
            AuditAction::RuleUpdated => "rule.updated",
            AuditAction::RuleDeleted => "rule.deleted",
        }
    }
}

/// 审计事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub action: AuditAction,

    /// 被操作规则的 ID
    pub subject_id: String,

    /// 附加上下文（规则快照等）
    pub context: Value,

    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, subject_id: impl Into<String>, context: Value) -> Self {
        Self {
            action,
            subject_id: subject_id.into(),
            context,
            timestamp: Utc::now(),
        }
    }
}

/// 审计接收端
///
/// 发送即返回，接收端的失败不会影响规则操作的结果。
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

/// 写入 `audit` target 的 tracing 日志
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        info!(
            target: "audit",
            action = event.action.as_str(),
            subject_id = %event.subject_id,
            context = %event.context,
            "{} {}",
            event.action.as_str(),
            event.subject_id
        );
    }
}

/// 通过广播通道分发审计事件
#[derive(Clone)]
pub struct BroadcastAuditSink {
    sender: broadcast::Sender<AuditEvent>,
}

impl BroadcastAuditSink {
    /// `capacity` 为 0 时按 1 处理
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.sender.subscribe()
    }
}

impl AuditSink for BroadcastAuditSink {
    fn emit(&self, event: AuditEvent) {
        // 没有订阅者时发送失败，直接丢弃
        let _ = self.sender.send(event);
    }
}

/// 内存审计接收端，记录所有事件
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn actions(&self) -> Vec<AuditAction> {
        self.events().iter().map(|e| e.action).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::time::{timeout, Duration};

    #[test]
    fn test_action_serialization() {
        let event = AuditEvent::new(AuditAction::RuleDeleted, "abc", json!({}));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["action"], "rule.deleted");
        assert_eq!(value["subject_id"], "abc");
    }

    #[test]
    fn test_memory_sink_records() {
        let sink = MemoryAuditSink::new();
        sink.emit(AuditEvent::new(AuditAction::RuleCreated, "1", json!({})));
        sink.emit(AuditEvent::new(AuditAction::RuleUpdated, "1", json!({})));
        assert_eq!(
            sink.actions(),
            vec![AuditAction::RuleCreated, AuditAction::RuleUpdated]
        );
    }

    #[tokio::test]
    async fn test_broadcast_sink() {
        let sink = BroadcastAuditSink::new(8);
        let mut rx = sink.subscribe();

        sink.emit(AuditEvent::new(AuditAction::RuleCreated, "r1", json!({"name": "r1"})));

        let event = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("Timeout waiting for audit event")
            .expect("Failed to receive audit event");
        assert_eq!(event.action, AuditAction::RuleCreated);
        assert_eq!(event.context["name"], "r1");
    }

    #[tokio::test]
    async fn test_broadcast_zero_capacity() {
        let sink = BroadcastAuditSink::new(0);
        let mut rx = sink.subscribe();

        sink.emit(AuditEvent::new(AuditAction::RuleUpdated, "r1", json!({})));

        let event = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("Timeout waiting for audit event")
            .expect("Failed to receive audit event");
        assert_eq!(event.action, AuditAction::RuleUpdated);
    }

    #[test]
    fn test_broadcast_without_subscribers() {
        let sink = BroadcastAuditSink::new(8);
        sink.emit(AuditEvent::new(AuditAction::RuleDeleted, "r1", json!({})));
    }
}
