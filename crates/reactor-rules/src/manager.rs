use crate::api::{RuleApi, RuleQuery};
use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::error::{Result, RuleError, StoreError};
use crate::model::Rule;
use crate::storage::{ListOptions, RuleStore};
use crate::trigger::TriggerRegistry;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 规则生命周期管理器
///
/// 负责规则的创建、查询、更新和删除，在写入前完成校验。
/// 自身不持有可变状态，一致性由 [`RuleStore`] 保证。
#[derive(Clone)]
pub struct RuleLifecycleManager {
    store: Arc<dyn RuleStore>,
    triggers: Arc<dyn TriggerRegistry>,
    audit: Arc<dyn AuditSink>,
}

impl RuleLifecycleManager {
    pub fn new(
        store: Arc<dyn RuleStore>,
        triggers: Arc<dyn TriggerRegistry>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            triggers,
            audit,
        }
    }

    /// 按 ID 或名称获取规则
    ///
    /// 先按 ID 查询，失败后按名称查询；都找不到时返回 NotFound，
    /// `detail` 中保留按 ID 查询的失败原因。
    pub async fn get_one(&self, name_or_id: &str) -> Result<RuleApi> {
        let by_id_err = match self.resolve_by_id(name_or_id).await {
            Ok(rule) => return Ok(RuleApi::from_model(&rule)),
            Err(e) => e,
        };

        if let Some(rule) = self.resolve_by_name(name_or_id).await.into_iter().next() {
            return Ok(RuleApi::from_model(&rule));
        }

        error!(name_or_id = %name_or_id, error = %by_id_err, "Rule lookup by name or id failed");
        Err(RuleError::NotFound {
            message: format!("Rule with name or id \"{}\" not found", name_or_id),
            detail: Some(by_id_err.to_string()),
        })
    }

    /// 列出规则，按名称排序
    ///
    /// 指定 `name` 时走按名称查询，查不到返回空列表。
    pub async fn list(&self, query: RuleQuery) -> Result<Vec<RuleApi>> {
        if let Some(name) = query.name.as_deref() {
            return Ok(self
                .resolve_by_name(name)
                .await
                .iter()
                .map(RuleApi::from_model)
                .collect());
        }

        let options = ListOptions {
            offset: query.offset.unwrap_or(0),
            limit: query.limit,
        };
        let rules = self.store.list(options).await.map_err(|e| match e {
            StoreError::Validation(msg) => {
                debug!(error = %msg, "Rejected list paging parameters");
                RuleError::Validation(msg)
            }
            other => {
                error!(error = %other, "Database list of rules failed");
                RuleError::Internal(other.to_string())
            }
        })?;

        Ok(rules.iter().map(RuleApi::from_model).collect())
    }

    /// 创建规则
    pub async fn create(&self, payload: RuleApi) -> Result<RuleApi> {
        let rule = payload
            .to_model(self.triggers.as_ref())
            .await
            .map_err(|e| {
                error!(
                    rule_name = ?payload.name,
                    trigger_type = ?payload.trigger_type(),
                    error = %e,
                    "Validation failed for rule data"
                );
                RuleError::from(e)
            })?;
        debug!(rule_name = %rule.name, "Verified rule payload and formulated rule model");

        let rule = self.store.add_or_update(rule).await.map_err(|e| {
            let err = RuleError::from(e);
            match &err {
                RuleError::Conflict { conflict_id, .. } => warn!(
                    rule_name = ?payload.name,
                    conflict_id = %conflict_id,
                    "Rule creation failed with uniqueness conflict"
                ),
                other => error!(rule_name = ?payload.name, error = %other, "Rule creation failed"),
            }
            err
        })?;

        let rule_id = rule.id_string();
        info!(rule_id = %rule_id, rule_name = %rule.name, "Rule created");
        self.audit.emit(AuditEvent::new(
            AuditAction::RuleCreated,
            rule_id,
            json!({ "rule": snapshot(&rule) }),
        ));

        Ok(RuleApi::from_model(&rule))
    }

    /// 整体替换规则
    ///
    /// URI 中的 `rule_id` 为准，负载里不一致的 ID 被丢弃。
    pub async fn update(&self, rule_id: &str, payload: RuleApi) -> Result<RuleApi> {
        let old_rule = self.resolve_by_id(rule_id).await?;
        debug!(rule_id = %rule_id, rule_name = %old_rule.name, "Rule lookup for update found object");

        if let Some(payload_id) = payload
            .id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != rule_id)
        {
            warn!(
                payload_id = %payload_id,
                rule_id = %rule_id,
                "Discarding mismatched id found in payload and using uri id"
            );
        }

        let mut rule = payload
            .to_model(self.triggers.as_ref())
            .await
            .map_err(|e| {
                error!(rule_id = %rule_id, error = %e, "Validation failed for rule data");
                RuleError::from(e)
            })?;
        rule.id = old_rule.id;

        let rule = self.store.add_or_update(rule).await.map_err(|e| {
            let err = RuleError::from(e);
            error!(rule_id = %rule_id, error = %err, "Rule update failed");
            err
        })?;

        info!(rule_id = %rule_id, rule_name = %rule.name, "Rule updated");
        self.audit.emit(AuditEvent::new(
            AuditAction::RuleUpdated,
            rule.id_string(),
            json!({
                "old_rule": snapshot(&old_rule),
                "new_rule": snapshot(&rule),
            }),
        ));

        Ok(RuleApi::from_model(&rule))
    }

    /// 删除规则
    pub async fn delete(&self, rule_id: &str) -> Result<()> {
        let rule = self.resolve_by_id(rule_id).await?;
        debug!(rule_id = %rule_id, rule_name = %rule.name, "Rule lookup for delete found object");

        self.store.delete(&rule).await.map_err(|e| {
            error!(rule_id = %rule_id, error = %e, "Database delete encountered exception");
            RuleError::Internal(e.to_string())
        })?;

        info!(rule_id = %rule_id, rule_name = %rule.name, "Rule deleted");
        self.audit.emit(AuditEvent::new(
            AuditAction::RuleDeleted,
            rule.id_string(),
            json!({ "rule": snapshot(&rule) }),
        ));

        Ok(())
    }

    /// 按 ID 查询；ID 格式错误与记录不存在一律视为 NotFound
    async fn resolve_by_id(&self, rule_id: &str) -> Result<Rule> {
        self.store.get_by_id(rule_id).await.map_err(|e| {
            error!(rule_id = %rule_id, error = %e, "Database lookup for id resulted in exception");
            RuleError::not_found(e.to_string())
        })
    }

    /// 按名称查询；任何失败都返回空列表
    async fn resolve_by_name(&self, name: &str) -> Vec<Rule> {
        match self.store.get_by_name(name).await {
            Ok(rule) => vec![rule],
            Err(e) => {
                debug!(rule_name = %name, error = %e, "Database lookup for name resulted in exception");
                Vec::new()
            }
        }
    }
}

fn snapshot(rule: &Rule) -> serde_json::Value {
    serde_json::to_value(RuleApi::from_model(rule)).unwrap_or_default()
}
