use super::converter::to_active_model;
use super::rules;
use crate::error::StoreError;
use crate::model::Rule;
use crate::storage::{duplicate_name_message, parse_id, ListOptions, RuleStore, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Schema, SqlErr,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 基于 SeaORM 的规则存储
///
/// 名称唯一性由 `rules.name` 上的唯一索引保证。
pub struct SeaOrmRuleStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmRuleStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 创建 `rules` 表（已存在则跳过）
    pub async fn setup_schema(&self) -> Result<(), DbErr> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);
        let mut stmt = schema.create_table_from_entity(rules::Entity);
        stmt.if_not_exists();
        self.db.execute(backend.build(&stmt)).await?;

        info!("Rule table ready");
        Ok(())
    }

    async fn find_model_by_name(&self, name: &str) -> StoreResult<Option<rules::Model>> {
        Ok(rules::Entity::find()
            .filter(rules::Column::Name.eq(name))
            .one(&*self.db)
            .await?)
    }

    /// 把唯一索引冲突转换为携带冲突 ID 的错误
    async fn map_write_error(&self, err: DbErr, rule: &Rule) -> StoreError {
        if !matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            return StoreError::Database(err);
        }

        match self.find_model_by_name(&rule.name).await {
            Ok(Some(holder)) => {
                warn!(rule_name = %rule.name, conflict_id = %holder.id, "Rule name already taken");
                StoreError::conflict(holder.id, duplicate_name_message(&rule.name))
            }
            Ok(None) => StoreError::Database(err),
            Err(lookup_err) => lookup_err,
        }
    }
}

#[async_trait]
impl RuleStore for SeaOrmRuleStore {
    async fn add_or_update(&self, mut rule: Rule) -> StoreResult<Rule> {
        if rule.name.is_empty() {
            return Err(StoreError::Validation("rule name must not be empty".to_string()));
        }

        let id = rule.id.unwrap_or_else(Uuid::new_v4);
        let existing = rules::Entity::find_by_id(id.to_string())
            .one(&*self.db)
            .await?;

        let now = Utc::now();
        rule.id = Some(id);
        rule.created_at = existing.as_ref().map(|m| m.created_at).unwrap_or(now);
        rule.updated_at = now;

        let active_model = to_active_model(&rule)?;
        let result = if existing.is_some() {
            active_model.update(&*self.db).await.map(|_| ())
        } else {
            rules::Entity::insert(active_model)
                .exec(&*self.db)
                .await
                .map(|_| ())
        };

        match result {
            Ok(()) => {
                debug!(rule_id = %id, rule_name = %rule.name, replaced = existing.is_some(), "Rule saved");
                Ok(rule)
            }
            Err(err) => Err(self.map_write_error(err, &rule).await),
        }
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Rule> {
        let uuid = parse_id(id)?;
        let model = rules::Entity::find_by_id(uuid.to_string())
            .one(&*self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("id={}", id)))?;
        Rule::try_from(model)
    }

    async fn get_by_name(&self, name: &str) -> StoreResult<Rule> {
        let model = self
            .find_model_by_name(name)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("name={}", name)))?;
        Rule::try_from(model)
    }

    async fn delete(&self, rule: &Rule) -> StoreResult<()> {
        let id = rule
            .id
            .ok_or_else(|| StoreError::InvalidId("rule has no id".to_string()))?;

        let result = rules::Entity::delete_by_id(id.to_string())
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("id={}", id)));
        }
        Ok(())
    }

    async fn list(&self, options: ListOptions) -> StoreResult<Vec<Rule>> {
        options.validate()?;
        let mut query = rules::Entity::find().order_by_asc(rules::Column::Name);
        if options.offset > 0 {
            // SQLite 的 OFFSET 必须带 LIMIT
            query = query
                .offset(options.offset)
                .limit(options.limit.unwrap_or(i64::MAX as u64));
        } else if let Some(limit) = options.limit {
            query = query.limit(limit);
        }
        let models = query.all(&*self.db).await?;

        models.into_iter().map(Rule::try_from).collect()
    }
}
