use crate::error::StoreError;
use crate::model::Rule;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// 分页参数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub offset: u64,
    pub limit: Option<u64>,
}

impl ListOptions {
    /// 数据库的 OFFSET/LIMIT 为有符号 64 位整数，超出范围直接拒绝
    pub fn validate(&self) -> StoreResult<()> {
        check_page_value("offset", self.offset)?;
        if let Some(limit) = self.limit {
            check_page_value("limit", limit)?;
        }
        Ok(())
    }
}

fn check_page_value(field: &str, value: u64) -> StoreResult<()> {
    i64::try_from(value).map(|_| ()).map_err(|_| {
        StoreError::Validation(format!("{} must be at most {}, got {}", field, i64::MAX, value))
    })
}

/// 规则存储
///
/// 唯一性与替换的原子性由实现保证，调用方不加锁。
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// 插入新规则或按 ID 整体替换已有规则
    ///
    /// 未携带 ID 的规则会被分配新 ID。名称与其他规则重复时返回
    /// [`StoreError::Conflict`]，冲突 ID 为已占用该名称的规则。
    async fn add_or_update(&self, rule: Rule) -> StoreResult<Rule>;

    /// 按 ID 查询；ID 格式不合法返回 [`StoreError::InvalidId`]
    async fn get_by_id(&self, id: &str) -> StoreResult<Rule>;

    async fn get_by_name(&self, name: &str) -> StoreResult<Rule>;

    async fn delete(&self, rule: &Rule) -> StoreResult<()>;

    /// 按名称排序列出规则
    async fn list(&self, options: ListOptions) -> StoreResult<Vec<Rule>>;
}

pub(crate) fn parse_id(id: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(id)
        .map_err(|e| StoreError::InvalidId(format!("'{}' is not a valid rule id: {}", id, e)))
}

pub(crate) fn duplicate_name_message(name: &str) -> String {
    format!("Tried to save duplicate unique keys. Rule name '{}' already exists", name)
}

/// 规则存储（内存实现）
pub struct InMemoryRuleStore {
    rules: Arc<RwLock<HashMap<Uuid, Rule>>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.rules.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rules.read().await.is_empty()
    }
}

impl Default for InMemoryRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn add_or_update(&self, mut rule: Rule) -> StoreResult<Rule> {
        if rule.name.is_empty() {
            return Err(StoreError::Validation("rule name must not be empty".to_string()));
        }

        // 唯一性检查和写入在同一把写锁内完成
        let mut rules = self.rules.write().await;
        let id = rule.id.unwrap_or_else(Uuid::new_v4);

        if let Some(holder) = rules
            .values()
            .find(|r| r.name == rule.name && r.id != Some(id))
        {
            return Err(StoreError::conflict(
                holder.id_string(),
                duplicate_name_message(&rule.name),
            ));
        }

        let now = Utc::now();
        rule.id = Some(id);
        rule.created_at = rules.get(&id).map(|r| r.created_at).unwrap_or(now);
        rule.updated_at = now;
        rules.insert(id, rule.clone());

        Ok(rule)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Rule> {
        let uuid = parse_id(id)?;
        let rules = self.rules.read().await;
        rules
            .get(&uuid)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("id={}", id)))
    }

    async fn get_by_name(&self, name: &str) -> StoreResult<Rule> {
        let rules = self.rules.read().await;
        rules
            .values()
            .find(|r| r.name == name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("name={}", name)))
    }

    async fn delete(&self, rule: &Rule) -> StoreResult<()> {
        let id = rule
            .id
            .ok_or_else(|| StoreError::InvalidId("rule has no id".to_string()))?;
        let mut rules = self.rules.write().await;
        rules
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("id={}", id)))
    }

    async fn list(&self, options: ListOptions) -> StoreResult<Vec<Rule>> {
        options.validate()?;
        let rules = self.rules.read().await;
        let mut sorted: Vec<Rule> = rules.values().cloned().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let limit = options.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(sorted
            .into_iter()
            .skip(options.offset as usize)
            .take(limit)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionSpec, TriggerRef};

    fn rule(name: &str) -> Rule {
        Rule::new(
            name,
            TriggerRef::new("core.st2.generic"),
            ActionSpec::new("core.local"),
        )
    }

    #[tokio::test]
    async fn test_add_assigns_id() {
        let store = InMemoryRuleStore::new();
        let saved = store.add_or_update(rule("r1")).await.unwrap();

        let id = saved.id.expect("id assigned");
        let found = store.get_by_id(&id.to_string()).await.unwrap();
        assert_eq!(found.name, "r1");
        assert_eq!(store.get_by_name("r1").await.unwrap().id, Some(id));
    }

    #[tokio::test]
    async fn test_update_replaces_record() {
        let store = InMemoryRuleStore::new();
        let saved = store.add_or_update(rule("r1")).await.unwrap();

        let mut replacement = rule("r1-renamed");
        replacement.id = saved.id;
        replacement.enabled = false;
        let updated = store.add_or_update(replacement).await.unwrap();

        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.created_at, saved.created_at);
        assert_eq!(store.len().await, 1);
        assert!(store.get_by_name("r1").await.is_err());
        assert!(!store.get_by_name("r1-renamed").await.unwrap().enabled);
    }

    #[tokio::test]
    async fn test_duplicate_name_conflict() {
        let store = InMemoryRuleStore::new();
        let original = store.add_or_update(rule("r1")).await.unwrap();

        match store.add_or_update(rule("r1")).await {
            Err(StoreError::Conflict { conflict_id, .. }) => {
                assert_eq!(conflict_id, original.id_string())
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_and_missing_id() {
        let store = InMemoryRuleStore::new();
        assert!(matches!(
            store.get_by_id("not-a-uuid").await,
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(
            store.get_by_id(&Uuid::new_v4().to_string()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_sorted_and_paged() {
        let store = InMemoryRuleStore::new();
        for name in ["charlie", "alpha", "bravo"] {
            store.add_or_update(rule(name)).await.unwrap();
        }

        let all = store.list(ListOptions::default()).await.unwrap();
        let names: Vec<_> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "bravo", "charlie"]);

        let page = store
            .list(ListOptions {
                offset: 1,
                limit: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "bravo");
    }

    #[tokio::test]
    async fn test_list_rejects_out_of_range_paging() {
        let store = InMemoryRuleStore::new();
        store.add_or_update(rule("r1")).await.unwrap();

        for options in [
            ListOptions {
                offset: u64::MAX,
                limit: None,
            },
            ListOptions {
                offset: 0,
                limit: Some(i64::MAX as u64 + 1),
            },
        ] {
            assert!(matches!(
                store.list(options).await,
                Err(StoreError::Validation(_))
            ));
        }

        let all = store
            .list(ListOptions {
                offset: 0,
                limit: Some(i64::MAX as u64),
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryRuleStore::new();
        let saved = store.add_or_update(rule("r1")).await.unwrap();

        store.delete(&saved).await.unwrap();
        assert!(store.is_empty().await);
        assert!(matches!(
            store.delete(&saved).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
