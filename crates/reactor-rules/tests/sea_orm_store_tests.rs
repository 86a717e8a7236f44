use reactor_rules::{
    ActionSpec, CriteriaOperator, Criterion, ListOptions, MemoryAuditSink, Rule, RuleError,
    RuleLifecycleManager, RuleQuery, RuleStore, SeaOrmRuleStore, StaticTriggerRegistry,
    StoreError, TriggerRef,
};
use sea_orm::{Database, DatabaseConnection};
use serde_json::json;
use std::sync::Arc;

/// 创建测试用的 SQLite 内存数据库
async fn create_test_store() -> SeaOrmRuleStore {
    let db: DatabaseConnection = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    let store = SeaOrmRuleStore::new(Arc::new(db));
    store.setup_schema().await.expect("Failed to create rules table");
    store
}

fn rule(name: &str) -> Rule {
    let mut rule = Rule::new(
        name,
        TriggerRef::new("core.st2.generic"),
        ActionSpec::new("core.local"),
    );
    rule.action
        .parameters
        .insert("cmd".to_string(), json!("echo hello"));
    rule.criteria.insert(
        "trigger.value".to_string(),
        Criterion {
            operator: CriteriaOperator::Equals,
            pattern: Some(json!("on")),
        },
    );
    rule
}

#[tokio::test]
async fn test_setup_schema_is_idempotent() {
    let store = create_test_store().await;
    store.setup_schema().await.unwrap();
}

#[tokio::test]
async fn test_insert_and_lookup() {
    let store = create_test_store().await;
    let saved = store.add_or_update(rule("r1")).await.unwrap();
    let id = saved.id.expect("id assigned").to_string();

    let by_id = store.get_by_id(&id).await.unwrap();
    assert_eq!(by_id.name, "r1");
    assert_eq!(by_id.action.parameters["cmd"], "echo hello");
    assert_eq!(
        by_id.criteria["trigger.value"].operator,
        CriteriaOperator::Equals
    );

    let by_name = store.get_by_name("r1").await.unwrap();
    assert_eq!(by_name.id, saved.id);
}

#[tokio::test]
async fn test_update_replaces_record() {
    let store = create_test_store().await;
    let saved = store.add_or_update(rule("r1")).await.unwrap();

    let mut replacement = rule("r1");
    replacement.id = saved.id;
    replacement.description = "replaced".to_string();
    replacement.criteria.clear();
    store.add_or_update(replacement).await.unwrap();

    let stored = store.get_by_id(&saved.id_string()).await.unwrap();
    assert_eq!(stored.description, "replaced");
    assert!(stored.criteria.is_empty());
    assert_eq!(store.list(ListOptions::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_name_reports_conflict_id() {
    let store = create_test_store().await;
    let original = store.add_or_update(rule("r1")).await.unwrap();

    match store.add_or_update(rule("r1")).await {
        Err(StoreError::Conflict { conflict_id, .. }) => {
            assert_eq!(conflict_id, original.id_string())
        }
        other => panic!("expected conflict, got {:?}", other),
    }
    assert_eq!(store.list(ListOptions::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_lookup_errors() {
    let store = create_test_store().await;
    assert!(matches!(
        store.get_by_id("12345").await,
        Err(StoreError::InvalidId(_))
    ));
    assert!(matches!(
        store.get_by_id(&uuid::Uuid::new_v4().to_string()).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.get_by_name("missing").await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_and_delete() {
    let store = create_test_store().await;
    for name in ["gamma", "alpha", "beta"] {
        store.add_or_update(rule(name)).await.unwrap();
    }

    let page = store
        .list(ListOptions {
            offset: 1,
            limit: None,
        })
        .await
        .unwrap();
    let names: Vec<_> = page.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["beta", "gamma"]);

    let alpha = store.get_by_name("alpha").await.unwrap();
    store.delete(&alpha).await.unwrap();
    assert!(matches!(store.delete(&alpha).await, Err(StoreError::NotFound(_))));
    assert_eq!(store.list(ListOptions::default()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_rejects_out_of_range_paging() {
    let store = create_test_store().await;
    store.add_or_update(rule("r1")).await.unwrap();

    for options in [
        ListOptions {
            offset: 0,
            limit: Some(u64::MAX),
        },
        ListOptions {
            offset: u64::MAX,
            limit: None,
        },
        ListOptions {
            offset: i64::MAX as u64 + 1,
            limit: Some(10),
        },
    ] {
        assert!(matches!(
            store.list(options).await,
            Err(StoreError::Validation(_))
        ));
    }

    let rules = store
        .list(ListOptions {
            offset: 0,
            limit: Some(i64::MAX as u64),
        })
        .await
        .unwrap();
    assert_eq!(rules.len(), 1);
}

#[tokio::test]
async fn test_manager_list_out_of_range_paging_is_validation() {
    let manager = RuleLifecycleManager::new(
        Arc::new(create_test_store().await),
        Arc::new(StaticTriggerRegistry::with_defaults()),
        Arc::new(MemoryAuditSink::new()),
    );

    let err = manager
        .list(RuleQuery {
            offset: Some(u64::MAX),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RuleError::Validation(_)));

    let err = manager
        .list(RuleQuery {
            limit: Some(u64::MAX),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RuleError::Validation(_)));
}
