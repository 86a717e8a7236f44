use async_trait::async_trait;
use std::collections::HashSet;
use tracing::debug;

/// 系统内置触发器类型
pub const SYSTEM_TRIGGER_TYPES: &[&str] = &[
    "core.st2.generic",
    "core.st2.IntervalTimer",
    "core.st2.DateTimer",
    "core.st2.CronTimer",
    "core.st2.webhook",
];

/// 触发器注册表
///
/// 规则转换时只用来确认触发器类型存在，注册与管理不在这里进行。
#[async_trait]
pub trait TriggerRegistry: Send + Sync {
    async fn exists(&self, trigger_type: &str) -> anyhow::Result<bool>;
}

/// 固定集合的触发器注册表，启动时由配置填充
#[derive(Debug, Clone, Default)]
pub struct StaticTriggerRegistry {
    types: HashSet<String>,
}

impl StaticTriggerRegistry {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(SYSTEM_TRIGGER_TYPES.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[async_trait]
impl TriggerRegistry for StaticTriggerRegistry {
    async fn exists(&self, trigger_type: &str) -> anyhow::Result<bool> {
        let found = self.types.contains(trigger_type);
        debug!(trigger_type = %trigger_type, found, "Trigger type lookup");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_registry() {
        let registry = StaticTriggerRegistry::with_defaults();
        assert_eq!(registry.len(), SYSTEM_TRIGGER_TYPES.len());
        assert!(registry.exists("core.st2.generic").await.unwrap());
        assert!(!registry.exists("bogus").await.unwrap());
    }

    #[tokio::test]
    async fn test_lookup_is_case_sensitive() {
        let registry = StaticTriggerRegistry::new(["myPack.On_Push"]);
        assert!(registry.exists("myPack.On_Push").await.unwrap());
        assert!(!registry.exists("mypack.on_push").await.unwrap());
    }
}
