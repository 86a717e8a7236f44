use reactor_rules::RuleLifecycleManager;

/// API 应用状态
#[derive(Clone)]
pub struct AppState {
    /// 规则生命周期管理器
    pub rules: RuleLifecycleManager,
}

impl AppState {
    pub fn new(rules: RuleLifecycleManager) -> Self {
        Self { rules }
    }
}
