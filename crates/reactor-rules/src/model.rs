use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// 规则定义（持久化模型）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// 规则 ID，由存储层分配；未持久化时为 None
    pub id: Option<Uuid>,

    /// 规则名称（全局唯一）
    pub name: String,

    /// 规则描述
    pub description: String,

    /// 是否启用
    pub enabled: bool,

    /// 触发器引用
    pub trigger: TriggerRef,

    /// 匹配条件，键为事件负载中的字段路径
    pub criteria: BTreeMap<String, Criterion>,

    /// 动作
    pub action: ActionSpec,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    pub fn new(name: impl Into<String>, trigger: TriggerRef, action: ActionSpec) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            enabled: true,
            trigger,
            criteria: BTreeMap::new(),
            action,
            created_at: now,
            updated_at: now,
        }
    }

    /// 规则 ID 的字符串形式，未分配时为空串
    pub fn id_string(&self) -> String {
        self.id.map(|id| id.to_string()).unwrap_or_default()
    }
}

/// 触发器引用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRef {
    /// 触发器类型，例如 `core.st2.generic`
    pub trigger_type: String,

    /// 触发器参数
    pub parameters: Map<String, Value>,
}

impl TriggerRef {
    pub fn new(trigger_type: impl Into<String>) -> Self {
        Self {
            trigger_type: trigger_type.into(),
            parameters: Map::new(),
        }
    }
}

/// 动作定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    /// 动作引用，格式为 `pack.name`
    pub reference: String,

    /// 动作参数
    pub parameters: Map<String, Value>,
}

impl ActionSpec {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            parameters: Map::new(),
        }
    }
}

/// 单个匹配条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub operator: CriteriaOperator,
    pub pattern: Option<Value>,
}

/// 条件运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriteriaOperator {
    Equals,
    Nequals,
    Iequals,
    Lessthan,
    Greaterthan,
    Matchregex,
    Contains,
    Icontains,
    Ncontains,
    Incontains,
    Startswith,
    Istartswith,
    Endswith,
    Iendswith,
    #[serde(rename = "timediff_lt")]
    TimediffLt,
    #[serde(rename = "timediff_gt")]
    TimediffGt,
    Exists,
    Nexists,
}

impl CriteriaOperator {
    pub const ALL: [CriteriaOperator; 18] = [
        CriteriaOperator::Equals,
        CriteriaOperator::Nequals,
        CriteriaOperator::Iequals,
        CriteriaOperator::Lessthan,
        CriteriaOperator::Greaterthan,
        CriteriaOperator::Matchregex,
        CriteriaOperator::Contains,
        CriteriaOperator::Icontains,
        CriteriaOperator::Ncontains,
        CriteriaOperator::Incontains,
        CriteriaOperator::Startswith,
        CriteriaOperator::Istartswith,
        CriteriaOperator::Endswith,
        CriteriaOperator::Iendswith,
        CriteriaOperator::TimediffLt,
        CriteriaOperator::TimediffGt,
        CriteriaOperator::Exists,
        CriteriaOperator::Nexists,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CriteriaOperator::Equals => "equals",
            CriteriaOperator::Nequals => "nequals",
            CriteriaOperator::Iequals => "iequals",
            CriteriaOperator::Lessthan => "lessthan",
            CriteriaOperator::Greaterthan => "greaterthan",
            CriteriaOperator::Matchregex => "matchregex",
            CriteriaOperator::Contains => "contains",
            CriteriaOperator::Icontains => "icontains",
            CriteriaOperator::Ncontains => "ncontains",
            CriteriaOperator::Incontains => "incontains",
            CriteriaOperator::Startswith => "startswith",
            CriteriaOperator::Istartswith => "istartswith",
            CriteriaOperator::Endswith => "endswith",
            CriteriaOperator::Iendswith => "iendswith",
            CriteriaOperator::TimediffLt => "timediff_lt",
            CriteriaOperator::TimediffGt => "timediff_gt",
            CriteriaOperator::Exists => "exists",
            CriteriaOperator::Nexists => "nexists",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.as_str() == s)
    }

    /// `exists` / `nexists` 只检查字段是否存在，不需要 pattern
    pub fn requires_pattern(&self) -> bool {
        !matches!(self, CriteriaOperator::Exists | CriteriaOperator::Nexists)
    }
}

impl fmt::Display for CriteriaOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
