use thiserror::Error;

/// 规则存储层错误
#[derive(Error, Debug)]
pub enum StoreError {
    /// 标识符格式不合法
    #[error("Invalid rule id: {0}")]
    InvalidId(String),

    /// 记录不存在
    #[error("Rule not found: {0}")]
    NotFound(String),

    /// 唯一性冲突，携带占用该唯一键的记录 ID
    #[error("{message}")]
    Conflict { conflict_id: String, message: String },

    /// 记录未通过存储层校验
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn conflict(conflict_id: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Conflict {
            conflict_id: conflict_id.into(),
            message: message.into(),
        }
    }
}

/// 外部描述转换为规则模型时的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// 字段结构不合法
    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },

    /// 引用的触发器类型不存在
    #[error("Trigger {0} in rule does not exist in system")]
    TriggerNotFound(String),

    /// 触发器注册表不可用
    #[error("Trigger registry lookup failed: {0}")]
    Registry(String),
}

impl ConversionError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConversionError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 规则生命周期操作的结果分类
///
/// 传输层只会看到这四类错误，存储层的原始错误在操作边界被转换。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// 请求内容不合法或引用了不存在的触发器
    #[error("{0}")]
    Validation(String),

    /// 找不到规则；`detail` 保留底层查询失败原因用于诊断
    #[error("{message}")]
    NotFound {
        message: String,
        detail: Option<String>,
    },

    /// 名称冲突
    #[error("{message}")]
    Conflict { conflict_id: String, message: String },

    /// 存储层意外失败
    #[error("{0}")]
    Internal(String),
}

impl RuleError {
    pub fn not_found(message: impl Into<String>) -> Self {
        RuleError::NotFound {
            message: message.into(),
            detail: None,
        }
    }
}

impl From<ConversionError> for RuleError {
    fn from(err: ConversionError) -> Self {
        RuleError::Validation(err.to_string())
    }
}

/// 写操作（add_or_update）的错误映射
impl From<StoreError> for RuleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict {
                conflict_id,
                message,
            } => RuleError::Conflict {
                conflict_id,
                message,
            },
            StoreError::Validation(msg) | StoreError::InvalidId(msg) => RuleError::Validation(msg),
            StoreError::NotFound(msg) => RuleError::not_found(msg),
            other => RuleError::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_not_found_message() {
        let err = RuleError::from(ConversionError::TriggerNotFound("bogus".to_string()));
        assert_eq!(
            err,
            RuleError::Validation("Trigger bogus in rule does not exist in system".to_string())
        );
    }

    #[test]
    fn test_store_conflict_keeps_id() {
        let err = RuleError::from(StoreError::conflict("abc", "duplicate name"));
        match err {
            RuleError::Conflict { conflict_id, .. } => assert_eq!(conflict_id, "abc"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_database_error_is_internal() {
        let err = RuleError::from(StoreError::Database(sea_orm::DbErr::Custom(
            "disk full".to_string(),
        )));
        assert!(matches!(err, RuleError::Internal(msg) if msg.contains("disk full")));
    }
}
