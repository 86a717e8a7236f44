use crate::error::ConversionError;
use crate::model::{ActionSpec, CriteriaOperator, Criterion, Rule, TriggerRef};
use crate::trigger::TriggerRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

const MAX_NAME_LEN: usize = 255;

/// 规则的外部表示（API 请求/响应体）
///
/// 字段在反序列化层面全部可选，结构校验统一由 [`RuleApi::to_model`] 完成，
/// 这样缺失字段会得到明确的校验错误而不是解码失败。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleApi {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default)]
    pub trigger: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Value>,

    #[serde(default)]
    pub action: Option<Value>,
}

/// 列表查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleQuery {
    pub name: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl RuleApi {
    /// 从持久化模型构造外部表示
    pub fn from_model(rule: &Rule) -> Self {
        let criteria: Map<String, Value> = rule
            .criteria
            .iter()
            .map(|(key, criterion)| {
                let mut entry = Map::new();
                entry.insert("type".to_string(), json!(criterion.operator.as_str()));
                if let Some(pattern) = &criterion.pattern {
                    entry.insert("pattern".to_string(), pattern.clone());
                }
                (key.clone(), Value::Object(entry))
            })
            .collect();

        Self {
            id: rule.id.map(|id| id.to_string()),
            name: Some(rule.name.clone()),
            description: Some(rule.description.clone()),
            enabled: Some(rule.enabled),
            trigger: Some(json!({
                "type": rule.trigger.trigger_type,
                "parameters": rule.trigger.parameters,
            })),
            criteria: Some(Value::Object(criteria)),
            action: Some(json!({
                "ref": rule.action.reference,
                "parameters": rule.action.parameters,
            })),
        }
    }

    /// 触发器类型（未做校验），用于日志
    pub fn trigger_type(&self) -> Option<&str> {
        self.trigger
            .as_ref()
            .and_then(|t| t.get("type"))
            .and_then(Value::as_str)
    }

    /// 转换为规则模型，并确认触发器类型已注册
    ///
    /// 负载中的 `id` 不参与转换：创建时由存储层分配，更新时由调用方强制设置。
    pub async fn to_model(
        &self,
        triggers: &dyn TriggerRegistry,
    ) -> Result<Rule, ConversionError> {
        let rule = self.to_model_unchecked()?;

        let exists = triggers
            .exists(&rule.trigger.trigger_type)
            .await
            .map_err(|e| ConversionError::Registry(e.to_string()))?;
        if !exists {
            return Err(ConversionError::TriggerNotFound(rule.trigger.trigger_type));
        }

        Ok(rule)
    }

    /// 只做结构校验的转换
    pub fn to_model_unchecked(&self) -> Result<Rule, ConversionError> {
        let name = self
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ConversionError::invalid("name", "is required"))?;
        // 名称按原样保存，不做裁剪
        if name.trim() != name {
            return Err(ConversionError::invalid(
                "name",
                "must not have leading or trailing whitespace",
            ));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ConversionError::invalid(
                "name",
                format!("must be at most {} characters", MAX_NAME_LEN),
            ));
        }

        let trigger = parse_trigger(self.trigger.as_ref())?;
        let action = parse_action(self.action.as_ref())?;
        let criteria = parse_criteria(self.criteria.as_ref())?;

        let mut rule = Rule::new(name, trigger, action);
        rule.description = self.description.clone().unwrap_or_default();
        rule.enabled = self.enabled.unwrap_or(true);
        rule.criteria = criteria;
        Ok(rule)
    }
}

fn parse_trigger(value: Option<&Value>) -> Result<TriggerRef, ConversionError> {
    let obj = require_object(value, "trigger")?;
    let trigger_type = require_string(obj, "type", "trigger.type")?;
    let parameters = optional_object(obj, "parameters", "trigger.parameters")?;

    Ok(TriggerRef {
        trigger_type,
        parameters,
    })
}

fn parse_action(value: Option<&Value>) -> Result<ActionSpec, ConversionError> {
    let obj = require_object(value, "action")?;
    if let Some(key) = obj.keys().find(|k| *k != "ref" && *k != "parameters") {
        return Err(ConversionError::invalid(
            format!("action.{}", key),
            "unknown field",
        ));
    }

    let reference = require_string(obj, "ref", "action.ref")?;
    match reference.split_once('.') {
        Some((pack, name)) if !pack.is_empty() && !name.is_empty() => {}
        _ => {
            return Err(ConversionError::invalid(
                "action.ref",
                format!("'{}' is not of the form pack.name", reference),
            ))
        }
    }
    let parameters = optional_object(obj, "parameters", "action.parameters")?;

    Ok(ActionSpec {
        reference,
        parameters,
    })
}

fn parse_criteria(value: Option<&Value>) -> Result<BTreeMap<String, Criterion>, ConversionError> {
    let entries = match value {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(entries)) => entries,
        Some(_) => return Err(ConversionError::invalid("criteria", "must be an object")),
    };

    let mut criteria = BTreeMap::new();
    for (key, entry) in entries {
        if key.trim().is_empty() {
            return Err(ConversionError::invalid("criteria", "keys must not be empty"));
        }
        let field = format!("criteria.{}", key);
        let obj = entry
            .as_object()
            .ok_or_else(|| ConversionError::invalid(&field, "must be an object"))?;

        let type_field = format!("{}.type", field);
        let operator_name = require_string(obj, "type", &type_field)?;
        let operator = CriteriaOperator::parse(&operator_name).ok_or_else(|| {
            ConversionError::invalid(
                &type_field,
                format!("unsupported operator '{}'", operator_name),
            )
        })?;

        let pattern = obj.get("pattern").filter(|p| !p.is_null()).cloned();
        if operator.requires_pattern() && pattern.is_none() {
            return Err(ConversionError::invalid(
                format!("{}.pattern", field),
                format!("is required for operator '{}'", operator),
            ));
        }

        criteria.insert(key.clone(), Criterion { operator, pattern });
    }

    Ok(criteria)
}

fn require_object<'a>(
    value: Option<&'a Value>,
    field: &str,
) -> Result<&'a Map<String, Value>, ConversionError> {
    match value {
        None | Some(Value::Null) => Err(ConversionError::invalid(field, "is required")),
        Some(Value::Object(obj)) => Ok(obj),
        Some(_) => Err(ConversionError::invalid(field, "must be an object")),
    }
}

fn require_string(
    obj: &Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<String, ConversionError> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(ConversionError::invalid(field, "is required")),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(ConversionError::invalid(field, "must not be empty")),
        Some(_) => Err(ConversionError::invalid(field, "must be a string")),
    }
}

fn optional_object(
    obj: &Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<Map<String, Value>, ConversionError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(inner)) => Ok(inner.clone()),
        Some(_) => Err(ConversionError::invalid(field, "must be an object")),
    }
}
