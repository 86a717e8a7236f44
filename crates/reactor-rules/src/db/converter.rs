use super::rules;
use crate::error::StoreError;
use crate::model::{ActionSpec, Rule, TriggerRef};
use sea_orm::ActiveValue::Set;
use serde_json::{Map, Value as JsonValue};

/// Rule 模型与数据库实体的转换
pub(crate) fn to_active_model(rule: &Rule) -> Result<rules::ActiveModel, StoreError> {
    let id = rule
        .id
        .ok_or_else(|| StoreError::Internal("rule id must be assigned before write".to_string()))?;

    Ok(rules::ActiveModel {
        id: Set(id.to_string()),
        name: Set(rule.name.clone()),
        description: Set(rule.description.clone()),
        enabled: Set(rule.enabled),
        trigger_type: Set(rule.trigger.trigger_type.clone()),
        trigger_parameters: Set(JsonValue::Object(rule.trigger.parameters.clone())),
        criteria: Set(serde_json::to_value(&rule.criteria)?),
        action_ref: Set(rule.action.reference.clone()),
        action_parameters: Set(JsonValue::Object(rule.action.parameters.clone())),
        created_at: Set(rule.created_at),
        updated_at: Set(rule.updated_at),
    })
}

impl TryFrom<rules::Model> for Rule {
    type Error = StoreError;

    fn try_from(model: rules::Model) -> Result<Self, Self::Error> {
        let id = crate::storage::parse_id(&model.id)?;
        Ok(Self {
            id: Some(id),
            name: model.name,
            description: model.description,
            enabled: model.enabled,
            trigger: TriggerRef {
                trigger_type: model.trigger_type,
                parameters: json_to_map(model.trigger_parameters),
            },
            criteria: serde_json::from_value(model.criteria)?,
            action: ActionSpec {
                reference: model.action_ref,
                parameters: json_to_map(model.action_parameters),
            },
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

fn json_to_map(value: JsonValue) -> Map<String, JsonValue> {
    match value {
        JsonValue::Object(map) => map,
        _ => Map::new(),
    }
}
