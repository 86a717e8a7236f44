use crate::{error::Result, state::AppState};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use reactor_rules::{RuleApi, RuleQuery};
use tracing::{debug, info};

/// 列出规则
pub async fn list_rules(
    State(state): State<AppState>,
    query: std::result::Result<Query<RuleQuery>, QueryRejection>,
) -> Result<Json<Vec<RuleApi>>> {
    let Query(query) = query?;
    debug!(name = ?query.name, "Listing rules");

    let rules = state.rules.list(query).await?;
    Ok(Json(rules))
}

/// 按 ID 或名称获取规则
pub async fn get_rule(
    State(state): State<AppState>,
    Path(name_or_id): Path<String>,
) -> Result<Json<RuleApi>> {
    debug!(name_or_id = %name_or_id, "Getting rule");

    let rule = state.rules.get_one(&name_or_id).await?;
    Ok(Json(rule))
}

/// 创建规则
pub async fn create_rule(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RuleApi>, JsonRejection>,
) -> Result<(StatusCode, Json<RuleApi>)> {
    let Json(payload) = payload?;
    info!(rule_name = ?payload.name, "Creating rule");

    let rule = state.rules.create(payload).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// 更新规则
pub async fn update_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
    payload: std::result::Result<Json<RuleApi>, JsonRejection>,
) -> Result<Json<RuleApi>> {
    let Json(payload) = payload?;
    info!(rule_id = %rule_id, "Updating rule");

    let rule = state.rules.update(&rule_id, payload).await?;
    Ok(Json(rule))
}

/// 删除规则
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
) -> Result<StatusCode> {
    info!(rule_id = %rule_id, "Deleting rule");

    state.rules.delete(&rule_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
