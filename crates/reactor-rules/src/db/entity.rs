use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 规则实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub trigger_type: String,
    #[sea_orm(column_type = "Json")]
    pub trigger_parameters: Json,
    #[sea_orm(column_type = "Json")]
    pub criteria: Json,
    pub action_ref: String,
    #[sea_orm(column_type = "Json")]
    pub action_parameters: Json,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub mod rules {
    pub use super::*;
}
