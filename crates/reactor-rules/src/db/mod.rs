mod converter;
pub mod entity;
mod store;

pub use entity::rules;
pub use store::SeaOrmRuleStore;
