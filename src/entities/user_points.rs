use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Running points balance for one user.
/// - current_points: spendable balance (may go negative after an admin adjustment)
/// - total_points: lifetime points earned
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "user_points")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub user_id: i64,
    pub current_points: i64,
    pub total_points: i64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
