use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Content item authored by a user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Creator.
    pub user_id: String,

    pub portfolio_id: Option<String>,

    /// "personal", an organization id, or absent on legacy rows.
    pub publish_target: Option<String>,

    pub content: String,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
