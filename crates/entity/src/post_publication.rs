use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Record of a post being published to the external network.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post_publications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub post_id: String,

    /// Organization page the post went out on; None for a personal profile.
    pub organization_id: Option<String>,

    /// Unix timestamp (seconds).
    pub published_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
