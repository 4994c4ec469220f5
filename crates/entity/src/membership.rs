use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "declined")]
    Declined,
}

/// Portfolio membership (portfolio_members).
///
/// The owner holds a self-referential row with `status = accepted` so that
/// members can be enumerated uniformly.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "portfolio_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub portfolio_id: String,

    /// One membership per user system-wide (unique index).
    #[sea_orm(unique)]
    pub user_id: String,

    /// None for the owner's own row.
    pub invited_by: Option<String>,

    pub status: MembershipStatus,

    /// Unix timestamp (seconds).
    pub invited_at: i64,

    /// Unix timestamp (seconds).
    pub accepted_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
