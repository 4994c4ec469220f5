use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const STATUS_ACTIVE: &str = "active";

/// The owner's primary plan, stamped when their portfolio is created.
pub const MEMBERSHIP_TYPE_PRIMARY: &str = "membership";
/// Derived row mirroring the portfolio owner's plan onto a collaborator.
pub const MEMBERSHIP_TYPE_GROWTH_MEMBER: &str = "growth_member";
pub const MEMBERSHIP_TYPE_ADDON: &str = "addon";

/// Billing subscription row. Written by the billing integration, except for
/// `growth_member` rows which this subsystem owns.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    pub price_id: Option<String>,

    /// Billing provider status (active, canceled, past_due, ...).
    pub status: String,

    /// Legacy rows may carry no membership type.
    pub membership_type: Option<String>,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub updated_at: i64,
}

impl Model {
    pub fn is_growth_member(&self) -> bool {
        self.membership_type.as_deref() == Some(MEMBERSHIP_TYPE_GROWTH_MEMBER)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
