use sea_orm::{ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use tracing::debug;

use entity::subscription::{
    self, MEMBERSHIP_TYPE_ADDON, MEMBERSHIP_TYPE_GROWTH_MEMBER, MEMBERSHIP_TYPE_PRIMARY, STATUS_ACTIVE,
};

use crate::error::Result;
use crate::service::PortfolioService;
use crate::tier::{Tier, TierTable};

/// The user's primary active plan.
///
/// A row stamped `membership` wins, then a collaborator's derived
/// `growth_member` row. Otherwise the oldest active row that is not an
/// add-on (legacy rows have no membership type) and is not the extra seat
/// price.
pub async fn active_subscription(
    db: &DatabaseConnection,
    tiers: &TierTable,
    user_id: &str,
) -> std::result::Result<Option<subscription::Model>, DbErr> {
    let primary = subscription::Entity::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::Status.eq(STATUS_ACTIVE))
        .filter(subscription::Column::MembershipType.eq(MEMBERSHIP_TYPE_PRIMARY))
        .order_by_asc(subscription::Column::CreatedAt)
        .one(db)
        .await?;
    if primary.is_some() {
        return Ok(primary);
    }

    let derived = subscription::Entity::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::Status.eq(STATUS_ACTIVE))
        .filter(subscription::Column::MembershipType.eq(MEMBERSHIP_TYPE_GROWTH_MEMBER))
        .one(db)
        .await?;
    if derived.is_some() {
        return Ok(derived);
    }

    let mut query = subscription::Entity::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::Status.eq(STATUS_ACTIVE))
        .filter(
            Condition::any()
                .add(subscription::Column::MembershipType.is_null())
                .add(subscription::Column::MembershipType.ne(MEMBERSHIP_TYPE_ADDON)),
        );
    if let Some(seat_price) = tiers.extra_seat_price_id() {
        query = query.filter(
            Condition::any()
                .add(subscription::Column::PriceId.is_null())
                .add(subscription::Column::PriceId.ne(seat_price)),
        );
    }

    query
        .order_by_asc(subscription::Column::CreatedAt)
        .one(db)
        .await
}

impl PortfolioService {
    pub async fn get_active_subscription(&self, user_id: &str) -> Result<Option<subscription::Model>> {
        Ok(active_subscription(&self.db, &self.tiers, user_id).await?)
    }

    /// The user's active subscription together with the tier it resolves to.
    pub async fn active_tier(&self, user_id: &str) -> Result<(Option<subscription::Model>, Tier)> {
        let sub = self.get_active_subscription(user_id).await?;
        let tier = self
            .tiers
            .resolve(sub.as_ref().and_then(|s| s.price_id.as_deref()));
        debug!(user_id = %user_id, tier = %tier, "Resolved subscription tier");
        Ok((sub, tier))
    }
}
