use std::sync::Arc;

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

use entity::subscription::STATUS_ACTIVE;
use entity::{portfolio, subscription, user};

use crate::db::connect_and_migrate;
use crate::mailer::NoopMailer;
use crate::service::PortfolioService;
use crate::tier::{Tier, TierTable};
use crate::util::{new_id, now_ts};

pub(crate) const GROWTH_PRICE: &str = "price_growth_monthly";

pub(crate) async fn service() -> PortfolioService {
    let db = connect_and_migrate("sqlite::memory:").await.unwrap();
    let tiers = TierTable::new().with_price(GROWTH_PRICE, Tier::Growth);
    PortfolioService::new(db, tiers, Arc::new(NoopMailer))
}

pub(crate) async fn insert_user(service: &PortfolioService, email: &str) -> String {
    let now = now_ts();
    let id = new_id();
    user::ActiveModel {
        id: Set(id.clone()),
        email: Set(email.to_string()),
        display_name: Set(None),
        portfolio_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(service.db())
    .await
    .unwrap();
    id
}

/// Service plus a user holding an active GROWTH subscription.
pub(crate) async fn growth_service_with_owner() -> (PortfolioService, String) {
    let service = service().await;
    let owner = insert_user(&service, "owner@example.com").await;
    let now = now_ts();
    subscription::ActiveModel {
        id: Set(new_id()),
        user_id: Set(owner.clone()),
        price_id: Set(Some(GROWTH_PRICE.to_string())),
        status: Set(STATUS_ACTIVE.to_string()),
        membership_type: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(service.db())
    .await
    .unwrap();
    (service, owner)
}

pub(crate) async fn portfolio_count(service: &PortfolioService, owner_id: &str) -> u64 {
    portfolio::Entity::find()
        .filter(portfolio::Column::OwnerId.eq(owner_id))
        .count(service.db())
        .await
        .unwrap()
}
