#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use entity::subscription::{MEMBERSHIP_TYPE_GROWTH_MEMBER, STATUS_ACTIVE};
use entity::{organization_grant, portfolio, post, post_publication, subscription, user};
use portfolio_core::db::connect_and_migrate;
use portfolio_core::util::{new_id, now_ts};
use portfolio_core::{InvitationMailer, MailError, PortfolioService, Tier, TierTable};

pub const GROWTH_PRICE: &str = "price_growth_monthly";
pub const GROWTH_PRICE_YEARLY: &str = "price_growth_yearly";
pub const STARTER_PRICE: &str = "price_starter";
pub const SEAT_PRICE: &str = "price_extra_seat";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn tiers() -> TierTable {
    TierTable::new()
        .with_price(GROWTH_PRICE, Tier::Growth)
        .with_price(GROWTH_PRICE_YEARLY, Tier::Growth)
        .with_price(STARTER_PRICE, Tier::Starter)
        .with_extra_seat_price(SEAT_PRICE)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentInvitation {
    pub email: String,
    pub token: String,
    pub inviter: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentInvitation>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentInvitation> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl InvitationMailer for RecordingMailer {
    async fn send_invitation(&self, email: &str, token: &str, inviter_display_name: &str) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(SentInvitation {
            email: email.to_string(),
            token: token.to_string(),
            inviter: inviter_display_name.to_string(),
        });
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl InvitationMailer for FailingMailer {
    async fn send_invitation(&self, _email: &str, _token: &str, _inviter: &str) -> Result<(), MailError> {
        Err(MailError::Rejected {
            status: 503,
            body: "service unavailable".into(),
        })
    }
}

pub struct Harness {
    pub service: PortfolioService,
    pub mailer: Arc<RecordingMailer>,
}

impl Harness {
    pub fn db(&self) -> &DatabaseConnection {
        self.service.db()
    }
}

pub async fn harness() -> Harness {
    init_tracing();
    let mailer = Arc::new(RecordingMailer::default());
    let service = service_with_mailer(mailer.clone()).await;
    Harness { service, mailer }
}

pub async fn service_with_mailer(mailer: Arc<dyn InvitationMailer>) -> PortfolioService {
    let db = connect_and_migrate("sqlite::memory:")
        .await
        .expect("in-memory database");
    PortfolioService::new(db, tiers(), mailer)
}

pub async fn insert_user(db: &DatabaseConnection, email: &str) -> String {
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
    .insert(db)
    .await
    .expect("insert user");
    id
}

pub async fn insert_named_user(db: &DatabaseConnection, email: &str, name: &str) -> String {
    let id = insert_user(db, email).await;
    let u = user::Entity::find_by_id(id.clone()).one(db).await.unwrap().unwrap();
    let mut active: user::ActiveModel = u.into();
    active.display_name = Set(Some(name.to_string()));
    active.update(db).await.unwrap();
    id
}

pub async fn insert_subscription(
    db: &DatabaseConnection,
    user_id: &str,
    price_id: Option<&str>,
    membership_type: Option<&str>,
    status: &str,
) -> String {
    let now = now_ts();
    let id = new_id();
    subscription::ActiveModel {
        id: Set(id.clone()),
        user_id: Set(user_id.to_string()),
        price_id: Set(price_id.map(str::to_string)),
        status: Set(status.to_string()),
        membership_type: Set(membership_type.map(str::to_string)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert subscription");
    id
}

pub async fn set_subscription_status(db: &DatabaseConnection, subscription_id: &str, status: &str) {
    let sub = subscription::Entity::find_by_id(subscription_id.to_string())
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let mut active: subscription::ActiveModel = sub.into();
    active.status = Set(status.to_string());
    active.update(db).await.unwrap();
}

/// A user with an active GROWTH plan who already owns a portfolio.
pub async fn growth_owner(h: &Harness, email: &str) -> (String, portfolio::Model) {
    let owner = insert_user(h.db(), email).await;
    insert_subscription(h.db(), &owner, Some(GROWTH_PRICE), None, STATUS_ACTIVE).await;
    let portfolio = h
        .service
        .create_portfolio_for_owner(&owner)
        .await
        .expect("create portfolio");
    (owner, portfolio)
}

/// Create an account for `email`, invite it and accept. Returns the new user id.
pub async fn join(h: &Harness, portfolio_id: &str, owner_id: &str, email: &str) -> String {
    let user_id = insert_user(h.db(), email).await;
    let invitation = h
        .service
        .create_invitation(portfolio_id, email, owner_id)
        .await
        .expect("create invitation");
    h.service
        .accept_invitation(&invitation.token, &user_id)
        .await
        .expect("accept invitation");
    user_id
}

pub async fn insert_post(db: &DatabaseConnection, user_id: &str, publish_target: Option<&str>) -> String {
    let now = now_ts();
    let id = new_id();
    post::ActiveModel {
        id: Set(id.clone()),
        user_id: Set(user_id.to_string()),
        portfolio_id: Set(None),
        publish_target: Set(publish_target.map(str::to_string)),
        content: Set("Quarterly update".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert post");
    id
}

pub async fn insert_publication(db: &DatabaseConnection, post_id: &str, organization_id: Option<&str>) {
    post_publication::ActiveModel {
        id: Set(new_id()),
        post_id: Set(post_id.to_string()),
        organization_id: Set(organization_id.map(str::to_string)),
        published_at: Set(now_ts()),
    }
    .insert(db)
    .await
    .expect("insert publication");
}

pub async fn insert_grant(db: &DatabaseConnection, user_id: &str, organization_id: &str) -> String {
    let id = new_id();
    organization_grant::ActiveModel {
        id: Set(id.clone()),
        user_id: Set(user_id.to_string()),
        organization_id: Set(organization_id.to_string()),
        created_at: Set(now_ts()),
    }
    .insert(db)
    .await
    .expect("insert grant");
    id
}

pub async fn growth_member_rows(db: &DatabaseConnection, user_id: &str) -> Vec<subscription::Model> {
    subscription::Entity::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::MembershipType.eq(MEMBERSHIP_TYPE_GROWTH_MEMBER))
        .all(db)
        .await
        .unwrap()
}

pub async fn load_user(db: &DatabaseConnection, user_id: &str) -> user::Model {
    user::Entity::find_by_id(user_id.to_string())
        .one(db)
        .await
        .unwrap()
        .unwrap()
}

pub async fn load_post(db: &DatabaseConnection, post_id: &str) -> post::Model {
    post::Entity::find_by_id(post_id.to_string())
        .one(db)
        .await
        .unwrap()
        .unwrap()
}
