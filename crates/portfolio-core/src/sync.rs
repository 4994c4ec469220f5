//! Keeps collaborators' derived `growth_member` subscriptions in line with
//! the portfolio owner's plan.

use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use tracing::{info, warn};

use entity::membership::{self, MembershipStatus};
use entity::portfolio;
use entity::subscription::{self, MEMBERSHIP_TYPE_GROWTH_MEMBER, STATUS_ACTIVE};

use crate::error::{PortfolioError, Result};
use crate::service::PortfolioService;
use crate::tier::Tier;
use crate::util::{new_id, now_ts};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub inserted: u64,
    pub updated: u64,
    pub deleted: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SubscriptionChange {
    /// The owner's portfolio now mirrors `tier` onto its collaborators.
    Synced {
        portfolio_id: String,
        tier: Tier,
        report: SyncReport,
    },
    /// The user owns no portfolio and does not qualify for one.
    NoPortfolio,
    /// The user is a collaborator; their plan follows their owner's.
    Collaborator { portfolio_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub portfolio_id: String,
    pub members: usize,
    pub tier: Tier,
    pub sync: SyncReport,
    pub expired_invitations: u64,
}

enum Upsert {
    Inserted,
    Updated,
}

impl PortfolioService {
    /// Mirror the owner's plan onto every accepted collaborator (GROWTH) or
    /// remove every derived row (FREE). Membership rows are never touched.
    /// Safe to re-run.
    pub async fn sync_member_tiers(&self, portfolio_id: &str, target: Tier) -> Result<SyncReport> {
        if !matches!(target, Tier::Growth | Tier::Free) {
            return Err(PortfolioError::InvalidInput("Tier sync supports GROWTH or FREE only"));
        }

        let portfolio = self.find_portfolio(portfolio_id).await?;
        let collaborators = self.collaborator_ids(&portfolio).await?;
        let mut report = SyncReport::default();

        match target {
            Tier::Growth => {
                let (owner_sub, owner_tier) = self.active_tier(&portfolio.owner_id).await?;
                if owner_tier != Tier::Growth {
                    return Err(PortfolioError::TierIneligible);
                }
                let price_id = owner_sub.and_then(|s| s.price_id);

                for user_id in &collaborators {
                    match self.upsert_growth_member(user_id, price_id.clone()).await? {
                        Upsert::Inserted => report.inserted += 1,
                        Upsert::Updated => report.updated += 1,
                    }
                }
            }
            _ => {
                if !collaborators.is_empty() {
                    let res = subscription::Entity::delete_many()
                        .filter(subscription::Column::UserId.is_in(collaborators.clone()))
                        .filter(subscription::Column::MembershipType.eq(MEMBERSHIP_TYPE_GROWTH_MEMBER))
                        .exec(&self.db)
                        .await?;
                    report.deleted = res.rows_affected;
                }
            }
        }

        info!(
            portfolio_id = %portfolio.id,
            tier = %target,
            collaborators = collaborators.len(),
            inserted = report.inserted,
            updated = report.updated,
            deleted = report.deleted,
            "Synced collaborator tiers"
        );
        Ok(report)
    }

    /// React to a change in the user's own subscription (upgrade, downgrade,
    /// resubscribe). Upgrading to GROWTH creates the portfolio if needed;
    /// any other tier strips derived rows but keeps the portfolio and its
    /// memberships.
    pub async fn handle_subscription_change(&self, user_id: &str) -> Result<SubscriptionChange> {
        let owned = self.owned_portfolio(user_id).await?;
        if owned.is_none() {
            if let Some(m) = self.membership_for_user(user_id).await? {
                return Ok(SubscriptionChange::Collaborator {
                    portfolio_id: m.portfolio_id,
                });
            }
        }

        let (_, tier) = self.active_tier(user_id).await?;
        if tier == Tier::Growth {
            let portfolio = self.create_portfolio_for_owner(user_id).await?;
            let report = self.sync_member_tiers(&portfolio.id, Tier::Growth).await?;
            return Ok(SubscriptionChange::Synced {
                portfolio_id: portfolio.id,
                tier,
                report,
            });
        }

        match owned {
            Some(portfolio) => {
                let report = self.sync_member_tiers(&portfolio.id, Tier::Free).await?;
                Ok(SubscriptionChange::Synced {
                    portfolio_id: portfolio.id,
                    tier: Tier::Free,
                    report,
                })
            }
            None => Ok(SubscriptionChange::NoPortfolio),
        }
    }

    /// Repair pass for best-effort steps that may have failed earlier:
    /// the owner's self-membership, every member's profile and post
    /// pointers, derived subscriptions, and stale invitations.
    pub async fn reconcile_portfolio(&self, portfolio_id: &str) -> Result<ReconcileReport> {
        let portfolio = self.find_portfolio(portfolio_id).await?;

        self.ensure_owner_membership(&portfolio).await?;

        let members = membership::Entity::find()
            .filter(membership::Column::PortfolioId.eq(portfolio.id.clone()))
            .filter(membership::Column::Status.eq(MembershipStatus::Accepted))
            .all(&self.db)
            .await?;
        for m in &members {
            self.attach_user_to_portfolio(&m.user_id, &portfolio.id).await?;
        }

        let (_, owner_tier) = self.active_tier(&portfolio.owner_id).await?;
        let tier = if owner_tier == Tier::Growth { Tier::Growth } else { Tier::Free };
        let sync = self.sync_member_tiers(&portfolio.id, tier).await?;

        let expired_invitations = self.expire_stale_invitations().await?;

        info!(portfolio_id = %portfolio.id, members = members.len(), tier = %tier, "Portfolio reconciled");
        Ok(ReconcileReport {
            portfolio_id: portfolio.id,
            members: members.len(),
            tier,
            sync,
            expired_invitations,
        })
    }

    /// Give a new collaborator the owner's current plan, if the owner is on GROWTH.
    pub(crate) async fn mirror_owner_plan(&self, portfolio: &portfolio::Model, user_id: &str) -> Result<()> {
        let (owner_sub, owner_tier) = self.active_tier(&portfolio.owner_id).await?;
        if owner_tier != Tier::Growth {
            warn!(portfolio_id = %portfolio.id, owner_tier = %owner_tier, "Owner is not on GROWTH; collaborator plan not derived");
            return Ok(());
        }

        self.upsert_growth_member(user_id, owner_sub.and_then(|s| s.price_id)).await?;
        Ok(())
    }

    /// Remove a collaborator's derived subscription.
    pub(crate) async fn delete_growth_member(&self, user_id: &str) -> std::result::Result<u64, DbErr> {
        let res = subscription::Entity::delete_many()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::MembershipType.eq(MEMBERSHIP_TYPE_GROWTH_MEMBER))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }

    /// Accepted members other than the owner.
    async fn collaborator_ids(&self, portfolio: &portfolio::Model) -> Result<Vec<String>> {
        let members = membership::Entity::find()
            .filter(membership::Column::PortfolioId.eq(portfolio.id.clone()))
            .filter(membership::Column::Status.eq(MembershipStatus::Accepted))
            .filter(membership::Column::UserId.ne(portfolio.owner_id.clone()))
            .all(&self.db)
            .await?;
        Ok(members.into_iter().map(|m| m.user_id).collect())
    }

    async fn upsert_growth_member(&self, user_id: &str, price_id: Option<String>) -> std::result::Result<Upsert, DbErr> {
        let now = now_ts();
        let existing = subscription::Entity::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::MembershipType.eq(MEMBERSHIP_TYPE_GROWTH_MEMBER))
            .one(&self.db)
            .await?;

        match existing {
            Some(sub) => {
                if sub.price_id == price_id && sub.status == STATUS_ACTIVE {
                    return Ok(Upsert::Updated);
                }
                let mut active: subscription::ActiveModel = sub.into();
                active.price_id = Set(price_id);
                active.status = Set(STATUS_ACTIVE.to_string());
                active.updated_at = Set(now);
                active.update(&self.db).await?;
                Ok(Upsert::Updated)
            }
            None => {
                subscription::ActiveModel {
                    id: Set(new_id()),
                    user_id: Set(user_id.to_string()),
                    price_id: Set(price_id),
                    status: Set(STATUS_ACTIVE.to_string()),
                    membership_type: Set(Some(MEMBERSHIP_TYPE_GROWTH_MEMBER.to_string())),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&self.db)
                .await?;
                Ok(Upsert::Inserted)
            }
        }
    }
}
