//! Portfolio creation and ownership.

use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set};
use tracing::{debug, info, warn};

use entity::membership::{self, MembershipStatus};
use entity::subscription::{self, MEMBERSHIP_TYPE_PRIMARY};
use entity::{portfolio, post, user};

use crate::db::is_unique_violation;
use crate::error::{PortfolioError, Result};
use crate::service::PortfolioService;
use crate::tier::Tier;
use crate::util::{new_id, now_ts};

impl PortfolioService {
    /// Create the owner's portfolio, or return the one they already own.
    ///
    /// Only the insert itself is fatal. Re-parenting content, stamping the
    /// subscription and the owner's self-membership are logged on failure
    /// and repaired by re-running this call or [`PortfolioService::reconcile_portfolio`].
    pub async fn create_portfolio_for_owner(&self, user_id: &str) -> Result<portfolio::Model> {
        if let Some(existing) = self.owned_portfolio(user_id).await? {
            debug!(user_id = %user_id, portfolio_id = %existing.id, "Portfolio already exists");
            return Ok(existing);
        }

        let (subscription, tier) = self.active_tier(user_id).await?;
        if tier != Tier::Growth {
            return Err(PortfolioError::TierIneligible);
        }

        // Collaborators resolve to GROWTH through their derived row; they
        // still belong to someone else's portfolio.
        if self.membership_for_user(user_id).await?.is_some() {
            // A concurrent create may have finished and added the owner's own row.
            if let Some(existing) = self.owned_portfolio(user_id).await? {
                return Ok(existing);
            }
            return Err(PortfolioError::AlreadyInPortfolio);
        }

        let (portfolio, created) = self.insert_portfolio(user_id).await?;
        if !created {
            return Ok(portfolio);
        }
        info!(user_id = %user_id, portfolio_id = %portfolio.id, "Portfolio created");

        if let Err(e) = self.attach_user_to_portfolio(user_id, &portfolio.id).await {
            warn!(user_id = %user_id, portfolio_id = %portfolio.id, error = %e, "Failed to move owner content into portfolio");
        }

        if let Some(sub) = subscription {
            if let Err(e) = self.stamp_primary_membership(&sub).await {
                warn!(user_id = %user_id, subscription_id = %sub.id, error = %e, "Failed to stamp owner subscription");
            }
        }

        if let Err(e) = self.ensure_owner_membership(&portfolio).await {
            warn!(user_id = %user_id, portfolio_id = %portfolio.id, error = %e, "Failed to create owner membership");
        }

        Ok(portfolio)
    }

    /// Insert the portfolio row. When the owner index reports a concurrent
    /// insert, the winner's row is returned with `created = false`.
    pub(crate) async fn insert_portfolio(&self, user_id: &str) -> Result<(portfolio::Model, bool)> {
        let now = now_ts();
        let active = portfolio::ActiveModel {
            id: Set(new_id()),
            owner_id: Set(user_id.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match active.insert(&self.db).await {
            Ok(p) => Ok((p, true)),
            Err(e) if is_unique_violation(&e) => {
                debug!(user_id = %user_id, "Portfolio insert lost a race; reading the existing row");
                let existing = self
                    .owned_portfolio(user_id)
                    .await?
                    .ok_or(PortfolioError::StorageFailure(e))?;
                Ok((existing, false))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn owned_portfolio(&self, user_id: &str) -> Result<Option<portfolio::Model>> {
        Ok(portfolio::Entity::find()
            .filter(portfolio::Column::OwnerId.eq(user_id))
            .one(&self.db)
            .await?)
    }

    /// The user's membership row, whatever its status.
    pub async fn membership_for_user(&self, user_id: &str) -> Result<Option<membership::Model>> {
        Ok(membership::Entity::find()
            .filter(membership::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?)
    }

    /// The portfolio the user owns or has joined.
    pub async fn get_portfolio_for_user(&self, user_id: &str) -> Result<Option<portfolio::Model>> {
        if let Some(owned) = self.owned_portfolio(user_id).await? {
            return Ok(Some(owned));
        }

        match self.membership_for_user(user_id).await? {
            Some(m) if m.status == MembershipStatus::Accepted => Ok(portfolio::Entity::find_by_id(m.portfolio_id)
                .one(&self.db)
                .await?),
            _ => Ok(None),
        }
    }

    pub(crate) async fn find_portfolio(&self, portfolio_id: &str) -> Result<portfolio::Model> {
        portfolio::Entity::find_by_id(portfolio_id.to_string())
            .one(&self.db)
            .await?
            .ok_or(PortfolioError::NotFound("Portfolio"))
    }

    pub(crate) async fn require_owner(&self, portfolio_id: &str, requester_id: &str) -> Result<portfolio::Model> {
        let portfolio = self.find_portfolio(portfolio_id).await?;
        if portfolio.owner_id != requester_id {
            return Err(PortfolioError::Unauthorized("Only the portfolio owner can do this"));
        }
        Ok(portfolio)
    }

    /// Owner, or holder of an accepted membership in this portfolio.
    pub(crate) async fn is_member(&self, portfolio: &portfolio::Model, user_id: &str) -> Result<bool> {
        if portfolio.owner_id == user_id {
            return Ok(true);
        }
        Ok(matches!(
            self.membership_for_user(user_id).await?,
            Some(m) if m.portfolio_id == portfolio.id && m.status == MembershipStatus::Accepted
        ))
    }

    /// Point the user's profile and every post they created at the portfolio.
    pub(crate) async fn attach_user_to_portfolio(&self, user_id: &str, portfolio_id: &str) -> std::result::Result<(), DbErr> {
        let now = now_ts();

        user::Entity::update_many()
            .col_expr(user::Column::PortfolioId, Expr::value(Some(portfolio_id.to_string())))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;

        let moved = post::Entity::update_many()
            .col_expr(post::Column::PortfolioId, Expr::value(Some(portfolio_id.to_string())))
            .col_expr(post::Column::UpdatedAt, Expr::value(now))
            .filter(post::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        debug!(user_id = %user_id, portfolio_id = %portfolio_id, posts = moved.rows_affected, "Attached user content to portfolio");
        Ok(())
    }

    /// Undo [`Self::attach_user_to_portfolio`] for rows still pointing at this portfolio.
    pub(crate) async fn detach_user_from_portfolio(&self, user_id: &str, portfolio_id: &str) -> std::result::Result<(), DbErr> {
        let now = now_ts();

        user::Entity::update_many()
            .col_expr(user::Column::PortfolioId, Expr::value(Option::<String>::None))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .filter(user::Column::PortfolioId.eq(portfolio_id))
            .exec(&self.db)
            .await?;

        post::Entity::update_many()
            .col_expr(post::Column::PortfolioId, Expr::value(Option::<String>::None))
            .col_expr(post::Column::UpdatedAt, Expr::value(now))
            .filter(post::Column::UserId.eq(user_id))
            .filter(post::Column::PortfolioId.eq(portfolio_id))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    pub(crate) async fn ensure_owner_membership(&self, portfolio: &portfolio::Model) -> std::result::Result<(), DbErr> {
        let existing = membership::Entity::find()
            .filter(membership::Column::UserId.eq(portfolio.owner_id.clone()))
            .one(&self.db)
            .await?;

        match existing {
            Some(m) if m.portfolio_id == portfolio.id => {
                if m.status != MembershipStatus::Accepted {
                    let mut active: membership::ActiveModel = m.into();
                    active.status = Set(MembershipStatus::Accepted);
                    active.accepted_at = Set(Some(now_ts()));
                    active.update(&self.db).await?;
                }
                Ok(())
            }
            Some(m) => {
                warn!(user_id = %portfolio.owner_id, portfolio_id = %portfolio.id, other_portfolio_id = %m.portfolio_id, "Owner holds a membership in another portfolio");
                Ok(())
            }
            None => {
                let now = now_ts();
                membership::ActiveModel {
                    id: Set(new_id()),
                    portfolio_id: Set(portfolio.id.clone()),
                    user_id: Set(portfolio.owner_id.clone()),
                    invited_by: Set(None),
                    status: Set(MembershipStatus::Accepted),
                    invited_at: Set(now),
                    accepted_at: Set(Some(now)),
                }
                .insert(&self.db)
                .await?;
                Ok(())
            }
        }
    }

    /// Mark the owner's plan as the primary membership so the subscription
    /// lookup prefers it over add-ons.
    async fn stamp_primary_membership(&self, sub: &subscription::Model) -> std::result::Result<(), DbErr> {
        if sub.membership_type.as_deref() == Some(MEMBERSHIP_TYPE_PRIMARY) || sub.is_growth_member() {
            return Ok(());
        }

        let mut active: subscription::ActiveModel = sub.clone().into();
        active.membership_type = Set(Some(MEMBERSHIP_TYPE_PRIMARY.to_string()));
        active.updated_at = Set(now_ts());
        active.update(&self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{EntityTrait, PaginatorTrait};

    use crate::test_support::{growth_service_with_owner, portfolio_count};

    #[tokio::test]
    async fn test_owner_index_conflict_returns_existing_portfolio() {
        let (service, owner) = growth_service_with_owner().await;
        let first = service.create_portfolio_for_owner(&owner).await.unwrap();

        // Past the pre-check: the insert itself hits the owner index.
        let (again, created) = service.insert_portfolio(&owner).await.unwrap();
        assert!(!created);
        assert_eq!(again.id, first.id);
        assert_eq!(portfolio_count(&service, &owner).await, 1);
    }

    #[tokio::test]
    async fn test_insert_portfolio_creates_when_free() {
        let (service, owner) = growth_service_with_owner().await;
        let (portfolio, created) = service.insert_portfolio(&owner).await.unwrap();
        assert!(created);
        assert_eq!(portfolio.owner_id, owner);

        let members = entity::membership::Entity::find()
            .count(service.db())
            .await
            .unwrap();
        assert_eq!(members, 0);
    }
}
