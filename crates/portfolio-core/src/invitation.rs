//! Invitation issuance, validation and acceptance.

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::{debug, info, warn};

use entity::invitation::{self, InvitationStatus};
use entity::membership::{self, MembershipStatus};
use entity::{portfolio, user};

use crate::db::is_unique_violation;
use crate::error::{PortfolioError, Result};
use crate::service::PortfolioService;
use crate::tier::Tier;
use crate::util::{generate_invitation_token, is_plausible_email, new_id, normalize_email, now_ts, INVITATION_TTL_SECS};

impl PortfolioService {
    /// Invite an email address to the inviter's portfolio.
    ///
    /// The email is dispatched after the invitation is stored; a delivery
    /// failure is logged and the invitation is still returned.
    pub async fn create_invitation(&self, portfolio_id: &str, email: &str, inviter_id: &str) -> Result<invitation::Model> {
        let email = normalize_email(email);
        if !is_plausible_email(&email) {
            return Err(PortfolioError::InvalidInput("A valid email address is required"));
        }

        let portfolio = self.require_owner(portfolio_id, inviter_id).await?;

        let (_, tier) = self.active_tier(inviter_id).await?;
        if tier != Tier::Growth {
            return Err(PortfolioError::TierIneligible);
        }

        let now = now_ts();
        let pending = invitation::Entity::find()
            .filter(invitation::Column::PortfolioId.eq(portfolio.id.clone()))
            .filter(invitation::Column::Email.eq(email.clone()))
            .filter(invitation::Column::Status.eq(InvitationStatus::Pending))
            .all(&self.db)
            .await?;
        for existing in pending {
            if existing.is_past_due(now) {
                self.mark_invitation(&existing, InvitationStatus::Expired).await?;
            } else {
                return Err(PortfolioError::AlreadyExists("An invitation already exists for this email"));
            }
        }

        // Account emails come from sign-up as typed.
        let invitee = user::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(user::Column::Email))).eq(email.clone()))
            .one(&self.db)
            .await?;
        if let Some(invitee) = invitee {
            if self.is_member(&portfolio, &invitee.id).await? {
                return Err(PortfolioError::AlreadyExists("This person is already a member of your portfolio"));
            }
        }

        let token = generate_invitation_token()?;
        let invitation = self
            .insert_invitation(invitation::ActiveModel {
                id: Set(new_id()),
                portfolio_id: Set(portfolio.id.clone()),
                email: Set(email.clone()),
                token: Set(token.clone()),
                invited_by: Set(inviter_id.to_string()),
                status: Set(InvitationStatus::Pending),
                expires_at: Set(now + INVITATION_TTL_SECS),
                created_at: Set(now),
            })
            .await?;
        info!(portfolio_id = %portfolio.id, invitation_id = %invitation.id, "Invitation created");

        let inviter_name = self.display_name(inviter_id).await;
        if let Err(e) = self.mailer.send_invitation(&email, &token, &inviter_name).await {
            warn!(invitation_id = %invitation.id, error = %e, "Failed to send invitation email");
        }

        Ok(invitation)
    }

    /// Look up a usable invitation.
    ///
    /// Returns None for unknown, consumed or expired tokens. A pending
    /// invitation past its expiry is flipped to `expired` on the way out.
    pub async fn get_invitation_by_token(&self, token: &str) -> Result<Option<invitation::Model>> {
        let Some(invitation) = invitation::Entity::find()
            .filter(invitation::Column::Token.eq(token))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        if invitation.status != InvitationStatus::Pending {
            debug!(invitation_id = %invitation.id, status = ?invitation.status, "Invitation already consumed");
            return Ok(None);
        }

        if invitation.is_past_due(now_ts()) {
            self.mark_invitation(&invitation, InvitationStatus::Expired).await?;
            info!(invitation_id = %invitation.id, "Invitation expired");
            return Ok(None);
        }

        Ok(Some(invitation))
    }

    /// Join the invited portfolio.
    ///
    /// The membership insert is the operation: if it fails nothing changes.
    /// Marking the invitation, moving the user's content and mirroring the
    /// owner's plan are logged on failure and repaired by
    /// [`PortfolioService::reconcile_portfolio`].
    pub async fn accept_invitation(&self, token: &str, user_id: &str) -> Result<membership::Model> {
        let invitation = self
            .get_invitation_by_token(token)
            .await?
            .ok_or(PortfolioError::InvalidOrExpired)?;

        let account = user::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?
            .ok_or(PortfolioError::NotFound("Account"))?;
        if normalize_email(&account.email) != normalize_email(&invitation.email) {
            return Err(PortfolioError::EmailMismatch);
        }

        if self.owned_portfolio(user_id).await?.is_some() || self.membership_for_user(user_id).await?.is_some() {
            return Err(PortfolioError::AlreadyInPortfolio);
        }

        let portfolio = portfolio::Entity::find_by_id(invitation.portfolio_id.clone())
            .one(&self.db)
            .await?
            .ok_or(PortfolioError::InvalidOrExpired)?;

        let membership = self.insert_membership(&invitation, user_id).await?;
        info!(portfolio_id = %portfolio.id, user_id = %user_id, invitation_id = %invitation.id, "Invitation accepted");

        if let Err(e) = self.mark_invitation(&invitation, InvitationStatus::Accepted).await {
            warn!(invitation_id = %invitation.id, error = %e, "Failed to mark invitation accepted");
        }

        if let Err(e) = self.attach_user_to_portfolio(user_id, &portfolio.id).await {
            warn!(portfolio_id = %portfolio.id, user_id = %user_id, error = %e, "Failed to move collaborator content into portfolio");
        }

        if let Err(e) = self.mirror_owner_plan(&portfolio, user_id).await {
            warn!(portfolio_id = %portfolio.id, user_id = %user_id, error = %e, "Failed to derive collaborator subscription");
        }

        Ok(membership)
    }

    /// Invitee turns the invitation down.
    pub async fn decline_invitation(&self, token: &str, user_id: &str) -> Result<()> {
        let invitation = self
            .get_invitation_by_token(token)
            .await?
            .ok_or(PortfolioError::InvalidOrExpired)?;

        let account = user::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?
            .ok_or(PortfolioError::NotFound("Account"))?;
        if normalize_email(&account.email) != normalize_email(&invitation.email) {
            return Err(PortfolioError::EmailMismatch);
        }

        self.mark_invitation(&invitation, InvitationStatus::Declined).await?;
        info!(invitation_id = %invitation.id, "Invitation declined");
        Ok(())
    }

    /// Owner withdraws a pending invitation.
    pub async fn cancel_invitation(&self, invitation_id: &str, portfolio_id: &str, requester_id: &str) -> Result<()> {
        let portfolio = self.require_owner(portfolio_id, requester_id).await?;

        let invitation = invitation::Entity::find_by_id(invitation_id.to_string())
            .filter(invitation::Column::PortfolioId.eq(portfolio.id.clone()))
            .one(&self.db)
            .await?
            .ok_or(PortfolioError::NotFound("Invitation"))?;

        if invitation.status != InvitationStatus::Pending {
            return Err(PortfolioError::InvalidOrExpired);
        }

        self.mark_invitation(&invitation, InvitationStatus::Declined).await?;
        info!(portfolio_id = %portfolio.id, invitation_id = %invitation.id, "Invitation cancelled");
        Ok(())
    }

    /// Pending, unexpired invitations for the owner's portfolio, oldest first.
    pub async fn list_pending_invitations(&self, portfolio_id: &str, requester_id: &str) -> Result<Vec<invitation::Model>> {
        let portfolio = self.require_owner(portfolio_id, requester_id).await?;

        let now = now_ts();
        let pending = invitation::Entity::find()
            .filter(invitation::Column::PortfolioId.eq(portfolio.id))
            .filter(invitation::Column::Status.eq(InvitationStatus::Pending))
            .order_by_asc(invitation::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let mut valid = Vec::with_capacity(pending.len());
        for inv in pending {
            if inv.is_past_due(now) {
                self.mark_invitation(&inv, InvitationStatus::Expired).await?;
            } else {
                valid.push(inv);
            }
        }
        Ok(valid)
    }

    /// Flip every past-due pending invitation to `expired`. Returns how many changed.
    pub async fn expire_stale_invitations(&self) -> Result<u64> {
        let res = invitation::Entity::update_many()
            .col_expr(invitation::Column::Status, Expr::value(InvitationStatus::Expired))
            .filter(invitation::Column::Status.eq(InvitationStatus::Pending))
            .filter(invitation::Column::ExpiresAt.lt(now_ts()))
            .exec(&self.db)
            .await?;

        if res.rows_affected > 0 {
            info!(count = res.rows_affected, "Expired stale invitations");
        }
        Ok(res.rows_affected)
    }

    pub(crate) async fn insert_invitation(&self, active: invitation::ActiveModel) -> Result<invitation::Model> {
        match active.insert(&self.db).await {
            Ok(inv) => Ok(inv),
            Err(e) if is_unique_violation(&e) => {
                Err(PortfolioError::AlreadyExists("An invitation already exists for this email"))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Accepted membership in the invitation's portfolio. The user index
    /// turns a concurrent second membership into `AlreadyInPortfolio`.
    pub(crate) async fn insert_membership(&self, invitation: &invitation::Model, user_id: &str) -> Result<membership::Model> {
        let active = membership::ActiveModel {
            id: Set(new_id()),
            portfolio_id: Set(invitation.portfolio_id.clone()),
            user_id: Set(user_id.to_string()),
            invited_by: Set(Some(invitation.invited_by.clone())),
            status: Set(MembershipStatus::Accepted),
            invited_at: Set(invitation.created_at),
            accepted_at: Set(Some(now_ts())),
        };
        match active.insert(&self.db).await {
            Ok(m) => Ok(m),
            Err(e) if is_unique_violation(&e) => Err(PortfolioError::AlreadyInPortfolio),
            Err(e) => Err(e.into()),
        }
    }

    /// Move a pending invitation to a terminal status. Rows that already
    /// left `pending` are not touched.
    async fn mark_invitation(&self, invitation: &invitation::Model, status: InvitationStatus) -> Result<()> {
        invitation::Entity::update_many()
            .col_expr(invitation::Column::Status, Expr::value(status))
            .filter(invitation::Column::Id.eq(invitation.id.clone()))
            .filter(invitation::Column::Status.eq(InvitationStatus::Pending))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn display_name(&self, user_id: &str) -> String {
        match user::Entity::find_by_id(user_id.to_string()).one(&self.db).await {
            Ok(Some(u)) => u.display_name.filter(|n| !n.trim().is_empty()).unwrap_or(u.email),
            Ok(None) => "A teammate".to_string(),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to load inviter profile");
                "A teammate".to_string()
            }
        }
    }
}
