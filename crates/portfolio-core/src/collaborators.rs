use std::collections::HashMap;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use tracing::{info, warn};

use entity::membership::{self, MembershipStatus};
use entity::user;

use crate::error::{PortfolioError, Result};
use crate::service::PortfolioService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub is_owner: bool,
    pub invited_by: Option<String>,
    /// Unix timestamp (seconds).
    pub accepted_at: Option<i64>,
}

impl PortfolioService {
    /// Owner first, then accepted collaborators in the order they joined.
    /// Only members of the portfolio may list it.
    pub async fn list_collaborators(&self, portfolio_id: &str, requester_id: &str) -> Result<Vec<Collaborator>> {
        let portfolio = self.find_portfolio(portfolio_id).await?;
        if !self.is_member(&portfolio, requester_id).await? {
            return Err(PortfolioError::Unauthorized("Only portfolio members can view collaborators"));
        }

        let members = membership::Entity::find()
            .filter(membership::Column::PortfolioId.eq(portfolio.id.clone()))
            .filter(membership::Column::Status.eq(MembershipStatus::Accepted))
            .all(&self.db)
            .await?;

        let mut user_ids: Vec<String> = members.iter().map(|m| m.user_id.clone()).collect();
        if !user_ids.contains(&portfolio.owner_id) {
            user_ids.push(portfolio.owner_id.clone());
        }

        let users: HashMap<String, user::Model> = user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let mut owner_row = None;
        let mut collaborators = Vec::with_capacity(members.len());
        for m in members {
            let Some(u) = users.get(&m.user_id) else {
                warn!(portfolio_id = %portfolio.id, user_id = %m.user_id, "Membership without a user profile");
                continue;
            };
            let entry = Collaborator {
                user_id: u.id.clone(),
                email: u.email.clone(),
                display_name: u.display_name.clone(),
                is_owner: m.user_id == portfolio.owner_id,
                invited_by: m.invited_by,
                accepted_at: m.accepted_at,
            };
            if entry.is_owner {
                owner_row = Some(entry);
            } else {
                collaborators.push(entry);
            }
        }

        // The owner is listed even if their self-membership is missing.
        let owner_row = owner_row.or_else(|| {
            users.get(&portfolio.owner_id).map(|u| Collaborator {
                user_id: u.id.clone(),
                email: u.email.clone(),
                display_name: u.display_name.clone(),
                is_owner: true,
                invited_by: None,
                accepted_at: Some(portfolio.created_at),
            })
        });

        collaborators.sort_by_key(|c| c.accepted_at);
        Ok(owner_row.into_iter().chain(collaborators).collect())
    }

    /// Owner removes a collaborator.
    ///
    /// Deleting the membership is the operation. The collaborator's derived
    /// subscription and the portfolio pointers on their profile and posts are
    /// cleaned up best-effort.
    pub async fn remove_collaborator(&self, portfolio_id: &str, collaborator_id: &str, owner_id: &str) -> Result<()> {
        let portfolio = self.require_owner(portfolio_id, owner_id).await?;
        if collaborator_id == portfolio.owner_id {
            return Err(PortfolioError::InvalidInput("The portfolio owner cannot be removed"));
        }

        let res = membership::Entity::delete_many()
            .filter(membership::Column::PortfolioId.eq(portfolio.id.clone()))
            .filter(membership::Column::UserId.eq(collaborator_id))
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Err(PortfolioError::NotFound("Collaborator"));
        }
        info!(portfolio_id = %portfolio.id, user_id = %collaborator_id, "Collaborator removed");

        if let Err(e) = self.delete_growth_member(collaborator_id).await {
            warn!(user_id = %collaborator_id, error = %e, "Failed to delete derived subscription");
        }
        if let Err(e) = self.detach_user_from_portfolio(collaborator_id, &portfolio.id).await {
            warn!(portfolio_id = %portfolio.id, user_id = %collaborator_id, error = %e, "Failed to detach collaborator content");
        }

        Ok(())
    }
}
