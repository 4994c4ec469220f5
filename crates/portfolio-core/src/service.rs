use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::config::Config;
use crate::db::connect_and_migrate;
use crate::error::Result;
use crate::mailer::{BrevoMailer, InvitationMailer, NoopMailer};
use crate::tier::TierTable;

/// Entry point for every portfolio operation.
///
/// Holds no per-request state; operations are implemented in the lifecycle,
/// invitation, collaborator, access and sync modules.
#[derive(Clone)]
pub struct PortfolioService {
    pub(crate) db: DatabaseConnection,
    pub(crate) tiers: TierTable,
    pub(crate) mailer: Arc<dyn InvitationMailer>,
}

impl PortfolioService {
    pub fn new(db: DatabaseConnection, tiers: TierTable, mailer: Arc<dyn InvitationMailer>) -> Self {
        Self { db, tiers, mailer }
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let db = connect_and_migrate(&config.database_url).await?;

        let mailer: Arc<dyn InvitationMailer> = match &config.brevo {
            Some(brevo) => Arc::new(BrevoMailer::new(brevo.clone())),
            None => {
                warn!("BREVO_API_KEY / BREVO_SENDER_EMAIL not set; invitation emails will not be sent");
                Arc::new(NoopMailer)
            }
        };

        Ok(Self::new(db, config.tiers.clone(), mailer))
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }
}
