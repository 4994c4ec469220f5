//! Shared portfolios: a GROWTH subscriber owns a portfolio, invites
//! collaborators by email, and shares organizational posts with members who
//! hold a matching organization grant. Collaborators inherit the owner's plan
//! through derived `growth_member` subscriptions.

pub mod access;
pub mod collaborators;
pub mod config;
pub mod db;
pub mod error;
pub mod invitation;
pub mod lifecycle;
pub mod mailer;
pub mod service;
pub mod subscription;
pub mod sync;
#[cfg(test)]
mod test_support;
pub mod tier;
pub mod util;

pub use access::{ContentItem, PublishTarget, Viewer, Visibility};
pub use collaborators::Collaborator;
pub use config::{BrevoConfig, Config};
pub use error::{PortfolioError, Result};
pub use mailer::{BrevoMailer, InvitationMailer, MailError, NoopMailer};
pub use service::PortfolioService;
pub use sync::{ReconcileReport, SubscriptionChange, SyncReport};
pub use tier::{Tier, TierTable};
