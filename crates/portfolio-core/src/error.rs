use sea_orm::DbErr;
use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PortfolioError>;

/// Outcomes surfaced to callers of the portfolio operations.
///
/// Everything except `StorageFailure` and `Internal` is a business-rule
/// outcome and carries a message that is safe to show to the end user.
#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("This feature requires the Growth plan")]
    TierIneligible,

    #[error("{0}")]
    AlreadyExists(&'static str),

    #[error("This invitation is invalid or has expired")]
    InvalidOrExpired,

    #[error("This invitation was sent to a different email address")]
    EmailMismatch,

    #[error("You already belong to a portfolio")]
    AlreadyInPortfolio,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("storage failure: {0}")]
    StorageFailure(#[from] DbErr),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PortfolioError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::TierIneligible => "tier_ineligible",
            Self::AlreadyExists(_) => "already_exists",
            Self::InvalidOrExpired => "invalid_or_expired",
            Self::EmailMismatch => "email_mismatch",
            Self::AlreadyInPortfolio => "already_in_portfolio",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::StorageFailure(_) => "storage_failure",
            Self::Internal(_) => "internal_error",
        }
    }

    /// HTTP status an HTTP-facing layer should answer with.
    pub fn status(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 403,
            Self::TierIneligible => 402,
            Self::AlreadyExists(_) | Self::AlreadyInPortfolio => 409,
            Self::InvalidOrExpired => 410,
            Self::EmailMismatch => 403,
            Self::NotFound(_) => 404,
            Self::InvalidInput(_) => 400,
            Self::StorageFailure(_) | Self::Internal(_) => 500,
        }
    }

    pub fn is_business_rule(&self) -> bool {
        !matches!(self, Self::StorageFailure(_) | Self::Internal(_))
    }

    /// Message for the end user. Storage and internal details never leak.
    pub fn user_message(&self) -> String {
        if self.is_business_rule() {
            self.to_string()
        } else {
            "Internal server error".to_string()
        }
    }

    /// Error envelope: `{"success": false, "error": {"code", "message"}}`.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": self.user_message(),
            }
        })
    }
}
