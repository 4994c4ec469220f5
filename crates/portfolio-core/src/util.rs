use chrono::Utc;
use uuid::Uuid;

use crate::error::{PortfolioError, Result};

/// Invitations are valid for seven days from creation.
pub const INVITATION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

const TOKEN_BYTES: usize = 32;

pub fn now_ts() -> i64 {
    Utc::now().timestamp()
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let mut out = vec![0u8; len];
    getrandom::fill(&mut out)
        .map_err(|e| PortfolioError::Internal(format!("OS random source failed: {e}")))?;
    Ok(out)
}

/// 256-bit invitation token from the OS CSPRNG, hex-encoded.
pub fn generate_invitation_token() -> Result<String> {
    Ok(hex::encode(random_bytes(TOKEN_BYTES)?))
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique_and_hex() {
        let a = generate_invitation_token().unwrap();
        let b = generate_invitation_token().unwrap();
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_plausible_email() {
        assert!(is_plausible_email("alice@example.com"));
        assert!(!is_plausible_email("alice"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("alice@"));
        assert!(!is_plausible_email("a@b@c"));
        assert!(!is_plausible_email("al ice@example.com"));
    }
}
