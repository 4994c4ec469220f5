use crate::tier::{Tier, TierTable};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://portfolio.db?mode=rwc";

pub fn normalize_env_value(raw: String) -> String {
    let trimmed = raw.trim();

    if let Some(inner) = trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return inner.trim().to_string();
    }
    if let Some(inner) = trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return inner.trim().to_string();
    }

    trimmed.to_string()
}

pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(normalize_env_value)
        .filter(|s| !s.is_empty())
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Brevo transactional email settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrevoConfig {
    pub api_key: String,
    pub sender_email: String,
    pub sender_name: Option<String>,
    /// Base URL of the app; the accept link is `{app_base_url}/invite?token=...`.
    pub app_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub tiers: TierTable,
    /// None when email delivery is not configured.
    pub brevo: Option<BrevoConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(env_string)
    }

    /// Build from an arbitrary key lookup. Values are expected to be
    /// normalized already (see [`env_string`]).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut tiers = TierTable::new();
        for (key, tier) in [
            ("PRICE_IDS_LITE", Tier::Lite),
            ("PRICE_IDS_STARTER", Tier::Starter),
            ("PRICE_IDS_GROWTH", Tier::Growth),
            ("PRICE_IDS_ENTERPRISE", Tier::Enterprise),
        ] {
            if let Some(raw) = lookup(key) {
                for price_id in split_list(&raw) {
                    tiers.insert(price_id, tier);
                }
            }
        }
        tiers.set_extra_seat_price(lookup("PRICE_ID_EXTRA_SEAT"));

        let brevo = match (lookup("BREVO_API_KEY"), lookup("BREVO_SENDER_EMAIL")) {
            (Some(api_key), Some(sender_email)) => Some(BrevoConfig {
                api_key,
                sender_email,
                sender_name: lookup("BREVO_SENDER_NAME"),
                app_base_url: lookup("APP_BASE_URL")
                    .unwrap_or_else(|| "http://localhost:3000".to_string()),
            }),
            _ => None,
        };

        Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            tiers,
            brevo,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_normalize_env_value() {
        assert_eq!(normalize_env_value("  \"abc\" ".into()), "abc");
        assert_eq!(normalize_env_value("'abc'".into()), "abc");
        assert_eq!(normalize_env_value(" abc ".into()), "abc");
    }

    #[test]
    fn test_price_lists() {
        let config = Config::from_lookup(lookup_from(&[
            ("PRICE_IDS_GROWTH", "price_g_month, price_g_year,"),
            ("PRICE_IDS_LITE", "price_lite"),
            ("PRICE_ID_EXTRA_SEAT", "price_seat"),
        ]));

        assert_eq!(config.tiers.resolve(Some("price_g_year")), Tier::Growth);
        assert_eq!(config.tiers.resolve(Some("price_lite")), Tier::Lite);
        assert_eq!(config.tiers.extra_seat_price_id(), Some("price_seat"));
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_brevo_requires_key_and_sender() {
        let config = Config::from_lookup(lookup_from(&[("BREVO_API_KEY", "k")]));
        assert!(config.brevo.is_none());

        let config = Config::from_lookup(lookup_from(&[
            ("BREVO_API_KEY", "k"),
            ("BREVO_SENDER_EMAIL", "team@example.com"),
            ("APP_BASE_URL", "https://app.example.com"),
        ]));
        let brevo = config.brevo.unwrap();
        assert_eq!(brevo.sender_email, "team@example.com");
        assert_eq!(brevo.sender_name, None);
        assert_eq!(brevo.app_base_url, "https://app.example.com");
    }
}
