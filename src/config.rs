//! Configuration types, loaded from the environment.

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;

use crate::error::ConfigError;

/// Bot-wide configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Fixed per-order surcharge added to every base price, in USD.
    pub fixed_fee: Decimal,
    /// Retry budget for collaborator calls (retries after the first try).
    pub retry_attempts: u32,
    /// Base delay for the retry backoff.
    pub retry_base_delay: Duration,
    /// Session workers exit after this long without an event.
    pub session_idle_timeout: Duration,
    /// Chat ids of privileged operators, notified of confirmed orders.
    pub operator_ids: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            fixed_fee: dec!(0.5),
            retry_attempts: 3,
            retry_base_delay: Duration::from_secs(1),
            session_idle_timeout: Duration::from_secs(3600),
            operator_ids: Vec::new(),
        }
    }
}

impl BotConfig {
    /// Load configuration from `BOOSTBOT_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(fee) = std::env::var("BOOSTBOT_FIXED_FEE") {
            config.fixed_fee =
                Decimal::from_str(fee.trim()).map_err(|e| ConfigError::InvalidValue {
                    key: "BOOSTBOT_FIXED_FEE".into(),
                    message: e.to_string(),
                })?;
        }
        if let Ok(attempts) = std::env::var("BOOSTBOT_RETRY_ATTEMPTS") {
            config.retry_attempts =
                attempts
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        key: "BOOSTBOT_RETRY_ATTEMPTS".into(),
                        message: e.to_string(),
                    })?;
        }
        if let Ok(secs) = std::env::var("BOOSTBOT_SESSION_IDLE_SECS") {
            let secs: u64 =
                secs.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        key: "BOOSTBOT_SESSION_IDLE_SECS".into(),
                        message: e.to_string(),
                    })?;
            config.session_idle_timeout = Duration::from_secs(secs);
        }
        if let Ok(ids) = std::env::var("BOOSTBOT_OPERATOR_IDS") {
            config.operator_ids = split_list(&ids);
        }

        Ok(config)
    }
}

/// Telegram transport configuration. Absent when no bot token is set.
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
}

impl TelegramConfig {
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        if token.trim().is_empty() {
            return None;
        }
        Some(Self {
            bot_token: SecretString::from(token),
        })
    }
}

/// Fulfillment provider configuration. Absent when no provider is wired up,
/// in which case submissions run against the in-memory backend.
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_url: String,
    pub api_key: SecretString,
}

impl ProviderConfig {
    pub fn from_env() -> Option<Self> {
        let api_url = std::env::var("BOOSTBOT_PROVIDER_URL").ok()?;
        if api_url.trim().is_empty() {
            return None;
        }
        let api_key = std::env::var("BOOSTBOT_PROVIDER_KEY").unwrap_or_default();
        Some(Self {
            api_url,
            api_key: SecretString::from(api_key),
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_storefront_policy() {
        let config = BotConfig::default();
        assert_eq!(config.fixed_fee, dec!(0.5));
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_base_delay, Duration::from_secs(1));
        assert!(config.operator_ids.is_empty());
    }

    #[test]
    fn split_list_trims_and_drops_empties() {
        assert_eq!(
            split_list("431293700, 99 ,,7"),
            vec!["431293700", "99", "7"]
        );
        assert!(split_list("").is_empty());
        assert!(split_list(" , ").is_empty());
    }
}
