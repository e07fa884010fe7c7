//! Runtime configuration for the lifecycle engine and webhook intake.
//!
//! Values come from environment variables through [`MarketplaceConfig::from_env`]
//! and [`WebhookConfig::from_env`]. The `from_lookup` variants take any
//! key-to-value function so tests never touch the process environment.

use crate::{
    escrow::domain::{CheckoutRedirects, SignatureError, WebhookVerifier},
    task::domain::{FeePercent, Money, TaskId},
};
use chrono::Duration;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Minimum task price in dollars.
pub const MIN_JOB_PRICE_VAR: &str = "MIN_JOB_PRICE_USD";
/// Platform commission percentage.
pub const PLATFORM_FEE_VAR: &str = "PLATFORM_FEE_PERCENT";
/// Chat window length in hours.
pub const CHAT_WINDOW_VAR: &str = "CHAT_WINDOW_HOURS";
/// Base URL for checkout redirects.
pub const FRONTEND_URL_VAR: &str = "FRONTEND_URL";
/// Shared secret for webhook signatures.
pub const WEBHOOK_SECRET_VAR: &str = "ESCROW_WEBHOOK_SECRET";
/// Accepted webhook timestamp skew in seconds.
pub const WEBHOOK_TOLERANCE_VAR: &str = "ESCROW_WEBHOOK_TOLERANCE_SECS";

const DEFAULT_MINIMUM_CENTS: u64 = 700;
const DEFAULT_CHAT_WINDOW_HOURS: i64 = 72;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Errors raised while reading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// A variable could not be parsed or is out of range.
    #[error("invalid value for {name}: {value}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Rejected raw value.
        value: String,
    },
}

/// Business settings of the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceConfig {
    /// Lowest price a task may be posted at.
    pub minimum_price: Money,
    /// Platform commission taken at checkout.
    pub platform_fee: FeePercent,
    /// How long the poster/helper chat stays open after funding.
    pub chat_window: Duration,
    /// Base URL the checkout redirects back to.
    pub frontend_url: String,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            minimum_price: Money::from_cents(DEFAULT_MINIMUM_CENTS),
            platform_fee: FeePercent::default(),
            chat_window: Duration::hours(DEFAULT_CHAT_WINDOW_HOURS),
            frontend_url: DEFAULT_FRONTEND_URL.to_owned(),
        }
    }
}

impl MarketplaceConfig {
    /// Reads settings from the process environment, defaulting unset ones.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for values that do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, defaulting unset ones.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for values that do not parse or are
    /// out of range.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let minimum_price = match setting(&lookup, MIN_JOB_PRICE_VAR) {
            Some(raw) => parse_decimal(MIN_JOB_PRICE_VAR, &raw).and_then(|dollars| {
                Money::from_decimal(dollars).map_err(|_| invalid(MIN_JOB_PRICE_VAR, &raw))
            })?,
            None => defaults.minimum_price,
        };
        let platform_fee = match setting(&lookup, PLATFORM_FEE_VAR) {
            Some(raw) => parse_decimal(PLATFORM_FEE_VAR, &raw).and_then(|percent| {
                FeePercent::new(percent).map_err(|_| invalid(PLATFORM_FEE_VAR, &raw))
            })?,
            None => defaults.platform_fee,
        };
        let chat_window = match setting(&lookup, CHAT_WINDOW_VAR) {
            Some(raw) => parse_positive(CHAT_WINDOW_VAR, &raw, Duration::try_hours)?,
            None => defaults.chat_window,
        };
        let frontend_url = setting(&lookup, FRONTEND_URL_VAR)
            .map_or(defaults.frontend_url, |url| url.trim_end_matches('/').to_owned());

        Ok(Self {
            minimum_price,
            platform_fee,
            chat_window,
            frontend_url,
        })
    }

    /// Builds the redirect targets for a task's checkout.
    #[must_use]
    pub fn checkout_redirects(&self, task_id: TaskId) -> CheckoutRedirects {
        CheckoutRedirects {
            success_url: format!(
                "{}/payment/success?session_id={{CHECKOUT_SESSION_ID}}",
                self.frontend_url
            ),
            cancel_url: format!("{}/payment/cancel?task_id={task_id}", self.frontend_url),
        }
    }
}

/// Settings for verifying inbound escrow webhooks.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Shared signing secret.
    pub secret: String,
    /// Accepted clock skew between signing and receipt.
    pub tolerance: Duration,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret", &"<redacted>")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl WebhookConfig {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when no secret is set, or
    /// [`ConfigError::Invalid`] for a malformed tolerance.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when no secret is set, or
    /// [`ConfigError::Invalid`] for a malformed tolerance.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret =
            setting(&lookup, WEBHOOK_SECRET_VAR).ok_or(ConfigError::Missing(WEBHOOK_SECRET_VAR))?;
        let tolerance = match setting(&lookup, WEBHOOK_TOLERANCE_VAR) {
            Some(raw) => parse_positive(WEBHOOK_TOLERANCE_VAR, &raw, Duration::try_seconds)?,
            None => Duration::seconds(DEFAULT_TOLERANCE_SECS),
        };
        Ok(Self { secret, tolerance })
    }

    /// Builds the signature verifier for these settings.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::EmptySecret`] if the secret is rejected.
    pub fn verifier(&self) -> Result<WebhookVerifier, SignatureError> {
        WebhookVerifier::new(self.secret.as_bytes(), self.tolerance)
    }
}

/// Returns the trimmed value of `name`, treating blank as unset.
fn setting(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn invalid(name: &'static str, raw: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: raw.to_owned(),
    }
}

fn parse_decimal(name: &'static str, raw: &str) -> Result<Decimal, ConfigError> {
    Decimal::from_str(raw).map_err(|_| invalid(name, raw))
}

fn parse_positive(
    name: &'static str,
    raw: &str,
    unit: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    raw.parse::<i64>()
        .ok()
        .filter(|value| *value > 0)
        .and_then(unit)
        .ok_or_else(|| invalid(name, raw))
}
