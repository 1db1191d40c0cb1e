//! Error types for BoostBot.

use crate::catalog::ServiceId;

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Catalog read errors. The catalog itself is read-only reference data; these
/// only cover the backend being unreachable or misbehaving.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog backend error: {0}")]
    Backend(String),
}

/// Pricing resolution errors.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("No pricing configured for service {service}")]
    NoPricingConfigured { service: ServiceId },

    #[error("No pricing tier covers quantity {quantity}")]
    NoTierForQuantity { quantity: u32 },

    #[error("Unrecognized pricing mode for service {service}")]
    UnknownMode { service: ServiceId },
}

/// User-input validation errors. Rendered verbatim as the reply text, so the
/// messages are user-facing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid username. Please try again.")]
    EmptyTarget,

    #[error("Enter a number between {min} and {max}.")]
    InvalidQuantity { min: u32, max: u32 },

    #[error("Enter at least {min}, at most {max} comments.")]
    InvalidComments { min: u32, max: u32 },
}

/// Order submission errors from the fulfillment provider boundary.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Provider rejected order: {reason}")]
    Rejected { reason: String },

    #[error("Provider request failed: {0}")]
    Http(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Order persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Order store backend error: {0}")]
    Backend(String),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("No channel registered with name {0}")]
    UnknownChannel(String),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
