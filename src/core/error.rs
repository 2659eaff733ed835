//! Error kinds for the fetch and refresh paths.

use std::time::Duration;
use thiserror::Error;

/// A single upstream call failed.
///
/// Always recovered where it happens: the holding keeps its fallback price or
/// goes without fundamentals for the cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("{provider} request failed for {symbol}: {message}")]
    Upstream {
        provider: String,
        symbol: String,
        message: String,
    },

    #[error("{provider} returned an unusable payload for {symbol}: {message}")]
    InvalidPayload {
        provider: String,
        symbol: String,
        message: String,
    },

    #[error("{provider} did not answer for {symbol} within {after:?}")]
    Timeout {
        provider: String,
        symbol: String,
        after: Duration,
    },
}

impl FetchError {
    pub fn upstream(provider: &str, symbol: &str, message: impl Into<String>) -> Self {
        FetchError::Upstream {
            provider: provider.to_string(),
            symbol: symbol.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_payload(provider: &str, symbol: &str, message: impl Into<String>) -> Self {
        FetchError::InvalidPayload {
            provider: provider.to_string(),
            symbol: symbol.to_string(),
            message: message.into(),
        }
    }
}

/// The whole fetch-aggregate cycle failed. Shown to the user; previously
/// published data stays in place.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CycleError {
    #[error("invalid holding {symbol}: {reason}")]
    InvalidHolding { symbol: String, reason: String },

    #[error("refresh task aborted: {0}")]
    Aborted(String),
}
