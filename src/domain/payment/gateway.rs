//! Payment gateway enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// The payment rails the platform charges through.
///
/// Each variant has exactly one adapter implementation; dispatch goes
/// through the gateway registry, never through conditionals in the
/// orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gateway {
    /// International card processor (Stripe Checkout).
    Card,

    /// Pagopar, Paraguay-local aggregator.
    Pagopar,

    /// Bancard vPOS, Paraguay-local card processor.
    Bancard,

    /// Direct USDT wallet transfer with manual confirmation.
    Crypto,
}

impl Gateway {
    /// Wire name used in routes, storage, and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gateway::Card => "card",
            Gateway::Pagopar => "pagopar",
            Gateway::Bancard => "bancard",
            Gateway::Crypto => "crypto",
        }
    }

    /// True when settlement is confirmed by a user-submitted proof
    /// instead of a provider push.
    pub fn is_manual_confirmation(&self) -> bool {
        matches!(self, Gateway::Crypto)
    }

    /// All known gateways, in display order.
    pub fn all() -> [Gateway; 4] {
        [
            Gateway::Card,
            Gateway::Pagopar,
            Gateway::Bancard,
            Gateway::Crypto,
        ]
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Gateway {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "card" | "stripe" => Ok(Gateway::Card),
            "pagopar" => Ok(Gateway::Pagopar),
            "bancard" => Ok(Gateway::Bancard),
            "crypto" | "usdt" => Ok(Gateway::Crypto),
            other => Err(ValidationError::invalid_format(
                "gateway",
                format!("unknown gateway: {}", other),
            )),
        }
    }
}
