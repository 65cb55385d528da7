//! Gateway configuration
//!
//! Credentials, rates, and the crypto discount for every payment rail.
//! All of it is late-bound: adapters and the rate converter receive
//! these values at construction, nothing is compiled in.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::pricing::RateTable;

use super::error::ValidationError;

/// Configuration for all four payment rails.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaysConfig {
    /// International card processor (Stripe Checkout).
    pub stripe: StripeSettings,

    /// Pagopar (Paraguay-local aggregator).
    pub pagopar: LocalGatewaySettings,

    /// Bancard vPOS (Paraguay-local card processor).
    pub bancard: LocalGatewaySettings,

    /// Direct USDT transfer.
    pub crypto: CryptoSettings,

    /// Per-request timeout for provider HTTP calls, in seconds.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
}

/// Stripe credentials and settlement rate.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSettings {
    /// Secret API key (sk_live_... or sk_test_...).
    pub api_key: String,

    /// Webhook signing secret (whsec_...).
    pub webhook_secret: String,

    /// Redirect target after successful checkout.
    pub success_url: String,

    /// Redirect target after abandoned checkout.
    pub cancel_url: String,

    /// Guaraníes per US dollar for USD settlement.
    pub pyg_per_usd: Decimal,
}

impl StripeSettings {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.api_key.starts_with("sk_test_")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if !self.api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if self.webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }
        if !self.webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if self.pyg_per_usd <= Decimal::ZERO {
            return Err(ValidationError::InvalidExchangeRate("pyg_per_usd"));
        }
        Ok(())
    }
}

/// Key pair and return URL shared by the two local gateways.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalGatewaySettings {
    /// Merchant public key.
    pub public_key: String,

    /// Merchant private key.
    pub private_key: String,

    /// Where the gateway sends the user after paying.
    pub return_url: String,

    /// Use the provider's staging environment.
    #[serde(default)]
    pub sandbox: bool,
}

impl LocalGatewaySettings {
    pub fn validate(&self, which: &'static str) -> Result<(), ValidationError> {
        if self.public_key.is_empty() || self.private_key.is_empty() {
            return Err(ValidationError::MissingRequired(which));
        }
        Ok(())
    }
}

/// Direct-transfer wallet and pricing incentives.
#[derive(Debug, Clone, Deserialize)]
pub struct CryptoSettings {
    /// Platform wallet address users transfer to.
    pub wallet_address: String,

    /// Network label shown with the address.
    #[serde(default = "default_network")]
    pub network: String,

    /// Guaraníes per USDT unit.
    pub pyg_per_usdt: Decimal,

    /// Discount applied to the home-currency amount, in percent.
    #[serde(default = "default_discount")]
    pub discount_percent: Decimal,
}

impl CryptoSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.wallet_address.trim().is_empty() {
            return Err(ValidationError::InvalidWalletAddress);
        }
        if self.pyg_per_usdt <= Decimal::ZERO {
            return Err(ValidationError::InvalidExchangeRate("pyg_per_usdt"));
        }
        if self.discount_percent < Decimal::ZERO || self.discount_percent >= Decimal::from(100) {
            return Err(ValidationError::InvalidCryptoDiscount);
        }
        Ok(())
    }
}

impl GatewaysConfig {
    /// Validate every gateway section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.stripe.validate()?;
        self.pagopar.validate("PAGOPAR keys")?;
        self.bancard.validate("BANCARD keys")?;
        self.crypto.validate()?;
        if self.call_timeout_secs == 0 || self.call_timeout_secs > 30 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }

    /// The rate table the converter runs on.
    pub fn rate_table(&self) -> RateTable {
        RateTable {
            pyg_per_usd: self.stripe.pyg_per_usd,
            pyg_per_usdt: self.crypto.pyg_per_usdt,
            crypto_discount_percent: self.crypto.discount_percent,
        }
    }
}

fn default_call_timeout() -> u64 {
    5
}

fn default_network() -> String {
    "TRC20".to_string()
}

fn default_discount() -> Decimal {
    Decimal::from(25)
}
