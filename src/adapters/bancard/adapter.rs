//! Bancard vPOS adapter (Paraguay-local card processor).
//!
//! A single-buy call registers the charge under a merchant-assigned
//! `shop_process_id` and yields a hosted checkout URL. Bancard
//! confirms by POSTing an operation object whose token is a keyed
//! digest over the process id, amount, and currency.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::adapters::signing::{hex_digests_match, hmac_sha256_hex};
use crate::domain::foundation::CorrelationId;
use crate::domain::payment::{Gateway, Payment};
use crate::ports::{
    CheckoutInstructions, GatewayAdapter, GatewayError, GatewayIntent, SettlementOutcome,
    SettlementResult,
};

/// Response code Bancard uses for an approved operation.
const APPROVED_CODE: &str = "00";

/// Bancard vPOS configuration.
#[derive(Clone)]
pub struct BancardConfig {
    /// Merchant public key.
    pub public_key: String,

    /// Merchant private key, used for operation tokens.
    pub private_key: SecretString,

    /// vPOS host.
    pub api_base_url: String,

    /// Where Bancard sends the user after paying.
    pub return_url: String,

    /// Per-request timeout for provider calls.
    pub timeout: Duration,
}

impl BancardConfig {
    pub fn new(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: SecretString::new(private_key.into()),
            api_base_url: "https://vpos.infonet.com.py".to_string(),
            return_url: return_url.into(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Point the adapter at the staging vPOS host (tests/sandbox).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Response of the single-buy call.
#[derive(Debug, Deserialize)]
struct SingleBuyResponse {
    status: String,
    process_id: String,
}

/// Confirmation POST body.
#[derive(Debug, Deserialize)]
struct BancardConfirmation {
    operation: BancardOperation,
}

#[derive(Debug, Deserialize)]
struct BancardOperation {
    token: String,
    shop_process_id: String,
    response_code: String,
    #[serde(default)]
    amount: String,
    #[serde(default)]
    currency: String,
}

/// Bancard vPOS gateway adapter.
pub struct BancardAdapter {
    config: BancardConfig,
    http_client: reqwest::Client,
}

impl BancardAdapter {
    pub fn new(config: BancardConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn single_buy_token(&self, shop_process_id: &str, amount: &str, currency: &str) -> String {
        hmac_sha256_hex(
            self.config.private_key.expose_secret().as_bytes(),
            format!("{}{}{}", shop_process_id, amount, currency).as_bytes(),
        )
    }

    fn confirmation_token(&self, shop_process_id: &str, amount: &str, currency: &str) -> String {
        hmac_sha256_hex(
            self.config.private_key.expose_secret().as_bytes(),
            format!("{}confirm{}{}", shop_process_id, amount, currency).as_bytes(),
        )
    }
}

#[async_trait]
impl GatewayAdapter for BancardAdapter {
    fn gateway(&self) -> Gateway {
        Gateway::Bancard
    }

    async fn create_intent(&self, payment: &Payment) -> Result<GatewayIntent, GatewayError> {
        let shop_process_id = payment.id.as_uuid().simple().to_string();
        let amount = format!("{:.2}", payment.amount.amount());
        let currency = payment.amount.currency().code();

        let body = serde_json::json!({
            "public_key": self.config.public_key,
            "operation": {
                "token": self.single_buy_token(&shop_process_id, &amount, currency),
                "shop_process_id": shop_process_id,
                "amount": amount,
                "currency": currency,
                "description": "Suscripción Suscribot",
                "return_url": self.config.return_url,
                "cancel_url": self.config.return_url,
            }
        });

        let response = self
            .http_client
            .post(format!("{}/vpos/api/0.3/single_buy", self.config.api_base_url))
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::network(format!("bancard unreachable: {}", e)))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(GatewayError::network(format!("bancard returned {}", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::provider(format!(
                "single buy rejected ({}): {}",
                status, body
            )));
        }

        let parsed: SingleBuyResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::protocol(format!("invalid single buy response: {}", e)))?;

        if parsed.status != "success" {
            return Err(GatewayError::declined(format!(
                "bancard refused the operation: {}",
                parsed.status
            )));
        }

        let url = format!(
            "{}/payment/single_buy?process_id={}",
            self.config.api_base_url, parsed.process_id
        );
        let correlation_id = CorrelationId::new(shop_process_id)
            .map_err(|e| GatewayError::protocol(e.to_string()))?;

        Ok(GatewayIntent {
            correlation_id,
            instructions: CheckoutInstructions::Redirect { url },
        })
    }

    async fn confirm_callback(
        &self,
        payload: &[u8],
        _signature: Option<&str>,
    ) -> Result<SettlementResult, GatewayError> {
        let confirmation: BancardConfirmation = serde_json::from_slice(payload)
            .map_err(|e| GatewayError::protocol(format!("invalid confirmation payload: {}", e)))?;
        let metadata: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| GatewayError::protocol(e.to_string()))?;

        let op = &confirmation.operation;
        let expected = self.confirmation_token(&op.shop_process_id, &op.amount, &op.currency);
        if !hex_digests_match(&expected, &op.token) {
            tracing::warn!(
                shop_process_id = %op.shop_process_id,
                "bancard confirmation token mismatch"
            );
            return Err(GatewayError::signature("confirmation token mismatch"));
        }

        let correlation_id = CorrelationId::new(op.shop_process_id.clone())
            .map_err(|e| GatewayError::protocol(e.to_string()))?;

        Ok(SettlementResult {
            correlation_id,
            outcome: if op.response_code == APPROVED_CODE {
                SettlementOutcome::Settled
            } else {
                SettlementOutcome::Declined
            },
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_KEY: &str = "bc-priv-2210";

    fn adapter() -> BancardAdapter {
        BancardAdapter::new(BancardConfig::new(
            "bc-pub-0375",
            PRIVATE_KEY,
            "https://app.suscribot.com.py/pago/retorno",
        ))
    }

    fn confirmation(process_id: &str, response_code: &str, token: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "operation": {
                "token": token,
                "shop_process_id": process_id,
                "response": if response_code == "00" { "S" } else { "N" },
                "response_code": response_code,
                "response_description": if response_code == "00" { "Transaccion aprobada" } else { "Fondos insuficientes" },
                "amount": "150000.00",
                "currency": "PYG",
                "authorization_number": "043512",
            }
        }))
        .unwrap()
    }

    fn valid_token(process_id: &str) -> String {
        hmac_sha256_hex(
            PRIVATE_KEY.as_bytes(),
            format!("{}confirm{}{}", process_id, "150000.00", "PYG").as_bytes(),
        )
    }

    #[tokio::test]
    async fn approved_confirmation_settles() {
        let process_id = "7f9c24e5a0b14c37a1d5";
        let payload = confirmation(process_id, "00", &valid_token(process_id));

        let result = adapter().confirm_callback(&payload, None).await.unwrap();

        assert_eq!(result.outcome, SettlementOutcome::Settled);
        assert_eq!(result.correlation_id.as_str(), process_id);
        assert_eq!(result.metadata["operation"]["authorization_number"], "043512");
    }

    #[tokio::test]
    async fn non_zero_response_code_declines() {
        let process_id = "7f9c24e5a0b14c37a1d5";
        let payload = confirmation(process_id, "51", &valid_token(process_id));

        let result = adapter().confirm_callback(&payload, None).await.unwrap();
        assert_eq!(result.outcome, SettlementOutcome::Declined);
    }

    #[tokio::test]
    async fn forged_token_is_rejected() {
        let payload = confirmation("7f9c24e5a0b14c37a1d5", "00", "feedface");
        assert!(adapter().confirm_callback(&payload, None).await.is_err());
    }
}
