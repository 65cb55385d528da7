//! Pagopar adapter (Paraguay-local aggregator).
//!
//! Order creation is a JSON call authenticated by a keyed digest of
//! the private key over the order fields; the user then pays on
//! Pagopar's hosted page. Settlement arrives as a JSON POST carrying
//! the order hash, the paid flag, and the same digest scheme.

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

/// Pagopar API configuration.
#[derive(Clone)]
pub struct PagoparConfig {
    /// Merchant public key.
    pub public_key: String,

    /// Merchant private key, used for order and callback tokens.
    pub private_key: SecretString,

    /// API host for order creation.
    pub api_base_url: String,

    /// Hosted payment page host.
    pub checkout_base_url: String,

    /// Where Pagopar sends the user after paying.
    pub return_url: String,

    /// Per-request timeout for provider calls.
    pub timeout: Duration,
}

impl PagoparConfig {
    pub fn new(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: SecretString::new(private_key.into()),
            api_base_url: "https://api.pagopar.com/api".to_string(),
            checkout_base_url: "https://www.pagopar.com".to_string(),
            return_url: return_url.into(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Point the adapter at a different API host (tests/sandbox).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Order-creation response envelope.
#[derive(Debug, Deserialize)]
struct PagoparResponse {
    respuesta: bool,
    resultado: Vec<PagoparOrder>,
}

#[derive(Debug, Deserialize)]
struct PagoparOrder {
    /// Order hash; Pagopar's reference for the transaction.
    data: String,
}

/// Settlement callback payload.
#[derive(Debug, Deserialize)]
struct PagoparCallback {
    hash_pedido: String,
    token: String,
    pagado: bool,
}

/// Pagopar gateway adapter.
pub struct PagoparAdapter {
    config: PagoparConfig,
    http_client: reqwest::Client,
}

impl PagoparAdapter {
    pub fn new(config: PagoparConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn order_token(&self, payment: &Payment) -> String {
        hmac_sha256_hex(
            self.config.private_key.expose_secret().as_bytes(),
            format!("{}{}", payment.id, payment.amount.amount()).as_bytes(),
        )
    }

    fn callback_token(&self, order_hash: &str) -> String {
        hmac_sha256_hex(
            self.config.private_key.expose_secret().as_bytes(),
            order_hash.as_bytes(),
        )
    }
}

#[async_trait]
impl GatewayAdapter for PagoparAdapter {
    fn gateway(&self) -> Gateway {
        Gateway::Pagopar
    }

    async fn create_intent(&self, payment: &Payment) -> Result<GatewayIntent, GatewayError> {
        let body = serde_json::json!({
            "token": self.order_token(payment),
            "comercio": self.config.public_key,
            "pedido_id": payment.id.to_string(),
            "monto_total": payment.amount.amount().to_string(),
            "moneda": payment.amount.currency().code(),
            "url_retorno": self.config.return_url,
        });

        let response = self
            .http_client
            .post(format!(
                "{}/comercios/2.0/iniciar-transaccion",
                self.config.api_base_url
            ))
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::network(format!("pagopar unreachable: {}", e)))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(GatewayError::network(format!("pagopar returned {}", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::provider(format!(
                "order rejected ({}): {}",
                status, body
            )));
        }

        let parsed: PagoparResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::protocol(format!("invalid order response: {}", e)))?;

        if !parsed.respuesta {
            return Err(GatewayError::declined("pagopar refused the order"));
        }
        let order = parsed
            .resultado
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::protocol("order response carries no hash"))?;

        let url = format!("{}/pagos/{}", self.config.checkout_base_url, order.data);
        let correlation_id = CorrelationId::new(order.data)
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
        let callback: PagoparCallback = serde_json::from_slice(payload)
            .map_err(|e| GatewayError::protocol(format!("invalid callback payload: {}", e)))?;
        let metadata: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| GatewayError::protocol(e.to_string()))?;

        let expected = self.callback_token(&callback.hash_pedido);
        if !hex_digests_match(&expected, &callback.token) {
            tracing::warn!(order_hash = %callback.hash_pedido, "pagopar callback token mismatch");
            return Err(GatewayError::signature("callback token mismatch"));
        }

        let correlation_id = CorrelationId::new(callback.hash_pedido)
            .map_err(|e| GatewayError::protocol(e.to_string()))?;

        Ok(SettlementResult {
            correlation_id,
            outcome: if callback.pagado {
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

    const PRIVATE_KEY: &str = "f9c1d2e3a4b5";

    fn adapter() -> PagoparAdapter {
        PagoparAdapter::new(PagoparConfig::new(
            "pub-9921",
            PRIVATE_KEY,
            "https://app.suscribot.com.py/pago/retorno",
        ))
    }

    fn callback_payload(order_hash: &str, paid: bool, token: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "hash_pedido": order_hash,
            "token": token,
            "pagado": paid,
            "numero_comprobante": "0012345",
            "forma_pago": "Tarjeta de crédito",
        }))
        .unwrap()
    }

    fn valid_token(order_hash: &str) -> String {
        hmac_sha256_hex(PRIVATE_KEY.as_bytes(), order_hash.as_bytes())
    }

    #[tokio::test]
    async fn paid_callback_settles_order() {
        let hash = "a1b2c3d4e5";
        let payload = callback_payload(hash, true, &valid_token(hash));

        let result = adapter().confirm_callback(&payload, None).await.unwrap();

        assert_eq!(result.outcome, SettlementOutcome::Settled);
        assert_eq!(result.correlation_id.as_str(), hash);
        assert_eq!(result.metadata["numero_comprobante"], "0012345");
    }

    #[tokio::test]
    async fn unpaid_callback_declines_order() {
        let hash = "a1b2c3d4e5";
        let payload = callback_payload(hash, false, &valid_token(hash));

        let result = adapter().confirm_callback(&payload, None).await.unwrap();
        assert_eq!(result.outcome, SettlementOutcome::Declined);
    }

    #[tokio::test]
    async fn forged_token_is_rejected() {
        let payload = callback_payload("a1b2c3d4e5", true, "0000deadbeef");
        assert!(adapter().confirm_callback(&payload, None).await.is_err());
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected() {
        assert!(adapter()
            .confirm_callback(b"not json at all", None)
            .await
            .is_err());
    }
}
