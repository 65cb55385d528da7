//! Stripe Checkout adapter for the international card rail.
//!
//! `create_intent` opens a hosted Checkout Session and returns its
//! URL; settlement arrives as a signed webhook.
//!
//! # Security
//!
//! - HMAC-SHA256 signature verification with constant-time comparison
//! - Timestamp validation against a replay window
//! - Secrets held in `secrecy::SecretString`

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};

use crate::adapters::signing::{digests_match, hmac_sha256};
use crate::domain::foundation::CorrelationId;
use crate::domain::payment::{Gateway, Payment};
use crate::ports::{
    CheckoutInstructions, GatewayAdapter, GatewayError, GatewayIntent, SettlementOutcome,
    SettlementResult,
};

use super::webhook::{CheckoutSessionResponse, SignatureHeader, StripeCheckoutSession, StripeEvent};

/// Maximum accepted age for webhook events.
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Tolerance for events stamped slightly in the future (clock skew).
const MAX_FUTURE_SKEW_SECS: i64 = 60;

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_live_... or sk_test_...).
    pub api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    pub webhook_secret: SecretString,

    /// Base URL for the Stripe API.
    pub api_base_url: String,

    /// Where Checkout redirects after payment.
    pub success_url: String,

    /// Where Checkout redirects on abandonment.
    pub cancel_url: String,

    /// Per-request timeout for provider calls.
    pub timeout: Duration,
}

impl StripeConfig {
    pub fn new(
        api_key: impl Into<String>,
        webhook_secret: impl Into<String>,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: "https://api.stripe.com".to_string(),
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Point the adapter at a different API host (tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Stripe Checkout adapter.
pub struct StripeCheckoutAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeCheckoutAdapter {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn verify_signature(&self, payload: &[u8], header: &SignatureHeader) -> Result<(), GatewayError> {
        let now = chrono::Utc::now().timestamp();
        let age = now - header.timestamp;

        if age > MAX_EVENT_AGE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                age_secs = age,
                "stripe webhook too old, possible replay"
            );
            return Err(GatewayError::signature(format!(
                "event too old ({} seconds)",
                age
            )));
        }
        if age < -MAX_FUTURE_SKEW_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                "stripe webhook stamped in the future"
            );
            return Err(GatewayError::signature("event timestamp in the future"));
        }

        let signed_payload = format!(
            "{}.{}",
            header.timestamp,
            String::from_utf8_lossy(payload)
        );
        let expected = hmac_sha256(
            self.config.webhook_secret.expose_secret().as_bytes(),
            signed_payload.as_bytes(),
        );

        if header
            .v1_signatures
            .iter()
            .any(|provided| digests_match(&expected, provided))
        {
            Ok(())
        } else {
            tracing::warn!("stripe webhook signature mismatch");
            Err(GatewayError::signature("invalid signature"))
        }
    }

    fn unit_amount(payment: &Payment) -> Result<i64, GatewayError> {
        let scale = payment.amount.currency().minor_units();
        let factor = Decimal::from(10i64.pow(scale));
        (payment.amount.amount() * factor).to_i64().ok_or_else(|| {
            GatewayError::protocol(format!(
                "amount {} does not fit a minor-unit integer",
                payment.amount
            ))
        })
    }
}

#[async_trait]
impl GatewayAdapter for StripeCheckoutAdapter {
    fn gateway(&self) -> Gateway {
        Gateway::Card
    }

    async fn create_intent(&self, payment: &Payment) -> Result<GatewayIntent, GatewayError> {
        let unit_amount = Self::unit_amount(payment)?;
        let currency = payment.amount.currency().code().to_lowercase();
        let payment_id = payment.id.to_string();

        let params: Vec<(&str, String)> = vec![
            ("mode", "payment".to_string()),
            ("success_url", self.config.success_url.clone()),
            ("cancel_url", self.config.cancel_url.clone()),
            ("client_reference_id", payment_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("line_items[0][price_data][currency]", currency),
            (
                "line_items[0][price_data][unit_amount]",
                unit_amount.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                "Suscribot service".to_string(),
            ),
            ("metadata[payment_id]", payment_id),
        ];

        let response = self
            .http_client
            .post(format!("{}/v1/checkout/sessions", self.config.api_base_url))
            .bearer_auth(self.config.api_key.expose_secret())
            .timeout(self.config.timeout)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::network(format!("stripe unreachable: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GatewayError::new(
                crate::ports::GatewayErrorCode::RateLimited,
                "stripe rate limit",
            ));
        }
        if status.is_server_error() {
            return Err(GatewayError::network(format!(
                "stripe returned {}",
                status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::provider(format!(
                "checkout session rejected ({}): {}",
                status, body
            )));
        }

        let session: CheckoutSessionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::protocol(format!("invalid session response: {}", e)))?;

        let correlation_id = CorrelationId::new(session.id)
            .map_err(|e| GatewayError::protocol(e.to_string()))?;

        Ok(GatewayIntent {
            correlation_id,
            instructions: CheckoutInstructions::Redirect { url: session.url },
        })
    }

    async fn confirm_callback(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<SettlementResult, GatewayError> {
        let header_value =
            signature.ok_or_else(|| GatewayError::signature("missing Stripe-Signature header"))?;
        let header = SignatureHeader::parse(header_value)?;
        self.verify_signature(payload, &header)?;

        let event: StripeEvent = serde_json::from_slice(payload)
            .map_err(|e| GatewayError::protocol(format!("invalid event payload: {}", e)))?;
        let metadata: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| GatewayError::protocol(e.to_string()))?;

        let (correlation, outcome) = match event.event_type.as_str() {
            "checkout.session.completed" => {
                let session: StripeCheckoutSession =
                    serde_json::from_value(event.data.object.clone()).map_err(|e| {
                        GatewayError::protocol(format!("invalid checkout session: {}", e))
                    })?;
                (session.id, SettlementOutcome::Settled)
            }
            "checkout.session.expired" | "checkout.session.async_payment_failed" => {
                let session: StripeCheckoutSession =
                    serde_json::from_value(event.data.object.clone()).map_err(|e| {
                        GatewayError::protocol(format!("invalid checkout session: {}", e))
                    })?;
                (session.id, SettlementOutcome::Declined)
            }
            other => {
                tracing::debug!(event_type = other, "unhandled stripe event acknowledged");
                (event.id.clone(), SettlementOutcome::Ignored)
            }
        };

        let correlation_id =
            CorrelationId::new(correlation).map_err(|e| GatewayError::protocol(e.to_string()))?;

        Ok(SettlementResult {
            correlation_id,
            outcome,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::signing::{hex_encode, hmac_sha256};

    const WEBHOOK_SECRET: &str = "whsec_sbtest";

    fn adapter() -> StripeCheckoutAdapter {
        StripeCheckoutAdapter::new(StripeConfig::new(
            "sk_test_xyz",
            WEBHOOK_SECRET,
            "https://app.suscribot.com.py/pago/ok",
            "https://app.suscribot.com.py/pago/cancelado",
        ))
    }

    fn sign(payload: &[u8], timestamp: i64) -> String {
        let signed = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let digest = hmac_sha256(WEBHOOK_SECRET.as_bytes(), signed.as_bytes());
        format!("t={},v1={}", timestamp, hex_encode(&digest))
    }

    fn completed_event(session_id: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": { "id": session_id, "payment_status": "paid" } }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn valid_signature_settles_session() {
        let payload = completed_event("cs_test_77");
        let header = sign(&payload, chrono::Utc::now().timestamp());

        let result = adapter()
            .confirm_callback(&payload, Some(&header))
            .await
            .unwrap();

        assert_eq!(result.outcome, SettlementOutcome::Settled);
        assert_eq!(result.correlation_id.as_str(), "cs_test_77");
        assert_eq!(result.metadata["type"], "checkout.session.completed");
    }

    #[tokio::test]
    async fn tampered_payload_is_rejected() {
        let payload = completed_event("cs_test_77");
        let header = sign(&payload, chrono::Utc::now().timestamp());

        let tampered = completed_event("cs_attacker");
        let result = adapter().confirm_callback(&tampered, Some(&header)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn stale_event_is_rejected_as_replay() {
        let payload = completed_event("cs_test_77");
        let header = sign(&payload, chrono::Utc::now().timestamp() - 3600);

        let result = adapter().confirm_callback(&payload, Some(&header)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_signature_header_is_rejected() {
        let payload = completed_event("cs_test_77");
        let result = adapter().confirm_callback(&payload, None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn expired_session_declines() {
        let payload = serde_json::to_vec(&serde_json::json!({
            "id": "evt_2",
            "type": "checkout.session.expired",
            "data": { "object": { "id": "cs_test_99" } }
        }))
        .unwrap();
        let header = sign(&payload, chrono::Utc::now().timestamp());

        let result = adapter()
            .confirm_callback(&payload, Some(&header))
            .await
            .unwrap();

        assert_eq!(result.outcome, SettlementOutcome::Declined);
        assert_eq!(result.correlation_id.as_str(), "cs_test_99");
    }

    #[tokio::test]
    async fn unrelated_event_is_acknowledged_not_settled() {
        let payload = serde_json::to_vec(&serde_json::json!({
            "id": "evt_3",
            "type": "charge.updated",
            "data": { "object": { "id": "ch_123" } }
        }))
        .unwrap();
        let header = sign(&payload, chrono::Utc::now().timestamp());

        let result = adapter()
            .confirm_callback(&payload, Some(&header))
            .await
            .unwrap();

        assert_eq!(result.outcome, SettlementOutcome::Ignored);
    }
}
