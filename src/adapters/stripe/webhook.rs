//! Stripe webhook payload and signature types.

use serde::Deserialize;

use crate::adapters::signing::hex_decode;
use crate::ports::GatewayError;

/// Parsed `Stripe-Signature` header: `t=<unix>,v1=<hex>[,v1=...]`.
#[derive(Debug)]
pub(crate) struct SignatureHeader {
    pub timestamp: i64,
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, GatewayError> {
        let mut timestamp = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => {
                    timestamp = value.parse::<i64>().ok();
                }
                Some(("v1", value)) => {
                    if let Some(bytes) = hex_decode(value) {
                        v1_signatures.push(bytes);
                    }
                }
                _ => {} // Unknown schemes are ignored per Stripe docs.
            }
        }

        match (timestamp, v1_signatures.is_empty()) {
            (Some(timestamp), false) => Ok(Self {
                timestamp,
                v1_signatures,
            }),
            _ => Err(GatewayError::signature(
                "signature header missing timestamp or v1 signature",
            )),
        }
    }
}

/// Envelope of every Stripe webhook event.
#[derive(Debug, Deserialize)]
pub(crate) struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripeEventData {
    pub object: serde_json::Value,
}

/// Checkout session object, the only shape settlement cares about.
#[derive(Debug, Deserialize)]
pub(crate) struct StripeCheckoutSession {
    pub id: String,
}

/// Response of `POST /v1/checkout/sessions`.
#[derive(Debug, Deserialize)]
pub(crate) struct CheckoutSessionResponse {
    pub id: String,
    pub url: String,
}
