//! Direct USDT transfer adapter.
//!
//! The only gateway with no provider API. `create_intent` hands back
//! the platform wallet and the exact amount; confirmation is a
//! user-submitted transaction reference, which is recorded but
//! explicitly flagged for reconciliation — there is no on-chain
//! verification, so a reference is never treated as proof by itself.

use async_trait::async_trait;

use crate::domain::foundation::{CorrelationId, Currency};
use crate::domain::payment::{Gateway, Payment};
use crate::ports::{
    CheckoutInstructions, CryptoProof, GatewayAdapter, GatewayError, GatewayIntent,
    SettlementOutcome, SettlementResult,
};

/// Wallet configuration for direct transfers.
#[derive(Debug, Clone)]
pub struct CryptoGatewayConfig {
    /// Platform wallet the user transfers to.
    pub wallet_address: String,

    /// Network label shown alongside the address (e.g. TRC20).
    pub network: String,
}

/// Adapter for direct USDT wallet transfers.
pub struct CryptoTransferAdapter {
    config: CryptoGatewayConfig,
}

impl CryptoTransferAdapter {
    pub fn new(config: CryptoGatewayConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl GatewayAdapter for CryptoTransferAdapter {
    fn gateway(&self) -> Gateway {
        Gateway::Crypto
    }

    async fn create_intent(&self, payment: &Payment) -> Result<GatewayIntent, GatewayError> {
        if payment.amount.currency() != Currency::Usdt {
            return Err(GatewayError::protocol(format!(
                "crypto transfers settle USDT, payment is in {}",
                payment.amount.currency()
            )));
        }

        // No provider to assign a reference; the payment id is the
        // correlation id the proof submission comes back with.
        let correlation_id = CorrelationId::new(payment.id.to_string())
            .map_err(|e| GatewayError::protocol(e.to_string()))?;

        Ok(GatewayIntent {
            correlation_id,
            instructions: CheckoutInstructions::CryptoTransfer {
                wallet_address: self.config.wallet_address.clone(),
                amount: payment.amount,
            },
        })
    }

    async fn confirm_callback(
        &self,
        payload: &[u8],
        _signature: Option<&str>,
    ) -> Result<SettlementResult, GatewayError> {
        let proof: CryptoProof = serde_json::from_slice(payload)
            .map_err(|e| GatewayError::protocol(format!("invalid proof payload: {}", e)))?;

        let tx_reference = proof.tx_reference.trim();
        if tx_reference.is_empty() {
            return Err(GatewayError::protocol("transaction reference is empty"));
        }

        let correlation_id = CorrelationId::new(proof.payment_id.to_string())
            .map_err(|e| GatewayError::protocol(e.to_string()))?;

        Ok(SettlementResult {
            correlation_id,
            outcome: SettlementOutcome::Settled,
            metadata: serde_json::json!({
                "tx_reference": tx_reference,
                "network": self.config.network,
                "wallet_address": self.config.wallet_address,
                "pending_reconciliation": true,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Money, PaymentId, ServiceId, UserId};
    use rust_decimal::Decimal;

    fn adapter() -> CryptoTransferAdapter {
        CryptoTransferAdapter::new(CryptoGatewayConfig {
            wallet_address: "TXk3mPs8WqrZ9fGheT1BDoLPkLtEmnChJ4".to_string(),
            network: "TRC20".to_string(),
        })
    }

    fn usdt_payment() -> Payment {
        Payment::create_pending(
            PaymentId::new(),
            UserId::new(),
            ServiceId::new(),
            Gateway::Crypto,
            Money::new(Decimal::new(1541, 2), Currency::Usdt),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn intent_returns_wallet_instructions_keyed_by_payment_id() {
        let payment = usdt_payment();
        let intent = adapter().create_intent(&payment).await.unwrap();

        assert_eq!(intent.correlation_id.as_str(), payment.id.to_string());
        match intent.instructions {
            CheckoutInstructions::CryptoTransfer {
                wallet_address,
                amount,
            } => {
                assert_eq!(wallet_address, "TXk3mPs8WqrZ9fGheT1BDoLPkLtEmnChJ4");
                assert_eq!(amount, payment.amount);
            }
            other => panic!("expected crypto transfer instructions, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_usdt_payment_is_a_protocol_error() {
        let payment = Payment::create_pending(
            PaymentId::new(),
            UserId::new(),
            ServiceId::new(),
            Gateway::Crypto,
            Money::new(Decimal::from(150_000), Currency::Pyg),
        )
        .unwrap();

        assert!(adapter().create_intent(&payment).await.is_err());
    }

    #[tokio::test]
    async fn proof_settles_but_is_flagged_for_reconciliation() {
        let payment_id = PaymentId::new();
        let payload = serde_json::to_vec(&CryptoProof {
            payment_id,
            tx_reference: "0x9fc1a0b2".to_string(),
        })
        .unwrap();

        let result = adapter().confirm_callback(&payload, None).await.unwrap();

        assert_eq!(result.outcome, SettlementOutcome::Settled);
        assert_eq!(result.correlation_id.as_str(), payment_id.to_string());
        assert_eq!(result.metadata["pending_reconciliation"], true);
        assert_eq!(result.metadata["tx_reference"], "0x9fc1a0b2");
    }

    #[tokio::test]
    async fn blank_reference_is_rejected() {
        let payload = serde_json::to_vec(&CryptoProof {
            payment_id: PaymentId::new(),
            tx_reference: "   ".to_string(),
        })
        .unwrap();

        assert!(adapter().confirm_callback(&payload, None).await.is_err());
    }
}
