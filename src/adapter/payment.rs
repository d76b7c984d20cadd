use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("unknown payment reference {0}")]
    UnknownReference(String),

    #[error("payment {0} was already refunded")]
    AlreadyRefunded(String),

    #[error("payment provider error: {0}")]
    Provider(String),

    #[error("payment provider did not answer within {0:?}")]
    Timeout(Duration),
}

/// Payment provider as seen by the dispatch engine: refunds only.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Refunds the full captured amount and returns it.
    async fn create_refund(&self, payment_reference: &str) -> Result<Decimal, PaymentError>;
}

/// In-process provider for local runs and tests. Refunds captures it was told about, once.
#[derive(Debug, Default)]
pub struct SandboxPaymentGateway {
    captures: DashMap<String, Decimal>,
    refunded: DashMap<String, Decimal>,
}

impl SandboxPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_capture(&self, payment_reference: impl Into<String>, amount: Decimal) {
        self.captures.insert(payment_reference.into(), amount);
    }

    pub fn refunded_amount(&self, payment_reference: &str) -> Option<Decimal> {
        self.refunded.get(payment_reference).map(|entry| *entry.value())
    }
}

#[async_trait]
impl PaymentGateway for SandboxPaymentGateway {
    async fn create_refund(&self, payment_reference: &str) -> Result<Decimal, PaymentError> {
        match self.captures.remove(payment_reference) {
            Some((reference, amount)) => {
                info!(payment_reference = %reference, %amount, "sandbox refund issued");
                self.refunded.insert(reference, amount);
                Ok(amount)
            }
            None if self.refunded.contains_key(payment_reference) => {
                Err(PaymentError::AlreadyRefunded(payment_reference.to_string()))
            }
            None => Err(PaymentError::UnknownReference(payment_reference.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{PaymentError, PaymentGateway, SandboxPaymentGateway};

    #[tokio::test]
    async fn refunds_a_capture_exactly_once() {
        let gateway = SandboxPaymentGateway::new();
        gateway.record_capture("pi_123", Decimal::new(4250, 2));

        let amount = gateway.create_refund("pi_123").await.unwrap();
        assert_eq!(amount, Decimal::new(4250, 2));
        assert_eq!(gateway.refunded_amount("pi_123"), Some(amount));

        let again = gateway.create_refund("pi_123").await;
        assert!(matches!(again, Err(PaymentError::AlreadyRefunded(_))));
    }

    #[tokio::test]
    async fn unknown_reference_is_rejected() {
        let gateway = SandboxPaymentGateway::new();
        let result = gateway.create_refund("pi_missing").await;
        assert!(matches!(result, Err(PaymentError::UnknownReference(_))));
    }
}
