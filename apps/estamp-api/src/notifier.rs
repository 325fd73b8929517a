//! Customer notifications.
//!
//! Delivery of e-mail or SMS belongs to an external provider. The default
//! [`LogNotifier`] records each notification as a structured log event, so a
//! log shipper or provider adapter can pick it up.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use estamp_core::StampOrder;

/// Sends order lifecycle notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Payment for `order` was verified.
    async fn payment_confirmed(&self, order: &StampOrder) -> Result<(), NotifyError>;

    /// The stamp paper for `order` is ready for download.
    async fn document_ready(&self, order: &StampOrder) -> Result<(), NotifyError>;
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel unavailable: {0}")]
    Unavailable(String),
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn payment_confirmed(&self, order: &StampOrder) -> Result<(), NotifyError> {
        info!(
            target: "estamp::notify",
            order_number = %order.order_number,
            email = ?order.customer_email,
            phone = %order.first_party.phone,
            total = %order.breakdown.total,
            "Payment confirmed"
        );
        Ok(())
    }

    async fn document_ready(&self, order: &StampOrder) -> Result<(), NotifyError> {
        info!(
            target: "estamp::notify",
            order_number = %order.order_number,
            email = ?order.customer_email,
            artifact_url = ?order.artifact_url,
            "Stamp paper ready"
        );
        Ok(())
    }
}
