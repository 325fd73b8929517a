//! Shared handler state, injected into the depot.

use std::sync::Arc;

use estamp_core::{PaymentSignatureVerifier, PricingCalculator, ValidationError};
use estamp_db::Database;

use crate::config::AppConfig;
use crate::gateway::PaymentGateway;
use crate::notifier::Notifier;
use crate::service::{CheckoutSettings, OrderService};

#[derive(Clone)]
pub struct State {
    pub(crate) orders: OrderService,
}

impl State {
    #[must_use]
    pub fn new(orders: OrderService) -> Self {
        Self { orders }
    }

    /// Wires the order service from configuration and its collaborators.
    pub fn from_config(
        config: &AppConfig,
        db: Database,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Arc<Self>, ValidationError> {
        let verifier = PaymentSignatureVerifier::new(&config.gateway.key_secret)?;
        let calculator = PricingCalculator::new(config.pricing.doorstep_charge());
        let checkout = CheckoutSettings {
            key_id: config.gateway.key_id.clone(),
            currency: config.gateway.currency.clone(),
        };

        Ok(Arc::new(Self::new(OrderService::new(
            db, calculator, verifier, gateway, notifier, checkout,
        ))))
    }
}
