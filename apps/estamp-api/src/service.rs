//! # Order Service
//!
//! Orchestrates the checkout wizard over the pure order model and the
//! repositories. Each wizard step is one request: load, mutate a copy,
//! persist with a compare-and-swap on the status that was loaded.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /orders              create_order      ──► draft                  │
//! │  PATCH /orders/{id}/service change_service   ──► draft (reopens pending)│
//! │  POST /orders/{id}/promo    apply_promo      ──► draft (reopens pending)│
//! │                                                                         │
//! │  POST /orders/{id}/payment  create_payment                              │
//! │     ├── reprice + re-validate promo                                     │
//! │     ├── gateway.create_order(total)                                     │
//! │     └── ONE TRANSACTION: redeem promo + CAS draft → pending_payment     │
//! │                                                                         │
//! │  POST /orders/{id}/payment/verify  verify_payment                       │
//! │     ├── HMAC check (mismatch: 400, order untouched)                     │
//! │     ├── CAS pending_payment → payment_verified                          │
//! │     └── notifier.payment_confirmed                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use estamp_core::promo::validate_promo;
use estamp_core::validation::{
    validate_artifact_url, validate_failure_reason, validate_optional_text,
    validate_promo_code_format, validate_template_key, validate_template_prices, validate_uuid,
};
use estamp_core::{
    CoreError, Money, NewPromoCode, NewTemplate, OrderDraft, OrderStatus, PaymentConfirmation,
    PaymentSignatureVerifier, PricingCalculator, PromoCode, PromoCodeError, ServiceSelection,
    StampOrder, StampTemplate, StateTransitionError, TemplateUpdate, ValidationError,
};
use estamp_db::{Database, DbError};

use crate::error::{ApiError, ApiResult};
use crate::gateway::PaymentGateway;
use crate::notifier::Notifier;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Standalone promo check, before an order exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCheck {
    pub code: String,
    /// Pre-discount subtotal the code would apply to
    pub subtotal: Money,
}

/// Outcome of a successful promo check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoQuote {
    pub code: String,
    pub subtotal: Money,
    pub discount: Money,
}

/// What the checkout widget needs to open the gateway's payment form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    pub order: StampOrder,
    pub gateway_order_id: String,
    pub amount: Money,
    pub currency: String,
    /// Public gateway key for the browser widget
    pub key_id: String,
}

/// Gateway values echoed back to the checkout widget.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub key_id: String,
    pub currency: String,
}

// =============================================================================
// Order Service
// =============================================================================

/// Application service behind every order, template and promo endpoint.
#[derive(Clone)]
pub struct OrderService {
    db: Database,
    calculator: PricingCalculator,
    verifier: PaymentSignatureVerifier,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    checkout: CheckoutSettings,
}

impl OrderService {
    pub fn new(
        db: Database,
        calculator: PricingCalculator,
        verifier: PaymentSignatureVerifier,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        checkout: CheckoutSettings,
    ) -> Self {
        OrderService {
            db,
            calculator,
            verifier,
            gateway,
            notifier,
            checkout,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    /// Active templates for the catalog page.
    pub async fn list_templates(&self) -> ApiResult<Vec<StampTemplate>> {
        Ok(self.db.templates().list_active().await?)
    }

    /// Active template for a state and document type.
    pub async fn lookup_template(&self, state: &str, document_type: &str) -> ApiResult<StampTemplate> {
        self.db
            .templates()
            .lookup(state, document_type)
            .await?
            .ok_or_else(|| {
                CoreError::TemplateNotFound {
                    state: state.to_string(),
                    document_type: document_type.to_string(),
                }
                .into()
            })
    }

    /// Order by id.
    pub async fn get_order(&self, id: &str) -> ApiResult<StampOrder> {
        validate_uuid("id", id)?;

        self.db
            .orders()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(id.to_string()).into())
    }

    async fn order_template(&self, order: &StampOrder) -> ApiResult<StampTemplate> {
        self.lookup_template(&order.state, &order.document_type).await
    }

    async fn attached_promo(&self, order: &StampOrder) -> ApiResult<Option<PromoCode>> {
        match order.promo_code.as_deref() {
            Some(code) => Ok(self.db.promo_codes().get_by_code(code).await?),
            None => Ok(None),
        }
    }

    // -------------------------------------------------------------------------
    // Wizard Steps
    // -------------------------------------------------------------------------

    /// Validates wizard input and stores a priced draft.
    pub async fn create_order(&self, draft: OrderDraft) -> ApiResult<StampOrder> {
        let (state, document_type) = validate_template_key(&draft.state, &draft.document_type)?;
        let template = self.lookup_template(&state, &document_type).await?;

        let order = StampOrder::create(Uuid::new_v4(), draft, &template, &self.calculator, Utc::now())?;
        self.db.orders().insert(&order).await?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            state = %order.state,
            document_type = %order.document_type,
            total = %order.breakdown.total,
            "Draft order created"
        );
        Ok(order)
    }

    /// Changes service tier and doorstep delivery.
    pub async fn change_service(&self, id: &str, selection: ServiceSelection) -> ApiResult<StampOrder> {
        let order = self.get_order(id).await?;
        let template = self.order_template(&order).await?;
        let promo = self.attached_promo(&order).await?;

        let mut updated = order.clone();
        updated.change_service(selection, &template, &self.calculator, promo.as_ref(), Utc::now())?;
        self.db.orders().update(&updated, order.status).await?;

        debug!(
            order_id = %updated.id,
            service_type = ?updated.service_type,
            doorstep = updated.doorstep_delivery,
            total = %updated.breakdown.total,
            "Service selection changed"
        );
        Ok(updated)
    }

    /// Attaches a promo code to an order.
    pub async fn apply_promo(&self, id: &str, code: &str) -> ApiResult<StampOrder> {
        let code = validate_promo_code_format(code)?;
        let order = self.get_order(id).await?;
        let template = self.order_template(&order).await?;
        let promo = self
            .db
            .promo_codes()
            .get_by_code(&code)
            .await?
            .ok_or_else(|| PromoCodeError::InvalidCode { code: code.clone() })?;

        let mut updated = order.clone();
        if let Err(e) = updated.apply_promo(&promo, &template, &self.calculator, Utc::now()) {
            debug!(order_id = %order.id, code = %code, error = %e, "Promo rejected");
            return Err(e.into());
        }
        self.db.orders().update(&updated, order.status).await?;

        info!(
            order_id = %updated.id,
            code = %code,
            discount = %updated.breakdown.discount,
            total = %updated.breakdown.total,
            "Promo applied"
        );
        Ok(updated)
    }

    /// Detaches the promo code from an order.
    pub async fn remove_promo(&self, id: &str) -> ApiResult<StampOrder> {
        let order = self.get_order(id).await?;
        let template = self.order_template(&order).await?;

        let mut updated = order.clone();
        updated.remove_promo(&template, &self.calculator, Utc::now())?;
        self.db.orders().update(&updated, order.status).await?;

        debug!(order_id = %updated.id, "Promo removed");
        Ok(updated)
    }

    /// Checks a code against a subtotal without touching any order.
    pub async fn validate_promo(&self, check: PromoCheck) -> ApiResult<PromoQuote> {
        let code = validate_promo_code_format(&check.code)?;

        if check.subtotal.is_negative() {
            return Err(ValidationError::InvalidFormat {
                field: "subtotal".to_string(),
                reason: "cannot be negative".to_string(),
            }
            .into());
        }

        let found = self.db.promo_codes().get_by_code(&code).await?;
        let discount = validate_promo(&code, found.as_ref(), check.subtotal, Utc::now())?;

        Ok(PromoQuote {
            code,
            subtotal: check.subtotal,
            discount: discount.clamp_between(Money::zero(), check.subtotal),
        })
    }

    // -------------------------------------------------------------------------
    // Payment
    // -------------------------------------------------------------------------

    /// Creates the gateway order and freezes the order for payment.
    ///
    /// Calling again while the order is `pending_payment` returns the
    /// existing gateway order.
    pub async fn create_payment(&self, id: &str) -> ApiResult<PaymentOrder> {
        let order = self.get_order(id).await?;

        if order.status == OrderStatus::PendingPayment {
            if let Some(gateway_order_id) = order.gateway_order_id.clone() {
                debug!(order_id = %order.id, gateway_order_id = %gateway_order_id, "Reusing gateway order");
                return Ok(self.payment_order(order, gateway_order_id));
            }
        }
        order.status.check_transition(OrderStatus::PendingPayment)?;

        let template = self.order_template(&order).await?;
        let promo = self.attached_promo(&order).await?;
        let now = Utc::now();

        let mut updated = order.clone();
        updated.reprice(&template, &self.calculator, promo.as_ref(), now)?;

        let gateway_order = self
            .gateway
            .create_order(updated.breakdown.total, &updated.order_number)
            .await?;

        let redeem = updated.promo_to_redeem().map(str::to_owned);
        updated.submit_for_payment(gateway_order.id.clone(), now)?;

        match self
            .db
            .orders()
            .update_with_redemption(&updated, order.status, redeem.as_deref())
            .await
        {
            Ok(()) => {}
            Err(DbError::PromoUnavailable { code }) => {
                warn!(
                    order_id = %updated.id,
                    gateway_order_id = %gateway_order.id,
                    code = %code,
                    "Gateway order orphaned by lost redemption"
                );
                return Err(self
                    .redemption_error(code, updated.breakdown.subtotal(), now)
                    .await);
            }
            Err(e) => {
                error!(
                    order_id = %updated.id,
                    gateway_order_id = %gateway_order.id,
                    error = %e,
                    "Gateway order orphaned by failed order write"
                );
                return Err(e.into());
            }
        }

        info!(
            order_id = %updated.id,
            gateway_order_id = %gateway_order.id,
            amount = %gateway_order.amount,
            redeemed = ?redeem,
            "Order awaiting payment"
        );
        Ok(self.payment_order(updated, gateway_order.id))
    }

    fn payment_order(&self, order: StampOrder, gateway_order_id: String) -> PaymentOrder {
        PaymentOrder {
            amount: order.breakdown.total,
            order,
            gateway_order_id,
            currency: self.checkout.currency.clone(),
            key_id: self.checkout.key_id.clone(),
        }
    }

    /// Explains a lost redemption race by re-checking the code.
    async fn redemption_error(&self, code: String, subtotal: Money, now: DateTime<Utc>) -> ApiError {
        let current = match self.db.promo_codes().get_by_code(&code).await {
            Ok(current) => current,
            Err(e) => return e.into(),
        };

        let reason = match current {
            Some(promo) => promo
                .validate(subtotal, now)
                .err()
                .unwrap_or(PromoCodeError::UsageLimitExceeded { code }),
            None => PromoCodeError::InvalidCode { code },
        };

        warn!(error = %reason, "Promo redemption lost");
        reason.into()
    }

    /// Verifies the gateway callback and marks the order paid.
    ///
    /// A bad signature leaves the order exactly as it was.
    pub async fn verify_payment(&self, id: &str, confirmation: PaymentConfirmation) -> ApiResult<StampOrder> {
        let order = self.get_order(id).await?;

        let proof = match order.verify_payment(&self.verifier, &confirmation) {
            Ok(proof) => proof,
            Err(e) => {
                warn!(
                    order_id = %order.id,
                    gateway_order_id = %confirmation.gateway_order_id,
                    error = %e,
                    "Payment verification failed"
                );
                return Err(e.into());
            }
        };

        let mut updated = order.clone();
        updated.confirm_payment(proof, Utc::now())?;
        self.db.orders().update(&updated, order.status).await?;

        info!(
            order_id = %updated.id,
            gateway_payment_id = ?updated.gateway_payment_id,
            total = %updated.breakdown.total,
            "Payment verified"
        );

        if let Err(e) = self.notifier.payment_confirmed(&updated).await {
            warn!(order_id = %updated.id, error = %e, "Payment notification failed");
        }

        Ok(updated)
    }

    // -------------------------------------------------------------------------
    // Fulfilment
    // -------------------------------------------------------------------------

    async fn transition<F>(&self, id: &str, apply: F) -> ApiResult<StampOrder>
    where
        F: FnOnce(&mut StampOrder, DateTime<Utc>) -> Result<(), StateTransitionError>,
    {
        let order = self.get_order(id).await?;

        let mut updated = order.clone();
        apply(&mut updated, Utc::now())?;
        self.db.orders().update(&updated, order.status).await?;

        info!(
            order_id = %updated.id,
            from = %order.status,
            to = %updated.status,
            "Order status changed"
        );
        Ok(updated)
    }

    /// `payment_verified | failed -> generating`.
    pub async fn start_generation(&self, id: &str) -> ApiResult<StampOrder> {
        self.transition(id, |order, now| order.start_generation(now)).await
    }

    /// `generating -> generated`, then tells the customer.
    pub async fn complete_generation(&self, id: &str, artifact_url: &str) -> ApiResult<StampOrder> {
        let artifact_url = validate_artifact_url(artifact_url)?;
        let order = self
            .transition(id, move |order, now| order.complete_generation(artifact_url, now))
            .await?;

        if let Err(e) = self.notifier.document_ready(&order).await {
            warn!(order_id = %order.id, error = %e, "Document notification failed");
        }

        Ok(order)
    }

    /// `generating -> failed`.
    pub async fn fail_generation(&self, id: &str, reason: &str) -> ApiResult<StampOrder> {
        let reason = validate_failure_reason(reason)?;
        self.transition(id, move |order, now| order.fail_generation(reason, now))
            .await
    }

    /// `failed -> generating` only.
    pub async fn retry_generation(&self, id: &str) -> ApiResult<StampOrder> {
        self.transition(id, |order, now| {
            if order.status != OrderStatus::Failed {
                return Err(StateTransitionError {
                    from: order.status,
                    to: OrderStatus::Generating,
                });
            }
            order.start_generation(now)
        })
        .await
    }

    /// `generated -> delivered`.
    pub async fn deliver(&self, id: &str) -> ApiResult<StampOrder> {
        self.transition(id, |order, now| order.deliver(now)).await
    }

    /// Any non-terminal status `-> cancelled`.
    pub async fn cancel(&self, id: &str) -> ApiResult<StampOrder> {
        self.transition(id, |order, now| order.cancel(now)).await
    }

    // -------------------------------------------------------------------------
    // Admin
    // -------------------------------------------------------------------------

    pub async fn create_template(&self, input: NewTemplate) -> ApiResult<StampTemplate> {
        let (state, document_type) = validate_template_key(&input.state, &input.document_type)?;
        validate_template_prices(input.base_price, input.convenience_fee)?;
        let description = validate_optional_text("description", input.description.as_deref())?;

        let input = NewTemplate {
            state,
            document_type,
            description,
            ..input
        };
        Ok(self.db.templates().insert(&input).await?)
    }

    pub async fn update_template(&self, id: &str, update: TemplateUpdate) -> ApiResult<StampTemplate> {
        validate_uuid("id", id)?;
        validate_template_prices(update.base_price, update.convenience_fee)?;
        let description = validate_optional_text("description", update.description.as_deref())?;

        let update = TemplateUpdate {
            description,
            ..update
        };
        Ok(self.db.templates().update(id, &update).await?)
    }

    pub async fn create_promo(&self, input: NewPromoCode) -> ApiResult<PromoCode> {
        let input = input.validated()?;
        Ok(self.db.promo_codes().insert(&input).await?)
    }

    pub async fn deactivate_promo(&self, code: &str) -> ApiResult<()> {
        Ok(self.db.promo_codes().deactivate(code).await?)
    }
}
