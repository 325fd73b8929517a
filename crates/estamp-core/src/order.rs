//! # Orders
//!
//! The `StampOrder` aggregate and the status machine that governs it.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   draft ──────► pending_payment ──────► payment_verified                │
//! │     ▲                 │      (VerifiedPayment)     │                    │
//! │     └──── reopen ─────┘                            ▼                    │
//! │                                              generating ◄──┐            │
//! │                                               │        │   │ retry      │
//! │                                               ▼        ▼   │            │
//! │                                         generated    failed             │
//! │                                               │                         │
//! │                                               ▼                         │
//! │                                          delivered  (terminal)          │
//! │                                                                         │
//! │   any non-terminal ──► cancelled  (terminal)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutating method works in memory; the caller persists the result
//! with a compare-and-swap on the status it loaded.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreResult, PaymentVerificationError, PromoCodeError, StateTransitionError};
use crate::money::Money;
use crate::payment::{PaymentConfirmation, PaymentSignatureVerifier, VerifiedPayment};
use crate::pricing::{PriceBreakdown, PricingCalculator, PricingInput};
use crate::promo::PromoCode;
use crate::types::{Party, ServiceType, StampTemplate};
use crate::validation::{
    validate_delivery_address, validate_email, validate_optional_text, validate_party_name,
    validate_phone, validate_stamp_amount, ValidationResult,
};
use crate::ORDER_NUMBER_PREFIX;

// =============================================================================
// Order Status
// =============================================================================

/// Where an order is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Being filled in by the wizard.
    Draft,
    /// Gateway order created; waiting for the customer to pay.
    PendingPayment,
    /// Gateway signature verified.
    PaymentVerified,
    /// Document generation in progress.
    Generating,
    /// Document ready.
    Generated,
    /// Generation failed; an operator may retry.
    Failed,
    /// Handed to the customer.
    Delivered,
    /// Abandoned or cancelled by an admin.
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Draft,
        OrderStatus::PendingPayment,
        OrderStatus::PaymentVerified,
        OrderStatus::Generating,
        OrderStatus::Generated,
        OrderStatus::Failed,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Stored and serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::PaymentVerified => "payment_verified",
            OrderStatus::Generating => "generating",
            OrderStatus::Generated => "generated",
            OrderStatus::Failed => "failed",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether the lifecycle allows `self -> next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        match (*self, next) {
            (Draft, PendingPayment)
            | (PendingPayment, Draft)
            | (PendingPayment, PaymentVerified)
            | (PaymentVerified, Generating)
            | (Generating, Generated)
            | (Generating, Failed)
            | (Failed, Generating)
            | (Generated, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Checks `self -> next`, returning the error the API reports.
    pub fn check_transition(&self, next: OrderStatus) -> Result<(), StateTransitionError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(StateTransitionError {
                from: *self,
                to: next,
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Inputs
// =============================================================================

/// Wizard input that creates a draft order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderDraft {
    pub first_party: Party,
    pub second_party: Party,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub state: String,
    pub document_type: String,
    #[serde(default)]
    pub purpose: Option<String>,
    /// Defaults to the template base price.
    #[serde(default)]
    pub stamp_amount: Option<Money>,
    #[serde(default)]
    pub service_type: ServiceType,
    #[serde(default)]
    pub doorstep_delivery: bool,
    #[serde(default)]
    pub delivery_address: Option<String>,
}

/// Service step of the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ServiceSelection {
    pub service_type: ServiceType,
    pub doorstep_delivery: bool,
    #[serde(default)]
    pub delivery_address: Option<String>,
}

// =============================================================================
// Stamp Order
// =============================================================================

/// An e-stamp order, from wizard draft to delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StampOrder {
    pub id: String,
    /// Customer-facing reference, `ES-YYYYMMDD-XXXXXX`.
    pub order_number: String,
    pub first_party: Party,
    pub second_party: Party,
    pub customer_email: Option<String>,
    pub state: String,
    pub document_type: String,
    pub purpose: Option<String>,
    pub stamp_amount: Money,
    pub service_type: ServiceType,
    pub doorstep_delivery: bool,
    pub delivery_address: Option<String>,
    pub promo_code: Option<String>,
    /// Codes this order has already counted against their usage limit.
    ///
    /// A code is redeemed at most once per order, even if it is removed and
    /// applied again.
    #[serde(default)]
    pub redeemed_promos: Vec<String>,
    pub breakdown: PriceBreakdown,
    pub status: OrderStatus,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub artifact_url: Option<String>,
    pub failure_reason: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl StampOrder {
    /// Validates wizard input and builds a priced draft.
    ///
    /// `template` must be the active template for the draft's state and
    /// document type.
    pub fn create(
        id: Uuid,
        draft: OrderDraft,
        template: &StampTemplate,
        calculator: &PricingCalculator,
        now: DateTime<Utc>,
    ) -> ValidationResult<StampOrder> {
        let first_party = Party {
            name: validate_party_name("first_party.name", &draft.first_party.name)?,
            phone: validate_phone("first_party.phone", &draft.first_party.phone)?,
        };
        let second_party = Party {
            name: validate_party_name("second_party.name", &draft.second_party.name)?,
            phone: validate_phone("second_party.phone", &draft.second_party.phone)?,
        };
        let customer_email = validate_email(draft.customer_email.as_deref())?;
        let purpose = validate_optional_text("purpose", draft.purpose.as_deref())?;
        let stamp_amount = validate_stamp_amount(draft.stamp_amount, template)?;
        let delivery_address =
            validate_delivery_address(draft.doorstep_delivery, draft.delivery_address.as_deref())?;

        let mut order = StampOrder {
            id: id.to_string(),
            order_number: order_number(&id, now),
            first_party,
            second_party,
            customer_email,
            state: template.state.clone(),
            document_type: template.document_type.clone(),
            purpose,
            stamp_amount,
            service_type: draft.service_type,
            doorstep_delivery: draft.doorstep_delivery,
            delivery_address,
            promo_code: None,
            redeemed_promos: Vec::new(),
            breakdown: PriceBreakdown::default(),
            status: OrderStatus::Draft,
            gateway_order_id: None,
            gateway_payment_id: None,
            artifact_url: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
            paid_at: None,
        };
        order.breakdown = calculator.breakdown(&order.pricing_input(template, Money::zero()));

        Ok(order)
    }

    fn pricing_input(&self, template: &StampTemplate, discount: Money) -> PricingInput {
        PricingInput {
            stamp_amount: self.stamp_amount,
            convenience_fee: template.convenience_fee,
            service_type: self.service_type,
            doorstep_delivery: self.doorstep_delivery,
            discount,
        }
    }

    /// Pre-discount subtotal under the current selection.
    pub fn subtotal(&self, template: &StampTemplate, calculator: &PricingCalculator) -> Money {
        calculator.subtotal(&self.pricing_input(template, Money::zero()))
    }

    /// Recomputes the breakdown, re-validating the attached promo code.
    ///
    /// `promo` is the stored promo code named by `self.promo_code`, if found.
    /// An already redeemed code is not rejected for the redemption this
    /// order itself consumed.
    pub fn reprice(
        &mut self,
        template: &StampTemplate,
        calculator: &PricingCalculator,
        promo: Option<&PromoCode>,
        now: DateTime<Utc>,
    ) -> Result<(), PromoCodeError> {
        let discount = match &self.promo_code {
            None => Money::zero(),
            Some(code) => match promo.filter(|p| &p.code == code) {
                Some(p) => p.validate_for_order(
                    self.subtotal(template, calculator),
                    now,
                    self.has_redeemed(code),
                )?,
                None => return Err(PromoCodeError::InvalidCode { code: code.clone() }),
            },
        };

        self.breakdown = calculator.breakdown(&self.pricing_input(template, discount));
        self.updated_at = now;
        Ok(())
    }

    /// Moves a pending order back to draft so its selection can change.
    ///
    /// Returns whether the order was reopened.
    pub fn begin_edit(&mut self, now: DateTime<Utc>) -> Result<bool, StateTransitionError> {
        match self.status {
            OrderStatus::Draft => Ok(false),
            OrderStatus::PendingPayment => {
                self.reopen(now)?;
                Ok(true)
            }
            from => Err(StateTransitionError {
                from,
                to: OrderStatus::Draft,
            }),
        }
    }

    /// Changes service tier and delivery, then reprices.
    pub fn change_service(
        &mut self,
        selection: ServiceSelection,
        template: &StampTemplate,
        calculator: &PricingCalculator,
        promo: Option<&PromoCode>,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.begin_edit(now)?;

        self.delivery_address = validate_delivery_address(
            selection.doorstep_delivery,
            selection.delivery_address.as_deref(),
        )?;
        self.service_type = selection.service_type;
        self.doorstep_delivery = selection.doorstep_delivery;

        self.reprice(template, calculator, promo, now)?;
        Ok(())
    }

    /// Attaches a promo code and reprices.
    ///
    /// Re-applying the code this order already redeemed keeps the redemption.
    pub fn apply_promo(
        &mut self,
        promo: &PromoCode,
        template: &StampTemplate,
        calculator: &PricingCalculator,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.begin_edit(now)?;

        self.promo_code = Some(promo.code.clone());

        self.reprice(template, calculator, Some(promo), now)?;
        Ok(())
    }

    /// Detaches the promo code and reprices.
    ///
    /// A redemption already counted is not given back.
    pub fn remove_promo(
        &mut self,
        template: &StampTemplate,
        calculator: &PricingCalculator,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.begin_edit(now)?;

        self.promo_code = None;

        self.reprice(template, calculator, None, now)?;
        Ok(())
    }

    /// Whether this order already consumed a redemption of `code`.
    pub fn has_redeemed(&self, code: &str) -> bool {
        self.redeemed_promos.iter().any(|c| c == code)
    }

    /// Code that must be redeemed when the payment order is created, if any.
    pub fn promo_to_redeem(&self) -> Option<&str> {
        self.promo_code
            .as_deref()
            .filter(|code| !self.has_redeemed(code))
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    fn transition(&mut self, to: OrderStatus, now: DateTime<Utc>) -> Result<(), StateTransitionError> {
        self.status.check_transition(to)?;
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// `draft -> pending_payment`: freezes the breakdown against a gateway order.
    pub fn submit_for_payment(
        &mut self,
        gateway_order_id: String,
        now: DateTime<Utc>,
    ) -> Result<(), StateTransitionError> {
        self.transition(OrderStatus::PendingPayment, now)?;
        self.gateway_order_id = Some(gateway_order_id);
        if let Some(code) = self.promo_to_redeem().map(str::to_owned) {
            self.redeemed_promos.push(code);
        }
        Ok(())
    }

    /// `pending_payment -> draft`.
    pub fn reopen(&mut self, now: DateTime<Utc>) -> Result<(), StateTransitionError> {
        self.transition(OrderStatus::Draft, now)?;
        self.gateway_order_id = None;
        Ok(())
    }

    /// Verifies a gateway confirmation against the gateway order on record.
    pub fn verify_payment(
        &self,
        verifier: &PaymentSignatureVerifier,
        confirmation: &PaymentConfirmation,
    ) -> CoreResult<VerifiedPayment> {
        self.status.check_transition(OrderStatus::PaymentVerified)?;

        let expected = self.gateway_order_id.as_deref().ok_or_else(|| {
            PaymentVerificationError::OrderMismatch {
                expected: String::new(),
                received: confirmation.gateway_order_id.clone(),
            }
        })?;

        Ok(verifier.verify(expected, confirmation)?)
    }

    /// `pending_payment -> payment_verified`, consuming the verification proof.
    pub fn confirm_payment(&mut self, proof: VerifiedPayment, now: DateTime<Utc>) -> CoreResult<()> {
        self.status.check_transition(OrderStatus::PaymentVerified)?;

        if self.gateway_order_id.as_deref() != Some(proof.gateway_order_id()) {
            return Err(PaymentVerificationError::OrderMismatch {
                expected: self.gateway_order_id.clone().unwrap_or_default(),
                received: proof.gateway_order_id().to_string(),
            }
            .into());
        }

        self.transition(OrderStatus::PaymentVerified, now)?;
        self.gateway_payment_id = Some(proof.gateway_payment_id().to_string());
        self.paid_at = Some(now);
        Ok(())
    }

    /// `payment_verified | failed -> generating`.
    pub fn start_generation(&mut self, now: DateTime<Utc>) -> Result<(), StateTransitionError> {
        self.transition(OrderStatus::Generating, now)?;
        self.failure_reason = None;
        Ok(())
    }

    /// `generating -> generated`.
    pub fn complete_generation(
        &mut self,
        artifact_url: String,
        now: DateTime<Utc>,
    ) -> Result<(), StateTransitionError> {
        self.transition(OrderStatus::Generated, now)?;
        self.artifact_url = Some(artifact_url);
        Ok(())
    }

    /// `generating -> failed`.
    pub fn fail_generation(&mut self, reason: String, now: DateTime<Utc>) -> Result<(), StateTransitionError> {
        self.transition(OrderStatus::Failed, now)?;
        self.failure_reason = Some(reason);
        Ok(())
    }

    /// `generated -> delivered`.
    pub fn deliver(&mut self, now: DateTime<Utc>) -> Result<(), StateTransitionError> {
        self.transition(OrderStatus::Delivered, now)
    }

    /// Any non-terminal status `-> cancelled`.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), StateTransitionError> {
        self.transition(OrderStatus::Cancelled, now)
    }
}

/// Builds the customer-facing order number, `ES-YYYYMMDD-XXXXXX`.
///
/// The suffix is the first six hex digits of the order id, uppercased.
pub fn order_number(id: &Uuid, created_at: DateTime<Utc>) -> String {
    let hex = id.simple().to_string().to_uppercase();
    format!(
        "{}-{}-{}",
        ORDER_NUMBER_PREFIX,
        created_at.format("%Y%m%d"),
        &hex[..6]
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promo::DiscountRule;
    use crate::CoreError;
    use chrono::{Duration, TimeZone};

    fn template() -> StampTemplate {
        StampTemplate {
            id: "t-1".to_string(),
            state: "Karnataka".to_string(),
            document_type: "Rental Agreement".to_string(),
            base_price: Money::from_paise(10100),
            convenience_fee: Money::from_paise(7697),
            description: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn party(name: &str, phone: &str) -> Party {
        Party {
            name: name.to_string(),
            phone: phone.to_string(),
        }
    }

    fn draft() -> OrderDraft {
        OrderDraft {
            first_party: party("Asha Rao", "+91 98765 43210"),
            second_party: party("Vikram Shetty", "7012345678"),
            customer_email: None,
            state: "Karnataka".to_string(),
            document_type: "Rental Agreement".to_string(),
            purpose: Some("11 month lease".to_string()),
            stamp_amount: None,
            service_type: ServiceType::Standard,
            doorstep_delivery: false,
            delivery_address: None,
        }
    }

    fn new_order() -> StampOrder {
        StampOrder::create(
            Uuid::new_v4(),
            draft(),
            &template(),
            &PricingCalculator::default(),
            Utc::now(),
        )
        .unwrap()
    }

    fn super_promo() -> PromoCode {
        let now = Utc::now();
        PromoCode {
            code: "SUPER".to_string(),
            discount: DiscountRule::Fixed {
                amount: Money::from_paise(1500),
            },
            min_order_amount: Money::from_paise(10000),
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            usage_limit: Some(1),
            usage_count: 0,
            is_active: true,
            created_at: now,
        }
    }

    fn paid_order(verifier: &PaymentSignatureVerifier) -> StampOrder {
        let mut order = new_order();
        order.submit_for_payment("order_G1".to_string(), Utc::now()).unwrap();
        let proof = order
            .verify_payment(
                verifier,
                &PaymentConfirmation {
                    gateway_order_id: "order_G1".to_string(),
                    gateway_payment_id: "pay_P1".to_string(),
                    signature: verifier.sign("order_G1", "pay_P1"),
                },
            )
            .unwrap();
        order.confirm_payment(proof, Utc::now()).unwrap();
        order
    }

    #[test]
    fn test_create_draft() {
        let order = new_order();

        assert_eq!(order.status, OrderStatus::Draft);
        assert_eq!(order.first_party.phone, "9876543210");
        assert_eq!(order.stamp_amount.paise(), 10100);
        assert_eq!(order.breakdown.total.paise(), 17797);
        assert!(order.order_number.starts_with("ES-"));
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let t = template();
        let calc = PricingCalculator::default();

        let mut d = draft();
        d.stamp_amount = Some(Money::from_paise(5000));
        assert!(StampOrder::create(Uuid::new_v4(), d, &t, &calc, Utc::now()).is_err());

        let mut d = draft();
        d.doorstep_delivery = true;
        assert!(StampOrder::create(Uuid::new_v4(), d, &t, &calc, Utc::now()).is_err());

        let mut d = draft();
        d.second_party.phone = "12345".to_string();
        assert!(StampOrder::create(Uuid::new_v4(), d, &t, &calc, Utc::now()).is_err());
    }

    #[test]
    fn test_order_number_format() {
        let id = Uuid::parse_str("3f9a1c00-e29b-41d4-a716-446655440000").unwrap();
        let at = Utc.with_ymd_and_hms(2025, 3, 7, 10, 0, 0).unwrap();
        assert_eq!(order_number(&id, at), "ES-20250307-3F9A1C");
    }

    #[test]
    fn test_transition_table() {
        use OrderStatus::*;

        assert!(Draft.can_transition_to(PendingPayment));
        assert!(PendingPayment.can_transition_to(Draft));
        assert!(Failed.can_transition_to(Generating));
        assert!(Generated.can_transition_to(Delivered));

        assert!(!Draft.can_transition_to(Generated));
        assert!(!Draft.can_transition_to(PaymentVerified));
        assert!(!Generated.can_transition_to(Generating));

        for from in OrderStatus::ALL {
            assert_eq!(from.can_transition_to(Cancelled), !from.is_terminal());
            if from.is_terminal() {
                for to in OrderStatus::ALL {
                    assert!(!from.can_transition_to(to));
                }
            }
        }
    }

    #[test]
    fn test_draft_to_generated_rejected() {
        let mut order = new_order();
        let err = order
            .complete_generation("https://files/doc.pdf".to_string(), Utc::now())
            .unwrap_err();

        assert_eq!(
            err,
            StateTransitionError {
                from: OrderStatus::Draft,
                to: OrderStatus::Generated,
            }
        );
        assert_eq!(order.status, OrderStatus::Draft);
        assert!(order.artifact_url.is_none());
    }

    #[test]
    fn test_full_lifecycle() {
        let verifier = PaymentSignatureVerifier::new("secret").unwrap();
        let mut order = paid_order(&verifier);

        assert_eq!(order.status, OrderStatus::PaymentVerified);
        assert_eq!(order.gateway_payment_id.as_deref(), Some("pay_P1"));
        assert!(order.paid_at.is_some());

        order.start_generation(Utc::now()).unwrap();
        order.fail_generation("template error".to_string(), Utc::now()).unwrap();
        assert_eq!(order.failure_reason.as_deref(), Some("template error"));

        order.start_generation(Utc::now()).unwrap();
        assert!(order.failure_reason.is_none());

        order
            .complete_generation("https://files/ES.pdf".to_string(), Utc::now())
            .unwrap();
        order.deliver(Utc::now()).unwrap();

        assert!(order.status.is_terminal());
        assert!(order.cancel(Utc::now()).is_err());
    }

    #[test]
    fn test_tampered_signature_leaves_order_pending() {
        let verifier = PaymentSignatureVerifier::new("secret").unwrap();
        let mut order = new_order();
        order.submit_for_payment("order_G1".to_string(), Utc::now()).unwrap();
        let before = order.clone();

        let result = order.verify_payment(
            &verifier,
            &PaymentConfirmation {
                gateway_order_id: "order_G1".to_string(),
                gateway_payment_id: "pay_P1".to_string(),
                signature: verifier.sign("order_G1", "pay_P2"),
            },
        );

        assert!(matches!(
            result,
            Err(CoreError::PaymentVerification(PaymentVerificationError::SignatureMismatch))
        ));
        assert_eq!(order, before);
        assert_eq!(order.status, OrderStatus::PendingPayment);
    }

    #[test]
    fn test_verify_requires_pending_payment() {
        let verifier = PaymentSignatureVerifier::new("secret").unwrap();
        let order = new_order();

        let result = order.verify_payment(
            &verifier,
            &PaymentConfirmation {
                gateway_order_id: "order_G1".to_string(),
                gateway_payment_id: "pay_P1".to_string(),
                signature: verifier.sign("order_G1", "pay_P1"),
            },
        );
        assert!(matches!(result, Err(CoreError::InvalidTransition(_))));
    }

    #[test]
    fn test_proof_for_another_order_is_rejected() {
        let verifier = PaymentSignatureVerifier::new("secret").unwrap();

        let mut other = new_order();
        other.submit_for_payment("order_OTHER".to_string(), Utc::now()).unwrap();
        let proof = other
            .verify_payment(
                &verifier,
                &PaymentConfirmation {
                    gateway_order_id: "order_OTHER".to_string(),
                    gateway_payment_id: "pay_X".to_string(),
                    signature: verifier.sign("order_OTHER", "pay_X"),
                },
            )
            .unwrap();

        let mut order = new_order();
        order.submit_for_payment("order_G1".to_string(), Utc::now()).unwrap();

        assert!(order.confirm_payment(proof, Utc::now()).is_err());
        assert_eq!(order.status, OrderStatus::PendingPayment);
    }

    #[test]
    fn test_apply_promo_and_submit_marks_redeemed() {
        let t = template();
        let calc = PricingCalculator::default();
        let promo = super_promo();
        let mut order = new_order();

        order.apply_promo(&promo, &t, &calc, Utc::now()).unwrap();
        assert_eq!(order.breakdown.discount.paise(), 1500);
        assert_eq!(order.breakdown.total.paise(), 16297);
        assert_eq!(order.promo_to_redeem(), Some("SUPER"));

        order.submit_for_payment("order_G1".to_string(), Utc::now()).unwrap();
        assert_eq!(order.redeemed_promos, vec!["SUPER".to_string()]);
        assert_eq!(order.promo_to_redeem(), None);
    }

    #[test]
    fn test_reopen_keeps_own_redemption() {
        let t = template();
        let calc = PricingCalculator::default();
        let mut promo = super_promo();
        let mut order = new_order();

        order.apply_promo(&promo, &t, &calc, Utc::now()).unwrap();
        order.submit_for_payment("order_G1".to_string(), Utc::now()).unwrap();
        // This order consumed the only use
        promo.usage_count = 1;

        order
            .change_service(
                ServiceSelection {
                    service_type: ServiceType::Express,
                    doorstep_delivery: false,
                    delivery_address: None,
                },
                &t,
                &calc,
                Some(&promo),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(order.status, OrderStatus::Draft);
        assert!(order.gateway_order_id.is_none());
        assert!(order.has_redeemed("SUPER"));
        assert_eq!(order.breakdown.total.paise(), 27797 - 1500);
    }

    #[test]
    fn test_reapplying_removed_code_is_not_redeemed_twice() {
        let t = template();
        let calc = PricingCalculator::default();
        let mut promo = super_promo();
        let mut order = new_order();

        order.apply_promo(&promo, &t, &calc, Utc::now()).unwrap();
        order.submit_for_payment("order_G1".to_string(), Utc::now()).unwrap();
        promo.usage_count = 1;

        order.remove_promo(&t, &calc, Utc::now()).unwrap();
        assert_eq!(order.status, OrderStatus::Draft);
        assert!(order.has_redeemed("SUPER"));

        // The single use belongs to this order, so applying it again succeeds
        order.apply_promo(&promo, &t, &calc, Utc::now()).unwrap();
        assert_eq!(order.breakdown.discount.paise(), 1500);
        assert_eq!(order.promo_to_redeem(), None);

        order.submit_for_payment("order_G2".to_string(), Utc::now()).unwrap();
        assert_eq!(order.redeemed_promos, vec!["SUPER".to_string()]);
    }

    #[test]
    fn test_switching_codes_redeems_each_once() {
        let t = template();
        let calc = PricingCalculator::default();
        let first = super_promo();
        let second = PromoCode {
            code: "WELCOME".to_string(),
            ..super_promo()
        };
        let mut order = new_order();

        order.apply_promo(&first, &t, &calc, Utc::now()).unwrap();
        order.submit_for_payment("order_G1".to_string(), Utc::now()).unwrap();
        order.apply_promo(&second, &t, &calc, Utc::now()).unwrap();
        assert_eq!(order.promo_to_redeem(), Some("WELCOME"));
        order.submit_for_payment("order_G2".to_string(), Utc::now()).unwrap();

        assert_eq!(order.redeemed_promos, vec!["SUPER".to_string(), "WELCOME".to_string()]);
    }

    #[test]
    fn test_change_service_requires_editable_order() {
        let verifier = PaymentSignatureVerifier::new("secret").unwrap();
        let mut order = paid_order(&verifier);

        let result = order.change_service(
            ServiceSelection {
                service_type: ServiceType::Express,
                doorstep_delivery: false,
                delivery_address: None,
            },
            &template(),
            &PricingCalculator::default(),
            None,
            Utc::now(),
        );
        assert!(matches!(result, Err(CoreError::InvalidTransition(_))));
    }

    #[test]
    fn test_doorstep_selection_requires_address() {
        let mut order = new_order();
        let result = order.change_service(
            ServiceSelection {
                service_type: ServiceType::Standard,
                doorstep_delivery: true,
                delivery_address: None,
            },
            &template(),
            &PricingCalculator::default(),
            None,
            Utc::now(),
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_remove_promo() {
        let t = template();
        let calc = PricingCalculator::default();
        let mut order = new_order();

        order.apply_promo(&super_promo(), &t, &calc, Utc::now()).unwrap();
        order.remove_promo(&t, &calc, Utc::now()).unwrap();

        assert!(order.promo_code.is_none());
        assert_eq!(order.breakdown.discount, Money::zero());
        assert_eq!(order.breakdown.total.paise(), 17797);
    }

    #[test]
    fn test_status_display_matches_serde() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
        }
    }
}
