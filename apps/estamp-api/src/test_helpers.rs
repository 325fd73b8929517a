//! Test helpers.

use std::sync::Arc;

use chrono::{Duration, Utc};
use salvo::prelude::*;
use serde_json::{json, Value};

use estamp_core::{
    DiscountRule, Money, NewPromoCode, NewTemplate, OrderDraft, Party, PaymentSignatureVerifier,
    PricingCalculator, ServiceType,
};
use estamp_db::{Database, DbConfig};

use crate::gateway::{GatewayOrder, MockPaymentGateway};
use crate::notifier::MockNotifier;
use crate::router::app_router;
use crate::service::{CheckoutSettings, OrderService};
use crate::state::State;

pub(crate) const KEY_ID: &str = "rzp_test_key";
pub(crate) const KEY_SECRET: &str = "rzp_test_secret";

/// In-memory database with one Karnataka template and three promo codes.
///
/// - `SUPER`: fixed 1500, minimum 10000, unlimited
/// - `LAUNCH`: fixed 5000, minimum 20000, single use
/// - `OLDIE`: fixed 1000, expired yesterday
pub(crate) async fn seeded_db() -> anyhow::Result<Database> {
    seeded_db_with(DbConfig::in_memory()).await
}

/// [`seeded_db`] over any database, e.g. a file for multi-connection tests.
pub(crate) async fn seeded_db_with(config: DbConfig) -> anyhow::Result<Database> {
    let db = Database::new(config).await?;
    let now = Utc::now();

    db.templates()
        .insert(&NewTemplate {
            state: "Karnataka".to_string(),
            document_type: "Rental Agreement".to_string(),
            base_price: Money::from_paise(10100),
            convenience_fee: Money::from_paise(7697),
            description: None,
        })
        .await?;

    let promos = [
        ("SUPER", 1500, 10000, None, now + Duration::days(30)),
        ("LAUNCH", 5000, 20000, Some(1), now + Duration::days(30)),
        ("OLDIE", 1000, 0, None, now - Duration::days(1)),
    ];
    for (code, amount, minimum, usage_limit, valid_until) in promos {
        db.promo_codes()
            .insert(&NewPromoCode {
                code: code.to_string(),
                discount: DiscountRule::Fixed {
                    amount: Money::from_paise(amount),
                },
                min_order_amount: Money::from_paise(minimum),
                valid_from: now - Duration::days(10),
                valid_until,
                usage_limit,
            })
            .await?;
    }

    Ok(db)
}

pub(crate) async fn test_service(
    gateway: MockPaymentGateway,
    notifier: MockNotifier,
) -> anyhow::Result<OrderService> {
    service_over(seeded_db().await?, gateway, notifier)
}

pub(crate) fn service_over(
    db: Database,
    gateway: MockPaymentGateway,
    notifier: MockNotifier,
) -> anyhow::Result<OrderService> {
    Ok(OrderService::new(
        db,
        PricingCalculator::default(),
        PaymentSignatureVerifier::new(KEY_SECRET)?,
        Arc::new(gateway),
        Arc::new(notifier),
        CheckoutSettings {
            key_id: KEY_ID.to_string(),
            currency: "INR".to_string(),
        },
    ))
}

/// The full router over a seeded database.
pub(crate) async fn api_service(
    gateway: MockPaymentGateway,
    notifier: MockNotifier,
) -> anyhow::Result<Service> {
    let state = Arc::new(State::new(test_service(gateway, notifier).await?));
    Ok(Service::new(app_router(state)))
}

/// Notifier that accepts any number of notifications.
pub(crate) fn quiet_notifier() -> MockNotifier {
    let mut notifier = MockNotifier::new();

    notifier.expect_payment_confirmed().returning(|_| Ok(()));
    notifier.expect_document_ready().returning(|_| Ok(()));

    notifier
}

/// Gateway that hands out `id` for every order.
pub(crate) fn gateway_with_id(id: &'static str) -> MockPaymentGateway {
    let mut gateway = MockPaymentGateway::new();

    gateway.expect_create_order().returning(move |amount, _| {
        Ok(GatewayOrder {
            id: id.to_string(),
            amount,
            currency: "INR".to_string(),
        })
    });

    gateway
}

/// Express Karnataka rental agreement without doorstep delivery.
pub(crate) fn draft() -> OrderDraft {
    OrderDraft {
        first_party: Party {
            name: "Asha Rao".to_string(),
            phone: "+91 98450 12345".to_string(),
        },
        second_party: Party {
            name: "Vikram Shetty".to_string(),
            phone: "9741234567".to_string(),
        },
        customer_email: Some("asha@example.com".to_string()),
        state: "Karnataka".to_string(),
        document_type: "Rental Agreement".to_string(),
        purpose: Some("11 month lease".to_string()),
        stamp_amount: None,
        service_type: ServiceType::Express,
        doorstep_delivery: false,
        delivery_address: None,
    }
}

/// [`draft`] as a request body.
pub(crate) fn draft_json() -> Value {
    json!({
        "firstParty": { "name": "Asha Rao", "phone": "+91 98450 12345" },
        "secondParty": { "name": "Vikram Shetty", "phone": "9741234567" },
        "customerEmail": "asha@example.com",
        "state": "Karnataka",
        "documentType": "Rental Agreement",
        "purpose": "11 month lease",
        "serviceType": "express",
        "doorstepDelivery": false
    })
}
