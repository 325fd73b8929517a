//! Payment Handlers
//!
//! ```text
//! POST /orders/{id}/payment          draft ──► pending_payment (gateway order)
//! POST /orders/{id}/payment/verify   pending_payment ──► payment_verified
//! ```

use std::sync::Arc;

use salvo::prelude::*;

use estamp_core::{PaymentConfirmation, StampOrder};

use crate::{error::ApiResult, extensions::*, service::PaymentOrder, state::State};

/// Create Payment Handler
#[handler]
pub(crate) async fn create(req: &mut Request, depot: &mut Depot) -> ApiResult<Json<PaymentOrder>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let id = req.path_param("id")?;

    Ok(Json(state.orders.create_payment(&id).await?))
}

/// Verify Payment Handler
///
/// Body is the gateway's checkout callback. A bad signature is a 400 and
/// leaves the order in `pending_payment`.
#[handler]
pub(crate) async fn verify(req: &mut Request, depot: &mut Depot) -> ApiResult<Json<StampOrder>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let id = req.path_param("id")?;
    let confirmation: PaymentConfirmation = req.parse_json().await?;

    Ok(Json(state.orders.verify_payment(&id, confirmation).await?))
}
