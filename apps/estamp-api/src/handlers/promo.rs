//! Promo Code Handlers

use std::sync::Arc;

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

use estamp_core::StampOrder;

use crate::{
    error::ApiResult,
    extensions::*,
    service::{PromoCheck, PromoQuote},
    state::State,
};

/// Apply Promo Request
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ApplyPromoRequest {
    pub code: String,
}

/// Apply Promo Handler
///
/// Rejections come back as 422 with the reason as `code`.
#[handler]
pub(crate) async fn apply(req: &mut Request, depot: &mut Depot) -> ApiResult<Json<StampOrder>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let id = req.path_param("id")?;
    let body: ApplyPromoRequest = req.parse_json().await?;

    Ok(Json(state.orders.apply_promo(&id, &body.code).await?))
}

/// Remove Promo Handler
#[handler]
pub(crate) async fn remove(req: &mut Request, depot: &mut Depot) -> ApiResult<Json<StampOrder>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let id = req.path_param("id")?;

    Ok(Json(state.orders.remove_promo(&id).await?))
}

/// Validate Promo Handler
///
/// Checks a code against a subtotal without an order.
#[handler]
pub(crate) async fn validate(req: &mut Request, depot: &mut Depot) -> ApiResult<Json<PromoQuote>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let check: PromoCheck = req.parse_json().await?;

    Ok(Json(state.orders.validate_promo(check).await?))
}
