//! Order Handlers
//!
//! The wizard: create a draft, poll it, change the service step, and the
//! admin-side delivery and cancellation transitions.

use std::sync::Arc;

use salvo::{http::header::LOCATION, prelude::*};

use estamp_core::{OrderDraft, ServiceSelection, StampOrder};

use crate::{error::ApiResult, extensions::*, state::State};

/// Create Draft Order Handler
#[handler]
pub(crate) async fn create(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> ApiResult<Json<StampOrder>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let draft: OrderDraft = req.parse_json().await?;

    let order = state.orders.create_order(draft).await?;

    res.add_header(LOCATION, format!("/orders/{}", order.id), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(order))
}

/// Get Order Handler
///
/// Polled by the wizard for status and price.
#[handler]
pub(crate) async fn get(req: &mut Request, depot: &mut Depot) -> ApiResult<Json<StampOrder>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let id = req.path_param("id")?;

    Ok(Json(state.orders.get_order(&id).await?))
}

/// Change Service Selection Handler
#[handler]
pub(crate) async fn change_service(
    req: &mut Request,
    depot: &mut Depot,
) -> ApiResult<Json<StampOrder>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let id = req.path_param("id")?;
    let selection: ServiceSelection = req.parse_json().await?;

    Ok(Json(state.orders.change_service(&id, selection).await?))
}

/// Mark Delivered Handler
#[handler]
pub(crate) async fn deliver(req: &mut Request, depot: &mut Depot) -> ApiResult<Json<StampOrder>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let id = req.path_param("id")?;

    Ok(Json(state.orders.deliver(&id).await?))
}

/// Cancel Order Handler
#[handler]
pub(crate) async fn cancel(req: &mut Request, depot: &mut Depot) -> ApiResult<Json<StampOrder>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let id = req.path_param("id")?;

    Ok(Json(state.orders.cancel(&id).await?))
}
