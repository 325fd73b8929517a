//! Admin Handlers
//!
//! Catalog and promo code maintenance. Authentication sits in front of the
//! API and is not checked here.

use std::sync::Arc;

use salvo::prelude::*;

use estamp_core::{NewPromoCode, NewTemplate, PromoCode, StampTemplate, TemplateUpdate};

use crate::{error::ApiResult, extensions::*, state::State};

/// Create Template Handler
///
/// A second template for the same state and document type is a 409.
#[handler]
pub(crate) async fn create_template(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> ApiResult<Json<StampTemplate>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let input: NewTemplate = req.parse_json().await?;

    let template = state.orders.create_template(input).await?;

    res.status_code(StatusCode::CREATED);
    Ok(Json(template))
}

/// Update Template Handler
#[handler]
pub(crate) async fn update_template(
    req: &mut Request,
    depot: &mut Depot,
) -> ApiResult<Json<StampTemplate>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let id = req.path_param("id")?;
    let update: TemplateUpdate = req.parse_json().await?;

    Ok(Json(state.orders.update_template(&id, update).await?))
}

/// Create Promo Code Handler
#[handler]
pub(crate) async fn create_promo(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> ApiResult<Json<PromoCode>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let input: NewPromoCode = req.parse_json().await?;

    let promo = state.orders.create_promo(input).await?;

    res.status_code(StatusCode::CREATED);
    Ok(Json(promo))
}

/// Deactivate Promo Code Handler
#[handler]
pub(crate) async fn deactivate_promo(req: &mut Request, depot: &mut Depot) -> ApiResult<StatusCode> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let code = req.path_param("code")?;

    state.orders.deactivate_promo(&code).await?;

    Ok(StatusCode::NO_CONTENT)
}
