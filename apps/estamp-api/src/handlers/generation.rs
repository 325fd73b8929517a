//! Generation Handlers
//!
//! Called by the operator console or the document worker. The PDF itself
//! is produced elsewhere; these endpoints only move the order along.

use std::sync::Arc;

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

use estamp_core::StampOrder;

use crate::{error::ApiResult, extensions::*, state::State};

/// Complete Generation Request
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompleteRequest {
    pub artifact_url: String,
}

/// Fail Generation Request
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct FailRequest {
    pub reason: String,
}

#[handler]
pub(crate) async fn start(req: &mut Request, depot: &mut Depot) -> ApiResult<Json<StampOrder>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let id = req.path_param("id")?;

    Ok(Json(state.orders.start_generation(&id).await?))
}

#[handler]
pub(crate) async fn complete(req: &mut Request, depot: &mut Depot) -> ApiResult<Json<StampOrder>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let id = req.path_param("id")?;
    let body: CompleteRequest = req.parse_json().await?;

    Ok(Json(
        state
            .orders
            .complete_generation(&id, &body.artifact_url)
            .await?,
    ))
}

#[handler]
pub(crate) async fn fail(req: &mut Request, depot: &mut Depot) -> ApiResult<Json<StampOrder>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let id = req.path_param("id")?;
    let body: FailRequest = req.parse_json().await?;

    Ok(Json(state.orders.fail_generation(&id, &body.reason).await?))
}

#[handler]
pub(crate) async fn retry(req: &mut Request, depot: &mut Depot) -> ApiResult<Json<StampOrder>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let id = req.path_param("id")?;

    Ok(Json(state.orders.retry_generation(&id).await?))
}
