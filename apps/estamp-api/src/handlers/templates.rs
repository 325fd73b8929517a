//! Template Catalog Handlers

use std::sync::Arc;

use salvo::prelude::*;

use estamp_core::StampTemplate;

use crate::{error::ApiResult, extensions::*, state::State};

/// List Templates Handler
///
/// Active templates, ordered by state then document type.
#[handler]
pub(crate) async fn list(depot: &mut Depot) -> ApiResult<Json<Vec<StampTemplate>>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    Ok(Json(state.orders.list_templates().await?))
}

/// Lookup Template Handler
#[handler]
pub(crate) async fn lookup(req: &mut Request, depot: &mut Depot) -> ApiResult<Json<StampTemplate>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let state_name = req.path_param("state")?;
    let document_type = req.path_param("document_type")?;

    Ok(Json(
        state
            .orders
            .lookup_template(&state_name, &document_type)
            .await?,
    ))
}
