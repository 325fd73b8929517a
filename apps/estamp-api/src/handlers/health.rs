//! Healthcheck Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{error::ApiResult, extensions::*, state::State};

/// Healthcheck response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Whether the database answered a trivial query
    pub database: bool,
}

/// Healthcheck handler
///
/// Reports `degraded` with a 503 when the database is unreachable.
#[handler]
pub(crate) async fn handler(depot: &mut Depot, res: &mut Response) -> ApiResult<Json<HealthResponse>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let database = state.orders.database().health_check().await;

    if !database {
        res.status_code(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(HealthResponse {
        status: if database { "ok" } else { "degraded" }.to_string(),
        database,
    }))
}
