/// Liveness probe
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// { "status": "healthy", "version": "0.1.0", "database": "connected" }
/// ```
///
/// A failed database probe reports `degraded` with a 200, so load balancers
/// can tell a live process from a broken dependency.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use cluster_shared::db::pool;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

impl HealthResponse {
    fn from_probe(database_ok: bool) -> Self {
        let (status, database) = if database_ok {
            ("healthy", "connected")
        } else {
            ("degraded", "disconnected")
        };

        Self {
            status: status.to_string(),
            version: cluster_shared::VERSION.to_string(),
            database: database.to_string(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database_ok = match pool::health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health probe failed");
            false
        }
    };

    Ok(Json(HealthResponse::from_probe(database_ok)))
}
