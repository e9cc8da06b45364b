//! Liveness and datastore health.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(check))
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub documents: bool,
    pub accounts: bool,
}

/// Pings both pools. Degraded answers 503 so load balancers notice.
async fn check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Health>) {
    let (documents, accounts) = tokio::join!(
        state.documents.health_check(),
        state.accounts.health_check()
    );

    let (code, status) = if documents && accounts {
        (StatusCode::OK, "ok")
    } else {
        tracing::warn!(documents, accounts, "Health check degraded");
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(Health {
            status,
            documents,
            accounts,
        }),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::testing;

    #[tokio::test]
    async fn test_health_reports_both_stores() {
        let app = testing::app().await;
        let (status, body) = app.get("/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["documents"], true);
        assert_eq!(body["accounts"], true);
    }

    #[tokio::test]
    async fn test_health_degrades_when_a_pool_closes() {
        let app = testing::app().await;
        app.state.accounts.close().await;

        let (status, body) = app.get("/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["documents"], true);
        assert_eq!(body["accounts"], false);
    }
}
