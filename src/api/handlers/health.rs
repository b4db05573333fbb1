//! # Health Check Handler
//!
//! برای بررسی سلامت سرویس

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    audit::Package,
    models::HealthResponse,
    services::AppState,
};

// =====================================
// Health Check
// =====================================
/// بررسی سلامت سرویس
///
/// # مفاهیم:
/// - Health check برای Kubernetes/Docker
/// - بررسی اتصال دیتابیس
///
/// # Endpoint
/// `GET /health`
///
/// # Response
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": true
/// }
/// ```
/// اگه دیتابیس در دسترس نباشه `503` با `"degraded"` برمیگرده و یه رویداد audit ثبت میشه.
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let db_ok = state.url_service.is_store_healthy().await;

    let status = if db_ok {
        StatusCode::OK
    } else {
        state
            .audit
            .error(Package::Database, "Health check failed: database unavailable");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(HealthResponse::from_database(db_ok)))
}
