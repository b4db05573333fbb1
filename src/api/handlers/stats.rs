//! # Stats Handler
//!
//! آمار کلیک‌های یک لینک

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::Result,
    models::StatsView,
    services::AppState,
};

// =====================================
// Get Stats
// =====================================
/// گرفتن آمار یک لینک
///
/// لینک منقضی هم آمار داره
///
/// # Endpoint
/// `GET /shorturls/:shortCode`
///
/// # Response
/// ```json
/// {
///   "totalClicks": 1,
///   "originalUrl": "https://example.com",
///   "creationDate": "2024-01-01T00:00:00.000Z",
///   "expiryDate": "2024-01-01T00:30:00.000Z",
///   "clickData": [
///     { "timestamp": "...", "referrer": "direct", "ip": "127.0.0.1" }
///   ]
/// }
/// ```
pub async fn get_stats(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<StatsView>> {
    let stats = state.url_service.get_statistics(&code).await?;

    Ok(Json(stats))
}
