//! # URL Handlers
//!
//! Handler‌های ساخت لینک و redirect

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::{
    api::extractors::{ClientIp, Referrer, RequestBaseUrl, ValidatedJson},
    error::Result,
    models::CreateShortUrlRequest,
    services::AppState,
};

// =====================================
// Create Short URL
// =====================================
/// ساخت لینک کوتاه جدید
///
/// # مفاهیم:
/// - `State<AppState>`: استخراج state از request
/// - `ValidatedJson<T>`: deserialize و validate بدنه JSON
/// - `RequestBaseUrl`: آدرس پایه برای `shortLink`
///
/// # Endpoint
/// `POST /shorturls`
///
/// # Request Body
/// ```json
/// {
///   "url": "https://example.com/long-url",
///   "validity": 30,        // optional، دقیقه
///   "shortcode": "mylink"  // optional
/// }
/// ```
///
/// # Response
/// ```json
/// {
///   "shortLink": "http://localhost:5000/mylink",
///   "expiry": "2024-01-01T00:30:00.000Z"
/// }
/// ```
pub async fn create_short_url(
    State(state): State<AppState>,
    RequestBaseUrl(base_url): RequestBaseUrl,
    ValidatedJson(request): ValidatedJson<CreateShortUrlRequest>,
) -> Result<impl IntoResponse> {
    let created = state
        .url_service
        .create_short_url(request, &base_url)
        .await?;

    // 201 Created
    Ok((StatusCode::CREATED, Json(created)))
}

// =====================================
// Redirect
// =====================================
/// Redirect به URL اصلی و ثبت کلیک
///
/// # مفاهیم:
/// - `Path<String>`: استخراج پارامتر از URL
/// - `302 Found` با header `Location`
/// - این handler اصلی‌ترین عملکرد URL shortener هست
///
/// # Endpoint
/// `GET /:shortCode`
///
/// # Response
/// - 302 Redirect به URL اصلی
/// - 404 اگه پیدا نشه یا منقضی شده باشه
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Referrer(referrer): Referrer,
    ClientIp(ip): ClientIp,
) -> Result<Response> {
    let long_url = state
        .url_service
        .resolve_and_record_click(&code, referrer, &ip)
        .await?;

    info!(short_code = %code, "Redirecting");

    // `Redirect` در axum فقط 303/307/308 داره
    Ok((StatusCode::FOUND, [(header::LOCATION, long_url)]).into_response())
}
