//! # Middleware
//!
//! Middleware‌های سفارشی برای پردازش request/response
//!
//! ## مفاهیم:
//! - **Middleware**: کد که قبل/بعد از handler اجرا میشه
//! - **Tower**: کتابخانه middleware در اکوسیستم Rust
//! - **Layer**: wrapper برای اضافه کردن middleware
//!
//! هر request یک خط لاگ (method, uri, status, duration) و یک `X-Request-Id` داره.

use axum::{
    body::Body,
    http::{header::HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

// =====================================
// Request Timing Middleware
// =====================================
/// اندازه‌گیری زمان پردازش request
///
/// # مفاهیم:
/// - `async fn` middleware
/// - `Next`: ادامه زنجیره middleware
/// - `Instant`: اندازه‌گیری زمان
///
/// # استفاده:
/// ```rust,ignore
/// let app = Router::new()
///     .layer(axum::middleware::from_fn(request_timing));
/// ```
pub async fn request_timing(
    request: Request<Body>,
    next: Next,
) -> impl IntoResponse {
    let method = request.method().clone();
    let uri = request.uri().clone();

    // شروع تایمر
    let start = Instant::now();

    // اجرای بقیه زنجیره
    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        warn!(
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request failed"
        );
    } else {
        info!(
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

// =====================================
// Request ID Middleware
// =====================================
/// شناسه یکتای هر request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Header name برای request ID
    pub const HEADER_NAME: &'static str = "X-Request-Id";

    /// ID جدید
    #[must_use]
    pub fn generate() -> Self {
        Self(nanoid::nanoid!(12))
    }
}

/// اضافه کردن Request ID به هر request
///
/// # مفاهیم:
/// - ID ورودی حفظ میشه، در غیر این صورت یکی ساخته میشه
/// - ID به response header هم اضافه میشه
/// - بقیه زنجیره داخل یک span با این ID اجرا میشه
pub async fn request_id(
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let incoming = request
        .headers()
        .get(RequestId::HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .and_then(|v| HeaderValue::from_str(v).ok());

    let header_value = match incoming {
        Some(value) => value,
        None => {
            let RequestId(id) = RequestId::generate();
            // nanoid فقط کاراکترهای URL-safe تولید میکنه
            match HeaderValue::from_str(&id) {
                Ok(value) => value,
                Err(_) => return next.run(request).await,
            }
        }
    };

    request
        .headers_mut()
        .insert(RequestId::HEADER_NAME, header_value.clone());

    let span = info_span!(
        "request",
        request_id = %header_value.to_str().unwrap_or_default()
    );

    let mut response = next.run(request).instrument(span).await;

    response
        .headers_mut()
        .insert(RequestId::HEADER_NAME, header_value);

    response
}
