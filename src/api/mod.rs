//! # لایه API
//!
//! این ماژول HTTP handlers و routing رو مدیریت میکنه.
//!
//! ## مفاهیم Rust + Axum:
//! - **Router**: تعریف مسیرها
//! - **Handler Functions**: پردازش request‌ها
//! - **Extractors**: استخراج داده از request
//! - **State**: اشتراک state بین handlers
//! - **Middleware**: پردازش قبل/بعد از handler
//! - **Tower**: زیرساخت middleware
//!
//! ## ساختار URL‌ها:
//! - `POST /shorturls` - ساخت لینک کوتاه
//! - `GET /shorturls/:shortCode` - آمار لینک
//! - `GET /:shortCode` - Redirect به URL اصلی
//! - `GET /health` - Health check

mod handlers;
mod middleware;
mod extractors;

pub use handlers::*;
pub use middleware::*;
pub use extractors::*;

use axum::{
    routing::{get, post},
    Router,
    middleware as axum_middleware,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    timeout::TimeoutLayer,
};
use std::time::Duration;

use crate::services::AppState;

/// حداکثر زمان پردازش یک request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// =====================================
// Router Builder
// =====================================
/// ساخت Router اصلی برنامه
///
/// # مفاهیم:
/// - `Router::new()`: شروع router خالی
/// - `.route()`: اضافه کردن route
/// - `.layer()`: اضافه کردن middleware
/// - `.with_state()`: تزریق state
///
/// مسیرهای ثابت (`/health`, `/shorturls`) بر `/:shortCode` اولویت دارن.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Route اصلی redirect
        .route("/:code", get(handlers::url::redirect_handler))

        // API لینک‌ها
        .route("/shorturls", post(handlers::url::create_short_url))
        .route("/shorturls/:code", get(handlers::stats::get_stats))

        // Health check
        .route("/health", get(handlers::health::health_check))

        // Middleware‌های عمومی (اولی بیرونی‌ترین لایه‌ست)
        .layer(
            ServiceBuilder::new()
                // Request ID - قبل از همه تا بقیه داخل span باشن
                .layer(axum_middleware::from_fn(request_id))

                // Tracing - لاگ کردن request‌ها
                .layer(TraceLayer::new_for_http())

                // زمان پردازش هر request
                .layer(axum_middleware::from_fn(request_timing))

                // Timeout - حداکثر زمان پردازش
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT))

                // CORS - اجازه دسترسی از دامنه‌های دیگه
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any)
                )
        )

        // تزریق state به همه handlers
        .with_state(state)
}
