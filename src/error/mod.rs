//! # ماژول مدیریت خطاها (Error Handling)
//!
//! این ماژول سیستم مدیریت خطای سرویس رو تعریف میکنه.
//!
//! ## دسته‌بندی خطاها:
//! - **InvalidInput**: URL یا بدنه درخواست نامعتبر - 400
//! - **Conflict**: کد کوتاه سفارشی قبلا استفاده شده - 409
//! - **NotFound**: کد کوتاه وجود نداره - 404
//! - **Expired**: کد وجود داره ولی منقضی شده - 404 (با پیام جدا)
//! - **Storage**: خطای خوندن/نوشتن دیتابیس - 500
//!
//! خطای ارسال لاگ audit اینجا نیست؛ اون هیچوقت از ماژول `audit` بیرون نمیاد.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// پیام عمومی برای خطاهای سرور؛ جزئیات داخلی به کلاینت نمیرسه
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

// =====================================
// Result Type Alias
// =====================================
/// نوع Result سفارشی برنامه
///
/// به جای نوشتن `Result<ShortUrlRecord, AppError>` میتونیم بنویسیم `Result<ShortUrlRecord>`
pub type Result<T, E = AppError> = std::result::Result<T, E>;

// =====================================
// Custom Error Enum
// =====================================
/// خطای اصلی برنامه
///
/// # مفاهیم:
/// - `#[derive(Error)]`: از thiserror برای پیاده‌سازی Error trait
/// - `#[from]`: تبدیل خودکار از نوع‌های دیگه با `?`
#[derive(Debug, Error)]
pub enum AppError {
    // ----------------------------------------
    // خطاهای کاربر (4xx)
    // ----------------------------------------

    /// ورودی نامعتبر - 400
    #[error("{0}")]
    InvalidInput(String),

    /// کد تکراری - 409
    #[error("{0}")]
    Conflict(String),

    /// پیدا نشد - 404
    #[error("{0}")]
    NotFound(String),

    /// منقضی شده - 404
    ///
    /// از بیرون مثل NotFound دیده میشه ولی داخل سرویس جداست
    #[error("{0}")]
    Expired(String),

    // ----------------------------------------
    // خطاهای سرور (5xx)
    // ----------------------------------------

    /// خطای داخلی سرور
    #[error("Internal server error: {0}")]
    Internal(String),

    /// خطای سرور HTTP
    #[error("Server error: {0}")]
    Server(String),

    /// خطای تنظیمات
    #[error("Configuration error: {0}")]
    Config(String),

    // ----------------------------------------
    // خطاهای تبدیل شده از کتابخانه‌ها
    // ----------------------------------------

    /// خطای دیتابیس (StorageError)
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// خطای اجرای migration
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// خطای IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// گرفتن HTTP status code متناسب با خطا
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) | Self::Expired(_) => StatusCode::NOT_FOUND,

            Self::Internal(_)
            | Self::Server(_)
            | Self::Config(_)
            | Self::Storage(_)
            | Self::Migration(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// آیا این یه خطای سرور هست؟
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// آیا خطا مربوط به لینک منقضی هست؟
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired(_))
    }

    /// پیامی که به کلاینت نشون داده میشه
    ///
    /// خطاهای سرور فقط پیام عمومی دارن
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_server_error() {
            SERVER_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }

    /// کد کوتاه پیدا نشد
    #[must_use]
    pub fn short_url_not_found() -> Self {
        Self::NotFound("No short URL found".to_string())
    }

    /// کد کوتاه منقضی شده
    #[must_use]
    pub fn short_url_expired() -> Self {
        Self::Expired("Short URL has expired".to_string())
    }
}

// =====================================
// Error Response DTO
// =====================================
/// ساختار پاسخ خطا در API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// دسته خطا (مثلا "Not Found")
    pub error: String,

    /// پیام خطا
    pub message: String,

    /// کد وضعیت HTTP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ErrorResponse {
    /// ساخت پاسخ خطای جدید
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// اضافه کردن کد وضعیت
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status_code = Some(status.as_u16());
        self
    }
}

// =====================================
// IntoResponse Implementation
// =====================================
/// تبدیل AppError به Response HTTP
///
/// این باعث میشه handler‌ها بتونن `Result<_, AppError>` برگردونن
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // جزئیات خطای سرور فقط در لاگ محلی ثبت میشه
        if self.is_server_error() {
            error!(error = %self, "Server error occurred");
        }

        let status = self.status_code();

        let error_response = ErrorResponse::new(
            status.canonical_reason().unwrap_or("Error"),
            self.public_message(),
        )
        .with_status(status);

        (status, Json(error_response)).into_response()
    }
}

// =====================================
// From Implementations
// =====================================
// خطای validator یعنی بدنه درخواست نامعتبره
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

// =====================================
// Option Extensions
// =====================================
/// Extension trait برای Option
pub trait OptionExt<T> {
    /// تبدیل None به AppError::NotFound
    fn ok_or_not_found(self, message: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.into()))
    }
}
