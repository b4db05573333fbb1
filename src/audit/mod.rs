//! # ماژول لاگ Audit
//!
//! ارسال رویدادهای سرویس به یک سرویس جمع‌آوری لاگ بیرونی.
//!
//! ## قرارداد:
//! - `emit` هیچوقت block نمیکنه و هیچ خطایی برنمیگردونه
//! - ورودی نامعتبر (stack/level/package) همینجا دور ریخته میشه و فقط یه warn محلی داره
//! - خطای شبکه یا status ناموفق فقط در لاگ محلی (tracing) ثبت میشه
//!
//! ## مفاهیم Rust:
//! - **Trait Objects**: `Arc<dyn AuditLog>` به عنوان وابستگی تزریق میشه
//! - **FromStr**: parse کردن رشته به enum
//! - **tokio::spawn**: اجرای fire-and-forget در پس‌زمینه

mod remote;

pub use remote::RemoteAuditLogger;

use std::{fmt, str::FromStr, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::AuditConfig;

// =====================================
// Errors
// =====================================
/// خطاهای لاگ audit
///
/// این خطاها هیچوقت به `AppError` تبدیل نمیشن
#[derive(Debug, Error)]
pub enum AuditError {
    /// مقدار نامعتبر برای یکی از فیلدها
    #[error("Invalid {field}: {value}. Must be one of {allowed}")]
    InvalidField {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },

    /// خطای شبکه
    #[error("Error sending log: {0}")]
    Transport(#[from] reqwest::Error),

    /// پاسخ غیر 2xx
    #[error("Failed to send log: {0}")]
    Status(reqwest::StatusCode),
}

// =====================================
// Entry fields
// =====================================
/// کدوم بخش سیستم لاگ رو تولید کرده
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stack {
    Backend,
    Frontend,
}

/// سطح لاگ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// پکیج (component) تولید کننده لاگ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Package {
    Handler,
    Database,
    Middleware,
    Routes,
}

/// پیاده‌سازی `FromStr` (case-insensitive) و `as_str` برای enum‌های بالا
macro_rules! audit_field {
    ($ty:ident, $field:literal, $allowed:literal, { $($name:literal => $variant:ident),+ $(,)? }) => {
        impl $ty {
            /// نام lowercase که در JSON ارسال میشه
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = AuditError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(AuditError::InvalidField {
                        field: $field,
                        value: s.to_string(),
                        allowed: $allowed,
                    }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

audit_field!(Stack, "stack", "backend, frontend", {
    "backend" => Backend,
    "frontend" => Frontend,
});

audit_field!(Level, "level", "debug, info, warn, error", {
    "debug" => Debug,
    "info" => Info,
    "warn" => Warn,
    "error" => Error,
});

audit_field!(Package, "package", "handler, database, middleware, routes", {
    "handler" => Handler,
    "database" => Database,
    "middleware" => Middleware,
    "routes" => Routes,
});

// =====================================
// Entry
// =====================================
/// یک رویداد audit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub stack: Stack,
    pub level: Level,
    pub package: Package,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// ساخت رویداد با زمان فعلی
    #[must_use]
    pub fn new(stack: Stack, level: Level, package: Package, message: impl Into<String>) -> Self {
        Self {
            stack,
            level,
            package,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// ساخت رویداد از رشته‌ها؛ هر فیلد نامعتبر خطا میده
    pub fn parse(
        stack: &str,
        level: &str,
        package: &str,
        message: impl Into<String>,
    ) -> Result<Self, AuditError> {
        Ok(Self::new(stack.parse()?, level.parse()?, package.parse()?, message))
    }
}

// =====================================
// Sink Trait
// =====================================
/// مقصد رویدادهای audit
///
/// `emit` باید فورا برگرده؛ ارسال واقعی در پس‌زمینه انجام میشه
#[cfg_attr(test, mockall::automock)]
pub trait AuditLog: Send + Sync {
    fn emit(&self, entry: AuditEntry);
}

/// sink که هیچ کاری نمیکنه (وقتی audit غیرفعاله)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditLogger;

impl AuditLog for NoopAuditLogger {
    fn emit(&self, _entry: AuditEntry) {}
}

// =====================================
// Audit Handle
// =====================================
/// هندل قابل clone که به سرویس و handler‌ها تزریق میشه
#[derive(Clone)]
pub struct Audit {
    sink: Arc<dyn AuditLog>,
}

impl fmt::Debug for Audit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Audit").finish_non_exhaustive()
    }
}

impl Default for Audit {
    fn default() -> Self {
        Self::noop()
    }
}

impl Audit {
    /// ساخت هندل از یک sink
    pub fn new(sink: impl AuditLog + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// هندلی که همه چیز رو دور میریزه
    #[must_use]
    pub fn noop() -> Self {
        Self::new(NoopAuditLogger)
    }

    /// ساخت هندل بر اساس تنظیمات
    ///
    /// اگه client HTTP ساخته نشه، audit غیرفعال میشه و فقط یه warn ثبت میشه
    #[must_use]
    pub fn from_config(config: &AuditConfig) -> Self {
        if !config.enabled {
            return Self::noop();
        }

        match RemoteAuditLogger::new(&config.url, std::time::Duration::from_secs(config.timeout_secs)) {
            Ok(logger) => Self::new(logger),
            Err(e) => {
                warn!(error = %e, "Remote audit logger unavailable, audit disabled");
                Self::noop()
            }
        }
    }

    /// ارسال یک رویداد
    pub fn emit(&self, stack: Stack, level: Level, package: Package, message: impl Into<String>) {
        self.sink.emit(AuditEntry::new(stack, level, package, message));
    }

    /// ارسال از روی رشته‌ها؛ ورودی نامعتبر فقط warn محلی داره
    pub fn emit_raw(&self, stack: &str, level: &str, package: &str, message: impl Into<String>) {
        match AuditEntry::parse(stack, level, package, message) {
            Ok(entry) => self.sink.emit(entry),
            Err(e) => warn!(error = %e, "Dropping audit entry"),
        }
    }

    pub fn info(&self, package: Package, message: impl Into<String>) {
        self.emit(Stack::Backend, Level::Info, package, message);
    }

    pub fn warn(&self, package: Package, message: impl Into<String>) {
        self.emit(Stack::Backend, Level::Warn, package, message);
    }

    pub fn error(&self, package: Package, message: impl Into<String>) {
        self.emit(Stack::Backend, Level::Error, package, message);
    }
}
