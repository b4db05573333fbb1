//! # مدل لینک کوتاه
//!
//! Entity‌های `ShortUrlRecord` و `ClickEvent`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    error::{AppError, Result},
    utils,
};

/// مقدار referrer وقتی header در درخواست نیست
pub const DIRECT_REFERRER: &str = "direct";

// =====================================
// Short URL Entity
// =====================================
/// رکورد اصلی یک لینک کوتاه
///
/// # مفاهیم:
/// - `#[derive(FromRow)]`: تبدیل خودکار از ردیف جدول `short_urls`
/// - `#[sqlx(skip)]`: فیلد `clicks` از جدول جدا پر میشه
///
/// `created_at` و `expires_at` بعد از ساخت هیچوقت تغییر نمیکنن؛
/// تنها تغییر ممکن اضافه شدن به `clicks` هست.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShortUrlRecord {
    /// کد کوتاه یکتا (کلید اصلی)
    pub short_code: String,

    /// آدرس مقصد
    pub long_url: String,

    /// تاریخ ایجاد
    pub created_at: DateTime<Utc>,

    /// تاریخ انقضا؛ `None` یعنی هیچوقت منقضی نمیشه
    pub expires_at: Option<DateTime<Utc>>,

    /// کلیک‌ها به ترتیب ثبت
    #[sqlx(skip)]
    #[serde(default)]
    pub clicks: Vec<ClickEvent>,
}

impl ShortUrlRecord {
    /// آیا در لحظه `now` منقضی شده؟
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp < now)
    }

    /// آیا الان منقضی شده؟
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// تعداد کل کلیک‌ها
    #[must_use]
    pub fn total_clicks(&self) -> usize {
        self.clicks.len()
    }
}

// =====================================
// Click Event
// =====================================
/// یک redirect ثبت شده
///
/// فقط داخل `ShortUrlRecord` معنی داره و شناسه مستقل نداره
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ClickEvent {
    /// زمان redirect
    pub timestamp: DateTime<Utc>,

    /// referrer درخواست یا `"direct"`
    pub referrer: String,

    /// آدرس شبکه کلاینت
    pub ip: String,
}

impl ClickEvent {
    /// ساخت کلیک جدید با زمان فعلی
    #[must_use]
    pub fn new(referrer: Option<String>, ip: impl Into<String>) -> Self {
        Self::at(Utc::now(), referrer, ip)
    }

    /// ساخت کلیک در زمان مشخص
    #[must_use]
    pub fn at(timestamp: DateTime<Utc>, referrer: Option<String>, ip: impl Into<String>) -> Self {
        Self {
            timestamp,
            referrer: referrer
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DIRECT_REFERRER.to_string()),
            ip: ip.into(),
        }
    }
}

// =====================================
// New Short URL (insert DTO)
// =====================================
/// داده برای ذخیره لینک جدید
///
/// این DTO به `ShortUrlStore::insert` داده میشه
#[derive(Debug, Clone)]
pub struct NewShortUrl {
    pub short_code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewShortUrl {
    /// تبدیل به رکورد کامل با لیست کلیک خالی
    #[must_use]
    pub fn into_record(self) -> ShortUrlRecord {
        ShortUrlRecord {
            short_code: self.short_code,
            long_url: self.long_url,
            created_at: self.created_at,
            expires_at: self.expires_at,
            clicks: Vec::new(),
        }
    }
}

// =====================================
// Builder
// =====================================
/// Builder برای ساخت `NewShortUrl`
///
/// # مثال
/// ```rust
/// use link_shortener::models::ShortUrlBuilder;
///
/// let new_url = ShortUrlBuilder::new("https://example.com")
///     .short_code("mylink")
///     .validity_minutes(Some(10.0))
///     .build()
///     .unwrap();
/// assert_eq!(new_url.short_code, "mylink");
/// assert!(new_url.expires_at.is_some());
/// ```
#[derive(Debug)]
pub struct ShortUrlBuilder {
    long_url: String,
    short_code: Option<String>,
    validity_minutes: Option<f64>,
    default_validity_minutes: i64,
    now: DateTime<Utc>,
}

impl ShortUrlBuilder {
    /// شروع builder با URL مقصد
    #[must_use]
    pub fn new(long_url: impl Into<String>) -> Self {
        Self {
            long_url: long_url.into(),
            short_code: None,
            validity_minutes: None,
            default_validity_minutes: crate::config::DEFAULT_VALIDITY_MINUTES,
            now: Utc::now(),
        }
    }

    /// تنظیم کد کوتاه
    #[must_use]
    pub fn short_code(mut self, code: impl Into<String>) -> Self {
        self.short_code = Some(code.into());
        self
    }

    /// مدت اعتبار درخواستی (دقیقه)
    #[must_use]
    pub fn validity_minutes(mut self, minutes: Option<f64>) -> Self {
        self.validity_minutes = minutes;
        self
    }

    /// مدت اعتبار پیش‌فرض
    #[must_use]
    pub fn default_validity_minutes(mut self, minutes: i64) -> Self {
        self.default_validity_minutes = minutes;
        self
    }

    /// زمان ساخت (برای تست)
    #[must_use]
    pub fn created_at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// ساخت `NewShortUrl`
    ///
    /// انقضا همیشه تنظیم میشه؛ بدون validity از مقدار پیش‌فرض استفاده میشه.
    ///
    /// # Errors
    /// `InvalidInput` اگه validity از بازه زمانی قابل نمایش بیرون بزنه
    pub fn build(self) -> Result<NewShortUrl> {
        let expires_at = utils::compute_expiry(
            self.now,
            self.validity_minutes,
            self.default_validity_minutes,
        )
        .ok_or_else(|| AppError::InvalidInput("Validity is out of range".to_string()))?;

        let short_code = self.short_code.unwrap_or_else(utils::generate_short_code);

        Ok(NewShortUrl {
            short_code,
            long_url: self.long_url,
            created_at: self.now,
            expires_at: Some(expires_at),
        })
    }
}
