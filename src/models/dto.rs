//! # Data Transfer Objects (DTOs)
//!
//! شکل JSON ورودی و خروجی API

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ClickEvent, ShortUrlRecord};
use crate::utils;

/// متن `expiryDate` برای رکوردی که انقضا نداره
pub const NEVER_EXPIRES: &str = "Never expires";

// =====================================
// Create Short URL
// =====================================
/// بدنه `POST /shorturls`
///
/// # مثال
/// ```json
/// { "url": "https://example.com/long", "validity": 10, "shortcode": "abc" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateShortUrlRequest {
    /// آدرس اصلی
    #[validate(length(max = 2048, message = "URL is too long"))]
    pub url: String,

    /// مدت اعتبار به دقیقه (اختیاری، کسری هم قبوله)
    #[serde(default)]
    pub validity: Option<f64>,

    /// کد سفارشی (اختیاری)
    #[serde(default)]
    #[validate(length(max = 64, message = "Custom shortcode is too long"))]
    pub shortcode: Option<String>,
}

impl CreateShortUrlRequest {
    /// کد سفارشی، با رشته خالی مثل «ارسال نشده» رفتار میشه
    #[must_use]
    pub fn requested_code(&self) -> Option<&str> {
        self.shortcode.as_deref().filter(|c| !c.is_empty())
    }
}

/// پاسخ 201 ساخت لینک
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortUrlCreated {
    /// لینک کوتاه کامل
    pub short_link: String,

    /// زمان انقضا به ISO-8601
    pub expiry: String,
}

// =====================================
// Statistics
// =====================================
/// پاسخ `GET /shorturls/:shortCode`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub total_clicks: usize,
    pub original_url: String,
    pub creation_date: String,

    /// تاریخ انقضا یا `"Never expires"`
    pub expiry_date: String,
    pub click_data: Vec<ClickView>,
}

/// یک کلیک در خروجی آمار
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickView {
    pub timestamp: String,
    pub referrer: String,
    pub ip: String,
}

impl From<&ClickEvent> for ClickView {
    fn from(click: &ClickEvent) -> Self {
        Self {
            timestamp: utils::to_iso8601(&click.timestamp),
            referrer: click.referrer.clone(),
            ip: click.ip.clone(),
        }
    }
}

impl From<&ShortUrlRecord> for StatsView {
    fn from(record: &ShortUrlRecord) -> Self {
        Self {
            total_clicks: record.total_clicks(),
            original_url: record.long_url.clone(),
            creation_date: utils::to_iso8601(&record.created_at),
            expiry_date: record
                .expires_at
                .as_ref()
                .map_or_else(|| NEVER_EXPIRES.to_string(), utils::to_iso8601),
            click_data: record.clicks.iter().map(ClickView::from).collect(),
        }
    }
}

// =====================================
// Health Check
// =====================================
/// پاسخ health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: bool,
}

impl HealthResponse {
    /// ساخت پاسخ بر اساس وضعیت دیتابیس
    #[must_use]
    pub fn from_database(database_ok: bool) -> Self {
        Self {
            status: if database_ok { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database_ok,
        }
    }
}
