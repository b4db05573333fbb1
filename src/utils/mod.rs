//! # ماژول توابع کمکی (Utilities)
//!
//! تولید کد کوتاه، اعتبارسنجی URL و کد، و محاسبات زمانی.
//!
//! ## مفاهیم Rust:
//! - **once_cell::Lazy**: مقداردهی اولیه تنبل برای Regex
//! - **Iterator**: ساخت String از iterator
//! - **checked arithmetic**: جلوگیری از overflow در محاسبه زمان

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

// =====================================
// Constants
// =====================================
/// کاراکترهای مجاز برای short code تولیدی (URL-safe)
pub const SHORT_CODE_CHARS: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_-";

/// طول پیش‌فرض short code
pub const DEFAULT_SHORT_CODE_LENGTH: usize = 9;

/// حداکثر طول URL اصلی
pub const MAX_URL_LENGTH: usize = 2048;

/// حداکثر طول short code سفارشی
pub const MAX_CUSTOM_CODE_LENGTH: usize = 64;

/// مسیرهای ثابت router که روی `/:code` اولویت دارن
///
/// کدی با این نام هیچوقت به redirect نمیرسه
pub const RESERVED_CODES: &[&str] = &["health", "shorturls"];

// =====================================
// Lazy Statics (Regex patterns)
// =====================================
/// الگوی معتبر برای short code: یک path segment امن
pub static VALID_SHORT_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid regex pattern")
});

/// الگوی URL معتبر
///
/// scheme یکی از http/https/ftp، بعدش authority و path بدون فاصله
pub static VALID_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(https?|ftp)://[^\s/$.?#].[^\s]*$").expect("Invalid regex pattern")
});

// =====================================
// Short Code Generation
// =====================================
/// تولید short code تصادفی
///
/// # مثال
/// ```rust
/// use link_shortener::utils::{generate_short_code, DEFAULT_SHORT_CODE_LENGTH};
///
/// let code = generate_short_code();
/// assert_eq!(code.len(), DEFAULT_SHORT_CODE_LENGTH);
/// ```
#[must_use]
pub fn generate_short_code() -> String {
    generate_short_code_with_length(DEFAULT_SHORT_CODE_LENGTH)
}

/// تولید short code با طول مشخص
#[must_use]
pub fn generate_short_code_with_length(length: usize) -> String {
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..SHORT_CODE_CHARS.len());
            SHORT_CODE_CHARS[idx] as char
        })
        .collect()
}

// =====================================
// Validation Functions
// =====================================
/// اعتبارسنجی short code سفارشی
///
/// # مثال
/// ```rust
/// use link_shortener::utils::is_valid_short_code;
///
/// assert!(is_valid_short_code("abc"));
/// assert!(!is_valid_short_code("abc/123"));
/// ```
#[must_use]
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty() && code.len() <= MAX_CUSTOM_CODE_LENGTH && VALID_SHORT_CODE.is_match(code)
}

/// آیا این کد با یکی از مسیرهای ثابت router یکیه؟
///
/// مسیرهای axum به حروف بزرگ و کوچک حساسن، پس `Health` آزاده.
#[must_use]
pub fn is_reserved_code(code: &str) -> bool {
    RESERVED_CODES.contains(&code)
}

/// اعتبارسنجی URL اصلی
///
/// # مثال
/// ```rust
/// use link_shortener::utils::is_valid_url;
///
/// assert!(is_valid_url("http://example.com/page"));
/// assert!(!is_valid_url("not-a-url"));
/// ```
#[must_use]
pub fn is_valid_url(url_str: &str) -> bool {
    url_str.len() <= MAX_URL_LENGTH && VALID_URL.is_match(url_str)
}

// =====================================
// Time Utilities
// =====================================
/// محاسبه تاریخ انقضا
///
/// `validity_minutes` مثبت → now + validity، در غیر این صورت now + پیش‌فرض.
/// validity کسری هم قبوله و تا میلی‌ثانیه گرد میشه (`1.5` → ۹۰ ثانیه).
/// اگه نتیجه از بازه DateTime بیرون بزنه `None` برمیگرده.
#[must_use]
pub fn compute_expiry(
    now: DateTime<Utc>,
    validity_minutes: Option<f64>,
    default_minutes: i64,
) -> Option<DateTime<Utc>> {
    // NaN از این فیلتر رد نمیشه
    let duration = match validity_minutes.filter(|m| *m > 0.0) {
        Some(minutes) => {
            let millis = (minutes * 60_000.0).round();
            if !millis.is_finite() || millis >= i64::MAX as f64 {
                return None;
            }
            Duration::try_milliseconds(millis as i64)?
        }
        None => Duration::try_minutes(default_minutes)?,
    };

    now.checked_add_signed(duration)
}

/// فرمت ISO-8601 با دقت میلی‌ثانیه (مثلا `2024-01-01T00:00:00.000Z`)
#[must_use]
pub fn to_iso8601(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// ساخت لینک کوتاه کامل
#[must_use]
pub fn short_link(base_url: &str, short_code: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), short_code)
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_short_code() {
        let code = generate_short_code();
        assert_eq!(code.len(), DEFAULT_SHORT_CODE_LENGTH);
        assert!(is_valid_short_code(&code));
    }

    #[test]
    fn test_valid_short_code() {
        assert!(is_valid_short_code("abc"));
        assert!(is_valid_short_code("ABC-xyz_123"));
        assert!(!is_valid_short_code(""));
        assert!(!is_valid_short_code("abc 123"));
        assert!(!is_valid_short_code("abc/123"));
        assert!(!is_valid_short_code(&"a".repeat(MAX_CUSTOM_CODE_LENGTH + 1)));
    }

    #[test]
    fn test_reserved_codes() {
        assert!(is_reserved_code("health"));
        assert!(is_reserved_code("shorturls"));
        assert!(!is_reserved_code("Health"));
        assert!(!is_reserved_code("healthy"));
        assert!(!is_reserved_code("abc"));
    }

    #[test]
    fn test_valid_url() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://example.com/page?q=1"));
        assert!(is_valid_url("ftp://files.example.com/a.txt"));
        assert!(is_valid_url("HTTPS://EXAMPLE.COM"));
        assert!(!is_valid_url("not-a-url"));
        assert!(!is_valid_url("http://exa mple.com"));
        assert!(!is_valid_url("http://"));
        assert!(!is_valid_url("mailto:someone@example.com"));
        assert!(!is_valid_url(&format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH))));
    }

    #[test]
    fn test_compute_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        assert_eq!(
            compute_expiry(now, Some(10.0), 30),
            Some(now + Duration::minutes(10))
        );
        assert_eq!(compute_expiry(now, None, 30), Some(now + Duration::minutes(30)));
        assert_eq!(compute_expiry(now, Some(0.0), 30), Some(now + Duration::minutes(30)));
        assert_eq!(compute_expiry(now, Some(-5.0), 30), Some(now + Duration::minutes(30)));
        assert_eq!(compute_expiry(now, Some(f64::NAN), 30), Some(now + Duration::minutes(30)));
        assert_eq!(compute_expiry(now, Some(f64::MAX), 30), None);
        assert_eq!(compute_expiry(now, Some(f64::INFINITY), 30), None);
    }

    #[test]
    fn test_compute_expiry_fractional_minutes() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        assert_eq!(compute_expiry(now, Some(1.5), 30), Some(now + Duration::seconds(90)));
        assert_eq!(
            compute_expiry(now, Some(0.25), 30),
            Some(now + Duration::seconds(15))
        );
    }

    #[test]
    fn test_to_iso8601() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(to_iso8601(&ts), "2024-03-05T07:08:09.000Z");
    }

    #[test]
    fn test_short_link() {
        assert_eq!(short_link("http://localhost:5000/", "abc"), "http://localhost:5000/abc");
    }
}
