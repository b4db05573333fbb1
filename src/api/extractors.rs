//! # Custom Extractors
//!
//! Extractor‌های سفارشی برای استخراج داده از request
//!
//! ## مفاهیم Rust + Axum:
//! - **Extractors**: نوع‌هایی که از request داده استخراج میکنن
//! - **FromRequestParts**: trait برای extractor‌هایی که body لازم ندارن
//! - **FromRequest**: برای extractor‌هایی که body رو مصرف میکنن
//! - **Rejection**: نوع خطا برای extractors
//!
//! ## چطور کار میکنه؟
//! وقتی یه extractor به عنوان پارامتر handler تعریف میشه،
//! axum قبل از اجرای handler، extractor رو اجرا میکنه.

use std::{convert::Infallible, net::SocketAddr};

use axum::{
    async_trait,
    body::Body,
    extract::{rejection::JsonRejection, ConnectInfo, FromRequest, FromRequestParts},
    http::{header, request::Parts, HeaderMap, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{error::AppError, services::AppState};

/// مقدار IP وقتی هیچ منبعی در دسترس نیست
pub const UNKNOWN_IP: &str = "unknown";

/// اولین مقدار غیرخالی یک header
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

// =====================================
// Client IP Extractor
// =====================================
/// استخراج IP کلاینت
///
/// # ترتیب منابع:
/// 1. با `TRUST_PROXY`: اولین آدرس `X-Forwarded-For`، بعد `X-Real-IP`
/// 2. آدرس socket (`ConnectInfo`)
/// 3. `"unknown"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    /// IP از header‌های proxy
    fn from_proxy_headers(headers: &HeaderMap) -> Option<String> {
        header_value(headers, "X-Forwarded-For")
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| header_value(headers, "X-Real-IP"))
            .map(ToString::to_string)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let proxied = if state.config.trust_proxy {
            Self::from_proxy_headers(&parts.headers)
        } else {
            None
        };

        let ip = proxied
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| UNKNOWN_IP.to_string());

        Ok(ClientIp(ip))
    }
}

// =====================================
// Referrer Extractor
// =====================================
/// header `Referer` (یا `Referrer`)؛ نبودنش یعنی ورود مستقیم
#[derive(Debug, Clone, Default)]
pub struct Referrer(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Referrer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let referrer = header_value(&parts.headers, header::REFERER.as_str())
            .or_else(|| header_value(&parts.headers, "Referrer"))
            .map(ToString::to_string);

        Ok(Referrer(referrer))
    }
}

// =====================================
// Base URL Extractor
// =====================================
/// آدرس پایه برای ساخت `shortLink`
///
/// `BASE_URL` اگه تنظیم شده باشه، وگرنه `http://{Host}`، وگرنه `http://localhost:{port}`
#[derive(Debug, Clone)]
pub struct RequestBaseUrl(pub String);

#[async_trait]
impl FromRequestParts<AppState> for RequestBaseUrl {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(base) = &state.config.base_url {
            return Ok(RequestBaseUrl(base.clone()));
        }

        let base = header_value(&parts.headers, header::HOST.as_str())
            .map(|host| format!("http://{host}"))
            .unwrap_or_else(|| format!("http://localhost:{}", state.config.port));

        Ok(RequestBaseUrl(base))
    }
}

// =====================================
// JSON with Validation
// =====================================
/// استخراج JSON با اعتبارسنجی خودکار
///
/// بدنه خراب یا نامعتبر → 400
///
/// # استفاده:
/// ```rust,ignore
/// async fn handler(ValidatedJson(data): ValidatedJson<CreateShortUrlRequest>) -> ... {
///     // data حتما valid هست
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        // اول JSON رو parse کن
        let Json(data): Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| {
                AppError::InvalidInput(format!("Invalid JSON: {}", e.body_text()))
            })?;

        // بعد validate کن
        data.validate()?;

        Ok(ValidatedJson(data))
    }
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{audit::Audit, config::ConfigBuilder, database::Database};
    use axum::http::HeaderValue;

    async fn state(trust_proxy: bool) -> AppState {
        let config = ConfigBuilder::new()
            .database_url("sqlite::memory:")
            .trust_proxy(trust_proxy)
            .build();
        AppState::new(Database::in_memory().await.unwrap(), config, Audit::noop())
    }

    fn parts(headers: &[(&'static str, &'static str)], addr: Option<&str>) -> Parts {
        let mut request = Request::builder().uri("/abc");
        for (name, value) in headers {
            request = request.header(*name, HeaderValue::from_static(*value));
        }
        let mut request = request.body(()).unwrap();
        if let Some(addr) = addr {
            request
                .extensions_mut()
                .insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
        }
        request.into_parts().0
    }

    #[tokio::test]
    async fn test_client_ip_prefers_socket_without_trust_proxy() {
        let state = state(false).await;
        let mut parts = parts(&[("X-Forwarded-For", "1.2.3.4")], Some("10.0.0.9:4000"));

        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(ip, "10.0.0.9");
    }

    #[tokio::test]
    async fn test_client_ip_uses_forwarded_for_with_trust_proxy() {
        let state = state(true).await;
        let mut parts = parts(
            &[("X-Forwarded-For", "1.2.3.4, 5.6.7.8"), ("X-Real-IP", "9.9.9.9")],
            Some("10.0.0.9:4000"),
        );

        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(ip, "1.2.3.4");
    }

    #[tokio::test]
    async fn test_client_ip_unknown_without_sources() {
        let state = state(true).await;
        let mut parts = parts(&[], None);

        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(ip, UNKNOWN_IP);
    }

    #[tokio::test]
    async fn test_referrer_header_variants() {
        let mut with_referer = parts(&[("Referer", "https://a.example")], None);
        let Referrer(r) = Referrer::from_request_parts(&mut with_referer, &()).await.unwrap();
        assert_eq!(r.as_deref(), Some("https://a.example"));

        let mut with_referrer = parts(&[("Referrer", "https://b.example")], None);
        let Referrer(r) = Referrer::from_request_parts(&mut with_referrer, &()).await.unwrap();
        assert_eq!(r.as_deref(), Some("https://b.example"));

        let mut without = parts(&[], None);
        let Referrer(r) = Referrer::from_request_parts(&mut without, &()).await.unwrap();
        assert_eq!(r, None);
    }

    #[tokio::test]
    async fn test_base_url_from_host_header() {
        let state = state(false).await;
        let mut parts = parts(&[("Host", "sho.rt:8080")], None);

        let RequestBaseUrl(base) = RequestBaseUrl::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(base, "http://sho.rt:8080");
    }
}
