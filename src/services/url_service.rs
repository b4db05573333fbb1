//! # سرویس لینک کوتاه
//!
//! منطق کسب‌وکار ساخت، redirect و آمار لینک‌ها
//!
//! ## مفاهیم Rust:
//! - Business Logic: قوانین برنامه اینجا پیاده‌سازی میشن
//! - Dependency Injection: store و audit از بیرون تزریق میشن
//! - Error Handling: هر خطا هم به کلاینت و هم به audit میره

use std::sync::Arc;
use chrono::Utc;
use tracing::{info, warn, instrument};

use crate::{
    audit::{Audit, Package},
    config::Config,
    database::ShortUrlStore,
    error::{AppError, Result, OptionExt},
    models::{
        ClickEvent, CreateShortUrlRequest, ShortUrlBuilder, ShortUrlCreated, StatsView,
    },
    utils,
};

// =====================================
// URL Service
// =====================================
/// سرویس مدیریت لینک‌های کوتاه
///
/// # مسئولیت‌ها:
/// - ساخت لینک کوتاه (با کد سفارشی یا تصادفی)
/// - Redirect و ثبت کلیک
/// - گزارش آمار
/// - ارسال رویدادها به audit
#[derive(Clone)]
pub struct UrlService {
    store: Arc<dyn ShortUrlStore>,
    config: Arc<Config>,
    audit: Audit,
}

impl std::fmt::Debug for UrlService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlService")
            .field("config", &self.config)
            .field("audit", &self.audit)
            .finish_non_exhaustive()
    }
}

impl UrlService {
    /// ساخت سرویس جدید
    #[must_use]
    pub fn new(store: Arc<dyn ShortUrlStore>, config: Arc<Config>, audit: Audit) -> Self {
        Self { store, config, audit }
    }

    /// ساخت لینک کوتاه جدید
    ///
    /// # Arguments
    /// * `request` - بدنه درخواست
    /// * `base_url` - آدرس پایه برای ساخت `shortLink`
    ///
    /// # Errors
    /// - `InvalidInput`: URL یا کد سفارشی نامعتبر
    /// - `Conflict`: کد سفارشی قبلا استفاده شده
    /// - `Storage`: خطای دیتابیس
    #[instrument(skip(self, request), fields(url = %request.url))]
    pub async fn create_short_url(
        &self,
        request: CreateShortUrlRequest,
        base_url: &str,
    ) -> Result<ShortUrlCreated> {
        let result = self.try_create(&request, base_url).await;

        if let Err(e) = &result {
            if e.is_server_error() {
                self.audit.error(
                    Package::Handler,
                    format!("Server error during URL creation: {e}"),
                );
            }
        }

        result
    }

    async fn try_create(
        &self,
        request: &CreateShortUrlRequest,
        base_url: &str,
    ) -> Result<ShortUrlCreated> {
        // Step 1: اعتبارسنجی
        if !utils::is_valid_url(&request.url) {
            self.audit.error(
                Package::Handler,
                format!("Invalid URL format: {}", request.url),
            );
            return Err(AppError::InvalidInput("Invalid URL format".to_string()));
        }

        // Step 2: کد سفارشی
        let requested_code = request.requested_code();
        if let Some(code) = requested_code {
            if !utils::is_valid_short_code(code) {
                self.audit.error(
                    Package::Handler,
                    format!("Invalid custom shortcode: {code}"),
                );
                return Err(AppError::InvalidInput(
                    "Invalid custom shortcode format".to_string(),
                ));
            }

            // مسیرهای ثابت router روی `/:code` اولویت دارن
            if utils::is_reserved_code(code) || self.store.exists(code).await? {
                return Err(self.code_in_use(code));
            }
        }

        // Step 3: ساخت رکورد با Builder Pattern
        let mut builder = ShortUrlBuilder::new(&request.url)
            .validity_minutes(request.validity)
            .default_validity_minutes(self.config.default_validity_minutes)
            .created_at(Utc::now());

        builder = match requested_code {
            Some(code) => builder.short_code(code),
            None => builder.short_code(self.generate_unique_code().await?),
        };

        let new_url = builder.build()?;

        // Step 4: ذخیره؛ اگه یه درخواست همزمان زودتر همین کد رو گرفته باشه Conflict میاد
        let record = match self.store.insert(&new_url).await {
            Ok(record) => record,
            Err(AppError::Conflict(_)) => return Err(self.code_in_use(&new_url.short_code)),
            Err(e) => return Err(e),
        };

        info!(short_code = %record.short_code, "Created new short URL");
        self.audit.info(
            Package::Handler,
            format!("Short URL created: {} for {}", record.short_code, record.long_url),
        );

        let expiry = record
            .expires_at
            .as_ref()
            .map(utils::to_iso8601)
            .unwrap_or_default();

        Ok(ShortUrlCreated {
            short_link: utils::short_link(base_url, &record.short_code),
            expiry,
        })
    }

    fn code_in_use(&self, code: &str) -> AppError {
        self.audit.error(
            Package::Handler,
            format!("Custom shortcode already in use: {code}"),
        );
        AppError::Conflict("Custom shortcode already in use".to_string())
    }

    /// گرفتن URL اصلی و ثبت کلیک
    ///
    /// کلیک قبل از برگشت ذخیره میشه، پس آمار بلافاصله بعد از redirect دیده میشه.
    /// لینک منقضی هیچ کلیکی ثبت نمیکنه.
    ///
    /// # Errors
    /// - `NotFound`: کد وجود نداره
    /// - `Expired`: کد منقضی شده
    #[instrument(skip(self, referrer))]
    pub async fn resolve_and_record_click(
        &self,
        short_code: &str,
        referrer: Option<String>,
        ip: &str,
    ) -> Result<String> {
        let result = self.try_resolve(short_code, referrer, ip).await;

        if let Err(e) = &result {
            if e.is_server_error() {
                self.audit.error(
                    Package::Handler,
                    format!("Server error during URL redirection: {e}"),
                );
            }
        }

        result
    }

    async fn try_resolve(
        &self,
        short_code: &str,
        referrer: Option<String>,
        ip: &str,
    ) -> Result<String> {
        let Some(record) = self.store.find(short_code).await? else {
            self.audit.warn(
                Package::Handler,
                format!("Shortcode not found: {short_code}"),
            );
            return Err(AppError::short_url_not_found());
        };

        // بررسی انقضا
        if record.is_expired() {
            warn!(short_code = %short_code, "Attempted to access expired URL");
            self.audit.warn(
                Package::Handler,
                format!("Expired shortcode accessed: {short_code}"),
            );
            return Err(AppError::short_url_expired());
        }

        self.store
            .append_click(short_code, &ClickEvent::new(referrer, ip))
            .await?;

        self.audit.info(
            Package::Handler,
            format!("Redirecting {short_code} to {}", record.long_url),
        );

        Ok(record.long_url)
    }

    /// آمار یک لینک
    ///
    /// لینک منقضی هم آمار داره؛ انقضا اینجا چک نمیشه
    ///
    /// # Errors
    /// `NotFound` اگه کد وجود نداشته باشه
    #[instrument(skip(self))]
    pub async fn get_statistics(&self, short_code: &str) -> Result<StatsView> {
        let result = self.try_statistics(short_code).await;

        match &result {
            Ok(_) => self.audit.info(
                Package::Handler,
                format!("Retrieved statistics for shortcode: {short_code}"),
            ),
            Err(AppError::NotFound(_)) => self.audit.warn(
                Package::Handler,
                format!("Statistics requested for non-existent shortcode: {short_code}"),
            ),
            Err(e) if e.is_server_error() => self.audit.error(
                Package::Handler,
                format!("Server error during statistics retrieval: {e}"),
            ),
            Err(_) => {}
        }

        result
    }

    async fn try_statistics(&self, short_code: &str) -> Result<StatsView> {
        let mut record = self
            .store
            .find(short_code)
            .await?
            .ok_or_not_found("No short URL found")?;

        record.clicks = self.store.clicks(short_code).await?;

        Ok(StatsView::from(&record))
    }

    /// آیا store در دسترسه؟
    pub async fn is_store_healthy(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Store health check failed");
                false
            }
        }
    }

    /// تولید کد یکتا
    ///
    /// # مفاهیم:
    /// - Loop با retry
    /// - تضمین یکتا بودن (در کنار کلید یکتای دیتابیس)
    async fn generate_unique_code(&self) -> Result<String> {
        // حداکثر 10 بار تلاش
        for _ in 0..10 {
            let code = utils::generate_short_code();

            if utils::is_reserved_code(&code) {
                continue;
            }

            if !self.store.exists(&code).await? {
                return Ok(code);
            }
        }

        Err(AppError::Internal(
            "Failed to generate unique short code".to_string()
        ))
    }
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audit::{AuditEntry, Level, MockAuditLog},
        config::ConfigBuilder,
        database::{Database, SqliteShortUrlStore},
        models::{NewShortUrl, ShortUrlRecord},
    };
    use async_trait::async_trait;
    use chrono::Duration;
    use mockall::predicate::function;

    const BASE: &str = "http://localhost:5000";

    /// storeی که همه عملیات‌هاش شکست میخوره
    struct BrokenStore;

    #[async_trait]
    impl ShortUrlStore for BrokenStore {
        async fn find(&self, _: &str) -> Result<Option<ShortUrlRecord>> {
            Err(AppError::Storage(sqlx::Error::PoolTimedOut))
        }
        async fn exists(&self, _: &str) -> Result<bool> {
            Err(AppError::Storage(sqlx::Error::PoolTimedOut))
        }
        async fn insert(&self, _: &NewShortUrl) -> Result<ShortUrlRecord> {
            Err(AppError::Storage(sqlx::Error::PoolTimedOut))
        }
        async fn append_click(&self, _: &str, _: &ClickEvent) -> Result<()> {
            Err(AppError::Storage(sqlx::Error::PoolTimedOut))
        }
        async fn clicks(&self, _: &str) -> Result<Vec<ClickEvent>> {
            Err(AppError::Storage(sqlx::Error::PoolTimedOut))
        }
        async fn ping(&self) -> Result<()> {
            Err(AppError::Storage(sqlx::Error::PoolTimedOut))
        }
    }

    fn config() -> Arc<Config> {
        Arc::new(ConfigBuilder::new().database_url("sqlite::memory:").build())
    }

    async fn service_with(audit: Audit) -> (UrlService, Arc<SqliteShortUrlStore>) {
        let store = Arc::new(SqliteShortUrlStore::new(Database::in_memory().await.unwrap()));
        let service = UrlService::new(store.clone(), config(), audit);
        (service, store)
    }

    fn request(url: &str, validity: Option<f64>, shortcode: Option<&str>) -> CreateShortUrlRequest {
        CreateShortUrlRequest {
            url: url.to_string(),
            validity,
            shortcode: shortcode.map(str::to_string),
        }
    }

    fn expect_message(sink: &mut MockAuditLog, level: Level, message: &'static str) {
        sink.expect_emit()
            .with(function(move |e: &AuditEntry| e.level == level && e.message == message))
            .times(1)
            .return_const(());
    }

    #[tokio::test]
    async fn test_create_with_custom_code() {
        let (service, store) = service_with(Audit::noop()).await;

        let created = service
            .create_short_url(request("http://example.com/page", Some(10.0), Some("abc")), BASE)
            .await
            .unwrap();

        assert_eq!(created.short_link, "http://localhost:5000/abc");
        let record = store.find("abc").await.unwrap().unwrap();
        assert_eq!(created.expiry, utils::to_iso8601(&record.expires_at.unwrap()));
        assert_eq!(
            record.expires_at.unwrap() - record.created_at,
            Duration::minutes(10)
        );
    }

    #[tokio::test]
    async fn test_create_without_validity_uses_default() {
        let (service, store) = service_with(Audit::noop()).await;

        let created = service
            .create_short_url(request("https://example.com", None, None), BASE)
            .await
            .unwrap();

        let code = created.short_link.rsplit('/').next().unwrap().to_string();
        assert!(utils::is_valid_short_code(&code));

        let record = store.find(&code).await.unwrap().unwrap();
        assert_eq!(
            record.expires_at.unwrap() - record.created_at,
            Duration::minutes(30)
        );
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_and_audited() {
        let mut sink = MockAuditLog::new();
        expect_message(&mut sink, Level::Error, "Invalid URL format: not a url");
        let (service, _) = service_with(Audit::new(sink)).await;

        let err = service
            .create_short_url(request("not a url", None, None), BASE)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(ref m) if m == "Invalid URL format"));
    }

    #[tokio::test]
    async fn test_duplicate_custom_code_is_conflict() {
        let (service, store) = service_with(Audit::noop()).await;
        service
            .create_short_url(request("http://a.example.com", None, Some("dup")), BASE)
            .await
            .unwrap();

        let err = service
            .create_short_url(request("http://b.example.com", None, Some("dup")), BASE)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(
            store.find("dup").await.unwrap().unwrap().long_url,
            "http://a.example.com"
        );
    }

    #[tokio::test]
    async fn test_create_with_fractional_validity() {
        let (service, store) = service_with(Audit::noop()).await;

        service
            .create_short_url(request("http://example.com", Some(1.5), Some("half")), BASE)
            .await
            .unwrap();

        let record = store.find("half").await.unwrap().unwrap();
        assert_eq!(
            record.expires_at.unwrap() - record.created_at,
            Duration::seconds(90)
        );
    }

    #[tokio::test]
    async fn test_route_names_cannot_be_custom_codes() {
        let mut sink = MockAuditLog::new();
        expect_message(&mut sink, Level::Error, "Custom shortcode already in use: health");
        expect_message(&mut sink, Level::Error, "Custom shortcode already in use: shorturls");
        let (service, store) = service_with(Audit::new(sink)).await;

        for code in ["health", "shorturls"] {
            let err = service
                .create_short_url(request("http://example.com", None, Some(code)), BASE)
                .await
                .unwrap_err();

            assert!(matches!(err, AppError::Conflict(ref m) if m == "Custom shortcode already in use"));
            assert!(store.find(code).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_malformed_custom_code_is_rejected() {
        let (service, _) = service_with(Audit::noop()).await;

        let err = service
            .create_short_url(request("http://example.com", None, Some("a b/c")), BASE)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_resolve_records_click() {
        let (service, store) = service_with(Audit::noop()).await;
        service
            .create_short_url(request("http://example.com/x", None, Some("go")), BASE)
            .await
            .unwrap();

        let long_url = service
            .resolve_and_record_click("go", None, "10.1.1.1")
            .await
            .unwrap();
        assert_eq!(long_url, "http://example.com/x");

        let clicks = store.clicks("go").await.unwrap();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].referrer, "direct");
        assert_eq!(clicks[0].ip, "10.1.1.1");
    }

    #[tokio::test]
    async fn test_resolve_expired_records_nothing() {
        let mut sink = MockAuditLog::new();
        expect_message(&mut sink, Level::Warn, "Expired shortcode accessed: old");
        expect_message(&mut sink, Level::Info, "Retrieved statistics for shortcode: old");
        let (service, store) = service_with(Audit::new(sink)).await;

        let past = Utc::now() - Duration::hours(2);
        let new_url = ShortUrlBuilder::new("http://example.com")
            .short_code("old")
            .validity_minutes(Some(1.0))
            .created_at(past)
            .build()
            .unwrap();
        store.insert(&new_url).await.unwrap();

        let err = service
            .resolve_and_record_click("old", None, "10.0.0.1")
            .await
            .unwrap_err();

        assert!(err.is_expired());
        assert!(store.clicks("old").await.unwrap().is_empty());

        // آمار لینک منقضی هنوز در دسترسه
        let stats = service.get_statistics("old").await;
        assert!(stats.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_code_is_not_found() {
        let mut sink = MockAuditLog::new();
        expect_message(&mut sink, Level::Warn, "Shortcode not found: nope");
        expect_message(
            &mut sink,
            Level::Warn,
            "Statistics requested for non-existent shortcode: nope",
        );
        let (service, _) = service_with(Audit::new(sink)).await;

        let err = service.resolve_and_record_click("nope", None, "ip").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service.get_statistics("nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_statistics_reflect_clicks_in_order() {
        let (service, _) = service_with(Audit::noop()).await;
        service
            .create_short_url(request("http://example.com", None, Some("st")), BASE)
            .await
            .unwrap();

        service
            .resolve_and_record_click("st", Some("https://a.example".to_string()), "1.1.1.1")
            .await
            .unwrap();
        service
            .resolve_and_record_click("st", None, "2.2.2.2")
            .await
            .unwrap();

        let stats = service.get_statistics("st").await.unwrap();
        assert_eq!(stats.total_clicks, 2);
        assert_eq!(stats.original_url, "http://example.com");
        assert_eq!(stats.click_data[0].referrer, "https://a.example");
        assert_eq!(stats.click_data[1].referrer, "direct");
        assert_eq!(stats.click_data[1].ip, "2.2.2.2");
    }

    #[tokio::test]
    async fn test_storage_failure_is_server_error() {
        let mut sink = MockAuditLog::new();
        sink.expect_emit()
            .with(function(|e: &AuditEntry| {
                e.level == Level::Error && e.message.starts_with("Server error during")
            }))
            .times(3)
            .return_const(());

        let service = UrlService::new(Arc::new(BrokenStore), config(), Audit::new(sink));

        let err = service
            .create_short_url(request("http://example.com", None, None), BASE)
            .await
            .unwrap_err();
        assert!(err.is_server_error());

        let err = service.resolve_and_record_click("x", None, "ip").await.unwrap_err();
        assert!(err.is_server_error());

        let err = service.get_statistics("x").await.unwrap_err();
        assert!(err.is_server_error());

        assert!(!service.is_store_healthy().await);
    }
}
