//! # ماژول سرویس‌ها (Business Logic Layer)
//!
//! این ماژول منطق کسب‌وکار برنامه رو پیاده‌سازی میکنه.
//!
//! ## لایه‌بندی معماری
//!
//! ```text
//! ┌─────────────────┐
//! │    API Layer    │  <-- HTTP handlers (axum)
//! ├─────────────────┤
//! │  Service Layer  │  <-- Business logic (اینجا!)  ──►  Audit (fire-and-forget)
//! ├─────────────────┤
//! │ Repository Layer│  <-- ShortUrlStore
//! ├─────────────────┤
//! │    Database     │  <-- SQLite
//! └─────────────────┘
//! ```
//!
//! ## مفاهیم Rust:
//! - **Dependency Injection**: تزریق وابستگی‌ها
//! - **Arc<T>**: اشتراک امن بین threads
//! - **async/await**: عملیات غیرهمزمان

mod url_service;

pub use url_service::*;

use std::sync::Arc;
use crate::{
    audit::Audit,
    config::Config,
    database::{Database, ShortUrlStore, SqliteShortUrlStore},
};

// =====================================
// Application State
// =====================================
/// وضعیت برنامه که بین همه handlers اشتراک‌گذاری میشه
///
/// # مفاهیم:
/// - `Arc<T>`: Reference counting برای thread-safe sharing
/// - `Clone`: کپی کردن (فقط Arc clone میشه، نه داده)
/// - این state در axum با `with_state` تزریق میشه
#[derive(Clone, Debug)]
pub struct AppState {
    /// تنظیمات برنامه
    pub config: Arc<Config>,

    /// سرویس لینک
    pub url_service: Arc<UrlService>,

    /// هندل audit (برای handler‌هایی که خارج از سرویس رویداد ثبت میکنن)
    pub audit: Audit,
}

impl AppState {
    /// ساخت AppState روی دیتابیس SQLite
    #[must_use]
    pub fn new(db: Database, config: Config, audit: Audit) -> Self {
        Self::with_store(Arc::new(SqliteShortUrlStore::new(db)), config, audit)
    }

    /// ساخت AppState با یک store دلخواه
    #[must_use]
    pub fn with_store(store: Arc<dyn ShortUrlStore>, config: Config, audit: Audit) -> Self {
        let config = Arc::new(config);

        let url_service = Arc::new(UrlService::new(
            store,
            config.clone(),
            audit.clone(),
        ));

        Self {
            config,
            url_service,
            audit,
        }
    }
}
