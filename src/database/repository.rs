//! # Repository Pattern
//!
//! لایه انتزاعی بین منطق سرویس و دیتابیس.
//! - سرویس نمیدونه داده کجا ذخیره میشه
//! - تست با یه store دیگه (مثلا store خراب) راحت میشه
//!
//! ## مفاهیم Rust:
//! - **async_trait**: امکان async در traits
//! - **Trait Objects**: `Arc<dyn ShortUrlStore>`
//! - **Send + Sync**: امکان اشتراک بین threads

use async_trait::async_trait;

use super::Database;
use crate::{
    error::{AppError, Result},
    models::{ClickEvent, NewShortUrl, ShortUrlRecord},
};

// =====================================
// Store Trait
// =====================================
/// عملیات ذخیره‌سازی که سرویس لینک بهشون نیاز داره
///
/// همه عملیات‌ها با `short_code` کلید میخورن
#[async_trait]
pub trait ShortUrlStore: Send + Sync {
    /// پیدا کردن رکورد (بدون کلیک‌ها)
    async fn find(&self, short_code: &str) -> Result<Option<ShortUrlRecord>>;

    /// چک کردن وجود کد
    async fn exists(&self, short_code: &str) -> Result<bool>;

    /// ذخیره رکورد جدید
    ///
    /// # Errors
    /// `Conflict` اگه کد قبلا ثبت شده باشه
    async fn insert(&self, new_url: &NewShortUrl) -> Result<ShortUrlRecord>;

    /// اضافه کردن یک کلیک به انتهای لیست
    async fn append_click(&self, short_code: &str, click: &ClickEvent) -> Result<()>;

    /// کلیک‌های یک کد به ترتیب ثبت
    async fn clicks(&self, short_code: &str) -> Result<Vec<ClickEvent>>;

    /// بررسی در دسترس بودن store
    async fn ping(&self) -> Result<()>;
}

// =====================================
// SQLite Store
// =====================================
/// پیاده‌سازی `ShortUrlStore` روی SQLite
#[derive(Debug, Clone)]
pub struct SqliteShortUrlStore {
    db: Database,
}

impl SqliteShortUrlStore {
    /// ساخت store جدید
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// ردیف تکراری در کلید یکتا → Conflict
fn map_insert_error(err: sqlx::Error, short_code: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(format!("Custom shortcode already in use: {short_code}"))
        }
        _ => AppError::Storage(err),
    }
}

#[async_trait]
impl ShortUrlStore for SqliteShortUrlStore {
    async fn find(&self, short_code: &str) -> Result<Option<ShortUrlRecord>> {
        let record = sqlx::query_as::<_, ShortUrlRecord>(
            r#"
            SELECT short_code, long_url, created_at, expires_at
            FROM short_urls
            WHERE short_code = ?
            "#,
        )
        .bind(short_code)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(record)
    }

    async fn exists(&self, short_code: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM short_urls WHERE short_code = ?",
        )
        .bind(short_code)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count > 0)
    }

    async fn insert(&self, new_url: &NewShortUrl) -> Result<ShortUrlRecord> {
        sqlx::query(
            r#"
            INSERT INTO short_urls (short_code, long_url, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&new_url.short_code)
        .bind(&new_url.long_url)
        .bind(new_url.created_at)
        .bind(new_url.expires_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| map_insert_error(e, &new_url.short_code))?;

        Ok(new_url.clone().into_record())
    }

    async fn append_click(&self, short_code: &str, click: &ClickEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO clicks (short_code, timestamp, referrer, ip)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(short_code)
        .bind(click.timestamp)
        .bind(&click.referrer)
        .bind(&click.ip)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn clicks(&self, short_code: &str) -> Result<Vec<ClickEvent>> {
        let clicks = sqlx::query_as::<_, ClickEvent>(
            r#"
            SELECT timestamp, referrer, ip
            FROM clicks
            WHERE short_code = ?
            ORDER BY id ASC
            "#,
        )
        .bind(short_code)
        .fetch_all(self.db.pool())
        .await?;

        Ok(clicks)
    }

    async fn ping(&self) -> Result<()> {
        self.db.health_check().await
    }
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShortUrlBuilder;
    use chrono::{Duration, Utc};

    async fn store() -> SqliteShortUrlStore {
        SqliteShortUrlStore::new(Database::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = store().await;
        let new_url = ShortUrlBuilder::new("http://example.com/page")
            .short_code("abc")
            .build()
            .unwrap();

        store.insert(&new_url).await.unwrap();

        let found = store.find("abc").await.unwrap().unwrap();
        assert_eq!(found.long_url, "http://example.com/page");
        assert_eq!(found.created_at, new_url.created_at);
        assert_eq!(found.expires_at, new_url.expires_at);
        assert!(store.exists("abc").await.unwrap());
        assert!(!store.exists("missing").await.unwrap());
        assert!(store.find("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_conflict() {
        let store = store().await;
        let first = ShortUrlBuilder::new("http://a.example.com").short_code("dup").build().unwrap();
        let second = ShortUrlBuilder::new("http://b.example.com").short_code("dup").build().unwrap();

        store.insert(&first).await.unwrap();
        let err = store.insert(&second).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(
            store.find("dup").await.unwrap().unwrap().long_url,
            "http://a.example.com"
        );
    }

    #[tokio::test]
    async fn test_clicks_keep_insertion_order() {
        let store = store().await;
        let new_url = ShortUrlBuilder::new("http://example.com").short_code("ord").build().unwrap();
        store.insert(&new_url).await.unwrap();

        // زمان‌ها عمدا نزولی هستن؛ ترتیب باید ترتیب درج باشه
        let base = Utc::now();
        for (i, ip) in ["10.0.0.1", "10.0.0.2", "10.0.0.3"].iter().enumerate() {
            let click = ClickEvent::at(base - Duration::seconds(i as i64), None, *ip);
            store.append_click("ord", &click).await.unwrap();
        }

        let ips: Vec<String> = store
            .clicks("ord")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.ip)
            .collect();
        assert_eq!(ips, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
    }

    #[tokio::test]
    async fn test_ping() {
        assert!(store().await.ping().await.is_ok());
    }
}
