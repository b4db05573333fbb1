//! # ماژول تنظیمات (Configuration)
//!
//! این ماژول مسئول خوندن و مدیریت تنظیمات سرویس هست.
//!
//! ## متغیرهای محیطی:
//! - `DATABASE_URL` (اجباری): آدرس دیتابیس SQLite
//! - `HOST`, `PORT`: آدرس گوش دادن سرور
//! - `BASE_URL`: آدرس عمومی لینک‌های کوتاه (اختیاری)
//! - `DEFAULT_VALIDITY_MINUTES`: مدت اعتبار پیش‌فرض لینک
//! - `AUDIT_LOG_URL`, `AUDIT_LOG_ENABLED`, `AUDIT_LOG_TIMEOUT_SECS`: لاگ audit راه دور
//! - `TRUST_PROXY`: خوندن IP از header‌های proxy
//! - `ENVIRONMENT`, `LOG_FORMAT`: محیط اجرا و فرمت لاگ

use std::env;
use serde::{Deserialize, Serialize};
use crate::error::{AppError, Result};

/// آدرس پیش‌فرض سرویس جمع‌آوری لاگ audit
pub const DEFAULT_AUDIT_LOG_URL: &str = "http://20.244.56.144/evaluation-service/logs";

/// مدت اعتبار پیش‌فرض لینک (دقیقه)
pub const DEFAULT_VALIDITY_MINUTES: i64 = 30;

/// تنظیمات اصلی برنامه
///
/// # مثال
/// ```rust
/// use link_shortener::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.port, 5000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// آدرس هاست سرور
    pub host: String,

    /// پورت سرور
    pub port: u16,

    /// آدرس پایه برای لینک‌های کوتاه
    ///
    /// اگه `None` باشه، از header `Host` درخواست ساخته میشه
    pub base_url: Option<String>,

    /// آدرس اتصال به دیتابیس
    pub database_url: String,

    /// مدت اعتبار پیش‌فرض لینک‌ها (دقیقه)
    pub default_validity_minutes: i64,

    /// تنظیمات لاگ audit
    pub audit: AuditConfig,

    /// آیا IP کلاینت از X-Forwarded-For خونده بشه؟
    pub trust_proxy: bool,

    /// محیط اجرا (development, production)
    pub environment: Environment,

    /// فرمت لاگ‌های محلی
    pub log_format: LogFormat,
}

/// تنظیمات ارسال لاگ به سرویس audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// فعال بودن ارسال
    pub enabled: bool,

    /// آدرس endpoint
    pub url: String,

    /// timeout هر درخواست (ثانیه)
    pub timeout_secs: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_AUDIT_LOG_URL.to_string(),
            timeout_secs: 5,
        }
    }
}

/// محیط اجرای برنامه
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// محیط توسعه
    #[default]
    Development,

    /// محیط تست
    Testing,

    /// محیط تولید
    Production,
}

impl Environment {
    /// آیا در محیط تولید هستیم؟
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "testing" | "test" => Environment::Testing,
            _ => Environment::Development,
        }
    }
}

/// فرمت خروجی لاگ‌های tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// خروجی خوانا برای توسعه
    #[default]
    Pretty,

    /// یک خط JSON برای هر رویداد
    Json,
}

impl LogFormat {
    /// پیش‌فرض بر اساس محیط: production همیشه JSON
    #[must_use]
    pub fn default_for(environment: Environment) -> Self {
        if environment.is_production() {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" | "text" => Some(LogFormat::Pretty),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            base_url: None,
            database_url: "sqlite://data/links.db?mode=rwc".to_string(),
            default_validity_minutes: DEFAULT_VALIDITY_MINUTES,
            audit: AuditConfig::default(),
            trust_proxy: false,
            environment: Environment::Development,
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// ساخت تنظیمات از متغیرهای محیطی
    ///
    /// # Errors
    /// - `DATABASE_URL` تنظیم نشده باشه
    /// - یه مقدار عددی قابل parse نباشه
    ///
    /// # مثال
    /// ```rust,no_run
    /// use link_shortener::config::Config;
    ///
    /// let config = Config::from_env().expect("Failed to load config");
    /// ```
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// ساخت تنظیمات از یک تابع lookup دلخواه
    ///
    /// `from_env` همین رو با `std::env::var` صدا میزنه؛ تست‌ها یه map میدن
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config("DATABASE_URL environment variable is not set".to_string())
            })?;

        let parse_num = |key: &str, default: i64| -> Result<i64> {
            match lookup(key) {
                Some(v) => v.trim().parse().map_err(|_| {
                    AppError::Config(format!("{key} must be an integer, got '{v}'"))
                }),
                None => Ok(default),
            }
        };

        let parse_bool = |key: &str, default: bool| -> bool {
            lookup(key)
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(default)
        };

        let port = u16::try_from(parse_num("PORT", i64::from(defaults.port))?)
            .map_err(|_| AppError::Config("PORT must be between 0 and 65535".to_string()))?;

        let environment: Environment = lookup("ENVIRONMENT")
            .unwrap_or_else(|| "development".to_string())
            .into();

        let log_format = lookup("LOG_FORMAT")
            .and_then(|v| LogFormat::parse(&v))
            .unwrap_or_else(|| LogFormat::default_for(environment));

        let timeout_secs = u64::try_from(parse_num("AUDIT_LOG_TIMEOUT_SECS", 5)?)
            .map_err(|_| AppError::Config("AUDIT_LOG_TIMEOUT_SECS must not be negative".to_string()))?;

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            base_url: lookup("BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),
            database_url,
            default_validity_minutes: parse_num(
                "DEFAULT_VALIDITY_MINUTES",
                DEFAULT_VALIDITY_MINUTES,
            )?,
            audit: AuditConfig {
                enabled: parse_bool("AUDIT_LOG_ENABLED", true),
                url: lookup("AUDIT_LOG_URL").unwrap_or_else(|| DEFAULT_AUDIT_LOG_URL.to_string()),
                timeout_secs,
            },
            trust_proxy: parse_bool("TRUST_PROXY", false),
            environment,
            log_format,
        })
    }

    /// اعتبارسنجی تنظیمات
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(AppError::Config("PORT cannot be 0".to_string()));
        }

        if self.default_validity_minutes <= 0 {
            return Err(AppError::Config(
                "DEFAULT_VALIDITY_MINUTES must be positive".to_string(),
            ));
        }

        if self.audit.enabled
            && !(self.audit.url.starts_with("http://") || self.audit.url.starts_with("https://"))
        {
            return Err(AppError::Config(format!(
                "AUDIT_LOG_URL must be an http(s) URL, got '{}'",
                self.audit.url
            )));
        }

        Ok(())
    }

    /// آدرس کامل سرور
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =====================================
// Builder Pattern
// =====================================
/// ساخت Config با Builder Pattern
///
/// # مثال
/// ```rust
/// use link_shortener::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .port(8080)
///     .base_url("https://sho.rt")
///     .build();
/// assert_eq!(config.base_url.as_deref(), Some("https://sho.rt"));
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// ساخت builder جدید
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// تنظیم پورت
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// تنظیم هاست
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// تنظیم base_url
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// تنظیم database_url
    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    /// تنظیم مدت اعتبار پیش‌فرض
    #[must_use]
    pub fn default_validity_minutes(mut self, minutes: i64) -> Self {
        self.config.default_validity_minutes = minutes;
        self
    }

    /// فعال/غیرفعال کردن لاگ audit
    #[must_use]
    pub fn audit_enabled(mut self, enabled: bool) -> Self {
        self.config.audit.enabled = enabled;
        self
    }

    /// تنظیم آدرس audit
    #[must_use]
    pub fn audit_url(mut self, url: impl Into<String>) -> Self {
        self.config.audit.url = url.into();
        self
    }

    /// اعتماد به header‌های proxy
    #[must_use]
    pub fn trust_proxy(mut self, trust: bool) -> Self {
        self.config.trust_proxy = trust;
        self
    }

    /// تنظیم محیط
    #[must_use]
    pub fn environment(mut self, env: Environment) -> Self {
        self.config.environment = env;
        self
    }

    /// ساخت Config نهایی
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }

    /// ساخت Config با اعتبارسنجی
    pub fn build_validated(self) -> Result<Config> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.default_validity_minutes, 30);
        assert!(config.audit.enabled);
    }

    #[test]
    fn test_missing_database_url_is_fatal() {
        let result = Config::from_lookup(lookup_from(&[("PORT", "8080")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_from_lookup_reads_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("PORT", "8080"),
            ("BASE_URL", "https://sho.rt/"),
            ("AUDIT_LOG_ENABLED", "false"),
            ("TRUST_PROXY", "true"),
            ("ENVIRONMENT", "prod"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.base_url.as_deref(), Some("https://sho.rt"));
        assert!(!config.audit.enabled);
        assert!(config.trust_proxy);
        assert!(config.environment.is_production());
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.audit.url, DEFAULT_AUDIT_LOG_URL);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("PORT", "not-a-port"),
        ]));
        assert!(result.is_err());

        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("PORT", "70000"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_override() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("ENVIRONMENT", "production"),
            ("LOG_FORMAT", "pretty"),
        ]))
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_environment_from_string() {
        assert_eq!(Environment::from("production".to_string()), Environment::Production);
        assert_eq!(Environment::from("PROD".to_string()), Environment::Production);
        assert_eq!(Environment::from("unknown".to_string()), Environment::Development);
    }

    #[test]
    fn test_validation() {
        assert!(ConfigBuilder::new().port(0).build_validated().is_err());
        assert!(ConfigBuilder::new()
            .default_validity_minutes(0)
            .build_validated()
            .is_err());
        assert!(ConfigBuilder::new()
            .audit_url("ftp://logs.example.com")
            .build_validated()
            .is_err());
        assert!(ConfigBuilder::new()
            .audit_enabled(false)
            .audit_url("ftp://logs.example.com")
            .build_validated()
            .is_ok());
    }
}
