//! # Link Shortener - نقطه ورود برنامه
//!
//! این فایل نقطه شروع اجرای برنامه است.
//! در Rust، `main.rs` برای باینری‌ها و `lib.rs` برای کتابخانه‌ها استفاده میشه.
//!
//! ## مفاهیم Rust در این فایل:
//! - `async fn main()`: تابع اصلی غیرهمزمان با tokio
//! - `Result<T, E>`: مدیریت خطا
//! - `?` operator: انتشار خطا به بالا
//! - Graceful shutdown با `tokio::signal`

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// وارد کردن ماژول‌ها از کتابخانه‌مون
use link_shortener::{
    api::create_router,
    audit::Audit,
    config::{Config, LogFormat},
    database::Database,
    error::{AppError, Result},
    services::AppState,
};

/// نقطه ورود اصلی برنامه
///
/// # Errors
/// خطا برمیگردونه اگه:
/// - تنظیمات لود نشن یا نامعتبر باشن
/// - دیتابیس متصل نشه
/// - سرور استارت نشه
#[tokio::main]
async fn main() -> Result<()> {
    // لود کردن متغیرهای محیطی از فایل .env
    // اگه فایل نباشه اوکیه
    dotenvy::dotenv().ok();

    // لود کردن تنظیمات؛ فرمت لاگ هم به تنظیمات بستگی داره
    let config = Config::from_env();
    let log_format = config
        .as_ref()
        .map(|c| c.log_format)
        .unwrap_or(LogFormat::Pretty);

    // راه‌اندازی سیستم لاگینگ
    init_tracing(log_format);

    info!("🚀 Starting Link Shortener Service...");

    let config = config?;
    config.validate()?;
    info!(environment = ?config.environment, "✅ Configuration loaded successfully");

    // اتصال به دیتابیس
    let database = Database::connect(&config.database_url).await?;
    info!("✅ Database connected successfully");

    // اجرای migration‌ها
    database.migrate().await?;
    info!("✅ Database migrations applied");

    // لاگ audit
    let audit = Audit::from_config(&config.audit);
    if config.audit.enabled {
        info!(endpoint = %config.audit.url, "✅ Remote audit logging enabled");
    } else {
        warn!("Remote audit logging disabled");
    }

    // آدرس سرور
    let addr = config.server_addr();

    // ساخت router با تمام route‌ها و middleware‌ها
    let app = create_router(AppState::new(database.clone(), config, audit));

    // ساخت listener و اجرای سرور
    let listener = TcpListener::bind(&addr).await?;
    info!("🌐 Server listening on http://{}", addr);

    // ConnectInfo برای دسترسی به IP کلاینت
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::Server(e.to_string()))?;

    database.close().await;
    info!("👋 Server stopped");

    Ok(())
}

/// راه‌اندازی سیستم tracing برای لاگینگ
///
/// # مفاهیم:
/// - Structured Logging: لاگ‌ها به صورت ساختاریافته ذخیره میشن
/// - Layers: لایه‌های مختلف برای فرمت و فیلتر کردن
/// - EnvFilter: فیلتر کردن لاگ‌ها بر اساس متغیر محیطی
fn init_tracing(format: LogFormat) {
    // EnvFilter از متغیر RUST_LOG میخونه
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("link_shortener=debug,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_target(true)           // نمایش نام ماژول
                    .with_thread_ids(true)       // نمایش ID ترد
                    .with_file(true)             // نمایش نام فایل
                    .with_line_number(true)      // نمایش شماره خط
                    .pretty(),
            )
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .init(),
    }
}

/// منتظر Ctrl-C یا SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
