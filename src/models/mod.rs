//! # ماژول مدل‌ها (Domain Models)
//!
//! این ماژول مدل‌های داده سرویس رو تعریف میکنه.
//!
//! ## تفاوت انواع مدل:
//! - **Entity**: داده‌ای که در دیتابیس ذخیره میشه (`ShortUrlRecord`, `ClickEvent`)
//! - **DTO (Data Transfer Object)**: برای ارسال/دریافت از API
//!
//! ## مفاهیم Rust:
//! - **Derive Macros**: `FromRow`, `Serialize`, `Deserialize`, `Validate`
//! - **Builder Pattern**: ساخت تدریجی رکورد جدید
//! - **serde rename**: نام‌گذاری camelCase در JSON

mod short_url;
mod dto;

// Re-export همه مدل‌ها
pub use short_url::*;
pub use dto::*;
