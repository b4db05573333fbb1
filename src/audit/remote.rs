//! # Remote Audit Logger
//!
//! ارسال رویدادها با `POST` به endpoint بیرونی.

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tracing::{error, warn};

use super::{AuditEntry, AuditError, AuditLog};
use crate::utils;

/// بدنه JSON که به endpoint ارسال میشه
#[derive(Debug, Serialize)]
struct LogPayload<'a> {
    stack: &'static str,
    level: &'static str,
    package: &'static str,
    message: &'a str,
    timestamp: String,
}

impl<'a> From<&'a AuditEntry> for LogPayload<'a> {
    fn from(entry: &'a AuditEntry) -> Self {
        Self {
            stack: entry.stack.as_str(),
            level: entry.level.as_str(),
            package: entry.package.as_str(),
            message: &entry.message,
            timestamp: utils::to_iso8601(&entry.timestamp),
        }
    }
}

/// sink که هر رویداد رو در یک task جدا ارسال میکنه
#[derive(Debug, Clone)]
pub struct RemoteAuditLogger {
    client: reqwest::Client,
    endpoint: Arc<str>,
}

impl RemoteAuditLogger {
    /// ساخت logger با timeout مشخص برای هر درخواست
    pub fn new(endpoint: impl AsRef<str>, timeout: Duration) -> Result<Self, AuditError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: Arc::from(endpoint.as_ref()),
        })
    }

    /// ارسال یک رویداد و منتظر موندن برای پاسخ
    ///
    /// بدنه پاسخ خونده نمیشه؛ فقط status مهمه
    pub async fn send(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let response = self
            .client
            .post(self.endpoint.as_ref())
            .json(&LogPayload::from(entry))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuditError::Status(status));
        }

        Ok(())
    }
}

impl AuditLog for RemoteAuditLogger {
    fn emit(&self, entry: AuditEntry) {
        // بیرون از runtime راهی برای ارسال غیرهمزمان نیست
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(message = %entry.message, "No async runtime, dropping audit entry");
            return;
        };

        let logger = self.clone();
        handle.spawn(async move {
            if let Err(e) = logger.send(&entry).await {
                error!(error = %e, endpoint = %logger.endpoint, "Audit log delivery failed");
            }
        });
    }
}
