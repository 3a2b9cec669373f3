//! Document store for suspicious-logo reports.
//!
//! One document per report, written once, never read back by this service.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use tokio::sync::OnceCell;
use tracing::info;

use crate::analysis::AnalysisResult;
use crate::config::{Config, StoreSettings};
use crate::error::{LogoVerifyError, Result};

/// Status every new report starts in
pub const INITIAL_STATUS: &str = "pending";

/// A report about to be written; the store adds id, timestamp and status
#[derive(Debug, Clone, Serialize)]
pub struct NewReport {
    pub analysis: AnalysisResult,
    pub image_base64: String,
    pub mime_type: String,
}

/// Document body as written to the reports table; `created_at` is stamped by the database
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub analysis: AnalysisResult,
    pub image_base64: String,
    pub mime_type: String,
    pub status: String,
}

impl NewReport {
    pub fn into_document(self) -> ReportDocument {
        ReportDocument {
            analysis: self.analysis,
            image_base64: self.image_base64,
            mime_type: self.mime_type,
            status: INITIAL_STATUS.to_string(),
        }
    }
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Write one report document and return its generated id
    async fn create_report(&self, report: NewReport) -> Result<String>;
}

/// SurrealDB-backed store. The connection is opened on first use and reused.
pub struct SurrealReportStore {
    config: Arc<Config>,
    db: OnceCell<Surreal<Client>>,
}

impl SurrealReportStore {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    async fn handle(&self, settings: &StoreSettings) -> Result<&Surreal<Client>> {
        self.db.get_or_try_init(|| connect(settings)).await
    }
}

#[async_trait]
impl ReportStore for SurrealReportStore {
    async fn create_report(&self, report: NewReport) -> Result<String> {
        let settings = self.config.store_settings()?;
        let db = self.handle(&settings).await?;

        let sql = "LET $created = CREATE type::table($table) CONTENT $content; \
                   UPDATE $created[0].id SET created_at = time::now(); \
                   RETURN meta::id($created[0].id);";

        let mut response = db
            .query(sql)
            .bind(("table", settings.table.clone()))
            .bind(("content", report.into_document()))
            .await?
            .check()?;

        let id: Option<String> = response.take(2)?;
        let id = id.ok_or_else(|| LogoVerifyError::store("report write returned no id"))?;
        info!("Stored logo report {}:{}", settings.table, id);
        Ok(id)
    }
}

// SurrealDB Ws engine expects host:port, no scheme
fn normalize_ws_url(s: &str) -> String {
    s.strip_prefix("ws://")
        .or_else(|| s.strip_prefix("wss://"))
        .or_else(|| s.strip_prefix("http://"))
        .or_else(|| s.strip_prefix("https://"))
        .unwrap_or(s)
        .trim_end_matches('/')
        .to_string()
}

/// Open and authenticate a connection scoped to the configured namespace/database
pub async fn connect(settings: &StoreSettings) -> Result<Surreal<Client>> {
    let url = normalize_ws_url(&settings.url);
    info!("Connecting to SurrealDB at {}", url);

    let db = Surreal::new::<Ws>(url.as_str()).await.map_err(|e| {
        LogoVerifyError::store(format!("Failed to connect to SurrealDB at {}: {}", url, e))
    })?;

    db.signin(surrealdb::opt::auth::Root {
        username: settings.username.as_str(),
        password: settings.password.as_str(),
    })
    .await
    .map_err(|e| {
        LogoVerifyError::store(format!(
            "Failed to authenticate with SurrealDB as user '{}': {}",
            settings.username, e
        ))
    })?;

    db.use_ns(settings.namespace.as_str())
        .use_db(settings.database.as_str())
        .await
        .map_err(|e| {
            LogoVerifyError::store(format!(
                "Failed to select {}/{}: {}",
                settings.namespace, settings.database, e
            ))
        })?;

    Ok(db)
}
