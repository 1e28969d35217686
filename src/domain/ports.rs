use crate::domain::model::ExportJob;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Destination for command outputs.
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// A fetched HTML page together with the URL it was served from, which is
/// the base for resolving its relative links.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub body: String,
}

/// HTTP capability consumed by the engine.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get_text(&self, url: &Url, query: &[(String, String)]) -> Result<FetchedPage>;

    async fn get_json(&self, url: &Url, query: &[(String, String)]) -> Result<serde_json::Value>;

    async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>>;
}

/// Controllable browser session. Implementations report driver failures as
/// `PortalError::Browser`, which invalidates the session.
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &Url) -> Result<()>;

    /// Returns `false` when `selector` did not appear within `timeout`.
    async fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<bool>;

    async fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>>;

    async fn cookie(&mut self, name: &str) -> Result<Option<String>>;

    async fn page_source(&mut self) -> Result<String>;

    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}

/// 匯出進度回報
pub trait ExportObserver: Send + Sync {
    fn on_progress(&self, job: &ExportJob, delta: u64);

    fn on_finished(&self, _job: &ExportJob) {}
}

/// Observer that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ExportObserver for LogObserver {
    fn on_progress(&self, job: &ExportJob, delta: u64) {
        tracing::info!(
            "📦 Export job {}: {}/{} rows (+{})",
            job.job_id,
            job.processed,
            job.total,
            delta
        );
    }

    fn on_finished(&self, job: &ExportJob) {
        tracing::info!("📦 Export job {} finished ({} rows)", job.job_id, job.total);
    }
}
