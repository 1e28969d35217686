use crate::adapters::browser::BrowserSlot;
use crate::config::PortalConfig;
use crate::core::contract;
use crate::core::params::SearchParams;
use crate::domain::model::ExportJob;
use crate::domain::ports::{BrowserSession, ExportObserver, HttpFetch};
use crate::utils::cancel::Cancellation;
use crate::utils::error::{PortalError, Result};
use crate::utils::retry::BoundedRetry;
use serde::Deserialize;
use url::Url;

/// 匯出流程的狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    AwaitingDownloadButton,
    TokenAcquired,
    JobStarted,
    Polling,
    Completed,
    Failed,
}

impl ExportState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Deserialize)]
struct JobEnvelope {
    data: JobStatus,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    #[serde(default)]
    total: Option<Lenient>,
    #[serde(default)]
    processed: Option<Lenient>,
    #[serde(default, deserialize_with = "lenient_flag")]
    finished: bool,
    #[serde(default)]
    id: Option<Lenient>,
    #[serde(default)]
    filename: Option<String>,
}

/// The progress endpoint is loose about numbers: ids and counts show up both
/// as JSON numbers and as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(u64),
    Text(String),
}

impl Lenient {
    fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// `finished` arrives as `true`, `1` or `"1"` depending on the endpoint.
fn lenient_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(u64),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(false),
        Some(Flag::Bool(flag)) => Ok(flag),
        Some(Flag::Number(n)) => Ok(n != 0),
        Some(Flag::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "" | "0" | "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid finished flag '{}'",
                other
            ))),
        },
    }
}

fn parse_status(value: serde_json::Value) -> Result<JobStatus> {
    let envelope: JobEnvelope = serde_json::from_value(value)?;
    Ok(envelope.data)
}

/// Runs one server-side CSV export: trigger it from the search page in the
/// browser, start the job over HTTP, poll until the file is ready.
pub struct BulkExportOrchestrator<'a, F: HttpFetch> {
    fetch: &'a F,
    config: &'a PortalConfig,
    state: ExportState,
    polls: u32,
}

impl<'a, F: HttpFetch> BulkExportOrchestrator<'a, F> {
    pub fn new(fetch: &'a F, config: &'a PortalConfig) -> Self {
        Self {
            fetch,
            config,
            state: ExportState::Idle,
            polls: 0,
        }
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    /// Progress requests sent during the last run.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Returns the absolute URL of the finished export file.
    pub async fn run(
        &mut self,
        slot: &mut BrowserSlot,
        query: &SearchParams,
        observer: &dyn ExportObserver,
        cancel: &Cancellation,
    ) -> Result<Url> {
        self.state = ExportState::Idle;
        self.polls = 0;

        let result = self.drive(slot, query, observer, cancel).await;
        if let Err(e) = &result {
            tracing::error!("❌ Export failed in state {:?}: {}", self.state, e);
            self.transition(ExportState::Failed);
        }
        slot.guard(result).await
    }

    async fn drive(
        &mut self,
        slot: &mut BrowserSlot,
        query: &SearchParams,
        observer: &dyn ExportObserver,
        cancel: &Cancellation,
    ) -> Result<Url> {
        let mut search_url = self.config.endpoint(&self.config.portal.search_path)?;
        query.apply_to(&mut search_url);

        let session = slot.session().await?;
        cancel.check("export trigger")?;
        tracing::info!("🔍 Opening search page for export: {}", search_url);
        session.navigate(&search_url).await?;
        self.transition(ExportState::AwaitingDownloadButton);

        let (cache_id, type_of_report) = self.read_trigger(session, &search_url, cancel).await?;
        let download_token = self.read_token(session, cancel).await?;
        self.transition(ExportState::TokenAcquired);

        let mut job = self
            .start_job(cache_id, type_of_report, download_token)
            .await?;
        self.transition(ExportState::JobStarted);

        self.poll_until_finished(&mut job, observer, cancel).await?;

        let filename = job.filename.clone().ok_or_else(|| {
            PortalError::ExportPoll {
                job_id: job.job_id.clone(),
                message: "job finished without a filename".to_string(),
            }
        })?;
        let file_url = self.config.endpoint(&filename)?;

        self.transition(ExportState::Completed);
        observer.on_finished(&job);
        tracing::info!("✅ Export ready after {} poll(s): {}", self.polls, file_url);
        Ok(file_url)
    }

    async fn read_trigger(
        &self,
        session: &mut (dyn BrowserSession + 'static),
        search_url: &Url,
        cancel: &Cancellation,
    ) -> Result<(String, String)> {
        let waited = self.config.marker_timeout();
        let appeared = tokio::select! {
            appeared = session.wait_for_element(contract::DOWNLOAD_BUTTON, waited) => appeared?,
            err = cancel.cancelled("export trigger") => return Err(err),
        };
        if !appeared {
            return Err(PortalError::ExportTriggerTimeout {
                url: search_url.to_string(),
                waited,
            });
        }

        let required = |value: Option<String>, attr: &str| {
            value.filter(|v| !v.is_empty()).ok_or_else(|| {
                PortalError::structural(
                    "export trigger",
                    format!("download button has no {} attribute", attr),
                )
            })
        };

        let cache_id = session
            .attribute(contract::DOWNLOAD_BUTTON, contract::CACHE_ID_ATTR)
            .await?;
        let cache_id = required(cache_id, contract::CACHE_ID_ATTR)?;
        let type_of_report = session
            .attribute(contract::DOWNLOAD_BUTTON, contract::REPORT_TYPE_ATTR)
            .await?;
        let type_of_report = required(type_of_report, contract::REPORT_TYPE_ATTR)?;

        tracing::debug!("🔑 Export cache id {} ({})", cache_id, type_of_report);
        Ok((cache_id, type_of_report))
    }

    /// The cookie is set by page script, sometimes after the button appears.
    async fn read_token(
        &self,
        session: &mut (dyn BrowserSession + 'static),
        cancel: &Cancellation,
    ) -> Result<String> {
        let cookie_name = &self.config.portal.token_cookie;
        let mut retry = BoundedRetry::new(self.config.export.token_retry);

        while let Some(attempt) = retry.next_attempt(cancel, "download token").await? {
            match session.cookie(cookie_name).await? {
                Some(token) if !token.is_empty() => return Ok(token),
                _ => tracing::debug!("🍪 Cookie '{}' not set yet (attempt {})", cookie_name, attempt),
            }
        }

        Err(PortalError::TokenUnavailable {
            attempts: retry.attempts_made(),
        })
    }

    async fn start_job(
        &self,
        cache_id: String,
        type_of_report: String,
        download_token: String,
    ) -> Result<ExportJob> {
        let mut url = self.config.endpoint(&self.config.portal.download_start_path)?;
        url.path_segments_mut()
            .map_err(|_| PortalError::ConfigError {
                message: "portal.base_url cannot carry path segments".to_string(),
            })?
            .pop_if_empty()
            .extend([&type_of_report, &cache_id, &download_token]);

        let response = self.fetch.get_json(&url, &[]).await?;
        let status = parse_status(response).map_err(|e| {
            PortalError::structural("export start", format!("unexpected response: {}", e))
        })?;

        let job_id = status
            .id
            .clone()
            .map(Lenient::into_string)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PortalError::structural("export start", "response carries no job id"))?;

        tracing::info!("🚀 Export job {} started", job_id);

        let mut job = ExportJob {
            cache_id,
            type_of_report,
            download_token,
            job_id,
            total: 0,
            processed: 0,
            finished: false,
            filename: None,
        };
        apply_status(&mut job, status);
        Ok(job)
    }

    async fn poll_until_finished(
        &mut self,
        job: &mut ExportJob,
        observer: &dyn ExportObserver,
        cancel: &Cancellation,
    ) -> Result<()> {
        self.transition(ExportState::Polling);

        let cancel = match self.config.poll_deadline() {
            Some(deadline) => cancel.clone().with_timeout(deadline),
            None => cancel.clone(),
        };

        let mut url = self.config.endpoint(&self.config.portal.progress_path)?;
        url.path_segments_mut()
            .map_err(|_| PortalError::ConfigError {
                message: "portal.base_url cannot carry path segments".to_string(),
            })?
            .pop_if_empty()
            .push(&job.job_id);

        while !job.finished {
            cancel.sleep(self.config.poll_interval(), "export polling").await?;

            let status = match self.fetch.get_json(&url, &[]).await.and_then(parse_status) {
                Ok(status) => status,
                Err(e) => {
                    return Err(PortalError::ExportPoll {
                        job_id: job.job_id.clone(),
                        message: e.to_string(),
                    })
                }
            };
            self.polls += 1;

            let before = job.processed;
            apply_status(job, status);
            observer.on_progress(job, job.processed.saturating_sub(before));
        }

        Ok(())
    }

    fn transition(&mut self, next: ExportState) {
        tracing::debug!("🔄 Export state {:?} → {:?}", self.state, next);
        self.state = next;
    }
}

fn apply_status(job: &mut ExportJob, status: JobStatus) {
    if let Some(total) = status.total.as_ref().and_then(Lenient::as_u64) {
        job.total = total;
    }
    if let Some(processed) = status.processed.as_ref().and_then(Lenient::as_u64) {
        job.processed = processed;
    }
    job.finished = status.finished;
    if let Some(filename) = status.filename.filter(|f| !f.is_empty()) {
        job.filename = Some(filename);
    }
}
