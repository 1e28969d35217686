#![allow(dead_code)]

use async_trait::async_trait;
use nlrb_scrape::domain::model::ExportJob;
use nlrb_scrape::domain::ports::{
    BrowserLauncher, BrowserSession, ExportObserver, FetchedPage, HttpFetch,
};
use nlrb_scrape::{PortalConfig, PortalError, Result};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("fixture {}: {}", path.display(), e))
}

/// Config with millisecond waits so orchestration tests finish quickly.
pub fn fast_config(base_url: &str) -> PortalConfig {
    let mut config = PortalConfig::default();
    config.portal.base_url = base_url.to_string();
    config.export.poll_interval_ms = 1;
    config.export.marker_timeout_seconds = 1;
    config.export.token_retry.backoff_ms = 1;
    config.assembler.secondary_retry.backoff_ms = 1;
    config.assembler.results_timeout_seconds = 1;
    config.browser.poll_interval_ms = 1;
    config
}

pub enum Reply {
    Text(String),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    Status(u16),
}

/// `HttpFetch` answering from per-path queues and recording every request.
#[derive(Default)]
pub struct ScriptedFetch {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, path: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Requests seen so far as `path?query`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.starts_with(prefix))
            .collect()
    }

    fn next_reply(&self, url: &Url, query: &[(String, String)]) -> Result<(Url, Reply)> {
        let mut full = url.clone();
        if !query.is_empty() {
            full.query_pairs_mut().extend_pairs(query.iter());
        }

        let recorded = match full.query() {
            Some(q) => format!("{}?{}", full.path(), q),
            None => full.path().to_string(),
        };
        self.requests.lock().unwrap().push(recorded);

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(url.path())
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| PortalError::NotFound {
                what: full.to_string(),
            })?;

        match reply {
            Reply::Status(404) => Err(PortalError::NotFound {
                what: full.to_string(),
            }),
            Reply::Status(status) => Err(PortalError::HttpStatus {
                url: full.to_string(),
                status,
            }),
            other => Ok((full, other)),
        }
    }
}

#[async_trait]
impl HttpFetch for ScriptedFetch {
    async fn get_text(&self, url: &Url, query: &[(String, String)]) -> Result<FetchedPage> {
        match self.next_reply(url, query)? {
            (url, Reply::Text(body)) => Ok(FetchedPage { url, body }),
            (url, _) => panic!("scripted reply for {} is not text", url),
        }
    }

    async fn get_json(&self, url: &Url, query: &[(String, String)]) -> Result<serde_json::Value> {
        match self.next_reply(url, query)? {
            (_, Reply::Json(value)) => Ok(value),
            (url, _) => panic!("scripted reply for {} is not JSON", url),
        }
    }

    async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        match self.next_reply(url, &[])? {
            (_, Reply::Bytes(bytes)) => Ok(bytes),
            (_, Reply::Text(text)) => Ok(text.into_bytes()),
            (url, _) => panic!("scripted reply for {} is not bytes", url),
        }
    }
}

/// Browser behaviour shared by every session a `FakeLauncher` opens.
#[derive(Debug, Default)]
pub struct BrowserScript {
    pub marker_present: bool,
    pub attributes: HashMap<String, String>,
    /// One entry per cookie read; reads past the end see no cookie.
    pub cookies: VecDeque<Option<String>>,
    /// One entry per page-source read; the last one repeats.
    pub sources: VecDeque<String>,
    /// Fail the next navigation with a session-level error.
    pub crash_next_navigation: bool,
    /// Element waits never resolve; only cancellation ends them.
    pub hang_waits: bool,

    pub navigations: Vec<String>,
    pub waits: Vec<String>,
    pub cookie_reads: u32,
    pub closes: u32,
}

pub type SharedScript = Arc<Mutex<BrowserScript>>;

pub struct FakeSession {
    script: SharedScript,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &Url) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        if std::mem::take(&mut script.crash_next_navigation) {
            return Err(PortalError::browser("tab crashed"));
        }
        script.navigations.push(url.to_string());
        Ok(())
    }

    async fn wait_for_element(&mut self, selector: &str, _timeout: Duration) -> Result<bool> {
        let (present, hang) = {
            let mut script = self.script.lock().unwrap();
            script.waits.push(selector.to_string());
            (script.marker_present, script.hang_waits)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(present)
    }

    async fn attribute(&mut self, _selector: &str, name: &str) -> Result<Option<String>> {
        Ok(self.script.lock().unwrap().attributes.get(name).cloned())
    }

    async fn cookie(&mut self, _name: &str) -> Result<Option<String>> {
        let mut script = self.script.lock().unwrap();
        script.cookie_reads += 1;
        Ok(script.cookies.pop_front().flatten())
    }

    async fn page_source(&mut self) -> Result<String> {
        let mut script = self.script.lock().unwrap();
        let source = if script.sources.len() > 1 {
            script.sources.pop_front()
        } else {
            script.sources.front().cloned()
        };
        Ok(source.unwrap_or_default())
    }

    async fn close(&mut self) -> Result<()> {
        self.script.lock().unwrap().closes += 1;
        Ok(())
    }
}

#[derive(Clone)]
pub struct FakeLauncher {
    pub script: SharedScript,
    pub launches: Arc<AtomicU32>,
}

impl FakeLauncher {
    pub fn new(script: BrowserScript) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            launches: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn launches(&self) -> u32 {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            script: self.script.clone(),
        }))
    }
}

/// Records every progress callback.
#[derive(Default)]
pub struct RecordingObserver {
    pub progress: Mutex<Vec<(u64, u64)>>,
    pub finished: Mutex<Option<ExportJob>>,
}

impl ExportObserver for RecordingObserver {
    fn on_progress(&self, job: &ExportJob, delta: u64) {
        self.progress.lock().unwrap().push((job.processed, delta));
    }

    fn on_finished(&self, job: &ExportJob) {
        *self.finished.lock().unwrap() = Some(job.clone());
    }
}
