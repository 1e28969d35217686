use crate::config::PortalConfig;
use crate::domain::ports::{BrowserLauncher, BrowserSession};
use crate::utils::error::{PortalError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// W3C web element identifier key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Driver error codes that mean "nothing there" rather than a broken session.
const MISSING_ERRORS: [&str; 2] = ["no such element", "no such cookie"];

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn transport(e: reqwest::Error) -> PortalError {
    PortalError::browser(format!("webdriver request failed: {}", e))
}

/// Opens sessions on an already running WebDriver endpoint
/// (chromedriver, geckodriver, selenium).
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    client: Client,
    endpoint: Url,
    headless: bool,
    poll_interval: Duration,
}

impl WebDriverLauncher {
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint: with_trailing_slash(Url::parse(&config.browser.webdriver_url)?),
            headless: config.browser.headless,
            poll_interval: Duration::from_millis(config.browser.poll_interval_ms),
        })
    }

    fn capabilities(&self) -> Value {
        let mut args = vec!["--disable-gpu", "--no-sandbox"];
        if self.headless {
            args.push("--headless=new");
        }
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let url = self.endpoint.join("session")?;
        let response = self
            .client
            .post(url)
            .json(&self.capabilities())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body: Value = response.json().await.map_err(transport)?;
        if !status.is_success() {
            return Err(PortalError::browser(format!(
                "session creation rejected ({}): {}",
                status.as_u16(),
                body["value"]["message"].as_str().unwrap_or("no message")
            )));
        }

        let session_id = body["value"]["sessionId"]
            .as_str()
            .ok_or_else(|| PortalError::browser("session response carries no sessionId"))?
            .to_string();

        tracing::info!("🌐 WebDriver session {} opened", session_id);

        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            session_url: self.endpoint.join(&format!("session/{}/", session_id))?,
            session_id,
            poll_interval: self.poll_interval,
            closed: false,
        }))
    }
}

pub struct WebDriverSession {
    client: Client,
    session_url: Url,
    session_id: String,
    poll_interval: Duration,
    closed: bool,
}

impl WebDriverSession {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Sends one command. `Ok(None)` when the driver reports a missing
    /// element or cookie; any other driver error is a `Browser` error.
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Option<Value>> {
        if self.closed {
            return Err(PortalError::browser("session already closed"));
        }

        let url = self.session_url.join(path)?;
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let mut payload: Value = response.json().await.map_err(transport)?;
        let value = payload.get_mut("value").map(Value::take).unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(Some(value));
        }

        let error = value["error"].as_str().unwrap_or("unknown error");
        if MISSING_ERRORS.contains(&error) {
            return Ok(None);
        }
        Err(PortalError::browser(format!(
            "{} ({}): {}",
            error,
            path,
            value["message"].as_str().unwrap_or("")
        )))
    }

    async fn find_element(&self, selector: &str) -> Result<Option<String>> {
        let found = self
            .command(
                Method::POST,
                "element",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await?;

        Ok(found.and_then(|value| value[ELEMENT_KEY].as_str().map(str::to_string)))
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &Url) -> Result<()> {
        tracing::debug!("🧭 Navigating to {}", url);
        self.command(Method::POST, "url", Some(json!({ "url": url.as_str() })))
            .await?;
        Ok(())
    }

    async fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.find_element(selector).await?.is_some() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                tracing::debug!("⏳ '{}' did not appear within {:?}", selector, timeout);
                return Ok(false);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>> {
        let Some(element) = self.find_element(selector).await? else {
            return Ok(None);
        };
        let value = self
            .command(
                Method::GET,
                &format!("element/{}/attribute/{}", element, name),
                None,
            )
            .await?;
        Ok(value.and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn cookie(&mut self, name: &str) -> Result<Option<String>> {
        let value = self
            .command(Method::GET, &format!("cookie/{}", name), None)
            .await?;
        Ok(value.and_then(|v| v["value"].as_str().map(str::to_string)))
    }

    async fn page_source(&mut self) -> Result<String> {
        let value = self.command(Method::GET, "source", None).await?;
        value
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| PortalError::browser("page source unavailable"))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let url = self
            .session_url
            .as_str()
            .trim_end_matches('/')
            .parse::<Url>()?;
        self.closed = true;

        self.client
            .delete(url)
            .send()
            .await
            .map_err(transport)?;
        tracing::info!("🌐 WebDriver session {} closed", self.session_id);
        Ok(())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                "⚠️ WebDriver session {} dropped without close; the driver keeps it until timeout",
                self.session_id
            );
        }
    }
}
