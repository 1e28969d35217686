use crate::config::PortalConfig;
use crate::domain::ports::{FetchedPage, HttpFetch};
use crate::utils::error::{PortalError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use url::Url;

/// `HttpFetch` over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.http.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn send(&self, url: &Url, query: &[(String, String)]) -> Result<Response> {
        // 構建請求
        let mut request = self.client.get(url.clone());
        if !query.is_empty() {
            request = request.query(query);
        }

        tracing::debug!("🌐 GET {} ({} params)", url, query.len());
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let final_url = response.url().to_string();
        tracing::warn!("⚠️ HTTP {} from {}", status.as_u16(), final_url);
        if status == StatusCode::NOT_FOUND {
            return Err(PortalError::NotFound { what: final_url });
        }
        Err(PortalError::HttpStatus {
            url: final_url,
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get_text(&self, url: &Url, query: &[(String, String)]) -> Result<FetchedPage> {
        let response = self.send(url, query).await?;
        let final_url = response.url().clone();
        let body = response.text().await?;
        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }

    async fn get_json(&self, url: &Url, query: &[(String, String)]) -> Result<serde_json::Value> {
        let response = self.send(url, query).await?;
        Ok(response.json().await?)
    }

    async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self.send(url, &[]).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
