use crate::config::PortalConfig;
use crate::core::extract::{parse_docket_response, parse_listing};
use crate::domain::model::{CaseSummary, DocketEntry};
use crate::domain::ports::HttpFetch;
use crate::utils::cancel::Cancellation;
use crate::utils::error::{PortalError, Result};
use async_stream::try_stream;
use futures::Stream;
use std::collections::HashSet;
use url::Url;

/// Follows search-result `rel=next` links and walks docket pages.
pub struct PaginationWalker<'a, F: HttpFetch> {
    fetch: &'a F,
    config: &'a PortalConfig,
}

impl<'a, F: HttpFetch> PaginationWalker<'a, F> {
    pub fn new(fetch: &'a F, config: &'a PortalConfig) -> Self {
        Self { fetch, config }
    }

    /// Lazily yields every summary from `start` and the pages after it.
    pub fn listing(
        &self,
        start: Url,
        params: Vec<(String, String)>,
    ) -> impl Stream<Item = Result<CaseSummary>> + Send + 'a {
        let fetch = self.fetch;

        try_stream! {
            let mut page = fetch.get_text(&start, &params).await?;
            let mut visited = HashSet::new();
            let mut pages = 0usize;

            loop {
                pages += 1;
                visited.insert(page.url.to_string());

                let listing = parse_listing(&page)?;
                for summary in listing.summaries {
                    yield summary;
                }

                let Some(next) = listing.next_page else {
                    break;
                };
                if visited.contains(next.as_str()) {
                    tracing::warn!("⚠️ Next-page link points back to {}; stopping", next);
                    break;
                }

                tracing::debug!("➡️ Following next page: {}", next);
                page = fetch.get_text(&next, &[]).await?;
            }

            tracing::info!("📚 Search listing finished after {} page(s)", pages);
        }
    }

    /// Fetches docket pages `1..=last_page`; page 0 is the table already on
    /// the detail page. Rows come back in fetch order.
    pub async fn docket_pages(
        &self,
        case_number: &str,
        last_page: Option<u32>,
        cancel: &Cancellation,
    ) -> Result<Vec<DocketEntry>> {
        let Some(last_page) = last_page else {
            return Ok(Vec::new());
        };

        let url = self.docket_url(case_number)?;
        let base = self.config.base_url()?;
        let mut entries = Vec::new();

        for page in 1..=last_page {
            cancel.check("docket pagination")?;

            let query = vec![
                ("page".to_string(), page.to_string()),
                ("_wrapper_format".to_string(), "drupal_ajax".to_string()),
            ];
            let response = self.fetch.get_json(&url, &query).await?;
            let rows = parse_docket_response(&response, &base).map_err(|e| match e {
                PortalError::StructuralExtraction { message, .. } => PortalError::structural(
                    format!("docket page {} of {}", page, case_number),
                    message,
                ),
                other => other,
            })?;

            tracing::debug!(
                "📑 {}: docket page {}/{} → {} rows",
                case_number,
                page,
                last_page,
                rows.len()
            );
            entries.extend(rows);
        }

        Ok(entries)
    }

    fn docket_url(&self, case_number: &str) -> Result<Url> {
        self.config.endpoint(&format!(
            "{}/{}/{}/{}",
            self.config.portal.docket_path.trim_end_matches('/'),
            case_number,
            self.config.docket.sort_field,
            self.config.docket.sort_direction
        ))
    }
}
