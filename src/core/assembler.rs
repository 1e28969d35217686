use crate::adapters::browser::BrowserSlot;
use crate::config::PortalConfig;
use crate::core::contract;
use crate::core::extract::{parse_advanced_results, parse_detail, DetailPage};
use crate::core::paginate::PaginationWalker;
use crate::domain::model::{CaseDetail, FieldMap};
use crate::domain::ports::HttpFetch;
use crate::utils::cancel::Cancellation;
use crate::utils::error::{PortalError, Result};
use crate::utils::retry::BoundedRetry;

/// 組合完整案件資料：詳細頁 + docket 分頁 + 進階搜尋欄位
pub struct CaseDetailAssembler<'a, F: HttpFetch> {
    fetch: &'a F,
    config: &'a PortalConfig,
}

impl<'a, F: HttpFetch> CaseDetailAssembler<'a, F> {
    pub fn new(fetch: &'a F, config: &'a PortalConfig) -> Self {
        Self { fetch, config }
    }

    pub async fn assemble(
        &self,
        slot: &mut BrowserSlot,
        case_number: &str,
        cancel: &Cancellation,
    ) -> Result<CaseDetail> {
        let url = self.config.case_url(case_number)?;
        cancel.check("case detail")?;
        tracing::info!("📄 Fetching case {}", case_number);

        let page = self.fetch.get_text(&url, &[]).await?;
        let DetailPage {
            mut detail,
            docket_available,
            docket_last_page,
        } = parse_detail(&page, case_number)?;

        if docket_available {
            let more = PaginationWalker::new(self.fetch, self.config)
                .docket_pages(case_number, docket_last_page, cancel)
                .await?;
            detail.docket.extend(more);
        }

        let secondary = self.secondary_lookup(slot, case_number, cancel).await?;
        merge_secondary(&mut detail.fields, secondary);

        tracing::info!(
            "✅ Case {} assembled: {} fields, {} docket rows",
            case_number,
            detail.fields.len(),
            detail.docket.len()
        );
        Ok(detail)
    }

    /// Advanced search row for `case_number`, retried while the portal
    /// returns an empty result set.
    pub async fn secondary_lookup(
        &self,
        slot: &mut BrowserSlot,
        case_number: &str,
        cancel: &Cancellation,
    ) -> Result<FieldMap> {
        let result = self.search_advanced(slot, case_number, cancel).await;
        slot.guard(result).await
    }

    async fn search_advanced(
        &self,
        slot: &mut BrowserSlot,
        case_number: &str,
        cancel: &Cancellation,
    ) -> Result<FieldMap> {
        let mut url = self.config.endpoint(&self.config.portal.advanced_search_path)?;
        url.query_pairs_mut()
            .append_pair(contract::ADVANCED_SEARCH_TERM_PARAM, case_number);

        let waited = self.config.results_timeout();
        let mut retry = BoundedRetry::new(self.config.assembler.secondary_retry);

        while let Some(attempt) = retry.next_attempt(cancel, "advanced search").await? {
            let session = slot.session().await?;
            session.navigate(&url).await?;

            let ready = tokio::select! {
                ready = session.wait_for_element(contract::RESULTS_WRAPPER, waited) => ready?,
                err = cancel.cancelled("advanced search") => return Err(err),
            };
            if !ready {
                tracing::debug!("⏳ {}: results wrapper missing (attempt {})", case_number, attempt);
                continue;
            }

            let body = session.page_source().await?;
            let Some(first) = parse_advanced_results(&body).into_iter().next() else {
                tracing::warn!("⚠️ {}: advanced search returned no rows (attempt {})", case_number, attempt);
                continue;
            };

            let found = first.get("case_number").map(String::as_str).unwrap_or_default();
            if found != case_number {
                return Err(PortalError::AssertionViolation {
                    expected: case_number.to_string(),
                    found: found.to_string(),
                });
            }

            tracing::debug!("🔎 {}: advanced search matched on attempt {}", case_number, attempt);
            return Ok(first);
        }

        Err(PortalError::SecondarySearchExhausted {
            case_number: case_number.to_string(),
            attempts: retry.attempts_made(),
        })
    }
}

/// Fields already read from the detail page are kept as they are.
pub fn merge_secondary(fields: &mut FieldMap, secondary: FieldMap) {
    for (key, value) in secondary {
        if value.is_empty() {
            continue;
        }
        fields.entry(key).or_insert(value);
    }
}
