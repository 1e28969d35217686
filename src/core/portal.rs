use crate::adapters::browser::BrowserSlot;
use crate::config::PortalConfig;
use crate::core::assembler::CaseDetailAssembler;
use crate::core::csv_rows::CaseRows;
use crate::core::export::BulkExportOrchestrator;
use crate::core::paginate::PaginationWalker;
use crate::core::params::SearchParams;
use crate::domain::model::{CaseDetail, CaseQuery, CaseSummary};
use crate::domain::ports::{BrowserLauncher, ExportObserver, HttpFetch};
use crate::utils::cancel::Cancellation;
use crate::utils::error::Result;
use futures::Stream;
use std::io::Cursor;
use url::Url;

/// Entry point tying the HTTP fetcher, the browser slot and the
/// configuration together. One client serves one caller at a time.
pub struct PortalClient<F: HttpFetch> {
    fetch: F,
    config: PortalConfig,
    browser: BrowserSlot,
}

impl<F: HttpFetch> PortalClient<F> {
    pub fn new<L: BrowserLauncher + 'static>(fetch: F, launcher: L, config: PortalConfig) -> Self {
        Self {
            fetch,
            config,
            browser: BrowserSlot::new(launcher),
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetch
    }

    /// 搜尋結果串流 (自動跟隨下一頁)
    pub fn search(&self, query: &CaseQuery) -> Result<impl Stream<Item = Result<CaseSummary>> + Send + '_> {
        let params = SearchParams::from_query(query);
        let start = self.config.endpoint(&self.config.portal.search_path)?;
        tracing::info!("🔍 Searching {} with {} parameter(s)", start, params.as_pairs().len());

        Ok(PaginationWalker::new(&self.fetch, &self.config).listing(start, params.as_pairs().to_vec()))
    }

    pub async fn case_detail(&mut self, case_number: &str, cancel: &Cancellation) -> Result<CaseDetail> {
        CaseDetailAssembler::new(&self.fetch, &self.config)
            .assemble(&mut self.browser, case_number, cancel)
            .await
    }

    /// Runs a bulk export and returns the URL of the generated file.
    pub async fn bulk_export(
        &mut self,
        query: &CaseQuery,
        observer: &dyn ExportObserver,
        cancel: &Cancellation,
    ) -> Result<Url> {
        let params = SearchParams::from_query(query);
        BulkExportOrchestrator::new(&self.fetch, &self.config)
            .run(&mut self.browser, &params, observer, cancel)
            .await
    }

    /// Bulk export followed by download; rows are read lazily from memory.
    pub async fn export_rows(
        &mut self,
        query: &CaseQuery,
        observer: &dyn ExportObserver,
        cancel: &Cancellation,
    ) -> Result<CaseRows<Cursor<Vec<u8>>>> {
        let url = self.bulk_export(query, observer, cancel).await?;
        CaseRows::fetch(&self.fetch, &url).await
    }

    /// Closes the browser session if one was opened.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.browser.shutdown().await
    }
}
