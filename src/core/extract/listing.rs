use super::{dom, FieldAccumulator};
use crate::core::contract;
use crate::domain::model::CaseSummary;
use crate::domain::ports::FetchedPage;
use crate::utils::error::{PortalError, Result};
use scraper::Html;
use url::Url;

/// One page of search results plus the link to the next page, if any.
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub summaries: Vec<CaseSummary>,
    pub next_page: Option<Url>,
}

pub fn parse_listing(page: &FetchedPage) -> Result<ListingPage> {
    let html = Html::parse_document(&page.body);
    let mut summaries = Vec::new();

    for (index, block) in html.select(&contract::RESULT_BLOCK_SEL).enumerate() {
        let context = format!("search result {} on {}", index + 1, page.url);
        let mut acc = FieldAccumulator::new(context.clone());

        let names: Vec<_> = block.select(&contract::RESULT_NAME_SEL).collect();
        match names.as_slice() {
            [name] => acc.set_name(dom::element_text(*name)),
            other => {
                return Err(PortalError::structural(
                    context,
                    format!("expected exactly one name element, found {}", other.len()),
                ))
            }
        }

        let labels = block
            .select(&contract::LEFT_COLUMN_LABEL_SEL)
            .chain(block.select(&contract::RIGHT_COLUMN_LABEL_SEL));
        for label in labels {
            acc.visit_label(label, &page.url)?;
        }

        summaries.push(acc.finish_summary()?);
    }

    let next_page = match html.select(&contract::NEXT_PAGE_SEL).next() {
        Some(link) => match link.value().attr("href") {
            Some(href) => Some(dom::resolve(&page.url, href)?),
            None => None,
        },
        None => None,
    };

    tracing::debug!(
        "📄 Parsed {} results from {} (next page: {})",
        summaries.len(),
        page.url,
        next_page.is_some()
    );

    Ok(ListingPage {
        summaries,
        next_page,
    })
}
