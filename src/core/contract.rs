//! The portal's HTML contract: every selector, attribute and marker text the
//! extractors depend on. When the portal changes its markup, this is the file
//! to update.

use scraper::Selector;
use std::sync::LazyLock;

fn sel(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid contract selector {css:?}: {e:?}"))
}

// Search listing
pub const RESULT_BLOCK: &str = "div.wrapper-div";
pub const RESULT_NAME: &str = "div.type-div a";
pub const LEFT_COLUMN_LABEL: &str = "div.left-div > strong";
pub const RIGHT_COLUMN_LABEL: &str = "div.right-div > strong";
pub const NEXT_PAGE: &str = "a[rel=\"next\"]";

// Case detail page
pub const PAGE_TITLE: &str = "h1.uswds-page-title";
pub const BASIC_INFO: &str = "div.case-basic-info";
pub const TALLY_BLOCK: &str = "div.tally-div";
pub const FIELD_LABEL: &str = "strong";

pub const DOCKET_SECTION: &str = "#case-docket-activity";
pub const RELATED_DOCUMENTS_SECTION: &str = "#case-related-documents";
pub const ALLEGATIONS_SECTION: &str = "#case-allegations";
pub const PARTICIPANTS_SECTION: &str = "#case-participants";
pub const RELATED_CASES_SECTION: &str = "#case-related-cases";

pub const DOCKET_LAST_PAGE: &str = "li.pager__item--last a";

// Marker text the portal puts inside an empty section container
pub const DOCKET_UNAVAILABLE: &str = "Docket Activity data is not available";
pub const RELATED_DOCUMENTS_UNAVAILABLE: &str = "Related Documents data is not available";
pub const ALLEGATIONS_UNAVAILABLE: &str = "Allegations data is not available";
pub const PARTICIPANTS_UNAVAILABLE: &str = "Participants data is not available";

/// Docket date cell shown for activity recorded before the 2010 system migration.
pub const PRE_2010_MARKER: &str = "pre-2010";

// Advanced search (secondary lookup)
pub const RESULTS_WRAPPER: &str = "div.results-wrapper";
pub const ADVANCED_RESULTS_TABLE: &str = "div.results-wrapper table";
pub const ADVANCED_SEARCH_TERM_PARAM: &str = "search_term";

// Bulk export
pub const DOWNLOAD_BUTTON: &str = "#download-button";
pub const CACHE_ID_ATTR: &str = "data-cacheid";
pub const REPORT_TYPE_ATTR: &str = "data-typeofreport";

/// Index of the AJAX command carrying the docket table in the paginate response.
pub const DOCKET_COMMAND_INDEX: usize = 3;

pub static RESULT_BLOCK_SEL: LazyLock<Selector> = LazyLock::new(|| sel(RESULT_BLOCK));
pub static RESULT_NAME_SEL: LazyLock<Selector> = LazyLock::new(|| sel(RESULT_NAME));
pub static LEFT_COLUMN_LABEL_SEL: LazyLock<Selector> = LazyLock::new(|| sel(LEFT_COLUMN_LABEL));
pub static RIGHT_COLUMN_LABEL_SEL: LazyLock<Selector> =
    LazyLock::new(|| sel(RIGHT_COLUMN_LABEL));
pub static NEXT_PAGE_SEL: LazyLock<Selector> = LazyLock::new(|| sel(NEXT_PAGE));

pub static PAGE_TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| sel(PAGE_TITLE));
pub static BASIC_INFO_SEL: LazyLock<Selector> = LazyLock::new(|| sel(BASIC_INFO));
pub static TALLY_BLOCK_SEL: LazyLock<Selector> = LazyLock::new(|| sel(TALLY_BLOCK));
pub static FIELD_LABEL_SEL: LazyLock<Selector> = LazyLock::new(|| sel(FIELD_LABEL));

pub static DOCKET_SECTION_SEL: LazyLock<Selector> = LazyLock::new(|| sel(DOCKET_SECTION));
pub static RELATED_DOCUMENTS_SECTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| sel(RELATED_DOCUMENTS_SECTION));
pub static ALLEGATIONS_SECTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| sel(ALLEGATIONS_SECTION));
pub static PARTICIPANTS_SECTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| sel(PARTICIPANTS_SECTION));
pub static RELATED_CASES_SECTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| sel(RELATED_CASES_SECTION));
pub static DOCKET_LAST_PAGE_SEL: LazyLock<Selector> = LazyLock::new(|| sel(DOCKET_LAST_PAGE));

pub static ADVANCED_RESULTS_TABLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| sel(ADVANCED_RESULTS_TABLE));

pub static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| sel("table"));
pub static BODY_ROW_SEL: LazyLock<Selector> = LazyLock::new(|| sel("tbody > tr"));
pub static HEADER_CELL_SEL: LazyLock<Selector> = LazyLock::new(|| sel("thead th"));
pub static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| sel("td"));
pub static LIST_ITEM_SEL: LazyLock<Selector> = LazyLock::new(|| sel("li"));
pub static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| sel("a"));
