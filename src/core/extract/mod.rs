//! HTML → record extraction for search listings, case detail pages, docket
//! fragments and advanced search results.
//!
//! Extractors are synchronous and return owned records, so parsed documents
//! never live across an `.await`.

pub mod advanced;
pub mod detail;
pub mod docket;
pub mod dom;
pub mod listing;

pub use advanced::parse_advanced_results;
pub use detail::{parse_detail, DetailPage};
pub use docket::{parse_docket_response, parse_docket_table};
pub use listing::{parse_listing, ListingPage};

use crate::core::classifier::classify;
use crate::domain::model::{CaseSummary, FieldMap};
use crate::utils::error::{PortalError, Result};
use chrono::NaiveDate;
use scraper::ElementRef;
use url::Url;

const LISTING_DATE_FORMAT: &str = "%B %d, %Y";

/// Lower-cases a label and replaces spaces with underscores.
pub fn normalize_key(label: &str) -> String {
    dom::collapse(label).to_lowercase().replace(' ', "_")
}

/// Collects `<strong>Label:</strong> value` pairs for one record and is
/// finalized once every label has been visited, so a missing required field
/// surfaces as a single structural error.
#[derive(Debug, Default)]
pub struct FieldAccumulator {
    context: String,
    name: Option<String>,
    case_number: Option<String>,
    detail_url: Option<String>,
    date_filed: Option<NaiveDate>,
    fields: FieldMap,
}

impl FieldAccumulator {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            ..Default::default()
        }
    }

    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub fn visit_label(&mut self, label_el: ElementRef<'_>, base: &Url) -> Result<()> {
        let label = dom::element_text(label_el)
            .trim_matches(|c: char| c == ':' || c.is_whitespace())
            .to_lowercase();

        match label.as_str() {
            "" => {}
            "case number" => {
                let link = dom::next_element(label_el).filter(|el| el.value().name() == "a");
                let (number, url) = match link {
                    Some(link) => (dom::element_text(link), dom::absolute_href(link, base)?),
                    None => (dom::tail_text(label_el), None),
                };
                if number.is_empty() {
                    return Err(PortalError::structural(
                        &self.context,
                        "'Case Number' label has no value",
                    ));
                }
                self.case_number = Some(number);
                if url.is_some() {
                    self.detail_url = url;
                }
            }
            "date filed" => {
                let raw = dom::tail_text(label_el);
                let date = NaiveDate::parse_from_str(&raw, LISTING_DATE_FORMAT).map_err(|e| {
                    PortalError::structural(
                        &self.context,
                        format!("unparseable 'Date Filed' value '{}': {}", raw, e),
                    )
                })?;
                self.date_filed = Some(date);
            }
            other => {
                self.fields
                    .insert(normalize_key(other), dom::tail_text(label_el));
            }
        }

        Ok(())
    }

    pub fn finish_summary(self) -> Result<CaseSummary> {
        let missing = |field: &str| {
            PortalError::structural(&self.context, format!("missing required field '{}'", field))
        };

        let name = self.name.clone().ok_or_else(|| missing("name"))?;
        let case_number = self.case_number.clone().ok_or_else(|| missing("case number"))?;
        let detail_url = self.detail_url.clone().ok_or_else(|| missing("case link"))?;
        let case_type = classify(&case_number)?;

        Ok(CaseSummary {
            name,
            case_number,
            case_type,
            detail_url,
            date_filed: self.date_filed,
            fields: self.fields,
        })
    }

    /// Flattens everything visited into one normalized map.
    pub fn into_fields(self) -> FieldMap {
        let mut fields = self.fields;
        if let Some(case_number) = self.case_number {
            fields.insert("case_number".to_string(), case_number);
        }
        if let Some(date) = self.date_filed {
            fields.insert("date_filed".to_string(), date.to_string());
        }
        fields
    }
}
