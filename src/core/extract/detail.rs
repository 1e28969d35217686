use super::{docket, dom, FieldAccumulator};
use crate::core::classifier::classify;
use crate::core::contract;
use crate::domain::model::{CaseDetail, FieldMap, Participant, RelatedCase, RelatedDocument};
use crate::domain::ports::FetchedPage;
use crate::utils::error::{PortalError, Result};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Everything the detail page itself yields. Docket pages beyond the first
/// are fetched separately using `docket_last_page`.
#[derive(Debug, Clone)]
pub struct DetailPage {
    pub detail: CaseDetail,
    pub docket_available: bool,
    pub docket_last_page: Option<u32>,
}

pub fn parse_detail(page: &FetchedPage, case_number: &str) -> Result<DetailPage> {
    let html = Html::parse_document(&page.body);
    let base = &page.url;

    // The portal's own 404 page has no case title.
    let name = html
        .select(&contract::PAGE_TITLE_SEL)
        .next()
        .map(dom::element_text)
        .ok_or_else(|| PortalError::NotFound {
            what: format!("case {}", case_number),
        })?;

    let case_type = classify(case_number)?;

    let basic = html
        .select(&contract::BASIC_INFO_SEL)
        .next()
        .ok_or_else(|| PortalError::structural("case detail", "basic info block not found"))?;
    let fields = labeled_fields(basic, base, "basic info")?;

    let mut tallies = Vec::new();
    for (index, block) in html.select(&contract::TALLY_BLOCK_SEL).enumerate() {
        let tally = labeled_fields(block, base, &format!("tally {}", index + 1))?;
        if !tally.is_empty() {
            tallies.push(tally);
        }
    }

    let docket_section = section(
        &html,
        &contract::DOCKET_SECTION_SEL,
        contract::DOCKET_UNAVAILABLE,
        "docket activity",
    )?;
    let (docket, docket_last_page) = match docket_section {
        Some(container) => {
            let table = container
                .select(&contract::TABLE_SEL)
                .next()
                .ok_or_else(|| PortalError::structural("docket activity", "no table"))?;
            let rows = docket::parse_docket_table(table, base)?;
            (rows, docket_last_page(container, base))
        }
        None => (Vec::new(), None),
    };

    let related_documents = match section(
        &html,
        &contract::RELATED_DOCUMENTS_SECTION_SEL,
        contract::RELATED_DOCUMENTS_UNAVAILABLE,
        "related documents",
    )? {
        Some(container) => parse_related_documents(container, base)?,
        None => Vec::new(),
    };

    let allegations = match section(
        &html,
        &contract::ALLEGATIONS_SECTION_SEL,
        contract::ALLEGATIONS_UNAVAILABLE,
        "allegations",
    )? {
        Some(container) => container
            .select(&contract::LIST_ITEM_SEL)
            .map(dom::element_text)
            .filter(|text| !text.is_empty())
            .collect(),
        None => Vec::new(),
    };

    let participants = match section(
        &html,
        &contract::PARTICIPANTS_SECTION_SEL,
        contract::PARTICIPANTS_UNAVAILABLE,
        "participants",
    )? {
        Some(container) => parse_participants(container)?,
        None => Vec::new(),
    };

    let related_cases = match html.select(&contract::RELATED_CASES_SECTION_SEL).next() {
        Some(container) => parse_related_cases(container, base)?,
        None => Vec::new(),
    };

    tracing::debug!(
        "📄 {}: {} fields, {} tallies, {} docket rows, {} documents, {} allegations, {} participants",
        case_number,
        fields.len(),
        tallies.len(),
        docket.len(),
        related_documents.len(),
        allegations.len(),
        participants.len()
    );

    Ok(DetailPage {
        detail: CaseDetail {
            name,
            case_number: case_number.to_string(),
            case_type,
            detail_url: base.to_string(),
            fields,
            tallies,
            docket,
            related_documents,
            allegations,
            participants,
            related_cases,
        },
        docket_available: docket_section.is_some(),
        docket_last_page,
    })
}

fn labeled_fields(block: ElementRef<'_>, base: &Url, context: &str) -> Result<FieldMap> {
    let mut acc = FieldAccumulator::new(context);
    for label in block.select(&contract::FIELD_LABEL_SEL) {
        acc.visit_label(label, base)?;
    }
    Ok(acc.into_fields())
}

/// Finds an optional section's container. `None` means the portal marked the
/// section as having no data.
///
/// A missing container is a layout change and fails the whole record. It must
/// not be read as an empty section, or rows the portal still has go missing.
fn section<'a>(
    html: &'a Html,
    selector: &Selector,
    unavailable_marker: &str,
    name: &str,
) -> Result<Option<ElementRef<'a>>> {
    let container = html
        .select(selector)
        .next()
        .ok_or_else(|| PortalError::structural(name, "section container not found"))?;

    if dom::element_text(container).contains(unavailable_marker) {
        tracing::debug!("📭 Section '{}' has no data", name);
        return Ok(None);
    }
    Ok(Some(container))
}

fn docket_last_page(container: ElementRef<'_>, base: &Url) -> Option<u32> {
    let link = container.select(&contract::DOCKET_LAST_PAGE_SEL).next()?;
    let href = link.value().attr("href")?;
    let last_page = docket::last_page_index(href, base);
    if last_page.is_none() {
        tracing::warn!("⚠️ Docket pager link '{}' has no usable page index", href);
    }
    last_page
}

fn parse_related_documents(container: ElementRef<'_>, base: &Url) -> Result<Vec<RelatedDocument>> {
    let mut documents = Vec::new();
    for item in container.select(&contract::LIST_ITEM_SEL) {
        let document = match item.select(&contract::LINK_SEL).next() {
            Some(link) => RelatedDocument {
                title: dom::element_text(link),
                url: dom::absolute_href(link, base)?,
            },
            None => RelatedDocument {
                title: dom::element_text(item),
                url: None,
            },
        };
        if !document.title.is_empty() {
            documents.push(document);
        }
    }
    Ok(documents)
}

fn parse_participants(container: ElementRef<'_>) -> Result<Vec<Participant>> {
    let mut participants = Vec::new();

    for (index, row) in container.select(&contract::BODY_ROW_SEL).enumerate() {
        let cells: Vec<_> = row.select(&contract::CELL_SEL).collect();
        if cells.is_empty() {
            continue;
        }

        let mut identity = dom::lines_of(cells[0]).into_iter();
        let kind = identity.next().ok_or_else(|| {
            PortalError::structural(
                "participants",
                format!("row {} has an empty participant cell", index + 1),
            )
        })?;
        let role = identity.next();
        let name = identity.collect::<Vec<_>>().join(" ");

        let address = cells
            .get(1)
            .map(|cell| dom::lines_of(*cell).join(", "))
            .filter(|text| !text.is_empty());
        let phone = cells
            .get(2)
            .map(|cell| dom::element_text(*cell))
            .filter(|text| !text.is_empty());

        participants.push(Participant {
            kind,
            role,
            name: Some(name).filter(|n| !n.is_empty()),
            address,
            phone,
        });
    }

    Ok(participants)
}

fn parse_related_cases(container: ElementRef<'_>, base: &Url) -> Result<Vec<RelatedCase>> {
    let mut cases = Vec::new();
    for row in container.select(&contract::BODY_ROW_SEL) {
        let cells: Vec<_> = row.select(&contract::CELL_SEL).collect();
        let Some(first) = cells.first() else {
            continue;
        };

        let (case_number, url) = match first.select(&contract::LINK_SEL).next() {
            Some(link) => (dom::element_text(link), dom::absolute_href(link, base)?),
            None => (dom::element_text(*first), None),
        };
        if case_number.is_empty() {
            continue;
        }

        let text_at = |i: usize| {
            cells
                .get(i)
                .map(|cell| dom::element_text(*cell))
                .filter(|text| !text.is_empty())
        };

        cases.push(RelatedCase {
            case_number,
            url,
            name: text_at(1),
            status: text_at(2),
        });
    }
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> FetchedPage {
        FetchedPage {
            url: Url::parse("https://www.nlrb.gov/case/05-CA-123456").unwrap(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_missing_title_is_not_found() {
        let err = parse_detail(&page("<html><body><h1>Page not found</h1></body></html>"), "05-CA-123456")
            .unwrap_err();
        assert!(matches!(err, PortalError::NotFound { .. }));
        assert_eq!(err.http_status(), Some(404));
    }

    #[test]
    fn test_missing_section_container_is_structural() {
        let body = r#"<h1 class="uswds-page-title">Acme</h1>
            <div class="case-basic-info"><strong>Status:</strong> Open</div>"#;
        let err = parse_detail(&page(body), "05-CA-123456").unwrap_err();
        assert!(matches!(err, PortalError::StructuralExtraction { .. }));
    }

    #[test]
    fn test_missing_allegations_container_fails_record() {
        let body = r#"<h1 class="uswds-page-title">Hilltop Diner</h1>
            <div class="case-basic-info"><strong>Case Number:</strong> 31-CB-000042</div>
            <div id="case-docket-activity"><p>Docket Activity data is not available</p></div>
            <div id="case-related-documents"><p>Related Documents data is not available</p></div>
            <div id="case-participants"><p>Participants data is not available</p></div>"#;

        match parse_detail(&page(body), "31-CB-000042").unwrap_err() {
            PortalError::StructuralExtraction { context, message } => {
                assert_eq!(context, "allegations");
                assert_eq!(message, "section container not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_participant_cells_split_on_line_breaks() {
        let html = Html::parse_fragment(
            r#"<div id="case-participants"><table><tbody>
            <tr><td>Charging Party<br>Union<br>Teamsters Local 355</td><td>123 Main St<br>Baltimore, MD 21201</td><td>(410) 555-0100</td></tr>
            <tr><td>Charged Party / Respondent<br>Employer<br>Acme Widgets, Inc.</td><td></td><td></td></tr>
            </tbody></table></div>"#,
        );
        let container = html.select(&contract::PARTICIPANTS_SECTION_SEL).next().unwrap();
        let participants = parse_participants(container).unwrap();

        assert_eq!(participants.len(), 2);
        assert_eq!(participants[0].kind, "Charging Party");
        assert_eq!(participants[0].role.as_deref(), Some("Union"));
        assert_eq!(participants[0].name.as_deref(), Some("Teamsters Local 355"));
        assert_eq!(
            participants[0].address.as_deref(),
            Some("123 Main St, Baltimore, MD 21201")
        );
        assert_eq!(participants[0].phone.as_deref(), Some("(410) 555-0100"));
        assert!(participants[1].address.is_none());
    }
}
