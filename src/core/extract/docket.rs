use super::dom;
use crate::core::contract;
use crate::domain::model::DocketEntry;
use crate::utils::error::{PortalError, Result};
use chrono::NaiveDate;
use scraper::{ElementRef, Html};
use url::Url;

const DOCKET_DATE_FORMAT: &str = "%m/%d/%Y";

/// Rows of one docket table, in the order the portal serves them.
pub fn parse_docket_table(table: ElementRef<'_>, base: &Url) -> Result<Vec<DocketEntry>> {
    let mut entries = Vec::new();

    for (index, row) in table.select(&contract::BODY_ROW_SEL).enumerate() {
        let cells: Vec<_> = row.select(&contract::CELL_SEL).collect();
        if cells.is_empty() {
            continue;
        }
        if cells.len() < 2 {
            return Err(PortalError::structural(
                "docket activity",
                format!("row {} has {} cells, expected at least 2", index + 1, cells.len()),
            ));
        }

        let date = parse_docket_date(&dom::element_text(cells[0]))?;

        let (document, document_url) = match cells[1].select(&contract::LINK_SEL).next() {
            Some(link) => (dom::element_text(link), dom::absolute_href(link, base)?),
            None => (dom::element_text(cells[1]), None),
        };

        let filed_by = cells
            .get(2)
            .map(|cell| dom::element_text(*cell))
            .filter(|text| !text.is_empty());

        entries.push(DocketEntry {
            date,
            document,
            document_url,
            filed_by,
        });
    }

    Ok(entries)
}

fn parse_docket_date(raw: &str) -> Result<Option<NaiveDate>> {
    if raw.to_lowercase().contains(contract::PRE_2010_MARKER) {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, DOCKET_DATE_FORMAT)
        .map(Some)
        .map_err(|e| {
            PortalError::structural("docket activity", format!("bad date '{}': {}", raw, e))
        })
}

/// Parses the sort-and-paginate response: a JSON array of AJAX commands whose
/// fourth element carries the docket table as an HTML fragment.
pub fn parse_docket_response(response: &serde_json::Value, base: &Url) -> Result<Vec<DocketEntry>> {
    let fragment = response
        .as_array()
        .and_then(|commands| commands.get(contract::DOCKET_COMMAND_INDEX))
        .and_then(|command| command.get("data"))
        .and_then(|data| data.as_str())
        .ok_or_else(|| {
            PortalError::structural(
                "docket page response",
                format!(
                    "expected an array whose element {} has a string 'data' field",
                    contract::DOCKET_COMMAND_INDEX
                ),
            )
        })?;

    let html = Html::parse_fragment(fragment);
    let table = html
        .select(&contract::TABLE_SEL)
        .next()
        .ok_or_else(|| PortalError::structural("docket page response", "fragment has no table"))?;

    parse_docket_table(table, base)
}

/// Page index carried by the docket pager's "last page" link (`?page=N`).
pub fn last_page_index(href: &str, base: &Url) -> Option<u32> {
    let url = dom::resolve(base, href).ok()?;
    let page = url
        .query_pairs()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.into_owned())?;
    page.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Url {
        Url::parse("https://www.nlrb.gov/case/05-CA-123456").unwrap()
    }

    const TABLE: &str = r#"
<table>
  <thead><tr><th>Date</th><th>Document</th><th>Party</th></tr></thead>
  <tbody>
    <tr><td>03/15/2021</td><td><a href="/cases/docs/complaint.pdf">Complaint and Notice of Hearing</a></td><td>NLRB - GC</td></tr>
    <tr><td>02/01/2021</td><td>Charge Against Employer</td><td></td></tr>
    <tr><td>*Pre-2010 Activity</td><td>Historical record</td><td>Employer</td></tr>
  </tbody>
</table>"#;

    #[test]
    fn test_parse_docket_rows_in_order() {
        let html = Html::parse_fragment(TABLE);
        let table = html.select(&contract::TABLE_SEL).next().unwrap();
        let entries = parse_docket_table(table, &base()).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].date, NaiveDate::from_ymd_opt(2021, 3, 15));
        assert_eq!(
            entries[0].document_url.as_deref(),
            Some("https://www.nlrb.gov/cases/docs/complaint.pdf")
        );
        assert_eq!(entries[0].filed_by.as_deref(), Some("NLRB - GC"));
        assert_eq!(entries[1].document, "Charge Against Employer");
        assert!(entries[1].document_url.is_none());
        assert!(entries[1].filed_by.is_none());
        assert!(entries[2].date.is_none());
    }

    #[test]
    fn test_parse_docket_response_uses_fourth_command() {
        let response = json!([
            {"command": "settings"},
            {"command": "add_css"},
            {"command": "invoke"},
            {"command": "insert", "data": TABLE}
        ]);
        let entries = parse_docket_response(&response, &base()).unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_short_response_is_structural_error() {
        let response = json!([{"command": "settings"}]);
        assert!(parse_docket_response(&response, &base()).is_err());
    }

    #[test]
    fn test_bad_date_is_structural_error() {
        let html = Html::parse_fragment(
            "<table><tbody><tr><td>yesterday</td><td>Doc</td></tr></tbody></table>",
        );
        let table = html.select(&contract::TABLE_SEL).next().unwrap();
        assert!(parse_docket_table(table, &base()).is_err());
    }

    #[test]
    fn test_last_page_index() {
        assert_eq!(last_page_index("?page=3", &base()), Some(3));
        assert_eq!(last_page_index("/case/05-CA-123456?sort=date&page=12", &base()), Some(12));
        assert_eq!(last_page_index("?page=last", &base()), None);
        assert_eq!(last_page_index("?sort=date", &base()), None);
    }
}
