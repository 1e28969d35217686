use super::{dom, normalize_key};
use crate::core::contract;
use crate::domain::model::FieldMap;
use scraper::Html;

/// Rows of the advanced search results table as header → value maps.
/// A page without the results table yields no rows.
pub fn parse_advanced_results(body: &str) -> Vec<FieldMap> {
    let html = Html::parse_document(body);
    let Some(table) = html.select(&contract::ADVANCED_RESULTS_TABLE_SEL).next() else {
        return Vec::new();
    };

    let headers: Vec<String> = table
        .select(&contract::HEADER_CELL_SEL)
        .map(|th| normalize_key(&dom::element_text(th)))
        .collect();

    let mut rows = Vec::new();
    for row in table.select(&contract::BODY_ROW_SEL) {
        let mut fields = FieldMap::new();
        for (header, cell) in headers.iter().zip(row.select(&contract::CELL_SEL)) {
            if header.is_empty() {
                continue;
            }
            fields.insert(header.clone(), dom::element_text(cell));
        }
        if !fields.is_empty() {
            rows.push(fields);
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_keyed_by_normalized_headers() {
        let body = r#"<div class="results-wrapper"><table>
            <thead><tr><th>Case Number</th><th>Close Method</th><th>Number of Voters</th></tr></thead>
            <tbody><tr><td><a href="/case/05-RC-123456">05-RC-123456</a></td><td>Certification of Representative</td><td>42</td></tr></tbody>
        </table></div>"#;
        let rows = parse_advanced_results(body);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["case_number"], "05-RC-123456");
        assert_eq!(rows[0]["close_method"], "Certification of Representative");
        assert_eq!(rows[0]["number_of_voters"], "42");
    }

    #[test]
    fn test_no_table_means_no_rows() {
        let rows = parse_advanced_results("<div class=\"results-wrapper\"></div>");
        assert!(rows.is_empty());
    }
}
