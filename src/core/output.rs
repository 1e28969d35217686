use crate::core::csv_rows::CaseRows;
use crate::domain::model::{CaseSummary, CaseType};
use crate::utils::error::{PortalError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

pub const CASE_TYPE_HEADER: &str = "Case Type";

const SUMMARY_COLUMNS: [&str; 5] = ["name", "case_number", "case_type", "url", "date_filed"];

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| PortalError::IoError(e.into_error()))
}

/// Search results as CSV: fixed columns first, then every extra field seen
/// in any summary, sorted by name.
pub fn summaries_csv(summaries: &[CaseSummary]) -> Result<Vec<u8>> {
    let extra: BTreeSet<&str> = summaries
        .iter()
        .flat_map(|s| s.fields.keys().map(String::as_str))
        .filter(|key| !SUMMARY_COLUMNS.contains(key))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(SUMMARY_COLUMNS.iter().copied().chain(extra.iter().copied()))?;

    for summary in summaries {
        let date_filed = summary
            .date_filed
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let mut record = vec![
            summary.name.clone(),
            summary.case_number.clone(),
            summary.case_type.to_string(),
            summary.detail_url.clone(),
            date_filed,
        ];
        record.extend(
            extra
                .iter()
                .map(|key| summary.fields.get(*key).cloned().unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    into_bytes(writer)
}

/// Export rows re-emitted with a trailing `Case Type` column, plus per-type counts.
pub fn rows_with_type_csv<R: Read>(rows: CaseRows<R>) -> Result<(Vec<u8>, BTreeMap<CaseType, usize>)> {
    let headers = rows.headers().to_vec();
    let mut counts = BTreeMap::new();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers.iter().map(String::as_str).chain([CASE_TYPE_HEADER]))?;

    for row in rows {
        let row = row?;
        *counts.entry(row.case_type).or_insert(0) += 1;

        let mut record: Vec<&str> = headers
            .iter()
            .map(|h| row.get(h).unwrap_or(""))
            .collect();
        record.push(row.case_type.code());
        writer.write_record(&record)?;
    }

    Ok((into_bytes(writer)?, counts))
}

pub fn count_by_type<R: Read>(rows: CaseRows<R>) -> Result<BTreeMap<CaseType, usize>> {
    let mut counts = BTreeMap::new();
    for row in rows {
        *counts.entry(row?.case_type).or_insert(0) += 1;
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::FieldMap;
    use chrono::NaiveDate;

    #[test]
    fn test_summaries_csv_adds_sorted_extra_columns() {
        let summary = CaseSummary {
            name: "Acme, Inc.".to_string(),
            case_number: "05-CA-123456".to_string(),
            case_type: CaseType::CA,
            detail_url: "https://www.nlrb.gov/case/05-CA-123456".to_string(),
            date_filed: NaiveDate::from_ymd_opt(2021, 3, 4),
            fields: FieldMap::from([
                ("status".to_string(), "Open".to_string()),
                ("region_assigned".to_string(), "Region 05".to_string()),
                ("case_number".to_string(), "05-CA-123456".to_string()),
            ]),
        };

        let csv = String::from_utf8(summaries_csv(&[summary]).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("name,case_number,case_type,url,date_filed,region_assigned,status")
        );
        assert_eq!(
            lines.next(),
            Some("\"Acme, Inc.\",05-CA-123456,CA,https://www.nlrb.gov/case/05-CA-123456,2021-03-04,Region 05,Open")
        );
    }

    #[test]
    fn test_rows_with_type_appends_column_and_counts() {
        let rows = CaseRows::from_bytes(
            b"Name,Case Number\nAcme,05-CA-1\nHarbor,22-RC-2\nBolt,07-CA-3\n".to_vec(),
        )
        .unwrap();

        let (bytes, counts) = rows_with_type_csv(rows).unwrap();
        let csv = String::from_utf8(bytes).unwrap();

        assert!(csv.starts_with("Name,Case Number,Case Type\n"));
        assert!(csv.contains("Harbor,22-RC-2,RC\n"));
        assert_eq!(counts[&CaseType::CA], 2);
        assert_eq!(counts[&CaseType::RC], 1);
    }
}
