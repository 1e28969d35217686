use crate::core::classifier::classify;
use crate::domain::model::CaseRow;
use crate::domain::ports::HttpFetch;
use crate::utils::error::{PortalError, Result};
use csv::StringRecord;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;
use url::Url;

pub const CASE_NUMBER_HEADER: &str = "Case Number";

/// Forward-only reader over an exported case CSV. Each row is tagged with
/// the case type classified from its `Case Number` column.
pub struct CaseRows<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    case_number_index: usize,
    record: StringRecord,
    line: u64,
}

impl<R: Read> CaseRows<R> {
    pub fn from_reader(source: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(source);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let case_number_index = headers
            .iter()
            .position(|h| h == CASE_NUMBER_HEADER)
            .ok_or_else(|| {
                PortalError::structural(
                    "export csv",
                    format!("missing '{}' column", CASE_NUMBER_HEADER),
                )
            })?;

        Ok(Self {
            reader,
            headers,
            case_number_index,
            record: StringRecord::new(),
            line: 1,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn next_row(&mut self) -> Result<Option<CaseRow>> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }
        self.line += 1;

        let case_number = self.record.get(self.case_number_index).unwrap_or("").trim();
        if case_number.is_empty() {
            return Err(PortalError::structural(
                "export csv",
                format!("row {} has no case number", self.line),
            ));
        }
        let case_type = classify(case_number)?;

        let fields: HashMap<String, String> = self
            .headers
            .iter()
            .zip(self.record.iter())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();

        Ok(Some(CaseRow { case_type, fields }))
    }
}

impl CaseRows<Cursor<Vec<u8>>> {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Downloads an export file and reads it from memory.
    pub async fn fetch<F: HttpFetch>(fetch: &F, url: &Url) -> Result<Self> {
        tracing::info!("⬇️ Downloading export file {}", url);
        let bytes = fetch.get_bytes(url).await?;
        tracing::debug!("Export file is {} bytes", bytes.len());
        Self::from_bytes(bytes)
    }
}

impl CaseRows<std::fs::File> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read> Iterator for CaseRows<R> {
    type Item = Result<CaseRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}
