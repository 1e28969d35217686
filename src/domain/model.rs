use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 正規化後的欄位 (key 小寫、空白換成底線)
pub type FieldMap = BTreeMap<String, String>;

/// Case family accepted by the search filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseCategory {
    /// Unfair labor practice charges.
    C,
    /// Representation petitions.
    R,
}

impl CaseCategory {
    pub fn code(&self) -> &'static str {
        match self {
            Self::C => "C",
            Self::R => "R",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
    Open,
    Closed,
    OpenBlocked,
}

impl CaseStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::OpenBlocked => "Open - Blocked",
        }
    }
}

/// Two-letter case type code embedded in a case number (`<region>-<TYPE>-<serial>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CaseType {
    RC,
    RM,
    RD,
    UD,
    UC,
    // Listed by the portal; its meaning is not documented alongside the others.
    CA,
    CD,
    CC,
    CB,
    CE,
    CP,
    CG,
    AC,
    WH,
}

impl CaseType {
    /// Classification order. Tokens are mutually exclusive, the order only
    /// fixes which one wins on malformed input.
    pub const ALL: [CaseType; 14] = [
        CaseType::RC,
        CaseType::RM,
        CaseType::RD,
        CaseType::UD,
        CaseType::UC,
        CaseType::CA,
        CaseType::CD,
        CaseType::CC,
        CaseType::CB,
        CaseType::CE,
        CaseType::CP,
        CaseType::CG,
        CaseType::AC,
        CaseType::WH,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::RC => "RC",
            Self::RM => "RM",
            Self::RD => "RD",
            Self::UD => "UD",
            Self::UC => "UC",
            Self::CA => "CA",
            Self::CD => "CD",
            Self::CC => "CC",
            Self::CB => "CB",
            Self::CE => "CE",
            Self::CP => "CP",
            Self::CG => "CG",
            Self::AC => "AC",
            Self::WH => "WH",
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Immutable search query. Build with [`CaseQuery::builder`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseQuery {
    case_types: Vec<CaseCategory>,
    statuses: Vec<CaseStatus>,
    date_start: Option<NaiveDate>,
    date_end: Option<NaiveDate>,
}

impl CaseQuery {
    pub fn builder() -> CaseQueryBuilder {
        CaseQueryBuilder::default()
    }

    pub fn case_types(&self) -> &[CaseCategory] {
        &self.case_types
    }

    pub fn statuses(&self) -> &[CaseStatus] {
        &self.statuses
    }

    pub fn date_start(&self) -> Option<NaiveDate> {
        self.date_start
    }

    pub fn date_end(&self) -> Option<NaiveDate> {
        self.date_end
    }
}

#[derive(Debug, Clone, Default)]
pub struct CaseQueryBuilder {
    query: CaseQuery,
}

impl CaseQueryBuilder {
    pub fn case_type(mut self, category: CaseCategory) -> Self {
        if !self.query.case_types.contains(&category) {
            self.query.case_types.push(category);
        }
        self
    }

    pub fn case_types<I: IntoIterator<Item = CaseCategory>>(self, categories: I) -> Self {
        categories.into_iter().fold(self, |b, c| b.case_type(c))
    }

    pub fn status(mut self, status: CaseStatus) -> Self {
        if !self.query.statuses.contains(&status) {
            self.query.statuses.push(status);
        }
        self
    }

    pub fn statuses<I: IntoIterator<Item = CaseStatus>>(self, statuses: I) -> Self {
        statuses.into_iter().fold(self, |b, s| b.status(s))
    }

    pub fn date_start(mut self, date: NaiveDate) -> Self {
        self.query.date_start = Some(date);
        self
    }

    pub fn date_end(mut self, date: NaiveDate) -> Self {
        self.query.date_end = Some(date);
        self
    }

    pub fn build(self) -> CaseQuery {
        self.query
    }
}

/// 搜尋結果列表中的一筆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub name: String,
    pub case_number: String,
    pub case_type: CaseType,
    pub detail_url: String,
    pub date_filed: Option<NaiveDate>,
    pub fields: FieldMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocketEntry {
    /// `None` when the portal shows its pre-2010 placeholder instead of a date.
    pub date: Option<NaiveDate>,
    pub document: String,
    pub document_url: Option<String>,
    pub filed_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedDocument {
    pub title: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub kind: String,
    pub role: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedCase {
    pub case_number: String,
    pub url: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
}

/// Full case record assembled from the detail page, docket pages and the
/// advanced search lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDetail {
    pub name: String,
    pub case_number: String,
    pub case_type: CaseType,
    pub detail_url: String,
    pub fields: FieldMap,
    pub tallies: Vec<FieldMap>,
    pub docket: Vec<DocketEntry>,
    pub related_documents: Vec<RelatedDocument>,
    pub allegations: Vec<String>,
    pub participants: Vec<Participant>,
    pub related_cases: Vec<RelatedCase>,
}

/// Server-side export job. Lives only for one bulk-export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    pub cache_id: String,
    pub type_of_report: String,
    pub download_token: String,
    pub job_id: String,
    pub total: u64,
    pub processed: u64,
    pub finished: bool,
    pub filename: Option<String>,
}

/// 一列匯出的 CSV 資料
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRow {
    pub case_type: CaseType,
    pub fields: std::collections::HashMap<String, String>,
}

impl CaseRow {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields.get(header).map(String::as_str)
    }
}
