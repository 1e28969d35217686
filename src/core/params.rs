use crate::domain::model::CaseQuery;
use chrono::NaiveDate;

/// Start bound the portal assumes when only an end date is given.
pub const EPOCH_START: &str = "1/1/1960";

const DATE_FORMAT: &str = "%m/%d/%Y";

/// Ordered query parameters for the case search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    /// Builds parameters with "today" taken from the local clock.
    pub fn from_query(query: &CaseQuery) -> Self {
        Self::from_query_on(query, chrono::Local::now().date_naive())
    }

    /// Same as [`SearchParams::from_query`] with an explicit "today".
    pub fn from_query_on(query: &CaseQuery, today: NaiveDate) -> Self {
        let mut pairs = Vec::new();

        if !query.case_types().is_empty() {
            let filter = query
                .case_types()
                .iter()
                .map(|category| format!("case_type:{}", category.code()))
                .collect::<Vec<_>>()
                .join(" OR ");
            pairs.push(("f[0]".to_string(), format!("({})", filter)));
        }

        for (i, status) in query.statuses().iter().enumerate() {
            pairs.push((format!("s[{}]", i), status.label().to_string()));
        }

        match (query.date_start(), query.date_end()) {
            (Some(start), Some(end)) => {
                pairs.push(("date_start".to_string(), format_date(start)));
                pairs.push(("date_end".to_string(), format_date(end)));
            }
            (Some(start), None) => {
                pairs.push(("date_start".to_string(), format_date(start)));
                pairs.push(("date_end".to_string(), format_date(today)));
            }
            (None, Some(end)) => {
                pairs.push(("date_start".to_string(), EPOCH_START.to_string()));
                pairs.push(("date_end".to_string(), format_date(end)));
            }
            (None, None) => {}
        }

        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Appends the parameters to `url`'s query string.
    pub fn apply_to(&self, url: &mut url::Url) {
        if self.pairs.is_empty() {
            return;
        }
        url.query_pairs_mut().extend_pairs(self.pairs.iter());
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
