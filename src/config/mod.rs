pub mod cli;
pub mod toml_config;

pub use toml_config::PortalConfig;

#[cfg(feature = "cli")]
pub use args::{CaseCategoryArg, CaseStatusArg, CliConfig, Command, QueryArgs};

#[cfg(feature = "cli")]
mod args {
    use crate::domain::model::{CaseCategory, CaseQuery, CaseStatus};
    use crate::utils::error::{PortalError, Result};
    use crate::utils::validation::{self, Validate};
    use chrono::NaiveDate;
    use clap::{Args, Parser, Subcommand, ValueEnum};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "nlrb-scrape")]
    #[command(about = "Search, bulk-export and assemble NLRB case records")]
    pub struct CliConfig {
        /// Path to a TOML configuration file (defaults apply when omitted)
        #[arg(short, long, global = true)]
        pub config: Option<String>,

        #[arg(long, default_value = "./output", global = true)]
        pub output_path: String,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Emit logs as JSON lines")]
        pub json_logs: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Walk the web search listing and write cases.csv
        Search {
            #[command(flatten)]
            query: QueryArgs,

            /// Stop after this many cases
            #[arg(long)]
            limit: Option<usize>,
        },
        /// Assemble one full case record and write <case_number>.json
        Case { case_number: String },
        /// Run the bulk CSV export and write export.csv
        Export {
            #[command(flatten)]
            query: QueryArgs,

            /// Give up polling the export job after this many seconds
            #[arg(long)]
            poll_deadline_seconds: Option<u64>,
        },
        /// Read a previously exported CSV and report counts per case type
        Rows { path: String },
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct QueryArgs {
        #[arg(long = "case-type", value_enum)]
        pub case_types: Vec<CaseCategoryArg>,

        #[arg(long = "status", value_enum)]
        pub statuses: Vec<CaseStatusArg>,

        /// YYYY-MM-DD
        #[arg(long)]
        pub date_start: Option<NaiveDate>,

        /// YYYY-MM-DD
        #[arg(long)]
        pub date_end: Option<NaiveDate>,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    pub enum CaseCategoryArg {
        C,
        R,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    pub enum CaseStatusArg {
        Open,
        Closed,
        OpenBlocked,
    }

    impl From<CaseCategoryArg> for CaseCategory {
        fn from(arg: CaseCategoryArg) -> Self {
            match arg {
                CaseCategoryArg::C => CaseCategory::C,
                CaseCategoryArg::R => CaseCategory::R,
            }
        }
    }

    impl From<CaseStatusArg> for CaseStatus {
        fn from(arg: CaseStatusArg) -> Self {
            match arg {
                CaseStatusArg::Open => CaseStatus::Open,
                CaseStatusArg::Closed => CaseStatus::Closed,
                CaseStatusArg::OpenBlocked => CaseStatus::OpenBlocked,
            }
        }
    }

    impl QueryArgs {
        pub fn to_query(&self) -> CaseQuery {
            let mut builder = CaseQuery::builder()
                .case_types(self.case_types.iter().copied().map(CaseCategory::from))
                .statuses(self.statuses.iter().copied().map(CaseStatus::from));
            if let Some(start) = self.date_start {
                builder = builder.date_start(start);
            }
            if let Some(end) = self.date_end {
                builder = builder.date_end(end);
            }
            builder.build()
        }
    }

    impl Validate for QueryArgs {
        fn validate(&self) -> Result<()> {
            if let (Some(start), Some(end)) = (self.date_start, self.date_end) {
                if start > end {
                    return Err(PortalError::InvalidConfigValueError {
                        field: "date_start".to_string(),
                        value: start.to_string(),
                        reason: format!("Start date is after end date {}", end),
                    });
                }
            }
            Ok(())
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_path("output_path", &self.output_path)?;
            match &self.command {
                Command::Search { query, .. } | Command::Export { query, .. } => query.validate(),
                Command::Case { case_number } => {
                    validation::validate_non_empty_string("case_number", case_number)
                }
                Command::Rows { path } => validation::validate_path("path", path),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_search_command() {
            let config = CliConfig::parse_from([
                "nlrb-scrape",
                "search",
                "--case-type",
                "r",
                "--status",
                "open-blocked",
                "--date-start",
                "2021-01-01",
            ]);

            let Command::Search { query, limit } = &config.command else {
                panic!("expected search command");
            };
            assert!(limit.is_none());

            let query = query.to_query();
            assert_eq!(query.case_types(), &[CaseCategory::R]);
            assert_eq!(query.statuses(), &[CaseStatus::OpenBlocked]);
            assert_eq!(query.date_start(), NaiveDate::from_ymd_opt(2021, 1, 1));
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_inverted_date_range_is_rejected() {
            let config = CliConfig::parse_from([
                "nlrb-scrape",
                "export",
                "--date-start",
                "2022-01-01",
                "--date-end",
                "2021-01-01",
            ]);
            assert!(config.validate().is_err());
        }
    }
}
