use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Unexpected page structure in {context}: {message}")]
    StructuralExtraction { context: String, message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Unrecognized case type in case number '{case_number}'")]
    UnrecognizedCaseType { case_number: String },

    #[error("Download button did not appear on {url} within {waited:?}")]
    ExportTriggerTimeout { url: String, waited: Duration },

    #[error("Download token cookie unavailable after {attempts} attempts")]
    TokenUnavailable { attempts: u32 },

    #[error("Polling export job {job_id} failed: {message}")]
    ExportPoll { job_id: String, message: String },

    #[error("Advanced search returned no rows for {case_number} after {attempts} attempts")]
    SecondarySearchExhausted { case_number: String, attempts: u32 },

    #[error("Cross-reference mismatch: expected {expected}, found {found}")]
    AssertionViolation { expected: String, found: String },

    #[error("Browser session error: {message}")]
    Browser { message: String },

    #[error("Operation cancelled during {stage}")]
    Cancelled { stage: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, PortalError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Extraction,
    Export,
    Lookup,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PortalError {
    pub fn structural(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StructuralExtraction {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::HttpStatus { .. } => ErrorCategory::Network,
            Self::StructuralExtraction { .. }
            | Self::UnrecognizedCaseType { .. }
            | Self::CsvError(_)
            | Self::SerializationError(_) => ErrorCategory::Extraction,
            Self::ExportTriggerTimeout { .. }
            | Self::TokenUnavailable { .. }
            | Self::ExportPoll { .. } => ErrorCategory::Export,
            Self::NotFound { .. }
            | Self::SecondarySearchExhausted { .. }
            | Self::AssertionViolation { .. } => ErrorCategory::Lookup,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::UrlError(_) => ErrorCategory::Configuration,
            Self::IoError(_) | Self::Browser { .. } | Self::Cancelled { .. } => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Cancelled { .. } | Self::NotFound { .. } => ErrorSeverity::Low,
            Self::ApiError(_)
            | Self::HttpStatus { .. }
            | Self::TokenUnavailable { .. }
            | Self::ExportTriggerTimeout { .. }
            | Self::ExportPoll { .. }
            | Self::SecondarySearchExhausted { .. } => ErrorSeverity::Medium,
            Self::StructuralExtraction { .. }
            | Self::UnrecognizedCaseType { .. }
            | Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::UrlError(_) => ErrorSeverity::High,
            Self::AssertionViolation { .. } | Self::IoError(_) | Self::Browser { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    /// 對應 HTTP 狀態碼 (NotFound 視為 404)
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::HttpStatus { status, .. } => Some(*status),
            Self::ApiError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Browser errors invalidate the session that produced them.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            Self::Browser { .. } | Self::ExportTriggerTimeout { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network connectivity and the portal base URL",
            ErrorCategory::Extraction => {
                "The portal layout may have changed; review the selectors in core::contract"
            }
            ErrorCategory::Export => "Retry the export later or narrow the query",
            ErrorCategory::Lookup => "Verify the case number and try again",
            ErrorCategory::Configuration => "Fix the configuration file or command-line flags",
            ErrorCategory::System => "Check the WebDriver endpoint and local file permissions",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::NotFound { what } => format!("{} was not found on the portal", what),
            Self::UnrecognizedCaseType { case_number } => {
                format!("Case number '{}' has an unknown case type", case_number)
            }
            Self::Cancelled { .. } => "Operation cancelled".to_string(),
            other => other.to_string(),
        }
    }
}
