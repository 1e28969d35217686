use crate::utils::error::{PortalError, Result};
use crate::utils::retry::RetryPolicy;
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static env var pattern"));

/// Portal addresses, transport and orchestration knobs.
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// working configuration against the public portal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default)]
    pub portal: PortalSection,
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub browser: BrowserSection,
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub assembler: AssemblerSection,
    #[serde(default)]
    pub docket: DocketSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalSection {
    pub base_url: String,
    pub search_path: String,
    pub case_path: String,
    pub advanced_search_path: String,
    pub docket_path: String,
    pub download_start_path: String,
    pub progress_path: String,
    pub token_cookie: String,
}

impl Default for PortalSection {
    fn default() -> Self {
        Self {
            base_url: "https://www.nlrb.gov".to_string(),
            search_path: "/search/case".to_string(),
            case_path: "/case".to_string(),
            advanced_search_path: "/advanced-search".to_string(),
            docket_path: "/sort-case-decision-docket".to_string(),
            download_start_path: "/nlrb-downloads/start-download".to_string(),
            progress_path: "/nlrb-downloads/progress".to_string(),
            token_cookie: "nlrb-dl-sessid".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: concat!("nlrb-scrape/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    pub webdriver_url: String,
    pub headless: bool,
    pub poll_interval_ms: u64,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            headless: true,
            poll_interval_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    pub marker_timeout_seconds: u64,
    pub token_retry: RetryPolicy,
    pub poll_interval_ms: u64,
    /// No deadline unless set; the portal gives no upper bound on job length.
    pub poll_deadline_seconds: Option<u64>,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            marker_timeout_seconds: 15,
            token_retry: RetryPolicy::new(4, Duration::from_millis(500)),
            poll_interval_ms: 1000,
            poll_deadline_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerSection {
    pub secondary_retry: RetryPolicy,
    pub results_timeout_seconds: u64,
}

impl Default for AssemblerSection {
    fn default() -> Self {
        Self {
            secondary_retry: RetryPolicy::new(5, Duration::from_secs(1)),
            results_timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocketSection {
    pub sort_field: String,
    pub sort_direction: String,
}

impl Default for DocketSection {
    fn default() -> Self {
        Self {
            sort_field: "ds_activity_date".to_string(),
            sort_direction: "desc".to_string(),
        }
    }
}

impl PortalConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PortalError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| PortalError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${NLRB_BASE_URL})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.portal.base_url)?)
    }

    /// Resolves an endpoint path (or a portal-relative file name) against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url()?.join(path)?)
    }

    pub fn case_url(&self, case_number: &str) -> Result<Url> {
        self.endpoint(&format!(
            "{}/{}",
            self.portal.case_path.trim_end_matches('/'),
            case_number
        ))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    pub fn marker_timeout(&self) -> Duration {
        Duration::from_secs(self.export.marker_timeout_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.export.poll_interval_ms)
    }

    pub fn poll_deadline(&self) -> Option<Duration> {
        self.export.poll_deadline_seconds.map(Duration::from_secs)
    }

    pub fn results_timeout(&self) -> Duration {
        Duration::from_secs(self.assembler.results_timeout_seconds)
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("portal.base_url", &self.portal.base_url)?;
        validation::validate_url("browser.webdriver_url", &self.browser.webdriver_url)?;

        for (field, path) in [
            ("portal.search_path", &self.portal.search_path),
            ("portal.case_path", &self.portal.case_path),
            ("portal.advanced_search_path", &self.portal.advanced_search_path),
            ("portal.docket_path", &self.portal.docket_path),
            ("portal.download_start_path", &self.portal.download_start_path),
            ("portal.progress_path", &self.portal.progress_path),
        ] {
            validation::validate_endpoint_path(field, path)?;
        }

        validation::validate_non_empty_string("portal.token_cookie", &self.portal.token_cookie)?;
        validation::validate_range("http.timeout_seconds", self.http.timeout_seconds, 1, 600)?;
        validation::validate_positive_number(
            "export.marker_timeout_seconds",
            self.export.marker_timeout_seconds,
            1,
        )?;
        validation::validate_positive_number(
            "export.token_retry.attempts",
            self.export.token_retry.attempts as u64,
            1,
        )?;
        validation::validate_positive_number(
            "assembler.secondary_retry.attempts",
            self.assembler.secondary_retry.attempts as u64,
            1,
        )?;

        match self.docket.sort_direction.as_str() {
            "asc" | "desc" => {}
            other => {
                return Err(PortalError::InvalidConfigValueError {
                    field: "docket.sort_direction".to_string(),
                    value: other.to_string(),
                    reason: "Must be 'asc' or 'desc'".to_string(),
                })
            }
        }

        Ok(())
    }
}

impl Validate for PortalConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = PortalConfig::from_toml_str("").unwrap();

        assert_eq!(config.portal.base_url, "https://www.nlrb.gov");
        assert_eq!(config.export.token_retry.attempts, 4);
        assert_eq!(config.assembler.secondary_retry.attempts, 5);
        assert_eq!(config.marker_timeout(), Duration::from_secs(15));
        assert!(config.poll_deadline().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_sections() {
        let toml_content = r#"
[portal]
base_url = "http://127.0.0.1:8080"

[export]
poll_interval_ms = 10
poll_deadline_seconds = 600

[export.token_retry]
attempts = 2
backoff_ms = 5
"#;

        let config = PortalConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.portal.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.portal.search_path, "/search/case");
        assert_eq!(config.export.token_retry.attempts, 2);
        assert_eq!(config.export.token_retry.multiplier, 2);
        assert_eq!(config.poll_deadline(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("NLRB_TEST_BASE_URL", "https://staging.example.gov");

        let toml_content = r#"
[portal]
base_url = "${NLRB_TEST_BASE_URL}"
"#;

        let config = PortalConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.portal.base_url, "https://staging.example.gov");

        std::env::remove_var("NLRB_TEST_BASE_URL");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[portal]
base_url = "invalid-url"
"#;

        let config = PortalConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let mut config = PortalConfig::default();
        config.docket.sort_direction = "sideways".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_case_url() {
        let config = PortalConfig::default();
        assert_eq!(
            config.case_url("01-CA-123456").unwrap().as_str(),
            "https://www.nlrb.gov/case/01-CA-123456"
        );
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[http]\ntimeout_seconds = 5\n")
            .unwrap();

        let config = PortalConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }
}
