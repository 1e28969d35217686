pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{BrowserSlot, ReqwestFetcher, WebDriverLauncher};
pub use config::{cli::LocalStorage, PortalConfig};
pub use core::{classify, CaseRows, PortalClient, SearchParams};
pub use domain::model::{
    CaseCategory, CaseDetail, CaseQuery, CaseRow, CaseStatus, CaseSummary, CaseType,
};
pub use utils::cancel::Cancellation;
pub use utils::error::{PortalError, Result};
