pub mod assembler;
pub mod classifier;
pub mod contract;
pub mod csv_rows;
pub mod export;
pub mod extract;
pub mod output;
pub mod paginate;
pub mod params;
pub mod portal;

pub use crate::domain::ports::{BrowserSession, HttpFetch, Storage};
pub use crate::utils::error::Result;
pub use assembler::CaseDetailAssembler;
pub use classifier::classify;
pub use csv_rows::CaseRows;
pub use export::{BulkExportOrchestrator, ExportState};
pub use paginate::PaginationWalker;
pub use params::SearchParams;
pub use portal::PortalClient;
