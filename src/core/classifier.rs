use crate::domain::model::CaseType;
use crate::utils::error::{PortalError, Result};

/// Maps a case number such as `01-RC-123456` to its [`CaseType`] by looking
/// for a `-XX-` token. A case number without a known token is a broken data
/// contract, not a row to skip.
pub fn classify(case_number: &str) -> Result<CaseType> {
    CaseType::ALL
        .iter()
        .copied()
        .find(|case_type| case_number.contains(&format!("-{}-", case_type.code())))
        .ok_or_else(|| {
            tracing::error!("❌ Unrecognized case type in case number: {}", case_number);
            PortalError::UnrecognizedCaseType {
                case_number: case_number.to_string(),
            }
        })
}
