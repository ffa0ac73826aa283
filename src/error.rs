use crate::store::StoreError;
use thiserror::Error;

/// Stable machine-readable error codes. The strings double as translation
/// keys for user-facing messages, so they must never change for an existing
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetQueryErrorCode {
    InvalidField,
    InvalidFilter,
    ResultTooLarge,
    StoreUnavailable,
    StoreRejected,
}

impl AssetQueryErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetQueryErrorCode::InvalidField => "invalid_field",
            AssetQueryErrorCode::InvalidFilter => "invalid_filter",
            AssetQueryErrorCode::ResultTooLarge => "result_too_large",
            AssetQueryErrorCode::StoreUnavailable => "store_unavailable",
            AssetQueryErrorCode::StoreRejected => "store_rejected",
        }
    }
}

/// Errors surfaced to callers of the engine.
///
/// Absence of a record is never an error; lookups return `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetQueryError {
    /// The query referenced a logical field outside the asset schema.
    /// Raised before any store round-trip.
    #[error("unknown field '{field}' in query")]
    InvalidField { field: String },
    /// The filter tree is structurally unusable.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    /// The store refused to sort the matched set within its memory limit.
    /// Recoverable by narrowing the filter or paginating.
    #[error("the query matched too many records to sort")]
    ResultTooLarge,
    /// Any other storage failure, passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AssetQueryError {
    pub fn code(&self) -> AssetQueryErrorCode {
        match self {
            AssetQueryError::InvalidField { .. } => AssetQueryErrorCode::InvalidField,
            AssetQueryError::InvalidFilter(_) => AssetQueryErrorCode::InvalidFilter,
            AssetQueryError::ResultTooLarge => AssetQueryErrorCode::ResultTooLarge,
            AssetQueryError::Store(StoreError::Connection(_)) => {
                AssetQueryErrorCode::StoreUnavailable
            }
            AssetQueryError::Store(StoreError::Rejected { .. }) => {
                AssetQueryErrorCode::StoreRejected
            }
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code().as_str()
    }
}
