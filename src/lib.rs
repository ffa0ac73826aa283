pub mod count_cache;
pub mod error;
pub mod memory;
pub mod model;
pub mod query;
pub mod repository;
pub mod store;

pub use crate::error::{AssetQueryError, AssetQueryErrorCode};
pub use crate::repository::{AssetRepository, ResultPage, Total};
