//! Logical query surface and its translation onto storage predicates.
//!
//! Callers describe listings over logical field names; everything here is
//! pure. The repository turns the result into store calls.

pub mod filter;
pub mod list;
pub mod shape;
pub mod translate;

pub use filter::{FieldRef, FilterExpr, IntoFieldValue, field, lit};
pub use list::ListQuery;
pub use shape::QueryShape;
pub use translate::{default_sort, translate_filter, translate_sort};
