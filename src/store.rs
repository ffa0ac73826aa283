use crate::model::{Asset, AssetId, FieldValue};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt::Debug;
use thiserror::Error;

/// Field paths of the stored document shape. Drivers address fields by
/// these paths; the translator rewrites logical names onto them.
pub mod paths {
    /// Composite tenant--id key the document lives under.
    pub const KEY: &str = "_key";
    pub const ID: &str = "id";
    pub const TENANT_ID: &str = "tenantId";
    pub const PARENT_ID: &str = "parentId";
    pub const SLUG: &str = "slug";
    pub const FILE_NAME: &str = "fileName";
    pub const FILE_HASH: &str = "fileHash";
    pub const FILE_SIZE: &str = "fileSize";
    pub const MIME_TYPE: &str = "mimeType";
    pub const CREATED: &str = "created";
    pub const LAST_MODIFIED: &str = "lastModified";
    pub const TAGS: &str = "tags";
    pub const DELETED: &str = "deleted";
}

/// Store-native predicate over document field paths.
///
/// Every tree this crate hands to a driver is rooted in a construction that
/// conjoins tenant scope, so a driver never sees a cross-tenant predicate.
/// Equality against the tag-set path follows document-store semantics:
/// it matches when any element of the set equals the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreFilter {
    Eq(&'static str, FieldValue),
    Ne(&'static str, FieldValue),
    Lt(&'static str, FieldValue),
    Lte(&'static str, FieldValue),
    Gt(&'static str, FieldValue),
    Gte(&'static str, FieldValue),
    In(&'static str, Vec<FieldValue>),
    IsNull(&'static str),
    IsNotNull(&'static str),
    And(Box<StoreFilter>, Box<StoreFilter>),
    Or(Box<StoreFilter>, Box<StoreFilter>),
    Not(Box<StoreFilter>),
}

impl StoreFilter {
    pub fn and(self, rhs: StoreFilter) -> StoreFilter {
        StoreFilter::And(Box::new(self), Box::new(rhs))
    }

    pub fn or(self, rhs: StoreFilter) -> StoreFilter {
        StoreFilter::Or(Box::new(self), Box::new(rhs))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> StoreFilter {
        StoreFilter::Not(Box::new(self))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// One sort key over a document field path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSort {
    pub path: &'static str,
    pub order: Order,
}

impl StoreSort {
    pub fn asc(path: &'static str) -> Self {
        Self {
            path,
            order: Order::Asc,
        }
    }

    pub fn desc(path: &'static str) -> Self {
        Self {
            path,
            order: Order::Desc,
        }
    }
}

/// Ordering applied to a page before skip/take.
///
/// `Shuffled` replaces sorting with a pseudo-random permutation keyed to the
/// seed; the same seed over the same matched set yields the same sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOrder {
    Sorted(Vec<StoreSort>),
    Shuffled { seed: u64 },
}

/// Access-path hints a driver may translate for its planner, or ignore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexHint {
    /// Prefer the tenant+parent range index over an equality-only plan.
    ParentRange,
}

/// Page retrieval parameters. `take` of `None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpec {
    pub order: PageOrder,
    pub skip: usize,
    pub take: Option<usize>,
    pub hint: Option<IndexHint>,
}

/// Store-defined code for a sort that exceeded the in-memory sort limit.
pub const SORT_LIMIT_EXCEEDED: i32 = 17406;

/// Failure surfaced by a storage driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached or the connection dropped mid-call.
    #[error("store connection failed: {0}")]
    Connection(String),
    /// The store refused the request, with its own numeric code.
    #[error("store rejected request (code {code}): {message}")]
    Rejected { code: i32, message: String },
}

impl StoreError {
    pub fn sort_limit_exceeded() -> Self {
        StoreError::Rejected {
            code: SORT_LIMIT_EXCEEDED,
            message: "sort exceeded memory limit".to_string(),
        }
    }

    /// True for the one rejection the engine recovers from by telling the
    /// caller to narrow the query.
    pub fn is_sort_limit_exceeded(&self) -> bool {
        matches!(self, StoreError::Rejected { code, .. } if *code == SORT_LIMIT_EXCEEDED)
    }
}

/// Read contract a storage driver implements.
///
/// All operations are point-in-time reads with no transactional coupling
/// between calls. Drivers must apply `PageSpec` ordering before skip/take.
#[async_trait]
pub trait AssetStore: Debug + Send + Sync {
    /// Retrieves one ordered page of assets matching `filter`.
    async fn find_page(
        &self,
        filter: &StoreFilter,
        page: &PageSpec,
    ) -> Result<Vec<Asset>, StoreError>;

    /// Retrieves the first asset matching `filter`, if any.
    async fn find_one(&self, filter: &StoreFilter) -> Result<Option<Asset>, StoreError>;

    /// Retrieves only the ids of assets matching `filter`, in the driver's
    /// stable order.
    async fn find_ids(&self, filter: &StoreFilter) -> Result<Vec<AssetId>, StoreError>;

    /// Counts assets matching `filter`.
    async fn count(&self, filter: &StoreFilter) -> Result<u64, StoreError>;

    /// Streams every asset matching `filter` without requiring the driver to
    /// materialize the full result set. Each call starts a fresh pass.
    fn stream(&self, filter: StoreFilter) -> BoxStream<'static, Result<Asset, StoreError>>;
}
