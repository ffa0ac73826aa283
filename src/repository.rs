use crate::count_cache::{CountCache, CountKey};
use crate::error::AssetQueryError;
use crate::model::{Asset, AssetId, FieldValue, ParentScope, TenantId};
use crate::query::shape::{not_deleted, tenant_is};
use crate::query::{ListQuery, QueryShape, default_sort, translate_filter, translate_sort};
use crate::store::{AssetStore, IndexHint, PageOrder, PageSpec, StoreError, StoreFilter, paths};
use futures::StreamExt;
use futures::stream::BoxStream;
use std::sync::Arc;
use tracing::{debug, warn};

/// Total match count for a listing. `Unknown` means the caller opted out of
/// counting or declined a slow count, never that counting failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Total {
    Known(u64),
    Unknown,
}

impl Total {
    pub fn known(self) -> Option<u64> {
        match self {
            Total::Known(count) => Some(count),
            Total::Unknown => None,
        }
    }
}

/// One page of a listing: the items in order plus the total for the whole
/// match set. Never longer than the requested take.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage {
    pub items: Vec<Asset>,
    pub total: Total,
}

/// How the total for one request gets resolved. Decided once per call,
/// cheapest sources first; the cache serves only the default listing shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TotalPlan {
    /// Caller opted out entirely.
    None,
    /// A short page with no skip is by construction the whole match set.
    PageLen,
    /// Caller declined a slow count on a non-default shape.
    Suppressed,
    /// Shared tenant+parent cache.
    Cached,
    /// Fresh count against the exact retrieval predicate.
    Exact,
}

fn plan_total(query: &ListQuery, shape: &QueryShape, page_len: usize) -> TotalPlan {
    if query.no_total {
        return TotalPlan::None;
    }
    let page_is_short = query.take.is_none_or(|take| page_len < take);
    if page_is_short && query.skip == 0 {
        return TotalPlan::PageLen;
    }
    if query.no_slow_total && !shape.is_default_listing() {
        return TotalPlan::Suppressed;
    }
    if shape.is_default_listing() {
        TotalPlan::Cached
    } else {
        TotalPlan::Exact
    }
}

fn build_shape(parent: &ParentScope, query: &ListQuery) -> Result<QueryShape, AssetQueryError> {
    // An empty id set is treated as no id set at all, not as "match nothing".
    if let Some(ids) = query.ids.as_deref().filter(|ids| !ids.is_empty()) {
        return Ok(QueryShape::ByIds { ids: ids.to_vec() });
    }
    let filter = query.filter.as_ref().map(translate_filter).transpose()?;
    Ok(QueryShape::ByParent {
        parent: parent.clone(),
        filter,
    })
}

/// Remaps the one store rejection a caller can recover from by narrowing
/// the query; everything else passes through unchanged.
fn guard_overflow(err: StoreError) -> AssetQueryError {
    if err.is_sort_limit_exceeded() {
        warn!("store rejected an oversized sort, reporting result too large");
        AssetQueryError::ResultTooLarge
    } else {
        AssetQueryError::Store(err)
    }
}

/// Front door for asset listings and lookups over one storage driver.
///
/// Shares a single count cache across all clones of the `Arc`'d driver;
/// construct one repository per store and hand out references.
#[derive(Debug)]
pub struct AssetRepository {
    store: Arc<dyn AssetStore>,
    counts: CountCache,
}

impl AssetRepository {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self {
            store,
            counts: CountCache::new(),
        }
    }

    /// Runs one listing request and resolves its total.
    ///
    /// A non-empty explicit id set takes precedence over parent scope and
    /// filter, and always uses the stable default ordering; an empty id set
    /// falls through to the parent listing. A short page with no skip is its own
    /// total and costs no count call. An oversized-sort rejection surfaces
    /// as [`AssetQueryError::ResultTooLarge`] whether it happens while
    /// retrieving or while counting.
    pub async fn query(
        &self,
        tenant: &TenantId,
        parent: ParentScope,
        query: &ListQuery,
    ) -> Result<ResultPage, AssetQueryError> {
        let shape = build_shape(&parent, query)?;
        let order = match query.random_seed {
            Some(seed) => PageOrder::Shuffled { seed },
            None => PageOrder::Sorted(match &shape {
                QueryShape::ByIds { .. } => default_sort(),
                _ => translate_sort(&query.sort)?,
            }),
        };
        let hint = match &shape {
            QueryShape::ByParent { .. } => Some(IndexHint::ParentRange),
            _ => None,
        };
        let filter = shape.to_filter(tenant);
        let page = PageSpec {
            order,
            skip: query.skip,
            take: query.take,
            hint,
        };
        debug!(%tenant, skip = query.skip, take = ?query.take, "asset listing");

        let items = self
            .store
            .find_page(&filter, &page)
            .await
            .map_err(guard_overflow)?;

        let total = match plan_total(query, &shape, items.len()) {
            TotalPlan::None | TotalPlan::Suppressed => Total::Unknown,
            TotalPlan::PageLen => Total::Known(items.len() as u64),
            TotalPlan::Cached => {
                let key = CountKey {
                    tenant: tenant.clone(),
                    parent: parent.clone(),
                };
                let store = Arc::clone(&self.store);
                let count_filter = filter.clone();
                let count = self
                    .counts
                    .get_or_compute(key, move || async move {
                        store.count(&count_filter).await
                    })
                    .await
                    .map_err(guard_overflow)?;
                Total::Known(count)
            }
            TotalPlan::Exact => {
                let count = self
                    .store
                    .count(&filter)
                    .await
                    .map_err(guard_overflow)?;
                Total::Known(count)
            }
        };
        Ok(ResultPage { items, total })
    }

    /// Returns the ids among `ids` that exist for `tenant` and are not
    /// deleted, in the driver's stable order.
    pub async fn query_ids(
        &self,
        tenant: &TenantId,
        ids: &[AssetId],
    ) -> Result<Vec<AssetId>, AssetQueryError> {
        let filter = QueryShape::ByIds { ids: ids.to_vec() }.to_filter(tenant);
        Ok(self.store.find_ids(&filter).await?)
    }

    /// Returns the ids of all live assets under `parent`.
    pub async fn query_child_ids(
        &self,
        tenant: &TenantId,
        parent: ParentScope,
    ) -> Result<Vec<AssetId>, AssetQueryError> {
        let filter = QueryShape::ByParent {
            parent,
            filter: None,
        }
        .to_filter(tenant);
        Ok(self.store.find_ids(&filter).await?)
    }

    /// Deduplication lookup by content hash, file name and size. Absence is
    /// not an error.
    pub async fn find_by_hash(
        &self,
        tenant: &TenantId,
        hash: &str,
        file_name: &str,
        file_size: i64,
    ) -> Result<Option<Asset>, AssetQueryError> {
        let filter = QueryShape::ByHash {
            hash: hash.to_string(),
            file_name: file_name.to_string(),
            file_size,
        }
        .to_filter(tenant);
        Ok(self.store.find_one(&filter).await?)
    }

    pub async fn find_by_slug(
        &self,
        tenant: &TenantId,
        slug: &str,
        include_deleted: bool,
    ) -> Result<Option<Asset>, AssetQueryError> {
        let filter = QueryShape::BySlug {
            slug: slug.to_string(),
            include_deleted,
        }
        .to_filter(tenant);
        Ok(self.store.find_one(&filter).await?)
    }

    pub async fn find_by_id(
        &self,
        tenant: &TenantId,
        id: &AssetId,
        include_deleted: bool,
    ) -> Result<Option<Asset>, AssetQueryError> {
        let filter = QueryShape::ById {
            id: id.clone(),
            include_deleted,
        }
        .to_filter(tenant);
        Ok(self.store.find_one(&filter).await?)
    }

    /// Finds an asset by bare id across all tenants. Only the soft-delete
    /// exclusion applies.
    pub async fn find_by_id_global(
        &self,
        id: &AssetId,
    ) -> Result<Option<Asset>, AssetQueryError> {
        let filter = StoreFilter::Eq(paths::ID, FieldValue::Text(id.as_str().to_string()))
            .and(not_deleted());
        Ok(self.store.find_one(&filter).await?)
    }

    /// Streams every live asset of `tenant`. Lazy and restartable; nothing
    /// is materialized up front at this layer.
    pub fn stream_all(
        &self,
        tenant: &TenantId,
    ) -> BoxStream<'static, Result<Asset, AssetQueryError>> {
        let filter = tenant_is(tenant).and(not_deleted());
        self.store
            .stream(filter)
            .map(|result| result.map_err(AssetQueryError::from))
            .boxed()
    }

    /// Drops the cached default-listing total for `tenant` under `parent`.
    /// The next default listing recomputes it.
    pub fn invalidate_counts(&self, tenant: &TenantId, parent: &ParentScope) {
        self.counts.invalidate(&CountKey {
            tenant: tenant.clone(),
            parent: parent.clone(),
        });
    }
}
