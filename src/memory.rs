use crate::model::{Asset, AssetId, FieldValue};
use crate::store::{
    AssetStore, Order, PageOrder, PageSpec, StoreError, StoreFilter, StoreSort, paths,
};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::RwLock;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Limits enforced by the in-memory driver.
#[derive(Debug, Clone)]
pub struct MemoryStoreConfig {
    /// Largest matched set the driver will sort in memory. Beyond it a
    /// sorted retrieval is rejected the way the remote store rejects an
    /// oversized sort.
    pub max_sort_docs: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_sort_docs: 32 * 1024,
        }
    }
}

/// Per-operation call counters, read by tests to observe store traffic.
#[derive(Debug, Default)]
pub struct StoreStats {
    finds: AtomicU64,
    hinted_finds: AtomicU64,
    lookups: AtomicU64,
    counts: AtomicU64,
    streams: AtomicU64,
}

impl StoreStats {
    /// Calls to `find_page`.
    pub fn finds(&self) -> u64 {
        self.finds.load(AtomicOrdering::Relaxed)
    }

    /// Calls to `find_page` that carried an index hint.
    pub fn hinted_finds(&self) -> u64 {
        self.hinted_finds.load(AtomicOrdering::Relaxed)
    }

    /// Calls to `find_one` and `find_ids`.
    pub fn lookups(&self) -> u64 {
        self.lookups.load(AtomicOrdering::Relaxed)
    }

    /// Calls to `count`.
    pub fn counts(&self) -> u64 {
        self.counts.load(AtomicOrdering::Relaxed)
    }

    /// Calls to `stream`.
    pub fn streams(&self) -> u64 {
        self.streams.load(AtomicOrdering::Relaxed)
    }
}

/// In-memory [`AssetStore`] keyed by the composite doc key.
///
/// Mirrors the remote-store behaviors the engine depends on: predicate
/// evaluation with set-membership tag equality and null parents, stable
/// multi-key sorting, seeded shuffling, skip/take, and the oversized-sort
/// rejection. Index hints are counted and otherwise ignored, there is no
/// planner here.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    config: MemoryStoreConfig,
    assets: RwLock<BTreeMap<String, Asset>>,
    stats: StoreStats,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Inserts or replaces one asset under its composite key.
    pub fn insert(&self, asset: Asset) {
        self.assets
            .write()
            .insert(asset.doc_key().into_string(), asset);
    }

    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }

    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    fn collect_matching(&self, filter: &StoreFilter) -> Vec<Asset> {
        self.assets
            .read()
            .values()
            .filter(|asset| matches_filter(asset, filter))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn find_page(
        &self,
        filter: &StoreFilter,
        page: &PageSpec,
    ) -> Result<Vec<Asset>, StoreError> {
        self.stats.finds.fetch_add(1, AtomicOrdering::Relaxed);
        if page.hint.is_some() {
            self.stats.hinted_finds.fetch_add(1, AtomicOrdering::Relaxed);
        }
        let mut matched = self.collect_matching(filter);
        match &page.order {
            PageOrder::Sorted(sort) => {
                if !sort.is_empty() && matched.len() > self.config.max_sort_docs {
                    return Err(StoreError::sort_limit_exceeded());
                }
                sort_assets(&mut matched, sort);
            }
            PageOrder::Shuffled { seed } => {
                let mut rng = StdRng::seed_from_u64(*seed);
                matched.shuffle(&mut rng);
            }
        }
        let skipped = matched.into_iter().skip(page.skip);
        let items = match page.take {
            Some(take) => skipped.take(take).collect(),
            None => skipped.collect(),
        };
        Ok(items)
    }

    async fn find_one(&self, filter: &StoreFilter) -> Result<Option<Asset>, StoreError> {
        self.stats.lookups.fetch_add(1, AtomicOrdering::Relaxed);
        let found = self
            .assets
            .read()
            .values()
            .find(|asset| matches_filter(asset, filter))
            .cloned();
        Ok(found)
    }

    async fn find_ids(&self, filter: &StoreFilter) -> Result<Vec<AssetId>, StoreError> {
        self.stats.lookups.fetch_add(1, AtomicOrdering::Relaxed);
        let ids = self
            .assets
            .read()
            .values()
            .filter(|asset| matches_filter(asset, filter))
            .map(|asset| asset.id.clone())
            .collect();
        Ok(ids)
    }

    async fn count(&self, filter: &StoreFilter) -> Result<u64, StoreError> {
        self.stats.counts.fetch_add(1, AtomicOrdering::Relaxed);
        let count = self
            .assets
            .read()
            .values()
            .filter(|asset| matches_filter(asset, filter))
            .count();
        Ok(count as u64)
    }

    fn stream(&self, filter: StoreFilter) -> BoxStream<'static, Result<Asset, StoreError>> {
        self.stats.streams.fetch_add(1, AtomicOrdering::Relaxed);
        let matched = self.collect_matching(&filter);
        stream::iter(matched.into_iter().map(Ok::<Asset, StoreError>)).boxed()
    }
}

/// Projects one document field. The tag set has no scalar projection and is
/// special-cased by the evaluator.
fn field_of(asset: &Asset, path: &str) -> FieldValue {
    match path {
        paths::KEY => FieldValue::Text(asset.doc_key().into_string()),
        paths::ID => FieldValue::Text(asset.id.as_str().to_string()),
        paths::TENANT_ID => FieldValue::Text(asset.tenant_id.as_str().to_string()),
        paths::PARENT_ID => match &asset.parent_id {
            Some(parent) => FieldValue::Text(parent.as_str().to_string()),
            None => FieldValue::Null,
        },
        paths::SLUG => FieldValue::Text(asset.slug.clone()),
        paths::FILE_NAME => FieldValue::Text(asset.file_name.clone()),
        paths::FILE_HASH => FieldValue::Text(asset.file_hash.clone()),
        paths::FILE_SIZE => FieldValue::Integer(asset.file_size),
        paths::MIME_TYPE => FieldValue::Text(asset.mime_type.clone()),
        paths::CREATED => FieldValue::Integer(asset.created),
        paths::LAST_MODIFIED => FieldValue::Integer(asset.last_modified),
        paths::DELETED => FieldValue::Boolean(asset.deleted),
        _ => FieldValue::Null,
    }
}

fn compare_values(left: &FieldValue, right: &FieldValue) -> Option<Ordering> {
    match (left, right) {
        (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
        (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
        (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
        (FieldValue::Null, FieldValue::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn matches_filter(asset: &Asset, filter: &StoreFilter) -> bool {
    match filter {
        StoreFilter::Eq(path, value) if *path == paths::TAGS => match value {
            FieldValue::Text(tag) => asset.tags.contains(tag),
            _ => false,
        },
        StoreFilter::Ne(path, value) if *path == paths::TAGS => match value {
            FieldValue::Text(tag) => !asset.tags.contains(tag),
            _ => true,
        },
        StoreFilter::In(path, values) if *path == paths::TAGS => values.iter().any(|value| {
            matches!(value, FieldValue::Text(tag) if asset.tags.contains(tag))
        }),
        // the tag set is always materialized on the document, never null
        StoreFilter::IsNull(path) if *path == paths::TAGS => false,
        StoreFilter::IsNotNull(path) if *path == paths::TAGS => true,
        StoreFilter::Eq(path, value) => field_of(asset, path) == *value,
        StoreFilter::Ne(path, value) => field_of(asset, path) != *value,
        StoreFilter::Lt(path, value) => {
            compare_values(&field_of(asset, path), value) == Some(Ordering::Less)
        }
        StoreFilter::Lte(path, value) => matches!(
            compare_values(&field_of(asset, path), value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        StoreFilter::Gt(path, value) => {
            compare_values(&field_of(asset, path), value) == Some(Ordering::Greater)
        }
        StoreFilter::Gte(path, value) => matches!(
            compare_values(&field_of(asset, path), value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        StoreFilter::In(path, values) => values.contains(&field_of(asset, path)),
        StoreFilter::IsNull(path) => field_of(asset, path) == FieldValue::Null,
        StoreFilter::IsNotNull(path) => field_of(asset, path) != FieldValue::Null,
        StoreFilter::And(left, right) => {
            matches_filter(asset, left) && matches_filter(asset, right)
        }
        StoreFilter::Or(left, right) => {
            matches_filter(asset, left) || matches_filter(asset, right)
        }
        StoreFilter::Not(inner) => !matches_filter(asset, inner),
    }
}

fn sort_assets(assets: &mut [Asset], sort: &[StoreSort]) {
    assets.sort_by(|a, b| {
        for key in sort {
            let ordering = compare_values(&field_of(a, key.path), &field_of(b, key.path))
                .unwrap_or(Ordering::Equal);
            let ordering = match key.order {
                Order::Asc => ordering,
                Order::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

#[cfg(test)]
mod tests {
    use super::{MemoryAssetStore, MemoryStoreConfig};
    use crate::model::{Asset, AssetId, FieldValue, TenantId};
    use crate::store::{AssetStore, PageOrder, PageSpec, StoreFilter, StoreSort, paths};
    use std::collections::BTreeSet;

    fn asset(tenant: &str, id: &str, parent: Option<&str>, last_modified: i64) -> Asset {
        Asset {
            id: AssetId::from(id),
            tenant_id: TenantId::from(tenant),
            parent_id: parent.map(AssetId::from),
            slug: id.to_string(),
            file_name: format!("{id}.bin"),
            file_hash: format!("hash-{id}"),
            file_size: 64,
            mime_type: "application/octet-stream".into(),
            created: last_modified - 10,
            last_modified,
            tags: BTreeSet::new(),
            deleted: false,
        }
    }

    fn unsorted_page() -> PageSpec {
        PageSpec {
            order: PageOrder::Sorted(Vec::new()),
            skip: 0,
            take: None,
            hint: None,
        }
    }

    fn everything() -> StoreFilter {
        StoreFilter::IsNotNull(paths::ID)
    }

    #[tokio::test]
    async fn equality_and_null_parent_predicates_match_documents() {
        let store = MemoryAssetStore::new();
        store.insert(asset("t1", "a1", None, 10));
        store.insert(asset("t1", "a2", Some("f1"), 20));
        store.insert(asset("t2", "b1", None, 30));

        let roots = store
            .find_page(
                &StoreFilter::Eq(paths::TENANT_ID, FieldValue::Text("t1".into()))
                    .and(StoreFilter::IsNull(paths::PARENT_ID)),
                &unsorted_page(),
            )
            .await
            .expect("roots");
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id, AssetId::from("a1"));

        let in_folder = store
            .find_page(
                &StoreFilter::Eq(paths::PARENT_ID, FieldValue::Text("f1".into())),
                &unsorted_page(),
            )
            .await
            .expect("folder");
        assert_eq!(in_folder.len(), 1);
        assert_eq!(in_folder[0].id, AssetId::from("a2"));
    }

    #[tokio::test]
    async fn tag_equality_means_set_membership() {
        let store = MemoryAssetStore::new();
        let mut tagged = asset("t1", "a1", None, 10);
        tagged.tags = BTreeSet::from(["logo".to_string(), "brand".to_string()]);
        store.insert(tagged);
        store.insert(asset("t1", "a2", None, 20));

        let by_tag = store
            .find_page(
                &StoreFilter::Eq(paths::TAGS, FieldValue::Text("logo".into())),
                &unsorted_page(),
            )
            .await
            .expect("by tag");
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].id, AssetId::from("a1"));

        let by_any_tag = store
            .find_page(
                &StoreFilter::In(paths::TAGS, vec![
                    FieldValue::Text("brand".into()),
                    FieldValue::Text("missing".into()),
                ]),
                &unsorted_page(),
            )
            .await
            .expect("by any tag");
        assert_eq!(by_any_tag.len(), 1);

        let without_tag = store
            .find_page(
                &StoreFilter::Ne(paths::TAGS, FieldValue::Text("logo".into())),
                &unsorted_page(),
            )
            .await
            .expect("without tag");
        assert_eq!(without_tag.len(), 1);
        assert_eq!(without_tag[0].id, AssetId::from("a2"));
    }

    #[tokio::test]
    async fn tag_presence_checks_never_treat_the_set_as_null() {
        let store = MemoryAssetStore::new();
        let mut tagged = asset("t1", "a1", None, 10);
        tagged.tags = BTreeSet::from(["logo".to_string()]);
        store.insert(tagged);
        store.insert(asset("t1", "a2", None, 20));

        let null_tags = store
            .find_page(&StoreFilter::IsNull(paths::TAGS), &unsorted_page())
            .await
            .expect("null tags");
        assert!(null_tags.is_empty());

        let present_tags = store
            .find_page(&StoreFilter::IsNotNull(paths::TAGS), &unsorted_page())
            .await
            .expect("present tags");
        assert_eq!(present_tags.len(), 2);
    }

    #[tokio::test]
    async fn sorting_is_stable_with_multi_key_ordering() {
        let store = MemoryAssetStore::new();
        store.insert(asset("t1", "c", None, 20));
        store.insert(asset("t1", "a", None, 30));
        store.insert(asset("t1", "b", None, 30));

        let page = PageSpec {
            order: PageOrder::Sorted(vec![
                StoreSort::desc(paths::LAST_MODIFIED),
                StoreSort::asc(paths::ID),
            ]),
            skip: 0,
            take: None,
            hint: None,
        };
        let sorted = store.find_page(&everything(), &page).await.expect("sorted");
        let ids: Vec<&str> = sorted.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn seeded_shuffle_is_deterministic_per_seed() {
        let store = MemoryAssetStore::new();
        for i in 0..12 {
            store.insert(asset("t1", &format!("a{i:02}"), None, i));
        }

        let page_for = |seed| PageSpec {
            order: PageOrder::Shuffled { seed },
            skip: 0,
            take: None,
            hint: None,
        };
        let first = store
            .find_page(&everything(), &page_for(7))
            .await
            .expect("first");
        let second = store
            .find_page(&everything(), &page_for(7))
            .await
            .expect("second");
        assert_eq!(first, second);

        let other_seed = store
            .find_page(&everything(), &page_for(8))
            .await
            .expect("other");
        assert_ne!(first, other_seed);

        let mut shuffled_ids: Vec<&str> = first.iter().map(|a| a.id.as_str()).collect();
        shuffled_ids.sort_unstable();
        let expected: Vec<String> = (0..12).map(|i| format!("a{i:02}")).collect();
        assert_eq!(shuffled_ids, expected);
    }

    #[tokio::test]
    async fn oversized_sorts_are_rejected_with_the_store_code() {
        let store = MemoryAssetStore::with_config(MemoryStoreConfig { max_sort_docs: 2 });
        for i in 0..3 {
            store.insert(asset("t1", &format!("a{i}"), None, i));
        }

        let sorted = PageSpec {
            order: PageOrder::Sorted(vec![StoreSort::asc(paths::ID)]),
            skip: 0,
            take: Some(1),
            hint: None,
        };
        let err = store
            .find_page(&everything(), &sorted)
            .await
            .expect_err("too many to sort");
        assert!(err.is_sort_limit_exceeded());

        let shuffled = PageSpec {
            order: PageOrder::Shuffled { seed: 1 },
            skip: 0,
            take: None,
            hint: None,
        };
        store
            .find_page(&everything(), &shuffled)
            .await
            .expect("shuffle has no sort limit");
    }

    #[tokio::test]
    async fn skip_and_take_bound_the_page() {
        let store = MemoryAssetStore::new();
        for i in 0..5 {
            store.insert(asset("t1", &format!("a{i}"), None, i));
        }

        let page = PageSpec {
            order: PageOrder::Sorted(vec![StoreSort::asc(paths::ID)]),
            skip: 1,
            take: Some(2),
            hint: None,
        };
        let items = store.find_page(&everything(), &page).await.expect("page");
        let ids: Vec<&str> = items.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a1", "a2"]);

        let beyond = PageSpec {
            order: PageOrder::Sorted(vec![StoreSort::asc(paths::ID)]),
            skip: 50,
            take: Some(2),
            hint: None,
        };
        let empty = store.find_page(&everything(), &beyond).await.expect("empty");
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn stats_track_store_traffic_per_operation() {
        let store = MemoryAssetStore::new();
        store.insert(asset("t1", "a1", None, 1));

        store
            .find_page(&everything(), &unsorted_page())
            .await
            .expect("find");
        store.find_one(&everything()).await.expect("find one");
        store.find_ids(&everything()).await.expect("find ids");
        store.count(&everything()).await.expect("count");
        drop(store.stream(everything()));

        assert_eq!(store.stats().finds(), 1);
        assert_eq!(store.stats().hinted_finds(), 0);
        assert_eq!(store.stats().lookups(), 2);
        assert_eq!(store.stats().counts(), 1);
        assert_eq!(store.stats().streams(), 1);
    }
}
