use crate::model::{AssetId, DocKey, FieldValue, ParentScope, TenantId};
use crate::store::{StoreFilter, paths};

/// The closed set of ways assets are addressed.
///
/// Exactly one shape applies per request. Each shape builds its own storage
/// predicate; all of them conjoin tenant scope, and all except the explicit
/// escape hatches conjoin the soft-delete exclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryShape {
    /// Explicit id set. Deletion is never bypassed in this shape.
    ByIds { ids: Vec<AssetId> },
    /// Listing under a parent scope, optionally narrowed by a translated
    /// caller filter.
    ByParent {
        parent: ParentScope,
        filter: Option<StoreFilter>,
    },
    /// Slug lookup.
    BySlug { slug: String, include_deleted: bool },
    /// Single asset by id.
    ById {
        id: AssetId,
        include_deleted: bool,
    },
    /// Duplicate detection by content hash. Size and file name are part of
    /// the predicate because a hash alone does not rule out coincidental
    /// collisions combined with renamed or resized duplicates.
    ByHash {
        hash: String,
        file_name: String,
        file_size: i64,
    },
}

impl QueryShape {
    /// True for a listing carrying only tenant and parent scope. This is the
    /// one shape eligible for the count cache.
    pub fn is_default_listing(&self) -> bool {
        matches!(self, QueryShape::ByParent { filter: None, .. })
    }

    /// Builds the storage predicate for this shape under `tenant`.
    pub fn to_filter(&self, tenant: &TenantId) -> StoreFilter {
        match self {
            QueryShape::ByIds { ids } => {
                let keys = ids
                    .iter()
                    .map(|id| FieldValue::Text(DocKey::combine(tenant, id).into_string()))
                    .collect();
                StoreFilter::In(paths::KEY, keys).and(not_deleted())
            }
            QueryShape::ByParent { parent, filter } => {
                let mut combined = tenant_is(tenant).and(not_deleted());
                combined = match parent {
                    ParentScope::Any => combined,
                    ParentScope::Root => combined.and(StoreFilter::IsNull(paths::PARENT_ID)),
                    ParentScope::Folder(id) => combined.and(StoreFilter::Eq(
                        paths::PARENT_ID,
                        FieldValue::Text(id.as_str().to_string()),
                    )),
                };
                match filter {
                    Some(extra) => combined.and(extra.clone()),
                    None => combined,
                }
            }
            QueryShape::BySlug {
                slug,
                include_deleted,
            } => {
                let matched = tenant_is(tenant)
                    .and(StoreFilter::Eq(paths::SLUG, FieldValue::Text(slug.clone())));
                if *include_deleted {
                    matched
                } else {
                    matched.and(not_deleted())
                }
            }
            QueryShape::ById {
                id,
                include_deleted,
            } => {
                let matched = StoreFilter::Eq(
                    paths::KEY,
                    FieldValue::Text(DocKey::combine(tenant, id).into_string()),
                );
                if *include_deleted {
                    matched
                } else {
                    matched.and(not_deleted())
                }
            }
            QueryShape::ByHash {
                hash,
                file_name,
                file_size,
            } => tenant_is(tenant)
                .and(StoreFilter::Eq(
                    paths::FILE_HASH,
                    FieldValue::Text(hash.clone()),
                ))
                .and(not_deleted())
                .and(StoreFilter::Eq(
                    paths::FILE_SIZE,
                    FieldValue::Integer(*file_size),
                ))
                .and(StoreFilter::Eq(
                    paths::FILE_NAME,
                    FieldValue::Text(file_name.clone()),
                )),
        }
    }
}

pub(crate) fn tenant_is(tenant: &TenantId) -> StoreFilter {
    StoreFilter::Eq(paths::TENANT_ID, FieldValue::Text(tenant.as_str().to_string()))
}

pub(crate) fn not_deleted() -> StoreFilter {
    StoreFilter::Ne(paths::DELETED, FieldValue::Boolean(true))
}

#[cfg(test)]
mod tests {
    use super::{QueryShape, not_deleted, tenant_is};
    use crate::model::{AssetId, FieldValue, ParentScope, TenantId};
    use crate::store::{StoreFilter, paths};

    fn tenant() -> TenantId {
        TenantId::from("t1")
    }

    fn contains_leaf(filter: &StoreFilter, leaf: &StoreFilter) -> bool {
        if filter == leaf {
            return true;
        }
        match filter {
            StoreFilter::And(left, right) | StoreFilter::Or(left, right) => {
                contains_leaf(left, leaf) || contains_leaf(right, leaf)
            }
            StoreFilter::Not(inner) => contains_leaf(inner, leaf),
            _ => false,
        }
    }

    #[test]
    fn every_shape_is_tenant_scoped() {
        let shapes = [
            QueryShape::ByIds {
                ids: vec![AssetId::from("a1")],
            },
            QueryShape::ByParent {
                parent: ParentScope::Root,
                filter: None,
            },
            QueryShape::BySlug {
                slug: "logo".into(),
                include_deleted: true,
            },
            QueryShape::ById {
                id: AssetId::from("a1"),
                include_deleted: true,
            },
            QueryShape::ByHash {
                hash: "h".into(),
                file_name: "f".into(),
                file_size: 1,
            },
        ];
        for shape in shapes {
            let filter = shape.to_filter(&tenant());
            let scoped = contains_leaf(&filter, &tenant_is(&tenant()))
                || contains_leaf(
                    &filter,
                    &StoreFilter::Eq(paths::KEY, FieldValue::Text("t1--a1".into())),
                )
                || contains_leaf(
                    &filter,
                    &StoreFilter::In(paths::KEY, vec![FieldValue::Text("t1--a1".into())]),
                );
            assert!(scoped, "shape without tenant scope: {shape:?}");
        }
    }

    #[test]
    fn by_ids_combines_keys_and_never_bypasses_deletion() {
        let shape = QueryShape::ByIds {
            ids: vec![AssetId::from("a1"), AssetId::from("a2")],
        };
        let filter = shape.to_filter(&tenant());
        assert_eq!(
            filter,
            StoreFilter::In(paths::KEY, vec![
                FieldValue::Text("t1--a1".into()),
                FieldValue::Text("t1--a2".into()),
            ])
            .and(not_deleted())
        );
    }

    #[test]
    fn parent_scopes_build_distinct_clauses() {
        let any = QueryShape::ByParent {
            parent: ParentScope::Any,
            filter: None,
        }
        .to_filter(&tenant());
        assert_eq!(any, tenant_is(&tenant()).and(not_deleted()));

        let root = QueryShape::ByParent {
            parent: ParentScope::Root,
            filter: None,
        }
        .to_filter(&tenant());
        assert!(contains_leaf(&root, &StoreFilter::IsNull(paths::PARENT_ID)));

        let folder = QueryShape::ByParent {
            parent: ParentScope::Folder(AssetId::from("f1")),
            filter: None,
        }
        .to_filter(&tenant());
        assert!(contains_leaf(
            &folder,
            &StoreFilter::Eq(paths::PARENT_ID, FieldValue::Text("f1".into()))
        ));
    }

    #[test]
    fn only_the_unfiltered_parent_listing_is_default() {
        let default = QueryShape::ByParent {
            parent: ParentScope::Folder(AssetId::from("f1")),
            filter: None,
        };
        assert!(default.is_default_listing());

        let filtered = QueryShape::ByParent {
            parent: ParentScope::Folder(AssetId::from("f1")),
            filter: Some(not_deleted()),
        };
        assert!(!filtered.is_default_listing());

        let by_ids = QueryShape::ByIds {
            ids: vec![AssetId::from("a1")],
        };
        assert!(!by_ids.is_default_listing());
    }

    #[test]
    fn lookup_escape_hatches_drop_the_deletion_clause_only_when_asked() {
        let hidden = QueryShape::BySlug {
            slug: "logo".into(),
            include_deleted: false,
        }
        .to_filter(&tenant());
        assert!(contains_leaf(&hidden, &not_deleted()));

        let visible = QueryShape::BySlug {
            slug: "logo".into(),
            include_deleted: true,
        }
        .to_filter(&tenant());
        assert!(!contains_leaf(&visible, &not_deleted()));

        let visible_by_id = QueryShape::ById {
            id: AssetId::from("a1"),
            include_deleted: true,
        }
        .to_filter(&tenant());
        assert!(!contains_leaf(&visible_by_id, &not_deleted()));
    }

    #[test]
    fn hash_lookup_requires_all_identifying_fields() {
        let filter = QueryShape::ByHash {
            hash: "h9".into(),
            file_name: "photo.jpg".into(),
            file_size: 2048,
        }
        .to_filter(&tenant());
        for leaf in [
            StoreFilter::Eq(paths::FILE_HASH, FieldValue::Text("h9".into())),
            StoreFilter::Eq(paths::FILE_SIZE, FieldValue::Integer(2048)),
            StoreFilter::Eq(paths::FILE_NAME, FieldValue::Text("photo.jpg".into())),
            not_deleted(),
        ] {
            assert!(contains_leaf(&filter, &leaf), "missing {leaf:?}");
        }
    }
}
