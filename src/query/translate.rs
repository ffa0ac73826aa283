use super::filter::FilterExpr;
use crate::error::AssetQueryError;
use crate::store::{Order, StoreFilter, StoreSort, paths};

/// Maps a logical field name onto its storage path.
///
/// Tenant scope, the deleted flag, and the composite key are never
/// caller-addressable, so they are absent here on purpose.
fn storage_path(field: &str) -> Option<&'static str> {
    let path = match field {
        "id" => paths::ID,
        "slug" => paths::SLUG,
        "fileName" => paths::FILE_NAME,
        "fileHash" => paths::FILE_HASH,
        "fileSize" => paths::FILE_SIZE,
        "mimeType" => paths::MIME_TYPE,
        "created" => paths::CREATED,
        "lastModified" => paths::LAST_MODIFIED,
        "tags" => paths::TAGS,
        "folder" | "parentId" => paths::PARENT_ID,
        _ => return None,
    };
    Some(path)
}

fn resolve(field: &str) -> Result<&'static str, AssetQueryError> {
    storage_path(field).ok_or_else(|| AssetQueryError::InvalidField {
        field: field.to_string(),
    })
}

/// Rewrites every leaf of `expr` onto storage paths.
///
/// Fails fast on unknown field names, before any store round-trip.
pub fn translate_filter(expr: &FilterExpr) -> Result<StoreFilter, AssetQueryError> {
    expr.validate_depth()?;
    translate_expr(expr)
}

fn translate_expr(expr: &FilterExpr) -> Result<StoreFilter, AssetQueryError> {
    let translated = match expr {
        FilterExpr::Eq(field, value) => StoreFilter::Eq(resolve(field)?, value.clone()),
        FilterExpr::Ne(field, value) => StoreFilter::Ne(resolve(field)?, value.clone()),
        FilterExpr::Lt(field, value) => StoreFilter::Lt(resolve(field)?, value.clone()),
        FilterExpr::Lte(field, value) => StoreFilter::Lte(resolve(field)?, value.clone()),
        FilterExpr::Gt(field, value) => StoreFilter::Gt(resolve(field)?, value.clone()),
        FilterExpr::Gte(field, value) => StoreFilter::Gte(resolve(field)?, value.clone()),
        FilterExpr::In(field, values) => StoreFilter::In(resolve(field)?, values.clone()),
        FilterExpr::IsNull(field) => StoreFilter::IsNull(resolve(field)?),
        FilterExpr::IsNotNull(field) => StoreFilter::IsNotNull(resolve(field)?),
        FilterExpr::And(left, right) => translate_expr(left)?.and(translate_expr(right)?),
        FilterExpr::Or(left, right) => translate_expr(left)?.or(translate_expr(right)?),
        FilterExpr::Not(inner) => translate_expr(inner)?.not(),
    };
    Ok(translated)
}

/// The stable default ordering: newest first, ascending id as tie-break.
pub fn default_sort() -> Vec<StoreSort> {
    vec![
        StoreSort::desc(paths::LAST_MODIFIED),
        StoreSort::asc(paths::ID),
    ]
}

/// Translates a caller sort specification onto storage paths.
///
/// An empty specification becomes the default sort. A specification that
/// never mentions `id` gets an ascending-id tie-break appended so equal sort
/// keys cannot reorder between requests and pagination stays deterministic.
pub fn translate_sort(sort: &[(String, Order)]) -> Result<Vec<StoreSort>, AssetQueryError> {
    if sort.is_empty() {
        return Ok(default_sort());
    }
    let mut translated = Vec::with_capacity(sort.len() + 1);
    for (field, order) in sort {
        translated.push(StoreSort {
            path: resolve(field)?,
            order: *order,
        });
    }
    if !translated.iter().any(|s| s.path == paths::ID) {
        translated.push(StoreSort::asc(paths::ID));
    }
    Ok(translated)
}
