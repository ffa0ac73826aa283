use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Tenant identifier. Every stored record and every query is scoped to
/// exactly one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TenantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Asset identifier, unique within the store. Opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Composite storage key. Records are partitioned per tenant, so the key a
/// document lives under is always the tenant id combined with the asset id,
/// never the bare asset id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocKey(String);

impl DocKey {
    pub fn combine(tenant: &TenantId, id: &AssetId) -> Self {
        Self(format!("{}--{}", tenant.as_str(), id.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parent addressing for listing requests.
///
/// `Any` places no constraint on the parent folder, `Root` matches assets
/// directly under the tenant root, `Folder` matches one folder's children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParentScope {
    Any,
    Root,
    Folder(AssetId),
}

/// A stored asset record.
///
/// Deletion is a flag flip on `deleted`; deleted records stay in the store
/// and are excluded from queries unless a lookup explicitly opts in.
/// Timestamps are unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub tenant_id: TenantId,
    pub parent_id: Option<AssetId>,
    pub slug: String,
    pub file_name: String,
    pub file_hash: String,
    pub file_size: i64,
    pub mime_type: String,
    pub created: i64,
    pub last_modified: i64,
    pub tags: BTreeSet<String>,
    pub deleted: bool,
}

impl Asset {
    pub fn doc_key(&self) -> DocKey {
        DocKey::combine(&self.tenant_id, &self.id)
    }
}

/// A single comparable field value, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Text(String),
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}
