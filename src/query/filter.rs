use crate::error::AssetQueryError;
use crate::model::FieldValue;
use serde::{Deserialize, Serialize};

/// Maximum nesting depth for filter trees to prevent stack overflow
const MAX_FILTER_DEPTH: usize = 32;

/// Caller-facing filter over logical asset field names.
///
/// Leaves carry logical names ("fileName", "folder", "tags", ...); the
/// translator rewrites them to storage paths and rejects unknown names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterExpr {
    Eq(String, FieldValue),
    Ne(String, FieldValue),
    Lt(String, FieldValue),
    Lte(String, FieldValue),
    Gt(String, FieldValue),
    Gte(String, FieldValue),
    In(String, Vec<FieldValue>),
    IsNull(String),
    IsNotNull(String),
    And(Box<FilterExpr>, Box<FilterExpr>),
    Or(Box<FilterExpr>, Box<FilterExpr>),
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    pub fn and(self, rhs: FilterExpr) -> FilterExpr {
        FilterExpr::And(Box::new(self), Box::new(rhs))
    }

    pub fn or(self, rhs: FilterExpr) -> FilterExpr {
        FilterExpr::Or(Box::new(self), Box::new(rhs))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> FilterExpr {
        FilterExpr::Not(Box::new(self))
    }

    /// Calculates the maximum nesting depth of this filter tree.
    pub fn depth(&self) -> usize {
        match self {
            FilterExpr::Eq(_, _)
            | FilterExpr::Ne(_, _)
            | FilterExpr::Lt(_, _)
            | FilterExpr::Lte(_, _)
            | FilterExpr::Gt(_, _)
            | FilterExpr::Gte(_, _)
            | FilterExpr::In(_, _)
            | FilterExpr::IsNull(_)
            | FilterExpr::IsNotNull(_) => 1,
            FilterExpr::Not(inner) => 1 + inner.depth(),
            FilterExpr::And(left, right) | FilterExpr::Or(left, right) => {
                1 + left.depth().max(right.depth())
            }
        }
    }

    /// Validates that the filter depth does not exceed MAX_FILTER_DEPTH.
    pub fn validate_depth(&self) -> Result<(), AssetQueryError> {
        let depth = self.depth();
        if depth > MAX_FILTER_DEPTH {
            return Err(AssetQueryError::InvalidFilter(format!(
                "filter depth {} exceeds maximum allowed depth of {}",
                depth, MAX_FILTER_DEPTH
            )));
        }
        Ok(())
    }
}

/// A logical field reference for building filter leaves.
pub struct FieldRef(String);

pub fn field(name: &str) -> FieldRef {
    FieldRef(name.to_string())
}

pub trait IntoFieldValue {
    fn into_field_value(self) -> FieldValue;
}

impl IntoFieldValue for FieldValue {
    fn into_field_value(self) -> FieldValue {
        self
    }
}

impl IntoFieldValue for bool {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Boolean(self)
    }
}

impl IntoFieldValue for i64 {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Integer(self)
    }
}

impl IntoFieldValue for i32 {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Integer(self as i64)
    }
}

impl IntoFieldValue for String {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Text(self)
    }
}

impl IntoFieldValue for &str {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Text(self.to_string())
    }
}

pub fn lit<T: IntoFieldValue>(value: T) -> FieldValue {
    value.into_field_value()
}

impl FieldRef {
    pub fn eq(self, value: FieldValue) -> FilterExpr {
        FilterExpr::Eq(self.0, value)
    }

    pub fn neq(self, value: FieldValue) -> FilterExpr {
        FilterExpr::Ne(self.0, value)
    }

    pub fn gt(self, value: FieldValue) -> FilterExpr {
        FilterExpr::Gt(self.0, value)
    }

    pub fn gte(self, value: FieldValue) -> FilterExpr {
        FilterExpr::Gte(self.0, value)
    }

    pub fn lt(self, value: FieldValue) -> FilterExpr {
        FilterExpr::Lt(self.0, value)
    }

    pub fn lte(self, value: FieldValue) -> FilterExpr {
        FilterExpr::Lte(self.0, value)
    }

    pub fn in_list(self, values: Vec<FieldValue>) -> FilterExpr {
        FilterExpr::In(self.0, values)
    }

    pub fn is_null(self) -> FilterExpr {
        FilterExpr::IsNull(self.0)
    }

    pub fn is_not_null(self) -> FilterExpr {
        FilterExpr::IsNotNull(self.0)
    }
}
