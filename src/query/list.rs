use super::filter::FilterExpr;
use crate::model::AssetId;
use crate::store::Order;

/// One listing request, immutable once handed to the repository.
///
/// An explicit id set is mutually exclusive with the other addressing
/// shapes; when `ids` is present and non-empty the filter and sort
/// specification are ignored and the stable default ordering applies. An
/// empty id set is treated as if no ids were given.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListQuery {
    pub ids: Option<Vec<AssetId>>,
    pub filter: Option<FilterExpr>,
    pub sort: Vec<(String, Order)>,
    pub skip: usize,
    pub take: Option<usize>,
    pub random_seed: Option<u64>,
    pub no_total: bool,
    pub no_slow_total: bool,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(mut self, ids: &[AssetId]) -> Self {
        self.ids = Some(ids.to_vec());
        self
    }

    pub fn where_(mut self, expr: FilterExpr) -> Self {
        self.filter = Some(expr);
        self
    }

    pub fn order_by(mut self, field: &str, order: Order) -> Self {
        self.sort.push((field.to_string(), order));
        self
    }

    pub fn skip(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    pub fn take(mut self, n: usize) -> Self {
        self.take = Some(n);
        self
    }

    /// Replaces sorting with a deterministic pseudo-random permutation
    /// keyed to `seed`.
    pub fn random(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// The caller does not want a total at all.
    pub fn no_total(mut self) -> Self {
        self.no_total = true;
        self
    }

    /// The caller accepts an unknown total rather than pay for an expensive
    /// count; cheap and cached totals are still returned.
    pub fn no_slow_total(mut self) -> Self {
        self.no_slow_total = true;
        self
    }
}
