//! World construction parameters.

/// Capacity hints and validation mode for a `World`.
///
/// Every capacity is a starting size, not a limit: all
/// tables grow by doubling when they fill up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WorldConfig {
    /// Initial size of the entity slot table.
    pub entities: usize,
    /// Initial size of the recycled entity id stack.
    pub recycled_entities: usize,
    /// Expected number of component types.
    pub pools: usize,
    /// Expected number of distinct filters.
    pub filters: usize,
    /// Initial number of dense value slots per pool.
    pub pool_dense: usize,
    /// Lower bound for the sparse array of each pool. The sparse
    /// array always covers the whole entity slot table.
    pub pool_sparse: usize,
    /// Initial size of the recycled dense slot stack per pool.
    pub pool_recycled: usize,
    /// Enables liveness checks on entity access and the
    /// leaked-entity guard.
    pub validation: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entities: 512,
            recycled_entities: 512,
            pools: 512,
            filters: 512,
            pool_dense: 512,
            pool_sparse: 512,
            pool_recycled: 512,
            validation: cfg!(debug_assertions),
        }
    }
}

impl WorldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entities(mut self, entities: usize) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_recycled_entities(mut self, recycled: usize) -> Self {
        self.recycled_entities = recycled;
        self
    }

    pub fn with_pools(mut self, pools: usize) -> Self {
        self.pools = pools;
        self
    }

    pub fn with_filters(mut self, filters: usize) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_pool_dense(mut self, dense: usize) -> Self {
        self.pool_dense = dense;
        self
    }

    pub fn with_pool_sparse(mut self, sparse: usize) -> Self {
        self.pool_sparse = sparse;
        self
    }

    pub fn with_pool_recycled(mut self, recycled: usize) -> Self {
        self.pool_recycled = recycled;
        self
    }

    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }
}
