use crate::mondrian::mondrian_tree::MondrianTree;
use crate::mondrian::nodes::{NodeId, NodeKind};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumCount, EnumIter};

/// Per-leaf derived lists kept by the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumCount)]
#[strum(serialize_all = "snake_case")]
pub enum CacheKey {
    LeafList,
    Means,
    Variances,
    Marginals,
    Proportions,
}

impl CacheKey {
    /// Caches that must be fresh before this one can be rebuilt.
    pub fn depends_on(self) -> &'static [CacheKey] {
        match self {
            CacheKey::LeafList => &[],
            CacheKey::Means | CacheKey::Variances | CacheKey::Marginals => &[CacheKey::LeafList],
            CacheKey::Proportions => &[CacheKey::Variances, CacheKey::Marginals],
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Events that make cached lists stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// A leaf was split.
    Topology,
    /// Points were added to or replaced in the leaves.
    Membership,
    /// A label value changed.
    Labels,
}

impl Mutation {
    fn roots(self) -> &'static [CacheKey] {
        match self {
            Mutation::Topology => &[CacheKey::LeafList],
            Mutation::Membership => &[CacheKey::Marginals, CacheKey::Means, CacheKey::Variances],
            Mutation::Labels => &[CacheKey::Means, CacheKey::Variances],
        }
    }
}

/// Freshness flags with transitive invalidation along [`CacheKey::depends_on`].
#[derive(Debug, Clone)]
pub struct CacheTable {
    fresh: [bool; <CacheKey as strum::EnumCount>::COUNT],
}

impl Default for CacheTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheTable {
    pub fn new() -> Self {
        Self {
            fresh: [false; <CacheKey as strum::EnumCount>::COUNT],
        }
    }

    pub fn is_fresh(&self, key: CacheKey) -> bool {
        self.fresh[key.slot()]
    }

    pub fn mark_fresh(&mut self, key: CacheKey) {
        debug_assert!(
            key.depends_on().iter().all(|dep| self.is_fresh(*dep)),
            "{key} marked fresh before its dependencies"
        );
        self.fresh[key.slot()] = true;
    }

    /// Marks `key` and everything derived from it stale.
    pub fn invalidate(&mut self, key: CacheKey) {
        self.fresh[key.slot()] = false;
        for dependent in CacheKey::iter().filter(|d| d.depends_on().contains(&key)) {
            self.invalidate(dependent);
        }
    }

    pub fn apply(&mut self, mutation: Mutation) {
        for &key in mutation.roots() {
            self.invalidate(key);
        }
    }
}

impl MondrianTree {
    /// Rebuilds `key` and any stale dependency.
    pub(crate) fn ensure(&mut self, key: CacheKey) {
        if self.caches.is_fresh(key) {
            return;
        }
        for &dep in key.depends_on() {
            self.ensure(dep);
        }

        tracing::debug!(cache = %key, leaves = self.num_leaves, "rebuilding cache");
        match key {
            CacheKey::LeafList => self.rebuild_leaf_list(),
            CacheKey::Means => self.rebuild_means(),
            CacheKey::Variances => self.rebuild_variances(),
            CacheKey::Marginals => self.rebuild_marginals(),
            CacheKey::Proportions => self.rebuild_proportions(),
        }
        self.caches.mark_fresh(key);
    }

    pub fn is_cache_fresh(&self, key: CacheKey) -> bool {
        self.caches.is_fresh(key)
    }

    fn rebuild_leaf_list(&mut self) {
        let mut leaves = Vec::with_capacity(self.num_leaves);
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match self.nodes[id.0].kind() {
                NodeKind::Leaf(_) => leaves.push(id),
                NodeKind::Split(split) => {
                    stack.push(split.right());
                    stack.push(split.left());
                }
            }
        }
        debug_assert_eq!(leaves.len(), self.num_leaves, "leaf count out of sync");

        for (position, &id) in leaves.iter().enumerate() {
            self.leaf_mut(id).set_leaf_list_position(position);
        }
        self.leaf_list = leaves;
    }

    fn rebuild_means(&mut self) {
        self.mean_list = self
            .leaf_list
            .iter()
            .map(|&id| self.leaf_summary(self.leaf(id)).mean())
            .collect();
    }

    fn rebuild_variances(&mut self) {
        self.var_list = self
            .leaf_list
            .iter()
            .map(|&id| self.leaf_summary(self.leaf(id)).variance())
            .collect();
    }

    fn rebuild_marginals(&mut self) {
        let total = self.points.len();
        self.marginal_list = self
            .leaf_list
            .iter()
            .map(|&id| {
                if total == 0 {
                    0.0
                } else {
                    self.leaf(id).num_points() as f64 / total as f64
                }
            })
            .collect();
    }

    /// Leaves in left-to-right depth-first order.
    pub fn leaf_list(&mut self) -> &[NodeId] {
        self.ensure(CacheKey::LeafList);
        &self.leaf_list
    }

    pub fn leaf_ids(&mut self) -> Vec<NodeId> {
        self.leaf_list().to_vec()
    }

    /// Mean label per leaf, `0` for leaves without labeled values.
    pub fn leaf_means(&mut self) -> &[f64] {
        self.ensure(CacheKey::Means);
        &self.mean_list
    }

    /// Unbiased label variance per leaf, `0` below two labeled values.
    pub fn leaf_variances(&mut self) -> &[f64] {
        self.ensure(CacheKey::Variances);
        &self.var_list
    }

    /// Share of all points that fall in each leaf.
    pub fn leaf_marginals(&mut self) -> &[f64] {
        self.ensure(CacheKey::Marginals);
        &self.marginal_list
    }
}
