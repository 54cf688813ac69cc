use crate::config::TreeConfig;
use crate::core::{LabelSummary, Region};
use crate::error::{MondrianError, Result};
use crate::mondrian::cache::{CacheKey, CacheTable, Mutation};
use crate::mondrian::nodes::{Branch, LeafNode, Node, NodeId, NodeKind};
use crate::warning::{Prediction, Warning};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Labeled,
    Unlabeled,
}

/// Mondrian-process partition of a bounded feature space, used as a
/// piecewise-constant regressor with active-learning label budgeting.
pub struct MondrianTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) bounds: Region,

    pub(crate) points: Vec<Vec<f64>>,
    pub(crate) labels: Vec<Option<f64>>,
    pub(crate) num_labeled: usize,

    pub(crate) num_leaves: usize,
    pub(crate) life_time: f64,

    pub(crate) config: TreeConfig,
    pub(crate) prediction_default: f64,
    pub(crate) default_variance: f64,

    pub(crate) caches: CacheTable,
    pub(crate) leaf_list: Vec<NodeId>,
    pub(crate) mean_list: Vec<f64>,
    pub(crate) var_list: Vec<f64>,
    pub(crate) marginal_list: Vec<f64>,
    pub(crate) al_proportions: Vec<f64>,
    pub(crate) al_proportions_warning: Option<Warning>,
}

impl MondrianTree {
    pub fn new(bounds: Region) -> Self {
        Self::with_config(bounds, TreeConfig::default())
    }

    pub fn with_config(bounds: Region, config: TreeConfig) -> Self {
        let root = Node::new_leaf(bounds.clone(), None, Branch::Root);
        Self {
            nodes: vec![root],
            root: NodeId(0),
            bounds,
            points: Vec::new(),
            labels: Vec::new(),
            num_labeled: 0,
            num_leaves: 1,
            life_time: 0.0,
            prediction_default: config.prediction_default,
            default_variance: config.default_variance,
            config,
            caches: CacheTable::new(),
            leaf_list: Vec::new(),
            mean_list: Vec::new(),
            var_list: Vec::new(),
            marginal_list: Vec::new(),
            al_proportions: Vec::new(),
            al_proportions_warning: None,
        }
    }

    pub fn from_bounds(bounds: Vec<(f64, f64)>) -> Result<Self> {
        Ok(Self::new(Region::new(bounds)?))
    }

    pub fn bounds(&self) -> &Region {
        &self.bounds
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn dimensions(&self) -> usize {
        self.bounds.dimensions()
    }

    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    pub fn life_time(&self) -> f64 {
        self.life_time
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Points in a labeled set, including sampled points still waiting for a value.
    pub fn num_labeled(&self) -> usize {
        self.num_labeled
    }

    pub fn points(&self) -> &[Vec<f64>] {
        &self.points
    }

    pub fn labels(&self) -> &[Option<f64>] {
        &self.labels
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_extent(&self) -> f64 {
        self.nodes[self.root.0].extent()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn prediction_default(&self) -> f64 {
        self.prediction_default
    }

    pub fn set_prediction_default(&mut self, value: f64) {
        self.prediction_default = value;
    }

    pub fn default_variance(&self) -> f64 {
        self.default_variance
    }

    /// Fails with [`MondrianError::InvalidDefaultVariance`] on negative or
    /// non-finite values and keeps the previous default.
    pub fn set_default_variance(&mut self, value: f64) -> Result<()> {
        if !(value.is_finite() && value >= 0.0) {
            return Err(MondrianError::InvalidDefaultVariance(value));
        }
        self.default_variance = value;
        self.caches.invalidate(CacheKey::Proportions);
        Ok(())
    }

    pub fn set_default_prediction_to_global_mean(&mut self) {
        self.prediction_default = self.global_summary().mean();
    }

    /// Sets the active-learning default variance to the unbiased variance of
    /// every labeled value, or `0` with fewer than two.
    pub fn set_default_variance_to_global_variance(&mut self) -> Result<()> {
        let variance = self.global_summary().variance();
        self.set_default_variance(variance)
    }

    fn global_summary(&self) -> LabelSummary {
        LabelSummary::from_values(self.labels.iter().flatten().copied())
    }

    pub(crate) fn check_point(&self, point: &[f64]) -> Result<()> {
        if point.len() != self.dimensions() {
            return Err(MondrianError::DimensionMismatch {
                expected: self.dimensions(),
                found: point.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn leaf(&self, id: NodeId) -> &LeafNode {
        self.nodes[id.0]
            .as_leaf()
            .expect("routing only ever yields leaves")
    }

    pub(crate) fn leaf_mut(&mut self, id: NodeId) -> &mut LeafNode {
        self.nodes[id.0]
            .as_leaf_mut()
            .expect("routing only ever yields leaves")
    }

    pub(crate) fn route_from(&self, from: NodeId, point: &[f64]) -> NodeId {
        let mut current = from;
        loop {
            match self.nodes[current.0].kind() {
                NodeKind::Leaf(_) => return current,
                NodeKind::Split(split) => current = split.child_for_point(point),
            }
        }
    }

    /// Leaf whose cell contains `point`. Points on a split hyperplane go to
    /// the right (upper) side.
    pub fn route(&self, point: &[f64]) -> Result<NodeId> {
        self.check_point(point)?;
        Ok(self.route_from(self.root, point))
    }

    pub fn leaf_position_of(&mut self, point: &[f64]) -> Result<usize> {
        let leaf = self.route(point)?;
        self.ensure(CacheKey::LeafList);
        Ok(self
            .leaf(leaf)
            .leaf_list_position()
            .expect("fresh leaf list assigns every position"))
    }

    pub fn points_in_same_leaf(&self, point: &[f64], membership: Membership) -> Result<Vec<usize>> {
        let leaf = self.leaf(self.route(point)?);
        Ok(match membership {
            Membership::Labeled => leaf.labeled().to_vec(),
            Membership::Unlabeled => leaf.unlabeled().to_vec(),
        })
    }

    /// Replaces the point set. `labeled_indices[i]` receives `labels[i]`;
    /// every other point starts unlabeled.
    pub fn ingest(
        &mut self,
        points: Vec<Vec<f64>>,
        labeled_indices: &[usize],
        labels: &[f64],
    ) -> Result<()> {
        if labeled_indices.len() > points.len() {
            return Err(MondrianError::TooManyLabels {
                labeled: labeled_indices.len(),
                points: points.len(),
            });
        }
        if labeled_indices.len() != labels.len() {
            return Err(MondrianError::LengthMismatch {
                labeled_indices: labeled_indices.len(),
                labels: labels.len(),
            });
        }
        for point in &points {
            self.check_point(point)?;
        }
        let mut seen = HashSet::with_capacity(labeled_indices.len());
        for &index in labeled_indices {
            if index >= points.len() {
                return Err(MondrianError::IndexOutOfRange {
                    index,
                    len: points.len(),
                });
            }
            if !seen.insert(index) {
                return Err(MondrianError::DuplicateLabeledIndex(index));
            }
        }

        let mut new_labels = vec![None; points.len()];
        for (&index, &value) in labeled_indices.iter().zip(labels) {
            new_labels[index] = Some(value);
        }

        for node in &mut self.nodes {
            if let Some(leaf) = node.as_leaf_mut() {
                leaf.clear();
            }
        }
        for (index, point) in points.iter().enumerate() {
            let leaf = self.route_from(self.root, point);
            let leaf = self.leaf_mut(leaf);
            if new_labels[index].is_some() {
                leaf.push_labeled(index);
            } else {
                leaf.push_unlabeled(index);
            }
        }

        self.points = points;
        self.labels = new_labels;
        self.num_labeled = labeled_indices.len();
        self.caches.apply(Mutation::Membership);

        tracing::info!(
            points = self.points.len(),
            labeled = self.num_labeled,
            "ingested point set"
        );
        Ok(())
    }

    /// Appends one point, labeled when `label` is given. Returns its index.
    pub fn add_point(&mut self, point: Vec<f64>, label: Option<f64>) -> Result<usize> {
        self.check_point(&point)?;

        let index = self.points.len();
        let leaf = self.route_from(self.root, &point);
        let leaf = self.leaf_mut(leaf);
        match label {
            Some(_) => leaf.push_labeled(index),
            None => leaf.push_unlabeled(index),
        }
        if label.is_some() {
            self.num_labeled += 1;
        }

        self.points.push(point);
        self.labels.push(label);
        self.caches.apply(Mutation::Membership);
        Ok(index)
    }

    /// Gives point `index` its label. The point must be unlabeled in its leaf,
    /// or sampled with commit and still waiting for a value.
    pub fn label_point(&mut self, index: usize, value: f64) -> Result<()> {
        if index >= self.points.len() {
            return Err(MondrianError::IndexOutOfRange {
                index,
                len: self.points.len(),
            });
        }
        if self.labels[index].is_some() {
            return Err(MondrianError::NotUnlabeled(index));
        }

        let leaf_id = self.route_from(self.root, &self.points[index]);
        let leaf = self.leaf_mut(leaf_id);
        if !leaf.labeled().contains(&index) {
            leaf.make_labeled(index)?;
            self.num_labeled += 1;
        }

        self.labels[index] = Some(value);
        self.caches.apply(Mutation::Labels);
        Ok(())
    }

    pub(crate) fn leaf_summary(&self, leaf: &LeafNode) -> LabelSummary {
        LabelSummary::from_values(leaf.labeled().iter().filter_map(|&i| self.labels[i]))
    }

    /// Mean label of `point`'s leaf, or [`Prediction::Fallback`] with the
    /// default when the leaf has no labeled values.
    pub fn predict(&self, point: &[f64]) -> Result<Prediction> {
        let leaf = self.leaf(self.route(point)?);
        if !leaf.labeled().iter().any(|&i| self.labels[i].is_some()) {
            tracing::warn!(default = self.prediction_default, "no labeled data in leaf");
            return Ok(Prediction::Fallback(self.prediction_default));
        }

        let mean = match leaf.leaf_list_position() {
            Some(pos) if self.caches.is_fresh(CacheKey::Means) => self.mean_list[pos],
            _ => self.leaf_summary(leaf).mean(),
        };
        Ok(Prediction::LeafMean(mean))
    }

    pub fn predict_batch(&self, points: &[Vec<f64>]) -> Result<Vec<Prediction>> {
        points.iter().map(|p| self.predict(p)).collect()
    }

    pub fn leaf_regions(&mut self) -> Vec<Region> {
        self.ensure(CacheKey::LeafList);
        self.leaf_list
            .iter()
            .map(|id| self.nodes[id.0].region().clone())
            .collect()
    }

    pub fn total_leaf_extent(&mut self) -> f64 {
        self.ensure(CacheKey::LeafList);
        self.leaf_list.iter().map(|id| self.nodes[id.0].extent()).sum()
    }
}

/// `n^(1/(2+d)) − 1`: the life time that balances cell size against the
/// number of labels `n` in `d` dimensions.
pub fn suggested_life_time(num_labels: usize, dimensions: usize) -> f64 {
    (num_labels as f64).powf(1.0 / (2.0 + dimensions as f64)) - 1.0
}

impl fmt::Display for MondrianTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dimensions={}, leaves={}, life_time={}, points={}, labeled={}",
            self.dimensions(),
            self.num_leaves,
            self.life_time,
            self.points.len(),
            self.num_labeled
        )
    }
}

impl fmt::Debug for MondrianTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MondrianTree")
            .field("bounds", &self.bounds)
            .field("num_leaves", &self.num_leaves)
            .field("life_time", &self.life_time)
            .field("num_points", &self.points.len())
            .field("num_labeled", &self.num_labeled)
            .finish()
    }
}
