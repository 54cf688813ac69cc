use crate::error::{MondrianError, Result};
use crate::mondrian::cache::Mutation;
use crate::mondrian::mondrian_tree::MondrianTree;
use crate::mondrian::nodes::{Branch, Node, NodeId, NodeKind, SplitNode};
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

impl MondrianTree {
    /// Runs the Mondrian process from the current life time up to `target_time`.
    ///
    /// Every draw of the call comes from one generator, seeded by `seed`, then
    /// by `config.growth_seed`, then by OS entropy. A tree whose bounds have
    /// zero extent cannot split and only advances its life time.
    pub fn grow(&mut self, target_time: f64, seed: Option<u64>) -> Result<()> {
        if !target_time.is_finite() || target_time < self.life_time {
            return Err(MondrianError::LifeTimeDecrease {
                requested: target_time,
                current: self.life_time,
            });
        }

        let mut rng = match seed.or(self.config.growth_seed) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let leaves_before = self.num_leaves;
        let mut time = self.life_time;
        while let Some(wait) = self.next_split_wait(&mut rng) {
            time += wait;
            if time >= target_time {
                break;
            }

            let leaf = self.sample_leaf(&mut rng);
            let Some((dimension, value)) = self.sample_cut(leaf, &mut rng) else {
                continue;
            };
            self.split_leaf(leaf, dimension, value);
            tracing::debug!(leaf = leaf.index(), dimension, value, time, "split leaf");
        }

        self.life_time = target_time;
        tracing::info!(
            life_time = self.life_time,
            leaves = self.num_leaves,
            new_leaves = self.num_leaves - leaves_before,
            "grew tree"
        );
        Ok(())
    }

    /// Exponential waiting time until the next split with rate equal to the
    /// root extent, or `None` when the tree cannot split.
    fn next_split_wait<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<f64> {
        let rate = self.root_extent();
        if !(rate > 0.0 && rate.is_finite()) {
            return None;
        }
        let u = rng.random::<f64>();
        let u = if u == 0.0 { f64::MIN_POSITIVE } else { u };
        Some(-u.ln() / rate)
    }

    /// Walks from the root, going left with probability `left / (left + right)`
    /// by extent, so each leaf is reached with probability proportional to its extent.
    fn sample_leaf<R: Rng + ?Sized>(&self, rng: &mut R) -> NodeId {
        let mut current = self.root;
        while let NodeKind::Split(split) = self.nodes[current.0].kind() {
            let left = self.nodes[split.left().0].extent();
            let right = self.nodes[split.right().0].extent();
            current = if rng.random::<f64>() * (left + right) < left {
                split.left()
            } else {
                split.right()
            };
        }
        current
    }

    /// Dimension proportional to interval length, value uniform in that interval.
    fn sample_cut<R: Rng + ?Sized>(&self, leaf: NodeId, rng: &mut R) -> Option<(usize, f64)> {
        let region = self.nodes[leaf.0].region();
        let lengths: Vec<f64> = (0..region.dimensions()).map(|d| region.length(d)).collect();
        let dimension = WeightedIndex::new(&lengths).ok()?.sample(rng);
        let (low, high) = region.interval(dimension);
        Some((dimension, rng.random_range(low..high)))
    }

    /// Turns `leaf` into a split node in place, attaching two fresh leaves,
    /// percolating the extent change and moving the leaf's points down.
    fn split_leaf(&mut self, leaf: NodeId, dimension: usize, value: f64) {
        let (left_region, right_region) = self.nodes[leaf.0].region().split(dimension, value);
        let (labeled, unlabeled) = self.leaf_mut(leaf).take_indices();

        let left = NodeId(self.nodes.len());
        let right = NodeId(self.nodes.len() + 1);
        self.nodes
            .push(Node::new_leaf(left_region, Some(leaf), Branch::Left));
        self.nodes
            .push(Node::new_leaf(right_region, Some(leaf), Branch::Right));

        let split = SplitNode::new(dimension, value, left, right);
        for index in labeled {
            let child = split.child_for_point(&self.points[index]);
            self.leaf_mut(child).push_labeled(index);
        }
        for index in unlabeled {
            let child = split.child_for_point(&self.points[index]);
            self.leaf_mut(child).push_unlabeled(index);
        }

        let old_extent = self.nodes[leaf.0].extent();
        let new_extent = self.nodes[left.0].extent() + self.nodes[right.0].extent();
        let node = &mut self.nodes[leaf.0];
        node.set_kind(NodeKind::Split(split));
        node.set_extent(new_extent);
        let parent = node.parent();
        self.percolate_extent(parent, new_extent - old_extent);

        self.num_leaves += 1;
        self.caches.apply(Mutation::Topology);

        debug_assert!(
            (self.root_extent() - self.leaf_extent_sum()).abs()
                <= 1e-9 * self.root_extent().max(1.0),
            "root extent drifted from the sum of leaf extents"
        );
    }

    fn percolate_extent(&mut self, mut ancestor: Option<NodeId>, delta: f64) {
        if delta == 0.0 {
            return;
        }
        while let Some(id) = ancestor {
            let node = &mut self.nodes[id.0];
            node.add_extent(delta);
            ancestor = node.parent();
        }
    }

    fn leaf_extent_sum(&self) -> f64 {
        self.nodes
            .iter()
            .filter(|node| node.is_leaf())
            .map(|node| node.extent())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::Region;
    use crate::error::MondrianError;
    use crate::mondrian::mondrian_tree::MondrianTree;
    use crate::mondrian::nodes::{Branch, NodeKind};
    use crate::testing::StandardSetup;
    use approx::assert_relative_eq;

    fn grown(life_time: f64, seed: u64) -> MondrianTree {
        let mut tree = MondrianTree::new(Region::unit_cube(3).unwrap());
        tree.grow(life_time, Some(seed)).unwrap();
        tree
    }

    #[test]
    fn test_grow_zero_keeps_root() {
        let mut tree = MondrianTree::new(Region::unit_cube(3).unwrap());
        tree.grow(0.0, Some(1)).unwrap();
        assert_eq!(tree.num_leaves(), 1);
        assert!(tree.node(tree.root()).is_leaf());
    }

    #[test]
    fn test_grow_backwards_fails_and_keeps_tree() {
        let mut tree = grown(1.0, 2);
        let leaves = tree.num_leaves();
        assert_eq!(
            tree.grow(0.5, Some(2)),
            Err(MondrianError::LifeTimeDecrease {
                requested: 0.5,
                current: 1.0
            })
        );
        assert_eq!(tree.num_leaves(), leaves);
        assert_eq!(tree.life_time(), 1.0);
    }

    #[test]
    fn test_grow_non_finite_target_fails() {
        let mut tree = MondrianTree::new(Region::unit_cube(2).unwrap());
        for target in [f64::NAN, f64::INFINITY] {
            assert!(matches!(
                tree.grow(target, Some(1)),
                Err(MondrianError::LifeTimeDecrease { .. })
            ));
        }
        assert_eq!(tree.num_leaves(), 1);
        assert_eq!(tree.life_time(), 0.0);
    }

    #[test]
    fn test_grow_sets_life_time() {
        let tree = grown(0.75, 3);
        assert_eq!(tree.life_time(), 0.75);
    }

    #[test]
    fn test_zero_extent_region_only_advances_time() {
        let mut tree = MondrianTree::from_bounds(vec![(0.5, 0.5), (2.0, 2.0)]).unwrap();
        tree.grow(10.0, Some(1)).unwrap();
        assert_eq!(tree.num_leaves(), 1);
        assert_eq!(tree.life_time(), 10.0);
    }

    #[test]
    fn test_same_seed_same_tree() {
        let mut a = grown(1.5, 42);
        let mut b = grown(1.5, 42);
        assert_eq!(a.num_leaves(), b.num_leaves());
        assert_eq!(a.leaf_regions(), b.leaf_regions());
    }

    #[test]
    fn test_config_seed_is_used_without_explicit_seed() {
        let config = crate::config::TreeConfig {
            growth_seed: Some(5),
            ..Default::default()
        };
        let mut a = MondrianTree::with_config(Region::unit_cube(2).unwrap(), config.clone());
        let mut b = MondrianTree::with_config(Region::unit_cube(2).unwrap(), config);
        a.grow(2.0, None).unwrap();
        b.grow(2.0, None).unwrap();
        assert_eq!(a.leaf_regions(), b.leaf_regions());
    }

    #[test]
    fn test_root_extent_equals_sum_of_leaf_extents() {
        let mut tree = grown(2.0, 7);
        assert!(tree.num_leaves() > 1);
        let total = tree.total_leaf_extent();
        assert_relative_eq!(tree.root_extent(), total, epsilon = 1e-9);
    }

    #[test]
    fn test_every_split_extent_is_sum_of_children() {
        let tree = grown(2.0, 11);
        for node in &tree.nodes {
            if let NodeKind::Split(split) = node.kind() {
                let sum = tree.node(split.left()).extent() + tree.node(split.right()).extent();
                assert_relative_eq!(node.extent(), sum, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_children_tile_parent_region() {
        let tree = grown(2.0, 13);
        for (i, node) in tree.nodes.iter().enumerate() {
            let Some(split) = node.as_split() else {
                continue;
            };
            let left = tree.node(split.left());
            let right = tree.node(split.right());
            assert_eq!(left.parent().map(|p| p.index()), Some(i));
            assert_eq!(left.branch(), Branch::Left);
            assert_eq!(right.branch(), Branch::Right);

            let d = split.dimension();
            assert_eq!(left.region().interval(d).1, split.value());
            assert_eq!(right.region().interval(d).0, split.value());
            assert_eq!(left.region().interval(d).0, node.region().interval(d).0);
            assert_eq!(right.region().interval(d).1, node.region().interval(d).1);
            for other in (0..node.region().dimensions()).filter(|&o| o != d) {
                assert_eq!(left.region().interval(other), node.region().interval(other));
                assert_eq!(right.region().interval(other), node.region().interval(other));
            }
        }
    }

    #[test]
    fn test_leaf_count_is_monotone() {
        let mut tree = MondrianTree::new(Region::unit_cube(3).unwrap());
        let mut previous = tree.num_leaves();
        for (step, t) in [0.25, 0.5, 1.0, 1.5, 2.0].into_iter().enumerate() {
            tree.grow(t, Some(step as u64)).unwrap();
            assert!(tree.num_leaves() >= previous);
            previous = tree.num_leaves();
        }
    }

    #[test]
    fn test_growth_migrates_every_point() {
        let mut s = StandardSetup::new();
        s.ingest();
        s.tree.grow(1.0, Some(21)).unwrap();

        let mut labeled = Vec::new();
        let mut unlabeled = Vec::new();
        for id in s.tree.leaf_ids() {
            let node = s.tree.node(id);
            let leaf = node.as_leaf().unwrap();
            for &i in leaf.labeled().iter().chain(leaf.unlabeled()) {
                assert!(node.region().contains(&s.data[i]));
            }
            labeled.extend_from_slice(leaf.labeled());
            unlabeled.extend_from_slice(leaf.unlabeled());
        }
        labeled.sort_unstable();
        unlabeled.sort_unstable();
        assert_eq!(labeled, (0..20).collect::<Vec<_>>());
        assert_eq!(unlabeled, (20..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_growth_then_ingest_matches_ingest_then_growth() {
        let mut before = StandardSetup::new();
        before.ingest();
        before.tree.grow(1.0, Some(8)).unwrap();

        let mut after = StandardSetup::new();
        after.tree.grow(1.0, Some(8)).unwrap();
        after.ingest();

        let a: Vec<_> = before
            .tree
            .leaf_ids()
            .into_iter()
            .map(|id| before.tree.node(id).as_leaf().unwrap().num_points())
            .collect();
        let b: Vec<_> = after
            .tree
            .leaf_ids()
            .into_iter()
            .map(|id| after.tree.node(id).as_leaf().unwrap().num_points())
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_route_after_more_growth_descends() {
        let mut s = StandardSetup::new();
        s.tree.grow(0.5, Some(30)).unwrap();
        let before: Vec<_> = s.data.iter().map(|p| s.tree.route(p).unwrap()).collect();
        s.tree.grow(1.5, Some(31)).unwrap();

        for (point, old) in s.data.iter().zip(before) {
            let mut id = s.tree.route(point).unwrap();
            while id != old {
                id = s
                    .tree
                    .node(id)
                    .parent()
                    .expect("new leaf must descend from the old one");
            }
        }
    }
}
