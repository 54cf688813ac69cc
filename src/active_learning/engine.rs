use crate::active_learning::rounding::{RoundingPolicy, apportion_with_capacity};
use crate::error::{MondrianError, Result};
use crate::mondrian::{CacheKey, Mutation, MondrianTree};
use crate::warning::{Outcome, UniformReason, Warning};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// How [`MondrianTree::point_weights`] spreads leaf mass over unlabeled points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightMode {
    /// Each leaf's proportion, split evenly over its unlabeled points.
    Proportional,
    /// Each leaf's integer allocation for a labeling budget of `total`,
    /// normalized over the whole tree and split evenly over the leaf's unlabeled points.
    BudgetAdjusted {
        total: usize,
        policy: RoundingPolicy,
    },
}

impl MondrianTree {
    pub(crate) fn rebuild_proportions(&mut self) {
        let leaves = self.leaf_list.len();
        let uniform = vec![1.0 / leaves as f64; leaves];

        if self.points.is_empty() {
            self.store_proportions(uniform, Some(UniformReason::NoPoints));
            return;
        }

        let variances: Vec<f64> = self
            .var_list
            .iter()
            .map(|&v| if v == 0.0 { self.default_variance } else { v })
            .collect();
        if variances.iter().sum::<f64>() == 0.0 {
            self.store_proportions(uniform, Some(UniformReason::ZeroVariance));
            return;
        }

        let weights: Vec<f64> = self
            .marginal_list
            .iter()
            .zip(&variances)
            .map(|(m, v)| (m * v).sqrt())
            .collect();
        let total: f64 = weights.iter().sum();
        if total == 0.0 {
            self.store_proportions(uniform, Some(UniformReason::ZeroVariance));
            return;
        }
        self.store_proportions(weights.iter().map(|w| w / total).collect(), None);
    }

    fn store_proportions(&mut self, proportions: Vec<f64>, reason: Option<UniformReason>) {
        self.al_proportions = proportions;
        self.al_proportions_warning = reason.map(|reason| {
            let warning = Warning::UniformProportions { reason };
            tracing::warn!(%warning, "degenerate input");
            warning
        });
    }

    /// Per-leaf share of the next labels, proportional to
    /// `sqrt(marginal * variance)` with zero variances replaced by the default.
    pub fn compute_proportions(&mut self) -> Outcome<Vec<f64>> {
        self.ensure(CacheKey::Proportions);
        Outcome {
            value: self.al_proportions.clone(),
            warning: self.al_proportions_warning.clone(),
        }
    }

    /// Integer number of new labels per leaf so that the labeled total reaches `total`.
    ///
    /// Each leaf is capped at its unlabeled count. When the leaves cannot hold
    /// the full budget the best feasible allocation is returned with a
    /// [`Warning::BudgetShortfall`].
    pub fn allocate_budget(
        &mut self,
        total: usize,
        policy: RoundingPolicy,
    ) -> Result<Outcome<Vec<usize>>> {
        if total <= self.num_labeled || total > self.points.len() {
            return Err(MondrianError::BudgetOutOfRange {
                requested: total,
                labeled: self.num_labeled,
                points: self.points.len(),
            });
        }
        let additional = total - self.num_labeled;

        let proportions = self.compute_proportions();
        let capacity: Vec<usize> = self
            .leaf_list
            .iter()
            .map(|&id| self.leaf(id).unlabeled().len())
            .collect();
        let counts = apportion_with_capacity(&proportions.value, &capacity, additional, policy);

        let allocated: usize = counts.iter().sum();
        tracing::debug!(total, additional, allocated, %policy, "allocated label budget");
        if allocated < additional {
            return Ok(Outcome::warned(
                counts,
                Warning::BudgetShortfall {
                    requested: additional,
                    allocated,
                },
            ));
        }
        Ok(Outcome {
            value: counts,
            warning: proportions.warning,
        })
    }

    /// [`allocate_budget`](Self::allocate_budget) with the policy given by name.
    pub fn allocate_budget_named(
        &mut self,
        total: usize,
        policy: &str,
    ) -> Result<Outcome<Vec<usize>>> {
        let policy = RoundingPolicy::from_name(policy)?;
        self.allocate_budget(total, policy)
    }

    /// [`allocate_budget`](Self::allocate_budget) with the configured policy.
    pub fn allocate(&mut self, total: usize) -> Result<Outcome<Vec<usize>>> {
        let policy = self.config.rounding_policy;
        self.allocate_budget(total, policy)
    }

    /// Sampling weight per point index. Points in a labeled set get `None`.
    pub fn point_weights(&mut self, mode: WeightMode) -> Result<Outcome<Vec<Option<f64>>>> {
        let (leaf_mass, warning) = match mode {
            WeightMode::Proportional => {
                let proportions = self.compute_proportions();
                (proportions.value, proportions.warning)
            }
            WeightMode::BudgetAdjusted { total, policy } => {
                let allocation = self.allocate_budget(total, policy)?;
                let sum: usize = allocation.value.iter().sum();
                let mass = allocation
                    .value
                    .iter()
                    .map(|&c| if sum == 0 { 0.0 } else { c as f64 / sum as f64 })
                    .collect();
                (mass, allocation.warning)
            }
        };

        let mut weights = vec![None; self.points.len()];
        for (&id, mass) in self.leaf_list.iter().zip(leaf_mass) {
            let unlabeled = self.leaf(id).unlabeled();
            if unlabeled.is_empty() {
                continue;
            }
            let each = mass / unlabeled.len() as f64;
            for &index in unlabeled {
                weights[index] = Some(each);
            }
        }
        Ok(Outcome {
            value: weights,
            warning,
        })
    }

    /// Draws `k` distinct unlabeled indices from the leaf at `leaf_position`
    /// in leaf-enumeration order.
    ///
    /// With `commit` the drawn points join the leaf's labeled set right away
    /// and wait for their values through [`label_point`](Self::label_point).
    pub fn pick(
        &mut self,
        leaf_position: usize,
        k: usize,
        seed: Option<u64>,
        commit: bool,
    ) -> Result<Vec<usize>> {
        self.ensure(CacheKey::LeafList);
        let Some(&leaf) = self.leaf_list.get(leaf_position) else {
            return Err(MondrianError::LeafOutOfRange {
                position: leaf_position,
                num_leaves: self.leaf_list.len(),
            });
        };

        let mut rng = match seed.or(self.config.sampling_seed) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let picked = self.leaf_mut(leaf).pick_new_points(k, &mut rng, commit)?;

        if commit && !picked.is_empty() {
            self.num_labeled += picked.len();
            self.caches.apply(Mutation::Labels);
        }
        tracing::debug!(leaf_position, k, commit, "picked points from leaf");
        Ok(picked)
    }
}
