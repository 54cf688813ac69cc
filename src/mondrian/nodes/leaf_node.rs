use crate::error::{MondrianError, Result};
use rand::Rng;
use rand::seq::SliceRandom;

/// Partition cell holding the indices of the points routed into it.
#[derive(Clone, Debug, Default)]
pub struct LeafNode {
    labeled: Vec<usize>,
    unlabeled: Vec<usize>,
    leaf_list_position: Option<usize>,
}

impl LeafNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indices(labeled: Vec<usize>, unlabeled: Vec<usize>) -> Self {
        Self {
            labeled,
            unlabeled,
            leaf_list_position: None,
        }
    }

    pub fn labeled(&self) -> &[usize] {
        &self.labeled
    }

    pub fn unlabeled(&self) -> &[usize] {
        &self.unlabeled
    }

    pub fn num_points(&self) -> usize {
        self.labeled.len() + self.unlabeled.len()
    }

    pub fn leaf_list_position(&self) -> Option<usize> {
        self.leaf_list_position
    }

    pub(crate) fn set_leaf_list_position(&mut self, position: usize) {
        self.leaf_list_position = Some(position);
    }

    pub(crate) fn push_labeled(&mut self, index: usize) {
        self.labeled.push(index);
    }

    pub(crate) fn push_unlabeled(&mut self, index: usize) {
        self.unlabeled.push(index);
    }

    pub(crate) fn clear(&mut self) {
        self.labeled.clear();
        self.unlabeled.clear();
    }

    pub(crate) fn take_indices(&mut self) -> (Vec<usize>, Vec<usize>) {
        (
            std::mem::take(&mut self.labeled),
            std::mem::take(&mut self.unlabeled),
        )
    }

    pub(crate) fn make_labeled(&mut self, index: usize) -> Result<()> {
        let Some(pos) = self.unlabeled.iter().position(|&i| i == index) else {
            return Err(MondrianError::NotUnlabeled(index));
        };
        self.unlabeled.remove(pos);
        self.labeled.push(index);
        Ok(())
    }

    /// Draws `k` unlabeled indices without replacement, in random permutation order.
    /// With `commit` the drawn indices move to the labeled set.
    pub(crate) fn pick_new_points<R: Rng + ?Sized>(
        &mut self,
        k: usize,
        rng: &mut R,
        commit: bool,
    ) -> Result<Vec<usize>> {
        if k > self.unlabeled.len() {
            return Err(MondrianError::InsufficientUnlabeled {
                requested: k,
                available: self.unlabeled.len(),
            });
        }

        let mut order = self.unlabeled.clone();
        order.shuffle(rng);
        order.truncate(k);

        if commit {
            for &index in &order {
                self.make_labeled(index)?;
            }
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn good_leaf() -> LeafNode {
        LeafNode::with_indices(vec![1, 2, 3, 4], vec![5, 6, 7, 8, 9, 10])
    }

    #[test]
    fn test_pick_new_points_returns_unlabeled_members() {
        let mut leaf = good_leaf();
        let mut rng = StdRng::seed_from_u64(1);
        let picked = leaf.pick_new_points(3, &mut rng, false).unwrap();

        assert_eq!(picked.len(), 3);
        for i in &picked {
            assert!(leaf.unlabeled().contains(i));
        }
        let mut dedup = picked.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), 3);
    }

    #[test]
    fn test_pick_new_points_all_is_a_permutation() {
        let mut leaf = good_leaf();
        let mut rng = StdRng::seed_from_u64(1);
        let mut picked = leaf.pick_new_points(6, &mut rng, false).unwrap();
        picked.sort();
        assert_eq!(picked, vec![5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_pick_new_points_is_reproducible_with_seed() {
        let mut a = good_leaf();
        let mut b = good_leaf();
        let pa = a
            .pick_new_points(4, &mut StdRng::seed_from_u64(9), false)
            .unwrap();
        let pb = b
            .pick_new_points(4, &mut StdRng::seed_from_u64(9), false)
            .unwrap();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_pick_new_points_empty_leaf_fails() {
        let mut leaf = LeafNode::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            leaf.pick_new_points(1, &mut rng, true),
            Err(MondrianError::InsufficientUnlabeled {
                requested: 1,
                available: 0
            })
        );
    }

    #[test]
    fn test_pick_new_points_commit_moves_indices() {
        let mut leaf = good_leaf();
        let mut rng = StdRng::seed_from_u64(1);
        let picked = leaf.pick_new_points(1, &mut rng, true).unwrap();

        assert_eq!(leaf.labeled(), &[1, 2, 3, 4, picked[0]]);
        assert_eq!(leaf.unlabeled().len(), 5);
        assert!(!leaf.unlabeled().contains(&picked[0]));
    }

    #[test]
    fn test_pick_new_points_without_commit_leaves_sets_alone() {
        let mut leaf = good_leaf();
        let mut rng = StdRng::seed_from_u64(1);
        leaf.pick_new_points(1, &mut rng, false).unwrap();

        assert_eq!(leaf.labeled(), &[1, 2, 3, 4]);
        assert_eq!(leaf.unlabeled(), &[5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_make_labeled_not_in_unlabeled() {
        let mut leaf = LeafNode::new();
        assert_eq!(leaf.make_labeled(1), Err(MondrianError::NotUnlabeled(1)));
    }

    #[test]
    fn test_make_labeled_in_unlabeled() {
        let mut leaf = good_leaf();
        leaf.make_labeled(5).unwrap();
        assert!(!leaf.unlabeled().contains(&5));
        assert_eq!(leaf.labeled().last(), Some(&5));
    }

    #[test]
    fn test_take_indices_empties_leaf() {
        let mut leaf = good_leaf();
        let (labeled, unlabeled) = leaf.take_indices();
        assert_eq!(labeled.len(), 4);
        assert_eq!(unlabeled.len(), 6);
        assert_eq!(leaf.num_points(), 0);
    }
}
