use crate::mondrian::nodes::node::{Branch, NodeId};

/// Internal node cutting its region with the hyperplane `x[dimension] = value`.
///
/// Points with `x[dimension] < value` go left, everything else (including the
/// boundary itself) goes right. The hyperplane extends past the tree bounds,
/// so points outside the tree bounds still route deterministically.
#[derive(Clone, Debug)]
pub struct SplitNode {
    dimension: usize,
    value: f64,
    left: NodeId,
    right: NodeId,
}

impl SplitNode {
    pub fn new(dimension: usize, value: f64, left: NodeId, right: NodeId) -> Self {
        Self {
            dimension,
            value,
            left,
            right,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn left(&self) -> NodeId {
        self.left
    }

    pub fn right(&self) -> NodeId {
        self.right
    }

    #[inline]
    pub fn branch_for_point(&self, point: &[f64]) -> Branch {
        if point[self.dimension] < self.value {
            Branch::Left
        } else {
            Branch::Right
        }
    }

    #[inline]
    pub fn child_for_point(&self, point: &[f64]) -> NodeId {
        match self.branch_for_point(point) {
            Branch::Left => self.left,
            _ => self.right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split() -> SplitNode {
        SplitNode::new(1, 0.5, NodeId(1), NodeId(2))
    }

    #[test]
    fn test_routes_below_value_left() {
        assert_eq!(split().child_for_point(&[0.9, 0.1]), NodeId(1));
    }

    #[test]
    fn test_routes_above_value_right() {
        assert_eq!(split().child_for_point(&[0.1, 0.9]), NodeId(2));
    }

    #[test]
    fn test_boundary_goes_right() {
        assert_eq!(split().branch_for_point(&[0.0, 0.5]), Branch::Right);
    }

    #[test]
    fn test_points_outside_bounds_follow_hyperplane() {
        assert_eq!(split().child_for_point(&[10.0, -3.0]), NodeId(1));
        assert_eq!(split().child_for_point(&[-10.0, 7.0]), NodeId(2));
    }
}
