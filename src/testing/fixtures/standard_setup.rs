use crate::core::Region;
use crate::mondrian::MondrianTree;
use crate::testing::unit_cube_points;

pub const DIMENSIONS: usize = 3;
pub const NUM_POINTS: usize = 100;
pub const NUM_LABELED: usize = 20;

/// Ungrown tree over `[0, 1]^3` with 100 seeded points, the first 20 of them
/// labeled by a fixed linear response. Call [`ingest`](Self::ingest) to load them.
pub struct StandardSetup {
    pub tree: MondrianTree,
    pub data: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
    pub labeled_indices: Vec<usize>,
}

impl Default for StandardSetup {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardSetup {
    pub fn new() -> Self {
        let region = Region::unit_cube(DIMENSIONS).expect("unit cube is a valid region");
        let data = unit_cube_points(NUM_POINTS, DIMENSIONS, 0);
        let labeled_indices: Vec<usize> = (0..NUM_LABELED).collect();
        let labels = labeled_indices
            .iter()
            .map(|&i| response(&data[i]))
            .collect();

        Self {
            tree: MondrianTree::new(region),
            data,
            labels,
            labeled_indices,
        }
    }

    pub fn ingest(&mut self) {
        self.tree
            .ingest(self.data.clone(), &self.labeled_indices, &self.labels)
            .expect("standard data matches the tree");
    }
}

fn response(x: &[f64]) -> f64 {
    x[0] + 2.0 * x[1] - x[2]
}
