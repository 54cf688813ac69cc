#![allow(dead_code)]

use mondrian::{MondrianTree, Region};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn unit_cube_tree(dims: usize) -> MondrianTree {
    MondrianTree::new(Region::unit_cube(dims).unwrap())
}

pub fn uniform_points(n: usize, d: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..d).map(|_| rng.random::<f64>()).collect())
        .collect()
}

/// Tree over `[0, 1]^d` grown to `life_time`, holding `n` points whose first
/// `labeled` entries carry a noisy linear response.
pub fn loaded_tree(
    d: usize,
    n: usize,
    labeled: usize,
    life_time: f64,
    seed: u64,
) -> (MondrianTree, Vec<Vec<f64>>) {
    let mut tree = unit_cube_tree(d);
    tree.grow(life_time, Some(seed)).unwrap();

    let points = uniform_points(n, d, seed.wrapping_add(1));
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(2));
    let indices: Vec<usize> = (0..labeled).collect();
    let labels: Vec<f64> = points[..labeled]
        .iter()
        .map(|p| p.iter().sum::<f64>() + rng.random_range(-0.1..0.1))
        .collect();
    tree.ingest(points.clone(), &indices, &labels).unwrap();
    (tree, points)
}

pub fn volume(region: &Region) -> f64 {
    (0..region.dimensions()).map(|d| region.length(d)).product()
}
