use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `n` points drawn uniformly from `[0, 1]^d` with a fixed seed.
pub fn unit_cube_points(n: usize, d: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..d).map(|_| rng.random::<f64>()).collect())
        .collect()
}
