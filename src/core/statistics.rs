/// Running mean and unbiased variance of a stream of label values.
#[derive(Clone, Debug, Default)]
pub struct LabelSummary {
    count: usize,
    mean: f64,
    sum_squares: f64,
}

impl LabelSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut summary = Self::new();
        for v in values {
            summary.add(v);
        }
        summary
    }

    #[inline]
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        let last_mean = self.mean;
        self.mean += (value - last_mean) / self.count as f64;
        self.sum_squares += (value - last_mean) * (value - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Arithmetic mean, `0` when nothing was observed.
    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    /// `Σ(x − mean)² / (n − 1)`, `0` below two observations.
    pub fn variance(&self) -> f64 {
        if self.count > 1 {
            self.sum_squares / (self.count - 1) as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_starts_empty() {
        let s = LabelSummary::new();
        assert_eq!(s.count(), 0);
        assert_eq!(s.mean(), 0.0);
        assert_eq!(s.variance(), 0.0);
    }

    #[test]
    fn test_single_value_has_zero_variance() {
        let s = LabelSummary::from_values([3.5]);
        assert_eq!(s.mean(), 3.5);
        assert_eq!(s.variance(), 0.0);
    }

    #[test]
    fn test_matches_two_pass_unbiased_variance() {
        let values = [1.0, 4.0, 2.5, 8.0, -3.0, 0.25];
        let s = LabelSummary::from_values(values);

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);

        assert_relative_eq!(s.mean(), mean, epsilon = 1e-12);
        assert_relative_eq!(s.variance(), var, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_values() {
        let s = LabelSummary::from_values([2.0; 10]);
        assert_eq!(s.mean(), 2.0);
        assert_relative_eq!(s.variance(), 0.0, epsilon = 1e-15);
    }
}
