use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_distr::{Distribution, StandardNormal};

use super::error::{SimResult, require_finite, require_positive, require_stdev};
use super::types::SimulationMatrix;

/// Owned source of normally distributed draws.
///
/// Each simulator borrows one mutably, so reproducibility is a matter of
/// constructing it with the same seed and calling in the same order.
pub struct MatrixSampler {
    rng: SmallRng,
}

impl MatrixSampler {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// `rows x cols` independent draws from `N(mean, stdev^2)`, row-major.
    pub fn sample(
        &mut self,
        rows: usize,
        cols: usize,
        mean: f64,
        stdev: f64,
    ) -> SimResult<SimulationMatrix> {
        require_positive("rows", rows)?;
        require_positive("cols", cols)?;
        require_finite("mean", mean)?;
        require_stdev("stdev", stdev)?;

        let data = (0..rows * cols)
            .map(|_| {
                let z: f64 = StandardNormal.sample(&mut self.rng);
                mean + stdev * z
            })
            .collect();
        Ok(SimulationMatrix::from_row_major(rows, cols, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SimError;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    #[test]
    fn zero_stdev_returns_mean_everywhere() {
        let mut sampler = MatrixSampler::seeded(3);
        let matrix = sampler.sample(7, 5, 0.0125, 0.0).expect("valid sample");
        assert_eq!(matrix.rows(), 7);
        assert_eq!(matrix.cols(), 5);
        assert!(matrix.values().iter().all(|v| *v == 0.0125));
    }

    #[test]
    fn same_seed_reproduces_the_stream() {
        let a = MatrixSampler::seeded(99).sample(12, 4, 0.0, 1.0).unwrap();
        let b = MatrixSampler::seeded(99).sample(12, 4, 0.0, 1.0).unwrap();
        assert_eq!(a, b);

        let c = MatrixSampler::seeded(100).sample(12, 4, 0.0, 1.0).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn consecutive_calls_advance_the_stream() {
        let mut sampler = MatrixSampler::seeded(5);
        let first = sampler.sample(3, 3, 0.0, 1.0).unwrap();
        let second = sampler.sample(3, 3, 0.0, 1.0).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn rejects_empty_dimensions() {
        let mut sampler = MatrixSampler::seeded(1);
        assert_eq!(
            sampler.sample(0, 3, 0.0, 1.0).unwrap_err(),
            SimError::InvalidDimension {
                what: "rows",
                value: 0
            }
        );
        assert!(matches!(
            sampler.sample(3, 0, 0.0, 1.0),
            Err(SimError::InvalidDimension { what: "cols", .. })
        ));
    }

    #[test]
    fn rejects_negative_stdev_without_consuming_entropy() {
        let mut sampler = MatrixSampler::seeded(8);
        let err = sampler.sample(2, 2, 0.0, -0.1).unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { name: "stdev", .. }));

        let after_error = sampler.sample(2, 2, 0.0, 1.0).unwrap();
        let fresh = MatrixSampler::seeded(8).sample(2, 2, 0.0, 1.0).unwrap();
        assert_eq!(after_error, fresh);
    }

    #[test]
    fn large_sample_moments_match_parameters() {
        let mut sampler = MatrixSampler::seeded(2024);
        let matrix = sampler.sample(400, 100, 5.0, 2.0).unwrap();
        let n = matrix.values().len() as f64;
        let mean = matrix.values().iter().sum::<f64>() / n;
        let var = matrix
            .values()
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / (n - 1.0);

        assert!((mean - 5.0).abs() < 0.05, "mean {mean}");
        assert!((var.sqrt() - 2.0).abs() < 0.05, "stdev {}", var.sqrt());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_sample_shape_matches_request(
            rows in 1usize..40,
            cols in 1usize..40,
            seed in 0u64..1_000,
        ) {
            let matrix = MatrixSampler::seeded(seed).sample(rows, cols, 0.0, 1.0).unwrap();
            prop_assert_eq!(matrix.rows(), rows);
            prop_assert_eq!(matrix.cols(), cols);
            prop_assert!(matrix.values().iter().all(|v| v.is_finite()));
        }
    }
}
