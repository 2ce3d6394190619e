//! Monte Carlo estimate of the free-volume fraction.
//!
//! Uniform points are drawn from the domain and tested against the sphere
//! population with the strict containment rule. The estimate is unbiased;
//! its binomial standard error is `sqrt(f (1 - f) / n)`.

use crate::domain::Domain;
use crate::numeric::count_to_f64;
use crate::random::RandomSource;
use crate::spatial::SpatialIndex;

/// Outcome of one coverage estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageEstimate {
    /// Samples that fell outside every sphere.
    pub free_samples: u64,
    /// Samples drawn (or, for an empty population, that would have been).
    pub sample_count: u64,
}

impl CoverageEstimate {
    /// Estimated free fraction in `[0, 1]`. An estimate with no samples
    /// reports a fully free domain.
    pub fn free_fraction(&self) -> f64 {
        if self.sample_count == 0 {
            return 1.0;
        }
        (count_to_f64(self.free_samples) / count_to_f64(self.sample_count)).clamp(0.0, 1.0)
    }

    /// Binomial standard error of [`free_fraction`](Self::free_fraction).
    pub fn standard_error(&self) -> f64 {
        if self.sample_count == 0 {
            return 0.0;
        }
        let p = self.free_fraction();
        (p * (1.0 - p) / count_to_f64(self.sample_count)).sqrt()
    }
}

/// Estimate the fraction of `domain` not covered by any sphere at `time`.
///
/// An empty population is fully free and consumes no randomness.
pub fn estimate_free_fraction(
    index: &dyn SpatialIndex,
    domain: &Domain,
    rng: &mut RandomSource,
    time: f64,
    sample_count: u64,
) -> CoverageEstimate {
    if index.is_empty() {
        return CoverageEstimate {
            free_samples: sample_count,
            sample_count,
        };
    }

    let mut free_samples: u64 = 0;
    for _ in 0..sample_count {
        if !index.contains(domain.sample(rng), time) {
            free_samples = free_samples.saturating_add(1);
        }
    }
    CoverageEstimate {
        free_samples,
        sample_count,
    }
}

#[cfg(test)]
mod tests {
    use nucleation_types::SphereId;

    use super::*;
    use crate::spatial::LinearIndex;
    use crate::sphere::Sphere;

    #[test]
    fn empty_population_is_free_without_sampling() {
        let domain = Domain::Cube { size: 1.0 };
        let mut rng = RandomSource::from_seed(1);
        let mut untouched = RandomSource::from_seed(1);

        let estimate = estimate_free_fraction(&LinearIndex::new(), &domain, &mut rng, 3.0, 500);
        assert!((estimate.free_fraction() - 1.0).abs() < f64::EPSILON);
        assert!(estimate.standard_error().abs() < f64::EPSILON);
        assert_eq!(rng.uniform().to_bits(), untouched.uniform().to_bits());
    }

    #[test]
    fn no_samples_reports_free() {
        let estimate = CoverageEstimate {
            free_samples: 0,
            sample_count: 0,
        };
        assert!((estimate.free_fraction() - 1.0).abs() < f64::EPSILON);
        assert!(estimate.standard_error().abs() < f64::EPSILON);
    }

    #[test]
    fn half_cube_sphere_matches_analytic_volume() {
        // Sphere of radius 0.5 at the cube centre covers pi/6 of the cube.
        let domain = Domain::Cube { size: 1.0 };
        let mut index = LinearIndex::new();
        index.insert(Sphere::new(SphereId(0), [0.5, 0.5, 0.5], 0.0, 0.5));
        let mut rng = RandomSource::from_seed(11);

        let estimate = estimate_free_fraction(&index, &domain, &mut rng, 1.0, 20_000);
        let expected = 1.0 - std::f64::consts::PI / 6.0;
        assert!((estimate.free_fraction() - expected).abs() < 5.0 * estimate.standard_error());
        assert!(estimate.standard_error() < 0.005);
    }

    #[test]
    fn covering_sphere_leaves_nothing_free() {
        let domain = Domain::Cube { size: 1.0 };
        let mut index = LinearIndex::new();
        index.insert(Sphere::new(SphereId(0), [0.5, 0.5, 0.5], 0.0, 1.0));
        let mut rng = RandomSource::from_seed(3);

        let estimate = estimate_free_fraction(&index, &domain, &mut rng, 1.0, 1000);
        assert_eq!(estimate.free_samples, 0);
        assert!(estimate.free_fraction().abs() < f64::EPSILON);
        assert!(estimate.standard_error().abs() < f64::EPSILON);
    }
}
