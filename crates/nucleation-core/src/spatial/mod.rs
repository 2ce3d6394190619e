//! Spatial occupancy and collision queries over the sphere population.
//!
//! The [`SpatialIndex`] trait owns the spheres themselves (in nucleation
//! order, so a sphere's id is its position) and answers the two questions
//! every stage asks:
//!
//! - [`contains`](SpatialIndex::contains) -- is a point strictly inside any
//!   sphere at a given time?
//! - [`neighbors_within`](SpatialIndex::neighbors_within) -- which spheres
//!   have their centre within a given distance of a point?
//!
//! Two strategies implement it:
//!
//! - [`LinearIndex`] -- exact sweep over every sphere, O(n) per query.
//! - [`GridIndex`] -- uniform grid over integer bucket coordinates whose
//!   bucket size follows the current maximum radius.

mod grid;
mod linear;

use nucleation_types::{IndexKind, Point3, SphereId};

pub use grid::GridIndex;
pub use linear::LinearIndex;

use crate::domain::Domain;
use crate::sphere::Sphere;

/// Occupancy and neighbour queries over a growing sphere population.
///
/// Insertion is incremental. Queries borrow the index immutably, so nothing
/// can be inserted or blocked while a query is in flight.
pub trait SpatialIndex: core::fmt::Debug + Send {
    /// Add a sphere. Its id must equal the current population size.
    fn insert(&mut self, sphere: Sphere);

    /// All spheres in nucleation order.
    fn spheres(&self) -> &[Sphere];

    /// Freeze a sphere's radius at `time`. Returns whether the sphere was
    /// newly blocked (false if unknown or already blocked).
    fn block(&mut self, id: SphereId, time: f64) -> bool;

    /// Upper bound on every sphere's radius at `time`.
    fn max_radius_bound(&self, time: f64) -> f64;

    /// Whether `point` lies strictly inside any sphere at `time`.
    fn contains(&self, point: Point3, time: f64) -> bool;

    /// Spheres whose centre lies within `max_distance` of `point`.
    fn neighbors_within(&self, point: Point3, max_distance: f64) -> Vec<&Sphere>;

    /// Hook called once per step before any query at `time`. Strategies
    /// that cache radius-dependent layout refresh it here.
    fn prepare(&mut self, _time: f64) {}

    /// Look up a sphere by id.
    fn get(&self, id: SphereId) -> Option<&Sphere> {
        usize::try_from(id.into_inner())
            .ok()
            .and_then(|position| self.spheres().get(position))
            .filter(|sphere| sphere.id == id)
    }

    /// Number of spheres.
    fn len(&self) -> usize {
        self.spheres().len()
    }

    /// Whether no sphere has nucleated yet.
    fn is_empty(&self) -> bool {
        self.spheres().is_empty()
    }
}

/// Build the index strategy selected by configuration.
pub fn build_index(kind: IndexKind, domain: &Domain) -> Box<dyn SpatialIndex> {
    match kind {
        IndexKind::Grid => Box::new(GridIndex::for_domain(domain)),
        IndexKind::Linear => Box::new(LinearIndex::new()),
    }
}

/// Position of `id` inside a population vector.
fn position_of(spheres: &[Sphere], id: SphereId) -> Option<usize> {
    usize::try_from(id.into_inner())
        .ok()
        .filter(|&position| spheres.get(position).is_some_and(|sphere| sphere.id == id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::random::RandomSource;

    /// Populate both strategies with the same random spheres.
    fn twin_indexes(count: u64, seed: u64) -> (LinearIndex, GridIndex) {
        let domain = Domain::Cube { size: 1.0 };
        let mut rng = RandomSource::from_seed(seed);
        let mut linear = LinearIndex::new();
        let mut grid = GridIndex::for_domain(&domain);
        for i in 0..count {
            let center = domain.sample(&mut rng);
            let birth = rng.uniform_range(0.0, 5.0);
            let speed = rng.uniform_range(0.005, 0.03);
            let sphere = Sphere::new(SphereId(i), center, birth, speed);
            linear.insert(sphere.clone());
            grid.insert(sphere);
        }
        (linear, grid)
    }

    #[test]
    fn empty_indexes_answer_nothing() {
        let domain = Domain::Cube { size: 1.0 };
        for index in [
            build_index(IndexKind::Linear, &domain),
            build_index(IndexKind::Grid, &domain),
        ] {
            assert!(index.is_empty());
            assert!(!index.contains([0.5, 0.5, 0.5], 10.0));
            assert!(index.neighbors_within([0.5, 0.5, 0.5], 10.0).is_empty());
            assert!(index.max_radius_bound(10.0).abs() < f64::EPSILON);
            assert!(index.get(SphereId(0)).is_none());
        }
    }

    #[test]
    fn grid_and_linear_agree_on_containment() {
        let (linear, mut grid) = twin_indexes(400, 21);
        let mut rng = RandomSource::from_seed(99);
        let domain = Domain::Cube { size: 1.0 };
        for time in [0.0, 2.5, 5.0, 8.0, 12.0] {
            grid.prepare(time);
            for _ in 0..500 {
                let point = domain.sample(&mut rng);
                assert_eq!(
                    linear.contains(point, time),
                    grid.contains(point, time),
                    "disagreement at {point:?}, t = {time}"
                );
            }
        }
    }

    #[test]
    fn grid_without_prepare_still_finds_large_spheres() {
        // Layout tuned for t = 0 must not hide spheres that have since grown.
        let (linear, grid) = twin_indexes(200, 8);
        let mut rng = RandomSource::from_seed(4);
        let domain = Domain::Cube { size: 1.0 };
        for _ in 0..500 {
            let point = domain.sample(&mut rng);
            assert_eq!(linear.contains(point, 20.0), grid.contains(point, 20.0));
        }
    }

    #[test]
    fn grid_and_linear_agree_on_neighbors() {
        let (linear, grid) = twin_indexes(300, 5);
        let mut rng = RandomSource::from_seed(6);
        let domain = Domain::Cube { size: 1.0 };
        for reach in [0.01, 0.05, 0.2, 0.9] {
            for _ in 0..100 {
                let point = domain.sample(&mut rng);
                let mut a: Vec<u64> = linear
                    .neighbors_within(point, reach)
                    .iter()
                    .map(|s| s.id.into_inner())
                    .collect();
                let mut b: Vec<u64> = grid
                    .neighbors_within(point, reach)
                    .iter()
                    .map(|s| s.id.into_inner())
                    .collect();
                a.sort_unstable();
                b.sort_unstable();
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn blocking_is_reflected_in_queries() {
        let domain = Domain::Cube { size: 1.0 };
        for mut index in [
            build_index(IndexKind::Linear, &domain),
            build_index(IndexKind::Grid, &domain),
        ] {
            index.insert(Sphere::new(SphereId(0), [0.5, 0.5, 0.5], 0.0, 0.1));
            assert!(index.block(SphereId(0), 1.0));
            assert!(!index.block(SphereId(0), 2.0));
            assert!(!index.block(SphereId(7), 2.0));
            // Frozen at radius 0.1.
            assert!(index.contains([0.55, 0.5, 0.5], 3.0));
            assert!(!index.contains([0.65, 0.5, 0.5], 3.0));
            assert!(index.max_radius_bound(3.0) >= 0.1);
            assert!(index.get(SphereId(0)).unwrap().is_blocked());
        }
    }

    #[test]
    fn surface_points_are_free() {
        let mut index = LinearIndex::new();
        index.insert(Sphere::new(SphereId(0), [0.0, 0.0, 0.0], 0.0, 1.0));
        assert!(!index.contains([1.0, 0.0, 0.0], 1.0));
        assert!(index.contains([0.999, 0.0, 0.0], 1.0));
    }
}
