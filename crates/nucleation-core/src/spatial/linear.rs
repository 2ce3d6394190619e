//! Exact pairwise sweep. Correct for any population; O(n) per query, which
//! is fine up to a few thousand spheres.

use nucleation_types::{Point3, SphereId};

use super::{SpatialIndex, position_of};
use crate::domain::distance;
use crate::sphere::Sphere;

/// Index that checks every sphere on every query.
#[derive(Debug, Clone, Default)]
pub struct LinearIndex {
    spheres: Vec<Sphere>,
}

impl LinearIndex {
    /// Create an empty index.
    pub const fn new() -> Self {
        Self {
            spheres: Vec::new(),
        }
    }
}

impl SpatialIndex for LinearIndex {
    fn insert(&mut self, sphere: Sphere) {
        self.spheres.push(sphere);
    }

    fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    fn block(&mut self, id: SphereId, time: f64) -> bool {
        position_of(&self.spheres, id)
            .and_then(|position| self.spheres.get_mut(position))
            .is_some_and(|sphere| sphere.block(time))
    }

    fn max_radius_bound(&self, time: f64) -> f64 {
        self.spheres
            .iter()
            .map(|sphere| sphere.radius_at(time))
            .fold(0.0, f64::max)
    }

    fn contains(&self, point: Point3, time: f64) -> bool {
        self.spheres
            .iter()
            .any(|sphere| distance(point, sphere.center) < sphere.radius_at(time))
    }

    fn neighbors_within(&self, point: Point3, max_distance: f64) -> Vec<&Sphere> {
        self.spheres
            .iter()
            .filter(|sphere| distance(point, sphere.center) <= max_distance)
            .collect()
    }
}
