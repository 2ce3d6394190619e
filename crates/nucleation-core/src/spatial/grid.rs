//! Uniform grid keyed by integer bucket coordinates.
//!
//! Spheres are bucketed by centre. A query scans every bucket within
//! `ceil(reach / cell_size)` rings of the query point, where `reach` is the
//! query distance (neighbour queries) or the maximum radius bound
//! (containment queries). The scan radius always covers the bound, so a
//! bucket size that has fallen behind the growth only costs time, never a
//! missed sphere.
//!
//! [`prepare`](SpatialIndex::prepare) keeps the bucket size at or above
//! the maximum radius, doubling it and re-bucketing when growth outruns it,
//! so containment queries normally touch the 27 buckets around the point.

use std::collections::HashMap;

use nucleation_types::{Point3, SphereId};

use super::{SpatialIndex, position_of};
use crate::domain::{Domain, distance};
use crate::numeric::floor_to_i64;
use crate::sphere::Sphere;

/// Buckets per axis across the domain before any sphere has grown.
const INITIAL_CELLS_PER_AXIS: f64 = 32.0;

/// Ring counts beyond this always fall back to a full sweep.
const MAX_SCAN_RINGS: i64 = 64;

type CellKey = (i64, i64, i64);

/// Upper bound on every radius, anchored at the last `prepare` time.
///
/// For `t >= anchor_time`, every sphere satisfies
/// `r(t) <= anchor_radius + max_speed * (t - anchor_time)`; for earlier
/// times `anchor_radius` alone bounds it.
#[derive(Debug, Clone, Copy, Default)]
struct RadiusBound {
    anchor_time: f64,
    anchor_radius: f64,
    max_speed: f64,
}

impl RadiusBound {
    fn at(&self, time: f64) -> f64 {
        let ahead = (time - self.anchor_time).max(0.0);
        self.max_speed.mul_add(ahead, self.anchor_radius)
    }

    fn include(&mut self, sphere: &Sphere) {
        let radius = match sphere.blocked_at() {
            // Final radius, even if the block lies ahead of the anchor.
            Some(blocked) => sphere.radius_at(blocked),
            None => {
                self.max_speed = self.max_speed.max(sphere.growth_speed);
                sphere.radius_at(self.anchor_time)
            }
        };
        self.anchor_radius = self.anchor_radius.max(radius);
    }

    fn refresh(&mut self, spheres: &[Sphere], time: f64) {
        *self = Self {
            anchor_time: time,
            ..Self::default()
        };
        for sphere in spheres {
            self.include(sphere);
        }
    }
}

/// Grid-bucketed sphere index.
#[derive(Debug, Clone)]
pub struct GridIndex {
    spheres: Vec<Sphere>,
    cells: HashMap<CellKey, Vec<usize>>,
    cell_size: f64,
    bound: RadiusBound,
}

impl GridIndex {
    /// Create an empty grid with the given initial bucket size.
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        Self {
            spheres: Vec::new(),
            cells: HashMap::new(),
            cell_size,
            bound: RadiusBound::default(),
        }
    }

    /// Create an empty grid sized for a domain.
    pub fn for_domain(domain: &Domain) -> Self {
        Self::new(domain.extent() / INITIAL_CELLS_PER_AXIS)
    }

    /// Current bucket edge length.
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    fn rebucket(&mut self) {
        self.cells.clear();
        for (position, sphere) in self.spheres.iter().enumerate() {
            self.cells
                .entry(cell_key(sphere.center, self.cell_size))
                .or_default()
                .push(position);
        }
    }

    /// Visit spheres that may lie within `reach` of `point` until `visit`
    /// returns true. Returns whether it did.
    fn any_candidate<'a>(
        &'a self,
        point: Point3,
        reach: f64,
        mut visit: impl FnMut(&'a Sphere) -> bool,
    ) -> bool {
        let Some(rings) = self.scan_rings(reach) else {
            return self.spheres.iter().any(visit);
        };
        let (kx, ky, kz) = cell_key(point, self.cell_size);
        for dx in -rings..=rings {
            for dy in -rings..=rings {
                for dz in -rings..=rings {
                    let key = (
                        kx.saturating_add(dx),
                        ky.saturating_add(dy),
                        kz.saturating_add(dz),
                    );
                    let Some(bucket) = self.cells.get(&key) else {
                        continue;
                    };
                    for &position in bucket {
                        if self.spheres.get(position).is_some_and(&mut visit) {
                            return true;
                        }
                    }
                }
            }
        }
        false
    }

    /// Ring count needed to cover `reach`, or `None` when scanning that
    /// many buckets would cost more than sweeping every sphere.
    fn scan_rings(&self, reach: f64) -> Option<i64> {
        if !reach.is_finite() {
            return None;
        }
        let rings = floor_to_i64((reach.max(0.0) / self.cell_size).ceil());
        if rings > MAX_SCAN_RINGS {
            return None;
        }
        let span = rings.checked_mul(2)?.checked_add(1)?;
        let buckets = span.checked_mul(span)?.checked_mul(span)?;
        let occupied = i64::try_from(self.cells.len()).unwrap_or(i64::MAX);
        (buckets <= occupied.max(27)).then_some(rings)
    }
}

impl SpatialIndex for GridIndex {
    fn insert(&mut self, sphere: Sphere) {
        let position = self.spheres.len();
        self.bound.include(&sphere);
        self.cells
            .entry(cell_key(sphere.center, self.cell_size))
            .or_default()
            .push(position);
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
        self.bound.at(time)
    }

    fn contains(&self, point: Point3, time: f64) -> bool {
        self.any_candidate(point, self.bound.at(time), |sphere| {
            distance(point, sphere.center) < sphere.radius_at(time)
        })
    }

    fn neighbors_within(&self, point: Point3, max_distance: f64) -> Vec<&Sphere> {
        let mut found = Vec::new();
        self.any_candidate(point, max_distance, |sphere| {
            if distance(point, sphere.center) <= max_distance {
                found.push(sphere);
            }
            false
        });
        found
    }

    fn prepare(&mut self, time: f64) {
        self.bound.refresh(&self.spheres, time);
        let target = self.bound.at(time);
        if target > self.cell_size {
            self.cell_size = target.max(self.cell_size * 2.0);
            self.rebucket();
        }
    }
}

fn cell_key(point: Point3, cell_size: f64) -> CellKey {
    let [x, y, z] = point;
    (
        floor_to_i64(x / cell_size),
        floor_to_i64(y / cell_size),
        floor_to_i64(z / cell_size),
    )
}
