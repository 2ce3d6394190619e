//! Radius law and the per-step growth pass.
//!
//! Radii are derived, never integrated: `r(t) = v · (t - birth)`, frozen
//! once a sphere is blocked. The growth pass therefore only decides which
//! spheres stop.
//!
//! Under [`GrowthPolicy::Constrained`] every unblocked sphere's radius at
//! `t + dt` is checked against the domain boundary and against each
//! neighbour's radius at `t + dt` (its proposed radius if still growing,
//! its frozen radius otherwise). A sphere that fails either check is
//! blocked at `t`, so its radius stays at the last value known to be valid.
//!
//! All decisions of one pass are computed against the pre-step population
//! and applied afterwards. Given a non-overlapping population at `t`, the
//! population at `t + dt` is non-overlapping too: any pair that would touch
//! is caught by both members, and a pair that passes does not overlap at
//! `t + dt` (and, radii being linear in time, at any instant in between).

use nucleation_types::{GrowthPolicy, SphereId};

use crate::config::SimulationConfig;
use crate::domain::{Domain, distance};
use crate::spatial::SpatialIndex;
use crate::sphere::Sphere;

/// Result of one growth pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrowthOutcome {
    /// Spheres blocked by this pass, in nucleation order.
    pub newly_blocked: Vec<SphereId>,
}

/// Growth policy plus the optional radius cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthModel {
    policy: GrowthPolicy,
    max_radius: Option<f64>,
}

impl GrowthModel {
    /// Create a growth model.
    pub const fn new(policy: GrowthPolicy, max_radius: Option<f64>) -> Self {
        Self { policy, max_radius }
    }

    /// Build the growth model described by a simulation config.
    pub const fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.growth_policy, config.max_radius)
    }

    /// Radius of `sphere` at `time` under this model; never negative and
    /// never above the cap.
    pub fn radius_at(&self, sphere: &Sphere, time: f64) -> f64 {
        let radius = sphere.radius_at(time);
        self.max_radius.map_or(radius, |cap| radius.min(cap))
    }

    /// Advance the population from `time` to `next_time`, blocking every
    /// sphere that must stop.
    pub fn advance(
        &self,
        index: &mut dyn SpatialIndex,
        domain: &Domain,
        time: f64,
        next_time: f64,
    ) -> GrowthOutcome {
        if self.policy == GrowthPolicy::Unconstrained && self.max_radius.is_none() {
            return GrowthOutcome::default();
        }

        let decisions = self.plan(&*index, domain, time, next_time);

        let mut outcome = GrowthOutcome::default();
        for (id, blocked_at) in decisions {
            if index.block(id, blocked_at) {
                outcome.newly_blocked.push(id);
            }
        }
        outcome
    }

    /// Decide which spheres stop and when, without touching the index.
    fn plan(
        &self,
        index: &dyn SpatialIndex,
        domain: &Domain,
        time: f64,
        next_time: f64,
    ) -> Vec<(SphereId, f64)> {
        let bound = index.max_radius_bound(next_time);
        let mut decisions = Vec::new();

        for sphere in index.spheres().iter().filter(|s| !s.is_blocked()) {
            let proposed = sphere.radius_at(next_time);

            if self.policy == GrowthPolicy::Constrained
                && collides(index, domain, sphere, proposed, bound, next_time)
            {
                decisions.push((sphere.id, time));
                continue;
            }

            if let Some(cap) = self.max_radius.filter(|&cap| proposed > cap) {
                decisions.push((sphere.id, cap_time(sphere, cap, time)));
            }
        }
        decisions
    }
}

/// Whether `sphere` at radius `proposed` would leave the domain or overlap
/// a neighbour's radius at `next_time`.
fn collides(
    index: &dyn SpatialIndex,
    domain: &Domain,
    sphere: &Sphere,
    proposed: f64,
    bound: f64,
    next_time: f64,
) -> bool {
    if !domain.encloses_sphere(sphere.center, proposed) {
        return true;
    }
    index
        .neighbors_within(sphere.center, proposed + bound)
        .into_iter()
        .filter(|other| other.id != sphere.id)
        .any(|other| distance(sphere.center, other.center) < proposed + other.radius_at(next_time))
}

/// Instant at which `sphere` reaches `cap`, no earlier than `time`.
fn cap_time(sphere: &Sphere, cap: f64, time: f64) -> f64 {
    if sphere.growth_speed > 0.0 {
        (sphere.birth_time + cap / sphere.growth_speed).max(time)
    } else {
        time
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::numeric::count_to_f64;
    use crate::spatial::{GridIndex, LinearIndex};

    const DT: f64 = 0.1;

    fn cube() -> Domain {
        Domain::Cube { size: 1.0 }
    }

    /// Run growth passes over `steps` steps of size `DT`.
    fn run(model: &GrowthModel, index: &mut dyn SpatialIndex, steps: u64) -> Vec<SphereId> {
        let domain = cube();
        let mut blocked = Vec::new();
        for step in 0..steps {
            let time = count_to_f64(step) * DT;
            let next_time = count_to_f64(step + 1) * DT;
            index.prepare(time);
            blocked.extend(model.advance(index, &domain, time, next_time).newly_blocked);
        }
        blocked
    }

    #[test]
    fn unconstrained_growth_never_blocks() {
        let model = GrowthModel::new(GrowthPolicy::Unconstrained, None);
        let mut index = LinearIndex::new();
        index.insert(Sphere::new(SphereId(0), [0.4, 0.5, 0.5], 0.0, 0.01));
        index.insert(Sphere::new(SphereId(1), [0.6, 0.5, 0.5], 0.0, 0.01));

        assert!(run(&model, &mut index, 200).is_empty());
        let r = model.radius_at(index.get(SphereId(0)).unwrap(), 20.0);
        assert!((r - 0.2).abs() < 1e-12);
    }

    #[test]
    fn touching_spheres_both_stop_without_overlap() {
        let model = GrowthModel::new(GrowthPolicy::Constrained, None);
        let mut index = LinearIndex::new();
        index.insert(Sphere::new(SphereId(0), [0.4, 0.5, 0.5], 0.0, 0.01));
        index.insert(Sphere::new(SphereId(1), [0.6, 0.5, 0.5], 0.0, 0.01));

        let blocked = run(&model, &mut index, 200);
        assert_eq!(blocked, vec![SphereId(0), SphereId(1)]);

        let a = index.get(SphereId(0)).unwrap();
        let b = index.get(SphereId(1)).unwrap();
        let gap = distance(a.center, b.center) - a.radius_at(50.0) - b.radius_at(50.0);
        assert!(gap >= -1e-9);
        // Stopped within one step of contact.
        assert!(a.radius_at(50.0) > 0.1 - 0.01 - 1e-9);
    }

    #[test]
    fn blocked_neighbour_keeps_its_frozen_radius() {
        let model = GrowthModel::new(GrowthPolicy::Constrained, None);
        let mut index = LinearIndex::new();
        let mut frozen = Sphere::new(SphereId(0), [0.3, 0.5, 0.5], 0.0, 0.01);
        frozen.block(5.0);
        index.insert(frozen);
        index.insert(Sphere::new(SphereId(1), [0.6, 0.5, 0.5], 0.0, 0.01));

        let blocked = run(&model, &mut index, 400);
        assert_eq!(blocked, vec![SphereId(1)]);
        let grower = index.get(SphereId(1)).unwrap();
        // 0.3 apart, neighbour frozen at 0.05: the grower reaches ~0.25.
        assert!(grower.radius_at(100.0) <= 0.25 + 1e-9);
        assert!(grower.radius_at(100.0) > 0.24 - 1e-9);
    }

    #[test]
    fn boundary_blocks_constrained_growth() {
        let model = GrowthModel::new(GrowthPolicy::Constrained, None);
        let mut index = LinearIndex::new();
        index.insert(Sphere::new(SphereId(0), [0.05, 0.5, 0.5], 0.0, 0.01));

        assert_eq!(run(&model, &mut index, 100), vec![SphereId(0)]);
        let r = index.get(SphereId(0)).unwrap().radius_at(10.0);
        assert!(r <= 0.05 + 1e-9);
        assert!(cube().encloses_sphere([0.05, 0.5, 0.5], r));
    }

    #[test]
    fn radius_cap_applies_without_constraints() {
        let model = GrowthModel::new(GrowthPolicy::Unconstrained, Some(0.05));
        let mut index = LinearIndex::new();
        index.insert(Sphere::new(SphereId(0), [0.5, 0.5, 0.5], 0.0, 0.01));
        index.insert(Sphere::new(SphereId(1), [0.5, 0.52, 0.5], 0.0, 0.01));

        let blocked = run(&model, &mut index, 100);
        assert_eq!(blocked.len(), 2);
        for sphere in index.spheres() {
            assert!((sphere.radius_at(100.0) - 0.05).abs() < 1e-9);
            assert!(model.radius_at(sphere, 1000.0) <= 0.05 + 1e-12);
        }
    }

    #[test]
    fn grid_and_linear_block_the_same_spheres() {
        let model = GrowthModel::new(GrowthPolicy::Constrained, None);
        let mut linear = LinearIndex::new();
        let mut grid = GridIndex::for_domain(&cube());
        let centers = [
            [0.2, 0.2, 0.2],
            [0.3, 0.25, 0.2],
            [0.7, 0.7, 0.7],
            [0.75, 0.6, 0.7],
            [0.5, 0.5, 0.1],
            [0.5, 0.9, 0.5],
        ];
        for (i, center) in (0_u64..).zip(centers) {
            let sphere = Sphere::new(SphereId(i), center, count_to_f64(i), 0.02);
            linear.insert(sphere.clone());
            grid.insert(sphere);
        }
        assert_eq!(run(&model, &mut linear, 300), run(&model, &mut grid, 300));
    }
}
