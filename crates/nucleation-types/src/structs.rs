//! Snapshot payloads.
//!
//! A [`Snapshot`] is the contract between the simulation and any rendering
//! layer: `{time, spheres: [{center: [x, y, z], radius}]}`. Snapshots are
//! deep copies taken at a single instant and are never mutated afterwards.
//!
//! A [`StepReport`] carries the per-step diagnostics streamed to observers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::Point3;

/// One sphere as seen at the snapshot instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SphereSnapshot {
    /// Sphere centre.
    pub center: Point3,
    /// Radius at the snapshot time.
    pub radius: f64,
}

/// Immutable capture of the whole sphere population at one simulated time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Snapshot {
    /// Simulated time of the capture.
    pub time: f64,
    /// Spheres in nucleation order.
    pub spheres: Vec<SphereSnapshot>,
}

impl Snapshot {
    /// Number of spheres captured.
    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    /// Whether the snapshot holds no spheres.
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    /// Largest captured radius, or 0 for an empty snapshot.
    pub fn max_radius(&self) -> f64 {
        self.spheres
            .iter()
            .map(|sphere| sphere.radius)
            .fold(0.0, f64::max)
    }
}

/// Diagnostics for one completed step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StepReport {
    /// Step index that just ran (time before the step is `step * dt`).
    pub step: u64,
    /// Simulated time at the start of the step.
    pub time: f64,
    /// Estimated free-volume fraction at `time`.
    pub free_fraction: f64,
    /// Binomial standard error of `free_fraction`.
    pub free_fraction_error: f64,
    /// Expected nucleus count from the intensity function.
    pub expected_nuclei: f64,
    /// Nucleus count drawn from the count model.
    pub drawn: u64,
    /// Nuclei placed in free space.
    pub accepted: u64,
    /// Drawn nuclei dropped after exhausting their placement attempts or
    /// hitting the population cap.
    pub rejected: u64,
    /// Spheres blocked by this step's growth pass.
    pub newly_blocked: u64,
    /// Population after the step.
    pub sphere_count: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_json_matches_render_contract() {
        let snapshot = Snapshot {
            time: 0.5,
            spheres: vec![SphereSnapshot {
                center: [0.5, 0.25, 0.75],
                radius: 0.125,
            }],
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            r#"{"time":0.5,"spheres":[{"center":[0.5,0.25,0.75],"radius":0.125}]}"#
        );
    }

    #[test]
    fn max_radius_of_empty_snapshot_is_zero() {
        let snapshot = Snapshot {
            time: 0.0,
            spheres: Vec::new(),
        };
        assert!(snapshot.is_empty());
        assert!(snapshot.max_radius().abs() < f64::EPSILON);
    }
}
