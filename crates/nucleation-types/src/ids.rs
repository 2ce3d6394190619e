//! Sphere identifiers and coordinates.
//!
//! Sphere ids are plain sequential integers: the simulation hands them out
//! in nucleation order and never reuses one, so an id doubles as the
//! sphere's position in the population.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A point in the simulation domain's coordinate system.
pub type Point3 = [f64; 3];

/// Stable identifier for a sphere, assigned at nucleation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct SphereId(pub u64);

impl SphereId {
    /// The first id handed out by a fresh simulation.
    pub const FIRST: Self = Self(0);

    /// Return the id that follows this one, or `None` on overflow.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Return the inner integer value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for SphereId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sphere-{}", self.0)
    }
}

impl From<u64> for SphereId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<SphereId> for u64 {
    fn from(id: SphereId) -> Self {
        id.0
    }
}
