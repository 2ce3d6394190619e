//! The sphere record.
//!
//! A sphere's radius is never stored: it is derived from the birth time,
//! the growth speed, and (once growth has stopped) the blocking time. This
//! keeps `radius(t) = v · (t - birth)` exact at every step and makes a
//! frozen radius impossible to drift.

use nucleation_types::{Point3, SphereId, SphereSnapshot};

/// A nucleated sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    /// Stable id, assigned in nucleation order.
    pub id: SphereId,
    /// Centre in domain coordinates.
    pub center: Point3,
    /// Simulation time of nucleation.
    pub birth_time: f64,
    /// Radial growth rate.
    pub growth_speed: f64,
    /// Time at which growth permanently stopped, if it has.
    blocked_at: Option<f64>,
}

impl Sphere {
    /// Create an unblocked sphere with radius 0 at `birth_time`.
    pub const fn new(id: SphereId, center: Point3, birth_time: f64, growth_speed: f64) -> Self {
        Self {
            id,
            center,
            birth_time,
            growth_speed,
            blocked_at: None,
        }
    }

    /// Radius at `time`. Zero before birth, frozen after blocking, never
    /// negative.
    pub fn radius_at(&self, time: f64) -> f64 {
        let end = self.blocked_at.map_or(time, |blocked| blocked.min(time));
        let elapsed = end - self.birth_time;
        if elapsed > 0.0 {
            self.growth_speed * elapsed
        } else {
            0.0
        }
    }

    /// Whether growth has permanently stopped.
    pub const fn is_blocked(&self) -> bool {
        self.blocked_at.is_some()
    }

    /// Time at which growth stopped, if it has.
    pub const fn blocked_at(&self) -> Option<f64> {
        self.blocked_at
    }

    /// Freeze the radius at its value at `time`. Blocking is terminal: a
    /// second call keeps the first blocking time. Returns whether this call
    /// blocked the sphere.
    pub fn block(&mut self, time: f64) -> bool {
        if self.blocked_at.is_some() {
            return false;
        }
        self.blocked_at = Some(time.max(self.birth_time));
        true
    }

    /// Capture centre and radius at `time`.
    pub fn snapshot(&self, time: f64) -> SphereSnapshot {
        SphereSnapshot {
            center: self.center,
            radius: self.radius_at(time),
        }
    }
}
