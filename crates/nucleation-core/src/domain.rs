//! The bounded volume spheres nucleate in.
//!
//! Two shapes are supported: the cube `[0, size]^3` used for batch runs,
//! and a ball of radius `size` centred at the origin, the world shape
//! interactive viewers render.

use std::f64::consts::PI;

use nucleation_types::{DomainShape, Point3};

use crate::config::SimulationConfig;
use crate::random::RandomSource;

/// A bounded simulation domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    /// Axis-aligned cube spanning `[0, size]` on each axis.
    Cube {
        /// Edge length.
        size: f64,
    },
    /// Ball centred at the origin.
    Ball {
        /// Ball radius.
        radius: f64,
    },
}

impl Domain {
    /// Build a domain of the given shape and size.
    pub const fn new(shape: DomainShape, size: f64) -> Self {
        match shape {
            DomainShape::Cube => Self::Cube { size },
            DomainShape::Ball => Self::Ball { radius: size },
        }
    }

    /// Build the domain described by a simulation config.
    pub const fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.domain_shape, config.domain_size)
    }

    /// Domain volume.
    pub fn volume(&self) -> f64 {
        match *self {
            Self::Cube { size } => size.powi(3),
            Self::Ball { radius } => 4.0 / 3.0 * PI * radius.powi(3),
        }
    }

    /// Edge length of the domain's bounding box.
    pub fn extent(&self) -> f64 {
        match *self {
            Self::Cube { size } => size,
            Self::Ball { radius } => 2.0 * radius,
        }
    }

    /// Draw a point uniformly from the domain.
    pub fn sample(&self, rng: &mut RandomSource) -> Point3 {
        match *self {
            Self::Cube { size } => [
                rng.uniform() * size,
                rng.uniform() * size,
                rng.uniform() * size,
            ],
            Self::Ball { radius } => {
                let [x, y, z] = rng.unit_ball();
                [x * radius, y * radius, z * radius]
            }
        }
    }

    /// Whether a point lies inside the (closed) domain.
    pub fn contains_point(&self, point: Point3) -> bool {
        match *self {
            Self::Cube { size } => point.iter().all(|c| (0.0..=size).contains(c)),
            Self::Ball { radius } => norm(point) <= radius,
        }
    }

    /// Whether a sphere of the given centre and radius lies entirely inside
    /// the domain.
    pub fn encloses_sphere(&self, center: Point3, radius: f64) -> bool {
        match *self {
            Self::Cube { size } => center
                .iter()
                .all(|c| c - radius >= 0.0 && c + radius <= size),
            Self::Ball { radius: outer } => norm(center) + radius <= outer,
        }
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Point3, b: Point3) -> f64 {
    let [ax, ay, az] = a;
    let [bx, by, bz] = b;
    norm([ax - bx, ay - by, az - bz])
}

/// Euclidean length of a vector.
pub fn norm(v: Point3) -> f64 {
    let [x, y, z] = v;
    x.hypot(y).hypot(z)
}
