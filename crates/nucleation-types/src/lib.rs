//! Shared type definitions for the nucleation-and-growth simulation.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries: the simulation core produces them, the observer serves them,
//! and the rendering layer consumes them. Types flow downstream to
//! `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Sphere identifiers and the [`Point3`] coordinate alias
//! - [`enums`] -- Policy and outcome enumerations (growth policy, domain
//!   shape, count model, index strategy, termination reason)
//! - [`structs`] -- Snapshot payloads consumed by the rendering layer, and
//!   per-step diagnostics

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{CountModel, DomainShape, GrowthPolicy, IndexKind, RunEnd, TerminationReason};
pub use ids::{Point3, SphereId};
pub use structs::{Snapshot, SphereSnapshot, StepReport};
