//! Enumeration types for the nucleation-and-growth simulation.
//!
//! Every enum here is part of the configuration or output contract, so
//! they serialize as `snake_case` strings (`"constrained"`,
//! `"low_free_volume"`, ...).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Configuration enums
// ---------------------------------------------------------------------------

/// How spheres interact while they grow.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum GrowthPolicy {
    /// Radii grow forever at the growth speed; overlaps are allowed.
    #[default]
    Unconstrained,
    /// A sphere stops permanently once further growth would overlap another
    /// sphere or leave the domain.
    Constrained,
}

/// Shape of the bounded volume spheres nucleate in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DomainShape {
    /// Axis-aligned cube `[0, size]^3`.
    #[default]
    Cube,
    /// Ball of radius `size` centred at the origin.
    Ball,
}

/// How the number of new nuclei per step is drawn from its expected value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum CountModel {
    /// Draw from a Poisson distribution with the expected count as mean.
    #[default]
    Poisson,
    /// `floor(expected + U(0, 1))`. Matches the mean but understates the
    /// variance of the Poisson draw.
    StochasticRounding,
}

/// Spatial index strategy backing occupancy and collision queries.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum IndexKind {
    /// Uniform grid with bucket size tied to the maximum radius.
    #[default]
    Grid,
    /// Exact pairwise sweep over every sphere.
    Linear,
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

/// Why the simulation clock stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TerminationReason {
    /// The estimated free-volume fraction fell below the configured threshold.
    LowFreeVolume,
    /// Simulated time reached `max_time`.
    TimeLimitReached,
}

/// How a driven simulation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RunEnd {
    /// The clock reached a terminal state.
    Terminated(TerminationReason),
    /// The caller stopped the run between two steps.
    Aborted,
}

impl RunEnd {
    /// Return the termination reason, if the clock terminated on its own.
    pub const fn termination(self) -> Option<TerminationReason> {
        match self {
            Self::Terminated(reason) => Some(reason),
            Self::Aborted => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn policies_use_snake_case_names() {
        let json = serde_json::to_string(&GrowthPolicy::Constrained).unwrap();
        assert_eq!(json, "\"constrained\"");
        let parsed: CountModel = serde_json::from_str("\"stochastic_rounding\"").unwrap();
        assert_eq!(parsed, CountModel::StochasticRounding);
    }

    #[test]
    fn defaults_are_cube_poisson_grid() {
        assert_eq!(GrowthPolicy::default(), GrowthPolicy::Unconstrained);
        assert_eq!(DomainShape::default(), DomainShape::Cube);
        assert_eq!(CountModel::default(), CountModel::Poisson);
        assert_eq!(IndexKind::default(), IndexKind::Grid);
    }

    #[test]
    fn run_end_exposes_termination() {
        let end = RunEnd::Terminated(TerminationReason::LowFreeVolume);
        assert_eq!(end.termination(), Some(TerminationReason::LowFreeVolume));
        assert_eq!(RunEnd::Aborted.termination(), None);

        let json = serde_json::to_string(&end).unwrap();
        assert_eq!(json, r#"{"terminated":"low_free_volume"}"#);
    }
}
