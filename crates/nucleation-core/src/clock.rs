//! Step state machine and termination.
//!
//! The clock drives one [`SimulationState`] forward a step at a time. Each
//! step runs, in order:
//!
//! 1. **Coverage** -- estimate the free fraction at the current time.
//! 2. **Termination** -- stop with [`TerminationReason::LowFreeVolume`]
//!    when the free fraction is below the threshold, or with
//!    [`TerminationReason::TimeLimitReached`] once `t >= max_time`.
//! 3. **Nucleation** -- draw and place new nuclei at `t`.
//! 4. **Growth** -- advance radii to `t + dt`, blocking where required.
//! 5. **Advance** -- increment the step counter (checked). The check runs
//!    after termination, so a run parked at the last representable step
//!    still reports why it ended.
//!
//! Once terminated, the clock keeps returning the same reason and never
//! touches the state again.

use nucleation_types::{StepReport, TerminationReason};
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::coverage::{CoverageEstimate, estimate_free_fraction};
use crate::growth::GrowthModel;
use crate::nucleation::NucleationScheduler;
use crate::state::SimulationState;

/// Relative tolerance applied to the time limit, in units of `dt`.
const TIME_LIMIT_TOLERANCE: f64 = 1e-9;

/// Errors that can occur while stepping.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Step counter would overflow.
    #[error("step counter overflow: cannot advance beyond u64::MAX")]
    StepOverflow,
}

/// Result of one call to [`SimulationClock::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// The step ran; the state now sits one `dt` later.
    Advanced(StepReport),
    /// The run is over; the state was not modified.
    Terminated(TerminationReason),
}

impl StepOutcome {
    /// The step report, if the step ran.
    pub const fn report(self) -> Option<StepReport> {
        match self {
            Self::Advanced(report) => Some(report),
            Self::Terminated(_) => None,
        }
    }
}

/// Drives the coverage, nucleation and growth stages step by step.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    terminated: Option<TerminationReason>,
    scheduler: NucleationScheduler,
    growth: GrowthModel,
    free_volume_threshold: f64,
    max_time: f64,
    time_step: f64,
    monte_carlo_samples: u64,
    last_estimate: Option<CoverageEstimate>,
}

impl SimulationClock {
    /// Create a running clock for the given configuration.
    pub const fn new(config: &SimulationConfig) -> Self {
        Self {
            terminated: None,
            scheduler: NucleationScheduler::from_config(config),
            growth: GrowthModel::from_config(config),
            free_volume_threshold: config.free_volume_threshold,
            max_time: config.max_time,
            time_step: config.time_step,
            monte_carlo_samples: config.monte_carlo_samples,
            last_estimate: None,
        }
    }

    /// The most recent coverage estimate. After termination this is the
    /// estimate that ended the run.
    pub const fn last_estimate(&self) -> Option<CoverageEstimate> {
        self.last_estimate
    }

    /// Run one step.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::StepOverflow`] if the run has not terminated
    /// but the step counter would exceed `u64::MAX`. No sphere is added or
    /// blocked in that case.
    pub fn step(&mut self, state: &mut SimulationState) -> Result<StepOutcome, ClockError> {
        if let Some(reason) = self.terminated {
            return Ok(StepOutcome::Terminated(reason));
        }

        let step = state.step;
        let time = state.time();

        // --- Coverage ---
        state.index.prepare(time);
        let estimate = estimate_free_fraction(
            &*state.index,
            &state.domain,
            &mut state.rng,
            time,
            self.monte_carlo_samples,
        );
        self.last_estimate = Some(estimate);
        let free_fraction = estimate.free_fraction();

        // --- Termination ---
        if free_fraction < self.free_volume_threshold {
            return Ok(self.terminate(TerminationReason::LowFreeVolume, state, free_fraction));
        }
        if time >= TIME_LIMIT_TOLERANCE.mul_add(-self.time_step, self.max_time) {
            return Ok(self.terminate(TerminationReason::TimeLimitReached, state, free_fraction));
        }
        let next_step = step.checked_add(1).ok_or(ClockError::StepOverflow)?;
        let next_time = state.time_at(next_step);

        // --- Nucleation ---
        let nucleation = self.scheduler.nucleate(state, free_fraction);

        // --- Growth ---
        let growth = self
            .growth
            .advance(&mut *state.index, &state.domain, time, next_time);

        // --- Advance ---
        state.step = next_step;

        let report = StepReport {
            step,
            time,
            free_fraction,
            free_fraction_error: estimate.standard_error(),
            expected_nuclei: nucleation.expected,
            drawn: nucleation.requested,
            accepted: u64::try_from(nucleation.accepted.len()).unwrap_or(u64::MAX),
            rejected: nucleation.rejected,
            newly_blocked: u64::try_from(growth.newly_blocked.len()).unwrap_or(u64::MAX),
            sphere_count: state.sphere_count(),
        };

        debug!(
            step,
            time,
            free_fraction,
            expected = report.expected_nuclei,
            nucleated = report.accepted,
            rejected = report.rejected,
            blocked = report.newly_blocked,
            spheres = report.sphere_count,
            "Step complete"
        );

        Ok(StepOutcome::Advanced(report))
    }

    fn terminate(
        &mut self,
        reason: TerminationReason,
        state: &SimulationState,
        free_fraction: f64,
    ) -> StepOutcome {
        info!(
            step = state.step(),
            time = state.time(),
            free_fraction,
            spheres = state.sphere_count(),
            ?reason,
            "Simulation terminated"
        );
        self.terminated = Some(reason);
        StepOutcome::Terminated(reason)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn quiet_config() -> SimulationConfig {
        SimulationConfig {
            base_intensity: 0.0,
            max_time: 1.0,
            monte_carlo_samples: 200,
            ..SimulationConfig::default()
        }
    }

    fn run_to_end(clock: &mut SimulationClock, state: &mut SimulationState) -> (u64, TerminationReason) {
        let mut advanced = 0_u64;
        loop {
            match clock.step(state).unwrap() {
                StepOutcome::Advanced(_) => advanced = advanced.saturating_add(1),
                StepOutcome::Terminated(reason) => return (advanced, reason),
            }
        }
    }

    #[test]
    fn time_limit_stops_at_max_time() {
        let config = quiet_config();
        let mut clock = SimulationClock::new(&config);
        let mut state = SimulationState::new(config).unwrap();

        let (advanced, reason) = run_to_end(&mut clock, &mut state);
        assert_eq!(reason, TerminationReason::TimeLimitReached);
        assert_eq!(advanced, 10);
        assert!((state.time() - 1.0).abs() < 1e-12);
        assert_eq!(
            clock.step(&mut state).unwrap(),
            StepOutcome::Terminated(TerminationReason::TimeLimitReached)
        );
    }

    #[test]
    fn zero_max_time_terminates_before_any_step() {
        let config = SimulationConfig {
            max_time: 0.0,
            ..quiet_config()
        };
        let mut clock = SimulationClock::new(&config);
        let mut state = SimulationState::new(config).unwrap();

        let (advanced, reason) = run_to_end(&mut clock, &mut state);
        assert_eq!(advanced, 0);
        assert_eq!(reason, TerminationReason::TimeLimitReached);
        assert_eq!(state.step(), 0);
    }

    #[test]
    fn low_free_volume_wins_over_time_limit() {
        let config = SimulationConfig {
            free_volume_threshold: 0.5,
            growth_speed: 2.0,
            initial_nuclei: vec![[0.5, 0.5, 0.5]],
            ..quiet_config()
        };
        let mut clock = SimulationClock::new(&config);
        let mut state = SimulationState::new(config).unwrap();

        // Radius 0.6 at t = 0.3 covers about 80% of the cube.
        let (advanced, reason) = run_to_end(&mut clock, &mut state);
        assert_eq!(reason, TerminationReason::LowFreeVolume);
        assert!(advanced <= 4);
        assert!(clock.last_estimate().unwrap().free_fraction() < 0.5);
    }

    #[test]
    fn terminated_clock_leaves_state_alone() {
        let config = SimulationConfig {
            max_time: 0.0,
            ..quiet_config()
        };
        let mut clock = SimulationClock::new(&config);
        let mut state = SimulationState::new(config).unwrap();
        run_to_end(&mut clock, &mut state);

        let before = state.rng.clone().uniform().to_bits();
        for _ in 0..3 {
            assert_eq!(
                clock.step(&mut state).unwrap(),
                StepOutcome::Terminated(TerminationReason::TimeLimitReached)
            );
        }
        assert_eq!(state.rng.clone().uniform().to_bits(), before);
        assert_eq!(state.step(), 0);
    }

    #[test]
    fn overflowing_step_counter_is_an_error() {
        let config = SimulationConfig {
            max_time: f64::MAX,
            ..quiet_config()
        };
        let mut clock = SimulationClock::new(&config);
        let mut state = SimulationState::new(config).unwrap();
        state.step = u64::MAX;

        assert!(matches!(clock.step(&mut state), Err(ClockError::StepOverflow)));
        assert_eq!(state.step(), u64::MAX);
        assert_eq!(state.sphere_count(), 0);
    }

    #[test]
    fn last_step_still_reports_its_termination_reason() {
        let config = quiet_config();
        let mut clock = SimulationClock::new(&config);
        let mut state = SimulationState::new(config).unwrap();
        state.step = u64::MAX;

        assert_eq!(
            clock.step(&mut state).unwrap(),
            StepOutcome::Terminated(TerminationReason::TimeLimitReached)
        );
        assert_eq!(state.step(), u64::MAX);
    }

    #[test]
    fn last_step_still_reports_low_free_volume() {
        let config = SimulationConfig {
            free_volume_threshold: 0.5,
            max_time: f64::MAX,
            initial_nuclei: vec![[0.5, 0.5, 0.5]],
            ..quiet_config()
        };
        let mut clock = SimulationClock::new(&config);
        let mut state = SimulationState::new(config).unwrap();
        state.step = u64::MAX;

        assert_eq!(
            clock.step(&mut state).unwrap(),
            StepOutcome::Terminated(TerminationReason::LowFreeVolume)
        );
    }

    #[test]
    fn reports_describe_the_step_that_ran() {
        let config = SimulationConfig {
            base_intensity: 100.0,
            ..quiet_config()
        };
        let mut clock = SimulationClock::new(&config);
        let mut state = SimulationState::new(config).unwrap();

        let report = clock.step(&mut state).unwrap().report().unwrap();
        assert_eq!(report.step, 0);
        assert!(report.time.abs() < f64::EPSILON);
        assert!((report.free_fraction - 1.0).abs() < f64::EPSILON);
        assert!(report.free_fraction_error.abs() < f64::EPSILON);
        assert!((report.expected_nuclei - 10.0).abs() < 1e-9);
        assert_eq!(report.accepted.saturating_add(report.rejected), report.drawn);
        assert_eq!(report.sphere_count, state.sphere_count());
        assert_eq!(state.step(), 1);
    }
}
