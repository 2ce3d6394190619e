//! Configuration loading and typed config structures for the simulation.
//!
//! The canonical configuration lives in `nucleation-config.yaml` at the
//! project root. [`NucleationConfig`] mirrors the whole file (simulation,
//! output, logging, observer sections); [`SimulationConfig`] is the part the
//! core consumes. Every field has a default, so an empty file is a valid
//! configuration.
//!
//! Validation happens at load time and again when a
//! [`SimulationState`](crate::state::SimulationState) is constructed, so an
//! invalid configuration never starts a run.

use std::path::Path;

use nucleation_types::{CountModel, DomainShape, GrowthPolicy, IndexKind, Point3};
use serde::{Deserialize, Serialize};

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A field holds a value the simulation cannot run with.
    #[error("invalid configuration for `{field}`: {reason}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Explanation of what is wrong with the value.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Top-level configuration file.
///
/// Mirrors the structure of `nucleation-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NucleationConfig {
    /// Simulation parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Where and how the snapshot sequence is written.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Observer HTTP server configuration.
    #[serde(default)]
    pub observer: ObserverConfig,
}

impl NucleationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override file values:
    /// - `NUCLEATION_OUTPUT` overrides `output.path`
    /// - `NUCLEATION_OBSERVER_PORT` overrides `observer.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if the simulation section fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides and validating the simulation section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if the simulation section fails validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        config.simulation.validate()?;
        Ok(config)
    }

    /// Override file values with environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `NUCLEATION_OBSERVER_PORT` is
    /// not a valid port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("NUCLEATION_OUTPUT") {
            self.output.path = val;
        }
        if let Ok(val) = std::env::var("NUCLEATION_OBSERVER_PORT") {
            self.observer.port = val.parse().map_err(|e| {
                ConfigError::invalid("observer.port", format!("{val:?} is not a port: {e}"))
            })?;
        }
        Ok(())
    }
}

/// Simulation parameters.
///
/// Defaults describe the reference scenario: unit cube,
/// `v = 0.01`, `λ0 = 100`, `α = 0.1`, `dt = 0.1`, free-volume threshold
/// `0.001`, 5000 Monte Carlo samples, `max_time = 100`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Shape of the domain.
    #[serde(default)]
    pub domain_shape: DomainShape,

    /// Cube edge length, or ball radius.
    #[serde(default = "default_domain_size")]
    pub domain_size: f64,

    /// Radial growth speed `v` given to every new sphere.
    #[serde(default = "default_growth_speed")]
    pub growth_speed: f64,

    /// Base nucleation intensity `λ0` (per unit volume per unit time).
    #[serde(default = "default_base_intensity")]
    pub base_intensity: f64,

    /// Exponent `α` of the intensity function `λ0 · exp(α t)`.
    #[serde(default = "default_growth_exponent")]
    pub growth_exponent: f64,

    /// Step size `dt`.
    #[serde(default = "default_time_step")]
    pub time_step: f64,

    /// The run terminates once the estimated free fraction drops below this.
    #[serde(default = "default_free_volume_threshold")]
    pub free_volume_threshold: f64,

    /// The run terminates once simulated time reaches this.
    #[serde(default = "default_max_time")]
    pub max_time: f64,

    /// Monte Carlo sample count per coverage estimate.
    #[serde(default = "default_monte_carlo_samples")]
    pub monte_carlo_samples: u64,

    /// Whether growing spheres may overlap.
    #[serde(default)]
    pub growth_policy: GrowthPolicy,

    /// Seed for the run's random source.
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// How the per-step nucleus count is drawn.
    #[serde(default)]
    pub count_model: CountModel,

    /// Candidate positions tried per drawn nucleus before giving up on it.
    #[serde(default = "default_max_attempts_per_candidate")]
    pub max_attempts_per_candidate: u32,

    /// Optional cap on the total number of spheres.
    #[serde(default)]
    pub max_spheres: Option<u64>,

    /// Optional cap on any single sphere's radius.
    #[serde(default)]
    pub max_radius: Option<f64>,

    /// Spatial index strategy.
    #[serde(default)]
    pub spatial_index: IndexKind,

    /// Record a snapshot every this many steps.
    #[serde(default = "default_snapshot_stride")]
    pub snapshot_stride: u64,

    /// Sphere centres seeded at `t = 0` before the first step.
    #[serde(default)]
    pub initial_nuclei: Vec<Point3>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            domain_shape: DomainShape::default(),
            domain_size: default_domain_size(),
            growth_speed: default_growth_speed(),
            base_intensity: default_base_intensity(),
            growth_exponent: default_growth_exponent(),
            time_step: default_time_step(),
            free_volume_threshold: default_free_volume_threshold(),
            max_time: default_max_time(),
            monte_carlo_samples: default_monte_carlo_samples(),
            growth_policy: GrowthPolicy::default(),
            random_seed: default_random_seed(),
            count_model: CountModel::default(),
            max_attempts_per_candidate: default_max_attempts_per_candidate(),
            max_spheres: None,
            max_radius: None,
            spatial_index: IndexKind::default(),
            snapshot_stride: default_snapshot_stride(),
            initial_nuclei: Vec::new(),
        }
    }
}

impl SimulationConfig {
    /// Parse a bare simulation section from a YAML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter the simulation depends on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.domain_size.is_finite() || self.domain_size <= 0.0 {
            return Err(ConfigError::invalid(
                "domain_size",
                format!("must be positive and finite, got {}", self.domain_size),
            ));
        }
        if !self.growth_speed.is_finite() || self.growth_speed < 0.0 {
            return Err(ConfigError::invalid(
                "growth_speed",
                format!("must be non-negative and finite, got {}", self.growth_speed),
            ));
        }
        if !self.base_intensity.is_finite() || self.base_intensity < 0.0 {
            return Err(ConfigError::invalid(
                "base_intensity",
                format!("must be non-negative and finite, got {}", self.base_intensity),
            ));
        }
        if !self.growth_exponent.is_finite() {
            return Err(ConfigError::invalid(
                "growth_exponent",
                format!("must be finite, got {}", self.growth_exponent),
            ));
        }
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(ConfigError::invalid(
                "time_step",
                format!("must be positive and finite, got {}", self.time_step),
            ));
        }
        if !(0.0..=1.0).contains(&self.free_volume_threshold) {
            return Err(ConfigError::invalid(
                "free_volume_threshold",
                format!("must lie in [0, 1], got {}", self.free_volume_threshold),
            ));
        }
        if !self.max_time.is_finite() || self.max_time < 0.0 {
            return Err(ConfigError::invalid(
                "max_time",
                format!("must be non-negative and finite, got {}", self.max_time),
            ));
        }
        if self.monte_carlo_samples == 0 {
            return Err(ConfigError::invalid(
                "monte_carlo_samples",
                "must be at least 1",
            ));
        }
        if self.max_attempts_per_candidate == 0 {
            return Err(ConfigError::invalid(
                "max_attempts_per_candidate",
                "must be at least 1",
            ));
        }
        if self.snapshot_stride == 0 {
            return Err(ConfigError::invalid("snapshot_stride", "must be at least 1"));
        }
        if let Some(cap) = self.max_radius.filter(|cap| !cap.is_finite() || *cap <= 0.0) {
            return Err(ConfigError::invalid(
                "max_radius",
                format!("must be positive and finite, got {cap}"),
            ));
        }
        self.validate_initial_nuclei()
    }

    /// Initial nuclei must sit inside the domain and be pairwise distinct;
    /// two nuclei at the same point would overlap as soon as they grow.
    fn validate_initial_nuclei(&self) -> Result<(), ConfigError> {
        let domain = crate::domain::Domain::from_config(self);
        for (i, center) in self.initial_nuclei.iter().enumerate() {
            if !domain.contains_point(*center) {
                return Err(ConfigError::invalid(
                    "initial_nuclei",
                    format!("nucleus {i} at {center:?} lies outside the domain"),
                ));
            }
            let duplicate = self
                .initial_nuclei
                .iter()
                .skip(i.saturating_add(1))
                .any(|other| crate::domain::distance(*center, *other) <= 0.0);
            if duplicate {
                return Err(ConfigError::invalid(
                    "initial_nuclei",
                    format!("nucleus {i} at {center:?} is listed twice"),
                ));
            }
        }
        Ok(())
    }
}

/// Snapshot output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON snapshot file written after a run.
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Pretty-print the JSON output.
    #[serde(default)]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            pretty: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Observer HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Whether the engine serves its results over HTTP after the run.
    #[serde(default)]
    pub enabled: bool,

    /// Bind address.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_domain_size() -> f64 {
    1.0
}

const fn default_growth_speed() -> f64 {
    0.01
}

const fn default_base_intensity() -> f64 {
    100.0
}

const fn default_growth_exponent() -> f64 {
    0.1
}

const fn default_time_step() -> f64 {
    0.1
}

const fn default_free_volume_threshold() -> f64 {
    0.001
}

const fn default_max_time() -> f64 {
    100.0
}

const fn default_monte_carlo_samples() -> u64 {
    5000
}

const fn default_random_seed() -> u64 {
    42
}

const fn default_max_attempts_per_candidate() -> u32 {
    1
}

const fn default_snapshot_stride() -> u64 {
    1
}

fn default_output_path() -> String {
    "output.json".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}
