//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup, the simulation run, and output.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: nucleation_core::ConfigError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: nucleation_core::RunnerError,
    },

    /// The blocking simulation task panicked or was cancelled.
    #[error("simulation task failed: {message}")]
    Task {
        /// Description of the task failure.
        message: String,
    },

    /// Writing the snapshot file failed.
    #[error("output error for {path}: {source}")]
    Output {
        /// Destination path.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Encoding the snapshot sequence failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// Observer API server failed to start.
    #[error("observer error: {message}")]
    Observer {
        /// Description of the observer failure.
        message: String,
    },
}
