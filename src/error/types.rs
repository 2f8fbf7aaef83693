//! Custom error types with exit codes

use thiserror::Error;

/// Main error type for sparsedep operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FetchError {
    /// Configuration Error - missing or invalid step options or manifest
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The search-path variable is not set in the build environment
    #[error("Environment error: search path variable '{variable}' is not set")]
    NoSearchPath { variable: String },

    /// No search-path segment contains the requested executable
    #[error("Environment error: executable '{executable}' not found in {variable}")]
    ExecutableNotFound { executable: String, variable: String },

    /// A dependency cycle was found while walking the build graph
    #[error("Graph error: circular dependency detected at node '{node}'")]
    CircularDependency { node: String },

    /// An external process failed to spawn, exited nonzero or was killed
    #[error("Process error: {phase} failed: {message}")]
    Process { phase: String, message: String },

    /// Filesystem Error - a required path could not be determined
    #[error("Filesystem error: {message}")]
    Filesystem { message: String },
}

impl FetchError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Configuration { .. }
            | Self::NoSearchPath { .. }
            | Self::ExecutableNotFound { .. } => 1,
            Self::CircularDependency { .. } => 2,
            Self::Process { .. } => 3,
            Self::Filesystem { .. } => 4,
        }
    }

    /// Create a configuration error
    #[inline]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a process error for the given phase
    #[inline]
    pub fn process<P: Into<String>, S: Into<String>>(phase: P, message: S) -> Self {
        Self::Process {
            phase: phase.into(),
            message: message.into(),
        }
    }

    /// Create a filesystem error
    #[inline]
    pub fn filesystem<S: Into<String>>(message: S) -> Self {
        Self::Filesystem {
            message: message.into(),
        }
    }
}
