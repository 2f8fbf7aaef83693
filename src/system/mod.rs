//! System abstraction for environment, filesystem and process operations
//!
//! This module provides a unified trait for all external system interactions,
//! allowing for easy testing with mock implementations.

use core::fmt;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

pub mod mock;
pub mod real;

pub use mock::MockSystem;
pub use real::RealSystem;

/// A fully specified external process invocation
///
/// The environment is the complete environment of the child; nothing from
/// the parent process leaks in beyond what is listed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    /// Program followed by its arguments, as a display-friendly argv
    #[must_use]
    #[inline]
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.display().to_string());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// How an external process terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// Normal termination with an exit code
    Exited(i32),
    /// Abnormal termination (killed by a signal, crashed)
    Signaled(Option<i32>),
}

impl ProcessExit {
    #[must_use]
    #[inline]
    pub const fn success(self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Exited(code) => write!(f, "exited with code {code}"),
            Self::Signaled(Some(signal)) => write!(f, "terminated by signal {signal}"),
            Self::Signaled(None) => write!(f, "terminated abnormally"),
        }
    }
}

/// Unified trait for system operations (environment + filesystem + processes)
///
/// # Implementations
/// - `RealSystem`: Production implementation using `std::env`, `std::fs` and `std::process`
/// - `MockSystem`: Test implementation using in-memory storage and recorded invocations
pub trait System: Send + Sync {
    // ==================== Environment Operations ====================

    /// Snapshot of the whole environment
    ///
    /// Only variables whose name and value are valid UTF-8 are included.
    fn env_vars(&self) -> BTreeMap<String, String>;

    /// Get the current working directory
    fn current_dir(&self) -> io::Result<PathBuf>;

    // ==================== Filesystem Operations ====================

    /// Read entire file contents as a string
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Recursively create a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path points to a file
    fn is_file(&self, path: &Path) -> bool;

    // ==================== Process Operations ====================

    /// Spawn a process and block until it terminates
    ///
    /// stdin is never offered to the child; stdout and stderr are shared
    /// with the calling process.
    fn run_process(&self, invocation: &Invocation) -> io::Result<ProcessExit>;
}
