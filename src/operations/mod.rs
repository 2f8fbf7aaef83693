//! Operations module
//!
//! Coordinates a build: graph construction from the manifest, command steps
//! and child process execution

pub mod build;
pub mod command;
pub mod process;

pub use build::*;
pub use command::*;
pub use process::*;
