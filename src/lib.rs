//! `sparsedep` - Fetch parts of Git repositories as steps of a build graph
//!
//! A build manifest declares sparse checkouts (a repository URL plus the
//! directories to materialize) and commands that consume them. Every step
//! becomes a node of a [`graph::BuildGraph`]; steps run dependencies first,
//! and a command may only use a checkout's location once it declared an
//! edge to that checkout.

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod graph;
pub mod operations;
pub mod system;
pub mod utils;

use anyhow::Result;
use cli::Args;
use operations::build::BuildOperation;
use system::RealSystem;

/// Main entry point for the sparsedep library
///
/// # Errors
///
/// Returns an error if the manifest is invalid, the graph has a cycle, or a
/// step fails
#[inline]
pub fn run(args: &Args) -> Result<()> {
    let system = RealSystem::new();
    let build_operation = BuildOperation::new(args, &system)?;
    build_operation.execute()
}
