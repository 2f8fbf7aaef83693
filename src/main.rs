//! # `sparsedep`
//!
//! `sparsedep` fetches only the directories a build needs from remote Git
//! repositories, then runs the commands that consume them in dependency
//! order.
//!
//! ## Usage
//!
//! ```sh
//! sparsedep --config sparsedep.yaml
//! sparsedep --dry-run --build-root ./out
//! ```
//!
//! See `sparsedep --help` for all options.

use clap::Parser as _;
use sparsedep::cli::Args;
use sparsedep::error::FetchError;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // Logs go to stderr so dry-run previews stay clean on stdout
    fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    match sparsedep::run(&args) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!("{err:#}");
            std::process::exit(
                err.downcast_ref::<FetchError>()
                    .map_or(1, FetchError::exit_code),
            );
        }
    }
}
