use clap::Parser;

/// Command-line arguments for sparsedep
#[derive(Parser, Debug, Clone)]
#[command(name = "sparsedep")]
#[command(about = "Sparse-checkout Git dependencies and run the commands that consume them")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Build manifest path
    #[arg(long, value_name = "PATH", default_value = "./sparsedep.yaml")]
    pub config: String,

    /// Directory that receives checkouts and command output
    /// (overrides the manifest's buildRoot)
    #[arg(long, value_name = "DIR", env = "SPARSEDEP_BUILD_ROOT")]
    pub build_root: Option<String>,

    /// Print the processes the build would run without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}
