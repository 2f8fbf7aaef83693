//! Git sparse checkout build step
//!
//! A [`SparseCheckout`] materializes a handful of directories of a remote
//! repository under the build root:
//!
//! ```text
//! git clone -n --depth=1 --filter=tree:0 <url> <destination> [-b <branch>]
//! git sparse-checkout set --no-cone <dir>...
//! git pull origin <branch or main>
//! git checkout
//! ```
//!
//! An existing destination directory means the checkout already happened
//! and nothing is run. Its contents are not compared with the requested
//! URL, branch or directories; delete the directory to fetch again.

use crate::error::FetchError;
use crate::git::RepositoryUrl;
use crate::graph::{Action, BuildContext, BuildGraph, NodeId, StepRun, is_reachable};
use crate::operations::process::{invocation, run_phase};
use crate::system::{Invocation, System};
use crate::utils::path::absolutize;
use crate::utils::search_path::{
    DEFAULT_EXECUTABLE, SEARCH_PATH_SEPARATOR, SEARCH_PATH_VARIABLE, resolve,
};
use anyhow::{Context as _, Result};
use core::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Ref pulled when no branch is configured
pub const DEFAULT_BRANCH: &str = "main";

/// Directory under the build root that holds derived checkout destinations
pub const DEPENDENCY_DIR: &str = "dep";

/// User-facing options of a sparse checkout step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseCheckoutOptions {
    /// Remote repository, passed verbatim to `git clone`
    pub url: String,
    /// Sparse-checkout patterns, in order
    pub directories: Vec<String>,
    /// Branch to clone and pull; `main` is pulled when absent
    pub branch: Option<String>,
    /// Git executable to use instead of searching `PATH`
    pub executable: Option<PathBuf>,
    /// Checkout location instead of `<build root>/dep/<url stem>`
    pub destination: Option<PathBuf>,
}

impl SparseCheckoutOptions {
    #[must_use]
    #[inline]
    pub fn new<S: Into<String>>(url: S, directories: Vec<String>) -> Self {
        Self {
            url: url.into(),
            directories,
            ..Self::default()
        }
    }

    #[must_use]
    #[inline]
    pub fn with_branch<S: Into<String>>(mut self, branch: S) -> Self {
        self.branch = Some(branch.into());
        self
    }

    #[must_use]
    #[inline]
    pub fn with_executable<P: Into<PathBuf>>(mut self, executable: P) -> Self {
        self.executable = Some(executable.into());
        self
    }

    #[must_use]
    #[inline]
    pub fn with_destination<P: Into<PathBuf>>(mut self, destination: P) -> Self {
        self.destination = Some(destination.into());
        self
    }
}

/// The four external commands of a fetch, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Clone,
    SetFilter,
    Pull,
    Checkout,
}

impl Phase {
    pub const ALL: [Self; 4] = [Self::Clone, Self::SetFilter, Self::Pull, Self::Checkout];

    #[must_use]
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clone => "clone",
            Self::SetFilter => "sparse-checkout",
            Self::Pull => "pull",
            Self::Checkout => "checkout",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A sparse checkout with its executable and destination already resolved
#[derive(Debug)]
#[non_exhaustive]
pub struct SparseCheckout {
    url: RepositoryUrl,
    directories: Vec<String>,
    branch: Option<String>,
    executable: PathBuf,
    destination: PathBuf,
}

impl SparseCheckout {
    /// Register a sparse checkout step named `name` in `graph`
    ///
    /// The executable and destination are resolved here, once; later
    /// changes to the environment do not affect the step.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The URL or the directory list is empty
    /// - A directory or the branch is empty
    /// - The search path is unset or contains no Git executable
    /// - No destination name can be derived from the URL
    #[inline]
    pub fn create(
        graph: &mut BuildGraph,
        context: &BuildContext,
        system: &dyn System,
        name: &str,
        options: SparseCheckoutOptions,
    ) -> Result<SparseCheckoutStep> {
        let checkout = Arc::new(Self::resolve(context, system, options)?);
        let node = graph.add_node(name, Arc::clone(&checkout) as Arc<dyn Action>);
        debug!(
            "Registered sparse checkout '{name}' ({node}) -> {}",
            checkout.destination.display()
        );

        Ok(SparseCheckoutStep { node, checkout })
    }

    /// Validate options and resolve the executable and destination
    ///
    /// # Errors
    ///
    /// See [`SparseCheckout::create`]
    #[inline]
    pub fn resolve(
        context: &BuildContext,
        system: &dyn System,
        options: SparseCheckoutOptions,
    ) -> Result<Self> {
        let url = RepositoryUrl::new(&options.url)?;

        if options.directories.is_empty() {
            return Err(FetchError::configuration(format!(
                "Sparse checkout of '{}' needs at least one directory",
                url.as_str()
            ))
            .into());
        }
        if options.directories.iter().any(|dir| dir.trim().is_empty()) {
            return Err(FetchError::configuration(format!(
                "Sparse checkout of '{}' lists an empty directory",
                url.as_str()
            ))
            .into());
        }
        if options.branch.as_deref().is_some_and(|b| b.trim().is_empty()) {
            return Err(FetchError::configuration(format!(
                "Branch of '{}' cannot be empty",
                url.as_str()
            ))
            .into());
        }

        let executable = match options.executable {
            Some(executable) if executable.is_absolute() => executable,
            Some(executable) => {
                let current_dir = system.current_dir().map_err(|e| {
                    FetchError::filesystem(format!("Cannot get current directory: {e}"))
                })?;
                absolutize(&executable, &current_dir)
            }
            None => resolve(
                system,
                context.env_var(SEARCH_PATH_VARIABLE),
                SEARCH_PATH_SEPARATOR,
                DEFAULT_EXECUTABLE,
            )?,
        };

        let destination = match options.destination {
            Some(destination) => absolutize(&destination, context.build_root()),
            None => context
                .build_root()
                .join(DEPENDENCY_DIR)
                .join(url.stem()?),
        };
        if !destination.is_absolute() {
            return Err(FetchError::configuration(format!(
                "Destination of '{}' must be absolute, got {} (build root {} is relative)",
                url.as_str(),
                destination.display(),
                context.build_root().display()
            ))
            .into());
        }
        if destination.to_str().is_none() {
            return Err(FetchError::configuration(format!(
                "Destination path is not valid UTF-8: {}",
                destination.display()
            ))
            .into());
        }

        Ok(Self {
            url,
            directories: options.directories,
            branch: options.branch,
            executable,
            destination,
        })
    }

    #[must_use]
    #[inline]
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    #[must_use]
    #[inline]
    pub fn directories(&self) -> &[String] {
        &self.directories
    }

    #[must_use]
    #[inline]
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    #[must_use]
    #[inline]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Absolute checkout location
    #[must_use]
    #[inline]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Arguments passed to Git for `phase`
    #[must_use]
    #[inline]
    pub fn arguments(&self, phase: Phase) -> Vec<String> {
        match phase {
            Phase::Clone => {
                let mut args: Vec<String> = ["clone", "-n", "--depth=1", "--filter=tree:0"]
                    .into_iter()
                    .map(str::to_owned)
                    .collect();
                args.push(self.url.as_str().to_owned());
                args.push(self.destination.to_string_lossy().into_owned());
                if let Some(branch) = &self.branch {
                    args.push("-b".to_owned());
                    args.push(branch.clone());
                }
                args
            }
            Phase::SetFilter => ["sparse-checkout", "set", "--no-cone"]
                .into_iter()
                .map(str::to_owned)
                .chain(self.directories.iter().cloned())
                .collect(),
            Phase::Pull => vec![
                "pull".to_owned(),
                "origin".to_owned(),
                self.branch().unwrap_or(DEFAULT_BRANCH).to_owned(),
            ],
            Phase::Checkout => vec!["checkout".to_owned()],
        }
    }

    /// Directory `phase` runs in
    ///
    /// The clone runs next to the destination; everything else inside it.
    #[must_use]
    #[inline]
    pub fn working_dir(&self, phase: Phase) -> &Path {
        match phase {
            Phase::Clone => self.destination.parent().unwrap_or(&self.destination),
            Phase::SetFilter | Phase::Pull | Phase::Checkout => &self.destination,
        }
    }

    /// The four invocations a fetch would run
    #[must_use]
    #[inline]
    pub fn invocations(&self, context: &BuildContext) -> Vec<Invocation> {
        Phase::ALL
            .into_iter()
            .map(|phase| {
                invocation(
                    context,
                    &self.executable,
                    self.arguments(phase),
                    self.working_dir(phase),
                )
            })
            .collect()
    }

    /// Fetch the checkout unless its destination already exists
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The destination's parent directory cannot be created
    /// - Any Git phase fails; later phases are not run and the partial
    ///   checkout is left on disk
    #[inline]
    pub fn run(&self, context: &BuildContext, system: &dyn System) -> Result<()> {
        if system.exists(&self.destination) {
            info!(
                "{} already exists, skipping fetch of {}",
                self.destination.display(),
                self.url.as_str()
            );
            return Ok(());
        }

        info!(
            "Fetching {} ({}) into {}",
            self.url.as_str(),
            self.directories.join(", "),
            self.destination.display()
        );

        let parent = self.working_dir(Phase::Clone);
        system.create_dir_all(parent).with_context(|| {
            format!("Failed to create directory: {}", parent.display())
        })?;

        for (phase, invocation) in Phase::ALL.into_iter().zip(self.invocations(context)) {
            run_phase(system, phase.name(), &invocation)?;
        }

        info!("Checked out {}", self.destination.display());
        Ok(())
    }
}

impl Action for SparseCheckout {
    fn make(&self, run: &StepRun<'_>) -> Result<()> {
        self.run(run.context, run.system)
    }

    fn plan(&self, run: &StepRun<'_>) -> Result<Vec<Invocation>> {
        if run.system.exists(&self.destination) {
            return Ok(Vec::new());
        }
        Ok(self.invocations(run.context))
    }
}

/// Handle of a sparse checkout registered in a [`BuildGraph`]
#[derive(Debug, Clone)]
pub struct SparseCheckoutStep {
    node: NodeId,
    checkout: Arc<SparseCheckout>,
}

impl SparseCheckoutStep {
    #[must_use]
    #[inline]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    #[inline]
    pub fn checkout(&self) -> &SparseCheckout {
        &self.checkout
    }

    /// Execute the step outside of a full graph run
    ///
    /// # Errors
    ///
    /// See [`SparseCheckout::run`]
    #[inline]
    pub fn run(&self, context: &BuildContext, system: &dyn System) -> Result<()> {
        self.checkout.run(context, system)
    }

    /// Checkout location, for a node that declared a dependency on this step
    ///
    /// # Panics
    ///
    /// Panics if `requesting` does not depend on this step, directly or
    /// transitively, or if a dependency cycle is found while checking.
    /// Either case is a mistake in the build description: without the edge
    /// the step may not have run by the time the path is used.
    #[must_use]
    #[inline]
    pub fn output_path(&self, graph: &BuildGraph, requesting: NodeId) -> &Path {
        let step = graph.node(self.node).name();
        match is_reachable(graph, requesting, self.node) {
            Ok(true) => &self.checkout.destination,
            Ok(false) => panic!(
                "build step '{}' requested the output path of '{step}' without depending on it",
                graph.node(requesting).name()
            ),
            Err(err) => panic!("cannot hand out the output path of '{step}': {err}"),
        }
    }
}
