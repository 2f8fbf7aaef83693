//! Build operation coordination

use crate::cli::Args;
use crate::config::{DEFAULT_BUILD_ROOT, Manifest};
use crate::error::FetchError;
use crate::git::{SparseCheckout, SparseCheckoutStep};
use crate::graph::{BuildContext, BuildGraph};
use crate::operations::command::{CommandStep, resolve_program};
use crate::system::System;
use crate::utils::search_path::SEARCH_PATH_VARIABLE;
use anyhow::{Context as _, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// A manifest's build graph, ready to execute
pub struct BuildPlan {
    pub graph: BuildGraph,
    /// Checkout steps by name, in manifest order
    pub checkouts: Vec<(String, SparseCheckoutStep)>,
}

/// Coordinates loading a manifest and running its build graph
#[non_exhaustive]
pub struct BuildOperation<'src> {
    manifest: Manifest,
    context: BuildContext,
    dry_run: bool,
    system: &'src dyn System,
}

impl<'src> BuildOperation<'src> {
    /// Create a new build operation from CLI arguments
    ///
    /// The build root is taken from `--build-root`, then from the manifest,
    /// then defaults to `./build`; relative roots are anchored to the
    /// current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The manifest cannot be loaded or is invalid
    /// - The current directory cannot be determined
    #[inline]
    pub fn new(args: &Args, system: &'src dyn System) -> Result<Self> {
        let manifest = Manifest::load_from_file(system, &args.config)?;

        let build_root = args
            .build_root
            .clone()
            .or_else(|| manifest.build_root.clone())
            .unwrap_or_else(|| DEFAULT_BUILD_ROOT.to_owned());
        let context = BuildContext::from_system(system, Path::new(&build_root))?;

        Ok(Self {
            manifest,
            context,
            dry_run: args.dry_run,
            system,
        })
    }

    #[must_use]
    #[inline]
    pub const fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Register every manifest step and edge in a fresh build graph
    ///
    /// Executables and checkout destinations are resolved here.
    ///
    /// # Errors
    ///
    /// Returns an error if a checkout or command cannot be resolved
    #[inline]
    pub fn build_graph(&self) -> Result<BuildPlan> {
        let mut graph = BuildGraph::new();
        let mut checkouts = Vec::with_capacity(self.manifest.checkouts.len());
        let mut by_name: HashMap<&str, SparseCheckoutStep> = HashMap::new();
        let mut claimed: HashMap<PathBuf, &str> = HashMap::new();

        for checkout in &self.manifest.checkouts {
            let step = SparseCheckout::create(
                &mut graph,
                &self.context,
                self.system,
                &checkout.name,
                checkout.to_options(),
            )
            .with_context(|| format!("Checkout '{}'", checkout.name))?;

            let destination = step.checkout().destination().to_path_buf();
            if let Some(owner) = claimed.insert(destination, checkout.name.as_str()) {
                return Err(FetchError::configuration(format!(
                    "Checkouts '{owner}' and '{}' both use {}; set a distinct destination",
                    checkout.name,
                    step.checkout().destination().display()
                ))
                .into());
            }
            by_name.insert(checkout.name.as_str(), step.clone());
            checkouts.push((checkout.name.clone(), step));
        }

        let mut command_nodes = Vec::with_capacity(self.manifest.commands.len());
        for command in &self.manifest.commands {
            let program = resolve_program(
                self.system,
                self.context.env_var(SEARCH_PATH_VARIABLE),
                &command.program,
            )
            .with_context(|| format!("Command '{}'", command.name))?;
            let cwd = command
                .cwd
                .as_deref()
                .and_then(|name| by_name.get(name).cloned());
            let node = graph.add_node(
                command.name.as_str(),
                Arc::new(CommandStep::new(program, command.args.clone(), cwd)),
            );
            command_nodes.push((node, command));
        }

        for (node, command) in command_nodes {
            for dependency in &command.depends_on {
                let dependency_node = graph.find(dependency).with_context(|| {
                    format!(
                        "Command '{}' depends on unknown step '{dependency}'",
                        command.name
                    )
                })?;
                graph.depend_on(node, dependency_node)?;
            }
        }

        Ok(BuildPlan { graph, checkouts })
    }

    /// Execute the build, or print what it would run in dry-run mode
    ///
    /// # Errors
    ///
    /// Returns an error if the graph cannot be built, contains a cycle, or
    /// a step fails
    #[inline]
    pub fn execute(&self) -> Result<()> {
        let plan = self.build_graph()?;

        if self.dry_run {
            return self.preview(&plan);
        }

        info!(
            "Building {} step(s) in {}",
            plan.graph.len(),
            self.context.build_root().display()
        );
        plan.graph.make(&self.context, self.system)?;

        for (name, step) in &plan.checkouts {
            info!("{name}: {}", step.checkout().destination().display());
        }
        info!("Build complete");

        Ok(())
    }

    /// Print the processes the build would run, in execution order
    fn preview(&self, plan: &BuildPlan) -> Result<()> {
        let steps = plan.graph.plan(&self.context, self.system)?;

        println!(
            "Dry run preview: {} step(s), build root {}",
            steps.len(),
            self.context.build_root().display()
        );
        for (node, invocations) in steps {
            println!("[{}]", plan.graph.node(node).name());
            if invocations.is_empty() {
                println!("  (already materialized, nothing to run)");
            }
            for invocation in invocations {
                println!(
                    "  {} $ {}",
                    invocation.cwd.display(),
                    invocation.argv().join(" ")
                );
            }
        }

        Ok(())
    }
}
