//! Command nodes that consume sparse checkouts

use crate::error::FetchError;
use crate::git::SparseCheckoutStep;
use crate::graph::{Action, StepRun};
use crate::operations::process::{invocation, run_phase};
use crate::system::{Invocation, System};
use crate::utils::path::absolutize;
use crate::utils::search_path::{SEARCH_PATH_SEPARATOR, resolve};
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

/// Runs a program, optionally inside the output path of a sparse checkout
///
/// The checkout's path is requested through
/// [`SparseCheckoutStep::output_path`] at execution time, so the command's
/// node must declare a dependency on that checkout.
#[derive(Debug)]
pub struct CommandStep {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<SparseCheckoutStep>,
}

impl CommandStep {
    #[must_use]
    #[inline]
    pub const fn new(program: PathBuf, args: Vec<String>, cwd: Option<SparseCheckoutStep>) -> Self {
        Self { program, args, cwd }
    }

    fn invocation(&self, run: &StepRun<'_>) -> Invocation {
        let cwd = match &self.cwd {
            Some(checkout) => checkout.output_path(run.graph, run.node),
            None => run.context.build_root(),
        };
        invocation(run.context, &self.program, self.args.iter().cloned(), cwd)
    }
}

impl Action for CommandStep {
    fn make(&self, run: &StepRun<'_>) -> Result<()> {
        let invocation = self.invocation(run);
        if self.cwd.is_none() {
            run.system
                .create_dir_all(&invocation.cwd)
                .with_context(|| format!("Failed to create directory: {}", invocation.cwd.display()))?;
        }

        run_phase(run.system, run.graph.node(run.node).name(), &invocation)?;
        Ok(())
    }

    fn plan(&self, run: &StepRun<'_>) -> Result<Vec<Invocation>> {
        Ok(vec![self.invocation(run)])
    }
}

/// Resolve a command's program to an absolute path
///
/// Bare names are looked up through the search path of `env_path`; names
/// containing a path separator are taken relative to the current directory.
///
/// # Errors
///
/// Returns an error if the program is empty or cannot be found
#[inline]
pub fn resolve_program(
    system: &dyn System,
    env_path: Option<&str>,
    program: &str,
) -> Result<PathBuf, FetchError> {
    if program.trim().is_empty() {
        return Err(FetchError::configuration("Command program cannot be empty"));
    }

    let path = Path::new(program);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    if path.components().count() > 1 {
        let current_dir = system
            .current_dir()
            .map_err(|e| FetchError::filesystem(format!("Cannot get current directory: {e}")))?;
        return Ok(absolutize(path, &current_dir));
    }

    resolve(system, env_path, SEARCH_PATH_SEPARATOR, program)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::git::{SparseCheckout, SparseCheckoutOptions};
    use crate::graph::{BuildContext, BuildGraph};
    use crate::system::MockSystem;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn context() -> BuildContext {
        BuildContext::new(
            PathBuf::from("/tmp/b"),
            BTreeMap::from([("PATH".to_owned(), "/usr/bin".to_owned())]),
        )
    }

    #[test]
    fn test_resolve_program() {
        let system = MockSystem::new()
            .with_current_dir("/work")
            .unwrap()
            .with_file("/usr/bin/make", b"")
            .unwrap();

        assert_eq!(
            resolve_program(&system, Some("/usr/bin"), "make").unwrap(),
            PathBuf::from("/usr/bin/make")
        );
        assert_eq!(
            resolve_program(&system, Some("/usr/bin"), "/opt/tool").unwrap(),
            PathBuf::from("/opt/tool")
        );
        assert_eq!(
            resolve_program(&system, Some("/usr/bin"), "scripts/gen.sh").unwrap(),
            PathBuf::from("/work/scripts/gen.sh")
        );
        assert!(resolve_program(&system, Some("/usr/bin"), "missing").is_err());
        assert!(resolve_program(&system, Some("/usr/bin"), " ").is_err());
    }

    #[test]
    fn test_command_runs_inside_checkout() {
        let system = MockSystem::new().with_file("/usr/bin/git", b"").unwrap();
        let mut graph = BuildGraph::new();
        let checkout = SparseCheckout::create(
            &mut graph,
            &context(),
            &system,
            "repo",
            SparseCheckoutOptions::new("https://example.com/repo.git", vec!["src".to_owned()]),
        )
        .unwrap();
        let checkout_node = checkout.node();
        let command = graph.add_node(
            "list",
            Arc::new(CommandStep::new(
                PathBuf::from("/bin/ls"),
                vec!["src".to_owned()],
                Some(checkout),
            )),
        );
        graph.depend_on(command, checkout_node).unwrap();

        graph.make(&context(), &system).unwrap();

        let recorded = system.invocations();
        assert_eq!(recorded.len(), 5);
        let last = &recorded[4];
        assert_eq!(last.argv(), vec!["/bin/ls", "src"]);
        assert_eq!(last.cwd, PathBuf::from("/tmp/b/dep/repo"));
    }

    #[test]
    fn test_command_without_checkout_runs_in_build_root() {
        let system = MockSystem::new();
        let mut graph = BuildGraph::new();
        graph.add_node(
            "hello",
            Arc::new(CommandStep::new(PathBuf::from("/bin/echo"), vec![], None)),
        );

        graph.make(&context(), &system).unwrap();

        assert_eq!(system.invocations()[0].cwd, PathBuf::from("/tmp/b"));
        assert!(system.exists(Path::new("/tmp/b")));
    }
}
