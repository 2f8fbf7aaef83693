//! External process execution with fatal-on-failure semantics

use crate::error::FetchError;
use crate::graph::BuildContext;
use crate::system::{Invocation, System};
use std::path::Path;
use tracing::debug;

/// Describe a process that runs with the build's captured environment
#[must_use]
#[inline]
pub fn invocation<I, S>(context: &BuildContext, program: &Path, args: I, cwd: &Path) -> Invocation
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Invocation {
        program: program.to_path_buf(),
        args: args.into_iter().map(Into::into).collect(),
        cwd: cwd.to_path_buf(),
        env: context.env().clone(),
    }
}

/// Run one phase of a build step and block until the process exits
///
/// Anything other than a zero exit code is an error naming `phase` and the
/// observed exit condition. Nothing is retried and nothing the process left
/// on disk is cleaned up. The failure is returned, not logged; the caller
/// reporting it decides how.
///
/// # Errors
///
/// Returns an error if:
/// - The process cannot be spawned
/// - The process exits with a nonzero code
/// - The process is terminated by a signal
#[inline]
pub fn run_phase(
    system: &dyn System,
    phase: &str,
    invocation: &Invocation,
) -> Result<(), FetchError> {
    debug!(
        "{phase}: {} (in {})",
        invocation.argv().join(" "),
        invocation.cwd.display()
    );

    let exit = system.run_process(invocation).map_err(|e| {
        FetchError::process(
            phase,
            format!("cannot spawn '{}': {e}", invocation.program.display()),
        )
    })?;

    if !exit.success() {
        return Err(FetchError::process(
            phase,
            format!("'{}' {exit}", invocation.argv().join(" ")),
        ));
    }

    debug!("{phase}: done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{MockSystem, ProcessExit};
    use std::collections::BTreeMap;
    use std::io;
    use std::path::PathBuf;

    fn context() -> BuildContext {
        BuildContext::new(
            PathBuf::from("/tmp/b"),
            BTreeMap::from([("PATH".to_owned(), "/usr/bin".to_owned())]),
        )
    }

    #[test]
    fn test_invocation_carries_context_environment() {
        let inv = invocation(
            &context(),
            Path::new("/usr/bin/git"),
            ["checkout"],
            Path::new("/tmp/b/dep/repo"),
        );
        assert_eq!(inv.argv(), vec!["/usr/bin/git", "checkout"]);
        assert_eq!(inv.cwd, PathBuf::from("/tmp/b/dep/repo"));
        assert_eq!(inv.env.get("PATH").map(String::as_str), Some("/usr/bin"));
    }

    #[test]
    fn test_success() {
        let system = MockSystem::new();
        let inv = invocation(&context(), Path::new("/usr/bin/git"), ["checkout"], Path::new("/"));
        run_phase(&system, "checkout", &inv).unwrap();
        assert_eq!(system.invocations(), vec![inv]);
    }

    #[test]
    fn test_nonzero_exit_is_fatal() {
        let system = MockSystem::new()
            .with_process_handler(|_| Ok(ProcessExit::Exited(128)))
            .unwrap();
        let inv = invocation(&context(), Path::new("/usr/bin/git"), ["pull"], Path::new("/"));

        let err = run_phase(&system, "pull", &inv).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        let message = err.to_string();
        assert!(message.contains("pull failed"));
        assert!(message.contains("exited with code 128"));
    }

    #[test]
    fn test_signal_is_fatal() {
        let system = MockSystem::new()
            .with_process_handler(|_| Ok(ProcessExit::Signaled(Some(9))))
            .unwrap();
        let inv = invocation(&context(), Path::new("/usr/bin/git"), ["clone"], Path::new("/"));

        let err = run_phase(&system, "clone", &inv).unwrap_err();
        assert!(err.to_string().contains("terminated by signal 9"));
    }

    #[test]
    fn test_spawn_failure_is_fatal() {
        let system = MockSystem::new()
            .with_process_handler(|_| Err(io::Error::new(io::ErrorKind::NotFound, "no such file")))
            .unwrap();
        let inv = invocation(&context(), Path::new("/nope/git"), ["clone"], Path::new("/"));

        let err = run_phase(&system, "clone", &inv).unwrap_err();
        assert!(matches!(err, FetchError::Process { .. }));
        assert!(err.to_string().contains("cannot spawn"));
    }
}
