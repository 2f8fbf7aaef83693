//! Executable lookup through a search-path value
//!
//! The lookup is done by hand rather than by the operating system so that
//! it behaves the same everywhere: the caller decides which variable, which
//! separator and which exact file name to look for.

use crate::error::FetchError;
use crate::system::System;
use crate::utils::path::absolutize;
use std::path::PathBuf;
use tracing::debug;

/// Name of the environment variable holding the executable search path
pub const SEARCH_PATH_VARIABLE: &str = "PATH";

/// Separator between search-path segments on the building machine
pub const SEARCH_PATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// File name of the Git executable on the building machine
pub const DEFAULT_EXECUTABLE: &str = if cfg!(windows) { "git.exe" } else { "git" };

/// Find `executable` in the first search-path segment that contains it
///
/// `search_path` is the raw value of the search-path variable, `None` when
/// the variable is not set. Empty segments are skipped and no platform
/// suffix is ever appended to `executable`. Relative segments are resolved
/// against the current directory so the returned path is always absolute.
///
/// # Errors
///
/// Returns an error if:
/// - `search_path` is `None` (`FetchError::NoSearchPath`)
/// - No segment contains a file named `executable` (`FetchError::ExecutableNotFound`)
/// - A relative segment is present and the current directory is unavailable
#[inline]
pub fn resolve(
    system: &dyn System,
    search_path: Option<&str>,
    separator: char,
    executable: &str,
) -> Result<PathBuf, FetchError> {
    let Some(search_path) = search_path else {
        return Err(FetchError::NoSearchPath {
            variable: SEARCH_PATH_VARIABLE.to_owned(),
        });
    };

    for segment in search_path.split(separator).filter(|s| !s.is_empty()) {
        let mut candidate = PathBuf::from(segment).join(executable);
        if candidate.is_relative() {
            let base = system.current_dir().map_err(|e| {
                FetchError::filesystem(format!("Cannot get current directory: {e}"))
            })?;
            candidate = absolutize(&candidate, &base);
        }

        if system.is_file(&candidate) {
            debug!("Resolved {executable} to {}", candidate.display());
            return Ok(candidate);
        }
    }

    Err(FetchError::ExecutableNotFound {
        executable: executable.to_owned(),
        variable: SEARCH_PATH_VARIABLE.to_owned(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::system::MockSystem;
    use std::path::Path;

    fn system_with(files: &[&str]) -> MockSystem {
        files.iter().fold(MockSystem::new(), |system, file| {
            system.with_file(file, b"").unwrap()
        })
    }

    #[test]
    fn test_first_match_in_segment_order_wins() {
        let system = system_with(&["/opt/bin/git", "/usr/bin/git"]);
        let found = resolve(&system, Some("/usr/bin:/opt/bin"), ':', "git").unwrap();
        assert_eq!(found, PathBuf::from("/usr/bin/git"));

        let found = resolve(&system, Some("/opt/bin:/usr/bin"), ':', "git").unwrap();
        assert_eq!(found, PathBuf::from("/opt/bin/git"));
    }

    #[test]
    fn test_empty_and_duplicate_segments_are_harmless() {
        let system = system_with(&["/usr/bin/git"]);
        let found = resolve(&system, Some("::/bin::/bin:/usr/bin:"), ':', "git").unwrap();
        assert_eq!(found, PathBuf::from("/usr/bin/git"));
    }

    #[test]
    fn test_not_found() {
        let system = system_with(&["/usr/bin/hg"]);
        let err = resolve(&system, Some("/usr/bin:/bin"), ':', "git").unwrap_err();
        assert!(matches!(err, FetchError::ExecutableNotFound { .. }));
    }

    #[test]
    fn test_empty_search_path_is_not_found() {
        let system = system_with(&["/usr/bin/git"]);
        let err = resolve(&system, Some(""), ':', "git").unwrap_err();
        assert!(matches!(err, FetchError::ExecutableNotFound { .. }));
    }

    #[test]
    fn test_missing_variable() {
        let system = system_with(&["/usr/bin/git"]);
        let err = resolve(&system, None, ':', "git").unwrap_err();
        assert!(matches!(err, FetchError::NoSearchPath { .. }));
    }

    #[test]
    fn test_directories_do_not_match() {
        let system = MockSystem::new()
            .with_dir("/first/git")
            .unwrap()
            .with_file("/second/git", b"")
            .unwrap();
        let found = resolve(&system, Some("/first:/second"), ':', "git").unwrap();
        assert_eq!(found, PathBuf::from("/second/git"));
    }

    #[test]
    fn test_no_suffix_is_appended() {
        let system = system_with(&["/tools/git.exe"]);
        assert!(resolve(&system, Some("/tools"), ':', "git").is_err());
        assert_eq!(
            resolve(&system, Some("/tools"), ':', "git.exe").unwrap(),
            PathBuf::from("/tools/git.exe")
        );
    }

    #[test]
    fn test_custom_separator() {
        let system = system_with(&["/b/git"]);
        let found = resolve(&system, Some("/a;/b"), ';', "git").unwrap();
        assert_eq!(found, Path::new("/b/git"));
    }

    #[test]
    fn test_relative_segment_resolves_against_current_dir() {
        let system = MockSystem::new()
            .with_current_dir("/work")
            .unwrap()
            .with_file("/work/tools/git", b"")
            .unwrap();
        let found = resolve(&system, Some("tools"), ':', "git").unwrap();
        assert_eq!(found, PathBuf::from("/work/tools/git"));
    }
}
