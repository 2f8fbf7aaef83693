//! Path manipulation utilities

use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` components
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

/// Make `path` absolute by joining it onto `base` when it is relative
///
/// The result is normalized; `base` is expected to be absolute already.
#[must_use]
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("./a/../b/./c")),
            PathBuf::from("b/c")
        );
        assert_eq!(normalize_path(Path::new("../a/b")), PathBuf::from("../a/b"));
        assert_eq!(normalize_path(Path::new("a/b/../..")), PathBuf::from(""));
    }

    #[cfg(unix)]
    #[test]
    fn test_normalize_path_does_not_escape_root() {
        assert_eq!(normalize_path(Path::new("/../tmp")), PathBuf::from("/tmp"));
        assert_eq!(
            normalize_path(Path::new("/tmp/b/./dep/../dep/repo")),
            PathBuf::from("/tmp/b/dep/repo")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_absolutize() {
        let base = Path::new("/tmp/b");
        assert_eq!(
            absolutize(Path::new("vendor/repo"), base),
            PathBuf::from("/tmp/b/vendor/repo")
        );
        assert_eq!(
            absolutize(Path::new("../other"), base),
            PathBuf::from("/tmp/other")
        );
        assert_eq!(
            absolutize(Path::new("/opt/repo"), base),
            PathBuf::from("/opt/repo")
        );
    }
}
