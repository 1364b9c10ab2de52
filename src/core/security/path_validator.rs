use std::io;
use std::path::{Component, Path, PathBuf};

/// Errors that can occur while resolving a download target.
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Invalid file name '{name}': {reason}")]
    InvalidFileName { name: String, reason: &'static str },

    #[error("Path '{path}' is outside allowed root directory '{root}'")]
    OutsideRootDirectory { path: PathBuf, root: PathBuf },

    #[error("Symlink '{path}' points outside allowed root directory")]
    SymlinkOutsideRoot { path: PathBuf },

    #[error("Cannot canonicalize path '{path}': {error}")]
    CannotCanonicalize { path: PathBuf, error: io::Error },
}

/// Resolves a caller-supplied file name to a path directly inside `root`.
///
/// This function performs the following checks:
/// 1. The name is a single normal path component (no separators, `.`, `..`
///    or absolute prefixes)
/// 2. The root is canonicalized and the joined path stays inside it
/// 3. An existing symlink at the target must point inside the root
///
/// The root must already exist.
pub fn resolve_within_root(root: &Path, file_name: &str) -> Result<PathBuf, PathSecurityError> {
    let trimmed = file_name.trim();
    if trimmed.is_empty() {
        return Err(PathSecurityError::InvalidFileName {
            name: file_name.to_string(),
            reason: "name is empty",
        });
    }

    let mut components = Path::new(trimmed).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => {}
        _ => {
            return Err(PathSecurityError::InvalidFileName {
                name: file_name.to_string(),
                reason: "must be a bare file name without directories",
            });
        }
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(PathSecurityError::InvalidFileName {
            name: file_name.to_string(),
            reason: "must not contain path separators",
        });
    }

    let canonical_root = root
        .canonicalize()
        .map_err(|e| PathSecurityError::CannotCanonicalize {
            path: root.to_path_buf(),
            error: e,
        })?;

    let candidate = canonical_root.join(trimmed);

    if candidate.is_symlink() {
        let target = candidate
            .canonicalize()
            .map_err(|_| PathSecurityError::SymlinkOutsideRoot {
                path: candidate.clone(),
            })?;
        if !is_within_root(&target, &canonical_root) {
            return Err(PathSecurityError::SymlinkOutsideRoot { path: candidate });
        }
    }

    if !is_within_root(&candidate, &canonical_root) {
        return Err(PathSecurityError::OutsideRootDirectory {
            path: candidate,
            root: canonical_root,
        });
    }

    Ok(candidate)
}

/// Checks if a path is within (or equal to) a root directory
fn is_within_root(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_plain_name_resolves_inside_root() {
        let temp_dir = TempDir::new().unwrap();
        let result = resolve_within_root(temp_dir.path(), "song.jpg").unwrap();

        assert_eq!(
            result,
            temp_dir.path().canonicalize().unwrap().join("song.jpg")
        );
    }

    #[test]
    fn test_parent_traversal_blocked() {
        let temp_dir = TempDir::new().unwrap();
        let result = resolve_within_root(temp_dir.path(), "../escape.jpg");

        assert!(matches!(
            result,
            Err(PathSecurityError::InvalidFileName { .. })
        ));
    }

    #[test]
    fn test_nested_path_blocked() {
        let temp_dir = TempDir::new().unwrap();
        let result = resolve_within_root(temp_dir.path(), "sub/song.jpg");

        assert!(result.is_err());
    }

    #[test]
    fn test_absolute_path_blocked() {
        let temp_dir = TempDir::new().unwrap();
        let result = resolve_within_root(temp_dir.path(), "/etc/passwd");

        assert!(matches!(
            result,
            Err(PathSecurityError::InvalidFileName { .. })
        ));
    }

    #[test]
    fn test_empty_name_blocked() {
        let temp_dir = TempDir::new().unwrap();
        assert!(resolve_within_root(temp_dir.path(), "   ").is_err());
    }

    #[test]
    fn test_missing_root_reported() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        let result = resolve_within_root(&missing, "a.jpg");

        assert!(matches!(
            result,
            Err(PathSecurityError::CannotCanonicalize { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_outside_root_blocked() {
        use std::os::unix::fs::symlink;

        let root_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();

        let target_file = outside_dir.path().join("target.jpg");
        let link_file = root_dir.path().join("link.jpg");

        fs::write(&target_file, "test").unwrap();
        symlink(&target_file, &link_file).unwrap();

        let result = resolve_within_root(root_dir.path(), "link.jpg");

        assert!(matches!(
            result,
            Err(PathSecurityError::SymlinkOutsideRoot { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_within_root_allowed() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let target_file = temp_dir.path().join("target.jpg");
        let link_file = temp_dir.path().join("link.jpg");

        fs::write(&target_file, "test").unwrap();
        symlink(&target_file, &link_file).unwrap();

        assert!(resolve_within_root(temp_dir.path(), "link.jpg").is_ok());
    }
}
