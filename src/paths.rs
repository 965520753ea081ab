//! Template path resolution: joining, lexical normalization and root-mode checks.
//! Nothing here touches the filesystem.
use std::path::{Component, Path, PathBuf};

use crate::errors::{Error, Result};

/// Removes `.` and resolves `..` without touching the filesystem.
/// A `..` that can't be resolved is kept for relative paths and dropped at the root of absolute ones.
pub fn normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => (),
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => (),
                _ => components.push(component),
            },
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

fn check_root(resolved: &Path, root: Option<&Path>, requested: &str) -> Result<()> {
    let root = match root {
        Some(root) => normalize(root),
        None => return Ok(()),
    };

    match resolved.strip_prefix(&root) {
        Ok(rest) if !rest.components().any(|c| c == Component::ParentDir) => Ok(()),
        _ => Err(Error::path_traversal(requested)),
    }
}

/// Resolves the path given to `Engine::render`: relative to the root in root mode,
/// as-is otherwise.
pub fn resolve_entry(path: &str, root: Option<&Path>) -> Result<PathBuf> {
    let candidate = match root {
        Some(root) if !Path::new(path).is_absolute() => root.join(path),
        _ => PathBuf::from(path),
    };
    let resolved = normalize(&candidate);
    check_root(&resolved, root, path)?;
    Ok(resolved)
}

/// Resolves an `#include` path.
///
/// `./` and `../` paths are relative to the directory of the including template.
/// Anything else, including paths starting with `/`, is relative to `base_path`.
pub fn resolve_include(
    path: &str,
    including_dir: &Path,
    base_path: &Path,
    root: Option<&Path>,
) -> Result<PathBuf> {
    let candidate = if path.starts_with("./") || path.starts_with("../") {
        including_dir.join(path)
    } else {
        base_path.join(path.trim_start_matches('/'))
    };
    let resolved = normalize(&candidate);
    check_root(&resolved, root, path)?;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn normalize_paths() {
        let tests = vec![
            ("a/b/../c", "a/c"),
            ("./a/./b", "a/b"),
            ("a/..", ""),
            ("../a", "../a"),
            ("a/../../b", "../b"),
            ("/a/../../b", "/b"),
            ("/srv/site/./pages/../index.html", "/srv/site/index.html"),
        ];
        for (input, expected) in tests {
            assert_eq!(normalize(Path::new(input)), PathBuf::from(expected), "{}", input);
        }
    }

    #[test]
    fn entry_without_root_is_kept() {
        assert_eq!(resolve_entry("pages/../index.html", None).unwrap(), PathBuf::from("index.html"));
    }

    #[test]
    fn entry_in_root_mode_is_joined_to_the_root() {
        let root = Path::new("/srv/site");
        assert_eq!(resolve_entry("index.html", Some(root)).unwrap(), PathBuf::from("/srv/site/index.html"));
        assert_eq!(
            resolve_entry("/srv/site/a.html", Some(root)).unwrap(),
            PathBuf::from("/srv/site/a.html")
        );
    }

    #[test]
    fn entry_escaping_the_root_is_rejected() {
        let err = resolve_entry("../secret.html", Some(Path::new("/srv/site"))).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::PathTraversal(ref p) if p == "../secret.html"));
        assert!(resolve_entry("/etc/passwd", Some(Path::new("/srv/site"))).is_err());
    }

    #[test]
    fn relative_root_rejects_escapes() {
        assert!(resolve_entry("a.html", Some(Path::new("."))).is_ok());
        assert!(resolve_entry("../a.html", Some(Path::new("."))).is_err());
        assert!(resolve_entry("x/../../a.html", Some(Path::new("templates"))).is_err());
    }

    #[test]
    fn include_relative_to_including_file() {
        let base = Path::new("/srv/site");
        let dir = Path::new("/srv/site/pages/blog");
        let tests = vec![
            ("./card.html", "/srv/site/pages/blog/card.html"),
            ("../shared/nav.html", "/srv/site/pages/shared/nav.html"),
            ("partials/footer.html", "/srv/site/partials/footer.html"),
            ("/partials/footer.html", "/srv/site/partials/footer.html"),
        ];
        for (input, expected) in tests {
            assert_eq!(resolve_include(input, dir, base, None).unwrap(), PathBuf::from(expected), "{}", input);
        }
    }

    #[test]
    fn include_escaping_the_root_is_rejected() {
        let root = Path::new("/srv/site");
        let dir = Path::new("/srv/site/pages");
        assert!(resolve_include("../index.html", dir, root, Some(root)).is_ok());
        let err = resolve_include("../../etc/passwd", dir, root, Some(root)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::PathTraversal(_)));
        assert!(resolve_include("/../outside.html", dir, root, Some(root)).is_err());
    }
}
