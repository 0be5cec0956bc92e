//! Project context: file discovery and path resolution
//!
//! The analysis core only needs three things from the project around a file:
//! its root (for relative paths), extra include search directories, and a
//! way to join paths. [`ProjectContext`] captures that; [`Project`] is the
//! implementation built by walking the command-line inputs.

use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

/// Deepest directory level visited while scanning
const MAX_WALK_DEPTH: usize = 256;

pub trait ProjectContext: Sync {
    /// Directory that relative paths are reported against
    fn root(&self) -> &Path;

    /// Include search directories, searched after the including file's directory
    fn include_dirs(&self) -> &[PathBuf];

    /// Join `relative` onto `base` and normalize the result
    fn join(&self, base: &Path, relative: &Path) -> PathBuf {
        normalize(&base.join(relative))
    }

    /// Path of `path` relative to the root, or `path` itself outside the root
    fn relative_path(&self, path: &Path) -> PathBuf {
        let path = normalize(path);
        path.strip_prefix(normalize(self.root()))
            .map_or_else(|_| path.clone(), Path::to_path_buf)
    }
}

/// Lexically normalize a path, removing `.` and resolving `..` where possible
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal = matches!(result.components().next_back(), Some(Component::Normal(_)));
                if last_is_normal {
                    result.pop();
                } else if !result.has_root() {
                    result.push("..");
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}

/// Check if a path matches any exclusion pattern
///
/// Patterns are matched against the full path, the file name and each
/// path component.
#[must_use]
pub fn is_excluded(path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let path_str = path.to_string_lossy();
    patterns.iter().any(|pattern| {
        pattern.matches(&path_str)
            || path.components().any(|component| match component {
                Component::Normal(c) => pattern.matches(&c.to_string_lossy()),
                _ => false,
            })
    })
}

/// Check if a file has one of the given extensions (with or without leading dot)
#[must_use]
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|e| e.strip_prefix('.').unwrap_or(e) == ext)
        })
}

/// Files and directories found under the command-line inputs
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub root: PathBuf,
    /// Every directory visited; these double as include search directories
    pub directories: Vec<PathBuf>,
    /// Source files to analyze, in walk order
    pub files: Vec<PathBuf>,
    /// Files seen but not analyzed (wrong extension or excluded)
    pub skipped: Vec<PathBuf>,
}

impl Project {
    /// Walk the inputs and collect source files
    ///
    /// Explicit file inputs are always analyzed unless excluded. Directory
    /// inputs are walked recursively; excluded directories are not entered.
    #[must_use]
    pub fn scan(inputs: &[PathBuf], extensions: &[String], excludes: &[Pattern]) -> Self {
        let mut project = Project {
            root: common_root(inputs),
            ..Project::default()
        };

        for input in inputs {
            if input.is_file() {
                if is_excluded(input, excludes) {
                    project.skipped.push(input.clone());
                } else {
                    project.files.push(input.clone());
                }
                continue;
            }
            if !input.is_dir() {
                log::warn!("{}: no such file or directory", input.display());
                continue;
            }

            let walker = WalkDir::new(input)
                .follow_links(true)
                .max_depth(MAX_WALK_DEPTH)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| entry.depth() == 0 || !is_excluded(entry.path(), excludes));
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        log::warn!("skipping unreadable entry: {e}");
                        continue;
                    }
                };
                let path = entry.path();
                if entry.file_type().is_dir() {
                    project.directories.push(path.to_path_buf());
                } else if has_extension(path, extensions) {
                    project.files.push(path.to_path_buf());
                } else {
                    project.skipped.push(path.to_path_buf());
                }
            }
        }
        project
    }
}

impl ProjectContext for Project {
    fn root(&self) -> &Path {
        &self.root
    }

    fn include_dirs(&self) -> &[PathBuf] {
        &self.directories
    }
}

/// Deepest directory containing every input
fn common_root(inputs: &[PathBuf]) -> PathBuf {
    let dirs = inputs.iter().map(|input| {
        if input.is_dir() {
            normalize(input)
        } else {
            normalize(input.parent().unwrap_or(Path::new(".")))
        }
    });

    let mut root: Option<PathBuf> = None;
    for dir in dirs {
        root = Some(match root {
            None => dir,
            Some(current) => current
                .components()
                .zip(dir.components())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a.as_os_str())
                .collect(),
        });
    }
    match root {
        Some(root) if !root.as_os_str().is_empty() => root,
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
        assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn test_is_excluded() {
        let patterns = vec![Pattern::new("build").unwrap(), Pattern::new("*.inc").unwrap()];
        assert!(is_excluded(Path::new("src/build/a.f90"), &patterns));
        assert!(is_excluded(Path::new("src/defs.inc"), &patterns));
        assert!(!is_excluded(Path::new("src/a.f90"), &patterns));
        assert!(!is_excluded(Path::new("src/a.f90"), &[]));
    }

    #[test]
    fn test_has_extension() {
        let exts = vec!["f90".to_string(), ".F90".to_string()];
        assert!(has_extension(Path::new("a.f90"), &exts));
        assert!(has_extension(Path::new("a.F90"), &exts));
        assert!(!has_extension(Path::new("a.c"), &exts));
        assert!(!has_extension(Path::new("Makefile"), &exts));
    }

    #[test]
    fn test_scan_directory() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let build = dir.path().join("build");
        std::fs::create_dir(&src).unwrap();
        std::fs::create_dir(&build).unwrap();
        std::fs::write(src.join("a.f90"), "module a\nend module\n").unwrap();
        std::fs::write(src.join("notes.txt"), "").unwrap();
        std::fs::write(build.join("gen.f90"), "").unwrap();

        let project = Project::scan(
            &[dir.path().to_path_buf()],
            &["f90".to_string()],
            &[Pattern::new("build").unwrap()],
        );
        assert_eq!(project.files, vec![src.join("a.f90")]);
        assert_eq!(project.skipped, vec![src.join("notes.txt")]);
        assert!(project.directories.contains(&src));
        assert!(!project.directories.contains(&build));
        assert_eq!(project.root(), normalize(dir.path()));
    }

    #[test]
    fn test_relative_path() {
        let project = Project {
            root: PathBuf::from("/work/proj"),
            ..Project::default()
        };
        assert_eq!(
            project.relative_path(Path::new("/work/proj/src/a.f90")),
            PathBuf::from("src/a.f90")
        );
        assert_eq!(
            project.relative_path(Path::new("/elsewhere/b.f90")),
            PathBuf::from("/elsewhere/b.f90")
        );
        assert_eq!(
            project.join(Path::new("/work/proj/src"), Path::new("../inc/defs.inc")),
            PathBuf::from("/work/proj/inc/defs.inc")
        );
    }

    #[test]
    fn test_common_root() {
        assert_eq!(
            common_root(&[PathBuf::from("/x/a/f.f90"), PathBuf::from("/x/b/g.f90")]),
            PathBuf::from("/x")
        );
        assert_eq!(common_root(&[]), PathBuf::from("."));
    }
}
