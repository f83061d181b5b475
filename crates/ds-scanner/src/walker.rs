//! Directory resolution and traversal for TypeScript sources.
//!
//! [`normalize_paths`] validates the configured scan roots; [`FileWalker`]
//! then uses the `ignore` crate to walk each root while respecting
//! `.gitignore` patterns.
//!
//! # Features
//!
//! - Respects `.gitignore` and `.ignore` patterns
//! - Filters for TypeScript files (`.ts`, `.tsx`, `.mts`, `.cts`)
//! - Skips hidden, build, and dependency directories
//! - Converts paths to UTF-8 [`Utf8PathBuf`]

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use tracing::debug;

use crate::error::ScanError;

/// Directory names never descended into: installed packages and build output.
const SKIP_DIRECTORIES: &[&str] = &["node_modules", "dist", "build", "out", "coverage", ".git"];

/// TypeScript file extensions to include in the scan.
const TYPESCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];

/// Drops configured paths that are not existing directories.
///
/// Order is preserved. An empty input yields an empty output.
///
/// # Errors
///
/// Returns [`ScanError::DirectoryNotExist`] if `paths` is non-empty but
/// none of them is a directory.
///
/// # Examples
///
/// ```
/// use ds_scanner::normalize_paths;
/// use camino::Utf8PathBuf;
///
/// assert!(normalize_paths(&[]).unwrap().is_empty());
/// assert!(normalize_paths(&[Utf8PathBuf::from("/definitely/not/here")]).is_err());
/// ```
pub fn normalize_paths(paths: &[Utf8PathBuf]) -> Result<Vec<Utf8PathBuf>, ScanError> {
    let existing: Vec<Utf8PathBuf> = paths
        .iter()
        .filter(|path| {
            let keep = path.is_dir();
            if !keep {
                debug!(path = %path, "Dropping scan path that is not a directory");
            }
            keep
        })
        .cloned()
        .collect();

    if !paths.is_empty() && existing.is_empty() {
        return Err(ScanError::DirectoryNotExist {
            paths: paths.to_vec(),
        });
    }

    Ok(existing)
}

/// A file walker that finds TypeScript files under one root directory.
///
/// Paths are collected single-threaded; parsing is parallelized afterwards
/// by [`ClassDiscoverer`](crate::ClassDiscoverer).
#[derive(Debug)]
pub struct FileWalker {
    /// The root directory to walk.
    root: Utf8PathBuf,
    /// Additional directories to skip (beyond the defaults).
    skip_dirs: Vec<String>,
    /// Whether to follow symbolic links.
    follow_links: bool,
}

impl FileWalker {
    /// Creates a new file walker for the given root directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the root path isn't a directory.
    pub fn new(root: &Utf8Path) -> Result<Self, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::config(format!(
                "root path is not a directory: {root}"
            )));
        }

        Ok(Self {
            root: root.to_owned(),
            skip_dirs: Vec::new(),
            follow_links: false,
        })
    }

    /// Adds directory names to skip, in addition to the defaults.
    #[must_use]
    pub fn with_skip_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Configures whether to follow symbolic links.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Collects all TypeScript file paths under the root.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Walk`] if directory traversal fails, or
    /// [`ScanError::NonUtf8Path`] if a non-UTF-8 path is encountered.
    pub fn collect_paths(&self) -> Result<Vec<Utf8PathBuf>, ScanError> {
        let mut paths = Vec::new();

        for result in self.build_walker() {
            let entry = result?;

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let utf8_path =
                Utf8Path::from_path(path).ok_or_else(|| ScanError::NonUtf8Path(path.to_owned()))?;

            if !is_typescript_file(utf8_path) || self.should_skip_path(utf8_path) {
                continue;
            }

            paths.push(utf8_path.to_owned());
        }

        Ok(paths)
    }

    fn build_walker(&self) -> ignore::Walk {
        WalkBuilder::new(&self.root)
            .standard_filters(true)
            .follow_links(self.follow_links)
            .threads(1)
            .require_git(false)
            .build()
    }

    /// Checks the path below the root against the skip lists.
    fn should_skip_path(&self, path: &Utf8Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        relative.components().any(|component| {
            let name = component.as_str();
            SKIP_DIRECTORIES.contains(&name) || self.skip_dirs.iter().any(|d| d == name)
        })
    }

    /// Returns the root directory being walked.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

fn is_typescript_file(path: &Utf8Path) -> bool {
    let is_declaration = path
        .file_name()
        .is_some_and(|name| name.ends_with(".d.ts"));

    !is_declaration
        && path
            .extension()
            .is_some_and(|ext| TYPESCRIPT_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn utf8_temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_is_typescript_file() {
        assert!(is_typescript_file(Utf8Path::new("foo.ts")));
        assert!(is_typescript_file(Utf8Path::new("foo.tsx")));
        assert!(is_typescript_file(Utf8Path::new("src/bar.mts")));
        assert!(!is_typescript_file(Utf8Path::new("types/index.d.ts")));
        assert!(!is_typescript_file(Utf8Path::new("foo.js")));
        assert!(!is_typescript_file(Utf8Path::new("foo")));
    }

    #[test]
    fn test_should_skip_path() {
        let walker = FileWalker {
            root: Utf8PathBuf::from("/project"),
            skip_dirs: vec!["generated".to_owned()],
            follow_links: false,
        };

        assert!(walker.should_skip_path(Utf8Path::new("/project/node_modules/foo.ts")));
        assert!(walker.should_skip_path(Utf8Path::new("/project/src/dist/bar.ts")));
        assert!(walker.should_skip_path(Utf8Path::new("/project/generated/foo.ts")));
        assert!(!walker.should_skip_path(Utf8Path::new("/project/src/foo.ts")));
    }

    #[test]
    fn test_root_under_skipped_name_is_still_walked() {
        let walker = FileWalker {
            root: Utf8PathBuf::from("/tmp/build/app"),
            skip_dirs: Vec::new(),
            follow_links: false,
        };
        assert!(!walker.should_skip_path(Utf8Path::new("/tmp/build/app/src/foo.ts")));
    }

    #[test]
    fn test_collect_paths() {
        let (_guard, root) = utf8_temp_dir();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("src/a.ts"), "class A {}").unwrap();
        fs::write(root.join("src/nested/b.tsx"), "class B {}").unwrap();
        fs::write(root.join("src/readme.md"), "# docs").unwrap();
        fs::write(root.join("node_modules/pkg/c.ts"), "class C {}").unwrap();

        let mut paths = FileWalker::new(&root).unwrap().collect_paths().unwrap();
        paths.sort();

        assert_eq!(paths, vec![root.join("src/a.ts"), root.join("src/nested/b.tsx")]);
    }

    #[test]
    fn test_new_rejects_missing_root() {
        let (_guard, root) = utf8_temp_dir();
        let err = FileWalker::new(&root.join("missing")).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[test]
    fn test_normalize_paths_drops_missing() {
        let (_guard, root) = utf8_temp_dir();
        let missing = root.join("missing");
        let file = root.join("file.ts");
        fs::write(&file, "").unwrap();

        let normalized = normalize_paths(&[missing, root.clone(), file]).unwrap();
        assert_eq!(normalized, vec![root]);
    }

    #[test]
    fn test_normalize_paths_all_missing() {
        let (_guard, root) = utf8_temp_dir();
        let err = normalize_paths(&[root.join("a"), root.join("b")]).unwrap_err();
        assert!(matches!(err, ScanError::DirectoryNotExist { ref paths } if paths.len() == 2));
    }

    #[test]
    fn test_normalize_paths_empty() {
        assert!(normalize_paths(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_with_skip_dirs_and_follow_links() {
        let (_guard, root) = utf8_temp_dir();
        let walker = FileWalker::new(&root)
            .unwrap()
            .with_skip_dirs(["vendor", "third_party"])
            .with_follow_links(true);

        assert!(walker.skip_dirs.contains(&"vendor".to_owned()));
        assert!(walker.follow_links);
        assert_eq!(walker.root(), root.as_path());
    }
}
