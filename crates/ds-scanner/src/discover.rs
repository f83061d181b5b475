//! Class discovery across the scan directories.
//!
//! Uses the "collect-then-parallelize" pattern:
//!
//! 1. [`FileWalker`] collects every TypeScript path under each root
//! 2. Paths are sorted and parsed in parallel with rayon, one parser pair
//!    per worker thread via `map_init()`
//! 3. Results are merged in path order, so the output is deterministic

use std::collections::{BTreeMap, BTreeSet};
use std::collections::btree_map::Entry;
use std::fs;
use std::time::UNIX_EPOCH;

use camino::{Utf8Path, Utf8PathBuf};
use ds_core::{ClassIdentity, ClassRecord, ClassStructure, FxHashMap, ScanConfig};
use ds_ts_parser::{ParserKind, TsParser};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::ScanError;
use crate::reader::same_file;
use crate::stats::ScanStats;
use crate::walker::FileWalker;

/// Discovered classes keyed by identity.
pub type ClassIndex = BTreeMap<ClassIdentity, ClassRecord>;

/// Result of [`ClassDiscoverer::discover`].
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Every class found.
    pub classes: ClassIndex,

    /// Files that could not be read or parsed. Their classes are missing
    /// from `classes`.
    pub unreadable: BTreeSet<Utf8PathBuf>,
}

/// Enumerates every class declared under a set of directories.
///
/// Discovery is a pure read of the source tree.
///
/// # Examples
///
/// ```
/// use ds_scanner::{ClassDiscoverer, ScanStats};
/// use camino::Utf8PathBuf;
///
/// let dir = tempfile::tempdir()?;
/// std::fs::write(dir.path().join("mailer.ts"), "@Injectable() export class Mailer {}")?;
/// let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
///
/// let found = ClassDiscoverer::new().discover(&[root], &ScanStats::new())?;
/// assert_eq!(found.classes["Mailer"].structure.annotations[0].name, "Injectable");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClassDiscoverer {
    skip_dirs: Vec<String>,
    follow_links: bool,
    class_map: FxHashMap<String, Utf8PathBuf>,
}

impl ClassDiscoverer {
    /// Creates a discoverer with the default walker settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the walker settings and the class map from a scan
    /// configuration.
    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            skip_dirs: config.skip_dirs.clone(),
            follow_links: config.follow_links,
            class_map: config.class_map.clone(),
        }
    }

    /// Discovers every class under `roots`.
    ///
    /// Files that cannot be read or parsed are logged, counted in `stats`,
    /// and reported in [`Discovery::unreadable`]. When two files declare
    /// the same class, the one the class map points at wins; otherwise the
    /// first in path order does.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Walk`] or [`ScanError::NonUtf8Path`] if a
    /// directory cannot be traversed.
    pub fn discover(
        &self,
        roots: &[Utf8PathBuf],
        stats: &ScanStats,
    ) -> Result<Discovery, ScanError> {
        let mut paths = Vec::new();
        for root in roots {
            let walker = FileWalker::new(root)?
                .with_skip_dirs(&self.skip_dirs)
                .with_follow_links(self.follow_links);
            paths.extend(walker.collect_paths()?);
        }
        paths.sort();
        paths.dedup();

        debug!(count = paths.len(), "Collected TypeScript files");

        let parsed: Vec<(Utf8PathBuf, Result<ParsedFile, ScanError>)> = paths
            .into_par_iter()
            .map_init(
                || (TsParser::new(), TsParser::new_tsx()),
                |(ts, tsx), path| {
                    let parser = match ParserKind::for_path(&path) {
                        ParserKind::TypeScript => ts.as_mut(),
                        ParserKind::Tsx => tsx.as_mut(),
                    };
                    let result = parse_file(&path, parser);
                    (path, result)
                },
            )
            .collect();

        let mut found = Discovery::default();
        for (path, result) in parsed {
            match result {
                Ok(file) => {
                    stats.increment_files();
                    self.merge_file(&mut found.classes, &path, file);
                }
                Err(e) => {
                    stats.increment_file_errors();
                    warn!(path = %path, error = %e, "Failed to analyze file");
                    found.unreadable.insert(path);
                }
            }
        }

        stats.add_discovered(found.classes.len() as u64);
        Ok(found)
    }

    fn merge_file(&self, classes: &mut ClassIndex, path: &Utf8Path, file: ParsedFile) {
        for structure in file.classes {
            match classes.entry(structure.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(ClassRecord::new(path, file.modified, structure));
                }
                Entry::Occupied(mut existing) => {
                    let name = structure.name.as_str();
                    if self.is_authoritative(name, path)
                        && !self.is_authoritative(name, existing.get().path())
                    {
                        warn!(
                            class = name,
                            replaced = %existing.get().path,
                            path = %path,
                            "Class map selects later declaration"
                        );
                        existing.insert(ClassRecord::new(path, file.modified, structure));
                    } else {
                        warn!(
                            class = name,
                            kept = %existing.get().path,
                            ignored = %path,
                            "Duplicate class declaration"
                        );
                    }
                }
            }
        }
    }

    fn is_authoritative(&self, class: &str, path: &Utf8Path) -> bool {
        self.class_map
            .get(class)
            .is_some_and(|authoritative| same_file(path, authoritative))
    }
}

/// Classes of one file with its modification time.
struct ParsedFile {
    modified: u64,
    classes: Vec<ClassStructure>,
}

fn parse_file(
    path: &Utf8Path,
    parser: Result<&mut TsParser, &mut ds_ts_parser::ParseError>,
) -> Result<ParsedFile, ScanError> {
    let parser =
        parser.map_err(|e| ScanError::config(format!("no parser available for {path}: {e}")))?;

    let modified = modified_secs(path)?;
    let contents = fs::read_to_string(path).map_err(|e| ScanError::read(path, e))?;
    let result = parser
        .parse(&contents)
        .map_err(|e| ScanError::parse(path, e))?;

    if result.has_errors {
        debug!(path = %path, "Recovered from syntax errors");
    }

    Ok(ParsedFile {
        modified,
        classes: result.classes,
    })
}

/// Modification time in whole seconds since the Unix epoch.
fn modified_secs(path: &Utf8Path) -> Result<u64, ScanError> {
    let modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| ScanError::read(path, e))?;

    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs()))
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    use super::*;

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    fn write(root: &Utf8Path, relative: &str, contents: &str) -> Utf8PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_discover_classes_with_mtime() {
        let (_guard, root) = temp_root();
        let a = write(&root, "src/a.ts", "export class A {}\nclass Helper {}");
        write(&root, "src/view.tsx", "export class View { render() { return <p />; } }");
        write(&root, "src/plain.ts", "export const x = 1;");

        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        File::options().write(true).open(&a).unwrap().set_modified(when).unwrap();

        let stats = ScanStats::new();
        let classes = ClassDiscoverer::new().discover(&[root], &stats).unwrap().classes;

        assert_eq!(classes.keys().collect::<Vec<_>>(), ["A", "Helper", "View"]);
        assert_eq!(classes["A"].modified, 1_600_000_000);
        assert_eq!(classes["A"].path, a);
        assert_eq!(classes["View"].structure.methods[0].name, "render");

        let snap = stats.snapshot();
        assert_eq!(snap.files, 3);
        assert_eq!(snap.discovered, 3);
    }

    #[test]
    fn test_duplicate_class_first_path_wins() {
        let (_guard, root) = temp_root();
        let first = write(&root, "a/user.ts", "@Tag('first') class User {}");
        write(&root, "b/user.ts", "@Tag('second') class User {}");

        let classes = ClassDiscoverer::new()
            .discover(&[root], &ScanStats::new())
            .unwrap()
            .classes;

        assert_eq!(classes.len(), 1);
        assert_eq!(classes["User"].path, first);
    }

    #[test]
    fn test_duplicate_class_class_map_wins() {
        let (_guard, root) = temp_root();
        write(&root, "a/user.ts", "@Tag('vendor') class User {}");
        let replacement = write(&root, "z/user.ts", "@Tag('app') class User {}");

        let config = ScanConfig::default().with_class_map_entry("User", &replacement);
        let classes = ClassDiscoverer::from_config(&config)
            .discover(&[root], &ScanStats::new())
            .unwrap()
            .classes;

        assert_eq!(classes["User"].path, replacement);
        assert_eq!(classes["User"].structure.annotations[0].arguments[0], "app");
    }

    #[test]
    fn test_multiple_roots_and_overlap() {
        let (_guard, root) = temp_root();
        write(&root, "app/a.ts", "class A {}");
        write(&root, "lib/b.ts", "class B {}");

        let classes = ClassDiscoverer::new()
            .discover(&[root.join("app"), root.join("lib"), root.clone()], &ScanStats::new())
            .unwrap()
            .classes;

        assert_eq!(classes.keys().collect::<Vec<_>>(), ["A", "B"]);
    }

    #[test]
    fn test_skip_dirs_from_config() {
        let (_guard, root) = temp_root();
        write(&root, "src/a.ts", "class A {}");
        write(&root, "generated/b.ts", "class B {}");

        let config = ScanConfig::default().with_skip_dirs(&["generated"]);
        let classes = ClassDiscoverer::from_config(&config)
            .discover(&[root], &ScanStats::new())
            .unwrap()
            .classes;

        assert_eq!(classes.keys().collect::<Vec<_>>(), ["A"]);
    }

    #[test]
    fn test_unreadable_file_is_counted_and_skipped() {
        let (_guard, root) = temp_root();
        write(&root, "src/a.ts", "class A {}");
        fs::write(root.join("src/bad.ts"), [0xff, 0xfe, 0x00]).unwrap();

        let stats = ScanStats::new();
        let found = ClassDiscoverer::new().discover(&[root.clone()], &stats).unwrap();

        assert_eq!(found.classes.keys().collect::<Vec<_>>(), ["A"]);
        assert_eq!(found.unreadable.iter().collect::<Vec<_>>(), [&root.join("src/bad.ts")]);
        assert_eq!(stats.snapshot().file_errors, 1);
    }
}
