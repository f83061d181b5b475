//! CLI entry point for the di-scan metadata scanner.
//!
//! Loads a JSON configuration, runs one scan with an annotation collector
//! per configured collector id, and prints what was collected.
//!
//! # Usage
//!
//! ```bash
//! di-scan [OPTIONS] <COMMAND>
//!
//! # Scan and show a summary
//! di-scan scan --config di-scan.json
//!
//! # Record @Route decorators into the "routes" collector, print JSON
//! di-scan scan --config di-scan.json --record Route=routes --json
//!
//! # Ignore any existing cache
//! di-scan scan --config di-scan.json --fresh
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::collections::BTreeMap;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{WrapErr, eyre};
use ds_core::Config;
use ds_scanner::{
    AnnotationCollector, CollectorRegistry, CollectorSnapshot, NullScanHandler, RecordAnnotation,
    ScanResult, ScanSource, Scanner,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Scans TypeScript sources for dependency-injection decorators.
///
/// Collected metadata is cached under the configured cache directory, so
/// later runs only re-read files that changed.
#[derive(Parser)]
#[command(name = "di-scan", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run one scan and report the collected metadata.
    Scan {
        /// JSON configuration file.
        ///
        /// Relative paths inside it are resolved against its directory.
        #[arg(short, long, env = "DI_SCAN_CONFIG")]
        config: Utf8PathBuf,

        /// Record a decorator into a collector, as `NAME=COLLECTOR`.
        ///
        /// Adds to the `record` table of the configuration file.
        #[arg(short, long, value_name = "NAME=COLLECTOR", value_parser = parse_record)]
        record: Vec<(String, String)>,

        /// Print the collector snapshot as JSON instead of a summary.
        #[arg(long)]
        json: bool,

        /// Delete the cache files before scanning.
        #[arg(long)]
        fresh: bool,
    },
}

/// Parses a `NAME=COLLECTOR` recording rule.
fn parse_record(raw: &str) -> Result<(String, String), String> {
    let (name, collector) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=COLLECTOR, got '{raw}'"))?;

    let name = name.trim().trim_start_matches('@');
    let collector = collector.trim();
    if name.is_empty() || collector.is_empty() {
        return Err(format!("expected NAME=COLLECTOR, got '{raw}'"));
    }

    Ok((name.to_owned(), collector.to_owned()))
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects `RUST_LOG` if set. Otherwise uses `debug` with `--verbose` and
/// `info` by default.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},ignore=warn"))
    });

    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Loads the configuration file and merges the `--record` rules into it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if a rule
/// targets a collector the configuration does not list.
fn build_config(path: &Utf8Path, records: &[(String, String)]) -> color_eyre::Result<Config> {
    let mut config =
        Config::load(path).wrap_err_with(|| format!("failed to load configuration {path}"))?;

    let base = path.parent().unwrap_or_else(|| Utf8Path::new(""));
    resolve_paths(&mut config, base);

    config.record.extend(records.iter().cloned());
    config.validate()?;

    Ok(config)
}

/// Makes every relative path of the scan configuration relative to `base`.
fn resolve_paths(config: &mut Config, base: &Utf8Path) {
    let resolve = |path: &mut Utf8PathBuf| {
        if path.is_relative() {
            *path = base.join(&*path);
        }
    };

    config.scan.paths.iter_mut().for_each(resolve);
    config.scan.class_map.values_mut().for_each(resolve);
    resolve(&mut config.scan.cache_dir);
}

/// Registers one [`AnnotationCollector`] per configured collector id.
fn build_registry(config: &Config) -> CollectorRegistry {
    let mut registry = CollectorRegistry::new();
    for id in &config.scan.collectors {
        registry.register(AnnotationCollector::new(id.as_str()));
    }
    registry
}

/// Creates a [`Scanner`] recording every decorator of the `record` table.
fn create_scanner(config: &Config) -> Scanner {
    config.record.iter().fold(
        Scanner::new(config.scan.clone(), NullScanHandler),
        |scanner, (annotation, collector)| {
            scanner.with_annotation(annotation.as_str(), RecordAnnotation::new(collector.as_str()))
        },
    )
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs one scan and prints its result.
///
/// # Errors
///
/// Returns an error if the cache cannot be cleared, the scan fails, or the
/// output cannot be written.
fn run_scan(config: &Config, json: bool, fresh: bool) -> color_eyre::Result<()> {
    info!(
        paths = config.scan.paths.len(),
        collectors = config.scan.collectors.len(),
        handlers = config.record.len(),
        "Starting scan"
    );

    let mut scanner = create_scanner(config);
    if fresh {
        scanner.cache().clear()?;
    }

    let mut registry = build_registry(config);
    let result = scanner.scan(&mut registry)?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if json {
        let output = snapshot_json(&result.snapshot)?;
        writeln!(handle, "{output}")?;
    } else {
        write_summary(&mut handle, &result, &registry)?;
    }

    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Decodes every collector payload and renders the snapshot as JSON.
fn snapshot_json(snapshot: &CollectorSnapshot) -> color_eyre::Result<String> {
    let decoded = snapshot
        .iter()
        .map(|(id, bytes)| {
            serde_json::from_slice(bytes)
                .map(|value: serde_json::Value| (id.as_str(), value))
                .map_err(|e| eyre!("collector '{id}' holds undecodable data: {e}"))
        })
        .collect::<color_eyre::Result<BTreeMap<_, _>>>()?;

    serde_json::to_string_pretty(&decoded)
        .map_err(|e| eyre!("Failed to serialize JSON: {}", e))
}

/// Writes a human-readable summary of a scan.
fn write_summary(
    out: &mut impl Write,
    result: &ScanResult,
    registry: &CollectorRegistry,
) -> std::io::Result<()> {
    let source = match result.source {
        ScanSource::Skipped => "skipped (no paths configured)",
        ScanSource::Cache => "restored from cache",
        ScanSource::Full => "full scan",
    };
    let stats = &result.stats;

    writeln!(out)?;
    writeln!(out, "Metadata Scan Summary")?;
    writeln!(out, "=====================")?;
    writeln!(out)?;
    writeln!(out, "Source: {source}")?;

    if result.source == ScanSource::Full {
        writeln!(out, "Files parsed:       {}", stats.files)?;
        writeln!(out, "  Errors:           {}", stats.file_errors)?;
        writeln!(out, "Classes discovered: {}", stats.discovered)?;
        writeln!(out, "  Collected:        {}", stats.collected)?;
        writeln!(out, "  Unchanged:        {}", stats.unchanged)?;
        writeln!(out, "  Shadowed:         {}", stats.shadowed)?;
        writeln!(out, "  Removed:          {}", stats.removed)?;
    }

    writeln!(out)?;
    writeln!(out, "Collectors ({}):", registry.len())?;
    for id in registry.ids() {
        match registry.get::<AnnotationCollector>(id) {
            Some(collector) => writeln!(out, "  {id}: {} classes", collector.len())?,
            None => writeln!(out, "  {id}")?,
        }
    }

    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.no_color);

    match &cli.command {
        Commands::Scan {
            config,
            record,
            json,
            fresh,
        } => {
            let config = build_config(config, record)?;
            run_scan(&config, *json, *fresh)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use ds_scanner::StatsSnapshot;

    use super::*;

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    #[test]
    fn test_parse_record() {
        assert_eq!(
            parse_record("Route=routes").unwrap(),
            ("Route".to_owned(), "routes".to_owned())
        );
        assert_eq!(
            parse_record("@Inject = services").unwrap(),
            ("Inject".to_owned(), "services".to_owned())
        );
        assert!(parse_record("Route").is_err());
        assert!(parse_record("=routes").is_err());
        assert!(parse_record("Route=").is_err());
    }

    #[test]
    fn test_cli_parses_scan_flags() {
        let cli = Cli::try_parse_from([
            "di-scan", "scan", "-c", "conf.json", "-r", "Route=routes", "--json", "--fresh", "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Commands::Scan {
            config,
            record,
            json,
            fresh,
        } = cli.command;
        assert_eq!(config, "conf.json");
        assert_eq!(record, [("Route".to_owned(), "routes".to_owned())]);
        assert!(json && fresh);
    }

    #[test]
    fn test_build_config_resolves_paths_and_merges_records() {
        let (_guard, root) = temp_root();
        let path = root.join("di-scan.json");
        fs::write(
            &path,
            r#"{
                "scan": {
                    "paths": ["src", "/abs"],
                    "collectors": ["routes", "services"],
                    "class_map": { "User": "vendor/user.ts" }
                },
                "record": { "Route": "routes" }
            }"#,
        )
        .unwrap();

        let config =
            build_config(&path, &[("Injectable".to_owned(), "services".to_owned())]).unwrap();

        assert_eq!(config.scan.paths, [root.join("src"), Utf8PathBuf::from("/abs")]);
        assert_eq!(config.scan.cache_dir, root.join("runtime/container"));
        assert_eq!(
            config.scan.authoritative_path("User"),
            Some(root.join("vendor/user.ts").as_path())
        );
        assert_eq!(config.record.len(), 2);
    }

    #[test]
    fn test_build_config_rejects_unknown_record_target() {
        let (_guard, root) = temp_root();
        let path = root.join("di-scan.json");
        fs::write(&path, r#"{ "scan": { "collectors": ["routes"] } }"#).unwrap();

        let err = build_config(&path, &[("Route".to_owned(), "missing".to_owned())]).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_run_scan_collects_recorded_decorators() {
        let (_guard, root) = temp_root();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(
            root.join("src/users.ts"),
            "@Route('/users') export class Users {}\nexport class Plain {}",
        )
        .unwrap();
        let path = root.join("di-scan.json");
        fs::write(
            &path,
            r#"{ "scan": { "paths": ["src"], "collectors": ["routes"] } }"#,
        )
        .unwrap();

        let config = build_config(&path, &[("Route".to_owned(), "routes".to_owned())]).unwrap();
        let mut registry = build_registry(&config);
        let result = create_scanner(&config).scan(&mut registry).unwrap();

        assert_eq!(result.source, ScanSource::Full);
        let routes = registry.get::<AnnotationCollector>("routes").unwrap();
        assert_eq!(routes.classes().collect::<Vec<_>>(), ["Users"]);
        assert!(root.join("runtime/container/scan.cache").exists());

        let json: serde_json::Value =
            serde_json::from_str(&snapshot_json(&result.snapshot).unwrap()).unwrap();
        assert_eq!(json["routes"]["Users"]["class"]["Route"], "/users");

        run_scan(&config, false, true).unwrap();
    }

    #[test]
    fn test_snapshot_json_rejects_binary_payload() {
        let mut snapshot = CollectorSnapshot::new();
        snapshot.insert("raw".to_owned(), vec![0xff, 0x00]);
        assert!(snapshot_json(&snapshot).is_err());
    }

    #[test]
    fn test_summary_for_cache_restore_omits_counters() {
        let result = ScanResult {
            source: ScanSource::Cache,
            snapshot: CollectorSnapshot::new(),
            stats: StatsSnapshot::default(),
        };
        let mut registry = CollectorRegistry::new();
        registry.register(AnnotationCollector::new("routes"));

        let mut out = Vec::new();
        write_summary(&mut out, &result, &registry).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("restored from cache"));
        assert!(text.contains("routes: 0 classes"));
        assert!(!text.contains("Classes discovered"));
    }
}
