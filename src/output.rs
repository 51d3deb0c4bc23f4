use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;

use crate::resolver::Resolution;

/// Aggregate statistics produced by a rewrite run.
#[derive(Debug, Default, Serialize)]
pub struct RewriteStats {
    pub out_dir: PathBuf,
    /// Number of `.js` files visited.
    pub file_count: usize,
    /// Files written back (or that would be, under `--dry-run`).
    pub files_rewritten: usize,
    pub specifiers_rewritten: usize,
    /// Specifiers resolved to `<specifier>.js` on disk.
    pub resolved_files: usize,
    /// Specifiers resolved to `<specifier>/index.js` on disk.
    pub directory_indexes: usize,
    /// Specifiers with no match on disk that fell back to `.js`.
    pub unresolved: usize,
    /// Specifiers that already ended in `.js`.
    pub already_resolved: usize,
    /// Files skipped because they could not be read as UTF-8.
    pub skipped: usize,
    /// Unresolved specifiers that blocked a write under `--strict`.
    pub strict_failures: usize,
    pub dry_run: bool,
    /// Wall-clock time for the run in seconds.
    pub elapsed_secs: f64,
}

impl RewriteStats {
    pub fn record(&mut self, resolution: Resolution) {
        match resolution {
            Resolution::AlreadyResolved => self.already_resolved += 1,
            Resolution::File => self.resolved_files += 1,
            Resolution::DirectoryIndex => self.directory_indexes += 1,
            Resolution::Unresolved => self.unresolved += 1,
        }
    }
}

/// Print a summary of the rewrite run.
///
/// - `json = true`: pretty-printed JSON object on stdout.
/// - `json = false`: short human-readable summary on stdout.
///
/// Skipped files are additionally reported as a warning on stderr so stdout
/// stays clean for JSON consumers.
pub fn print_summary(stats: &RewriteStats, json: bool) {
    if stats.skipped > 0 {
        warn!("{} file(s) skipped (not UTF-8 text)", stats.skipped);
    }

    if json {
        match serde_json::to_string_pretty(stats) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("error serialising stats: {e}"),
        }
        return;
    }

    let verb = if stats.dry_run { "Would rewrite" } else { "Rewrote" };
    println!(
        "{} {} specifier(s) in {} of {} file(s) in {:.2}s",
        verb,
        stats.specifiers_rewritten,
        stats.files_rewritten,
        stats.file_count,
        stats.elapsed_secs
    );
    println!(
        "  {} file, {} directory index, {} unresolved, {} already .js",
        stats.resolved_files, stats.directory_indexes, stats.unresolved, stats.already_resolved,
    );
}
