use std::io;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, error, info, trace, warn};

use crate::cli::ScannerKind;
use crate::config::RunConfig;
use crate::matcher::find_occurrences;
use crate::output::RewriteStats;
use crate::resolver::{self, ProbePolicy, Resolution};
use crate::walker::collect_output_files;

/// Knobs for a rewrite pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteOptions {
    pub scanner: ScannerKind,
    /// Propagate probe I/O errors and refuse to write files with unresolved specifiers.
    pub strict: bool,
    /// Compute everything, write nothing.
    pub dry_run: bool,
}

impl RewriteOptions {
    fn probe_policy(&self) -> ProbePolicy {
        if self.strict {
            ProbePolicy::Strict
        } else {
            ProbePolicy::Lenient
        }
    }
}

/// One specifier and what it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fix {
    pub original: String,
    pub replacement: String,
    pub resolution: Resolution,
}

/// The rewritten text of one file plus a record of every specifier in it.
#[derive(Debug)]
pub struct SourceRewrite {
    pub text: String,
    pub fixes: Vec<Fix>,
}

impl SourceRewrite {
    /// True when at least one specifier changed spelling.
    pub fn is_modified(&self) -> bool {
        self.fixes
            .iter()
            .any(|fix| fix.resolution != Resolution::AlreadyResolved)
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &Fix> {
        self.fixes
            .iter()
            .filter(|fix| fix.resolution == Resolution::Unresolved)
    }
}

/// Rewrite every relative specifier in `source`, resolving against
/// `containing_dir` (the directory of the file `source` was read from).
///
/// Only the bytes between each specifier's quotes are replaced. Bindings,
/// quotes and all other text are copied through unchanged.
pub fn rewrite_source(
    source: &str,
    containing_dir: &Path,
    options: &RewriteOptions,
) -> Result<SourceRewrite> {
    let occurrences = find_occurrences(source, options.scanner)?;
    let policy = options.probe_policy();

    let mut text = String::with_capacity(source.len() + occurrences.len() * "/index.js".len());
    let mut fixes = Vec::with_capacity(occurrences.len());
    let mut copied = 0;

    for occurrence in &occurrences {
        let resolution = resolver::resolve(containing_dir, occurrence.specifier, policy)
            .with_context(|| {
                format!(
                    "failed to probe {:?} from {}",
                    occurrence.specifier,
                    containing_dir.display()
                )
            })?;
        let replacement = resolution.apply(occurrence.specifier);
        trace!(
            statement = occurrence.statement,
            "{:?} resolved as {:?}",
            occurrence.specifier,
            resolution
        );

        text.push_str(&source[copied..occurrence.span.start]);
        text.push_str(&replacement);
        copied = occurrence.span.end;

        fixes.push(Fix {
            original: occurrence.specifier.to_owned(),
            replacement: replacement.into_owned(),
            resolution,
        });
    }
    text.push_str(&source[copied..]);

    Ok(SourceRewrite { text, fixes })
}

/// Run the rewrite pass over every `.js` file under `config.out_dir`.
///
/// Files are processed one at a time. A file is written back only when a
/// specifier in it changed. Files that are not valid UTF-8 are skipped with a
/// warning; any other read failure aborts the pass.
pub async fn rewrite_tree(config: &RunConfig) -> Result<RewriteStats> {
    let started = Instant::now();
    let options = &config.options;

    let files = collect_output_files(&config.out_dir).await?;
    info!(
        "found {} .js file(s) under {}",
        files.len(),
        config.out_dir.display()
    );

    let mut stats = RewriteStats {
        out_dir: config.out_dir.clone(),
        dry_run: options.dry_run,
        ..RewriteStats::default()
    };

    for path in &files {
        stats.file_count += 1;

        let source = match tokio::fs::read_to_string(path).await {
            Ok(source) => source,
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                warn!("skipping {}: not valid UTF-8", path.display());
                stats.skipped += 1;
                continue;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", path.display()));
            }
        };

        let containing_dir = path.parent().unwrap_or(Path::new(""));
        let rewrite = rewrite_source(&source, containing_dir, options)
            .with_context(|| format!("failed to rewrite {}", path.display()))?;

        for fix in &rewrite.fixes {
            stats.record(fix.resolution);
            if fix.resolution != Resolution::AlreadyResolved {
                debug!(
                    "{}: {:?} -> {:?} ({:?})",
                    path.display(),
                    fix.original,
                    fix.replacement,
                    fix.resolution
                );
            }
        }

        if options.strict {
            let unresolved: Vec<&Fix> = rewrite.unresolved().collect();
            if !unresolved.is_empty() {
                for fix in &unresolved {
                    error!("{}: cannot resolve {:?}", path.display(), fix.original);
                }
                stats.strict_failures += unresolved.len();
                continue;
            }
        }

        if !rewrite.is_modified() {
            continue;
        }

        stats.files_rewritten += 1;
        stats.specifiers_rewritten += rewrite
            .fixes
            .iter()
            .filter(|fix| fix.resolution != Resolution::AlreadyResolved)
            .count();

        if options.dry_run {
            info!("would rewrite {}", path.display());
            continue;
        }

        tokio::fs::write(path, rewrite.text)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    stats.elapsed_secs = started.elapsed().as_secs_f64();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "export default 1;\n").unwrap();
    }

    fn run_config(out_dir: PathBuf, options: RewriteOptions) -> RunConfig {
        RunConfig { out_dir, options }
    }

    #[test]
    fn preserves_bindings_and_surrounding_text() {
        let dir = tmp();
        touch(dir.path(), "a.js");
        touch(dir.path(), "b/index.js");

        let src = "// header\nimport A, { x as y } from \"./a\";\nimport * as B from './b';\nimport fs from \"fs\";\nconsole.log(A, y, B);\n";
        let rewrite = rewrite_source(src, dir.path(), &RewriteOptions::default()).unwrap();

        assert_eq!(
            rewrite.text,
            "// header\nimport A, { x as y } from \"./a.js\";\nimport * as B from './b/index.js';\nimport fs from \"fs\";\nconsole.log(A, y, B);\n"
        );
        let resolutions: Vec<_> = rewrite.fixes.iter().map(|f| f.resolution).collect();
        assert_eq!(resolutions, [Resolution::File, Resolution::DirectoryIndex]);
        assert!(rewrite.is_modified());
    }

    #[test]
    fn same_specifier_twice_is_rewritten_twice() {
        let dir = tmp();
        let src = "import a from \"./x\";\nexport { b } from \"./x\";\n";
        let rewrite = rewrite_source(src, dir.path(), &RewriteOptions::default()).unwrap();
        assert_eq!(
            rewrite.text,
            "import a from \"./x.js\";\nexport { b } from \"./x.js\";\n"
        );
    }

    #[test]
    fn already_resolved_source_is_unmodified() {
        let dir = tmp();
        let src = "import a from \"./a.js\";\nimport b from \"./b/index.js\";\n";
        let rewrite = rewrite_source(src, dir.path(), &RewriteOptions::default()).unwrap();
        assert_eq!(rewrite.text, src);
        assert!(!rewrite.is_modified());
        assert_eq!(rewrite.fixes.len(), 2);
    }

    #[test]
    fn rewriting_twice_is_idempotent() {
        let dir = tmp();
        touch(dir.path(), "dir/index.js");
        touch(dir.path(), "file.js");

        let src = "import d from \"./dir\";\nimport f from \"./file\";\nimport m from \"./missing\";\n";
        for scanner in [ScannerKind::Syntax, ScannerKind::Pattern] {
            let options = RewriteOptions {
                scanner,
                ..RewriteOptions::default()
            };
            let first = rewrite_source(src, dir.path(), &options).unwrap();
            let second = rewrite_source(&first.text, dir.path(), &options).unwrap();
            assert_eq!(first.text, second.text, "{scanner:?}");
            assert!(!second.is_modified(), "{scanner:?}");
        }
    }

    #[test]
    fn unresolved_is_reported_separately() {
        let dir = tmp();
        let rewrite = rewrite_source(
            "import m from \"./missing\";\n",
            dir.path(),
            &RewriteOptions::default(),
        )
        .unwrap();
        assert_eq!(rewrite.text, "import m from \"./missing.js\";\n");
        let unresolved: Vec<_> = rewrite.unresolved().map(|f| f.original.as_str()).collect();
        assert_eq!(unresolved, ["./missing"]);
    }

    #[tokio::test]
    async fn tree_pass_writes_only_changed_files() {
        let dir = tmp();
        let out = dir.path().join("dist");
        touch(&out, "common/providers/OpenRouter.js");
        fs::write(out.join("entry.js"), "import X from \"./common/providers/OpenRouter\";\n").unwrap();
        fs::write(out.join("plain.js"), "export const plain = 1;\n").unwrap();
        fs::write(out.join("done.js"), "import X from \"./entry.js\";\n").unwrap();

        let stats = rewrite_tree(&run_config(out.clone(), RewriteOptions::default()))
            .await
            .unwrap();

        assert_eq!(
            fs::read_to_string(out.join("entry.js")).unwrap(),
            "import X from \"./common/providers/OpenRouter.js\";\n"
        );
        assert_eq!(stats.file_count, 4);
        assert_eq!(stats.files_rewritten, 1);
        assert_eq!(stats.specifiers_rewritten, 1);
        assert_eq!(stats.resolved_files, 1);
        assert_eq!(stats.already_resolved, 1);
    }

    #[tokio::test]
    async fn nested_files_resolve_against_their_own_directory() {
        let dir = tmp();
        let out = dir.path().to_path_buf();
        touch(&out, "shared/util.js");
        fs::create_dir_all(out.join("feature/deep")).unwrap();
        fs::write(
            out.join("feature/deep/mod.js"),
            "import { u } from \"../../shared/util\";\nexport * from \"./sibling\";\n",
        )
        .unwrap();
        touch(&out, "feature/deep/sibling/index.js");

        rewrite_tree(&run_config(out.clone(), RewriteOptions::default()))
            .await
            .unwrap();

        assert_eq!(
            fs::read_to_string(out.join("feature/deep/mod.js")).unwrap(),
            "import { u } from \"../../shared/util.js\";\nexport * from \"./sibling/index.js\";\n"
        );
    }

    #[tokio::test]
    async fn dry_run_leaves_files_alone() {
        let dir = tmp();
        let original = "import m from \"./missing\";\n";
        fs::write(dir.path().join("entry.js"), original).unwrap();

        let options = RewriteOptions {
            dry_run: true,
            ..RewriteOptions::default()
        };
        let stats = rewrite_tree(&run_config(dir.path().to_path_buf(), options))
            .await
            .unwrap();

        assert_eq!(stats.files_rewritten, 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("entry.js")).unwrap(),
            original
        );
    }

    #[tokio::test]
    async fn strict_mode_keeps_files_with_unresolved_specifiers() {
        let dir = tmp();
        touch(dir.path(), "present.js");
        let original = "import p from \"./present\";\nimport m from \"./missing\";\n";
        fs::write(dir.path().join("entry.js"), original).unwrap();

        let options = RewriteOptions {
            strict: true,
            ..RewriteOptions::default()
        };
        let stats = rewrite_tree(&run_config(dir.path().to_path_buf(), options))
            .await
            .unwrap();

        assert_eq!(stats.strict_failures, 1);
        assert_eq!(stats.files_rewritten, 0);
        assert_eq!(
            fs::read_to_string(dir.path().join("entry.js")).unwrap(),
            original
        );
    }

    #[tokio::test]
    async fn non_utf8_file_is_skipped() {
        let dir = tmp();
        fs::write(dir.path().join("bin.js"), [0xff, 0xfe, 0x00, 0x41]).unwrap();

        let stats = rewrite_tree(&run_config(
            dir.path().to_path_buf(),
            RewriteOptions::default(),
        ))
        .await
        .unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.files_rewritten, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_file_aborts_the_pass() {
        let dir = tmp();
        std::os::unix::fs::symlink(dir.path().join("gone.js"), dir.path().join("broken.js"))
            .unwrap();

        let err = rewrite_tree(&run_config(
            dir.path().to_path_buf(),
            RewriteOptions::default(),
        ))
        .await
        .unwrap_err();
        assert!(
            format!("{err:#}").contains("failed to read"),
            "unexpected error: {err:#}"
        );
    }
}
