use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use anyhow::{Context, Result};
use tokio::task::JoinSet;

/// Suffix of the compiled files path-fixer rewrites.
const OUTPUT_SUFFIX: &str = ".js";

type Listing = Pin<Box<dyn Future<Output = Result<Vec<PathBuf>>> + Send>>;

/// Collect every `.js` file under `root`, sorted by path.
pub async fn collect_output_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = list_files(root.to_path_buf())
        .await?
        .into_iter()
        .filter(|path| is_output_file(path))
        .collect();
    files.sort();
    Ok(files)
}

/// Recursively list every non-directory entry under `dir`.
///
/// Each directory is read once. Sibling subdirectories are listed concurrently
/// and joined in completion order, so the result carries no ordering guarantee.
/// Symlinked directories are not followed.
pub fn list_files(dir: PathBuf) -> Listing {
    Box::pin(async move {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("failed to list {}", dir.display()))?;

        let mut files = Vec::new();
        let mut subdirs = JoinSet::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("failed to list {}", dir.display()))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .with_context(|| format!("failed to stat {}", path.display()))?;

            if file_type.is_dir() {
                subdirs.spawn(list_files(path));
            } else {
                files.push(path);
            }
        }

        while let Some(joined) = subdirs.join_next().await {
            files.extend(joined.context("directory listing task failed")??);
        }

        Ok(files)
    })
}

fn is_output_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(OUTPUT_SUFFIX))
}
