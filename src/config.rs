use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cli::Cli;
use crate::rewrite::RewriteOptions;

/// Failure to determine the output directory from a tsconfig file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not read {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: json5::Error,
    },

    #[error("`extends` cycle through {}", .0.display())]
    ExtendsCycle(PathBuf),

    #[error("no compilerOptions.outDir in {}", .0.display())]
    MissingOutDir(PathBuf),
}

/// `extends` in tsconfig: a single path or, since TypeScript 5.0, a list where
/// later entries override earlier ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExtendsField {
    One(String),
    Many(Vec<String>),
}

impl ExtendsField {
    fn entries(&self) -> &[String] {
        match self {
            Self::One(entry) => std::slice::from_ref(entry),
            Self::Many(entries) => entries,
        }
    }
}

/// The slice of tsconfig this tool cares about.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsConfig {
    #[serde(default)]
    extends: Option<ExtendsField>,
    #[serde(default)]
    compiler_options: Option<CompilerOptions>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    #[serde(default)]
    out_dir: Option<String>,
}

/// Everything a rewrite run needs, resolved once from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub out_dir: PathBuf,
    pub options: RewriteOptions,
}

impl RunConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let out_dir = resolve_out_dir(cli.out_dir.as_deref(), &cli.config)?;
        Ok(Self {
            out_dir,
            options: RewriteOptions {
                scanner: cli.scanner,
                strict: cli.strict,
                dry_run: cli.dry_run,
            },
        })
    }
}

/// Determine the directory holding the compiled output.
///
/// An explicit directory wins and the config file is never opened. Otherwise
/// `compilerOptions.outDir` is read from `config_path` (following relative
/// `extends` chains) and resolved against the directory of the file that
/// declares it. An unreadable or malformed config is reported as a warning;
/// the run then fails with [`ConfigError::MissingOutDir`].
pub fn resolve_out_dir(explicit: Option<&Path>, config_path: &Path) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }

    let mut chain = HashSet::new();
    match find_out_dir(config_path, &mut chain) {
        Ok(Some(dir)) => Ok(dir),
        Ok(None) => Err(ConfigError::MissingOutDir(config_path.to_path_buf())),
        Err(err) => {
            warn!("{err}");
            Err(ConfigError::MissingOutDir(config_path.to_path_buf()))
        }
    }
}

fn find_out_dir(
    config_path: &Path,
    chain: &mut HashSet<PathBuf>,
) -> Result<Option<PathBuf>, ConfigError> {
    let key = config_path
        .canonicalize()
        .unwrap_or_else(|_| config_path.to_path_buf());
    if !chain.insert(key.clone()) {
        return Err(ConfigError::ExtendsCycle(config_path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    let TsConfig {
        extends,
        compiler_options,
    } = json5::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: config_path.to_path_buf(),
        source,
    })?;

    let config_dir = config_path.parent().unwrap_or(Path::new(""));

    if let Some(out_dir) = compiler_options.and_then(|opts| opts.out_dir) {
        debug!("outDir {:?} declared in {}", out_dir, config_path.display());
        return Ok(Some(config_dir.join(out_dir)));
    }

    if let Some(extends) = extends {
        for entry in extends.entries().iter().rev() {
            let Some(base) = extends_path(config_dir, entry) else {
                debug!("not following package extends {:?}", entry);
                continue;
            };
            if let Some(dir) = find_out_dir(&base, chain)? {
                return Ok(Some(dir));
            }
        }
    }

    // Siblings in a `Many` list may share a base; only the current chain counts.
    chain.remove(&key);
    Ok(None)
}

/// Map a relative or absolute `extends` entry to a file path. Package names
/// (`@tsconfig/node20/tsconfig.json`) return `None`.
fn extends_path(config_dir: &Path, entry: &str) -> Option<PathBuf> {
    let is_path = entry.starts_with("./")
        || entry.starts_with("../")
        || Path::new(entry).is_absolute();
    if !is_path {
        return None;
    }

    let candidate = config_dir.join(entry);
    if entry.ends_with(".json") || candidate.is_file() {
        Some(candidate)
    } else {
        Some(config_dir.join(format!("{entry}.json")))
    }
}
