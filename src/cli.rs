use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Rewrite relative import/export specifiers in compiled TypeScript output.
///
/// path-fixer walks the compiler's output directory and appends the `.js` or
/// `/index.js` suffix that strict ECMAScript module resolution requires to
/// every relative specifier that lacks one.
#[derive(Parser, Debug)]
#[command(name = "path-fixer", version, about, long_about = None)]
pub struct Cli {
    /// Output directory to rewrite. Skips tsconfig lookup entirely.
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Path to the tsconfig file that declares `compilerOptions.outDir`.
    /// Only consulted when `-d` is absent.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        default_value = "tsconfig.json"
    )]
    pub config: PathBuf,

    /// How import/export statements are located in each file.
    #[arg(long, value_enum, default_value_t = ScannerKind::Syntax)]
    pub scanner: ScannerKind,

    /// Fail on unresolvable specifiers and on filesystem probe errors
    /// instead of falling back to appending `.js`.
    #[arg(long)]
    pub strict: bool,

    /// Report what would be rewritten without writing any file.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Log every rewritten specifier and its resolution.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Strategy used to find specifier occurrences in a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum ScannerKind {
    /// Parse each file with the JavaScript grammar (default). Handles
    /// multi-line statements and ignores look-alikes in strings and comments.
    #[default]
    Syntax,
    /// Single-line text pattern: a line starting with `import`/`export`
    /// followed by a quoted relative path on the same line.
    Pattern,
}
