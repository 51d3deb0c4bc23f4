pub mod pattern;
pub mod syntax;

use std::ops::Range;

use anyhow::Result;

use crate::cli::ScannerKind;

/// A relative module specifier found in one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence<'a> {
    /// The import/export statement text the specifier belongs to.
    pub statement: &'a str,
    /// The string literal's content without quotes, e.g. `./common/util`.
    pub specifier: &'a str,
    /// Byte range of `specifier` within the file.
    pub span: Range<usize>,
}

/// Only specifiers starting with `.` (`./`, `../`) are rewrite candidates.
pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with('.')
}

/// Find every relative specifier in `source`, in order of appearance.
pub fn find_occurrences(source: &str, scanner: ScannerKind) -> Result<Vec<Occurrence<'_>>> {
    let mut found = match scanner {
        ScannerKind::Syntax => syntax::scan(source)?,
        ScannerKind::Pattern => pattern::scan(source),
    };
    found.sort_by_key(|occurrence| occurrence.span.start);
    found.dedup_by_key(|occurrence| occurrence.span.start);
    Ok(found)
}
