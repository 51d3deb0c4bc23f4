pub mod file_resolver;

pub use file_resolver::ProbePolicy;

use std::borrow::Cow;
use std::io;
use std::path::Path;

use file_resolver::is_file;

/// Extension strict ESM resolution needs spelled out.
pub const JS_EXTENSION: &str = ".js";

/// The outcome of resolving one relative specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// Already ends in `.js`; left byte-for-byte unchanged.
    AlreadyResolved,
    /// `<specifier>.js` exists.
    File,
    /// Only `<specifier>/index.js` exists.
    DirectoryIndex,
    /// Neither candidate exists. The specifier still gets `.js` appended.
    Unresolved,
}

impl Resolution {
    /// The corrected specifier for this outcome.
    pub fn apply(self, specifier: &str) -> Cow<'_, str> {
        match self {
            Self::AlreadyResolved => Cow::Borrowed(specifier),
            Self::File | Self::Unresolved => Cow::Owned(format!("{specifier}{JS_EXTENSION}")),
            Self::DirectoryIndex => Cow::Owned(format!("{specifier}{}", index_suffix(specifier))),
        }
    }
}

/// Decide how `specifier` must be spelled for the file importing it from
/// `containing_dir`.
///
/// Probes `<specifier>.js` before `<specifier>/index.js`, so a same-named file
/// wins over a directory index. Each call hits the filesystem; nothing is
/// cached between calls.
pub fn resolve(
    containing_dir: &Path,
    specifier: &str,
    policy: ProbePolicy,
) -> io::Result<Resolution> {
    if specifier.ends_with(JS_EXTENSION) {
        return Ok(Resolution::AlreadyResolved);
    }

    let candidate_file = containing_dir.join(format!("{specifier}{JS_EXTENSION}"));
    if is_file(&candidate_file, policy)? {
        return Ok(Resolution::File);
    }

    let candidate_index = containing_dir.join(format!("{specifier}{}", index_suffix(specifier)));
    if is_file(&candidate_index, policy)? {
        return Ok(Resolution::DirectoryIndex);
    }

    Ok(Resolution::Unresolved)
}

/// `"./lib/"` already ends in a separator and takes `index.js` directly.
fn index_suffix(specifier: &str) -> &'static str {
    if specifier.ends_with('/') {
        "index.js"
    } else {
        "/index.js"
    }
}
