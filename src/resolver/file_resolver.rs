use std::io;
use std::path::Path;

/// How filesystem errors other than "not found" are treated while probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbePolicy {
    /// Any failure counts as "does not exist".
    #[default]
    Lenient,
    /// Permission and other hard I/O errors are returned to the caller.
    Strict,
}

/// Returns `Ok(true)` if `path` names an existing regular file.
///
/// Missing paths, and paths running through a non-directory component, are
/// absent under either policy.
///
/// The probe is a blocking `std::fs::metadata` call. It runs inline in the
/// sequential per-file loop of [`crate::rewrite::rewrite_tree`] on the
/// current-thread runtime, so only one probe is ever in flight.
pub fn is_file(path: &Path, policy: ProbePolicy) -> io::Result<bool> {
    match std::fs::metadata(path) {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(err) if is_absent(&err) => Ok(false),
        Err(err) => match policy {
            ProbePolicy::Lenient => Ok(false),
            ProbePolicy::Strict => Err(err),
        },
    }
}

fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}
