//! Filesystem helpers shared by the stores.

use std::io::Write;
use std::path::Path;

/// Replaces `path` with `contents` so readers never observe a partial file.
///
/// The data is written to a temporary file in the same directory, flushed
/// to disk, and renamed over the destination. On Unix the temporary file is
/// created with mode `0600`, which the destination inherits.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
