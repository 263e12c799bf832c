//! Atomic file replacement
//!
//! Every file weighbill writes (the formula store, suggestion lists, the
//! session and exported workbooks) goes through [`atomic_write`]: the data
//! is written to a temp file in the destination directory, synced, and then
//! renamed over the destination. A failed write leaves the old file alone.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Parent directory of `path`, or `.` for a bare file name
pub fn parent_dir_or_dot(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Write `dest` atomically, creating its parent directories if needed
///
/// If `write_fn` fails, the destination is left untouched and the temp file
/// is removed.
pub fn atomic_write<T, E>(
    dest: impl AsRef<Path>,
    write_fn: impl FnOnce(&mut File) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<io::Error>,
{
    let dest = dest.as_ref();
    let dir = parent_dir_or_dot(dest);
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    let out = write_fn(tmp.as_file_mut())?;

    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;

    Ok(out)
}
