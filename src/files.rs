//! Capability-scoped file reads.
//!
//! Paths are opened by first acquiring the parent directory with ambient
//! authority and then reading the file relative to it, so every read goes
//! through a `cap-std` directory handle.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use std::io;

fn open_parent(path: &Utf8Path) -> io::Result<(Dir, &str)> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path has no file name: {path}"),
        )
    })?;
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Reads a UTF-8 text file.
///
/// # Errors
///
/// Returns the I/O error from opening the parent directory or reading the
/// file, or [`io::ErrorKind::InvalidInput`] when `path` has no file name.
pub fn read_text(path: &Utf8Path) -> io::Result<String> {
    let (dir, file_name) = open_parent(path)?;
    dir.read_to_string(file_name)
}

/// Reads a file's raw bytes.
///
/// # Errors
///
/// Returns the I/O error from opening the parent directory or reading the
/// file, or [`io::ErrorKind::InvalidInput`] when `path` has no file name.
pub fn read_bytes(path: &Utf8Path) -> io::Result<Vec<u8>> {
    let (dir, file_name) = open_parent(path)?;
    dir.read(file_name)
}
