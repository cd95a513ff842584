// SPDX-License-Identifier: MPL-2.0
//! Writing diagnostic reports to disk.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes `content` to `path` through a sibling temporary file and a rename,
/// so readers never observe a partial report.
///
/// # Errors
///
/// Returns an error if writing or renaming fails. The temporary file is
/// removed on rename failure.
pub fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let temp_path = temp_path_for(path);
    fs::write(&temp_path, content)?;

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("report"));
    name.push(".tmp");
    path.with_file_name(name)
}
