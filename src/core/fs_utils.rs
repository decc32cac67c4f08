//! File system utility helpers (source readers, recursive copy)
use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Read a PHP source file. The byte order mark, if any, is kept: it is
/// output of the script and must survive the transformation.
pub fn read_php_file(path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
}

/// Recursively copy `source` (file or directory) into `destination`.
/// Returns the number of files copied.
pub fn copy_recursive(source: &Path, destination: &Path) -> io::Result<usize> {
    if source.is_file() {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, destination)?;
        return Ok(1);
    }

    let mut copied = 0;
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}
