//! Comment removal for Blade templates. Views are handled as raw bytes, so
//! templates in legacy encodings are cleaned like any other.

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::core::{ObfuscatorError, ObfuscatorResult};

pub const BLADE_MARKER: &str = ".blade.php";

static HTML_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s-u)<!--.*?-->").unwrap());

static BLADE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s-u)\{\{--.*?--\}\}").unwrap());

/// Removes `<!-- -->` and then `{{-- --}}` comments.
pub fn strip_blade_comments(content: &[u8]) -> Vec<u8> {
    let without_html = HTML_COMMENT.replace_all(content, &b""[..]);
    BLADE_COMMENT.replace_all(&without_html, &b""[..]).into_owned()
}

/// Files under `dir` whose path contains `.blade.php`, sorted.
pub fn find_blade_views(dir: &Path) -> ObfuscatorResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        debug!("Views directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let mut views = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            ObfuscatorError::io(&path, io::Error::from(e))
        })?;
        if entry.file_type().is_file() && entry.path().to_string_lossy().contains(BLADE_MARKER) {
            views.push(entry.into_path());
        }
    }
    Ok(views)
}

/// Cleans every view under `dir`; returns the number of views processed.
pub fn clean_views(dir: &Path) -> ObfuscatorResult<usize> {
    let views = find_blade_views(dir)?;
    for view in &views {
        let content = fs::read(view).map_err(|e| ObfuscatorError::io(view, e))?;
        let cleaned = strip_blade_comments(&content);
        if cleaned != content {
            fs::write(view, cleaned).map_err(|e| ObfuscatorError::io(view, e))?;
        }
        debug!("Cleaned view {}", view.display());
    }
    Ok(views.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn strip(view: &str) -> String {
        String::from_utf8(strip_blade_comments(view.as_bytes())).unwrap()
    }

    #[test]
    fn test_strip_blade_comments() {
        let view = "<div><!-- html\nmultiline --><p>{{ $name }}</p>{{-- blade --}}</div>";
        assert_eq!(strip(view), "<div><p>{{ $name }}</p></div>");
    }

    #[test]
    fn test_strip_is_non_greedy() {
        assert_eq!(strip("a<!--1-->b<!--2-->c"), "abc");
        assert_eq!(strip("{{-- x --}}{{ $y }}{{-- z --}}"), "{{ $y }}");
    }

    #[test]
    fn test_strip_keeps_multibyte_text() {
        assert_eq!(strip("<p>café</p><!-- é -->"), "<p>café</p>");
    }

    #[test]
    fn test_clean_views_handles_legacy_encoding() {
        let dir = TempDir::new().unwrap();
        let view = dir.path().join("menu.blade.php");
        fs::write(&view, b"<p>caf\xe9</p>{{-- x \xe9 --}}").unwrap();

        assert_eq!(clean_views(dir.path()).unwrap(), 1);
        assert_eq!(fs::read(&view).unwrap(), b"<p>caf\xe9</p>".to_vec());
    }

    #[test]
    fn test_clean_views_counts_blade_files_only() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("layouts")).unwrap();
        fs::write(dir.path().join("welcome.blade.php"), "<h1>{{-- t --}}Hi</h1>").unwrap();
        fs::write(dir.path().join("layouts/app.blade.php"), "<html></html>").unwrap();
        fs::write(dir.path().join("plain.php"), "<!-- keep -->").unwrap();

        assert_eq!(clean_views(dir.path()).unwrap(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("welcome.blade.php")).unwrap(),
            "<h1>Hi</h1>"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("plain.php")).unwrap(),
            "<!-- keep -->"
        );
    }

    #[test]
    fn test_missing_views_directory() {
        let dir = TempDir::new().unwrap();
        assert_eq!(clean_views(&dir.path().join("nope")).unwrap(), 0);
    }
}
