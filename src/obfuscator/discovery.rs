//! Candidate discovery, exclusion and dry-run planning.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::core::{ObfuscatorError, ObfuscatorResult};

/// Whether the file's base name contains one of the excluded substrings.
pub fn is_excluded(path: &Path, patterns: &[String]) -> bool {
    excluding_pattern(path, patterns).is_some()
}

pub fn excluding_pattern<'p>(path: &Path, patterns: &'p [String]) -> Option<&'p str> {
    let base_name = path.file_name()?.to_string_lossy();
    patterns
        .iter()
        .find(|pattern| !pattern.is_empty() && base_name.contains(pattern.as_str()))
        .map(String::as_str)
}

fn is_php_file(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "php")
}

/// `.php` files under each configured directory, recursively, sorted by
/// name within each directory. Missing directories are ignored.
pub fn discover_php_files(root: &Path, paths: &[String]) -> ObfuscatorResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for relative in paths {
        let dir = root.join(relative);
        if !dir.is_dir() {
            debug!("Skipping missing directory {}", dir.display());
            continue;
        }

        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir.as_path()).to_path_buf();
                ObfuscatorError::io(&path, io::Error::from(e))
            })?;
            if entry.file_type().is_file() && is_php_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

/// What a run would do with one candidate file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannedAction {
    Obfuscate,
    Skip { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedFile {
    pub path: PathBuf,
    pub action: PlannedAction,
}

/// Dry-run result: nothing on disk is touched to build it
#[derive(Debug, Clone, Default, Serialize)]
pub struct ObfuscationPlan {
    pub files: Vec<PlannedFile>,
    pub backup_path: Option<PathBuf>,
    pub views: Vec<PathBuf>,
}

impl ObfuscationPlan {
    pub fn to_obfuscate(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .filter(|f| f.action == PlannedAction::Obfuscate)
            .map(|f| f.path.as_path())
    }

    pub fn obfuscate_count(&self) -> usize {
        self.to_obfuscate().count()
    }

    pub fn skip_count(&self) -> usize {
        self.files.len() - self.obfuscate_count()
    }
}

/// Classifies every candidate file.
pub fn plan_files(files: Vec<PathBuf>, patterns: &[String]) -> Vec<PlannedFile> {
    files
        .into_iter()
        .map(|path| {
            let action = match excluding_pattern(&path, patterns) {
                Some(pattern) => PlannedAction::Skip {
                    reason: format!("excluded by pattern '{}'", pattern),
                },
                None => PlannedAction::Obfuscate,
            };
            PlannedFile { path, action }
        })
        .collect()
}
