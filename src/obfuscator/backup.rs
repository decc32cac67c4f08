//! Pre-run backup of the project directories.

use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::configuration::BackupConfig;
use crate::core::{copy_recursive, ObfuscatorError, ObfuscatorResult};

/// `<root>/<prefix><timestamp>`
pub fn backup_directory(root: &Path, config: &BackupConfig, now: DateTime<Local>) -> PathBuf {
    let name = format!("{}{}", config.prefix, now.format(&config.timestamp_format));
    root.join(name)
}

/// Copies every existing backup path into a fresh timestamped directory.
///
/// All or nothing: on failure, or when nothing was copied, the partial
/// directory is removed and [`ObfuscatorError::Backup`] is returned.
pub fn create_backup(root: &Path, config: &BackupConfig) -> ObfuscatorResult<PathBuf> {
    let target = backup_directory(root, config, Local::now());
    if target.exists() {
        return Err(ObfuscatorError::Backup(format!(
            "backup directory already exists: {}",
            target.display()
        )));
    }

    match copy_paths(root, &target, &config.paths) {
        Ok(0) => {
            let _ = fs::remove_dir_all(&target);
            Err(ObfuscatorError::Backup(format!(
                "no files to back up under {}",
                root.display()
            )))
        }
        Ok(copied) => {
            info!("Backed up {} files to {}", copied, target.display());
            Ok(target)
        }
        Err(message) => {
            let _ = fs::remove_dir_all(&target);
            Err(ObfuscatorError::Backup(message))
        }
    }
}

fn copy_paths(root: &Path, target: &Path, paths: &[String]) -> Result<usize, String> {
    fs::create_dir_all(target)
        .map_err(|e| format!("cannot create {}: {}", target.display(), e))?;

    let mut copied = 0;
    for relative in paths {
        let source = root.join(relative);
        if !source.is_dir() {
            debug!("Backup path {} does not exist", source.display());
            continue;
        }
        copied += copy_recursive(&source, &target.join(relative))
            .map_err(|e| format!("cannot copy {}: {}", source.display(), e))?;
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn config(paths: &[&str]) -> BackupConfig {
        BackupConfig {
            paths: paths.iter().map(|p| p.to_string()).collect(),
            ..BackupConfig::default()
        }
    }

    #[test]
    fn test_backup_directory_name() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let dir = backup_directory(Path::new("/project"), &BackupConfig::default(), now);
        assert_eq!(dir, Path::new("/project/BACKUP_20240309140507"));
    }

    #[test]
    fn test_create_backup_copies_existing_paths() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("app/Models")).unwrap();
        fs::write(root.path().join("app/Models/User.php"), "<?php // user").unwrap();
        fs::create_dir_all(root.path().join("routes")).unwrap();
        fs::write(root.path().join("routes/web.php"), "<?php").unwrap();

        let backup = create_backup(root.path(), &config(&["app", "routes", "database"])).unwrap();
        assert!(backup.starts_with(root.path()));
        assert_eq!(
            fs::read_to_string(backup.join("app/Models/User.php")).unwrap(),
            "<?php // user"
        );
        assert!(backup.join("routes/web.php").is_file());
        assert!(!backup.join("database").exists());
    }

    #[test]
    fn test_empty_backup_fails_and_cleans_up() {
        let root = TempDir::new().unwrap();
        let error = create_backup(root.path(), &config(&["app"])).unwrap_err();
        assert!(matches!(error, ObfuscatorError::Backup(_)));
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
