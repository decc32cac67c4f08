/*!
# Obfuscator Configuration

Run settings loaded from `obfuscator.toml` (or a YAML file with the same
keys). Every field has a default, so a partial file or no file at all
yields a usable configuration. The defaults describe a stock Laravel
project.

```toml
paths = ["app", "database", "routes"]
unicode_names = true

[backup]
enabled = true
prefix = "BACKUP_"

[encryption]
method = "xor"
key_length = 16
```
*/

use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{ObfuscatorError, ObfuscatorResult};

/// Default configuration file name looked up in the project root
pub const DEFAULT_CONFIG_FILE: &str = "obfuscator.toml";

/// Payload cipher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionMethod {
    /// Repeating-key XOR followed by base64
    #[default]
    Xor,
}

impl std::fmt::Display for EncryptionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncryptionMethod::Xor => write!(f, "xor"),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObfuscatorConfig {
    /// Directories (relative to the project root) whose `.php` files are obfuscated
    #[serde(default = "default_paths")]
    pub paths: Vec<String>,

    /// A file is skipped when its base name contains any of these substrings
    #[serde(default = "default_excluded_files")]
    pub excluded_files: Vec<String>,

    /// Strip HTML and Blade comments from templates after obfuscation
    #[serde(default = "default_true")]
    pub clean_blade_views: bool,

    #[serde(default = "default_views_path")]
    pub views_path: String,

    /// Confusable Unicode aliases; `false` switches to `_xxxxxxxx` hex aliases
    #[serde(default = "default_true")]
    pub unicode_names: bool,

    #[serde(default = "default_protected_variables")]
    pub protected_variables: Vec<String>,

    #[serde(default = "default_protected_methods")]
    pub protected_methods: Vec<String>,

    #[serde(default = "default_protected_properties")]
    pub protected_properties: Vec<String>,

    /// Parent classes that mark a class as a Livewire-style component
    #[serde(default = "default_component_base_classes")]
    pub component_base_classes: Vec<String>,

    #[serde(default)]
    pub backup: BackupConfig,

    #[serde(default)]
    pub encryption: EncryptionConfig,

    #[serde(default)]
    pub debug_disabling: DebugDisablingConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Backup taken before any file is rewritten
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_backup_prefix")]
    pub prefix: String,

    /// chrono strftime pattern appended to the prefix
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    #[serde(default = "default_backup_paths")]
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptionConfig {
    #[serde(default)]
    pub method: EncryptionMethod,

    /// Number of random key bytes; the key is embedded as their hex text
    #[serde(default = "default_key_length")]
    pub key_length: usize,
}

/// Statements prepended to every envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugDisablingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub disable_error_reporting: bool,

    #[serde(default = "default_true")]
    pub disable_xdebug: bool,

    #[serde(default = "default_true")]
    pub disable_debug_backtrace: bool,

    #[serde(default = "default_true")]
    pub disable_var_dump: bool,

    #[serde(default = "default_true")]
    pub disable_print_r: bool,

    /// Accepted for compatibility; `die` and `exit` cannot be redefined
    #[serde(default = "default_true")]
    pub disable_die_exit: bool,

    #[serde(default = "default_true")]
    pub inject_anti_debug_code: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub verbose: bool,

    /// Emit a progress event every N processed files
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    #[serde(default = "default_true")]
    pub show_encryption_key: bool,
}

fn default_true() -> bool {
    true
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn default_paths() -> Vec<String> {
    strings(&["app", "database", "routes"])
}

fn default_excluded_files() -> Vec<String> {
    strings(&["Kernel.php", "Handler.php", "Helpers.php", "ServiceProvider.php"])
}

fn default_views_path() -> String {
    "resources/views".to_string()
}

fn default_protected_variables() -> Vec<String> {
    strings(&[
        "this", "request", "user", "auth", "session", "_GET", "_POST", "_SERVER", "_ENV",
        "_FILES", "_COOKIE", "_REQUEST",
    ])
}

fn default_protected_methods() -> Vec<String> {
    strings(&[
        "boot",
        "register",
        "handle",
        "mount",
        "hydrate",
        "dehydrate",
        "render",
        "updated",
        "updating",
        "validate",
        "redirect",
        "save",
        "update",
        "create",
        "find",
        "findOrFail",
        "up",
        "down",
        "__construct",
        "__get",
        "__set",
        "__call",
        "__toString",
        "__invoke",
    ])
}

fn default_protected_properties() -> Vec<String> {
    strings(&[
        "middleware",
        "middlewareGroups",
        "middlewareAliases",
        "fillable",
        "guarded",
        "hidden",
        "casts",
        "table",
        "primaryKey",
        "timestamps",
        "listeners",
        "queryString",
        "paginationTheme",
        "rules",
        "dates",
        "appends",
        "with",
        "perPage",
    ])
}

fn default_component_base_classes() -> Vec<String> {
    strings(&["Component", "Livewire\\Component"])
}

fn default_backup_prefix() -> String {
    "BACKUP_".to_string()
}

fn default_timestamp_format() -> String {
    "%Y%m%d%H%M%S".to_string()
}

fn default_backup_paths() -> Vec<String> {
    strings(&["app", "database", "routes", "resources"])
}

fn default_key_length() -> usize {
    16
}

fn default_progress_interval() -> usize {
    20
}

impl Default for ObfuscatorConfig {
    fn default() -> Self {
        Self {
            paths: default_paths(),
            excluded_files: default_excluded_files(),
            clean_blade_views: true,
            views_path: default_views_path(),
            unicode_names: true,
            protected_variables: default_protected_variables(),
            protected_methods: default_protected_methods(),
            protected_properties: default_protected_properties(),
            component_base_classes: default_component_base_classes(),
            backup: BackupConfig::default(),
            encryption: EncryptionConfig::default(),
            debug_disabling: DebugDisablingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: default_backup_prefix(),
            timestamp_format: default_timestamp_format(),
            paths: default_backup_paths(),
        }
    }
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            method: EncryptionMethod::default(),
            key_length: default_key_length(),
        }
    }
}

impl Default for DebugDisablingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            disable_error_reporting: true,
            disable_xdebug: true,
            disable_debug_backtrace: true,
            disable_var_dump: true,
            disable_print_r: true,
            disable_die_exit: true,
            inject_anti_debug_code: true,
        }
    }
}

impl DebugDisablingConfig {
    /// Everything off; envelopes get no preamble
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verbose: true,
            progress_interval: default_progress_interval(),
            show_encryption_key: true,
        }
    }
}

impl ObfuscatorConfig {
    /// Load configuration from a TOML or YAML file (chosen by extension)
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            return Self::load_from_yaml(path);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from YAML file
    pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load `obfuscator.toml` from the project root, or the defaults when absent
    pub fn load_or_default<P: AsRef<Path>>(root: P) -> Result<Self> {
        let candidate = root.as_ref().join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load_from_file(candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(path.as_ref(), content).with_context(|| {
            format!("Failed to write config file: {}", path.as_ref().display())
        })?;

        Ok(())
    }

    /// Check settings that serde cannot express
    pub fn validate(&self) -> ObfuscatorResult<()> {
        if self.paths.is_empty() {
            return Err(ObfuscatorError::Configuration(
                "at least one obfuscation path is required".to_string(),
            ));
        }

        if self.encryption.key_length == 0 {
            return Err(ObfuscatorError::Configuration(
                "encryption.key_length must be greater than 0".to_string(),
            ));
        }

        if self.output.progress_interval == 0 {
            return Err(ObfuscatorError::Configuration(
                "output.progress_interval must be greater than 0".to_string(),
            ));
        }

        if self.backup.enabled {
            if self.backup.prefix.trim().is_empty() {
                return Err(ObfuscatorError::Configuration(
                    "backup.prefix must not be empty".to_string(),
                ));
            }
            let invalid_format = StrftimeItems::new(&self.backup.timestamp_format)
                .any(|item| matches!(item, Item::Error));
            if invalid_format {
                return Err(ObfuscatorError::Configuration(format!(
                    "backup.timestamp_format is not a valid strftime pattern: {}",
                    self.backup.timestamp_format
                )));
            }
        }

        Ok(())
    }
}
