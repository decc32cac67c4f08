//! Аргументы командной строки php-obfuscator

use clap::Args;
use std::path::PathBuf;

use crate::configuration::ObfuscatorConfig;

/// Общие аргументы для всех команд
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text", global = true)]
    pub format: String,
}

/// Аргументы команды `run`
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Project root (current directory if not specified)
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Configuration file (obfuscator.toml in the project root if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Show what would be obfuscated without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Do not create a backup before obfuscating
    #[arg(long)]
    pub no_backup: bool,

    /// Do not strip comments from Blade views
    #[arg(long)]
    pub no_views: bool,

    /// Do not inject debug disabling code into the envelopes
    #[arg(long)]
    pub no_debug_disable: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Write the summary (or the dry-run plan) to this file instead of stdout
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl RunArgs {
    /// Применяет флаги командной строки поверх загруженной конфигурации
    pub fn apply_overrides(&self, config: &mut ObfuscatorConfig) {
        if self.no_backup {
            config.backup.enabled = false;
        }
        if self.no_views {
            config.clean_blade_views = false;
        }
        if self.no_debug_disable {
            config.debug_disabling.enabled = false;
        }
    }

    /// Нужно ли спрашивать подтверждение перед запуском
    pub fn needs_confirmation(&self) -> bool {
        !self.yes && !self.dry_run
    }
}
