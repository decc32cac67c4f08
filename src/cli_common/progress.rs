//! Модуль для отображения хода обфускации

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::obfuscator::ObfuscationEvent;

/// Отображает события сервиса обфускации
pub struct EventReporter {
    spinner: Option<ProgressBar>,
    verbose: bool,
    skipped: usize,
}

impl EventReporter {
    /// Создает репортер со спиннером (для текстового вывода)
    pub fn new(verbose: bool) -> Result<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .context("Failed to set progress style")?,
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("Obfuscating...");
        Ok(Self {
            spinner: Some(spinner),
            verbose,
            skipped: 0,
        })
    }

    /// Репортер без вывода (для JSON)
    pub fn silent() -> Self {
        Self {
            spinner: None,
            verbose: false,
            skipped: 0,
        }
    }

    /// Количество пропущенных файлов, о которых сообщил сервис
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn handle(&mut self, event: &ObfuscationEvent) {
        match event {
            ObfuscationEvent::Backup(path) => {
                self.println(format!("💾 Backup created: {}", path.display()));
            }
            ObfuscationEvent::Skip { path, reason } => {
                self.skipped += 1;
                if self.verbose {
                    self.println(format!(
                        "{} {} ({})",
                        "skip".yellow(),
                        path.display(),
                        reason.dimmed()
                    ));
                }
            }
            ObfuscationEvent::Progress(count) => {
                if let Some(spinner) = &self.spinner {
                    spinner.set_message(format!("{} files obfuscated...", count));
                }
            }
            ObfuscationEvent::Views(count) => {
                self.println(format!("🧹 {} Blade views cleaned", count));
            }
        }
    }

    /// Убирает спиннер перед выводом итогов
    pub fn finish(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }
    }

    fn println(&self, line: String) {
        if let Some(spinner) = &self.spinner {
            spinner.println(line);
        }
    }
}
