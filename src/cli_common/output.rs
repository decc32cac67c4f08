//! Модуль для форматирования и вывода результатов

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use crate::obfuscator::{ObfuscationPlan, PlannedAction, RunStatistics};

/// Формат вывода результатов
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow::anyhow!("Unknown output format: {}", s)),
        }
    }
}

/// Writer для вывода результатов
pub struct OutputWriter {
    writer: Box<dyn Write>,
    format: OutputFormat,
}

impl OutputWriter {
    /// Создает writer для stdout
    pub fn stdout(format: OutputFormat) -> Self {
        Self::from_writer(Box::new(io::stdout()), format)
    }

    /// Создает writer для файла
    pub fn file(path: &Path, format: OutputFormat) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(Box::new(file), format))
    }

    pub fn from_writer(writer: Box<dyn Write>, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    /// Записывает сериализуемый объект (pretty JSON)
    pub fn write_object<T: Serialize>(&mut self, obj: &T) -> Result<()> {
        writeln!(self.writer, "{}", serde_json::to_string_pretty(obj)?)?;
        Ok(())
    }

    /// Записывает заголовок
    pub fn write_header(&mut self, header: &str) -> Result<()> {
        writeln!(self.writer, "\n{}", header.bold().blue())?;
        writeln!(self.writer, "{}", "=".repeat(header.chars().count()).blue())?;
        Ok(())
    }

    /// Записывает таблицу из двух колонок
    pub fn write_table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        // Вычисляем ширину колонок
        let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        for (i, header) in headers.iter().enumerate() {
            if i > 0 {
                write!(self.writer, " │ ")?;
            }
            write!(self.writer, "{}", pad(header, widths[i]).bold())?;
        }
        writeln!(self.writer)?;

        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                write!(self.writer, "─┼─")?;
            }
            write!(self.writer, "{}", "─".repeat(*width))?;
        }
        writeln!(self.writer)?;

        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(self.writer, " │ ")?;
                }
                match widths.get(i) {
                    Some(width) => write!(self.writer, "{}", pad(cell, *width))?,
                    None => write!(self.writer, "{}", cell)?,
                }
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    /// Итоги запуска: таблица для text, объект для json
    pub fn write_run_summary(&mut self, stats: &RunStatistics, show_key: bool) -> Result<()> {
        if self.format == OutputFormat::Json {
            if show_key {
                return self.write_object(stats);
            }
            let mut redacted = stats.clone();
            redacted.encryption_key.clear();
            return self.write_object(&redacted);
        }

        self.write_header("Obfuscation summary")?;
        let mut rows = vec![
            row("Files obfuscated", stats.files_processed),
            row("Files skipped", stats.files_skipped),
            row("Parse failures", stats.parse_failures),
            row("Views cleaned", stats.views_cleaned),
            row("Names obfuscated", stats.variables_obfuscated),
            row("Variable sites", stats.renames.variables),
            row("Method sites", stats.renames.methods),
            row("Property sites", stats.renames.properties),
            row("compact() rewritten", stats.renames.bundles_rewritten),
        ];
        if let Some(backup) = &stats.backup_path {
            rows.push(vec!["Backup".to_string(), backup.display().to_string()]);
        }
        self.write_table(&["Metric", "Value"], rows)?;

        if show_key {
            writeln!(
                self.writer,
                "\n{} {}",
                "Encryption key:".bold(),
                stats.encryption_key.yellow()
            )?;
        }
        Ok(())
    }

    /// Результат dry-run
    pub fn write_plan(&mut self, plan: &ObfuscationPlan) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.write_object(plan);
        }

        self.write_header("Dry run")?;
        for file in &plan.files {
            match &file.action {
                PlannedAction::Obfuscate => {
                    writeln!(self.writer, "  {} {}", "obfuscate".green(), file.path.display())?
                }
                PlannedAction::Skip { reason } => writeln!(
                    self.writer,
                    "  {} {} ({})",
                    "skip".yellow(),
                    file.path.display(),
                    reason.dimmed()
                )?,
            }
        }
        writeln!(
            self.writer,
            "\n{} to obfuscate, {} to skip, {} views to clean",
            plan.obfuscate_count(),
            plan.skip_count(),
            plan.views.len()
        )?;
        if let Some(backup) = &plan.backup_path {
            writeln!(self.writer, "Backup would be written to {}", backup.display())?;
        }
        Ok(())
    }

    /// Завершает запись и сбрасывает буфер
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

fn row(label: &str, value: usize) -> Vec<String> {
    vec![label.to_string(), value.to_string()]
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn render(format: OutputFormat, write: impl FnOnce(&mut OutputWriter)) -> String {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        {
            let mut writer = OutputWriter::file(&path, format).unwrap();
            write(&mut writer);
            writer.flush().unwrap();
        }
        std::fs::read_to_string(path).unwrap()
    }

    fn stats() -> RunStatistics {
        RunStatistics {
            files_processed: 7,
            files_skipped: 2,
            encryption_key: "abcd".to_string(),
            backup_path: Some(PathBuf::from("BACKUP_1")),
            ..RunStatistics::default()
        }
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("txt".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_text_summary() {
        let text = render(OutputFormat::Text, |w| w.write_run_summary(&stats(), true).unwrap());
        assert!(text
            .lines()
            .any(|l| l.starts_with("Files obfuscated") && l.trim_end().ends_with("│ 7")));
        assert!(text.contains("BACKUP_1"));
        assert!(text.contains("Encryption key: abcd"));
    }

    #[test]
    fn test_json_summary_hides_key() {
        let json = render(OutputFormat::Json, |w| w.write_run_summary(&stats(), false).unwrap());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["files_processed"], 7);
        assert_eq!(value["encryption_key"], "");
    }
}
