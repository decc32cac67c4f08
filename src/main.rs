/*!
# PHP Obfuscator CLI

Command-line interface for the PHP/Laravel source obfuscator.
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::{style, Term};
use php_obfuscator::cli_common::{
    self, validate_directory, CommonArgs, EventReporter, OutputFormat, OutputWriter, RunArgs,
};
use php_obfuscator::configuration::DEFAULT_CONFIG_FILE;
use php_obfuscator::{decode_envelope, ObfuscatorConfig, ObfuscatorService};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "php-obfuscator",
    version = env!("CARGO_PKG_VERSION"),
    about = "Obfuscates PHP/Laravel sources in place: renaming, comment removal and encrypted eval envelopes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Obfuscate a Laravel project in place
    Run(RunArgs),

    /// Recover the PHP source of an obfuscated file
    Decode {
        /// Obfuscated file
        file: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Expected encryption key; decoding fails if the envelope uses another one
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Write the default configuration file
    InitConfig {
        /// Output file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli_common::init_logging(cli.common.verbose)?;
    let format: OutputFormat = cli.common.format.parse()?;

    match cli.command {
        Commands::Run(args) => run_command(args, format, cli.common.verbose),
        Commands::Decode { file, output, key } => decode_command(file, output, key),
        Commands::InitConfig { output, force } => init_config_command(output, force),
    }
}

fn load_config(root: &Path, config_path: Option<&Path>) -> Result<ObfuscatorConfig> {
    match config_path {
        Some(path) => ObfuscatorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => ObfuscatorConfig::load_or_default(root),
    }
}

fn confirm(term: &Term, root: &Path) -> Result<bool> {
    term.write_line(&format!(
        "{} This rewrites every PHP file under {} in place.",
        style("⚠️").yellow(),
        style(root.display()).bold()
    ))?;
    term.write_str("Continue? [y/N] ")?;
    let answer = term.read_line().context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn run_command(args: RunArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let root = match &args.path {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    validate_directory(&root, "Project root")?;

    let mut config = load_config(&root, args.config.as_deref())?;
    args.apply_overrides(&mut config);
    let show_key = config.output.show_encryption_key;
    let verbose = verbose || config.output.verbose;

    let mut service = ObfuscatorService::new(config).context("Invalid configuration")?;
    let mut writer = match &args.report {
        Some(path) => OutputWriter::file(path, format)
            .with_context(|| format!("Failed to create report {}", path.display()))?,
        None => OutputWriter::stdout(format),
    };

    if args.dry_run {
        let plan = service
            .plan(&root)
            .with_context(|| format!("Failed to scan {}", root.display()))?;
        writer.write_plan(&plan)?;
        return writer.flush();
    }

    let term = Term::stdout();
    if args.needs_confirmation() && !confirm(&term, &root)? {
        cli_common::print_warning("Aborted, nothing was changed");
        return Ok(());
    }

    if format == OutputFormat::Text {
        cli_common::print_header(
            "php-obfuscator",
            env!("CARGO_PKG_VERSION"),
            "Obfuscating PHP sources",
        );
    }

    let mut reporter = if format == OutputFormat::Text {
        EventReporter::new(verbose)?
    } else {
        EventReporter::silent()
    };

    let start = Instant::now();
    let result = service.obfuscate(&root, |event| reporter.handle(event));
    reporter.finish();
    let stats = match result {
        Ok(stats) => stats,
        Err(e) => {
            cli_common::print_error(&format!("Obfuscation failed: {}", e));
            return Err(e).with_context(|| format!("Obfuscation of {} failed", root.display()));
        }
    };
    info!("Run finished in {}", cli_common::format_duration(start.elapsed()));

    writer.write_run_summary(&stats, show_key)?;
    writer.flush()?;

    if format == OutputFormat::Text {
        if stats.parse_failures > 0 {
            cli_common::print_warning(&format!(
                "{} files could not be parsed and were left unchanged",
                stats.parse_failures
            ));
        }
        cli_common::print_success(&format!(
            "Obfuscation completed in {}",
            cli_common::format_duration(start.elapsed())
        ));
        if let Some(report) = &args.report {
            cli_common::print_info(&format!("Summary written to {}", report.display()));
        }
        if show_key {
            cli_common::print_info("Keep the encryption key: it is needed to decode the files");
        }
    }
    Ok(())
}

fn decode_command(file: PathBuf, output: Option<PathBuf>, key: Option<String>) -> Result<()> {
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let decoded = decode_envelope(&content)
        .with_context(|| format!("{} is not an obfuscated file", file.display()))?;

    if let Some(expected) = key {
        if !decoded.key.as_str().eq_ignore_ascii_case(expected.trim()) {
            anyhow::bail!(
                "{} was encrypted with key {}, not {}",
                file.display(),
                decoded.key,
                expected
            );
        }
    }

    let source = decoded.to_source_file();
    match output {
        Some(path) => {
            std::fs::write(&path, source)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            cli_common::print_success(&format!("Decoded source written to {}", path.display()));
        }
        None => print!("{}", source),
    }
    Ok(())
}

fn init_config_command(output: PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }
    ObfuscatorConfig::default().save_to_file(&output)?;

    let term = Term::stdout();
    term.write_line(&format!(
        "✅ Configuration created: {}",
        style(output.display()).green()
    ))?;
    Ok(())
}
