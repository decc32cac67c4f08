/*!
# Obfuscation Service

Runs the whole pipeline over a project:

1. backup (optional, before anything is modified)
2. discovery of `.php` files under the configured paths, minus exclusions
3. per file: strip comments, parse, analyse, rename, print, encode, overwrite
4. Blade view cleaning (optional)

The rename map and the encryption key live as long as the service, so every
file of a run shares the same aliases and key.

```rust,no_run
use php_obfuscator::{ObfuscatorConfig, ObfuscatorService};
use std::path::Path;

let mut service = ObfuscatorService::new(ObfuscatorConfig::default())?;
let stats = service.obfuscate(Path::new("/var/www/app"), |event| println!("{}", event))?;
println!("{} files, key {}", stats.files_processed, stats.encryption_key);
# Ok::<(), php_obfuscator::ObfuscatorError>(())
```
*/

pub mod backup;
pub mod discovery;
pub mod stats;
pub mod views;

pub use backup::create_backup;
pub use discovery::{discover_php_files, is_excluded, ObfuscationPlan, PlannedAction, PlannedFile};
pub use stats::{ObfuscationEvent, RunStatistics};
pub use views::{clean_views, strip_blade_comments};

use chrono::Local;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::configuration::ObfuscatorConfig;
use crate::core::{read_php_file, ObfuscatorError, ObfuscatorResult, ParseError, Position};
use crate::envelope::{EncryptionKey, EnvelopeEncoder};
use crate::parser::printer::print_tree;
use crate::parser::PhpParser;
use crate::transform::{strip_comments, AliasStyle, RenameContext, RenameMap, RenameRules, RenameStats};

/// Pipeline over one project, owning the run-wide state
pub struct ObfuscatorService {
    config: ObfuscatorConfig,
    parser: PhpParser,
    rules: RenameRules,
    rename_map: RenameMap,
    encoder: EnvelopeEncoder,
}

impl ObfuscatorService {
    /// Validates the configuration and generates the run key.
    pub fn new(config: ObfuscatorConfig) -> ObfuscatorResult<Self> {
        let map = RenameMap::new(AliasStyle::from_unicode_flag(config.unicode_names));
        Self::with_rename_map(config, map)
    }

    /// Same as [`ObfuscatorService::new`] with a caller-supplied map, e.g. a
    /// seeded one for reproducible aliases.
    pub fn with_rename_map(config: ObfuscatorConfig, rename_map: RenameMap) -> ObfuscatorResult<Self> {
        config.validate()?;
        let key = EncryptionKey::generate(config.encryption.key_length);
        let encoder = EnvelopeEncoder::new(key, &config.debug_disabling);
        Ok(Self {
            rules: RenameRules::from_config(&config),
            parser: PhpParser::new(),
            rename_map,
            encoder,
            config,
        })
    }

    pub fn config(&self) -> &ObfuscatorConfig {
        &self.config
    }

    pub fn encryption_key(&self) -> &EncryptionKey {
        self.encoder.key()
    }

    pub fn rename_map(&self) -> &RenameMap {
        &self.rename_map
    }

    /// Strip, parse, rename and print one source text, without encoding.
    /// The rename map is only touched when the text parses.
    pub fn transform_code(&mut self, source: &str) -> Result<(String, RenameStats), ParseError> {
        let stripped = strip_comments(source)?;
        let mut tree = self.parser.parse_text(&stripped)?;
        let stats = RenameContext::new(&mut self.rename_map, &self.rules).rename_file(&mut tree);
        Ok((print_tree(&tree), stats))
    }

    /// Full per-file transformation: [`Self::transform_code`] then the envelope.
    pub fn obfuscate_code(&mut self, source: &str) -> Result<String, ParseError> {
        let (printed, _) = self.transform_code(source)?;
        Ok(self.encoder.encode(&printed))
    }

    /// Dry run: what [`Self::obfuscate`] would touch under `root`.
    pub fn plan(&self, root: &Path) -> ObfuscatorResult<ObfuscationPlan> {
        let files = discover_php_files(root, &self.config.paths)?;
        let backup_path = self
            .config
            .backup
            .enabled
            .then(|| backup::backup_directory(root, &self.config.backup, Local::now()));
        let views = if self.config.clean_blade_views {
            views::find_blade_views(&root.join(&self.config.views_path))?
        } else {
            Vec::new()
        };
        Ok(ObfuscationPlan {
            files: discovery::plan_files(files, &self.config.excluded_files),
            backup_path,
            views,
        })
    }

    /// Obfuscates the project under `root` in place.
    ///
    /// Files that fail to parse are left untouched and counted as skipped;
    /// any I/O or backup error aborts the run.
    pub fn obfuscate<F>(&mut self, root: &Path, mut on_event: F) -> ObfuscatorResult<RunStatistics>
    where
        F: FnMut(&ObfuscationEvent),
    {
        let mut stats = RunStatistics {
            encryption_key: self.encryption_key().to_string(),
            ..RunStatistics::default()
        };

        if self.config.backup.enabled {
            let backup_path = create_backup(root, &self.config.backup)?;
            on_event(&ObfuscationEvent::Backup(backup_path.clone()));
            stats.backup_path = Some(backup_path);
        }

        let planned = discovery::plan_files(
            discover_php_files(root, &self.config.paths)?,
            &self.config.excluded_files,
        );
        info!("Found {} PHP files", planned.len());

        for file in planned {
            if let PlannedAction::Skip { reason } = file.action {
                debug!("Skipping {}: {}", file.path.display(), reason);
                stats.files_skipped += 1;
                on_event(&ObfuscationEvent::Skip {
                    path: file.path,
                    reason,
                });
                continue;
            }

            match self.obfuscate_file(&file.path) {
                Ok(renames) => {
                    stats.files_processed += 1;
                    stats.renames += renames;
                    if stats.files_processed % self.config.output.progress_interval == 0 {
                        on_event(&ObfuscationEvent::Progress(stats.files_processed));
                    }
                }
                Err(error) if !error.is_fatal() => {
                    warn!("{}; file left unchanged", error);
                    stats.files_skipped += 1;
                    stats.parse_failures += 1;
                    on_event(&ObfuscationEvent::Skip {
                        path: file.path,
                        reason: error.to_string(),
                    });
                }
                Err(error) => return Err(error),
            }
        }

        if self.config.clean_blade_views {
            stats.views_cleaned = clean_views(&root.join(&self.config.views_path))?;
            on_event(&ObfuscationEvent::Views(stats.views_cleaned));
        }

        stats.variables_obfuscated = self.rename_map.len();
        info!(
            "Obfuscated {} files, skipped {}, {} names renamed",
            stats.files_processed, stats.files_skipped, stats.variables_obfuscated
        );
        Ok(stats)
    }

    fn obfuscate_file(&mut self, path: &Path) -> ObfuscatorResult<RenameStats> {
        let bytes = read_php_file(path).map_err(|e| ObfuscatorError::io(path, e))?;
        let source = String::from_utf8(bytes).map_err(|_| {
            ObfuscatorError::parse(
                path,
                ParseError::lexical(Position::start(), "source is not valid UTF-8"),
            )
        })?;

        let (printed, renames) = self
            .transform_code(&source)
            .map_err(|e| ObfuscatorError::parse(path, e))?;
        let envelope = self.encoder.encode(&printed);

        fs::write(path, envelope).map_err(|e| ObfuscatorError::io(path, e))?;
        debug!(
            "Obfuscated {} ({} variables, {} methods, {} properties)",
            path.display(),
            renames.variables,
            renames.methods,
            renames.properties
        );
        Ok(renames)
    }
}
