/*!
# PHP Obfuscator

Source obfuscator for PHP/Laravel projects. Rewrites every `.php` file of a
project in place so it still runs but is hard to read:

- comments are removed
- local variables, private/protected methods and private properties get
  confusable Unicode (or hex) aliases, consistent across the whole run
- `compact('a', 'b')` is rewritten into `['a' => $a, 'b' => $b]`
- the result is XOR-encrypted with a per-run key and wrapped in a
  self-decoding `eval` stub, optionally preceded by debug-disabling code

Laravel and Livewire conventions (lifecycle hooks, `$fillable` and friends,
public component properties, magic methods) are protected.

## Architecture

```text
PHP Obfuscator
├── Parser        - logos lexer, delimiter-tree grammar, lossless printer
├── Transform     - comment stripping, analysis, renaming, compact() rewrite
├── Envelope      - XOR + base64 self-decoding stub, decoder
├── Obfuscator    - backup, discovery, per-file pipeline, Blade cleaning
├── Configuration - obfuscator.toml / YAML with Laravel defaults
└── CLI           - run, decode, init-config
```

## Usage

### CLI
```bash
# Preview
php-obfuscator run --path ./my-app --dry-run

# Obfuscate (creates BACKUP_<timestamp> first)
php-obfuscator run --path ./my-app --yes

# Inspect an obfuscated file
php-obfuscator decode ./my-app/app/Models/User.php

# Write the default configuration
php-obfuscator init-config --output obfuscator.toml
```

### Library
```rust
use php_obfuscator::{ObfuscatorConfig, ObfuscatorService, decode_envelope};

let mut service = ObfuscatorService::new(ObfuscatorConfig::default())?;
let envelope = service.obfuscate_code("<?php $greeting = 'hi'; echo $greeting;").unwrap();
let decoded = decode_envelope(&envelope)?;
assert!(!decoded.body.contains("$greeting"));
# Ok::<(), php_obfuscator::ObfuscatorError>(())
```
*/

pub mod cli_common;
pub mod configuration;
pub mod core;
pub mod envelope;
pub mod obfuscator;
pub mod parser;
pub mod transform;

// Re-export main types for convenience
pub use configuration::{
    BackupConfig, DebugDisablingConfig, EncryptionConfig, EncryptionMethod, ObfuscatorConfig,
    OutputConfig,
};
pub use core::{ObfuscatorError, ObfuscatorResult, ParseError, Position};
pub use envelope::{decode_envelope, DecodedEnvelope, EncryptionKey, EnvelopeEncoder};
pub use obfuscator::{ObfuscationEvent, ObfuscationPlan, ObfuscatorService, RunStatistics};
pub use parser::{PhpLexer, PhpParser, SyntaxTree};
pub use transform::{strip_comments, RenameMap, RenameRules, RenameStats};

use anyhow::{Context, Result};
use std::path::Path;

/// Obfuscate a project with `obfuscator.toml` from its root (or the defaults)
pub fn obfuscate_project<P: AsRef<Path>>(root: P) -> Result<RunStatistics> {
    let root = root.as_ref();
    let config = ObfuscatorConfig::load_or_default(root)?;
    let mut service = ObfuscatorService::new(config)?;
    let stats = service
        .obfuscate(root, |_| {})
        .with_context(|| format!("Obfuscation of {} failed", root.display()))?;
    Ok(stats)
}

/// Recover the PHP source of an obfuscated file
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let decoded = decode_envelope(&content)
        .with_context(|| format!("{} is not an obfuscated file", path.display()))?;
    Ok(decoded.to_source_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_functionality() {
        let parser = PhpParser::new();
        assert!(parser.parse_text("").is_ok());
    }

    #[test]
    fn test_obfuscate_project_and_decode_file() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("app")).unwrap();
        std::fs::write(
            root.path().join("obfuscator.toml"),
            "[backup]\nenabled = false\n",
        )
        .unwrap();
        let file = root.path().join("app/index.php");
        std::fs::write(&file, "<?php\necho 'hello';\n").unwrap();

        let stats = obfuscate_project(root.path()).unwrap();
        assert_eq!(stats.files_processed, 1);
        assert!(stats.backup_path.is_none());
        assert_eq!(decode_file(&file).unwrap(), "<?php\necho 'hello';\n");
    }
}
