/*!
Test for BOM handling in PHP files
*/

use php_obfuscator::core::read_php_file;
use php_obfuscator::transform::AliasStyle;
use php_obfuscator::{
    decode_envelope, BackupConfig, DebugDisablingConfig, ObfuscatorConfig, ObfuscatorService,
    PhpParser, RenameMap,
};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_file_reading_keeps_bom() -> std::io::Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(&[0xEF, 0xBB, 0xBF])?;
    temp_file.write_all(b"<?php echo 1;")?;

    let bytes = read_php_file(temp_file.path())?;
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
    assert_eq!(&bytes[3..], b"<?php echo 1;");

    Ok(())
}

#[test]
fn test_bom_is_inline_output() {
    let source = "\u{FEFF}<?php $a = 1;";
    let tree = PhpParser::new().parse_text(source).unwrap();
    assert_eq!(php_obfuscator::parser::printer::print_tree(&tree), source);
}

#[test]
fn test_bom_file_round_trips_through_envelope() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(root.path().join("app")).unwrap();
    let file = root.path().join("app/bom.php");
    std::fs::write(&file, "\u{FEFF}<?php\necho 'x';\n").unwrap();

    let config = ObfuscatorConfig {
        backup: BackupConfig {
            enabled: false,
            ..Default::default()
        },
        debug_disabling: DebugDisablingConfig::disabled(),
        ..ObfuscatorConfig::default()
    };
    let mut service =
        ObfuscatorService::with_rename_map(config, RenameMap::with_seed(AliasStyle::Hex, 1))
            .unwrap();
    let stats = service.obfuscate(root.path(), |_| {}).unwrap();
    assert_eq!(stats.files_processed, 1);

    let envelope = std::fs::read_to_string(&file).unwrap();
    assert!(envelope.starts_with("<?php "));
    let decoded = decode_envelope(&envelope).unwrap();
    // Text before the open tag is emitted by leaving PHP mode first
    assert_eq!(decoded.body, "?>\u{FEFF}<?php\necho 'x';\n");
    assert_eq!(decoded.to_source_file(), "\u{FEFF}<?php\necho 'x';\n");
}
