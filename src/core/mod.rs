/*!
# Core Module

Core functionality shared by the obfuscator: error taxonomy, source
positions and file system helpers.
*/

pub mod errors;
pub mod fs_utils;
pub mod position;

pub use errors::{ObfuscatorError, ObfuscatorResult, ParseError};
pub use fs_utils::{copy_recursive, read_php_file};
pub use position::{Position, Span};
