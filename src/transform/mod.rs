/*!
# Source Transformations

Passes applied to each PHP file between parsing and encoding:

- [`comments`]: comment stripping on the token stream
- [`analysis`]: read-only first phase (bundling set, component flag, pins)
- [`renamer`]: mutating second phase (renaming and `compact` rewriting)
- [`names`]: the run-wide rename map and alias generator
- [`rules`]: exemption rules
*/

pub mod analysis;
pub mod bundling;
pub mod comments;
pub mod names;
pub mod renamer;
pub mod rules;

pub use analysis::FileAnalysis;
pub use bundling::LocalBundlingFinder;
pub use comments::strip_comments;
pub use names::{AliasStyle, RenameMap, CONFUSABLE_CHARACTERS};
pub use renamer::{RenameContext, RenameStats};
pub use rules::RenameRules;
