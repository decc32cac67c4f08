/*!
# File Analysis

First phase of the per-file traversal. Runs to completion on the unmodified
tree before any renaming, so every decision of the second phase sees the
whole file:

- the local bundling set (names passed to `compact`)
- the component flag (a class in the file extends a component base)
- pinned names (promoted constructor parameters that keep their name)
*/

use std::collections::HashSet;

use super::bundling::LocalBundlingFinder;
use super::rules::RenameRules;
use crate::parser::ast::{Member, Node, SyntaxTree, Visibility};
use crate::parser::visitor::{walk, VisitControl, Visitor};

/// Facts about one file gathered before renaming
#[derive(Debug, Clone, Default)]
pub struct FileAnalysis {
    pub bundled_names: HashSet<String>,
    pub pinned_names: HashSet<String>,
    pub is_component: bool,
}

struct ComponentScan<'r> {
    rules: &'r RenameRules,
    is_component: bool,
    promoted: Vec<(String, Visibility)>,
}

impl<'t, 'r> Visitor<'t> for ComponentScan<'r> {
    fn enter(&mut self, node: &'t Node) -> VisitControl {
        if let Node::ClassLike(class) = node {
            if class
                .extends
                .as_deref()
                .map_or(false, |parent| self.rules.is_component_base(parent))
            {
                self.is_component = true;
            }
            for member in &class.members {
                if let Member::Method(method) = member {
                    if method.is_constructor() {
                        self.promoted.extend(
                            method
                                .promoted_parameters()
                                .into_iter()
                                .map(|p| (p.name, p.visibility)),
                        );
                    }
                }
            }
        }
        VisitControl::Continue
    }
}

impl FileAnalysis {
    pub fn analyze(tree: &SyntaxTree, rules: &RenameRules) -> Self {
        let bundled_names: HashSet<String> = LocalBundlingFinder::find(tree).into_iter().collect();

        let mut scan = ComponentScan {
            rules,
            is_component: false,
            promoted: Vec::new(),
        };
        walk(tree, &mut scan);

        // A promoted parameter is one name for a variable and a property; it
        // is renamed only when both rules allow it.
        let pinned_names = scan
            .promoted
            .iter()
            .filter(|(name, visibility)| {
                !(rules.may_rename_property(name, *visibility, scan.is_component)
                    && rules.may_rename_variable(name)
                    && !bundled_names.contains(name))
            })
            .map(|(name, _)| name.clone())
            .collect();

        Self {
            bundled_names,
            pinned_names,
            is_component: scan.is_component,
        }
    }

    /// Whether a variable of this file must keep its name regardless of the
    /// configured rules.
    pub fn is_exempt_variable(&self, name: &str) -> bool {
        self.bundled_names.contains(name) || self.pinned_names.contains(name)
    }
}
