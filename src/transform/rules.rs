/*!
# Rename Rules

Decides whether a variable, method or property may be renamed. Combines the
configured exemption lists with the names the engine or the framework
resolves at runtime.
*/

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::configuration::ObfuscatorConfig;
use crate::parser::ast::Visibility;

/// Component lifecycle hooks (`updatedFoo`) are dispatched by name.
static LIFECYCLE_HOOK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^updated[A-Z]").expect("lifecycle hook pattern is valid"));

/// Variables the engine defines or reads by name.
static RESERVED_VARIABLES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "this",
        "GLOBALS",
        "_SERVER",
        "_GET",
        "_POST",
        "_FILES",
        "_COOKIE",
        "_SESSION",
        "_REQUEST",
        "_ENV",
        "http_response_header",
        "argc",
        "argv",
        "php_errormsg",
    ]
    .into_iter()
    .collect()
});

/// Exemption rules for one run
#[derive(Debug, Clone, Default)]
pub struct RenameRules {
    protected_variables: HashSet<String>,
    protected_methods: HashSet<String>,
    protected_properties: HashSet<String>,
    component_bases: Vec<String>,
}

impl RenameRules {
    pub fn new(
        protected_variables: impl IntoIterator<Item = String>,
        protected_methods: impl IntoIterator<Item = String>,
        protected_properties: impl IntoIterator<Item = String>,
        component_bases: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            protected_variables: protected_variables.into_iter().collect(),
            protected_methods: protected_methods.into_iter().collect(),
            protected_properties: protected_properties.into_iter().collect(),
            component_bases: component_bases
                .into_iter()
                .map(|base| base.trim_start_matches('\\').to_string())
                .collect(),
        }
    }

    pub fn from_config(config: &ObfuscatorConfig) -> Self {
        Self::new(
            config.protected_variables.iter().cloned(),
            config.protected_methods.iter().cloned(),
            config.protected_properties.iter().cloned(),
            config.component_base_classes.iter().cloned(),
        )
    }

    pub fn is_reserved_variable(name: &str) -> bool {
        RESERVED_VARIABLES.contains(name)
    }

    pub fn is_lifecycle_hook(name: &str) -> bool {
        LIFECYCLE_HOOK.is_match(name)
    }

    /// Variable rule without the per-file bundling and pin exemptions.
    pub fn may_rename_variable(&self, name: &str) -> bool {
        !Self::is_reserved_variable(name) && !self.protected_variables.contains(name)
    }

    pub fn may_rename_method(&self, name: &str, visibility: Visibility) -> bool {
        matches!(visibility, Visibility::Private | Visibility::Protected)
            && !self.protected_methods.contains(name)
            && !Self::is_lifecycle_hook(name)
            && !name.starts_with("__")
    }

    /// Public properties of components are bound to the view layer by name;
    /// only private properties are renamed at all.
    pub fn may_rename_property(&self, name: &str, visibility: Visibility, is_component: bool) -> bool {
        if is_component && visibility == Visibility::Public {
            return false;
        }
        visibility == Visibility::Private && !self.protected_properties.contains(name)
    }

    /// Whether `parent` (as written after `extends`) is a component base.
    pub fn is_component_base(&self, parent: &str) -> bool {
        let parent = parent.trim_start_matches('\\');
        self.component_bases.iter().any(|base| base == parent)
    }
}
