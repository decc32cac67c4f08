/*!
# Renamer & Idiom Canonicalizer

Second phase of the per-file traversal. Mutates the tree in place:

1. `compact('a', 'b')` becomes `['a' => $a, 'b' => $b]`.
2. Variables are renamed unless exempt (reserved, configured, bundled or
   pinned).
3. Private/protected methods and private properties are renamed at their
   declaration. Inside the declaring class their access sites
   (`$this->x`, `$this?->x`, `self::`/`static::` forms) follow, including
   the same forms inside interpolated strings.

Per class, every member declaration is classified before any access site is
rewritten, so member order does not matter.
*/

use serde::Serialize;
use std::collections::HashMap;
use tracing::trace;

use super::analysis::FileAnalysis;
use super::bundling::{is_bundling_call, rewrite_as_array};
use super::names::RenameMap;
use super::rules::RenameRules;
use crate::parser::ast::{ClassLike, Delimiter, Member, Node, SyntaxTree};
use crate::parser::lexer::{Token, TokenKind};

/// Counts of rewritten sites in one file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenameStats {
    pub variables: usize,
    pub methods: usize,
    pub properties: usize,
    pub bundles_rewritten: usize,
}

impl std::ops::AddAssign for RenameStats {
    fn add_assign(&mut self, other: Self) {
        self.variables += other.variables;
        self.methods += other.methods;
        self.properties += other.properties;
        self.bundles_rewritten += other.bundles_rewritten;
    }
}

/// Run-wide renaming state lent to each file: the shared map and the rules.
pub struct RenameContext<'a> {
    pub map: &'a mut RenameMap,
    pub rules: &'a RenameRules,
}

impl<'a> RenameContext<'a> {
    pub fn new(map: &'a mut RenameMap, rules: &'a RenameRules) -> Self {
        Self { map, rules }
    }

    /// Analyses and renames one file.
    pub fn rename_file(&mut self, tree: &mut SyntaxTree) -> RenameStats {
        let analysis = FileAnalysis::analyze(tree, self.rules);
        self.rename_tree(tree, &analysis)
    }

    pub fn rename_tree(&mut self, tree: &mut SyntaxTree, analysis: &FileAnalysis) -> RenameStats {
        let mut renamer = Renamer {
            map: &mut *self.map,
            rules: self.rules,
            analysis,
            scopes: Vec::new(),
            stats: RenameStats::default(),
        };
        renamer.rename_nodes(&mut tree.nodes);
        renamer.stats
    }
}

/// Renamed members of the class being walked
#[derive(Debug, Default)]
struct ClassScope {
    /// Keyed by lowercase name (method names are case-insensitive)
    methods: HashMap<String, String>,
    properties: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Variable,
    StaticProperty,
    Property,
    Method,
}

/// What the access planner needs to know about a sibling node.
#[derive(Clone, Copy)]
enum Shape<'t> {
    Token(&'t Token),
    CallParens,
    Other,
}

impl<'t> Shape<'t> {
    fn of_node(node: &'t Node) -> Self {
        match node {
            Node::Token(token) => Shape::Token(token),
            Node::Group(group) if group.delimiter == Delimiter::Paren => Shape::CallParens,
            _ => Shape::Other,
        }
    }

    fn is_trivia(self) -> bool {
        matches!(self, Shape::Token(t) if t.is_trivia())
    }

    fn kind(self) -> Option<TokenKind> {
        match self {
            Shape::Token(t) => Some(t.kind),
            _ => None,
        }
    }

    fn opens_call(self) -> bool {
        match self {
            Shape::CallParens => true,
            Shape::Token(t) => t.kind == TokenKind::OpenParen,
            Shape::Other => false,
        }
    }

    fn is_self_reference(self) -> bool {
        matches!(self, Shape::Token(t) if t.is_keyword("self") || t.is_keyword("static"))
    }

    fn is_this(self) -> bool {
        matches!(self, Shape::Token(t) if t.kind == TokenKind::Variable && t.text == "$this")
    }
}

/// Finds the renamable sites among a sequence of siblings.
fn plan_accesses(shapes: &[Shape<'_>]) -> Vec<(usize, Access)> {
    let significant: Vec<usize> = (0..shapes.len()).filter(|&i| !shapes[i].is_trivia()).collect();
    let mut plan = Vec::new();

    for (k, &index) in significant.iter().enumerate() {
        let Shape::Token(token) = shapes[index] else {
            continue;
        };
        let before = |back: usize| k.checked_sub(back).map(|j| shapes[significant[j]]);
        let prev = before(1).and_then(Shape::kind);
        let owner = before(2);
        let calls = significant
            .get(k + 1)
            .map_or(false, |&j| shapes[j].opens_call());

        match token.kind {
            TokenKind::Variable | TokenKind::EncapsedVarName => {
                if prev == Some(TokenKind::DoubleColon) {
                    if owner.map_or(false, Shape::is_self_reference) {
                        plan.push((index, Access::StaticProperty));
                    }
                } else {
                    plan.push((index, Access::Variable));
                }
            }
            TokenKind::Identifier => match prev {
                Some(TokenKind::Arrow | TokenKind::NullsafeArrow)
                    if owner.map_or(false, Shape::is_this) =>
                {
                    let access = if calls { Access::Method } else { Access::Property };
                    plan.push((index, access));
                }
                Some(TokenKind::DoubleColon)
                    if calls && owner.map_or(false, Shape::is_self_reference) =>
                {
                    plan.push((index, Access::Method));
                }
                _ => {}
            },
            _ => {}
        }
    }

    plan
}

struct Renamer<'r> {
    map: &'r mut RenameMap,
    rules: &'r RenameRules,
    analysis: &'r FileAnalysis,
    scopes: Vec<ClassScope>,
    stats: RenameStats,
}

impl<'r> Renamer<'r> {
    fn rename_nodes(&mut self, nodes: &mut [Node]) {
        for node in nodes.iter_mut() {
            if let Node::Call(call) = node {
                if is_bundling_call(call) {
                    *node = Node::Group(rewrite_as_array(call));
                    self.stats.bundles_rewritten += 1;
                }
            }
        }

        let plan = {
            let shapes: Vec<Shape<'_>> = nodes.iter().map(Shape::of_node).collect();
            plan_accesses(&shapes)
        };
        for (index, access) in plan {
            if let Node::Token(token) = &mut nodes[index] {
                self.apply(token, access);
            }
        }

        for node in nodes.iter_mut() {
            self.rename_nested(node);
        }
    }

    fn rename_nested(&mut self, node: &mut Node) {
        match node {
            Node::Token(token) if token.is_interpolated() => self.rename_parts(&mut token.parts),
            Node::Token(_) => {}
            Node::Group(group) => self.rename_nodes(&mut group.children),
            Node::Call(call) => self.rename_nodes(&mut call.arguments.children),
            Node::ClassLike(class) => self.rename_class(class),
        }
    }

    fn rename_parts(&mut self, parts: &mut [Token]) {
        let plan = {
            let shapes: Vec<Shape<'_>> = parts.iter().map(Shape::Token).collect();
            plan_accesses(&shapes)
        };
        for (index, access) in plan {
            self.apply(&mut parts[index], access);
        }
        for part in parts.iter_mut() {
            if part.is_interpolated() {
                self.rename_parts(&mut part.parts);
            }
        }
    }

    fn apply(&mut self, token: &mut Token, access: Access) {
        match access {
            Access::Variable => {
                let Some(name) = token.variable_name() else {
                    return;
                };
                if !self.rules.may_rename_variable(name) || self.analysis.is_exempt_variable(name) {
                    return;
                }
                let alias = self.map.alias_for(name);
                token.set_variable_name(&alias);
                self.stats.variables += 1;
            }
            Access::StaticProperty => {
                let alias = token
                    .variable_name()
                    .and_then(|name| self.scopes.last()?.properties.get(name).cloned());
                if let Some(alias) = alias {
                    token.set_variable_name(&alias);
                    self.stats.properties += 1;
                }
            }
            Access::Property => {
                let alias = self
                    .scopes
                    .last()
                    .and_then(|scope| scope.properties.get(&token.text).cloned());
                if let Some(alias) = alias {
                    token.text = alias;
                    self.stats.properties += 1;
                }
            }
            Access::Method => {
                let alias = self
                    .scopes
                    .last()
                    .and_then(|scope| scope.methods.get(&token.text.to_ascii_lowercase()).cloned());
                if let Some(alias) = alias {
                    token.text = alias;
                    self.stats.methods += 1;
                }
            }
        }
    }

    fn rename_class(&mut self, class: &mut ClassLike) {
        // Anonymous class arguments belong to the enclosing scope.
        self.rename_nodes(&mut class.header);

        let scope = self.declare_members(class);
        trace!(
            class = class.name.as_deref().unwrap_or("class@anonymous"),
            methods = scope.methods.len(),
            properties = scope.properties.len(),
            "Class members classified"
        );
        self.scopes.push(scope);

        for member in class.members.iter_mut() {
            match member {
                Member::Method(method) => self.rename_nodes(&mut method.nodes),
                Member::Property(property) => {
                    for (index, node) in property.nodes.iter_mut().enumerate() {
                        if !property.name_indices.contains(&index) {
                            self.rename_nested(node);
                        }
                    }
                }
                Member::Other(nodes) => self.rename_nodes(nodes),
            }
        }

        self.scopes.pop();
    }

    /// Renames member declarations and records them for the access sites.
    fn declare_members(&mut self, class: &mut ClassLike) -> ClassScope {
        let mut scope = ClassScope::default();
        let is_component = self.analysis.is_component;

        for member in class.members.iter_mut() {
            match member {
                Member::Method(method) => {
                    if method.is_constructor() {
                        for parameter in method.promoted_parameters() {
                            if !self.analysis.pinned_names.contains(&parameter.name) {
                                let alias = self.map.alias_for(&parameter.name);
                                scope.properties.insert(parameter.name, alias);
                            }
                        }
                    }

                    let name = method.name().to_string();
                    if !self.rules.may_rename_method(&name, method.modifiers.visibility()) {
                        continue;
                    }
                    let alias = self.map.alias_for(&name);
                    if let Node::Token(token) = &mut method.nodes[method.name_index] {
                        token.text = alias.clone();
                    }
                    scope.methods.insert(name.to_ascii_lowercase(), alias);
                    self.stats.methods += 1;
                }
                Member::Property(property) => {
                    let visibility = property.modifiers.visibility();
                    for &index in &property.name_indices {
                        let Node::Token(token) = &mut property.nodes[index] else {
                            continue;
                        };
                        let Some(name) = token.variable_name().map(str::to_string) else {
                            continue;
                        };
                        if !self.rules.may_rename_property(&name, visibility, is_component) {
                            continue;
                        }
                        let alias = self.map.alias_for(&name);
                        token.set_variable_name(&alias);
                        scope.properties.insert(name, alias);
                        self.stats.properties += 1;
                    }
                }
                Member::Other(_) => {}
            }
        }

        scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::ObfuscatorConfig;
    use crate::parser::printer::print_tree;
    use crate::parser::PhpParser;
    use crate::transform::names::AliasStyle;
    use pretty_assertions::assert_eq;

    fn rules() -> RenameRules {
        RenameRules::from_config(&ObfuscatorConfig::default())
    }

    fn rename(source: &str, map: &mut RenameMap) -> String {
        let rules = rules();
        let mut tree = PhpParser::new().parse_text(source).unwrap();
        RenameContext::new(map, &rules).rename_file(&mut tree);
        print_tree(&tree)
    }

    fn hex_map() -> RenameMap {
        RenameMap::with_seed(AliasStyle::Hex, 11)
    }

    #[test]
    fn test_variables_renamed_consistently() {
        let mut map = hex_map();
        let out = rename("<?php $total = 1; $total += $step; echo \"$total\";", &mut map);
        let total = map.get("total").unwrap().to_string();
        let step = map.get("step").unwrap().to_string();
        assert_eq!(
            out,
            format!("<?php ${t} = 1; ${t} += ${s}; echo \"${t}\";", t = total, s = step)
        );
    }

    #[test]
    fn test_protected_and_reserved_variables_kept() {
        let mut map = hex_map();
        let out = rename("<?php $request->all(); $this->x; $_POST['a']; $GLOBALS['b'];", &mut map);
        assert_eq!(out, "<?php $request->all(); $this->x; $_POST['a']; $GLOBALS['b'];");
        assert!(map.is_empty());
    }

    #[test]
    fn test_compact_rewritten_and_names_kept() {
        let mut map = hex_map();
        let out = rename(
            "<?php function show() { $user = 1; $posts = 2; $other = 3; return view('x', compact('user', 'posts')); }",
            &mut map,
        );
        let other = map.get("other").unwrap().to_string();
        assert_eq!(
            out,
            format!(
                "<?php function show() {{ $user = 1; $posts = 2; ${} = 3; return view('x', ['user' => $user, 'posts' => $posts]); }}",
                other
            )
        );
        assert!(map.get("user").is_none());
    }

    #[test]
    fn test_private_members_and_access_sites() {
        let mut map = hex_map();
        let source = r#"<?php
class Cart {
    public function total() { return $this->sum() + self::rate() + $this->count + static::$cache; }
    private function sum() { return 1; }
    protected static function rate() { return 2; }
    private $count = 0;
    private static $cache;
    public $visible;
}"#;
        let out = rename(source, &mut map);
        let sum = map.get("sum").unwrap().to_string();
        let rate = map.get("rate").unwrap().to_string();
        let count = map.get("count").unwrap().to_string();
        let cache = map.get("cache").unwrap().to_string();

        assert!(out.contains(&format!("$this->{}()", sum)));
        assert!(out.contains(&format!("self::{}()", rate)));
        assert!(out.contains(&format!("$this->{} ", count)));
        assert!(out.contains(&format!("static::${}", cache)));
        assert!(out.contains(&format!("private function {}()", sum)));
        assert!(out.contains(&format!("private ${} = 0;", count)));
        assert!(out.contains("public function total()"));
        assert!(out.contains("public $visible;"));
    }

    #[test]
    fn test_exempt_methods() {
        let mut map = hex_map();
        let out = rename(
            "<?php class C { protected function render() {} private function updatedSearch() {} private function __clone() {} public function open() {} }",
            &mut map,
        );
        assert_eq!(
            out,
            "<?php class C { protected function render() {} private function updatedSearch() {} private function __clone() {} public function open() {} }"
        );
    }

    #[test]
    fn test_component_public_property_kept_private_renamed() {
        let mut map = hex_map();
        let out = rename(
            "<?php class Counter extends Component { public $count = 0; private $secret; public function inc() { $this->count++; $this->secret = 1; } }",
            &mut map,
        );
        let secret = map.get("secret").unwrap().to_string();
        assert!(out.contains("public $count = 0;"));
        assert!(out.contains("$this->count++"));
        assert!(out.contains(&format!("private ${};", secret)));
        assert!(out.contains(&format!("$this->{} = 1", secret)));
    }

    #[test]
    fn test_protected_property_names_kept() {
        let mut map = hex_map();
        let out = rename("<?php class M { private $fillable = []; protected $hidden = []; }", &mut map);
        assert_eq!(out, "<?php class M { private $fillable = []; protected $hidden = []; }");
    }

    #[test]
    fn test_promoted_constructor_parameters() {
        let mut map = hex_map();
        let out = rename(
            "<?php class S { public function __construct(private Repo $repo, public Mailer $mailer) {} public function go() { $this->repo->save(); $this->mailer->send(); } }",
            &mut map,
        );
        let repo = map.get("repo").unwrap().to_string();
        assert!(out.contains(&format!("private Repo ${}", repo)));
        assert!(out.contains(&format!("$this->{}->save()", repo)));
        assert!(out.contains("public Mailer $mailer"));
        assert!(out.contains("$this->mailer->send()"));
    }

    #[test]
    fn test_member_order_does_not_matter() {
        let mut map = hex_map();
        let out = rename(
            "<?php class C { public function a() { return $this->b(); } private function b() { return 1; } }",
            &mut map,
        );
        let b = map.get("b").unwrap().to_string();
        assert!(out.contains(&format!("$this->{}()", b)));
    }

    #[test]
    fn test_interpolated_member_access() {
        let mut map = hex_map();
        let out = rename(
            "<?php class C { private $name; public function s() { return \"Hi $this->name and {$this->name}\"; } }",
            &mut map,
        );
        let name = map.get("name").unwrap().to_string();
        assert!(out.contains(&format!("\"Hi $this->{n} and {{$this->{n}}}\"", n = name)));
    }

    #[test]
    fn test_dollar_brace_interpolation_renamed() {
        let mut map = hex_map();
        let out = rename(
            "<?php $item = ['k' => 1]; echo \"${item['k']} ${item}\";",
            &mut map,
        );
        let item = map.get("item").unwrap().to_string();
        assert_eq!(
            out,
            format!("<?php ${a} = ['k' => 1]; echo \"${{{a}['k']}} ${{{a}}}\";", a = item)
        );
    }

    #[test]
    fn test_other_objects_members_untouched() {
        let mut map = hex_map();
        let out = rename(
            "<?php class C { private $items; public function f($o) { return $o->items; } }",
            &mut map,
        );
        let o = map.get("o").unwrap().to_string();
        assert!(out.contains(&format!("${}->items", o)));
    }

    #[test]
    fn test_alias_shared_across_files() {
        let mut map = hex_map();
        let a = rename("<?php $shared = 1;", &mut map);
        let b = rename("<?php echo $shared;", &mut map);
        let alias = map.get("shared").unwrap().to_string();
        assert_eq!(a, format!("<?php ${} = 1;", alias));
        assert_eq!(b, format!("<?php echo ${};", alias));
    }

    #[test]
    fn test_stats() {
        let rules = rules();
        let mut map = hex_map();
        let mut tree = PhpParser::new()
            .parse_text("<?php $a = compact('b'); class C { private $p; private function m() { $this->m(); } }")
            .unwrap();
        let stats = RenameContext::new(&mut map, &rules).rename_file(&mut tree);
        assert_eq!(stats.bundles_rewritten, 1);
        assert_eq!(stats.variables, 1);
        assert_eq!(stats.methods, 2);
        assert_eq!(stats.properties, 1);
    }
}
