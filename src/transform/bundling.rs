/*!
# Local Bundling (`compact`)

`compact('a', 'b')` builds an array from local variables looked up by name
at runtime. The finder collects those names so the renamer leaves the
variables alone; the rewrite turns the call into the equivalent literal
array `['a' => $a, 'b' => $b]`.
*/

use std::collections::HashSet;

use crate::parser::ast::{Delimiter, FunctionCall, Group, Node, SyntaxTree};
use crate::parser::lexer::{is_valid_identifier, Token, TokenKind};
use crate::parser::visitor::{walk, VisitControl, Visitor};

/// Name of the bundling function
pub const BUNDLING_FUNCTION: &str = "compact";

/// PHP function names ignore ASCII case, so `Compact(...)` bundles too.
pub fn is_bundling_call(call: &FunctionCall) -> bool {
    call.resolved_name().eq_ignore_ascii_case(BUNDLING_FUNCTION)
}

/// Values of the string-literal arguments of a call, in order. Other
/// arguments (variables, arrays, spreads, named arguments) are skipped.
pub fn literal_arguments(call: &FunctionCall) -> Vec<String> {
    call.arguments
        .items()
        .into_iter()
        .filter_map(|item| match item.as_slice() {
            [Node::Token(token)] => token.literal_value(),
            _ => None,
        })
        .collect()
}

/// Read-only walk collecting bundled names of a file
#[derive(Debug, Default)]
pub struct LocalBundlingFinder {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl LocalBundlingFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundled names of `tree`, deduplicated in first-seen order.
    pub fn find(tree: &SyntaxTree) -> Vec<String> {
        let mut finder = Self::new();
        walk(tree, &mut finder);
        finder.names
    }
}

impl<'t> Visitor<'t> for LocalBundlingFinder {
    fn enter(&mut self, node: &'t Node) -> VisitControl {
        if let Node::Call(call) = node {
            if is_bundling_call(call) {
                for name in literal_arguments(call) {
                    if self.seen.insert(name.clone()) {
                        self.names.push(name);
                    }
                }
            }
        }
        VisitControl::Continue
    }
}

fn quote_single(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        if ch == '\\' || ch == '\'' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

/// Variable expression for `name`: `$name`, or `${'name'}` when the name is
/// not a valid identifier.
fn variable_nodes(name: &str) -> Vec<Node> {
    if is_valid_identifier(name) {
        return vec![Node::Token(Token::synthetic(
            TokenKind::Variable,
            format!("${}", name),
        ))];
    }
    vec![
        Node::Token(Token::synthetic(TokenKind::Dollar, "$")),
        Node::Group(Group::synthetic(
            Delimiter::Brace,
            vec![Node::Token(Token::synthetic(
                TokenKind::SingleQuoted,
                quote_single(name),
            ))],
        )),
    ]
}

/// Rewrites a bundling call into a short-syntax literal array.
pub fn rewrite_as_array(call: &FunctionCall) -> Group {
    let mut children = Vec::new();
    for (i, name) in literal_arguments(call).iter().enumerate() {
        if i > 0 {
            children.push(Node::Token(Token::synthetic(TokenKind::Comma, ",")));
            children.push(Node::Token(Token::synthetic(TokenKind::Whitespace, " ")));
        }
        children.push(Node::Token(Token::synthetic(
            TokenKind::SingleQuoted,
            quote_single(name),
        )));
        children.push(Node::Token(Token::synthetic(TokenKind::Whitespace, " ")));
        children.push(Node::Token(Token::synthetic(TokenKind::Operator, "=>")));
        children.push(Node::Token(Token::synthetic(TokenKind::Whitespace, " ")));
        children.extend(variable_nodes(name));
    }
    Group::synthetic(Delimiter::Bracket, children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::printer::print_nodes;
    use crate::parser::PhpParser;
    use pretty_assertions::assert_eq;

    fn first_call(tree: &SyntaxTree) -> &FunctionCall {
        tree.nodes
            .iter()
            .find_map(|n| match n {
                Node::Call(call) => Some(call),
                _ => None,
            })
            .expect("call")
    }

    #[test]
    fn test_finder_collects_unique_literals() {
        let tree = PhpParser::new()
            .parse_text("<?php compact('a', \"b\", $dynamic); foo(compact('a', 'c')); \\compact('d');")
            .unwrap();
        assert_eq!(LocalBundlingFinder::find(&tree), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_finder_ignores_methods() {
        let tree = PhpParser::new()
            .parse_text("<?php $x->compact('a'); Arr::compact('b');")
            .unwrap();
        assert!(LocalBundlingFinder::find(&tree).is_empty());
    }

    #[test]
    fn test_finder_ignores_function_name_case() {
        let tree = PhpParser::new()
            .parse_text("<?php Compact('c'); \\COMPACT('d');")
            .unwrap();
        assert_eq!(LocalBundlingFinder::find(&tree), vec!["c", "d"]);
    }

    #[test]
    fn test_rewrite_as_array() {
        let tree = PhpParser::new().parse_text("<?php compact('user', 'posts');").unwrap();
        let group = rewrite_as_array(first_call(&tree));
        assert_eq!(
            print_nodes(&[Node::Group(group)]),
            "['user' => $user, 'posts' => $posts]"
        );
    }

    #[test]
    fn test_rewrite_drops_non_literal_arguments() {
        let tree = PhpParser::new().parse_text("<?php compact('a', $names);").unwrap();
        let group = rewrite_as_array(first_call(&tree));
        assert_eq!(print_nodes(&[Node::Group(group)]), "['a' => $a]");
    }

    #[test]
    fn test_rewrite_invalid_identifier() {
        let tree = PhpParser::new().parse_text("<?php compact('my-var');").unwrap();
        let group = rewrite_as_array(first_call(&tree));
        assert_eq!(print_nodes(&[Node::Group(group)]), "['my-var' => ${'my-var'}]");
    }

    #[test]
    fn test_rewrite_empty_call() {
        let tree = PhpParser::new().parse_text("<?php compact();").unwrap();
        let group = rewrite_as_array(first_call(&tree));
        assert_eq!(print_nodes(&[Node::Group(group)]), "[]");
    }
}
