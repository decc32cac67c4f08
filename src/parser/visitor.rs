//! Read-only traversal of the syntax tree (enter/leave events).

use super::ast::{Node, SyntaxTree};

/// Result of `Visitor::enter`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitControl {
    Continue,
    SkipChildren,
    Stop,
}

/// Visitor API (enter/leave). Children are visited in source order.
pub trait Visitor<'t> {
    fn enter(&mut self, _node: &'t Node) -> VisitControl {
        VisitControl::Continue
    }

    fn leave(&mut self, _node: &'t Node) {}
}

/// Walks the whole tree. Returns true if the walk was not stopped.
pub fn walk<'t, V: Visitor<'t>>(tree: &'t SyntaxTree, visitor: &mut V) -> bool {
    walk_nodes(&tree.nodes, visitor).is_some()
}

fn walk_nodes<'t, V: Visitor<'t>>(nodes: &'t [Node], visitor: &mut V) -> Option<()> {
    for node in nodes {
        walk_node(node, visitor)?;
    }
    Some(())
}

fn walk_node<'t, V: Visitor<'t>>(node: &'t Node, visitor: &mut V) -> Option<()> {
    match visitor.enter(node) {
        VisitControl::Continue => match node {
            Node::Token(_) => {}
            Node::Group(group) => walk_nodes(&group.children, visitor)?,
            Node::Call(call) => walk_nodes(&call.arguments.children, visitor)?,
            Node::ClassLike(class) => {
                walk_nodes(&class.header, visitor)?;
                for member in &class.members {
                    walk_nodes(member.nodes(), visitor)?;
                }
            }
        },
        VisitControl::SkipChildren => {}
        VisitControl::Stop => return None,
    }
    visitor.leave(node);
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::TokenKind;
    use crate::parser::PhpParser;

    struct CountingVisitor {
        variables: Vec<String>,
        leaves: usize,
        stop_at: Option<&'static str>,
    }

    impl<'t> Visitor<'t> for CountingVisitor {
        fn enter(&mut self, node: &'t Node) -> VisitControl {
            if let Node::Token(token) = node {
                if token.kind == TokenKind::Variable {
                    self.variables.push(token.text.clone());
                    if self.stop_at == Some(token.text.as_str()) {
                        return VisitControl::Stop;
                    }
                }
            }
            VisitControl::Continue
        }

        fn leave(&mut self, _node: &'t Node) {
            self.leaves += 1;
        }
    }

    #[test]
    fn test_walk_reaches_nested_nodes() {
        let tree = PhpParser::new()
            .parse_text("<?php $a = f([$b]); class C { function m() { return $c; } }")
            .unwrap();
        let mut visitor = CountingVisitor { variables: Vec::new(), leaves: 0, stop_at: None };
        assert!(walk(&tree, &mut visitor));
        assert_eq!(visitor.variables, vec!["$a", "$b", "$c"]);
        assert!(visitor.leaves > 3);
    }

    #[test]
    fn test_walk_stops() {
        let tree = PhpParser::new().parse_text("<?php $a; $b; $c;").unwrap();
        let mut visitor = CountingVisitor { variables: Vec::new(), leaves: 0, stop_at: Some("$b") };
        assert!(!walk(&tree, &mut visitor));
        assert_eq!(visitor.variables, vec!["$a", "$b"]);
    }
}
