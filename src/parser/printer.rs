//! Renders a syntax tree back to source text.
//!
//! Printing is plain concatenation of token texts (or token parts for
//! interpolated literals), so an unmodified tree prints as its input.

use super::ast::{ClassLike, Group, Member, Node, SyntaxTree};
use super::lexer::Token;

pub fn print_tree(tree: &SyntaxTree) -> String {
    print_nodes(&tree.nodes)
}

pub fn print_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    write_nodes(nodes, &mut out);
    out
}

/// Concatenates a flat token stream.
pub fn print_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        token.write_to(&mut out);
    }
    out
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        write_node(node, out);
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Token(token) => token.write_to(out),
        Node::Group(group) => write_group(group, out),
        Node::Call(call) => {
            for token in &call.callee {
                token.write_to(out);
            }
            write_group(&call.arguments, out);
        }
        Node::ClassLike(class) => write_class(class, out),
    }
}

fn write_group(group: &Group, out: &mut String) {
    group.open.write_to(out);
    write_nodes(&group.children, out);
    group.close.write_to(out);
}

fn write_class(class: &ClassLike, out: &mut String) {
    write_nodes(&class.header, out);
    class.open.write_to(out);
    for member in &class.members {
        match member {
            Member::Method(method) => write_nodes(&method.nodes, out),
            Member::Property(property) => write_nodes(&property.nodes, out),
            Member::Other(nodes) => write_nodes(nodes, out),
        }
    }
    class.close.write_to(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PhpParser;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_print_round_trips_unmodified_tree() {
        let source = r#"<?php
declare(strict_types=1);

namespace App\Http;

/** Controller */
final class HomeController extends Controller
{
    private array $items = [1, 2];

    public function __construct(private Repo $repo) {}

    public function index(Request $request)
    {
        $name = "Hello {$request->user()->name}";
        return view('home', compact('name'));
    }
}
?>
<p><?= $x ?></p>
"#;
        let tree = PhpParser::new().parse_text(source).unwrap();
        assert_eq!(print_tree(&tree), source);
    }

    #[test]
    fn test_print_tokens_uses_parts() {
        let parser = PhpParser::new();
        let mut tokens = parser.tokenize("<?php \"a $b c\";").unwrap();
        let string = tokens.iter_mut().find(|t| t.is_interpolated()).unwrap();
        for part in string.parts.iter_mut() {
            if part.variable_name() == Some("b") {
                part.set_variable_name("z");
            }
        }
        assert_eq!(print_tokens(&tokens), "<?php \"a $z c\";");
    }
}
