/*!
# PHP Grammar

Builds the syntax tree from a token stream in two passes:

1. **Grouping**: balanced `()`, `[]`, `{}` and `#[ ]` pairs become groups.
   An unbalanced or mismatched delimiter is a syntax error.
2. **Structuring**: inside every group, free function calls and class-like
   declarations are recognized; class bodies are split into members.
*/

use once_cell::sync::Lazy;
use std::collections::{HashSet, VecDeque};
use std::mem;

use super::ast::{
    ClassKind, ClassLike, Delimiter, FunctionCall, Group, MethodDecl, Member, Modifiers, Node,
    PropertyDecl, SyntaxTree,
};
use super::lexer::{Token, TokenKind};
use crate::core::ParseError;

/// Names followed by `(` that are language constructs, not function calls.
static NON_CALL_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "if", "elseif", "else", "while", "do", "for", "foreach", "switch", "match", "case",
        "default", "catch", "return", "echo", "print", "isset", "unset", "empty", "list",
        "array", "exit", "die", "eval", "include", "include_once", "require", "require_once",
        "function", "fn", "use", "declare", "new", "clone", "and", "or", "xor", "instanceof",
        "yield", "throw", "static", "self", "parent", "global", "const", "class", "as",
        "insteadof", "namespace",
    ]
    .into_iter()
    .collect()
});

fn is_reserved(name: &str) -> bool {
    NON_CALL_KEYWORDS.contains(name.to_ascii_lowercase().as_str())
}

/// Builds the syntax tree of a tokenized file.
pub fn parse_tokens(tokens: Vec<Token>) -> Result<SyntaxTree, ParseError> {
    let nodes = group_tokens(tokens)?;
    Ok(SyntaxTree::new(structure(nodes)))
}

fn group_tokens(tokens: Vec<Token>) -> Result<Vec<Node>, ParseError> {
    let mut stack: Vec<(Delimiter, Token, Vec<Node>)> = Vec::new();
    let mut current: Vec<Node> = Vec::new();

    for token in tokens {
        if let Some(delimiter) = Delimiter::for_open(token.kind) {
            stack.push((delimiter, token, mem::take(&mut current)));
            continue;
        }

        if matches!(
            token.kind,
            TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace
        ) {
            let Some((delimiter, open, parent)) = stack.pop() else {
                return Err(ParseError::syntax(
                    token.position,
                    format!("unexpected {}", token.kind),
                ));
            };
            if !delimiter.closes_with(token.kind) {
                return Err(ParseError::syntax(
                    token.position,
                    format!(
                        "{} does not close {} opened at {}",
                        token.kind, open.kind, open.position
                    ),
                ));
            }
            let children = mem::replace(&mut current, parent);
            current.push(Node::Group(Group {
                delimiter,
                open,
                children,
                close: token,
            }));
            continue;
        }

        current.push(Node::Token(token));
    }

    if let Some((_, open, _)) = stack.last() {
        return Err(ParseError::syntax(
            open.position,
            format!("unclosed {}", open.kind),
        ));
    }

    Ok(current)
}

fn structure_group(group: Group) -> Group {
    Group {
        children: structure(group.children),
        ..group
    }
}

fn structure_node(node: Node) -> Node {
    match node {
        Node::Group(group) => Node::Group(structure_group(group)),
        other => other,
    }
}

fn structure(nodes: Vec<Node>) -> Vec<Node> {
    let mut queue: VecDeque<Node> = nodes.into();
    let mut out: Vec<Node> = Vec::with_capacity(queue.len());

    while let Some(node) = queue.pop_front() {
        let token = match node {
            Node::Token(token) => token,
            other => {
                out.push(structure_node(other));
                continue;
            }
        };

        if let Some(kind) = ClassKind::from_keyword(&token) {
            if starts_class_like(kind, &out, &queue) {
                out.push(parse_class_like(kind, token, &mut queue));
                continue;
            }
        }

        if token.kind == TokenKind::Identifier && is_call_site(&token, &out, &queue) {
            parse_call(token, &mut out, &mut queue);
            continue;
        }

        out.push(Node::Token(token));
    }

    out
}

fn next_significant(queue: &VecDeque<Node>) -> Option<&Node> {
    queue.iter().find(|node| !node.is_trivia())
}

fn previous_significant(nodes: &[Node]) -> Option<&Node> {
    nodes.iter().rev().find(|node| !node.is_trivia())
}

/// Number of trailing nodes of `out` forming a namespace prefix (`\`, `Ns\`).
fn namespace_prefix_len(out: &[Node]) -> usize {
    let mut len = 0;
    let mut want_backslash = true;
    for node in out.iter().rev() {
        let take = match node {
            Node::Token(t) if want_backslash => t.kind == TokenKind::Backslash,
            Node::Token(t) => t.kind == TokenKind::Identifier && !is_reserved(&t.text),
            _ => false,
        };
        if !take {
            break;
        }
        len += 1;
        want_backslash = !want_backslash;
    }
    len
}

fn is_call_site(name: &Token, out: &[Node], queue: &VecDeque<Node>) -> bool {
    if is_reserved(&name.text) {
        return false;
    }
    if !next_significant(queue).map_or(false, |n| n.is_group(Delimiter::Paren)) {
        return false;
    }
    let chain = namespace_prefix_len(out);
    match previous_significant(&out[..out.len() - chain]) {
        Some(Node::Token(prev)) => {
            !matches!(
                prev.kind,
                TokenKind::Arrow | TokenKind::NullsafeArrow | TokenKind::DoubleColon
            ) && !["function", "fn", "new", "const"]
                .iter()
                .any(|kw| prev.is_keyword(kw))
        }
        _ => true,
    }
}

fn parse_call(name: Token, out: &mut Vec<Node>, queue: &mut VecDeque<Node>) {
    let chain = namespace_prefix_len(out);
    let mut callee: Vec<Token> = out
        .drain(out.len() - chain..)
        .filter_map(|node| match node {
            Node::Token(token) => Some(token),
            _ => None,
        })
        .collect();
    callee.push(name);

    let qualified: String = callee.iter().map(|t| t.text.as_str()).collect();

    while queue.front().map_or(false, Node::is_trivia) {
        if let Some(Node::Token(token)) = queue.pop_front() {
            callee.push(token);
        }
    }

    match queue.pop_front() {
        Some(Node::Group(arguments)) if arguments.delimiter == Delimiter::Paren => {
            out.push(Node::Call(FunctionCall {
                callee,
                name: qualified,
                arguments: structure_group(arguments),
            }));
        }
        other => {
            out.extend(callee.into_iter().map(Node::Token));
            if let Some(node) = other {
                queue.push_front(node);
            }
        }
    }
}

fn starts_class_like(kind: ClassKind, out: &[Node], queue: &VecDeque<Node>) -> bool {
    if let Some(Node::Token(prev)) = previous_significant(out) {
        if matches!(
            prev.kind,
            TokenKind::Arrow | TokenKind::NullsafeArrow | TokenKind::DoubleColon
        ) {
            return false;
        }
    }
    match next_significant(queue) {
        Some(Node::Token(next)) => next.kind == TokenKind::Identifier,
        Some(Node::Group(group)) => {
            kind == ClassKind::Class
                && matches!(group.delimiter, Delimiter::Paren | Delimiter::Brace)
        }
        _ => false,
    }
}

fn parse_class_like(kind: ClassKind, keyword: Token, queue: &mut VecDeque<Node>) -> Node {
    let body_index = queue
        .iter()
        .position(|n| n.is_group(Delimiter::Brace) || n.is_token_kind(TokenKind::Semicolon));
    let Some(index) = body_index.filter(|&i| queue[i].is_group(Delimiter::Brace)) else {
        return Node::Token(keyword);
    };

    let body = match queue.remove(index) {
        Some(Node::Group(group)) => group,
        Some(other) => {
            queue.insert(index, other);
            return Node::Token(keyword);
        }
        None => return Node::Token(keyword),
    };

    let mut header = vec![Node::Token(keyword)];
    header.extend(queue.drain(..index).map(structure_node));

    let name = header[1..]
        .iter()
        .find(|n| !n.is_trivia())
        .and_then(Node::as_token)
        .filter(|t| {
            t.kind == TokenKind::Identifier
                && !t.is_keyword("extends")
                && !t.is_keyword("implements")
        })
        .map(|t| t.text.clone());

    Node::ClassLike(ClassLike {
        kind,
        name,
        extends: parent_class(&header),
        header,
        open: body.open,
        members: parse_members(body.children),
        close: body.close,
    })
}

/// Name after `extends`, as written, without a leading `\`.
fn parent_class(header: &[Node]) -> Option<String> {
    let start = header
        .iter()
        .position(|n| n.as_token().map_or(false, |t| t.is_keyword("extends")))?;
    let name: String = header[start + 1..]
        .iter()
        .skip_while(|n| n.is_trivia())
        .map_while(|n| {
            n.as_token()
                .filter(|t| matches!(t.kind, TokenKind::Identifier | TokenKind::Backslash))
        })
        .map(|t| t.text.as_str())
        .collect();
    let name = name.trim_start_matches('\\');
    (!name.is_empty()).then(|| name.to_string())
}

/// Moves nodes from `queue` into `pending` through the end of a declaration
/// (a `;` or a brace-delimited body). Returns the index in `pending` of the
/// first identifier when `find_name` is set.
fn collect_declaration(
    queue: &mut VecDeque<Node>,
    pending: &mut Vec<Node>,
    find_name: bool,
) -> Option<usize> {
    let mut name_index = None;
    while let Some(node) = queue.pop_front() {
        let ends = node.is_group(Delimiter::Brace) || node.is_token_kind(TokenKind::Semicolon);
        if find_name && name_index.is_none() && node.is_token_kind(TokenKind::Identifier) {
            name_index = Some(pending.len());
        }
        pending.push(structure_node(node));
        if ends {
            break;
        }
    }
    name_index
}

fn parse_members(children: Vec<Node>) -> Vec<Member> {
    let mut queue: VecDeque<Node> = children.into();
    let mut members = Vec::new();
    let mut pending: Vec<Node> = Vec::new();
    let mut modifiers = Modifiers::default();

    while let Some(node) = queue.pop_front() {
        let token = match node {
            Node::Token(token) => token,
            Node::Group(group) if group.delimiter == Delimiter::Attribute => {
                pending.push(Node::Group(structure_group(group)));
                continue;
            }
            other => {
                pending.push(structure_node(other));
                members.push(Member::Other(mem::take(&mut pending)));
                modifiers = Modifiers::default();
                continue;
            }
        };

        if token.is_trivia() || modifiers.apply(&token) {
            pending.push(Node::Token(token));
            continue;
        }

        if token.is_keyword("function") {
            pending.push(Node::Token(token));
            let member = match collect_declaration(&mut queue, &mut pending, true) {
                Some(name_index) => Member::Method(MethodDecl {
                    modifiers,
                    nodes: mem::take(&mut pending),
                    name_index,
                }),
                None => Member::Other(mem::take(&mut pending)),
            };
            members.push(member);
        } else if token.kind == TokenKind::Semicolon {
            pending.push(Node::Token(token));
            members.push(Member::Other(mem::take(&mut pending)));
        } else if ["use", "const", "case"].iter().any(|kw| token.is_keyword(kw)) {
            pending.push(Node::Token(token));
            collect_declaration(&mut queue, &mut pending, false);
            members.push(Member::Other(mem::take(&mut pending)));
        } else {
            let start = pending.len();
            pending.push(Node::Token(token));
            collect_declaration(&mut queue, &mut pending, false);
            let name_indices: Vec<usize> = (start..pending.len())
                .filter(|&i| pending[i].is_token_kind(TokenKind::Variable))
                .collect();
            let member = if name_indices.is_empty() {
                Member::Other(mem::take(&mut pending))
            } else {
                Member::Property(PropertyDecl {
                    modifiers,
                    nodes: mem::take(&mut pending),
                    name_indices,
                })
            };
            members.push(member);
        }
        modifiers = Modifiers::default();
    }

    if !pending.is_empty() {
        members.push(Member::Other(pending));
    }
    members
}
