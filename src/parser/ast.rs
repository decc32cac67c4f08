/*!
# Syntax Tree for PHP

A lossless, shallow syntax tree. Every node owns the tokens it was built
from, so printing the tree reproduces the source (plus any mutations made by
the renamer). Only the constructs the obfuscator reasons about are
structured: delimiter groups, function calls and class-like declarations with
their members. Everything else stays a flat token sequence.
*/

use serde::{Deserialize, Serialize};
use std::fmt;

use super::lexer::{Token, TokenKind};
use super::visitor::{walk, VisitControl, Visitor};
use crate::core::Position;

/// Kind of bracket pair enclosing a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delimiter {
    Paren,
    Bracket,
    Brace,
    /// `#[ ... ]`
    Attribute,
}

impl Delimiter {
    pub fn for_open(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::OpenParen => Some(Self::Paren),
            TokenKind::OpenBracket => Some(Self::Bracket),
            TokenKind::OpenBrace => Some(Self::Brace),
            TokenKind::AttributeOpen => Some(Self::Attribute),
            _ => None,
        }
    }

    pub fn closes_with(self, kind: TokenKind) -> bool {
        matches!(
            (self, kind),
            (Self::Paren, TokenKind::CloseParen)
                | (Self::Bracket, TokenKind::CloseBracket)
                | (Self::Brace, TokenKind::CloseBrace)
                | (Self::Attribute, TokenKind::CloseBracket)
        )
    }

    pub fn open_text(self) -> &'static str {
        match self {
            Self::Paren => "(",
            Self::Bracket => "[",
            Self::Brace => "{",
            Self::Attribute => "#[",
        }
    }

    pub fn close_text(self) -> &'static str {
        match self {
            Self::Paren => ")",
            Self::Bracket | Self::Attribute => "]",
            Self::Brace => "}",
        }
    }
}

/// Balanced delimiter group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub delimiter: Delimiter,
    pub open: Token,
    pub children: Vec<Node>,
    pub close: Token,
}

impl Group {
    /// Builds a group that does not originate from the input.
    pub fn synthetic(delimiter: Delimiter, children: Vec<Node>) -> Self {
        let open_kind = match delimiter {
            Delimiter::Paren => TokenKind::OpenParen,
            Delimiter::Bracket => TokenKind::OpenBracket,
            Delimiter::Brace => TokenKind::OpenBrace,
            Delimiter::Attribute => TokenKind::AttributeOpen,
        };
        let close_kind = match delimiter {
            Delimiter::Paren => TokenKind::CloseParen,
            Delimiter::Bracket | Delimiter::Attribute => TokenKind::CloseBracket,
            Delimiter::Brace => TokenKind::CloseBrace,
        };
        Self {
            delimiter,
            open: Token::synthetic(open_kind, delimiter.open_text()),
            children,
            close: Token::synthetic(close_kind, delimiter.close_text()),
        }
    }

    /// Significant nodes of each comma-separated item at the top level of
    /// the group. Trivia is dropped; empty trailing items are omitted.
    pub fn items(&self) -> Vec<Vec<&Node>> {
        let mut items = Vec::new();
        let mut current = Vec::new();
        for node in &self.children {
            match node {
                Node::Token(token) if token.kind == TokenKind::Comma => {
                    items.push(std::mem::take(&mut current));
                }
                Node::Token(token) if token.is_trivia() => {}
                other => current.push(other),
            }
        }
        if !current.is_empty() {
            items.push(current);
        }
        items
    }
}

/// Call of a free function: `name(...)`, `\name(...)`, `Ns\name(...)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name tokens and any trivia before the argument list
    pub callee: Vec<Token>,
    /// Name as written, including namespace separators
    pub name: String,
    pub arguments: Group,
}

impl FunctionCall {
    /// Name without a leading namespace separator.
    pub fn resolved_name(&self) -> &str {
        self.name.trim_start_matches('\\')
    }
}

/// Kind of class-like declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Trait,
    Interface,
    Enum,
}

impl ClassKind {
    pub fn from_keyword(token: &Token) -> Option<Self> {
        if token.kind != TokenKind::Identifier {
            return None;
        }
        match token.text.to_ascii_lowercase().as_str() {
            "class" => Some(Self::Class),
            "trait" => Some(Self::Trait),
            "interface" => Some(Self::Interface),
            "enum" => Some(Self::Enum),
            _ => None,
        }
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClassKind::Class => "class",
            ClassKind::Trait => "trait",
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
        };
        write!(f, "{}", name)
    }
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn from_keyword(token: &Token) -> Option<Self> {
        if token.kind != TokenKind::Identifier {
            return None;
        }
        match token.text.to_ascii_lowercase().as_str() {
            "public" | "var" => Some(Self::Public),
            "protected" => Some(Self::Protected),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

/// Modifiers preceding a member declaration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub visibility: Option<Visibility>,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_readonly: bool,
}

impl Modifiers {
    /// Applies a modifier keyword; returns false if `token` is not one.
    pub fn apply(&mut self, token: &Token) -> bool {
        if let Some(visibility) = Visibility::from_keyword(token) {
            self.visibility = Some(visibility);
            return true;
        }
        if token.kind != TokenKind::Identifier {
            return false;
        }
        match token.text.to_ascii_lowercase().as_str() {
            "static" => self.is_static = true,
            "abstract" => self.is_abstract = true,
            "final" => self.is_final = true,
            "readonly" => self.is_readonly = true,
            _ => return false,
        }
        true
    }

    /// Members without an explicit visibility are public.
    pub fn visibility(&self) -> Visibility {
        self.visibility.unwrap_or(Visibility::Public)
    }
}

/// Constructor parameter that also declares a property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotedParameter {
    pub name: String,
    pub visibility: Visibility,
}

/// Method declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub modifiers: Modifiers,
    /// Every node of the declaration, from leading attributes to the body
    pub nodes: Vec<Node>,
    /// Index into `nodes` of the name token
    pub name_index: usize,
}

impl MethodDecl {
    pub fn name(&self) -> &str {
        match &self.nodes[self.name_index] {
            Node::Token(token) => &token.text,
            _ => "",
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.name().eq_ignore_ascii_case("__construct")
    }

    /// Parameter list: the first parenthesized group after the name.
    pub fn parameters(&self) -> Option<&Group> {
        self.nodes[self.name_index..].iter().find_map(|node| match node {
            Node::Group(group) if group.delimiter == Delimiter::Paren => Some(group),
            _ => None,
        })
    }

    /// Parameters carrying a visibility modifier (constructor promotion).
    pub fn promoted_parameters(&self) -> Vec<PromotedParameter> {
        let Some(parameters) = self.parameters() else {
            return Vec::new();
        };
        parameters
            .items()
            .into_iter()
            .filter_map(|item| {
                let mut modifiers = Modifiers::default();
                let mut name = None;
                for node in item {
                    if let Node::Token(token) = node {
                        if name.is_none() && !modifiers.apply(token) {
                            if let Some(var) = token.variable_name() {
                                name = Some(var.to_string());
                            }
                        }
                    }
                }
                let visibility = modifiers.visibility?;
                name.map(|name| PromotedParameter { name, visibility })
            })
            .collect()
    }
}

/// Property declaration (`private $a = 1, $b;`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub modifiers: Modifiers,
    pub nodes: Vec<Node>,
    /// Indices into `nodes` of the declared variable tokens
    pub name_indices: Vec<usize>,
}

impl PropertyDecl {
    pub fn names(&self) -> Vec<&str> {
        self.name_indices
            .iter()
            .filter_map(|&i| match &self.nodes[i] {
                Node::Token(token) => token.variable_name(),
                _ => None,
            })
            .collect()
    }
}

/// Member of a class-like body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Member {
    Method(MethodDecl),
    Property(PropertyDecl),
    /// Constants, enum cases, trait uses, trivia
    Other(Vec<Node>),
}

impl Member {
    pub fn nodes(&self) -> &[Node] {
        match self {
            Member::Method(method) => &method.nodes,
            Member::Property(property) => &property.nodes,
            Member::Other(nodes) => nodes,
        }
    }
}

/// Class, trait, interface, enum or anonymous class declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLike {
    pub kind: ClassKind,
    /// Keyword through the token before the body (name, extends, implements,
    /// anonymous class arguments)
    pub header: Vec<Node>,
    pub name: Option<String>,
    /// Parent class as written, without a leading `\`
    pub extends: Option<String>,
    pub open: Token,
    pub members: Vec<Member>,
    pub close: Token,
}

impl ClassLike {
    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }
}

/// Syntax tree node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Token(Token),
    Group(Group),
    Call(FunctionCall),
    ClassLike(ClassLike),
}

impl Node {
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Node::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_trivia(&self) -> bool {
        self.as_token().map_or(false, Token::is_trivia)
    }

    pub fn is_token_kind(&self, kind: TokenKind) -> bool {
        self.as_token().map_or(false, |t| t.kind == kind)
    }

    pub fn is_group(&self, delimiter: Delimiter) -> bool {
        matches!(self, Node::Group(group) if group.delimiter == delimiter)
    }

    /// Position of the first token of the node.
    pub fn position(&self) -> Position {
        match self {
            Node::Token(token) => token.position,
            Node::Group(group) => group.open.position,
            Node::Call(call) => call
                .callee
                .first()
                .map_or(call.arguments.open.position, |t| t.position),
            Node::ClassLike(class) => class
                .header
                .first()
                .map_or(class.open.position, Node::position),
        }
    }
}

/// Parsed PHP file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxTree {
    pub nodes: Vec<Node>,
}

impl SyntaxTree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Class-like declarations at any depth, in source order.
    pub fn classes(&self) -> Vec<&ClassLike> {
        struct Collector<'t> {
            found: Vec<&'t ClassLike>,
        }
        impl<'t> Visitor<'t> for Collector<'t> {
            fn enter(&mut self, node: &'t Node) -> VisitControl {
                if let Node::ClassLike(class) = node {
                    self.found.push(class);
                }
                VisitControl::Continue
            }
        }
        let mut collector = Collector { found: Vec::new() };
        walk(self, &mut collector);
        collector.found
    }
}
