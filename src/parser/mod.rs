/*!
# PHP Parser

Lossless parser for PHP source files built on a logos lexer.

## Features

- **Lossless lexing**: inline HTML, comments and whitespace are tokens
- **Interpolation aware**: variables inside strings and heredocs are tokens too
- **Shallow tree**: groups, calls, class-like declarations and their members
- **Position tracking** for diagnostics

## Usage

```rust
use php_obfuscator::parser::{printer, PhpParser};

let parser = PhpParser::new();
let tree = parser.parse_text("<?php class A { private $x; }")?;
assert_eq!(printer::print_tree(&tree), "<?php class A { private $x; }");
# Ok::<(), php_obfuscator::core::ParseError>(())
```
*/

pub mod ast;
pub mod grammar;
pub mod lexer;
pub mod printer;
pub mod visitor;

pub use ast::{
    ClassKind, ClassLike, Delimiter, FunctionCall, Group, Member, MethodDecl, Modifiers, Node,
    PropertyDecl, SyntaxTree, Visibility,
};
pub use lexer::{PhpLexer, Token, TokenKind};
pub use visitor::{walk, VisitControl, Visitor};

use crate::core::ParseError;

/// Main PHP parser
#[derive(Debug, Default, Clone, Copy)]
pub struct PhpParser {
    lexer: PhpLexer,
}

impl PhpParser {
    /// Creates a new parser instance
    pub fn new() -> Self {
        Self {
            lexer: PhpLexer::new(),
        }
    }

    /// Parses PHP code from string
    pub fn parse_text(&self, input: &str) -> Result<SyntaxTree, ParseError> {
        let tokens = self.lexer.tokenize(input)?;
        grammar::parse_tokens(tokens)
    }

    /// Tokenizes PHP code without building a tree
    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>, ParseError> {
        self.lexer.tokenize(input)
    }

    pub fn lexer(&self) -> &PhpLexer {
        &self.lexer
    }
}
