//! Comment stripping for PHP sources.

use crate::core::ParseError;
use crate::parser::lexer::{PhpLexer, Token, TokenKind};

/// Returns `source` without `//`, `#`, `/* */` and `/** */` comments.
/// Every other token is kept verbatim. Comment markers inside literals are
/// part of the literal and survive.
pub fn strip_comments(source: &str) -> Result<String, ParseError> {
    let tokens = PhpLexer::new().tokenize(source)?;
    Ok(strip_comment_tokens(&tokens))
}

/// Prints a token stream, skipping comments.
pub fn strip_comment_tokens(tokens: &[Token]) -> String {
    let mut out = String::with_capacity(tokens.iter().map(|t| t.text.len()).sum());
    for (i, token) in tokens.iter().enumerate() {
        if !token.is_comment() {
            token.write_to(&mut out);
            continue;
        }
        // A block comment may be the only separator between two tokens.
        let glued_before = out.chars().last().map_or(false, |c| !c.is_whitespace());
        let glued_after = tokens
            .get(i + 1)
            .map_or(false, |next| next.kind != TokenKind::Whitespace && !next.is_comment());
        if glued_before && glued_after {
            out.push(' ');
        }
    }
    out
}
