/*!
# PHP Lexical Analyzer

Lossless tokenizer for PHP source files. Concatenating the printed text of
every token reproduces the input byte for byte.

Text outside `<?php ... ?>` is kept as a single inline HTML token. Inside code
regions the logos-generated [`TokenKind`] lexer runs until a close tag.
Double-quoted strings, backtick commands and heredocs that interpolate
variables are additionally split into parts, so renaming can reach the
variables embedded in them.

Everything after `__halt_compiler();` is raw data and becomes one trailing
inline token.
*/

use logos::{Lexer, Logos};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{ParseError, Position};

/// PHP token kinds
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    // Comments
    #[token("//", line_comment)]
    #[token("#", line_comment)]
    #[token("/*", block_comment)]
    Comment,
    #[token("/**", doc_comment)]
    DocComment,

    #[token("#[")]
    AttributeOpen,

    // Names
    #[regex(r"\$[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*")]
    Variable,
    #[regex(r"[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*")]
    Identifier,

    // Literals
    #[regex(r"[0-9][0-9_]*(\.[0-9_]*)?([eE][+-]?[0-9_]+)?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    #[regex(r"0[bB][01_]+")]
    #[regex(r"0[oO][0-7_]+")]
    Number,
    #[regex(r"'([^'\\]|\\(.|\n))*'")]
    SingleQuoted,
    #[token("\"", double_quoted)]
    DoubleQuoted,
    #[token("`", backtick)]
    Backtick,
    #[token("<<<", heredoc)]
    Heredoc,

    // Delimiters
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    // Member access
    #[token("->")]
    Arrow,
    #[token("?->")]
    NullsafeArrow,
    #[token("::")]
    DoubleColon,
    #[token("\\")]
    Backslash,
    #[token("$")]
    Dollar,

    #[regex(r"\?>(\r\n|\n|\r)?")]
    CloseTag,

    // Operators
    #[token("+")]
    #[token("++")]
    #[token("+=")]
    #[token("-")]
    #[token("--")]
    #[token("-=")]
    #[token("*")]
    #[token("**")]
    #[token("*=")]
    #[token("**=")]
    #[token("/")]
    #[token("/=")]
    #[token("%")]
    #[token("%=")]
    #[token(".")]
    #[token(".=")]
    #[token("...")]
    #[token("=")]
    #[token("==")]
    #[token("===")]
    #[token("=>")]
    #[token("!")]
    #[token("!=")]
    #[token("!==")]
    #[token("<")]
    #[token("<=")]
    #[token("<>")]
    #[token("<=>")]
    #[token("<<")]
    #[token("<<=")]
    #[token(">")]
    #[token(">=")]
    #[token(">>")]
    #[token(">>=")]
    #[token("&")]
    #[token("&&")]
    #[token("&=")]
    #[token("|")]
    #[token("||")]
    #[token("|=")]
    #[token("^")]
    #[token("^=")]
    #[token("~")]
    #[token("@")]
    #[token("?")]
    #[token("??")]
    #[token("??=")]
    #[token(":")]
    Operator,

    // Produced by PhpLexer, not by the logos automaton
    InlineHtml,
    OpenTag,
    StringFragment,
    EncapsedVarName,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "comment",
            TokenKind::DocComment => "doc comment",
            TokenKind::AttributeOpen => "'#['",
            TokenKind::Variable => "variable",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::SingleQuoted | TokenKind::DoubleQuoted => "string",
            TokenKind::Backtick => "shell command",
            TokenKind::Heredoc => "heredoc",
            TokenKind::OpenParen => "'('",
            TokenKind::CloseParen => "')'",
            TokenKind::OpenBracket => "'['",
            TokenKind::CloseBracket => "']'",
            TokenKind::OpenBrace => "'{'",
            TokenKind::CloseBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Arrow => "'->'",
            TokenKind::NullsafeArrow => "'?->'",
            TokenKind::DoubleColon => "'::'",
            TokenKind::Backslash => "'\\'",
            TokenKind::Dollar => "'$'",
            TokenKind::CloseTag => "'?>'",
            TokenKind::Operator => "operator",
            TokenKind::InlineHtml => "inline HTML",
            TokenKind::OpenTag => "open tag",
            TokenKind::StringFragment => "string fragment",
            TokenKind::EncapsedVarName => "interpolated name",
        };
        write!(f, "{}", name)
    }
}

fn line_comment(lex: &mut Lexer<TokenKind>) -> bool {
    let bytes = lex.remainder().as_bytes();
    let mut end = bytes.len();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' || b == b'\r' || (b == b'?' && bytes.get(i + 1) == Some(&b'>')) {
            end = i;
            break;
        }
    }
    lex.bump(end);
    true
}

fn block_comment(lex: &mut Lexer<TokenKind>) -> bool {
    // An unterminated comment runs to the end of the file, as in the engine.
    let rest = lex.remainder();
    let end = rest.find("*/").map_or(rest.len(), |i| i + 2);
    lex.bump(end);
    true
}

fn doc_comment(lex: &mut Lexer<TokenKind>) -> bool {
    if lex.remainder().starts_with('/') {
        // `/**/`
        lex.bump(1);
        return true;
    }
    block_comment(lex)
}

fn double_quoted(lex: &mut Lexer<TokenKind>) -> bool {
    let len = scan_quoted(lex.remainder(), b'"');
    bump_by(lex, len)
}

fn backtick(lex: &mut Lexer<TokenKind>) -> bool {
    let len = scan_quoted(lex.remainder(), b'`');
    bump_by(lex, len)
}

fn heredoc(lex: &mut Lexer<TokenKind>) -> bool {
    let len = scan_heredoc(lex.remainder());
    bump_by(lex, len)
}

fn bump_by(lex: &mut Lexer<TokenKind>, len: Option<usize>) -> bool {
    match len {
        Some(len) => {
            lex.bump(len);
            true
        }
        None => false,
    }
}

pub(crate) fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic() || (ch as u32) >= 0x80
}

pub(crate) fn is_ident_char(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

/// Whether `name` is a valid PHP label (variable/function/class name).
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().map_or(false, is_ident_start) && chars.all(is_ident_char)
}

fn starts_ident(text: &str, at: usize) -> bool {
    text.get(at..)
        .and_then(|rest| rest.chars().next())
        .map_or(false, is_ident_start)
}

fn ident_end(text: &str, start: usize) -> usize {
    text[start..]
        .char_indices()
        .find(|(_, ch)| !is_ident_char(*ch))
        .map_or(text.len(), |(i, _)| start + i)
}

/// Length of a quoted literal body up to and including the closing delimiter.
fn scan_quoted(rest: &str, delimiter: u8) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == delimiter => return Some(i + 1),
            b'{' if bytes.get(i + 1) == Some(&b'$') => i = skip_braced(rest, i)?,
            _ => i += 1,
        }
    }
    None
}

fn scan_single_quoted(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\'' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Index just past the `}` matching the `{` at `open`.
fn skip_braced(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            b'\'' => {
                i += 1 + scan_single_quoted(&text[i + 1..])?;
                continue;
            }
            b'"' => {
                i += 1 + scan_quoted(&text[i + 1..], b'"')?;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

struct HeredocHeader<'a> {
    label: &'a str,
    nowdoc: bool,
    len: usize,
}

/// Parses the part of a heredoc opener after `<<<`, through its newline.
fn heredoc_header(rest: &str) -> Option<HeredocHeader<'_>> {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while matches!(bytes.get(i), Some(b' ') | Some(b'\t')) {
        i += 1;
    }
    let quote = match bytes.get(i) {
        Some(&q) if q == b'\'' || q == b'"' => Some(q),
        _ => None,
    };
    if quote.is_some() {
        i += 1;
    }
    if !starts_ident(rest, i) {
        return None;
    }
    let end = ident_end(rest, i);
    let label = &rest[i..end];
    i = end;
    if let Some(q) = quote {
        if bytes.get(i) != Some(&q) {
            return None;
        }
        i += 1;
    }
    match bytes.get(i) {
        Some(b'\n') => i += 1,
        Some(b'\r') => {
            i += 1;
            if bytes.get(i) == Some(&b'\n') {
                i += 1;
            }
        }
        _ => return None,
    }
    Some(HeredocHeader {
        label,
        nowdoc: quote == Some(b'\''),
        len: i,
    })
}

/// Length of a heredoc/nowdoc after `<<<`, through the closing label.
/// The closing label may be indented (flexible heredoc syntax).
fn scan_heredoc(rest: &str) -> Option<usize> {
    let header = heredoc_header(rest)?;
    let mut line_start = header.len;
    loop {
        let line = &rest[line_start..];
        let trimmed = line.trim_start_matches(|c| c == ' ' || c == '\t');
        if trimmed.starts_with(header.label) {
            let end = line_start + (line.len() - trimmed.len()) + header.label.len();
            if !rest[end..].chars().next().map_or(false, is_ident_char) {
                return Some(end);
            }
        }
        line_start += line.find('\n')? + 1;
    }
}

/// Token with position information. Interpolated literals carry their
/// pieces in `parts`; when `parts` is non-empty it is authoritative for
/// printing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Token>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
            parts: Vec::new(),
        }
    }

    /// Token created by a rewrite; it has no place in the input.
    pub fn synthetic(kind: TokenKind, text: impl Into<String>) -> Self {
        Self::new(kind, text, Position::zero())
    }

    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::DocComment
        )
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::Comment | TokenKind::DocComment)
    }

    /// Case-insensitive keyword test (PHP keywords ignore case).
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text.eq_ignore_ascii_case(keyword)
    }

    pub fn is_interpolated(&self) -> bool {
        !self.parts.is_empty()
    }

    /// Name of a variable token without the sigil.
    pub fn variable_name(&self) -> Option<&str> {
        match self.kind {
            TokenKind::Variable => Some(&self.text[1..]),
            TokenKind::EncapsedVarName => Some(&self.text),
            _ => None,
        }
    }

    pub fn set_variable_name(&mut self, name: &str) {
        match self.kind {
            TokenKind::Variable => self.text = format!("${}", name),
            TokenKind::EncapsedVarName => self.text = name.to_string(),
            _ => {}
        }
    }

    /// Value of a constant string literal with escapes resolved.
    pub fn literal_value(&self) -> Option<String> {
        match self.kind {
            TokenKind::SingleQuoted => Some(unescape_single(&self.text[1..self.text.len() - 1])),
            TokenKind::DoubleQuoted if self.parts.is_empty() => {
                Some(unescape_double(&self.text[1..self.text.len() - 1]))
            }
            _ => None,
        }
    }

    pub fn write_to(&self, out: &mut String) {
        if self.parts.is_empty() {
            out.push_str(&self.text);
        } else {
            for part in &self.parts {
                part.write_to(out);
            }
        }
    }

    pub fn to_source(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        self.write_to(&mut out);
        out
    }
}

fn unescape_single(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.peek() {
                Some(&next @ ('\\' | '\'')) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push(ch),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn unescape_double(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let replacement = match chars.peek() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('v') => '\u{0B}',
            Some('e') => '\u{1B}',
            Some('f') => '\u{0C}',
            Some('\\') => '\\',
            Some('$') => '$',
            Some('"') => '"',
            _ => {
                out.push(ch);
                continue;
            }
        };
        out.push(replacement);
        chars.next();
    }
    out
}

/// Accumulates the parts of an interpolated literal. Parts are contiguous
/// slices of the literal text.
struct PartBuilder<'a> {
    text: &'a str,
    parts: Vec<Token>,
    emitted: usize,
    position: Position,
    interpolated: bool,
}

impl<'a> PartBuilder<'a> {
    fn new(text: &'a str, position: Position) -> Self {
        Self {
            text,
            parts: Vec::new(),
            emitted: 0,
            position,
            interpolated: false,
        }
    }

    fn push(&mut self, kind: TokenKind, end: usize) {
        if end <= self.emitted {
            return;
        }
        let piece = &self.text[self.emitted..end];
        self.parts.push(Token::new(kind, piece, self.position));
        self.position = self.position.advance(piece);
        self.emitted = end;
    }

    fn push_code(&mut self, end: usize) -> Result<(), ParseError> {
        let piece = &self.text[self.emitted..end];
        lex_code(piece, self.position, false, &mut self.parts)?;
        self.position = self.position.advance(piece);
        self.emitted = end;
        Ok(())
    }

    /// `$name->prop`, `$name?->prop` and `$name[key]` after a simple variable.
    fn simple_suffix(&mut self, at: usize, end: usize) -> usize {
        let text = self.text;
        let rest = &text[at..end];
        for (arrow, kind) in [("->", TokenKind::Arrow), ("?->", TokenKind::NullsafeArrow)] {
            if rest.starts_with(arrow) && starts_ident(text, at + arrow.len()) {
                let name_end = ident_end(text, at + arrow.len()).min(end);
                self.push(kind, at + arrow.len());
                self.push(TokenKind::Identifier, name_end);
                return name_end;
            }
        }
        if rest.starts_with('[') {
            if let Some(close) = rest.find(']') {
                let key = &rest[1..close];
                let plain = !key.is_empty()
                    && !key.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"');
                if plain {
                    self.push(TokenKind::OpenBracket, at + 1);
                    let key_kind = if key.len() > 1
                        && key.starts_with('$')
                        && is_valid_identifier(&key[1..])
                    {
                        TokenKind::Variable
                    } else {
                        TokenKind::StringFragment
                    };
                    self.push(key_kind, at + close);
                    self.push(TokenKind::CloseBracket, at + close + 1);
                    return at + close + 1;
                }
            }
        }
        at
    }

    fn scan(&mut self, start: usize, end: usize) -> Result<(), ParseError> {
        let text = self.text;
        let bytes = text.as_bytes();
        let mut i = start;
        while i < end {
            match bytes[i] {
                b'\\' => i += 2,
                b'$' if i + 1 < end && starts_ident(text, i + 1) => {
                    self.push(TokenKind::StringFragment, i);
                    let name_end = ident_end(text, i + 1).min(end);
                    self.push(TokenKind::Variable, name_end);
                    i = self.simple_suffix(name_end, end);
                    self.interpolated = true;
                }
                b'{' if bytes.get(i + 1) == Some(&b'$') => {
                    let close = skip_braced(&text[..end], i).ok_or_else(|| {
                        ParseError::lexical(self.position, "unterminated '{$' interpolation")
                    })?;
                    self.push(TokenKind::StringFragment, i);
                    self.push(TokenKind::OpenBrace, i + 1);
                    self.push_code(close - 1)?;
                    self.push(TokenKind::CloseBrace, close);
                    i = close;
                    self.interpolated = true;
                }
                b'$' if bytes.get(i + 1) == Some(&b'{') => {
                    let close = skip_braced(&text[..end], i + 1).ok_or_else(|| {
                        ParseError::lexical(self.position, "unterminated '${' interpolation")
                    })?;
                    self.push(TokenKind::StringFragment, i);
                    self.push(TokenKind::StringFragment, i + 2);
                    // `${name}` and `${name[expr]}` both name a variable
                    let inner_end = close - 1;
                    let name_end = if starts_ident(text, i + 2) {
                        ident_end(text, i + 2).min(inner_end)
                    } else {
                        i + 2
                    };
                    if name_end == inner_end {
                        self.push(TokenKind::EncapsedVarName, inner_end);
                    } else if name_end > i + 2 && text[name_end..inner_end].starts_with('[') {
                        self.push(TokenKind::EncapsedVarName, name_end);
                        self.push_code(inner_end)?;
                    } else {
                        self.push_code(inner_end)?;
                    }
                    self.push(TokenKind::StringFragment, close);
                    i = close;
                    self.interpolated = true;
                }
                _ => i += 1,
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Vec<Token> {
        if !self.interpolated {
            return Vec::new();
        }
        self.push(TokenKind::StringFragment, self.text.len());
        self.parts
    }
}

/// Splits an interpolating literal into parts. Constant literals and nowdocs
/// yield no parts.
fn split_interpolated(token: &Token) -> Result<Vec<Token>, ParseError> {
    let text = token.text.as_str();
    let (body_start, body_end) = match token.kind {
        TokenKind::DoubleQuoted | TokenKind::Backtick => (1, text.len() - 1),
        TokenKind::Heredoc => {
            let header = heredoc_header(&text[3..])
                .ok_or_else(|| ParseError::lexical(token.position, "malformed heredoc"))?;
            if header.nowdoc {
                return Ok(Vec::new());
            }
            let body_start = 3 + header.len;
            let closing_line = text.rfind('\n').map_or(body_start, |i| (i + 1).max(body_start));
            (body_start, closing_line)
        }
        _ => return Ok(Vec::new()),
    };

    let mut builder = PartBuilder::new(text, token.position);
    builder.scan(body_start, body_end)?;
    Ok(builder.finish())
}

const HALT_COMPILER: &str = "__halt_compiler";

/// Length of the `();` (or `()?>`) completing a `__halt_compiler` call.
fn halt_compiler_call(rest: &str) -> Option<usize> {
    let skip_ws = |from: usize| {
        rest[from..]
            .find(|c: char| !c.is_ascii_whitespace())
            .map_or(rest.len(), |i| from + i)
    };
    let open = skip_ws(0);
    if !rest[open..].starts_with('(') {
        return None;
    }
    let close = skip_ws(open + 1);
    if !rest[close..].starts_with(')') {
        return None;
    }
    let end = skip_ws(close + 1);
    let tail = &rest[end..];
    if tail.starts_with(';') {
        return Some(end + 1);
    }
    if tail.starts_with("?>") {
        let newline = match &tail[2..] {
            t if t.starts_with("\r\n") => 2,
            t if t.starts_with('\n') || t.starts_with('\r') => 1,
            _ => 0,
        };
        return Some(end + 2 + newline);
    }
    None
}

/// Lexes a code region. Returns the number of bytes consumed, which is the
/// whole input unless a close tag ends the region early.
fn lex_code(
    source: &str,
    start: Position,
    stop_at_close_tag: bool,
    tokens: &mut Vec<Token>,
) -> Result<usize, ParseError> {
    let mut lexer = TokenKind::lexer(source);
    let mut position = start;

    while let Some(result) = lexer.next() {
        let text = lexer.slice();
        let kind = match result {
            Ok(kind) => kind,
            Err(_) => {
                let message = match text.chars().next() {
                    Some('"') | Some('\'') | Some('`') => "unterminated string literal".to_string(),
                    Some('<') => "malformed heredoc".to_string(),
                    _ => format!("unexpected character {:?}", text),
                };
                return Err(ParseError::lexical(position, message));
            }
        };

        let mut token = Token::new(kind, text, position);
        token.parts = split_interpolated(&token)?;
        position = position.advance(text);
        tokens.push(token);

        if kind == TokenKind::CloseTag && stop_at_close_tag {
            return Ok(lexer.span().end);
        }

        let halts = kind == TokenKind::Identifier && text.eq_ignore_ascii_case(HALT_COMPILER);
        if halts && stop_at_close_tag {
            let offset = lexer.span().end;
            if let Some(len) = halt_compiler_call(&source[offset..]) {
                let call = &source[offset..offset + len];
                lex_code(call, position, false, tokens)?;
                position = position.advance(call);
                let data = &source[offset + len..];
                if !data.is_empty() {
                    tokens.push(Token::new(TokenKind::InlineHtml, data, position));
                }
                return Ok(source.len());
            }
        }
    }

    Ok(source.len())
}

/// Finds the next `<?php` (followed by whitespace or end of input) or `<?=`.
/// Returns its offset and length.
fn find_open_tag(text: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(found) = text[from..].find("<?") {
        let at = from + found;
        let after = &bytes[at + 2..];
        if after.first() == Some(&b'=') {
            return Some((at, 3));
        }
        if after.len() >= 3 && after[..3].eq_ignore_ascii_case(b"php") {
            match after.get(3) {
                None => return Some((at, 5)),
                Some(b) if b.is_ascii_whitespace() => return Some((at, 5)),
                _ => {}
            }
        }
        from = at + 2;
    }
    None
}

/// PHP lexer with position tracking
#[derive(Debug, Default, Clone, Copy)]
pub struct PhpLexer;

impl PhpLexer {
    pub fn new() -> Self {
        Self
    }

    /// Tokenize a PHP source file
    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut offset = 0;
        let mut position = Position::start();

        while offset < input.len() {
            let rest = &input[offset..];
            let Some((start, tag_len)) = find_open_tag(rest) else {
                tokens.push(Token::new(TokenKind::InlineHtml, rest, position));
                break;
            };

            if start > 0 {
                let html = &rest[..start];
                tokens.push(Token::new(TokenKind::InlineHtml, html, position));
                position = position.advance(html);
            }

            let tag = &rest[start..start + tag_len];
            tokens.push(Token::new(TokenKind::OpenTag, tag, position));
            position = position.advance(tag);
            offset += start + tag_len;

            let consumed = lex_code(&input[offset..], position, true, &mut tokens)?;
            position = position.advance(&input[offset..offset + consumed]);
            offset += consumed;
        }

        Ok(tokens)
    }
}
