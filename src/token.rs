//! Token definitions for the eproto schema language
//!
//! This module defines all the tokens the lexer can produce. Comments are
//! tokens too: they stay in the stream so an editor host can color them,
//! and are stripped at parser entry.

use crate::span::Span;
use logos::Logos;
use std::fmt;

/// A token produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Get the text of this token from source
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

/// All possible token types in an eproto schema
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n]+")]
pub enum TokenKind {
    // ============ Keywords ============

    #[token("package")]
    Package,
    #[token("message")]
    Message,
    #[token("enum")]
    Enum,
    #[token("service")]
    Service,
    #[token("rpc")]
    Rpc,
    #[token("stream")]
    Stream,
    #[token("returns")]
    Returns,
    #[token("optional")]
    Optional,

    // ============ Literals ============

    /// Identifier: Pagination, int32, _name
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// Decimal digit run: field ordinals and enum values
    #[regex(r"[0-9]+")]
    Number,

    /// Double-quoted string; `\` escapes the next code unit verbatim
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    // ============ Comments ============

    #[regex(r"//[^\n]*")]
    LineComment,
    #[token("/*", lex_block_comment)]
    BlockComment,

    // ============ Symbols ============

    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semi,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("=")]
    Eq,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    // ============ Special ============

    /// Character outside the alphabet; kept so the parser can step over it
    Unknown,

    /// End of file
    Eof,
}

/// Block comments are scanned manually over the remainder so an
/// unterminated `/*` still produces a comment token instead of an error
/// cascade.
fn lex_block_comment(lex: &mut logos::Lexer<'_, TokenKind>) -> bool {
    let rest = lex.remainder().as_bytes();
    match rest.windows(2).position(|w| w == b"*/") {
        Some(pos) => lex.bump(pos + 2),
        None => lex.bump(rest.len()),
    }
    true
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Package
                | TokenKind::Message
                | TokenKind::Enum
                | TokenKind::Service
                | TokenKind::Rpc
                | TokenKind::Stream
                | TokenKind::Returns
                | TokenKind::Optional
        )
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Package => "package",
            TokenKind::Message => "message",
            TokenKind::Enum => "enum",
            TokenKind::Service => "service",
            TokenKind::Rpc => "rpc",
            TokenKind::Stream => "stream",
            TokenKind::Returns => "returns",
            TokenKind::Optional => "optional",
            TokenKind::Ident => "identifier",
            TokenKind::Number => "number",
            TokenKind::Str => "string",
            TokenKind::LineComment | TokenKind::BlockComment => "comment",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Semi => ";",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Eq => "=",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Unknown => "unknown",
            TokenKind::Eof => "end of file",
        };
        write!(f, "{}", s)
    }
}
