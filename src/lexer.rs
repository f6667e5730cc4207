//! Lexer for the eproto schema language
//!
//! Converts source text into a token stream. The stream always ends with an
//! `Eof` token at the final position. Characters outside the alphabet are
//! recorded as `Unknown` tokens with a diagnostic, and lexing continues.

use crate::diagnostics::DiagnosticBag;
use crate::source::FileId;
use crate::span::Span;
use crate::token::{Token, TokenKind};
use logos::Logos;

/// Tokenize one file. `source` must already be CRLF-normalized (the
/// `SourceMap` does this on ingest).
pub fn tokenize(file: FileId, source: &str, diagnostics: &mut DiagnosticBag) -> Vec<Token> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start, range.end);
        match result {
            Ok(kind) => tokens.push(Token::new(kind, span)),
            Err(()) => {
                let text = &source[range];
                diagnostics.local(file, span, format!("Unknown symbol \"{}\"", text));
                tokens.push(Token::new(TokenKind::Unknown, span));
            }
        }
    }

    tokens.push(Token::new(TokenKind::Eof, Span::at(source.len())));
    tokens
}

/// Decode a string literal token: strip the surrounding quotes and resolve
/// `\` escapes, which stand for the next code unit verbatim.
pub fn unquote(text: &str) -> String {
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> (Vec<Token>, DiagnosticBag) {
        let mut diagnostics = DiagnosticBag::new();
        let tokens = tokenize(FileId(0), source, &mut diagnostics);
        (tokens, diagnostics)
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_whitespace_only() {
        assert_eq!(kinds("  \t\n  "), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_keywords_and_idents() {
        assert_eq!(
            kinds("package message enum service rpc stream returns optional Pagination"),
            vec![
                TokenKind::Package,
                TokenKind::Message,
                TokenKind::Enum,
                TokenKind::Service,
                TokenKind::Rpc,
                TokenKind::Stream,
                TokenKind::Returns,
                TokenKind::Optional,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_symbols() {
        assert_eq!(
            kinds("< > ( ) ; { } = , ."),
            vec![
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Semi,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Eq,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_message_declaration() {
        let source = "message Pagination<T> { T current; optional T next; }";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Message,
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::Gt,
                TokenKind::LBrace,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Semi,
                TokenKind::Optional,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Semi,
                TokenKind::RBrace,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments_are_tokens() {
        let source = "// line\nmessage /* block */ M";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::LineComment,
                TokenKind::Message,
                TokenKind::BlockComment,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        let (tokens, diagnostics) = lex("enum /* never closed");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Enum, TokenKind::BlockComment, TokenKind::Eof]
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_symbol_is_diagnosed_and_kept() {
        let (tokens, diagnostics) = lex("message M @");
        assert_eq!(tokens[2].kind, TokenKind::Unknown);
        assert_eq!(diagnostics.len(), 1);
        let diag = diagnostics.iter().next().unwrap();
        assert_eq!(diag.message, "Unknown symbol \"@\"");
    }

    #[test]
    fn test_eof_span_at_end() {
        let (tokens, _) = lex("enum E");
        let eof = tokens.last().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!(eof.span, Span::at(6));
    }

    #[test]
    fn test_string_literal_and_unquote() {
        let source = r#""hello \"world\" \\ \n""#;
        let (tokens, _) = lex(source);
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(unquote(tokens[0].text(source)), r#"hello "world" \ n"#);
    }

    #[test]
    fn test_span_tracking() {
        let source = "enum E { A }";
        let (tokens, _) = lex(source);
        assert_eq!(tokens[0].span.text(source), "enum");
        assert_eq!(tokens[1].span.text(source), "E");
        assert_eq!(tokens[3].span.text(source), "A");
    }
}
