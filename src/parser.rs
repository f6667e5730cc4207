//! Parser for the eproto schema language
//!
//! A recursive descent parser that is tolerant of malformed input: a
//! missing required token records a diagnostic and marks the enclosing
//! node incomplete, but parsing continues. Productions that loop over a
//! `{ ... }` body guarantee forward progress by stepping one token
//! whenever a child production consumed nothing, so bad input can never
//! hang the parser.

use crate::ast::*;
use crate::diagnostics::DiagnosticBag;
use crate::lexer::unquote;
use crate::source::FileId;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parse one file's token stream. Comment tokens are stripped here; the
/// lexer keeps them in the stream for editor hosts.
pub fn parse(
    file: FileId,
    tokens: &[Token],
    source: &str,
    diagnostics: &mut DiagnosticBag,
) -> Vec<Item> {
    let mut parser = Parser::new(file, tokens, source, diagnostics);
    parser.parse_document()
}

struct Parser<'a> {
    file: FileId,
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: &'a mut DiagnosticBag,
}

impl<'a> Parser<'a> {
    fn new(
        file: FileId,
        tokens: &[Token],
        source: &'a str,
        diagnostics: &'a mut DiagnosticBag,
    ) -> Self {
        let mut tokens: Vec<Token> = tokens
            .iter()
            .copied()
            .filter(|t| !t.kind.is_comment())
            .collect();
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, Span::at(source.len())));
        }
        Self {
            file,
            source,
            tokens,
            pos: 0,
            diagnostics,
        }
    }

    // ============ Token helpers ============

    fn current(&self) -> Token {
        self.tokens[self.pos]
    }

    fn peek_nth(&self, n: usize) -> Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        self.tokens[idx]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn at_eof(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current();
        if !self.at_eof() {
            self.pos += 1;
        }
        token
    }

    /// Span of the last consumed token; used to close node spans.
    fn prev_span(&self) -> Span {
        if self.pos == 0 {
            Span::at(0)
        } else {
            self.tokens[self.pos - 1].span
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a required token, or record a diagnostic without consuming.
    fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.advance())
        } else {
            let found = self.current();
            self.diagnostics.local(
                self.file,
                found.span,
                format!(
                    "Expected {} but found {}",
                    describe(kind),
                    describe_token(found, self.source)
                ),
            );
            None
        }
    }

    fn text(&self, token: Token) -> &'a str {
        token.text(self.source)
    }

    fn ident(&mut self) -> Option<Ident> {
        let token = self.expect(TokenKind::Ident)?;
        Some(Ident {
            name: self.text(token).to_string(),
            span: token.span,
        })
    }

    /// A synthetic identifier standing in for a missing one
    fn missing_ident(&self) -> Ident {
        Ident {
            name: String::new(),
            span: Span::at(self.current().span.start),
        }
    }

    fn number(&mut self) -> Option<Number> {
        let token = self.expect(TokenKind::Number)?;
        let text = self.text(token);
        match text.parse::<i64>() {
            Ok(value) => Some(Number {
                value,
                span: token.span,
            }),
            Err(_) => {
                self.diagnostics.local(
                    self.file,
                    token.span,
                    format!("Number \"{}\" is out of range", text),
                );
                None
            }
        }
    }

    // ============ Productions ============

    fn parse_document(&mut self) -> Vec<Item> {
        let mut items = Vec::new();
        while !self.at_eof() {
            let before = self.pos;
            match self.current().kind {
                TokenKind::Package => items.push(Item::Package(self.parse_package())),
                TokenKind::Message => items.push(Item::Message(self.parse_message())),
                TokenKind::Enum => items.push(Item::Enum(self.parse_enum())),
                TokenKind::Service => items.push(Item::Service(self.parse_service())),
                TokenKind::Ident
                    if self.text(self.current()) == "string"
                        && self.peek_nth(1).kind == TokenKind::Enum =>
                {
                    items.push(Item::StringEnum(self.parse_string_enum()))
                }
                _ => {
                    let found = self.current();
                    self.diagnostics.local(
                        self.file,
                        found.span,
                        format!(
                            "Expected declaration but found {}",
                            describe_token(found, self.source)
                        ),
                    );
                }
            }
            if self.pos == before {
                self.advance();
            }
        }
        items
    }

    fn parse_package(&mut self) -> PackageDecl {
        let start = self.advance().span;
        let (segments, mut complete) = self.dotted();
        if self.expect(TokenKind::Semi).is_none() {
            complete = false;
        }
        PackageDecl {
            segments,
            span: start.merge(self.prev_span()),
            complete,
        }
    }

    fn dotted(&mut self) -> (Vec<Ident>, bool) {
        let mut segments = Vec::new();
        match self.ident() {
            Some(id) => segments.push(id),
            None => return (segments, false),
        }
        while self.eat(TokenKind::Dot) {
            match self.ident() {
                Some(id) => segments.push(id),
                None => return (segments, false),
            }
        }
        (segments, true)
    }

    fn parse_type(&mut self) -> TypeExpr {
        let start = self.current().span;
        let start_pos = self.pos;
        let (segments, mut complete) = self.dotted();
        let mut args = Vec::new();
        if self.eat(TokenKind::Lt) {
            loop {
                let before = self.pos;
                let arg = self.parse_type();
                if self.pos == before {
                    complete = false;
                    break;
                }
                args.push(arg);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            if self.expect(TokenKind::Gt).is_none() {
                complete = false;
            }
        }
        let complete = complete && args.iter().all(|a| a.complete);
        let span = if self.pos == start_pos {
            Span::at(start.start)
        } else {
            start.merge(self.prev_span())
        };
        TypeExpr {
            segments,
            args,
            span,
            complete,
        }
    }

    fn parse_message(&mut self) -> MessageDecl {
        let start = self.advance().span;
        let head = self.parse_type();
        let mut complete = head.complete && !head.segments.is_empty();
        let mut fields = Vec::new();
        if self.expect(TokenKind::LBrace).is_some() {
            while !self.at(TokenKind::RBrace) && !self.at_eof() {
                let before = self.pos;
                let field = self.parse_field();
                if self.pos == before {
                    // The child made no progress; step over the offending
                    // token so the loop terminates.
                    self.advance();
                    continue;
                }
                fields.push(field);
            }
            if self.expect(TokenKind::RBrace).is_none() {
                complete = false;
            }
        } else {
            complete = false;
        }
        MessageDecl {
            head,
            fields,
            span: start.merge(self.prev_span()),
            complete,
        }
    }

    fn parse_field(&mut self) -> FieldDecl {
        let start = self.current().span;
        let optional = self.eat(TokenKind::Optional);
        let ty = self.parse_type();
        let mut complete = ty.complete && !ty.segments.is_empty();
        if ty.segments.is_empty() && !self.at(TokenKind::Ident) {
            // Nothing recognizable here; leave the token for the caller.
            return FieldDecl {
                optional,
                ty,
                name: self.missing_ident(),
                ordinal: None,
                span: Span::at(start.start),
                complete: false,
            };
        }
        let name = match self.ident() {
            Some(name) => name,
            None => {
                complete = false;
                self.missing_ident()
            }
        };
        let ordinal = if self.eat(TokenKind::Eq) {
            let number = self.number();
            if number.is_none() {
                complete = false;
            }
            number
        } else {
            None
        };
        if self.expect(TokenKind::Semi).is_none() {
            complete = false;
        }
        FieldDecl {
            optional,
            ty,
            name,
            ordinal,
            span: start.merge(self.prev_span()),
            complete,
        }
    }

    fn parse_enum(&mut self) -> EnumDecl {
        let start = self.advance().span;
        let mut complete = true;
        let name = match self.ident() {
            Some(name) => name,
            None => {
                complete = false;
                self.missing_ident()
            }
        };
        let mut members = Vec::new();
        if self.expect(TokenKind::LBrace).is_some() {
            while !self.at(TokenKind::RBrace) && !self.at_eof() {
                let before = self.pos;
                let member = self.parse_enum_member();
                if self.pos == before {
                    self.advance();
                    continue;
                }
                members.push(member);
                if !self.eat(TokenKind::Comma) && !self.at(TokenKind::RBrace) {
                    self.expect(TokenKind::Comma);
                    complete = false;
                }
            }
            if self.expect(TokenKind::RBrace).is_none() {
                complete = false;
            }
        } else {
            complete = false;
        }
        EnumDecl {
            name,
            members,
            span: start.merge(self.prev_span()),
            complete,
        }
    }

    fn parse_enum_member(&mut self) -> EnumMember {
        let start = self.current().span;
        let (name, mut complete) = match self.ident() {
            Some(name) => (name, true),
            None => (self.missing_ident(), false),
        };
        let value = if self.eat(TokenKind::Eq) {
            let number = self.number();
            if number.is_none() {
                complete = false;
            }
            number
        } else {
            None
        };
        EnumMember {
            name,
            value,
            span: start.merge(self.prev_span()),
            complete,
        }
    }

    fn parse_string_enum(&mut self) -> StringEnumDecl {
        let start = self.advance().span; // the `string` identifier
        self.expect(TokenKind::Enum);
        let mut complete = true;
        let name = match self.ident() {
            Some(name) => name,
            None => {
                complete = false;
                self.missing_ident()
            }
        };
        let mut values = Vec::new();
        if self.expect(TokenKind::LBrace).is_some() {
            while !self.at(TokenKind::RBrace) && !self.at_eof() {
                let before = self.pos;
                if let Some(token) = self.expect(TokenKind::Str) {
                    values.push(StrLit {
                        value: unquote(self.text(token)),
                        span: token.span,
                    });
                    if !self.eat(TokenKind::Comma) && !self.at(TokenKind::RBrace) {
                        self.expect(TokenKind::Comma);
                        complete = false;
                    }
                }
                if self.pos == before {
                    self.advance();
                    complete = false;
                }
            }
            if self.expect(TokenKind::RBrace).is_none() {
                complete = false;
            }
        } else {
            complete = false;
        }
        StringEnumDecl {
            name,
            values,
            span: start.merge(self.prev_span()),
            complete,
        }
    }

    fn parse_service(&mut self) -> ServiceDecl {
        let start = self.advance().span;
        let mut complete = true;
        let name = match self.ident() {
            Some(name) => name,
            None => {
                complete = false;
                self.missing_ident()
            }
        };
        let mut rpcs = Vec::new();
        if self.expect(TokenKind::LBrace).is_some() {
            while !self.at(TokenKind::RBrace) && !self.at_eof() {
                let before = self.pos;
                if self.at(TokenKind::Rpc) {
                    rpcs.push(self.parse_rpc());
                } else {
                    let found = self.current();
                    self.diagnostics.local(
                        self.file,
                        found.span,
                        format!(
                            "Expected rpc but found {}",
                            describe_token(found, self.source)
                        ),
                    );
                }
                if self.pos == before {
                    self.advance();
                }
            }
            if self.expect(TokenKind::RBrace).is_none() {
                complete = false;
            }
        } else {
            complete = false;
        }
        ServiceDecl {
            name,
            rpcs,
            span: start.merge(self.prev_span()),
            complete,
        }
    }

    fn parse_rpc(&mut self) -> RpcDecl {
        let start = self.advance().span;
        let mut complete = true;
        let name = match self.ident() {
            Some(name) => name,
            None => {
                complete = false;
                self.missing_ident()
            }
        };
        let request = self.parse_rpc_type(&mut complete);
        if self.expect(TokenKind::Returns).is_none() {
            complete = false;
        }
        let response = self.parse_rpc_type(&mut complete);
        if self.expect(TokenKind::Semi).is_none() {
            complete = false;
        }
        RpcDecl {
            name,
            request,
            response,
            span: start.merge(self.prev_span()),
            complete,
        }
    }

    fn parse_rpc_type(&mut self, complete: &mut bool) -> RpcType {
        if self.expect(TokenKind::LParen).is_none() {
            *complete = false;
        }
        let stream = self.eat(TokenKind::Stream);
        let ty = self.parse_type();
        if !ty.complete || ty.segments.is_empty() {
            *complete = false;
        }
        if self.expect(TokenKind::RParen).is_none() {
            *complete = false;
        }
        RpcType { stream, ty }
    }
}

fn describe(kind: TokenKind) -> String {
    match kind {
        TokenKind::Ident => "identifier".to_string(),
        TokenKind::Number => "number".to_string(),
        TokenKind::Str => "string literal".to_string(),
        TokenKind::Eof => "end of file".to_string(),
        other => format!("\"{}\"", other),
    }
}

fn describe_token(token: Token, source: &str) -> String {
    match token.kind {
        TokenKind::Eof => "end of file".to_string(),
        _ => format!("\"{}\"", token.text(source)),
    }
}
