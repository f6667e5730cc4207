//! Abstract Syntax Tree for eproto schemas
//!
//! The AST is deliberately permissive: every node carries a `complete` flag
//! that is true only when all required sub-parts parsed. Downstream passes
//! pattern-match on the tagged variants and skip incomplete subtrees
//! instead of relying on exceptions for control flow.
//!
//! All nodes derive `Serialize` so the CLI can dump the parsed tree as JSON.

use crate::span::Span;
use serde::Serialize;

/// An identifier with its source span
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// A numeric literal with its source span
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Number {
    pub value: i64,
    pub span: Span,
}

/// A string literal (decoded) with its source span
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrLit {
    pub value: String,
    pub span: Span,
}

/// A type expression: a dotted name with optional type arguments.
///
/// `current.Response<Pagination<int32>, Date>` parses to segments
/// `[current, Response]` and two argument subtrees. Message heads reuse
/// this production, so generic formals arrive as type arguments and are
/// validated during analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeExpr {
    pub segments: Vec<Ident>,
    pub args: Vec<TypeExpr>,
    pub span: Span,
    pub complete: bool,
}

impl TypeExpr {
    /// The dotted source form, for diagnostics
    pub fn dotted(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The final segment: the type name itself
    pub fn name(&self) -> Option<&Ident> {
        self.segments.last()
    }

    /// True for a bare single-segment name without arguments
    pub fn is_plain_ident(&self) -> bool {
        self.segments.len() == 1 && self.args.is_empty()
    }
}

/// Top-level nodes of one file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Item {
    Package(PackageDecl),
    Message(MessageDecl),
    Enum(EnumDecl),
    StringEnum(StringEnumDecl),
    Service(ServiceDecl),
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Package(p) => p.span,
            Item::Message(m) => m.span,
            Item::Enum(e) => e.span,
            Item::StringEnum(s) => s.span,
            Item::Service(s) => s.span,
        }
    }
}

/// `package current.api;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageDecl {
    pub segments: Vec<Ident>,
    pub span: Span,
    pub complete: bool,
}

impl PackageDecl {
    /// The internal package id: identifier values concatenated without
    /// separators (`package a.b;` has id `ab`).
    pub fn package_id(&self) -> String {
        self.segments.iter().map(|s| s.name.as_str()).collect()
    }
}

/// `message Response<TPag, TItem> { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDecl {
    /// The declared head, including generic formals as type arguments
    pub head: TypeExpr,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
    pub complete: bool,
}

/// `optional Array<TItem> items = 4;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDecl {
    pub optional: bool,
    pub ty: TypeExpr,
    pub name: Ident,
    pub ordinal: Option<Number>,
    pub span: Span,
    pub complete: bool,
}

/// `enum Color { red, green = 4 }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDecl {
    pub name: Ident,
    pub members: Vec<EnumMember>,
    pub span: Span,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumMember {
    pub name: Ident,
    pub value: Option<Number>,
    pub span: Span,
    pub complete: bool,
}

/// `string enum Status { "active", "archived" }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StringEnumDecl {
    pub name: Ident,
    pub values: Vec<StrLit>,
    pub span: Span,
    pub complete: bool,
}

/// `service TestService { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDecl {
    pub name: Ident,
    pub rpcs: Vec<RpcDecl>,
    pub span: Span,
    pub complete: bool,
}

/// `rpc test(stream Request) returns (Response);`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcDecl {
    pub name: Ident,
    pub request: RpcType,
    pub response: RpcType,
    pub span: Span,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcType {
    pub stream: bool,
    pub ty: TypeExpr,
}
