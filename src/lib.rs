//! eproto Schema Compiler
//!
//! Compiles `.eproto` interface definitions into wire-compatible
//! serialization code and RPC service descriptors for a TypeScript
//! runtime.
//!
//! # Architecture
//!
//! ```text
//! Source Files (.eproto)
//!       │
//!       ▼
//! ┌─────────────┐
//! │    Lexer    │  → Tokens (comments included, spans everywhere)
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │   Parser    │  → Permissive AST (completeness flags)
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │  Analyzer   │  → Resolved definitions + generic realizations
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │   GenIR     │  → Serialize/deserialize combinator trees
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │   Emitter   │  → TypeScript (or zod schema) output
//! └─────────────┘
//! ```
//!
//! Schema errors never abort a pass: they are collected as diagnostics
//! and the affected subtree keeps traversing with placeholder values, so
//! one compile surfaces as many errors as possible.

pub mod analyzer;
pub mod ast;
pub mod diagnostics;
pub mod driver;
pub mod emit;
pub mod genir;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod span;
pub mod token;

// Re-exports for convenience
pub use diagnostics::{Diagnostic, DiagnosticBag, Scope};
pub use source::{FileId, SourceMap};
pub use span::{Position, Span};
pub use token::{Token, TokenKind};

/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File extension for eproto schema files
pub const FILE_EXTENSION: &str = "eproto";
