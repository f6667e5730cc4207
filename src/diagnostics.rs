//! Diagnostic collection
//!
//! Analysis never aborts on a schema error; it records a diagnostic and
//! keeps going. Every diagnostic is an error and carries the token span it
//! points at, plus an optional cross-reference to a related span (used by
//! redefinition errors to point at the first definition).
//!
//! Diagnostics have two invalidation scopes:
//! - `Local` entries belong to the file they were raised in and are dropped
//!   when that file is re-analyzed.
//! - `Global` entries may connect two files (a reference here, a definition
//!   there); they are cleared wholesale on any change and recomputed by the
//!   next global analysis.

use crate::source::FileId;
use crate::span::Span;
use serde::Serialize;
use std::collections::BTreeMap;

/// Invalidation scope of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scope {
    Local,
    Global,
}

/// A cross-reference attached to a diagnostic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Related {
    pub file: FileId,
    pub span: Span,
    pub message: String,
}

/// A single error diagnostic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub file: FileId,
    pub span: Span,
    pub scope: Scope,
    pub related: Option<Related>,
}

/// Collects diagnostics across all files of a session.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local(&mut self, file: FileId, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            message: message.into(),
            file,
            span,
            scope: Scope::Local,
            related: None,
        });
    }

    pub fn global(&mut self, file: FileId, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            message: message.into(),
            file,
            span,
            scope: Scope::Global,
            related: None,
        });
    }

    pub fn global_with_related(
        &mut self,
        file: FileId,
        span: Span,
        message: impl Into<String>,
        related: Related,
    ) {
        self.diagnostics.push(Diagnostic {
            message: message.into(),
            file,
            span,
            scope: Scope::Global,
            related: Some(related),
        });
    }

    /// Drop the local diagnostics of one file (it is being re-analyzed).
    pub fn drop_local(&mut self, file: FileId) {
        self.diagnostics
            .retain(|d| d.scope != Scope::Local || d.file != file);
    }

    /// Drop every global diagnostic (they are recomputed as a whole).
    pub fn drop_global(&mut self) {
        self.diagnostics.retain(|d| d.scope != Scope::Global);
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Diagnostics grouped by the file they attach to, for publishing.
    pub fn by_file(&self) -> BTreeMap<FileId, Vec<&Diagnostic>> {
        let mut map: BTreeMap<FileId, Vec<&Diagnostic>> = BTreeMap::new();
        for diag in &self.diagnostics {
            map.entry(diag.file).or_default().push(diag);
        }
        map
    }
}
