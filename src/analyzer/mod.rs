//! Semantic analysis for eproto schemas
//!
//! The analyzer is a session: files are added (or replaced, or removed)
//! one at a time, and a global pass resolves everything currently in the
//! session. This is the query surface the editor host drives — for each
//! document change it replaces that file and re-runs `analyze`.
//!
//! # Two phases
//!
//! 1. **Per file** (`set_file`): determine the file's package id,
//!    materialize unresolved definitions, and run every check that only
//!    needs the file itself (package placement, duplicate member names,
//!    ordinal rules, generic formal shape). These diagnostics are
//!    `Local` and are dropped when the file is replaced.
//! 2. **Global** (`analyze`): rebuild the symbol table over all files,
//!    diagnose redefinitions, resolve every field and RPC type, and
//!    collect the generic realization fixpoint. These diagnostics are
//!    `Global` and are recomputed as a whole, so running `analyze` twice
//!    over unchanged inputs yields identical results.

mod builtins;
mod def;
mod monomorph;
mod resolve;

pub use builtins::Builtin;
pub use def::{
    EnumDef, EnumMemberDef, FieldDef, MessageDef, RpcChannel, RpcDef, Semantics, ServiceDef,
    StringEnumDef, TypeHead, TypeInst,
};
pub use monomorph::{realize, substitute, RealizedMessage};
pub use resolve::{resolve_type, Registry, Symbol, SymbolKind, UNKNOWN_PACKAGE};

use crate::ast::{EnumDecl, FieldDecl, Item, MessageDecl, ServiceDecl, TypeExpr};
use crate::diagnostics::{DiagnosticBag, Related};
use crate::source::FileId;
use crate::span::Span;
use std::collections::{BTreeMap, HashSet};

/// Per-file analysis state kept for the lifetime of the session
#[derive(Debug)]
struct FileState {
    package: String,
    items: Vec<Item>,
}

/// The analysis session
#[derive(Debug, Default)]
pub struct Analyzer {
    files: BTreeMap<FileId, FileState>,
    diagnostics: DiagnosticBag,
    semantics: Semantics,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one file's parsed AST. Runs the per-file checks and
    /// invalidates the file's local diagnostics plus all global ones.
    pub fn set_file(&mut self, file: FileId, items: Vec<Item>) {
        self.diagnostics.drop_local(file);
        self.diagnostics.drop_global();

        let package = self.check_package(file, &items);
        for item in &items {
            match item {
                Item::Message(message) => self.check_message(file, message),
                Item::Enum(decl) => self.check_enum(file, decl),
                Item::Service(service) => self.check_service(file, service),
                Item::Package(_) | Item::StringEnum(_) => {}
            }
        }

        self.files.insert(file, FileState { package, items });
    }

    /// Drop one file from the session.
    pub fn remove_file(&mut self, file: FileId) {
        self.files.remove(&file);
        self.diagnostics.drop_local(file);
        self.diagnostics.drop_global();
    }

    pub fn diagnostics(&self) -> &DiagnosticBag {
        &self.diagnostics
    }

    /// The result of the last `analyze` call
    pub fn semantics(&self) -> &Semantics {
        &self.semantics
    }

    // ============ Phase 1: per-file checks ============

    fn check_package(&mut self, file: FileId, items: &[Item]) -> String {
        let packages: Vec<_> = items
            .iter()
            .filter_map(|item| match item {
                Item::Package(p) => Some(p),
                _ => None,
            })
            .collect();

        let Some(first) = packages.first() else {
            self.diagnostics
                .local(file, Span::at(0), "Missing package declaration");
            return UNKNOWN_PACKAGE.to_string();
        };

        if !matches!(items.first(), Some(Item::Package(_))) {
            self.diagnostics.local(
                file,
                first.span,
                "The package declaration must be the first declaration in the file",
            );
        }
        for extra in &packages[1..] {
            self.diagnostics
                .local(file, extra.span, "Multiple package declarations");
        }

        let id = first.package_id();
        if id.is_empty() {
            UNKNOWN_PACKAGE.to_string()
        } else {
            id
        }
    }

    fn check_message(&mut self, file: FileId, message: &MessageDecl) {
        let formals = message_formals(message);
        for arg in &message.head.args {
            if !arg.is_plain_ident() {
                self.diagnostics.local(
                    file,
                    arg.span,
                    format!(
                        "Generic parameter \"{}\" must be a plain identifier",
                        arg.dotted()
                    ),
                );
            }
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for field in complete_fields(message) {
            if !seen.insert(field.name.name.as_str()) {
                self.diagnostics.local(
                    file,
                    field.name.span,
                    format!("Field \"{}\" is already defined", field.name.name),
                );
            }
            check_generic_args(&field.ty, &formals, file, &mut self.diagnostics);
        }

        for (span, issue) in ordinal_issues(message) {
            let text = match issue {
                OrdinalIssue::NonPositive => "Field ordinal must be > 0",
                OrdinalIssue::NotSequential => "Field ordinal must be sequential",
            };
            self.diagnostics.local(file, span, text);
        }
    }

    fn check_enum(&mut self, file: FileId, decl: &EnumDecl) {
        let mut seen: HashSet<&str> = HashSet::new();
        for member in decl.members.iter().filter(|m| m.complete) {
            if !seen.insert(member.name.name.as_str()) {
                self.diagnostics.local(
                    file,
                    member.name.span,
                    format!("Enum member \"{}\" is already defined", member.name.name),
                );
            }
        }
    }

    fn check_service(&mut self, file: FileId, service: &ServiceDecl) {
        let mut seen: HashSet<&str> = HashSet::new();
        for rpc in service.rpcs.iter().filter(|r| r.complete) {
            if !seen.insert(rpc.name.name.as_str()) {
                self.diagnostics.local(
                    file,
                    rpc.name.span,
                    format!("Rpc \"{}\" is already defined", rpc.name.name),
                );
            }
        }
    }

    // ============ Phase 2: global analysis ============

    /// Resolve everything currently in the session. Global diagnostics are
    /// recomputed from scratch; local ones are left alone.
    pub fn analyze(&mut self) -> &Semantics {
        self.diagnostics.drop_global();

        let registry = self.build_registry();
        let mut semantics = Semantics::default();

        for (&file, state) in &self.files {
            let package = state.package.as_str();
            for item in &state.items {
                match item {
                    Item::Message(message) => {
                        let Some(name) = declared_name(&message.head) else {
                            continue;
                        };
                        if !is_first(&registry, package, name, file, message.head.span) {
                            continue;
                        }
                        let formals = message_formals(message);
                        let ordinals = effective_ordinals(message);
                        let fields = complete_fields(message)
                            .zip(ordinals)
                            .map(|(field, ordinal)| FieldDef {
                                ordinal,
                                name: field.name.name.clone(),
                                optional: field.optional,
                                ty: resolve_type(
                                    &registry,
                                    package,
                                    &formals,
                                    &field.ty,
                                    file,
                                    &mut self.diagnostics,
                                ),
                            })
                            .collect();
                        semantics.messages.push(MessageDef {
                            package: package.to_string(),
                            name: name.to_string(),
                            formals,
                            fields,
                            realizations: Vec::new(),
                            file,
                        });
                    }
                    Item::Enum(decl) => {
                        if decl.name.name.is_empty()
                            || !is_first(&registry, package, &decl.name.name, file, decl.name.span)
                        {
                            continue;
                        }
                        semantics.enums.push(EnumDef {
                            package: package.to_string(),
                            name: decl.name.name.clone(),
                            members: enum_members(decl),
                            file,
                        });
                    }
                    Item::StringEnum(decl) => {
                        if decl.name.name.is_empty()
                            || !is_first(&registry, package, &decl.name.name, file, decl.name.span)
                        {
                            continue;
                        }
                        semantics.string_enums.push(StringEnumDef {
                            package: package.to_string(),
                            name: decl.name.name.clone(),
                            values: decl.values.iter().map(|v| v.value.clone()).collect(),
                            file,
                        });
                    }
                    Item::Service(service) => {
                        if service.name.name.is_empty()
                            || !is_first(&registry, package, &service.name.name, file, service.name.span)
                        {
                            continue;
                        }
                        let rpcs = service
                            .rpcs
                            .iter()
                            .filter(|rpc| rpc.complete)
                            .map(|rpc| RpcDef {
                                name: rpc.name.name.clone(),
                                path: format!("/{}/{}", service.name.name, rpc.name.name),
                                request: RpcChannel {
                                    stream: rpc.request.stream,
                                    ty: resolve_type(
                                        &registry,
                                        package,
                                        &[],
                                        &rpc.request.ty,
                                        file,
                                        &mut self.diagnostics,
                                    ),
                                },
                                response: RpcChannel {
                                    stream: rpc.response.stream,
                                    ty: resolve_type(
                                        &registry,
                                        package,
                                        &[],
                                        &rpc.response.ty,
                                        file,
                                        &mut self.diagnostics,
                                    ),
                                },
                            })
                            .collect();
                        semantics.services.push(ServiceDef {
                            package: package.to_string(),
                            name: service.name.name.clone(),
                            rpcs,
                            file,
                        });
                    }
                    Item::Package(_) => {}
                }
            }
        }

        resolve::collect_realizations(&mut semantics);
        self.semantics = semantics;
        &self.semantics
    }

    /// Build the symbol table and report redefinitions. Files are walked
    /// in id order so the "first definition" is deterministic.
    fn build_registry(&mut self) -> Registry {
        let mut registry = Registry::new();
        for (&file, state) in &self.files {
            let package = state.package.clone();
            for item in &state.items {
                let (name, span, kind) = match item {
                    Item::Message(message) => match declared_name(&message.head) {
                        Some(name) => (
                            name.to_string(),
                            message.head.span,
                            SymbolKind::Message {
                                formals: message_formals(message),
                            },
                        ),
                        None => continue,
                    },
                    Item::Enum(decl) => {
                        (decl.name.name.clone(), decl.name.span, SymbolKind::Enum)
                    }
                    Item::StringEnum(decl) => (
                        decl.name.name.clone(),
                        decl.name.span,
                        SymbolKind::StringEnum,
                    ),
                    Item::Service(service) => (
                        service.name.name.clone(),
                        service.name.span,
                        SymbolKind::Service,
                    ),
                    Item::Package(_) => continue,
                };
                if name.is_empty() {
                    continue;
                }
                let symbol = Symbol { kind, file, span };
                if let Some(first) = registry.insert(package.clone(), name.clone(), symbol) {
                    let related = Related {
                        file: first.file,
                        span: first.span,
                        message: format!("\"{}\" was first defined here", name),
                    };
                    self.diagnostics.global_with_related(
                        file,
                        span,
                        format!(
                            "The name \"{}\" is already defined in package \"{}\"",
                            name, package
                        ),
                        related,
                    );
                }
            }
        }
        registry
    }
}

/// Is this definition the one the registry kept (the first one)?
fn is_first(registry: &Registry, package: &str, name: &str, file: FileId, span: Span) -> bool {
    registry
        .get(package, name)
        .map(|s| s.file == file && s.span == span)
        .unwrap_or(false)
}

/// The declared name of a message head, if one parsed.
fn declared_name(head: &TypeExpr) -> Option<&str> {
    head.name()
        .map(|ident| ident.name.as_str())
        .filter(|name| !name.is_empty())
}

/// Valid generic formals of a message: plain single identifiers among the
/// head's type arguments. Malformed formals are diagnosed per-file and
/// excluded from scope.
fn message_formals(message: &MessageDecl) -> Vec<String> {
    message
        .head
        .args
        .iter()
        .filter(|arg| arg.is_plain_ident())
        .filter_map(|arg| arg.name().map(|n| n.name.clone()))
        .collect()
}

fn complete_fields(message: &MessageDecl) -> impl Iterator<Item = &FieldDecl> {
    message.fields.iter().filter(|f| f.complete)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrdinalIssue {
    NonPositive,
    NotSequential,
}

/// Effective ordinals for a message's complete fields. The counter starts
/// at 1 and always moves forward; an explicit ordinal may only skip ahead.
fn effective_ordinals(message: &MessageDecl) -> Vec<u32> {
    run_ordinals(message).0
}

fn ordinal_issues(message: &MessageDecl) -> Vec<(Span, OrdinalIssue)> {
    run_ordinals(message).1
}

fn run_ordinals(message: &MessageDecl) -> (Vec<u32>, Vec<(Span, OrdinalIssue)>) {
    let mut counter: i64 = 1;
    let mut ordinals = Vec::new();
    let mut issues = Vec::new();
    for field in complete_fields(message) {
        if let Some(number) = field.ordinal {
            if number.value < 1 {
                issues.push((number.span, OrdinalIssue::NonPositive));
            } else if number.value < counter {
                issues.push((number.span, OrdinalIssue::NotSequential));
            } else {
                counter = number.value;
            }
        }
        ordinals.push(counter as u32);
        counter += 1;
    }
    (ordinals, issues)
}

/// A formal generic parameter is a name, not a constructor: using one
/// with type arguments is an error anywhere in a field's type tree.
fn check_generic_args(
    expr: &TypeExpr,
    formals: &[String],
    file: FileId,
    diagnostics: &mut DiagnosticBag,
) {
    if expr.segments.len() == 1 && !expr.args.is_empty() {
        let name = &expr.segments[0].name;
        if formals.iter().any(|f| f == name) {
            diagnostics.local(
                file,
                expr.span,
                format!("Generic parameter \"{}\" cannot take type arguments", name),
            );
        }
    }
    for arg in &expr.args {
        check_generic_args(arg, formals, file, diagnostics);
    }
}

/// Enum member values: sequential from 0, explicit values reset the
/// counter. Duplicate values are permitted.
fn enum_members(decl: &EnumDecl) -> Vec<EnumMemberDef> {
    let mut counter: i64 = 0;
    let mut members = Vec::new();
    for member in decl.members.iter().filter(|m| m.complete) {
        if let Some(number) = member.value {
            counter = number.value;
        }
        members.push(EnumMemberDef {
            name: member.name.name.clone(),
            value: counter as i32,
        });
        counter += 1;
    }
    members
}
