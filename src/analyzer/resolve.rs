//! Type reference resolution and realization collection
//!
//! Resolution turns a syntactic `TypeExpr` into a `TypeInst` against the
//! package namespace. Failures produce `Unknown` instances so surrounding
//! traversals continue and may surface further errors.
//!
//! After every RPC signature is resolved, the realization pass walks the
//! reachable type instances and records, for each generic message, the
//! concrete argument tuples it must be emitted with. Tuples found inside
//! one realization can demand further realizations, so this is a worklist
//! fixpoint.

use crate::analyzer::builtins::Builtin;
use crate::analyzer::def::{Semantics, TypeHead, TypeInst};
use crate::analyzer::monomorph::realize;
use crate::ast::TypeExpr;
use crate::diagnostics::DiagnosticBag;
use crate::source::FileId;
use crate::span::Span;
use std::collections::{HashMap, HashSet, VecDeque};

/// Sentinel package id for files without a usable `package` declaration.
/// Their definitions still participate in analysis so later passes have
/// something to traverse; emission is blocked by the diagnostic anyway.
pub const UNKNOWN_PACKAGE: &str = "?";

/// What a name refers to in the two-level namespace
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Message { formals: Vec<String> },
    Enum,
    StringEnum,
    Service,
}

/// One registered symbol, with the span of its defining name for
/// redefinition cross-references.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub file: FileId,
    pub span: Span,
}

/// Flat `(packageId, name) -> symbol` table. Message fields hold symbolic
/// references, so the registry carries no cyclic pointers.
#[derive(Debug, Default)]
pub struct Registry {
    symbols: HashMap<(String, String), Symbol>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, package: &str, name: &str) -> Option<&Symbol> {
        self.symbols.get(&(package.to_string(), name.to_string()))
    }

    /// Insert a symbol; returns the existing one on redefinition.
    pub fn insert(&mut self, package: String, name: String, symbol: Symbol) -> Option<&Symbol> {
        let key = (package, name);
        if self.symbols.contains_key(&key) {
            return self.symbols.get(&key);
        }
        self.symbols.insert(key, symbol);
        None
    }

    /// Look up a name usable in type position. Services share the package
    /// namespace but are not types.
    fn type_symbol(&self, package: &str, name: &str) -> Option<&Symbol> {
        self.get(package, name)
            .filter(|s| s.kind != SymbolKind::Service)
    }
}

/// Resolve one type expression.
///
/// Order: a single-segment name matching a formal of the enclosing message
/// resolves to `Generic`; otherwise builtins, then the same-package
/// definition, then (with a dotted prefix) a direct `packageId = prefix`
/// match, then a relative `packageId = current + prefix` match.
pub fn resolve_type(
    registry: &Registry,
    current_package: &str,
    formals: &[String],
    expr: &TypeExpr,
    file: FileId,
    diagnostics: &mut DiagnosticBag,
) -> TypeInst {
    if !expr.complete || expr.segments.is_empty() {
        // The parser already reported the malformed subtree.
        return TypeInst::Unknown;
    }

    let name = &expr.segments.last().unwrap().name;

    if expr.segments.len() == 1 && formals.iter().any(|f| f == name) {
        // Arguments on a formal are diagnosed per-file; the instance
        // stays a plain generic so substitution works.
        return TypeInst::Generic { name: name.clone() };
    }

    let prefix: String = expr.segments[..expr.segments.len() - 1]
        .iter()
        .map(|s| s.name.as_str())
        .collect();

    // Excess arguments are still resolved so the user sees all errors.
    let args: Vec<TypeInst> = expr
        .args
        .iter()
        .map(|arg| resolve_type(registry, current_package, formals, arg, file, diagnostics))
        .collect();

    let check_arity = |arity: usize, diagnostics: &mut DiagnosticBag| {
        if args.len() > arity {
            diagnostics.global(
                file,
                expr.span,
                format!(
                    "Type \"{}\" expects {} type argument(s) but got {}",
                    name,
                    arity,
                    args.len()
                ),
            );
        }
    };

    if prefix.is_empty() {
        if let Some(builtin) = Builtin::lookup(name) {
            check_arity(builtin.arity(), diagnostics);
            return TypeInst::Real {
                head: TypeHead::Builtin { builtin },
                args,
            };
        }
    }

    let candidates = [
        Some(current_package.to_string()),
        (!prefix.is_empty()).then(|| prefix.clone()),
        (!prefix.is_empty() && current_package != UNKNOWN_PACKAGE)
            .then(|| format!("{}{}", current_package, prefix)),
    ];
    for package in candidates.into_iter().flatten() {
        if let Some(symbol) = registry.type_symbol(&package, name) {
            check_arity(symbol_arity(symbol), diagnostics);
            return TypeInst::Real {
                head: TypeHead::Def {
                    package,
                    name: name.clone(),
                },
                args,
            };
        }
    }

    unknown_type(expr, file, diagnostics)
}

fn symbol_arity(symbol: &Symbol) -> usize {
    match &symbol.kind {
        SymbolKind::Message { formals } => formals.len(),
        _ => 0,
    }
}

fn unknown_type(expr: &TypeExpr, file: FileId, diagnostics: &mut DiagnosticBag) -> TypeInst {
    diagnostics.global(
        file,
        expr.span,
        format!("Unknown type \"{}\"", expr.dotted()),
    );
    TypeInst::Unknown
}

/// Walk every RPC signature, then the fields of every message reached,
/// recording the concrete argument tuple of each generic message
/// encountered. Tuples are deduplicated structurally; discovery order is
/// preserved so emission is deterministic.
///
/// Non-generic messages are seeded unconditionally: they always emit a
/// serialize/deserialize pair, so any generic instantiation their fields
/// mention must exist even when no RPC reaches the message.
pub fn collect_realizations(semantics: &mut Semantics) {
    let mut found: HashMap<(String, String), Vec<Vec<TypeInst>>> = HashMap::new();
    let mut visited: HashSet<(String, String, Vec<TypeInst>)> = HashSet::new();
    let mut queue: VecDeque<(String, String, Vec<TypeInst>)> = VecDeque::new();

    for service in &semantics.services {
        for rpc in &service.rpcs {
            visit(&rpc.request.ty, semantics, &mut found, &mut visited, &mut queue);
            visit(&rpc.response.ty, semantics, &mut found, &mut visited, &mut queue);
        }
    }

    for message in &semantics.messages {
        if !message.is_generic() {
            let key = (message.package.clone(), message.name.clone(), Vec::new());
            if visited.insert(key) {
                queue.push_back((message.package.clone(), message.name.clone(), Vec::new()));
            }
        }
    }

    while let Some((package, name, args)) = queue.pop_front() {
        let Some(def) = semantics.message(&package, &name) else {
            continue;
        };
        let realized = realize(def, &args);
        for field in &realized.fields {
            visit(&field.ty, semantics, &mut found, &mut visited, &mut queue);
        }
    }

    for message in &mut semantics.messages {
        let key = (message.package.clone(), message.name.clone());
        message.realizations = found.remove(&key).unwrap_or_default();
    }
}

fn visit(
    inst: &TypeInst,
    semantics: &Semantics,
    found: &mut HashMap<(String, String), Vec<Vec<TypeInst>>>,
    visited: &mut HashSet<(String, String, Vec<TypeInst>)>,
    queue: &mut VecDeque<(String, String, Vec<TypeInst>)>,
) {
    if let TypeInst::Real { head, args } = inst {
        if let TypeHead::Def { package, name } = head {
            if let Some(def) = semantics.message(package, name) {
                if def.is_generic() {
                    let usable = args.len() == def.formals.len()
                        && args.iter().all(TypeInst::is_deeply_real);
                    if usable {
                        let key = (package.clone(), name.clone(), args.clone());
                        if visited.insert(key) {
                            found
                                .entry((package.clone(), name.clone()))
                                .or_default()
                                .push(args.clone());
                            queue.push_back((package.clone(), name.clone(), args.clone()));
                        }
                    }
                } else {
                    let key = (package.clone(), name.clone(), Vec::new());
                    if visited.insert(key) {
                        queue.push_back((package.clone(), name.clone(), Vec::new()));
                    }
                }
            }
        }
        for arg in args {
            visit(arg, semantics, found, visited, queue);
        }
    }
}
