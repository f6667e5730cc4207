//! Resolved definitions and type instances
//!
//! Message fields hold *type instances*, not definition references: an
//! instance names its definition symbolically as `(packageId, name)` and is
//! looked up against the analysis output on demand. Mutually recursive
//! messages are therefore representable without ownership cycles.

use crate::analyzer::builtins::Builtin;
use crate::source::FileId;
use serde::Serialize;
use std::fmt;

/// What a `Real` type instance points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind")]
pub enum TypeHead {
    Builtin { builtin: Builtin },
    Def { package: String, name: String },
}

/// A use of a type. `Unknown` stands in for failed resolution so
/// surrounding traversals keep going.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind")]
pub enum TypeInst {
    Real {
        head: TypeHead,
        args: Vec<TypeInst>,
    },
    Generic {
        name: String,
    },
    Unknown,
}

impl TypeInst {
    pub fn builtin(builtin: Builtin) -> Self {
        TypeInst::Real {
            head: TypeHead::Builtin { builtin },
            args: Vec::new(),
        }
    }

    pub fn def(package: impl Into<String>, name: impl Into<String>, args: Vec<TypeInst>) -> Self {
        TypeInst::Real {
            head: TypeHead::Def {
                package: package.into(),
                name: name.into(),
            },
            args,
        }
    }

    /// True when the transitive argument tree contains no `Generic` and no
    /// `Unknown`. Only deeply-real instances may appear in RPC signatures
    /// and in realized message fields.
    pub fn is_deeply_real(&self) -> bool {
        match self {
            TypeInst::Real { args, .. } => args.iter().all(TypeInst::is_deeply_real),
            TypeInst::Generic { .. } | TypeInst::Unknown => false,
        }
    }

    /// The builtin behind this instance, if any
    pub fn as_builtin(&self) -> Option<Builtin> {
        match self {
            TypeInst::Real {
                head: TypeHead::Builtin { builtin },
                ..
            } => Some(*builtin),
            _ => None,
        }
    }
}

impl fmt::Display for TypeInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeInst::Real { head, args } => {
                match head {
                    TypeHead::Builtin { builtin } => write!(f, "{}", builtin)?,
                    TypeHead::Def { name, .. } => write!(f, "{}", name)?,
                }
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeInst::Generic { name } => write!(f, "{}", name),
            TypeInst::Unknown => write!(f, "?"),
        }
    }
}

/// One resolved message field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDef {
    pub ordinal: u32,
    pub name: String,
    pub optional: bool,
    pub ty: TypeInst,
}

/// A resolved message definition, together with the concrete argument
/// tuples it is realized with (empty for non-generic messages; filled by
/// the realization fixpoint for generic ones).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDef {
    pub package: String,
    pub name: String,
    pub formals: Vec<String>,
    pub fields: Vec<FieldDef>,
    pub realizations: Vec<Vec<TypeInst>>,
    pub file: FileId,
}

impl MessageDef {
    pub fn is_generic(&self) -> bool {
        !self.formals.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumMemberDef {
    pub name: String,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDef {
    pub package: String,
    pub name: String,
    pub members: Vec<EnumMemberDef>,
    pub file: FileId,
}

/// A flat set of string literals; logically equal duplicates are kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StringEnumDef {
    pub package: String,
    pub name: String,
    pub values: Vec<String>,
    pub file: FileId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcChannel {
    pub stream: bool,
    pub ty: TypeInst,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcDef {
    pub name: String,
    /// `"/<ServiceName>/<rpcName>"`
    pub path: String,
    pub request: RpcChannel,
    pub response: RpcChannel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDef {
    pub package: String,
    pub name: String,
    pub rpcs: Vec<RpcDef>,
    pub file: FileId,
}

/// The output of a global analysis pass: every resolved definition, in
/// file order then declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Semantics {
    pub messages: Vec<MessageDef>,
    pub enums: Vec<EnumDef>,
    pub string_enums: Vec<StringEnumDef>,
    pub services: Vec<ServiceDef>,
}

impl Semantics {
    pub fn message(&self, package: &str, name: &str) -> Option<&MessageDef> {
        self.messages
            .iter()
            .find(|m| m.package == package && m.name == name)
    }

    pub fn enum_def(&self, package: &str, name: &str) -> Option<&EnumDef> {
        self.enums
            .iter()
            .find(|e| e.package == package && e.name == name)
    }

    pub fn string_enum(&self, package: &str, name: &str) -> Option<&StringEnumDef> {
        self.string_enums
            .iter()
            .find(|s| s.package == package && s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deeply_real() {
        let int32 = TypeInst::builtin(Builtin::Int32);
        assert!(int32.is_deeply_real());

        let generic = TypeInst::Generic {
            name: "T".to_string(),
        };
        assert!(!generic.is_deeply_real());

        let nested = TypeInst::def("p", "Pagination", vec![int32.clone()]);
        assert!(nested.is_deeply_real());

        let half = TypeInst::def("p", "Pagination", vec![generic]);
        assert!(!half.is_deeply_real());
        assert!(!TypeInst::Unknown.is_deeply_real());
    }

    #[test]
    fn test_structural_equality() {
        let a = TypeInst::def("p", "Box", vec![TypeInst::builtin(Builtin::String)]);
        let b = TypeInst::def("p", "Box", vec![TypeInst::builtin(Builtin::String)]);
        let c = TypeInst::def("p", "Box", vec![TypeInst::builtin(Builtin::Bytes)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let inst = TypeInst::def(
            "p",
            "Response",
            vec![
                TypeInst::def("p", "Pagination", vec![TypeInst::builtin(Builtin::Int32)]),
                TypeInst::builtin(Builtin::Date),
            ],
        );
        assert_eq!(inst.to_string(), "Response<Pagination<int32>, Date>");
    }
}
