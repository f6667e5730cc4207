//! Generic monomorphization
//!
//! For a message `M<A, B>` and a realized tuple `(tA, tB)`, produce the
//! field list of `M` with every `Generic` occurrence substituted by the
//! matching concrete type. Substitution is a pure tree rewrite; ordinals
//! and optionality are preserved.

use crate::analyzer::def::{FieldDef, MessageDef, TypeInst};

/// Substitute the formal parameters of an enclosing message inside one
/// type instance. A `Generic` naming something outside `formals` is left
/// untouched (it cannot resolve, and the caller's realness checks catch
/// it).
pub fn substitute(inst: &TypeInst, formals: &[String], args: &[TypeInst]) -> TypeInst {
    match inst {
        TypeInst::Generic { name } => match formals.iter().position(|f| f == name) {
            Some(index) => args.get(index).cloned().unwrap_or(TypeInst::Unknown),
            None => inst.clone(),
        },
        TypeInst::Real { head, args: inner } => TypeInst::Real {
            head: head.clone(),
            args: inner
                .iter()
                .map(|a| substitute(a, formals, args))
                .collect(),
        },
        TypeInst::Unknown => TypeInst::Unknown,
    }
}

/// One realization of a generic message: the argument tuple plus the
/// substituted field list.
#[derive(Debug, Clone, PartialEq)]
pub struct RealizedMessage {
    pub args: Vec<TypeInst>,
    pub fields: Vec<FieldDef>,
}

/// Produce the realized field list of `def` under `args`.
pub fn realize(def: &MessageDef, args: &[TypeInst]) -> RealizedMessage {
    let fields = def
        .fields
        .iter()
        .map(|field| FieldDef {
            ordinal: field.ordinal,
            name: field.name.clone(),
            optional: field.optional,
            ty: substitute(&field.ty, &def.formals, args),
        })
        .collect();
    RealizedMessage {
        args: args.to_vec(),
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::builtins::Builtin;
    use crate::source::FileId;

    fn pagination() -> MessageDef {
        MessageDef {
            package: "p".to_string(),
            name: "Pagination".to_string(),
            formals: vec!["T".to_string()],
            fields: vec![
                FieldDef {
                    ordinal: 1,
                    name: "current".to_string(),
                    optional: false,
                    ty: TypeInst::Generic {
                        name: "T".to_string(),
                    },
                },
                FieldDef {
                    ordinal: 2,
                    name: "next".to_string(),
                    optional: true,
                    ty: TypeInst::Generic {
                        name: "T".to_string(),
                    },
                },
            ],
            realizations: Vec::new(),
            file: FileId(0),
        }
    }

    #[test]
    fn test_substitute_nested() {
        let formals = vec!["T".to_string()];
        let args = vec![TypeInst::builtin(Builtin::Int32)];
        let inst = TypeInst::Real {
            head: crate::analyzer::def::TypeHead::Builtin {
                builtin: Builtin::Array,
            },
            args: vec![TypeInst::Generic {
                name: "T".to_string(),
            }],
        };
        let out = substitute(&inst, &formals, &args);
        assert_eq!(out.to_string(), "Array<int32>");
        assert!(out.is_deeply_real());
    }

    #[test]
    fn test_realize_preserves_ordinals_and_optionality() {
        let def = pagination();
        let realized = realize(&def, &[TypeInst::builtin(Builtin::String)]);
        assert_eq!(realized.fields.len(), 2);
        assert_eq!(realized.fields[0].ordinal, 1);
        assert!(realized.fields[1].optional);
        assert!(realized.fields.iter().all(|f| f.ty.is_deeply_real()));
        assert_eq!(realized.fields[0].ty.to_string(), "string");
    }

    #[test]
    fn test_realize_with_deeply_real_args_is_deeply_real() {
        let def = pagination();
        let arg = TypeInst::def("p", "Box", vec![TypeInst::builtin(Builtin::Date)]);
        let realized = realize(&def, &[arg]);
        assert!(realized.fields.iter().all(|f| f.ty.is_deeply_real()));
    }
}
