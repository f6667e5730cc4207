//! TypeScript type rendering
//!
//! Maps resolved type instances to the TypeScript types used in emitted
//! interfaces and function signatures. Cross-file references are routed
//! through the `EmitCtx` so they land in the import block.

use crate::analyzer::{Builtin, TypeHead, TypeInst};
use crate::emit::imports::EmitCtx;

pub fn ts_type(ty: &TypeInst, ctx: &mut EmitCtx) -> String {
    match ty {
        TypeInst::Real { head, args } => match head {
            TypeHead::Builtin { builtin } => builtin_type(*builtin, args, ctx),
            TypeHead::Def { package, name } => {
                let alias = ctx.alias(package, name);
                if args.is_empty() {
                    alias
                } else {
                    format!("{}<{}>", alias, type_list(args, ctx))
                }
            }
        },
        TypeInst::Generic { name } => name.clone(),
        TypeInst::Unknown => "unknown".to_string(),
    }
}

fn builtin_type(builtin: Builtin, args: &[TypeInst], ctx: &mut EmitCtx) -> String {
    match builtin {
        Builtin::Int32
        | Builtin::Int64
        | Builtin::Uint32
        | Builtin::Uint64
        | Builtin::Float
        | Builtin::Double
        | Builtin::Sint32
        | Builtin::Sint64
        | Builtin::Fixed32
        | Builtin::Fixed64
        | Builtin::Sfixed32
        | Builtin::Sfixed64 => "number".to_string(),
        Builtin::Bool => "boolean".to_string(),
        Builtin::String => "string".to_string(),
        Builtin::Bytes => "Uint8Array".to_string(),
        Builtin::Date => "Date".to_string(),
        Builtin::Void => "void".to_string(),
        Builtin::Any => "any".to_string(),
        Builtin::Array => format!(
            "Array<{}>",
            ts_type(args.first().unwrap_or(&TypeInst::Unknown), ctx)
        ),
        Builtin::Nullable => format!(
            "{} | null",
            ts_type(args.first().unwrap_or(&TypeInst::Unknown), ctx)
        ),
        Builtin::Map => format!(
            "Map<{}, {}>",
            ts_type(args.first().unwrap_or(&TypeInst::Unknown), ctx),
            ts_type(args.get(1).unwrap_or(&TypeInst::Unknown), ctx)
        ),
    }
}

fn type_list(args: &[TypeInst], ctx: &mut EmitCtx) -> String {
    args.iter()
        .map(|arg| ts_type(arg, ctx))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A TypeScript string literal with proper escaping
pub fn ts_string(value: &str) -> String {
    serde_json::to_string(value).expect("string serialization cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Semantics;
    use crate::source::FileId;

    fn render(ty: &TypeInst) -> String {
        let semantics = Semantics::default();
        let mut ctx = EmitCtx::new(&semantics, FileId(0));
        ts_type(ty, &mut ctx)
    }

    #[test]
    fn test_scalars() {
        assert_eq!(render(&TypeInst::builtin(Builtin::Int32)), "number");
        assert_eq!(render(&TypeInst::builtin(Builtin::Bool)), "boolean");
        assert_eq!(render(&TypeInst::builtin(Builtin::Bytes)), "Uint8Array");
        assert_eq!(render(&TypeInst::builtin(Builtin::Date)), "Date");
    }

    #[test]
    fn test_containers() {
        let inner = TypeInst::builtin(Builtin::String);
        let array = TypeInst::Real {
            head: TypeHead::Builtin {
                builtin: Builtin::Array,
            },
            args: vec![inner.clone()],
        };
        assert_eq!(render(&array), "Array<string>");

        let nullable = TypeInst::Real {
            head: TypeHead::Builtin {
                builtin: Builtin::Nullable,
            },
            args: vec![array],
        };
        assert_eq!(render(&nullable), "Array<string> | null");
    }

    #[test]
    fn test_ts_string_escapes() {
        assert_eq!(ts_string("plain"), "\"plain\"");
        assert_eq!(ts_string("with \"quotes\""), "\"with \\\"quotes\\\"\"");
    }
}
