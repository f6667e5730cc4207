//! Runtime-validation schema emission (zod)
//!
//! A thin mapping from resolved definitions to zod schema constants, one
//! output file per input file. Generic messages emit one schema per
//! realization, suffixed with the realization index; message references
//! go through `z.lazy` so mutually recursive schemas initialize cleanly.
//! Enums are emitted as the TypeScript enum object itself and validated
//! with `z.nativeEnum` at every reference.

use crate::analyzer::{realize, Builtin, MessageDef, Semantics, TypeHead, TypeInst};
use crate::emit::imports::EmitCtx;
use crate::emit::types::ts_string;
use crate::emit::{Lines, Output};
use crate::source::{SourceFile, SourceMap};

pub fn emit_zod(semantics: &Semantics, sources: &SourceMap) -> Vec<Output> {
    sources
        .iter()
        .map(|file| emit_file(semantics, sources, file))
        .collect()
}

fn emit_file(semantics: &Semantics, sources: &SourceMap, file: &SourceFile) -> Output {
    let out_path = file.path.with_extension("ts");
    let mut ctx = EmitCtx::new(semantics, file.id);
    let mut body = Lines::new(0);

    for def in semantics.enums.iter().filter(|d| d.file == file.id) {
        // The enum object itself; references validate it with
        // `z.nativeEnum`.
        super::emit_enum(def, &mut body);
        body.blank();
    }

    for def in semantics.string_enums.iter().filter(|d| d.file == file.id) {
        let schema = if def.values.is_empty() {
            "z.never()".to_string()
        } else {
            let literals: Vec<String> = def.values.iter().map(|v| ts_string(v)).collect();
            format!("z.enum([{}])", literals.join(", "))
        };
        body.push(format!("export const {} = {};", def.name, schema));
        body.blank();
    }

    for def in semantics.messages.iter().filter(|d| d.file == file.id) {
        if def.is_generic() {
            for (index, args) in def.realizations.iter().enumerate() {
                let shown = TypeInst::def(def.package.clone(), def.name.clone(), args.clone());
                body.push(format!("// {}", shown));
                emit_message(def, args, Some(index), &mut ctx, &mut body);
                body.blank();
            }
        } else {
            emit_message(def, &[], None, &mut ctx, &mut body);
            body.blank();
        }
    }

    let mut lines: Vec<String> = vec![
        super::HEADER.to_string(),
        String::new(),
        "import { z } from \"zod\";".to_string(),
    ];
    lines.extend(ctx.import_lines(sources, &out_path));
    lines.push(String::new());
    lines.extend(body.into_vec());

    Output {
        path: out_path,
        contents: super::finish(lines),
    }
}

fn emit_message(
    def: &MessageDef,
    args: &[TypeInst],
    index: Option<usize>,
    ctx: &mut EmitCtx,
    out: &mut Lines,
) {
    let suffix = index.map(|i| i.to_string()).unwrap_or_default();
    let fields = if def.is_generic() {
        realize(def, args).fields
    } else {
        def.fields.clone()
    };
    out.push(format!("export const {}{} = z.object({{", def.name, suffix));
    out.indent();
    for field in &fields {
        let mut schema = zod_type(&field.ty, ctx);
        if field.optional {
            schema = format!("{}.optional()", schema);
        }
        out.push(format!("{}: {},", field.name, schema));
    }
    out.dedent();
    out.push("});");
}

fn zod_type(ty: &TypeInst, ctx: &mut EmitCtx) -> String {
    match ty {
        TypeInst::Real { head, args } => match head {
            TypeHead::Builtin { builtin } => zod_builtin(*builtin, args, ctx),
            TypeHead::Def { package, name } => {
                if let Some(def) = ctx.semantics.message(package, name) {
                    let symbol = if def.is_generic() {
                        let index = def
                            .realizations
                            .iter()
                            .position(|tuple| tuple.as_slice() == args.as_slice())
                            .unwrap_or_else(|| {
                                panic!(
                                    "Missing realization of {}.{}. This is a bug.",
                                    package, name
                                )
                            });
                        format!("{}{}", name, index)
                    } else {
                        name.clone()
                    };
                    let alias = ctx.alias_member(package, name, &symbol);
                    format!("z.lazy(() => {})", alias)
                } else if ctx.semantics.enum_def(package, name).is_some() {
                    format!("z.nativeEnum({})", ctx.alias(package, name))
                } else {
                    ctx.alias(package, name)
                }
            }
        },
        TypeInst::Generic { .. } | TypeInst::Unknown => "z.any()".to_string(),
    }
}

fn zod_builtin(builtin: Builtin, args: &[TypeInst], ctx: &mut EmitCtx) -> String {
    match builtin {
        Builtin::Bool => "z.boolean()".to_string(),
        Builtin::String => "z.string()".to_string(),
        Builtin::Bytes => "z.instanceof(Uint8Array)".to_string(),
        Builtin::Date => "z.date()".to_string(),
        Builtin::Void => "z.void()".to_string(),
        Builtin::Any => "z.any()".to_string(),
        Builtin::Array => format!(
            "z.array({})",
            zod_type(args.first().unwrap_or(&TypeInst::Unknown), ctx)
        ),
        Builtin::Nullable => format!(
            "{}.nullable()",
            zod_type(args.first().unwrap_or(&TypeInst::Unknown), ctx)
        ),
        Builtin::Map => format!(
            "z.map({}, {})",
            zod_type(args.first().unwrap_or(&TypeInst::Unknown), ctx),
            zod_type(args.get(1).unwrap_or(&TypeInst::Unknown), ctx)
        ),
        _ => "z.number()".to_string(),
    }
}
