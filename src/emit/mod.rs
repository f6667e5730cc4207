//! Output emission
//!
//! One emitted TypeScript file per input file: enum declarations,
//! interfaces, one serialize/deserialize pair per realized message, and
//! one descriptor object per service. A single synthetic file for the
//! builtin `Any` lands at the output root when anything referenced it.

mod deserialize;
mod imports;
mod serialize;
mod service;
mod types;
mod zod;

pub use imports::{relative_import, EmitCtx, ANY_ALIAS, ANY_FILE_STEM};
pub use zod::emit_zod;

use crate::analyzer::{
    EnumDef, MessageDef, Semantics, StringEnumDef, TypeInst,
};
use crate::emit::deserialize::deserialize_node;
use crate::emit::serialize::serialize_node;
use crate::emit::types::{ts_string, ts_type};
use crate::genir::{GenirBuilder, Strategy};
use crate::source::{SourceFile, SourceMap};
use std::path::PathBuf;

/// One file to be written under the output root
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    /// Path relative to the output root
    pub path: PathBuf,
    pub contents: String,
}

/// An indentation-aware line collector
#[derive(Debug, Default)]
pub struct Lines {
    lines: Vec<String>,
    depth: usize,
}

impl Lines {
    pub fn new(depth: usize) -> Self {
        Self {
            lines: Vec::new(),
            depth,
        }
    }

    pub fn push(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{}", "  ".repeat(self.depth), text));
        }
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth -= 1;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.lines
    }
}

const HEADER: &str = "// Generated by eprotoc. Do not edit.";

/// Emit every output file for one analysis result.
pub fn emit(semantics: &Semantics, sources: &SourceMap, strategy: Strategy) -> Vec<Output> {
    let builder = GenirBuilder::new(semantics, strategy);
    let mut outputs = Vec::new();
    let mut any_referenced = false;

    for file in sources.iter() {
        let (output, used_any) = emit_file(semantics, sources, &builder, file);
        any_referenced |= used_any;
        outputs.push(output);
    }

    if any_referenced {
        outputs.push(emit_any_file(semantics, &builder));
    }
    outputs
}

fn emit_file(
    semantics: &Semantics,
    sources: &SourceMap,
    builder: &GenirBuilder,
    file: &SourceFile,
) -> (Output, bool) {
    let out_path = file.path.with_extension("ts");
    let mut ctx = EmitCtx::new(semantics, file.id);
    let mut body = Lines::new(0);

    for def in semantics.enums.iter().filter(|d| d.file == file.id) {
        emit_enum(def, &mut body);
        body.blank();
    }
    for def in semantics.string_enums.iter().filter(|d| d.file == file.id) {
        emit_string_enum(def, &mut body);
        body.blank();
    }

    let messages: Vec<&MessageDef> = semantics
        .messages
        .iter()
        .filter(|d| d.file == file.id)
        .collect();
    for def in &messages {
        emit_interface(def, &mut ctx, &mut body);
        body.blank();
        emit_message_pairs(def, builder, &mut ctx, &mut body);
        body.blank();
    }

    let services: Vec<_> = semantics
        .services
        .iter()
        .filter(|d| d.file == file.id)
        .collect();
    for def in &services {
        service::emit_service(def, builder, &mut ctx, &mut body);
        body.blank();
    }

    let mut head: Vec<String> = vec![HEADER.to_string(), String::new()];
    if !messages.is_empty() || !services.is_empty() {
        head.push("import { Reader, Writer } from \"protobufjs/minimal\";".to_string());
    }
    head.extend(ctx.import_lines(sources, &out_path));
    head.push(String::new());

    let mut lines = head;
    lines.extend(body.into_vec());
    let contents = finish(lines);

    let used_any = ctx.uses_any();
    (
        Output {
            path: out_path,
            contents,
        },
        used_any,
    )
}

fn emit_enum(def: &EnumDef, out: &mut Lines) {
    out.push(format!("export enum {} {{", def.name));
    out.indent();
    for member in &def.members {
        out.push(format!("{} = {},", member.name, member.value));
    }
    out.dedent();
    out.push("}");
}

fn emit_string_enum(def: &StringEnumDef, out: &mut Lines) {
    if def.values.is_empty() {
        out.push(format!("export type {} = never;", def.name));
        return;
    }
    let union = def
        .values
        .iter()
        .map(|v| ts_string(v))
        .collect::<Vec<_>>()
        .join(" | ");
    out.push(format!("export type {} = {};", def.name, union));
}

fn emit_interface(def: &MessageDef, ctx: &mut EmitCtx, out: &mut Lines) {
    let formals = if def.formals.is_empty() {
        String::new()
    } else {
        format!("<{}>", def.formals.join(", "))
    };
    out.push(format!("export interface {}{} {{", def.name, formals));
    out.indent();
    for field in &def.fields {
        let marker = if field.optional { "?" } else { "" };
        out.push(format!(
            "{}{}: {};",
            field.name,
            marker,
            ts_type(&field.ty, ctx)
        ));
    }
    out.dedent();
    out.push("}");
}

/// One serialize/deserialize pair per realization. Non-generic messages
/// have exactly one, unsuffixed.
fn emit_message_pairs(
    def: &MessageDef,
    builder: &GenirBuilder,
    ctx: &mut EmitCtx,
    out: &mut Lines,
) {
    out.push(format!("export const {} = {{", def.name));
    out.indent();
    if def.is_generic() {
        for (index, args) in def.realizations.iter().enumerate() {
            let shown = TypeInst::def(def.package.clone(), def.name.clone(), args.clone());
            out.push(format!("// {}", shown));
            emit_pair(def, args, Some(index), builder, ctx, out);
        }
    } else {
        emit_pair(def, &[], None, builder, ctx, out);
    }
    out.dedent();
    out.push("};");
}

fn emit_pair(
    def: &MessageDef,
    args: &[TypeInst],
    index: Option<usize>,
    builder: &GenirBuilder,
    ctx: &mut EmitCtx,
    out: &mut Lines,
) {
    let suffix = index.map(|i| i.to_string()).unwrap_or_default();
    let value_type = ts_type(
        &TypeInst::def(def.package.clone(), def.name.clone(), args.to_vec()),
        ctx,
    );
    let body = builder.message_body(def, args);

    out.push(format!(
        "serialize{}(value: {}, writer: Writer): void {{",
        suffix, value_type
    ));
    out.indent();
    serialize_node(&body, "value", ctx, out);
    out.dedent();
    out.push("},");

    out.push(format!(
        "deserialize{}(reader: Reader, end: number): {} {{",
        suffix, value_type
    ));
    out.indent();
    out.push("let value: any;");
    deserialize_node(&body, "value", "end", ctx, out);
    out.push("return value;");
    out.dedent();
    out.push("},");
}

fn emit_any_file(semantics: &Semantics, builder: &GenirBuilder) -> Output {
    let mut ctx = EmitCtx::for_any_file(semantics);
    let body = builder.any_body();
    let mut out = Lines::new(0);

    out.push(HEADER);
    out.blank();
    out.push("import { Reader, Writer } from \"protobufjs/minimal\";");
    out.blank();
    out.push("export const Any = {");
    out.indent();

    out.push("serialize(value: any, writer: Writer): void {");
    out.indent();
    serialize_node(&body, "value", &mut ctx, &mut out);
    out.dedent();
    out.push("},");

    out.push("deserialize(reader: Reader, end: number): any {");
    out.indent();
    out.push("let value: any;");
    deserialize_node(&body, "value", "end", &mut ctx, &mut out);
    out.push("return value;");
    out.dedent();
    out.push("},");

    out.dedent();
    out.push("};");

    Output {
        path: PathBuf::from(format!("{}.ts", ANY_FILE_STEM)),
        contents: finish(out.into_vec()),
    }
}

/// Join lines, collapsing runs of blanks, with a trailing newline.
fn finish(lines: Vec<String>) -> String {
    let mut contents = String::new();
    let mut last_blank = false;
    for line in lines {
        let blank = line.is_empty();
        if blank && last_blank {
            continue;
        }
        contents.push_str(&line);
        contents.push('\n');
        last_blank = blank;
    }
    while contents.ends_with("\n\n") {
        contents.pop();
    }
    contents
}
