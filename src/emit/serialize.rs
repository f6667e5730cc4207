//! The serialize traversal of GenIR
//!
//! Purely syntactic string building: each node variant contributes its
//! lines, threading a *value expression* so callers can target any
//! L-value. Loop variables and temporaries are name-mangled from the
//! value expression they iterate.

use crate::emit::imports::EmitCtx;
use crate::emit::Lines;
use crate::genir::{FieldNode, GenNode, ScalarFn};

/// Derive an identifier from a value expression: `value.xs[0]` →
/// `value_xs_0_`.
pub fn mangle(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '[' | ']' | '.' => '_',
            other => other,
        })
        .collect()
}

pub fn serialize_node(node: &GenNode, value: &str, ctx: &mut EmitCtx, out: &mut Lines) {
    match node {
        GenNode::Primitive { scalar, .. } => out.push(serialize_primitive(scalar, value, ctx)),
        GenNode::Len(inner) => {
            out.push("writer.fork();");
            serialize_node(inner, value, ctx, out);
            out.push("writer.ldelim();");
        }
        GenNode::Array(inner) => {
            let item = format!("item_{}", mangle(value));
            out.push(format!("for (const {} of {}) {{", item, value));
            out.indent();
            serialize_node(inner, &item, ctx, out);
            out.dedent();
            out.push("}");
        }
        GenNode::Nullable(inner) => {
            out.push(format!("writer.uint32({} === null ? 0 : 1);", value));
            out.push(format!("if ({} !== null) {{", value));
            out.indent();
            serialize_node(inner, value, ctx, out);
            out.dedent();
            out.push("}");
        }
        GenNode::Struct { fields, .. } => {
            for field in fields {
                serialize_field(field, value, ctx, out);
            }
        }
        GenNode::Switch { arms } => {
            for (i, (predicate, field)) in arms.iter().enumerate() {
                let keyword = if i == 0 { "if" } else { "} else if" };
                out.push(format!("{} ({}) {{", keyword, predicate.render(value)));
                out.indent();
                emit_tagged(field, value, ctx, out);
                out.dedent();
            }
            out.push("}");
        }
        GenNode::MapValue {
            serialize, inner, ..
        } => match serialize {
            Some(adapt) => {
                let mapped = format!("mapped_{}", mangle(value));
                out.push(format!("const {} = {};", mapped, adapt.render(value)));
                serialize_node(inner, &mapped, ctx, out);
            }
            None => serialize_node(inner, value, ctx, out),
        },
    }
}

fn serialize_field(field: &FieldNode, value: &str, ctx: &mut EmitCtx, out: &mut Lines) {
    let selected = field.selector.apply(value);
    match field.condition {
        Some(condition) => {
            out.push(format!("if ({}) {{", condition.render(&selected)));
            out.indent();
            emit_tagged(field, value, ctx, out);
            out.dedent();
            out.push("}");
        }
        None => emit_tagged(field, value, ctx, out),
    }
}

/// Tag byte, then the field's subtree over the selected value.
fn emit_tagged(field: &FieldNode, value: &str, ctx: &mut EmitCtx, out: &mut Lines) {
    let selected = field.selector.apply(value);
    out.push(format!("writer.uint32({});", field.wire.tag(field.ordinal)));
    serialize_node(&field.node, &selected, ctx, out);
}

fn serialize_primitive(scalar: &ScalarFn, value: &str, ctx: &mut EmitCtx) -> String {
    match scalar {
        ScalarFn::Method(method) => format!("writer.{}({});", method, value),
        ScalarFn::BoolCast => format!("writer.uint32({} ? 1 : 0);", value),
        ScalarFn::IsoDate => format!("writer.string({}.toISOString());", value),
        ScalarFn::NullSentinel => "writer.uint32(0);".to_string(),
        ScalarFn::Call {
            package,
            name,
            index,
        } => {
            let alias = ctx.alias(package, name);
            format!("{}.serialize{}({}, writer);", alias, suffix(index), value)
        }
        ScalarFn::AnyCall => {
            let alias = ctx.any_alias();
            format!("{}.serialize({}, writer);", alias, value)
        }
    }
}

pub fn suffix(index: &Option<usize>) -> String {
    match index {
        Some(i) => i.to_string(),
        None => String::new(),
    }
}
