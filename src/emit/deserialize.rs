//! The deserialize traversal of GenIR
//!
//! The mirror image of the serialize walk. Every node assigns into the
//! value expression it is handed; length-delimited nodes additionally
//! thread an *end expression* bounding the enclosing payload.

use crate::emit::imports::EmitCtx;
use crate::emit::serialize::{mangle, suffix};
use crate::emit::Lines;
use crate::genir::{FieldNode, GenNode, ScalarFn};

pub fn deserialize_node(
    node: &GenNode,
    value: &str,
    end: &str,
    ctx: &mut EmitCtx,
    out: &mut Lines,
) {
    match node {
        GenNode::Primitive { scalar, .. } => {
            out.push(format!(
                "{} = {};",
                value,
                deserialize_primitive(scalar, end, ctx)
            ));
        }
        GenNode::Len(inner) => {
            let inner_end = format!("end_{}", mangle(value));
            out.push(format!(
                "const {} = reader.uint32() + reader.pos;",
                inner_end
            ));
            deserialize_node(inner, value, &inner_end, ctx, out);
        }
        GenNode::Array(inner) => {
            let item = format!("item_{}", mangle(value));
            out.push(format!("{} = [];", value));
            out.push(format!("while (reader.pos < {}) {{", end));
            out.indent();
            out.push(format!("let {};", item));
            deserialize_node(inner, &item, end, ctx, out);
            out.push(format!("{}.push({});", value, item));
            out.dedent();
            out.push("}");
        }
        GenNode::Nullable(inner) => {
            out.push("if (reader.uint32() === 0) {");
            out.indent();
            out.push(format!("{} = null;", value));
            out.dedent();
            out.push("} else {");
            out.indent();
            deserialize_node(inner, value, end, ctx, out);
            out.dedent();
            out.push("}");
        }
        GenNode::Struct { init, fields } => {
            out.push(format!("{} = {};", value, init));
            tag_match(fields.iter(), value, end, ctx, out);
        }
        GenNode::Switch { arms } => {
            // Deserialization inverts the branch table: the same tag
            // match as a struct body.
            out.push(format!("{} = undefined;", value));
            tag_match(arms.iter().map(|(_, field)| field), value, end, ctx, out);
        }
        GenNode::MapValue {
            deserialize, inner, ..
        } => match deserialize {
            Some(adapt) => {
                let raw = format!("raw_{}", mangle(value));
                out.push(format!("let {};", raw));
                deserialize_node(inner, &raw, end, ctx, out);
                out.push(format!("{} = {};", value, adapt.render(&raw)));
            }
            None => deserialize_node(inner, value, end, ctx, out),
        },
    }
}

fn tag_match<'f>(
    fields: impl Iterator<Item = &'f FieldNode>,
    value: &str,
    end: &str,
    ctx: &mut EmitCtx,
    out: &mut Lines,
) {
    let tag = format!("tag_{}", mangle(value));
    out.push(format!("while (reader.pos < {}) {{", end));
    out.indent();
    out.push(format!("const {} = reader.uint32();", tag));
    out.push(format!("switch ({} >>> 3) {{", tag));
    out.indent();
    for field in fields {
        out.push(format!("case {}: {{", field.ordinal));
        out.indent();
        let selected = field.selector.apply(value);
        deserialize_node(&field.node, &selected, end, ctx, out);
        out.push("break;");
        out.dedent();
        out.push("}");
    }
    out.push("default:");
    out.indent();
    out.push(format!("reader.skipType({} & 7);", tag));
    out.push("break;");
    out.dedent();
    out.dedent();
    out.push("}");
    out.dedent();
    out.push("}");
}

fn deserialize_primitive(scalar: &ScalarFn, end: &str, ctx: &mut EmitCtx) -> String {
    match scalar {
        ScalarFn::Method(method) => format!("reader.{}()", method),
        ScalarFn::BoolCast => "!!reader.uint32()".to_string(),
        ScalarFn::IsoDate => "new Date(reader.string())".to_string(),
        ScalarFn::NullSentinel => "(reader.uint32(), null)".to_string(),
        ScalarFn::Call {
            package,
            name,
            index,
        } => {
            let alias = ctx.alias(package, name);
            format!("{}.deserialize{}(reader, {})", alias, suffix(index), end)
        }
        ScalarFn::AnyCall => {
            let alias = ctx.any_alias();
            format!("{}.deserialize(reader, {})", alias, end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Semantics;
    use crate::genir::{Selector, WireType};
    use crate::source::FileId;

    fn render(node: &GenNode, value: &str, end: &str) -> Vec<String> {
        let semantics = Semantics::default();
        let mut ctx = EmitCtx::new(&semantics, FileId(0));
        let mut out = Lines::new(0);
        deserialize_node(node, value, end, &mut ctx, &mut out);
        out.into_vec()
    }

    #[test]
    fn test_len_bounds_inner() {
        let node = GenNode::len(GenNode::array(GenNode::Primitive {
            wire: WireType::Varint,
            scalar: ScalarFn::Method("int32"),
        }));
        assert_eq!(
            render(&node, "value.xs", "end"),
            vec![
                "const end_value_xs = reader.uint32() + reader.pos;",
                "value.xs = [];",
                "while (reader.pos < end_value_xs) {",
                "  let item_value_xs;",
                "  item_value_xs = reader.int32();",
                "  value.xs.push(item_value_xs);",
                "}",
            ]
        );
    }

    #[test]
    fn test_struct_tag_match() {
        let node = GenNode::Struct {
            init: "{}",
            fields: vec![FieldNode {
                ordinal: 1,
                wire: WireType::Varint,
                selector: Selector::Field("x".into()),
                condition: None,
                node: GenNode::Primitive {
                    wire: WireType::Varint,
                    scalar: ScalarFn::Method("int32"),
                },
            }],
        };
        let lines = render(&node, "value", "end");
        assert_eq!(lines[0], "value = {};");
        assert!(lines.contains(&"    case 1: {".to_string()));
        assert!(lines.contains(&"      value.x = reader.int32();".to_string()));
        assert!(lines.contains(&"      reader.skipType(tag_value & 7);".to_string()));
    }

    #[test]
    fn test_nullable_roundtrip_shape() {
        let node = GenNode::nullable(GenNode::Primitive {
            wire: WireType::Varint,
            scalar: ScalarFn::Method("int32"),
        });
        assert_eq!(
            render(&node, "value", "end"),
            vec![
                "if (reader.uint32() === 0) {",
                "  value = null;",
                "} else {",
                "  value = reader.int32();",
                "}",
            ]
        );
    }
}
