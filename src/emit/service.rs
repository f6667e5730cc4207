//! RPC service descriptor emission
//!
//! Each service becomes one exported object with a descriptor per RPC:
//! the path, the streaming flags, and four closures covering both
//! directions of both channels. `void` channels never touch the wire.

use crate::analyzer::{Builtin, RpcChannel, ServiceDef, TypeInst};
use crate::emit::deserialize::deserialize_node;
use crate::emit::imports::EmitCtx;
use crate::emit::serialize::serialize_node;
use crate::emit::types::ts_type;
use crate::emit::Lines;
use crate::genir::GenirBuilder;

pub fn emit_service(
    service: &ServiceDef,
    builder: &GenirBuilder,
    ctx: &mut EmitCtx,
    out: &mut Lines,
) {
    out.push(format!("export const {} = {{", service.name));
    out.indent();
    for rpc in &service.rpcs {
        out.push(format!("{}: {{", rpc.name));
        out.indent();
        out.push(format!("path: \"{}\",", rpc.path));
        out.push(format!("requestStream: {},", rpc.request.stream));
        out.push(format!("responseStream: {},", rpc.response.stream));
        emit_channel("request", &rpc.request, builder, ctx, out);
        emit_channel("response", &rpc.response, builder, ctx, out);
        out.dedent();
        out.push("},");
    }
    out.dedent();
    out.push("};");
}

fn emit_channel(
    side: &str,
    channel: &RpcChannel,
    builder: &GenirBuilder,
    ctx: &mut EmitCtx,
    out: &mut Lines,
) {
    if is_void(&channel.ty) {
        out.push(format!("{}Serialize(_value: void): Uint8Array {{", side));
        out.indent();
        out.push("return new Uint8Array(0);");
        out.dedent();
        out.push("},");
        out.push(format!("{}Deserialize(_bytes: Uint8Array): void {{", side));
        out.indent();
        out.push("return undefined;");
        out.dedent();
        out.push("},");
        return;
    }

    let ty = ts_type(&channel.ty, ctx);
    let node = builder.top_level(&channel.ty);

    out.push(format!("{}Serialize(value: {}): Uint8Array {{", side, ty));
    out.indent();
    out.push("const writer = Writer.create();");
    serialize_node(&node, "value", ctx, out);
    out.push("return writer.finish();");
    out.dedent();
    out.push("},");

    out.push(format!("{}Deserialize(bytes: Uint8Array): {} {{", side, ty));
    out.indent();
    out.push("const reader = Reader.create(bytes);");
    out.push("let value: any;");
    deserialize_node(&node, "value", "reader.len", ctx, out);
    out.push("return value;");
    out.dedent();
    out.push("},");
}

fn is_void(ty: &TypeInst) -> bool {
    ty.as_builtin() == Some(Builtin::Void)
}
