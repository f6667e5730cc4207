//! GenIR construction
//!
//! Lowers deeply-real type instances to emitter directive trees. The
//! wire-format strategy decides how `Nullable` and nested arrays are
//! shaped:
//!
//! - `native` stays wire-compatible with protobuf: nullables become a
//!   one-field wrapper message and nested packed arrays get a one-field
//!   wrapper struct, because protobuf can express neither directly.
//! - `evolved` uses a compact one-byte discriminant for nullables, nests
//!   arrays without wrappers, and leaves top-level scalars unframed.

use crate::analyzer::{Builtin, MessageDef, Semantics, TypeHead, TypeInst};
use crate::genir::node::{
    Adapt, Condition, FieldNode, GenNode, Predicate, ScalarFn, Selector, WireType,
};

/// Wire-format strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Native,
    Evolved,
}

/// The fixed builtin → wire-type table
pub fn scalar_wire(builtin: Builtin) -> WireType {
    match builtin {
        Builtin::Int32
        | Builtin::Int64
        | Builtin::Uint32
        | Builtin::Uint64
        | Builtin::Sint32
        | Builtin::Sint64
        | Builtin::Bool => WireType::Varint,
        Builtin::Fixed64 | Builtin::Sfixed64 | Builtin::Double => WireType::I64,
        Builtin::Fixed32 | Builtin::Sfixed32 | Builtin::Float => WireType::I32,
        Builtin::String | Builtin::Bytes => WireType::Len,
        // Everything else is length-delimited on the wire.
        _ => WireType::Len,
    }
}

/// Builds GenIR trees against one analysis result.
pub struct GenirBuilder<'a> {
    semantics: &'a Semantics,
    strategy: Strategy,
}

impl<'a> GenirBuilder<'a> {
    pub fn new(semantics: &'a Semantics, strategy: Strategy) -> Self {
        Self {
            semantics,
            strategy,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Lower one deeply-real type instance to its field encoding.
    pub fn build(&self, ty: &TypeInst) -> GenNode {
        let TypeInst::Real { head, args } = ty else {
            panic!("GenIR requested for an unresolved type. This is a bug.");
        };
        match head {
            TypeHead::Builtin { builtin } => self.build_builtin(*builtin, args),
            TypeHead::Def { package, name } => self.build_def(package, name, args),
        }
    }

    fn build_builtin(&self, builtin: Builtin, args: &[TypeInst]) -> GenNode {
        match builtin {
            Builtin::Bool => GenNode::Primitive {
                wire: WireType::Varint,
                scalar: ScalarFn::BoolCast,
            },
            Builtin::Date => GenNode::Primitive {
                wire: WireType::Len,
                scalar: ScalarFn::IsoDate,
            },
            Builtin::Any => GenNode::len(GenNode::Primitive {
                wire: WireType::Len,
                scalar: ScalarFn::AnyCall,
            }),
            Builtin::Void => GenNode::Primitive {
                wire: WireType::Varint,
                scalar: ScalarFn::NullSentinel,
            },
            Builtin::Array => {
                let element = first_arg(args);
                let element_node = self.build(element);
                let element_node = if self.strategy == Strategy::Native && is_array(element) {
                    // Protobuf cannot nest packed arrays; each inner array
                    // rides in a one-field wrapper struct.
                    GenNode::len(GenNode::Struct {
                        init: "[]",
                        fields: vec![FieldNode {
                            ordinal: 1,
                            wire: element_node.wire(),
                            selector: Selector::Identity,
                            condition: None,
                            node: element_node,
                        }],
                    })
                } else {
                    element_node
                };
                GenNode::len(GenNode::array(element_node))
            }
            Builtin::Nullable => {
                let inner = self.build(first_arg(args));
                match self.strategy {
                    Strategy::Evolved => GenNode::len(GenNode::nullable(inner)),
                    Strategy::Native => GenNode::len(GenNode::Struct {
                        init: "null",
                        fields: vec![FieldNode {
                            ordinal: 1,
                            wire: inner.wire(),
                            selector: Selector::Identity,
                            condition: Some(Condition::NotNull),
                            node: inner,
                        }],
                    }),
                }
            }
            Builtin::Map => {
                let key_node = self.build(args.first().unwrap_or(&TypeInst::Unknown));
                let value_node = self.build(args.get(1).unwrap_or(&TypeInst::Unknown));
                let entry = GenNode::len(GenNode::Struct {
                    init: "[undefined, undefined]",
                    fields: vec![
                        FieldNode {
                            ordinal: 1,
                            wire: key_node.wire(),
                            selector: Selector::Index(0),
                            condition: None,
                            node: key_node,
                        },
                        FieldNode {
                            ordinal: 2,
                            wire: value_node.wire(),
                            selector: Selector::Index(1),
                            condition: None,
                            node: value_node,
                        },
                    ],
                });
                GenNode::MapValue {
                    serialize: Some(Adapt::Entries),
                    deserialize: Some(Adapt::NewMap),
                    inner: Box::new(GenNode::len(GenNode::array(entry))),
                }
            }
            scalar => GenNode::Primitive {
                wire: scalar_wire(scalar),
                scalar: ScalarFn::Method(scalar.name()),
            },
        }
    }

    fn build_def(&self, package: &str, name: &str, args: &[TypeInst]) -> GenNode {
        if let Some(def) = self.semantics.message(package, name) {
            let index = if def.is_generic() {
                Some(self.realization_index(def, args))
            } else {
                None
            };
            return GenNode::len(GenNode::Primitive {
                wire: WireType::Len,
                scalar: ScalarFn::Call {
                    package: package.to_string(),
                    name: name.to_string(),
                    index,
                },
            });
        }
        if self.semantics.enum_def(package, name).is_some() {
            return GenNode::MapValue {
                serialize: Some(Adapt::EnumToInt),
                deserialize: None,
                inner: Box::new(GenNode::Primitive {
                    wire: WireType::Varint,
                    scalar: ScalarFn::Method("uint32"),
                }),
            };
        }
        if self.semantics.string_enum(package, name).is_some() {
            return GenNode::Primitive {
                wire: WireType::Len,
                scalar: ScalarFn::Method("string"),
            };
        }
        panic!(
            "GenIR requested for undefined type {}.{}. This is a bug.",
            package, name
        );
    }

    fn realization_index(&self, def: &MessageDef, args: &[TypeInst]) -> usize {
        def.realizations
            .iter()
            .position(|tuple| tuple.as_slice() == args)
            .unwrap_or_else(|| {
                panic!(
                    "Missing realization of {}.{}. This is a bug.",
                    def.package, def.name
                )
            })
    }

    /// The body of one realized message: a `Struct` over the substituted
    /// fields. The framing `Len` is left off because the caller of the
    /// emitted pair already owns the `end` boundary.
    pub fn message_body(&self, def: &MessageDef, args: &[TypeInst]) -> GenNode {
        let fields = if def.is_generic() {
            crate::analyzer::realize(def, args).fields
        } else {
            def.fields.clone()
        };
        GenNode::Struct {
            init: "{}",
            fields: fields
                .into_iter()
                .map(|field| {
                    let node = self.build(&field.ty);
                    FieldNode {
                        ordinal: field.ordinal,
                        wire: node.wire(),
                        selector: Selector::Field(field.name),
                        condition: field.optional.then_some(Condition::NotUndefined),
                        node,
                    }
                })
                .collect(),
        }
    }

    /// The body of the builtin `Any`: a fixed switch over the runtime
    /// shape of the value. Arrays are tested before plain objects.
    pub fn any_body(&self) -> GenNode {
        let any = TypeInst::builtin(Builtin::Any);
        let array_of_any = TypeInst::Real {
            head: TypeHead::Builtin {
                builtin: Builtin::Array,
            },
            args: vec![any.clone()],
        };
        let map_of_any = TypeInst::Real {
            head: TypeHead::Builtin {
                builtin: Builtin::Map,
            },
            args: vec![TypeInst::builtin(Builtin::String), any],
        };
        let arm = |predicate: Predicate, ordinal: u32, node: GenNode| {
            (
                predicate,
                FieldNode {
                    ordinal,
                    wire: node.wire(),
                    selector: Selector::Identity,
                    condition: None,
                    node,
                },
            )
        };
        GenNode::Switch {
            arms: vec![
                arm(
                    Predicate::IsNull,
                    1,
                    GenNode::Primitive {
                        wire: WireType::Varint,
                        scalar: ScalarFn::NullSentinel,
                    },
                ),
                arm(
                    Predicate::IsNumber,
                    2,
                    GenNode::Primitive {
                        wire: WireType::I64,
                        scalar: ScalarFn::Method("double"),
                    },
                ),
                arm(
                    Predicate::IsString,
                    3,
                    GenNode::Primitive {
                        wire: WireType::Len,
                        scalar: ScalarFn::Method("string"),
                    },
                ),
                arm(
                    Predicate::IsBoolean,
                    4,
                    GenNode::Primitive {
                        wire: WireType::Varint,
                        scalar: ScalarFn::BoolCast,
                    },
                ),
                arm(Predicate::IsArray, 6, self.build(&array_of_any)),
                arm(Predicate::IsObject, 5, self.build(&map_of_any)),
            ],
        }
    }

    /// The encoding used by RPC request/response payloads. Message (and
    /// `any`) bodies own the whole payload, so their framing `Len` is
    /// dropped; scalars are framed under `native` and bare under
    /// `evolved`; container types keep their built shape.
    pub fn top_level(&self, ty: &TypeInst) -> GenNode {
        let node = self.build(ty);
        match node {
            GenNode::Len(inner)
                if matches!(
                    *inner,
                    GenNode::Primitive {
                        scalar: ScalarFn::Call { .. } | ScalarFn::AnyCall,
                        ..
                    }
                ) =>
            {
                *inner
            }
            GenNode::Primitive { .. } => match self.strategy {
                Strategy::Native => GenNode::len(node),
                Strategy::Evolved => node,
            },
            GenNode::MapValue { .. } if node.wire() != WireType::Len => match self.strategy {
                Strategy::Native => GenNode::len(node),
                Strategy::Evolved => node,
            },
            other => other,
        }
    }
}

static UNKNOWN: TypeInst = TypeInst::Unknown;

fn first_arg(args: &[TypeInst]) -> &TypeInst {
    args.first().unwrap_or(&UNKNOWN)
}

fn is_array(ty: &TypeInst) -> bool {
    matches!(
        ty,
        TypeInst::Real {
            head: TypeHead::Builtin {
                builtin: Builtin::Array
            },
            ..
        }
    )
}
