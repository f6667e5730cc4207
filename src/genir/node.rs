//! Code-generation IR
//!
//! A small tree of serialize/deserialize combinators, independent of the
//! output language. Each realized type gets one tree; the emitter walks
//! it twice (once per direction) building textual code.
//!
//! Selectors, conditions and value adapters are small enum variants
//! rather than first-class functions, so trees are plain data and can be
//! inspected by tests.

use std::fmt;

/// The protobuf 3-bit wire type classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint = 0,
    I64 = 1,
    Len = 2,
    I32 = 5,
}

impl WireType {
    /// The tag value for a field: `(ordinal << 3) | wire`
    pub fn tag(self, ordinal: u32) -> u32 {
        (ordinal << 3) | self as u32
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u32)
    }
}

/// The leaf encode/decode operation of a `Primitive` node
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarFn {
    /// One writer/reader method of the runtime: `writer.int32(v)`,
    /// `reader.int32()`
    Method(&'static str),
    /// Booleans ride on uint32: `v ? 1 : 0` out, `!!` back
    BoolCast,
    /// Dates are ISO-8601 strings on the wire
    IsoDate,
    /// A null marker: writes a zero varint, reads back `null`
    NullSentinel,
    /// Delegate to a realized message's serialize/deserialize pair.
    /// `index` picks the realization; `None` for non-generic messages.
    Call {
        package: String,
        name: String,
        index: Option<usize>,
    },
    /// Delegate to the builtin `Any` pair
    AnyCall,
}

/// How a field extracts its value from the enclosing struct value
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// The struct value itself (wrapper structs)
    Identity,
    /// A named member: `value.foo`
    Field(String),
    /// A positional member: `value[0]` (map entries)
    Index(usize),
}

impl Selector {
    pub fn apply(&self, value: &str) -> String {
        match self {
            Selector::Identity => value.to_string(),
            Selector::Field(name) => format!("{}.{}", value, name),
            Selector::Index(index) => format!("{}[{}]", value, index),
        }
    }
}

/// A presence test guarding a field's emission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    NotUndefined,
    NotNull,
}

impl Condition {
    pub fn render(self, value: &str) -> String {
        match self {
            Condition::NotUndefined => format!("{} !== undefined", value),
            Condition::NotNull => format!("{} !== null", value),
        }
    }
}

/// Bidirectional value adaptation around a subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adapt {
    /// Map → entry pairs (serialize side)
    Entries,
    /// Entry pairs → Map (deserialize side)
    NewMap,
    /// Enum value → plain integer (serialize side)
    EnumToInt,
}

impl Adapt {
    pub fn render(self, value: &str) -> String {
        match self {
            Adapt::Entries => format!("Object.entries({})", value),
            Adapt::NewMap => format!("new Map({})", value),
            Adapt::EnumToInt => format!("Number({})", value),
        }
    }
}

/// The serialize-time test picking a `Switch` branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    IsNull,
    IsNumber,
    IsString,
    IsBoolean,
    IsArray,
    IsObject,
}

impl Predicate {
    pub fn render(self, value: &str) -> String {
        match self {
            Predicate::IsNull => format!("{} === null", value),
            Predicate::IsNumber => format!("typeof {} === \"number\"", value),
            Predicate::IsString => format!("typeof {} === \"string\"", value),
            Predicate::IsBoolean => format!("typeof {} === \"boolean\"", value),
            Predicate::IsArray => format!("Array.isArray({})", value),
            Predicate::IsObject => format!("typeof {} === \"object\"", value),
        }
    }
}

/// One labelled member of a `Struct` (or one `Switch` branch): emits its
/// tag, then its subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    pub ordinal: u32,
    pub wire: WireType,
    pub selector: Selector,
    pub condition: Option<Condition>,
    pub node: GenNode,
}

/// An emitter directive tree
#[derive(Debug, Clone, PartialEq)]
pub enum GenNode {
    /// Leaf: one scalar encode/decode call
    Primitive { wire: WireType, scalar: ScalarFn },
    /// One-byte discriminant (0 null, 1 present) followed by the subtree
    Nullable(Box<GenNode>),
    /// Length-delimited framing: fork/ldelim out, bounded `end` back
    Len(Box<GenNode>),
    /// Packed-style repeated encoding inside the enclosing `Len`
    Array(Box<GenNode>),
    /// A message body: initialize, then match incoming tags to fields
    Struct {
        init: &'static str,
        fields: Vec<FieldNode>,
    },
    /// Serialize: first branch whose predicate holds; deserialize: the
    /// same tag match as `Struct`
    Switch { arms: Vec<(Predicate, FieldNode)> },
    /// Value adaptation around a subtree (maps, enums)
    MapValue {
        serialize: Option<Adapt>,
        deserialize: Option<Adapt>,
        inner: Box<GenNode>,
    },
}

impl GenNode {
    pub fn len(inner: GenNode) -> GenNode {
        GenNode::Len(Box::new(inner))
    }

    pub fn array(inner: GenNode) -> GenNode {
        GenNode::Array(Box::new(inner))
    }

    pub fn nullable(inner: GenNode) -> GenNode {
        GenNode::Nullable(Box::new(inner))
    }

    /// The wire type this node occupies when used as a field
    pub fn wire(&self) -> WireType {
        match self {
            GenNode::Primitive { wire, .. } => *wire,
            GenNode::MapValue { inner, .. } => inner.wire(),
            GenNode::Nullable(_)
            | GenNode::Len(_)
            | GenNode::Array(_)
            | GenNode::Struct { .. }
            | GenNode::Switch { .. } => WireType::Len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_packing() {
        assert_eq!(WireType::Varint.tag(1), 8);
        assert_eq!(WireType::Len.tag(2), 18);
        assert_eq!(WireType::I64.tag(2), 17);
        assert_eq!(WireType::I32.tag(3), 29);
    }

    #[test]
    fn test_selector_rendering() {
        assert_eq!(Selector::Identity.apply("value"), "value");
        assert_eq!(Selector::Field("xs".into()).apply("value"), "value.xs");
        assert_eq!(Selector::Index(1).apply("entry"), "entry[1]");
    }

    #[test]
    fn test_wire_of_wrappers_is_len() {
        let node = GenNode::len(GenNode::array(GenNode::Primitive {
            wire: WireType::Varint,
            scalar: ScalarFn::Method("int32"),
        }));
        assert_eq!(node.wire(), WireType::Len);
    }
}
