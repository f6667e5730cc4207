//! The fixed builtin type table
//!
//! Builtins cover the protobuf scalar wire types, the pseudo types `Date`,
//! `void` and `any`, and the generic constructors `Array`, `Nullable` and
//! `Map`. They are tried before any user definition during resolution.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Builtin {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float,
    Double,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Date,
    Void,
    Any,
    Array,
    Nullable,
    Map,
}

impl Builtin {
    /// Look up a builtin by its source-language name.
    pub fn lookup(name: &str) -> Option<Builtin> {
        Some(match name {
            "int32" => Builtin::Int32,
            "int64" => Builtin::Int64,
            "uint32" => Builtin::Uint32,
            "uint64" => Builtin::Uint64,
            "float" => Builtin::Float,
            "double" => Builtin::Double,
            "sint32" => Builtin::Sint32,
            "sint64" => Builtin::Sint64,
            "fixed32" => Builtin::Fixed32,
            "fixed64" => Builtin::Fixed64,
            "sfixed32" => Builtin::Sfixed32,
            "sfixed64" => Builtin::Sfixed64,
            "bool" => Builtin::Bool,
            "string" => Builtin::String,
            "bytes" => Builtin::Bytes,
            "Date" => Builtin::Date,
            "void" => Builtin::Void,
            "any" => Builtin::Any,
            "Array" => Builtin::Array,
            "Nullable" => Builtin::Nullable,
            "Map" => Builtin::Map,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Int32 => "int32",
            Builtin::Int64 => "int64",
            Builtin::Uint32 => "uint32",
            Builtin::Uint64 => "uint64",
            Builtin::Float => "float",
            Builtin::Double => "double",
            Builtin::Sint32 => "sint32",
            Builtin::Sint64 => "sint64",
            Builtin::Fixed32 => "fixed32",
            Builtin::Fixed64 => "fixed64",
            Builtin::Sfixed32 => "sfixed32",
            Builtin::Sfixed64 => "sfixed64",
            Builtin::Bool => "bool",
            Builtin::String => "string",
            Builtin::Bytes => "bytes",
            Builtin::Date => "Date",
            Builtin::Void => "void",
            Builtin::Any => "any",
            Builtin::Array => "Array",
            Builtin::Nullable => "Nullable",
            Builtin::Map => "Map",
        }
    }

    /// Formal arity: how many type arguments the builtin takes.
    pub fn arity(self) -> usize {
        match self {
            Builtin::Array | Builtin::Nullable => 1,
            Builtin::Map => 2,
            _ => 0,
        }
    }

    /// The scalar wire types (everything the runtime writer/reader has a
    /// dedicated method for).
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
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
                | Builtin::Sfixed64
                | Builtin::Bool
                | Builtin::String
                | Builtin::Bytes
        )
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
