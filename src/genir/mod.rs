//! Code-generation intermediate representation
//!
//! A uniform tree of serialize/deserialize combinators, built once per
//! realized type and lowered into textual code by two symmetric emitter
//! traversals. Trees are ephemeral: they are rebuilt on every emit.

mod build;
mod node;

pub use build::{scalar_wire, GenirBuilder, Strategy};
pub use node::{Adapt, Condition, FieldNode, GenNode, Predicate, ScalarFn, Selector, WireType};
