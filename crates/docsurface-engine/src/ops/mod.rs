//! Diff objects produced by the operator subsystem.
//!
//! Both kinds of operation are applied through an adapter trait, so the same
//! operation can update the model's own data (`Vec<String>`, `String`) and
//! the visual tree (the surface's list and text adapters) with identical
//! position semantics.

pub mod array;
pub mod text;

pub use array::{ArrayAdapter, ArrayOperation};
pub use text::{StringAdapter, TextOperation};

/// The payload of a `PropertyUpdated` event
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    Array(ArrayOperation),
    Text(TextOperation),
}

impl From<ArrayOperation> for Diff {
    fn from(op: ArrayOperation) -> Self {
        Diff::Array(op)
    }
}

impl From<TextOperation> for Diff {
    fn from(op: TextOperation) -> Self {
        Diff::Text(op)
    }
}
