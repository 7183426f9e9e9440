//! Tensor types and the node binding driving inference.
mod fact;
mod node;

pub use fact::{DatumTypeExt, ShapeFact, TypedFact};
pub use node::Node;
