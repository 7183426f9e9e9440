//! # MIL operator set
//!
//! Typed operators of the MIL intermediate representation, with the
//! type inference and constant folding rules the graph builder runs when a
//! node is created.
//!
//! ## Example
//!
//! ```
//! use mil_core::internal::*;
//!
//! let op = ReduceAxes::new(Reducer::Sum);
//! let x = tensor2(&[[1f32, 2., 3.], [4., 5., 6.]]);
//! let node = Node::new(
//!     "sum",
//!     op,
//!     [("x", TypedFact::from(x)), ("axes", TypedFact::from(tensor1(&[-1i32])))],
//! )
//! .unwrap();
//!
//! let fact = node.infer().unwrap();
//! assert_eq!(fact.shape.as_slice(), &[2]);
//! assert_eq!(**fact.konst.as_ref().unwrap(), tensor1(&[6f32, 15.]));
//! ```

#[macro_use]
extern crate derive_new;
#[allow(unused_imports)]
#[macro_use]
extern crate log;

pub mod model;
pub mod ops;

pub use mil_data;

pub mod prelude {
    pub use crate::model::{DatumTypeExt, Node, ShapeFact, TypedFact};
    pub use crate::ops::registry::{register_all_ops, OpRegister};
    pub use crate::ops::Op;
    pub use mil_data::prelude::*;
}

pub mod internal {
    pub use crate::ops::axis::{reduced_shape, resolve_axes, resolve_axis};
    pub use crate::ops::input_spec::{
        BoundInputs, DefaultInputs, InputSpec, KnownInputs, TensorInputType, TypeDomain,
    };
    pub use crate::ops::nn::*;
    pub use crate::prelude::*;
    pub use mil_data::internal::*;
}

#[cfg(test)]
#[allow(dead_code)]
fn setup_test_logger() {
    let _ = env_logger::Builder::from_env("MIL_LOG").try_init();
}
