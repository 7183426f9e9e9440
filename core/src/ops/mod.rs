//! Ops
use std::fmt;

use downcast_rs::{impl_downcast, Downcast};

use crate::internal::*;

pub mod axis;
pub mod input_spec;
pub mod nn;
pub mod registry;

/// The "T" type domain of MIL operators over numbers.
pub const NUMBERS: &[DatumType] = &[DatumType::F16, DatumType::F32, DatumType::I32];

/// A MIL operator.
///
/// An operator declares its inputs, the defaults for the optional ones, how
/// to compute its output type from the input types and, optionally, how to
/// compute its output value when all inputs are constants.
pub trait Op: fmt::Debug + dyn_clone::DynClone + Send + Sync + 'static + Downcast {
    fn name(&self) -> Cow<'_, str>;

    fn info(&self) -> MilResult<Vec<String>> {
        Ok(vec![])
    }

    fn input_spec(&self) -> InputSpec;

    fn default_inputs(&self) -> DefaultInputs {
        DefaultInputs::default()
    }

    fn type_inference(&self, inputs: &BoundInputs) -> MilResult<TypedFact>;

    /// Constant folding. `Ok(None)` means the op does not fold.
    fn value_inference(&self, _inputs: &KnownInputs) -> MilResult<Option<Tensor>> {
        Ok(None)
    }
}

impl_downcast!(Op);
dyn_clone::clone_trait_object!(Op);

impl<O: Op> From<O> for Box<dyn Op> {
    fn from(it: O) -> Box<dyn Op> {
        Box::new(it)
    }
}
