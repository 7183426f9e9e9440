#[macro_use]
mod macros;

/// A Smallvec instantiation with 4 embeddable values.
///
/// Used about everywhere in mil, for tensor dimensions, axes lists and
/// input specifications.
pub type TVec<T> = smallvec::SmallVec<[T; 4]>;

pub type MilResult<T> = anyhow::Result<T>;
pub type MilError = anyhow::Error;

pub mod prelude {
    pub use crate::datum::{Datum, DatumType};
    pub use crate::tensor::litteral::*;
    pub use crate::tensor::{IntoArcTensor, IntoTensor, Tensor};
    pub use crate::tvec;
    pub use crate::TVec;
    pub use crate::{dispatch_datum, dispatch_numbers};
    pub use crate::{MilError, MilResult};
    pub use half::f16;
}

pub mod internal {
    pub use crate::datum::Numeric;
    pub use crate::prelude::*;
    pub use anyhow::{bail, ensure, format_err, Context as MilErrorContext};
    pub use ndarray as mil_ndarray;
    pub use num_traits as mil_num_traits;
    pub use std::borrow::Cow;
    pub use std::sync::Arc;
}

pub use anyhow;

mod datum;
mod tensor;
