//! `Tensor`, the concrete value flowing through constant folding.
use crate::datum::{Datum, DatumType, Numeric};
use crate::MilResult;
use half::f16;
use itertools::Itertools;
use ndarray::prelude::*;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

pub mod litteral;

#[doc(hidden)]
#[derive(Clone, PartialEq)]
pub enum Storage {
    Bool(ArrayD<bool>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    F16(ArrayD<f16>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

macro_rules! on_storage {
    ($storage:expr, $a:ident => $e:expr) => {
        match $storage {
            Storage::Bool($a) => $e,
            Storage::I32($a) => $e,
            Storage::I64($a) => $e,
            Storage::F16($a) => $e,
            Storage::F32($a) => $e,
            Storage::F64($a) => $e,
        }
    };
}

/// Tensor is a concrete tensor in mil: an element type and a dynamic-rank
/// array. Rank 0 tensors are scalars.
#[derive(Clone, PartialEq)]
pub struct Tensor {
    storage: Storage,
}

impl Tensor {
    pub fn datum_type(&self) -> DatumType {
        match self.storage {
            Storage::Bool(_) => DatumType::Bool,
            Storage::I32(_) => DatumType::I32,
            Storage::I64(_) => DatumType::I64,
            Storage::F16(_) => DatumType::F16,
            Storage::F32(_) => DatumType::F32,
            Storage::F64(_) => DatumType::F64,
        }
    }

    /// Get the shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        on_storage!(&self.storage, a => a.shape())
    }

    /// Get the number of dimensions (or axes) of the tensor.
    pub fn rank(&self) -> usize {
        self.shape().len()
    }

    /// Get the number of values in the tensor.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        on_storage!(&self.storage, a => a.len())
    }

    /// Access the data as an array view. Fails if `D` is not the tensor
    /// element type.
    pub fn to_array_view<D: Datum>(&self) -> MilResult<ArrayViewD<'_, D>> {
        D::from_storage(&self.storage).map(|a| a.view()).ok_or_else(|| {
            anyhow::format_err!(
                "Tensor datum type error: tensor is {:?}, accessed as {:?}",
                self.datum_type(),
                D::datum_type()
            )
        })
    }

    /// Transform the tensor into a `ndarray::Array`.
    pub fn into_array<D: Datum>(self) -> MilResult<ArrayD<D>> {
        Ok(self.to_array_view::<D>()?.to_owned())
    }

    /// Access the data as a slice, in logical order.
    pub fn as_slice<D: Datum>(&self) -> MilResult<&[D]> {
        let array = D::from_storage(&self.storage).ok_or_else(|| {
            anyhow::format_err!(
                "Tensor datum type error: tensor is {:?}, accessed as {:?}",
                self.datum_type(),
                D::datum_type()
            )
        })?;
        array.as_slice().ok_or_else(|| anyhow::format_err!("Tensor is not contiguous"))
    }

    /// Access the single value of a tensor holding exactly one element.
    pub fn to_scalar<D: Datum>(&self) -> MilResult<&D> {
        if self.len() != 1 {
            anyhow::bail!("to_scalar called on a tensor of shape {:?}", self.shape())
        }
        Ok(&self.as_slice::<D>()?[0])
    }

    /// Reshape the tensor, keeping the values in row-major order.
    pub fn into_shape(self, shape: &[usize]) -> MilResult<Tensor> {
        dispatch_datum!(Self::into_shape_t(self.datum_type())(&self, shape))
    }

    fn into_shape_t<T: Datum>(&self, shape: &[usize]) -> MilResult<Tensor> {
        let view = self.to_array_view::<T>()?;
        if view.len() != shape.iter().product::<usize>() {
            anyhow::bail!("Can not reshape {:?} to {:?}", view.shape(), shape)
        }
        Ok(view.to_shape(IxDyn(shape))?.into_owned().into_tensor())
    }

    /// Optionnaly convert data to a tensor for a new DatumType.
    pub fn cast_to<D: Datum>(&self) -> MilResult<Cow<'_, Tensor>> {
        self.cast_to_dt(D::datum_type())
    }

    /// Optionnaly convert data to a tensor for a new DatumType.
    pub fn cast_to_dt(&self, dt: DatumType) -> MilResult<Cow<'_, Tensor>> {
        if self.datum_type() == dt {
            return Ok(Cow::Borrowed(self));
        }
        let cast = dispatch_datum!(Self::cast_from_t(self.datum_type())(self, dt))?;
        Ok(Cow::Owned(cast))
    }

    fn cast_from_t<S: Numeric>(&self, dt: DatumType) -> MilResult<Tensor> {
        fn map<S: Numeric, D: Numeric>(view: ArrayViewD<S>, via_float: bool) -> Tensor {
            if via_float {
                view.mapv(|x| D::from_f64(x.as_f64())).into_tensor()
            } else {
                view.mapv(|x| D::from_i64(x.as_i64())).into_tensor()
            }
        }
        let via_float = S::datum_type().is_float() || dt.is_float();
        let view = self.to_array_view::<S>()?;
        Ok(match dt {
            DatumType::Bool => map::<S, bool>(view, via_float),
            DatumType::I32 => map::<S, i32>(view, via_float),
            DatumType::I64 => map::<S, i64>(view, via_float),
            DatumType::F16 => map::<S, f16>(view, via_float),
            DatumType::F32 => map::<S, f32>(view, via_float),
            DatumType::F64 => map::<S, f64>(view, via_float),
        })
    }

    /// Compare two tensors, allowing for rounding errors.
    pub fn close_enough(&self, other: &Self, approx: bool) -> MilResult<()> {
        if self.shape() != other.shape() {
            anyhow::bail!("Shape mismatch {:?} != {:?}", self.shape(), other.shape())
        }
        if approx {
            let atol = 5e-4;
            let rtol = 1e-4;
            let ma = self.cast_to::<f64>()?;
            let ma = ma.to_array_view::<f64>()?;
            let mb = other.cast_to::<f64>()?;
            let mb = mb.to_array_view::<f64>()?;
            ndarray::indices_of(&ma).into_iter().try_for_each(|indices| {
                let a = ma[&indices];
                let b = mb[&indices];
                if !((a.is_nan() && b.is_nan())
                    || (a.is_infinite() && b.is_infinite() && a.signum() == b.signum())
                    || (a - b).abs() <= atol + rtol * b.abs())
                {
                    anyhow::bail!("Mismatch at {:?} {} != {}", indices.slice(), a, b)
                }
                Ok(())
            })
        } else if self.eq(other) {
            Ok(())
        } else {
            anyhow::bail!("Mismatch {:?} != {:?}", self, other)
        }
    }

    pub fn dump(&self, force_full: bool) -> String {
        let spec = format!("{}x{:?}", self.shape().iter().join("x"), self.datum_type());
        let values = on_storage!(&self.storage, a => {
            if force_full || a.len() <= 12 {
                a.iter().join(", ")
            } else {
                format!("{}...", a.iter().take(12).join(", "))
            }
        });
        format!("{spec} {values}")
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.dump(false))
    }
}

pub trait IntoTensor: Sized {
    fn into_tensor(self) -> Tensor;
}

pub trait IntoArcTensor: Sized {
    fn into_arc_tensor(self) -> Arc<Tensor>;
}

impl<D: ndarray::Dimension, T: Datum> From<Array<T, D>> for Tensor {
    fn from(it: Array<T, D>) -> Tensor {
        Tensor { storage: T::into_storage(it.into_dyn()) }
    }
}

impl<D: ndarray::Dimension, T: Datum> IntoTensor for Array<T, D> {
    fn into_tensor(self) -> Tensor {
        Tensor::from(self)
    }
}

impl<D: ndarray::Dimension, T: Datum> IntoArcTensor for Array<T, D> {
    fn into_arc_tensor(self) -> Arc<Tensor> {
        Arc::new(Tensor::from(self))
    }
}

impl IntoTensor for Tensor {
    fn into_tensor(self) -> Tensor {
        self
    }
}

impl IntoTensor for Arc<Tensor> {
    fn into_tensor(self) -> Tensor {
        Arc::try_unwrap(self).unwrap_or_else(|t| (*t).clone())
    }
}

impl IntoArcTensor for Tensor {
    fn into_arc_tensor(self) -> Arc<Tensor> {
        Arc::new(self)
    }
}

impl IntoArcTensor for Arc<Tensor> {
    fn into_arc_tensor(self) -> Arc<Tensor> {
        self
    }
}
