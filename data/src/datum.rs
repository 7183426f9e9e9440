//! Element types of mil tensors.
use crate::tensor::litteral::tensor0;
use crate::tensor::{Storage, Tensor};
use half::f16;
use ndarray::ArrayD;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum DatumType {
    Bool,
    I32,
    I64,
    F16,
    F32,
    F64,
}

impl DatumType {
    pub fn is_float(&self) -> bool {
        matches!(self, DatumType::F16 | DatumType::F32 | DatumType::F64)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, DatumType::I32 | DatumType::I64)
    }

    pub fn is_number(&self) -> bool {
        self.is_float() || self.is_integer()
    }

    /// The kind a reduction kernel accumulates into for this operand kind.
    pub fn widened(&self) -> DatumType {
        if self.is_float() { DatumType::F64 } else { DatumType::I64 }
    }
}

impl fmt::Display for DatumType {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            DatumType::Bool => "bool",
            DatumType::I32 => "i32",
            DatumType::I64 => "i64",
            DatumType::F16 => "fp16",
            DatumType::F32 => "fp32",
            DatumType::F64 => "fp64",
        };
        write!(fmt, "{s}")
    }
}

impl std::str::FromStr for DatumType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Bool" | "bool" => Ok(DatumType::Bool),
            "I32" | "i32" | "int32" => Ok(DatumType::I32),
            "I64" | "i64" | "int64" => Ok(DatumType::I64),
            "F16" | "f16" | "fp16" => Ok(DatumType::F16),
            "F32" | "f32" | "fp32" => Ok(DatumType::F32),
            "F64" | "f64" | "fp64" => Ok(DatumType::F64),
            _ => anyhow::bail!("Unknown type {}", s),
        }
    }
}

pub trait Datum:
    Clone + Send + Sync + fmt::Debug + fmt::Display + Default + 'static + PartialEq
{
    fn datum_type() -> DatumType;

    #[doc(hidden)]
    fn into_storage(array: ArrayD<Self>) -> Storage;
    #[doc(hidden)]
    fn from_storage(storage: &Storage) -> Option<&ArrayD<Self>>;
}

/// Scalar conversions backing `Tensor::cast_to_dt`.
///
/// Integer to integer goes through i64 and wraps, anything involving a float
/// goes through f64. Float to integer truncates toward zero and saturates,
/// NaN becomes 0.
pub trait Numeric: Datum + Copy {
    fn as_f64(self) -> f64;
    fn from_f64(v: f64) -> Self;
    fn as_i64(self) -> i64;
    fn from_i64(v: i64) -> Self;
}

macro_rules! datum {
    ($t:ty, $v:ident) => {
        impl From<$t> for Tensor {
            fn from(it: $t) -> Tensor {
                tensor0(it)
            }
        }

        impl Datum for $t {
            fn datum_type() -> DatumType {
                DatumType::$v
            }

            fn into_storage(array: ArrayD<Self>) -> Storage {
                Storage::$v(array)
            }

            fn from_storage(storage: &Storage) -> Option<&ArrayD<Self>> {
                match storage {
                    Storage::$v(array) => Some(array),
                    _ => None,
                }
            }
        }
    };
}

datum!(bool, Bool);
datum!(i32, I32);
datum!(i64, I64);
datum!(f16, F16);
datum!(f32, F32);
datum!(f64, F64);

macro_rules! numeric_prim {
    ($t:ty) => {
        impl Numeric for $t {
            fn as_f64(self) -> f64 {
                self as f64
            }
            fn from_f64(v: f64) -> Self {
                v as $t
            }
            fn as_i64(self) -> i64 {
                self as i64
            }
            fn from_i64(v: i64) -> Self {
                v as $t
            }
        }
    };
}

numeric_prim!(i32);
numeric_prim!(i64);
numeric_prim!(f32);
numeric_prim!(f64);

impl Numeric for f16 {
    fn as_f64(self) -> f64 {
        self.to_f64()
    }
    fn from_f64(v: f64) -> Self {
        f16::from_f64(v)
    }
    fn as_i64(self) -> i64 {
        self.to_f64() as i64
    }
    fn from_i64(v: i64) -> Self {
        f16::from_f64(v as f64)
    }
}

impl Numeric for bool {
    fn as_f64(self) -> f64 {
        self as u8 as f64
    }
    fn from_f64(v: f64) -> Self {
        v != 0.0
    }
    fn as_i64(self) -> i64 {
        self as i64
    }
    fn from_i64(v: i64) -> Self {
        v != 0
    }
}

#[cfg(test)]
mod tests {
    use crate::internal::*;
    use ndarray::arr1;

    #[test]
    fn test_array_to_tensor_to_array() {
        let array = arr1(&[12i32, 42]);
        let tensor = Tensor::from(array.clone());
        let view = tensor.to_array_view::<i32>().unwrap();
        assert_eq!(array, view.into_dimensionality().unwrap());
        let back = tensor.into_array::<i32>().unwrap();
        assert_eq!(array.into_dyn(), back);
    }

    #[test]
    fn parse_mil_names() {
        assert_eq!("fp16".parse::<DatumType>().unwrap(), DatumType::F16);
        assert_eq!("int32".parse::<DatumType>().unwrap(), DatumType::I32);
        assert!("u8".parse::<DatumType>().is_err());
    }

    #[test]
    fn widened_kinds() {
        assert_eq!(DatumType::F16.widened(), DatumType::F64);
        assert_eq!(DatumType::I32.widened(), DatumType::I64);
    }

    #[test]
    fn float_to_int_truncates() {
        assert_eq!(i32::from_f64(-2.7), -2);
        assert_eq!(i32::from_f64(f64::NAN), 0);
        assert_eq!(i32::from_i64(1 << 32 | 5), 5);
    }
}
