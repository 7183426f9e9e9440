//! Tensor types, with an optional constant value.
use crate::internal::*;
use itertools::Itertools;
use std::fmt;

/// Fully determined shape of a tensor. An empty shape is a scalar.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ShapeFact(TVec<usize>);

impl ShapeFact {
    pub fn scalar() -> ShapeFact {
        ShapeFact(tvec!())
    }

    /// Rank of the tensor.
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl std::ops::Deref for ShapeFact {
    type Target = [usize];
    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<TVec<usize>> for ShapeFact {
    fn from(it: TVec<usize>) -> ShapeFact {
        ShapeFact(it)
    }
}

impl From<&[usize]> for ShapeFact {
    fn from(it: &[usize]) -> ShapeFact {
        ShapeFact(it.into())
    }
}

impl<const N: usize> From<[usize; N]> for ShapeFact {
    fn from(it: [usize; N]) -> ShapeFact {
        ShapeFact(it.iter().copied().collect())
    }
}

impl fmt::Debug for ShapeFact {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.0.iter().join("x"))
    }
}

/// Tensor information as seen by the graph builder: element type, shape and,
/// when the value is known at graph construction time, the value itself.
#[derive(Clone, PartialEq)]
pub struct TypedFact {
    /// tensor element type
    pub datum_type: DatumType,
    /// tensor shape
    pub shape: ShapeFact,
    /// optional constant value
    pub konst: Option<Arc<Tensor>>,
}

impl TypedFact {
    pub fn dt_shape<S: Into<ShapeFact>>(datum_type: DatumType, shape: S) -> TypedFact {
        TypedFact { datum_type, shape: shape.into(), konst: None }
    }

    pub fn dt_scalar(datum_type: DatumType) -> TypedFact {
        Self::dt_shape(datum_type, ShapeFact::scalar())
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn is_scalar(&self) -> bool {
        self.rank() == 0
    }

    pub fn is_konst(&self) -> bool {
        self.konst.is_some()
    }

    /// Same type, value forgotten.
    pub fn without_value(&self) -> TypedFact {
        Self::dt_shape(self.datum_type, self.shape.clone())
    }

    pub fn matches(&self, t: &Tensor) -> bool {
        self.datum_type == t.datum_type() && t.shape() == self.shape.as_slice()
    }

    pub fn format_dt_shape(&self) -> String {
        if self.is_scalar() {
            format!("{:?}", self.datum_type)
        } else {
            format!("{:?}x{:?}", self.shape, self.datum_type)
        }
    }
}

impl From<Tensor> for TypedFact {
    fn from(t: Tensor) -> TypedFact {
        TypedFact::from(t.into_arc_tensor())
    }
}

impl<'t> From<&'t Tensor> for TypedFact {
    fn from(t: &'t Tensor) -> TypedFact {
        TypedFact::from(t.clone())
    }
}

impl From<Arc<Tensor>> for TypedFact {
    fn from(t: Arc<Tensor>) -> TypedFact {
        TypedFact { datum_type: t.datum_type(), shape: t.shape().into(), konst: Some(t) }
    }
}

impl fmt::Debug for TypedFact {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self.konst {
            Some(ref k) => write!(fmt, "{k:?}"),
            None => write!(fmt, "{}", self.format_dt_shape()),
        }
    }
}

pub trait DatumTypeExt {
    fn fact<S: Into<ShapeFact>>(&self, shape: S) -> TypedFact;
    fn scalar_fact(&self) -> TypedFact;
}

impl DatumTypeExt for DatumType {
    fn fact<S: Into<ShapeFact>>(&self, shape: S) -> TypedFact {
        TypedFact::dt_shape(*self, shape)
    }

    fn scalar_fact(&self) -> TypedFact {
        TypedFact::dt_scalar(*self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn konst_fact_from_tensor() {
        let fact = TypedFact::from(tensor2(&[[1i32, 2, 3], [4, 5, 6]]));
        assert_eq!(fact.datum_type, DatumType::I32);
        assert_eq!(fact.shape.as_slice(), &[2, 3]);
        assert!(fact.is_konst());
        assert!(fact.matches(fact.konst.as_ref().unwrap()));
        assert!(!fact.without_value().is_konst());
    }

    #[test]
    fn scalar_facts() {
        assert!(DatumType::F16.scalar_fact().is_scalar());
        assert!(TypedFact::from(tensor0(1f32)).is_scalar());
        assert!(!DatumType::F32.fact([1]).is_scalar());
    }

    #[test]
    fn format() {
        assert_eq!(format!("{:?}", DatumType::F32.fact([2, 3, 4])), "2x3x4xF32");
        assert_eq!(format!("{:?}", DatumType::I32.scalar_fact()), "I32");
    }
}
