use crate::internal::*;
use crate::ops::nn::reduce::keep_dims;
use crate::ops::NUMBERS;
use mil_ndarray::prelude::*;

/// Reductions of a single axis to the position of an extremum.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ArgReducer {
    ArgMax,
    ArgMin,
}

impl ArgReducer {
    pub fn name(&self) -> &'static str {
        match self {
            ArgReducer::ArgMax => "reduce_argmax",
            ArgReducer::ArgMin => "reduce_argmin",
        }
    }

    /// Index of the first extremum along `axis`, as I64. A NaN is an
    /// extremum: the first one wins.
    pub fn reduce(&self, input: &Tensor, axis: usize) -> MilResult<Tensor> {
        ensure!(axis < input.rank(), "Axis {} out of range for shape {:?}", axis, input.shape());
        if input.shape()[axis] == 0 {
            bail!("{}: axis {} of {:?} is empty", self.name(), axis, input.shape())
        }
        dispatch_numbers!(Self::reduce_t(input.datum_type())(self, input, axis))
    }

    fn reduce_t<T>(&self, input: &Tensor, axis: usize) -> MilResult<Tensor>
    where
        T: Datum + Copy + PartialOrd,
    {
        let view = input.to_array_view::<T>()?;
        Ok(view.map_axis(Axis(axis), |lane| self.pick(lane)).into_tensor())
    }

    fn pick<T: Copy + PartialOrd>(&self, lane: ArrayView1<T>) -> i64 {
        let is_nan = |x: T| x.partial_cmp(&x).is_none();
        let mut best = 0;
        for (ix, &x) in lane.iter().enumerate() {
            if is_nan(x) {
                return ix as i64;
            }
            let better = match self {
                ArgReducer::ArgMax => x > lane[best],
                ArgReducer::ArgMin => x < lane[best],
            };
            if better {
                best = ix;
            }
        }
        best as i64
    }
}

/// Axis of a single-axis reduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisParam {
    Last,
    Explicit(i64),
}

impl AxisParam {
    pub fn from_konst(axis: Option<&Tensor>) -> MilResult<AxisParam> {
        match axis {
            None => Ok(AxisParam::Last),
            Some(t) => {
                let t = t.cast_to::<i64>()?;
                Ok(AxisParam::Explicit(*t.to_scalar::<i64>()?))
            }
        }
    }

    pub fn resolve(&self, rank: usize) -> MilResult<usize> {
        match self {
            AxisParam::Last => resolve_axis(-1, rank),
            AxisParam::Explicit(axis) => resolve_axis(*axis, rank),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReduceAxisParams {
    pub axis: AxisParam,
    pub keep_dims: bool,
}

impl ReduceAxisParams {
    pub fn from_inputs(inputs: &BoundInputs) -> MilResult<ReduceAxisParams> {
        let axis = AxisParam::from_konst(inputs.konst("axis").map(|t| &**t))?;
        Ok(ReduceAxisParams { axis, keep_dims: keep_dims(inputs)? })
    }
}

/// Output type of a single-axis reduction producing `output_dt`.
pub fn reduce_axis_type(
    x: &TypedFact,
    params: &ReduceAxisParams,
    output_dt: DatumType,
) -> MilResult<TypedFact> {
    ensure!(x.rank() >= 1, "x must be 1-dimensional or higher, got {:?}", x);
    let axis = params.axis.resolve(x.rank())?;
    let shape = reduced_shape(x.shape.as_slice(), &[axis], params.keep_dims);
    trace!("reduce axis {} of {:?}, keep_dims: {}", axis, x, params.keep_dims);
    Ok(output_dt.fact(shape))
}

/// Output value of a single-axis reduction.
///
/// `f` always drops the reduced axis: it is put back here when `keep_dims`
/// is set.
pub fn reduce_axis_value(
    f: impl Fn(&Tensor, usize) -> MilResult<Tensor>,
    value: &Tensor,
    params: &ReduceAxisParams,
    output_dt: DatumType,
) -> MilResult<Tensor> {
    let axis = params.axis.resolve(value.rank())?;
    let mut raw = f(value, axis)?;
    if params.keep_dims {
        raw = raw.into_shape(&reduced_shape(value.shape(), &[axis], true))?;
    }
    Ok(raw.cast_to_dt(output_dt)?.into_owned())
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, new)]
pub struct ReduceAxis {
    pub reducer: ArgReducer,
}

impl Op for ReduceAxis {
    fn name(&self) -> Cow<'_, str> {
        self.reducer.name().into()
    }

    fn info(&self) -> MilResult<Vec<String>> {
        Ok(vec![format!("reducer: {:?}", self.reducer)])
    }

    fn input_spec(&self) -> InputSpec {
        InputSpec::new([
            TensorInputType::new("x", TypeDomain::Generic(NUMBERS)),
            TensorInputType::new("axis", TypeDomain::Fixed(DatumType::I32)).konst().optional(),
            TensorInputType::new("keep_dims", TypeDomain::Fixed(DatumType::Bool))
                .konst()
                .optional(),
        ])
    }

    fn default_inputs(&self) -> DefaultInputs {
        DefaultInputs::default()
            .with("axis", Some(tensor0(-1i32)))
            .with("keep_dims", Some(tensor0(false)))
    }

    fn type_inference(&self, inputs: &BoundInputs) -> MilResult<TypedFact> {
        let params = ReduceAxisParams::from_inputs(inputs)?;
        reduce_axis_type(inputs.fact("x")?, &params, DatumType::I32)
    }

    fn value_inference(&self, inputs: &KnownInputs) -> MilResult<Option<Tensor>> {
        let params = ReduceAxisParams::from_inputs(inputs)?;
        let value = reduce_axis_value(
            |t, axis| self.reducer.reduce(t, axis),
            inputs.value("x")?,
            &params,
            DatumType::I32,
        )?;
        Ok(Some(value))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn node(reducer: ArgReducer, x: TypedFact, axis: Option<i32>, keep_dims: bool) -> Node {
        crate::setup_test_logger();
        let mut inputs = vec![("x", x), ("keep_dims", tensor0(keep_dims).into())];
        if let Some(axis) = axis {
            inputs.push(("axis", tensor0(axis).into()));
        }
        Node::new("arg", ReduceAxis::new(reducer), inputs).unwrap()
    }

    fn fold(reducer: ArgReducer, x: Tensor, axis: Option<i32>, keep_dims: bool) -> Tensor {
        let fact = node(reducer, x.into(), axis, keep_dims).infer().unwrap();
        fact.konst.unwrap().into_tensor()
    }

    #[test]
    fn argmax_of_ties_is_a_maximum() {
        let found = fold(ArgReducer::ArgMax, tensor1(&[1f32, 5., 3., 5.]), Some(0), false);
        assert_eq!(found.datum_type(), DatumType::I32);
        assert!(found.shape().is_empty());
        assert!([1, 3].contains(found.to_scalar::<i32>().unwrap()));
    }

    #[test]
    fn output_is_i32_for_every_input_type() {
        for x in [tensor1(&[1f32, 2.]), tensor1(&[1i32, 2]), tensor1(&[f16::ONE, f16::ZERO])] {
            let fact = node(ArgReducer::ArgMin, x.into(), None, false).infer().unwrap();
            assert_eq!(fact.datum_type, DatumType::I32);
        }
    }

    #[test]
    fn rank_one() {
        let x = tensor1(&[4i32, 2, 8]);
        for axis in [Some(0), Some(-1), None] {
            let scalar = node(ArgReducer::ArgMin, x.clone().into(), axis, false);
            assert!(scalar.type_inference().unwrap().is_scalar());
            assert_eq!(scalar.infer().unwrap().konst.unwrap().into_tensor(), tensor0(1i32));
            let kept = node(ArgReducer::ArgMin, x.clone().into(), axis, true);
            assert_eq!(kept.type_inference().unwrap().shape.as_slice(), &[1]);
            assert_eq!(kept.infer().unwrap().konst.unwrap().into_tensor(), tensor1(&[1i32]));
        }
    }

    #[test]
    fn keep_dims_reshapes_value() {
        let x = tensor3(&[[[1f32, 9.], [3., 4.]], [[5., 6.], [0., 8.]]]);
        let found = fold(ArgReducer::ArgMax, x.clone(), Some(1), true);
        assert_eq!(found, tensor3(&[[[1i32, 0]], [[0, 1]]]));
        let found = fold(ArgReducer::ArgMax, x, Some(-1), false);
        assert_eq!(found, tensor2(&[[1i32, 1], [1, 1]]));
    }

    #[test]
    fn first_nan_wins() {
        let x = tensor1(&[1f32, f32::NAN, 7., f32::NAN]);
        assert_eq!(fold(ArgReducer::ArgMax, x.clone(), None, false), tensor0(1i32));
        assert_eq!(fold(ArgReducer::ArgMin, x, None, false), tensor0(1i32));
    }

    #[test]
    fn empty_axis() {
        let x = Tensor::from(ArrayD::<f32>::zeros(vec![2, 0]));
        assert!(ArgReducer::ArgMax.reduce(&x, 1).is_err());
        assert_eq!(ArgReducer::ArgMax.reduce(&x, 0).unwrap().shape(), &[0]);
    }

    #[test]
    fn type_only_when_not_konst() {
        let fact = node(ArgReducer::ArgMax, DatumType::F16.fact([2, 5, 3]), Some(-2), false)
            .infer()
            .unwrap();
        assert_eq!(fact, DatumType::I32.fact([2, 3]));
    }

    #[test]
    fn contract_violations() {
        let scalar = node(ArgReducer::ArgMax, tensor0(1f32).into(), None, false);
        assert!(scalar.type_inference().is_err());
        let out_of_range = node(ArgReducer::ArgMax, DatumType::F32.fact([2, 3]), Some(2), false);
        assert!(out_of_range.type_inference().is_err());
        let axes = Node::new(
            "arg",
            ReduceAxis::new(ArgReducer::ArgMax),
            [("x", DatumType::F32.fact([2, 3])), ("axis", tensor1(&[0i32, 1]).into())],
        )
        .unwrap();
        assert!(axes.type_inference().is_err());
    }
}
