use crate::internal::*;
use crate::ops::NUMBERS;
use mil_ndarray::prelude::*;
use mil_num_traits::{One, Zero};

/// Reductions over a set of axes.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Reducer {
    L1,
    L2,
    LogSum,
    LogSumExp,
    Max,
    Mean,
    Min,
    Prod,
    Sum,
    SumSquare,
}

impl Reducer {
    pub fn name(&self) -> &'static str {
        use Reducer::*;
        match self {
            L1 => "reduce_l1_norm",
            L2 => "reduce_l2_norm",
            LogSum => "reduce_log_sum",
            LogSumExp => "reduce_log_sum_exp",
            Max => "reduce_max",
            Mean => "reduce_mean",
            Min => "reduce_min",
            Prod => "reduce_prod",
            Sum => "reduce_sum",
            SumSquare => "reduce_sum_square",
        }
    }

    /// Integer in, integer out: these accumulate integer operands in i64.
    /// The others go through f64.
    pub fn is_integral(&self) -> bool {
        use Reducer::*;
        matches!(self, L1 | Max | Min | Prod | Sum | SumSquare)
    }

    /// Reduce `input` over `axes` (normalized, unique, ascending).
    ///
    /// The result is in the widened type of the input (I64 or F64), callers
    /// cast it back.
    pub fn reduce(&self, input: &Tensor, axes: &[usize], keep_dims: bool) -> MilResult<Tensor> {
        let dt = input.datum_type();
        ensure!(dt.is_number(), "{} can not reduce {:?}", self.name(), dt);
        ensure!(
            axes.iter().all(|&ax| ax < input.rank()),
            "Axes {:?} out of range for shape {:?}",
            axes,
            input.shape()
        );
        ensure!(
            axes.windows(2).all(|w| w[0] < w[1]),
            "Axes {:?} must be unique and ascending",
            axes
        );
        let wide = if self.is_integral() { dt.widened() } else { DatumType::F64 };
        let input = input.cast_to_dt(wide)?;
        if wide == DatumType::I64 {
            Ok(self.reduce_t(input.to_array_view::<i64>()?, axes, keep_dims)?.into_tensor())
        } else {
            Ok(self.reduce_real(input.to_array_view::<f64>()?, axes, keep_dims)?.into_tensor())
        }
    }

    fn reduce_t<T: Accumulator>(
        &self,
        input: ArrayViewD<T>,
        axes: &[usize],
        keep_dims: bool,
    ) -> MilResult<ArrayD<T>> {
        use Reducer::*;
        let reduced = match self {
            L1 => fold_axes(input, axes, T::zero(), |acc, x| acc.acc_add(x.acc_abs())),
            Max => {
                self.ensure_not_empty(input.shape(), axes)?;
                fold_axes(input, axes, T::lowest(), T::acc_max)
            }
            Min => {
                self.ensure_not_empty(input.shape(), axes)?;
                fold_axes(input, axes, T::highest(), T::acc_min)
            }
            Prod => fold_axes(input, axes, T::one(), T::acc_mul),
            Sum => fold_axes(input, axes, T::zero(), T::acc_add),
            SumSquare => fold_axes(input, axes, T::zero(), |acc, x| acc.acc_add(x.acc_mul(x))),
            L2 | LogSum | LogSumExp | Mean => bail!("{} is not closed over integers", self.name()),
        };
        Ok(if keep_dims { restore_axes(reduced, axes) } else { reduced })
    }

    fn reduce_real(
        &self,
        input: ArrayViewD<f64>,
        axes: &[usize],
        keep_dims: bool,
    ) -> MilResult<ArrayD<f64>> {
        use Reducer::*;
        match self {
            L2 => Ok(SumSquare.reduce_t(input, axes, keep_dims)?.mapv_into(f64::sqrt)),
            LogSum => Ok(Sum.reduce_t(input, axes, keep_dims)?.mapv_into(f64::ln)),
            LogSumExp => self.log_sum_exp(input, axes, keep_dims),
            Mean => {
                let count: usize = axes.iter().map(|&ax| input.shape()[ax]).product();
                Ok(Sum.reduce_t(input, axes, keep_dims)?.mapv_into(|s| s / count as f64))
            }
            _ => self.reduce_t(input, axes, keep_dims),
        }
    }

    // log(sum(exp(x - max))) + max: exp never sees a positive argument.
    fn log_sum_exp(
        &self,
        input: ArrayViewD<f64>,
        axes: &[usize],
        keep_dims: bool,
    ) -> MilResult<ArrayD<f64>> {
        let max = Reducer::Max.reduce_t(input.view(), axes, true)?;
        let shifted = (&input - &max).mapv_into(f64::exp);
        let sum = Reducer::Sum.reduce_t(shifted.view(), axes, keep_dims)?;
        let max = if keep_dims { max } else { squeeze_axes(max, axes) };
        Ok(sum.mapv_into(f64::ln) + max)
    }

    fn ensure_not_empty(&self, shape: &[usize], axes: &[usize]) -> MilResult<()> {
        if let Some(ax) = axes.iter().find(|&&ax| shape[ax] == 0) {
            bail!("{}: axis {} of {:?} is empty and has no identity", self.name(), ax, shape)
        }
        Ok(())
    }
}

trait Accumulator: Copy + Zero + One + PartialOrd + 'static {
    fn lowest() -> Self;
    fn highest() -> Self;
    fn acc_add(self, other: Self) -> Self;
    fn acc_mul(self, other: Self) -> Self;
    fn acc_abs(self) -> Self;
    fn acc_max(self, other: Self) -> Self;
    fn acc_min(self, other: Self) -> Self;
}

impl Accumulator for i64 {
    fn lowest() -> i64 {
        i64::MIN
    }
    fn highest() -> i64 {
        i64::MAX
    }
    fn acc_add(self, other: i64) -> i64 {
        self.wrapping_add(other)
    }
    fn acc_mul(self, other: i64) -> i64 {
        self.wrapping_mul(other)
    }
    fn acc_abs(self) -> i64 {
        self.wrapping_abs()
    }
    fn acc_max(self, other: i64) -> i64 {
        self.max(other)
    }
    fn acc_min(self, other: i64) -> i64 {
        self.min(other)
    }
}

// max and min propagate NaN
impl Accumulator for f64 {
    fn lowest() -> f64 {
        f64::NEG_INFINITY
    }
    fn highest() -> f64 {
        f64::INFINITY
    }
    fn acc_add(self, other: f64) -> f64 {
        self + other
    }
    fn acc_mul(self, other: f64) -> f64 {
        self * other
    }
    fn acc_abs(self) -> f64 {
        self.abs()
    }
    fn acc_max(self, other: f64) -> f64 {
        if self.is_nan() || other.is_nan() { f64::NAN } else { self.max(other) }
    }
    fn acc_min(self, other: f64) -> f64 {
        if self.is_nan() || other.is_nan() { f64::NAN } else { self.min(other) }
    }
}

/// Fold `axes` away, highest axis first.
fn fold_axes<T: Accumulator>(
    input: ArrayViewD<T>,
    axes: &[usize],
    init: T,
    f: impl Fn(T, T) -> T,
) -> ArrayD<T> {
    let mut axes = axes.iter().rev();
    let Some(&first) = axes.next() else { return input.to_owned() };
    let mut output = input.fold_axis(Axis(first), init, |&acc, &x| f(acc, x));
    for &axis in axes {
        output = output.fold_axis(Axis(axis), init, |&acc, &x| f(acc, x));
    }
    output
}

/// Reinsert reduced `axes` (ascending) as 1-sized dimensions.
fn restore_axes<T>(mut array: ArrayD<T>, axes: &[usize]) -> ArrayD<T> {
    for &axis in axes {
        array = array.insert_axis(Axis(axis));
    }
    array
}

/// Drop 1-sized `axes` (ascending), highest first.
fn squeeze_axes<T>(mut array: ArrayD<T>, axes: &[usize]) -> ArrayD<T> {
    for &axis in axes.iter().rev() {
        array = array.remove_axis(Axis(axis));
    }
    array
}

/// Axes of a multi-axis reduction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AxesParam {
    /// No axes given: reduce them all.
    All,
    Explicit(TVec<i64>),
}

impl AxesParam {
    pub fn from_konst(axes: Option<&Tensor>) -> MilResult<AxesParam> {
        match axes {
            None => Ok(AxesParam::All),
            Some(t) => {
                ensure!(t.rank() <= 1, "axes must be a list, got shape {:?}", t.shape());
                let t = t.cast_to::<i64>()?;
                Ok(AxesParam::Explicit(t.as_slice::<i64>()?.into()))
            }
        }
    }

    /// Normalized, ascending axes.
    pub fn resolve(&self, rank: usize) -> MilResult<TVec<usize>> {
        let mut axes = match self {
            AxesParam::All => (0..rank).collect(),
            AxesParam::Explicit(axes) => resolve_axes(axes, rank)?,
        };
        axes.sort();
        Ok(axes)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReduceAxesParams {
    pub axes: AxesParam,
    pub keep_dims: bool,
}

impl ReduceAxesParams {
    pub fn from_inputs(inputs: &BoundInputs) -> MilResult<ReduceAxesParams> {
        let axes = AxesParam::from_konst(inputs.konst("axes").map(|t| &**t))?;
        let keep_dims = keep_dims(inputs)?;
        Ok(ReduceAxesParams { axes, keep_dims })
    }
}

pub(crate) fn keep_dims(inputs: &BoundInputs) -> MilResult<bool> {
    let keep_dims = inputs.konst("keep_dims").context("keep_dims must be a constant")?;
    Ok(*keep_dims.to_scalar::<bool>()?)
}

fn ensure_rank_at_least_one(name: &str, x: &TypedFact) -> MilResult<()> {
    ensure!(x.rank() >= 1, "{}: x must be 1-dimensional or higher, got {:?}", name, x);
    Ok(())
}

/// Output type of a multi-axis reduction.
pub fn reduce_axes_type(x: &TypedFact, params: &ReduceAxesParams) -> MilResult<TypedFact> {
    let axes = params.axes.resolve(x.rank())?;
    let shape = reduced_shape(x.shape.as_slice(), &axes, params.keep_dims);
    trace!("reduce axes {:?} of {:?}, keep_dims: {}", axes, x, params.keep_dims);
    Ok(x.datum_type.fact(shape))
}

/// Output value of a multi-axis reduction, `f` being the reduction proper.
///
/// The raw result is cast to the declared type of `x`.
pub fn reduce_axes_value(
    f: impl Fn(&Tensor, &[usize], bool) -> MilResult<Tensor>,
    x: &TypedFact,
    value: &Tensor,
    params: &ReduceAxesParams,
) -> MilResult<Tensor> {
    let axes = params.axes.resolve(value.rank())?;
    let raw = f(value, &axes, params.keep_dims)?;
    Ok(raw.cast_to_dt(x.datum_type)?.into_owned())
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, new)]
pub struct ReduceAxes {
    pub reducer: Reducer,
}

impl Op for ReduceAxes {
    fn name(&self) -> Cow<'_, str> {
        self.reducer.name().into()
    }

    fn info(&self) -> MilResult<Vec<String>> {
        Ok(vec![format!("reducer: {:?}", self.reducer)])
    }

    fn input_spec(&self) -> InputSpec {
        InputSpec::new([
            TensorInputType::new("x", TypeDomain::Generic(NUMBERS)),
            TensorInputType::new("axes", TypeDomain::Fixed(DatumType::I32)).konst().optional(),
            TensorInputType::new("keep_dims", TypeDomain::Fixed(DatumType::Bool))
                .konst()
                .optional(),
        ])
    }

    fn default_inputs(&self) -> DefaultInputs {
        DefaultInputs::default().with("axes", None).with("keep_dims", Some(tensor0(false)))
    }

    fn type_inference(&self, inputs: &BoundInputs) -> MilResult<TypedFact> {
        let x = inputs.fact("x")?;
        ensure_rank_at_least_one(self.reducer.name(), x)?;
        reduce_axes_type(x, &ReduceAxesParams::from_inputs(inputs)?)
    }

    fn value_inference(&self, inputs: &KnownInputs) -> MilResult<Option<Tensor>> {
        ensure_rank_at_least_one(self.reducer.name(), inputs.fact("x")?)?;
        let params = ReduceAxesParams::from_inputs(inputs)?;
        let value = reduce_axes_value(
            |t, axes, keep_dims| self.reducer.reduce(t, axes, keep_dims),
            inputs.fact("x")?,
            inputs.value("x")?,
            &params,
        )?;
        Ok(Some(value))
    }
}
