mod arg_max_min;
mod reduce;

pub use self::arg_max_min::{
    reduce_axis_type, reduce_axis_value, ArgReducer, AxisParam, ReduceAxis, ReduceAxisParams,
};
pub use self::reduce::{
    reduce_axes_type, reduce_axes_value, AxesParam, ReduceAxes, ReduceAxesParams, Reducer,
};
