//! Operators by name.
use std::collections::HashMap;

use crate::internal::*;

pub type OpBuilder = fn() -> Box<dyn Op>;

#[derive(Clone, Default)]
pub struct OpRegister(HashMap<String, OpBuilder>);

impl OpRegister {
    pub fn with_all_ops() -> OpRegister {
        let mut reg = OpRegister::default();
        register_all_ops(&mut reg);
        reg
    }

    pub fn insert(&mut self, name: impl Into<String>, builder: OpBuilder) {
        self.0.insert(name.into(), builder);
    }

    pub fn create(&self, name: &str) -> MilResult<Box<dyn Op>> {
        let builder = self.0.get(name).with_context(|| format!("No operator named {name}"))?;
        Ok(builder())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.keys().map(|n| &**n).collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for OpRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

pub fn register_all_ops(reg: &mut OpRegister) {
    reg.insert("reduce_argmax", || ReduceAxis::new(ArgReducer::ArgMax).into());
    reg.insert("reduce_argmin", || ReduceAxis::new(ArgReducer::ArgMin).into());
    reg.insert("reduce_l1_norm", || ReduceAxes::new(Reducer::L1).into());
    reg.insert("reduce_l2_norm", || ReduceAxes::new(Reducer::L2).into());
    reg.insert("reduce_log_sum", || ReduceAxes::new(Reducer::LogSum).into());
    reg.insert("reduce_log_sum_exp", || ReduceAxes::new(Reducer::LogSumExp).into());
    reg.insert("reduce_max", || ReduceAxes::new(Reducer::Max).into());
    reg.insert("reduce_mean", || ReduceAxes::new(Reducer::Mean).into());
    reg.insert("reduce_min", || ReduceAxes::new(Reducer::Min).into());
    reg.insert("reduce_prod", || ReduceAxes::new(Reducer::Prod).into());
    reg.insert("reduce_sum", || ReduceAxes::new(Reducer::Sum).into());
    reg.insert("reduce_sum_square", || ReduceAxes::new(Reducer::SumSquare).into());
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_match_ops() {
        let reg = OpRegister::with_all_ops();
        assert_eq!(reg.names().len(), 12);
        for name in reg.names() {
            assert_eq!(reg.create(name).unwrap().name(), name);
        }
    }

    #[test]
    fn unknown_name() {
        let reg = OpRegister::with_all_ops();
        assert!(!reg.contains("reduce"));
        assert!(reg.create("reduce").is_err());
    }

    #[test]
    fn downcast() {
        let op = OpRegister::with_all_ops().create("reduce_argmin").unwrap();
        assert_eq!(op.downcast_ref::<ReduceAxis>().unwrap().reducer, ArgReducer::ArgMin);
        assert_eq!(op.info().unwrap(), vec!["reducer: ArgMin".to_string()]);
        assert!(op.downcast_ref::<ReduceAxes>().is_none());
    }
}
