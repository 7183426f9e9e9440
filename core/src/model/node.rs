use crate::internal::*;
use std::fmt;

/// An operator applied to bound inputs.
///
/// Inputs are checked once, at construction: names against the operator
/// input spec, constness, type domains. Omitted optional inputs get the
/// operator defaults.
#[derive(Clone)]
pub struct Node {
    pub name: String,
    pub op: Box<dyn Op>,
    inputs: BoundInputs,
}

impl Node {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        op: impl Into<Box<dyn Op>>,
        inputs: impl IntoIterator<Item = (S, TypedFact)>,
    ) -> MilResult<Node> {
        let name = name.into();
        let op = op.into();
        let inputs = BoundInputs::bind(&op.input_spec(), &op.default_inputs(), inputs)
            .with_context(|| format!("Binding inputs of node {} ({})", name, op.name()))?;
        Ok(Node { name, op, inputs })
    }

    pub fn inputs(&self) -> &BoundInputs {
        &self.inputs
    }

    pub fn op(&self) -> &dyn Op {
        &*self.op
    }

    pub fn op_as<O: Op>(&self) -> Option<&O> {
        self.op().downcast_ref::<O>()
    }

    pub fn op_is<O: Op>(&self) -> bool {
        self.op_as::<O>().is_some()
    }

    /// Output type, values ignored.
    pub fn type_inference(&self) -> MilResult<TypedFact> {
        #[cfg(feature = "paranoid_assertions")]
        self.inputs.check(&self.op.input_spec())?;
        let fact = self
            .op
            .type_inference(&self.inputs)
            .with_context(|| format!("Type inference of node {self:?}"))?;
        trace!("{} output: {:?}", self.name, fact);
        Ok(fact)
    }

    /// Output value, if every input is a constant and the operator folds.
    pub fn value_inference(&self) -> MilResult<Option<Tensor>> {
        let Some(known) = self.inputs.known() else {
            debug!("{}: not folding, some inputs are not constants", self.name);
            return Ok(None);
        };
        self.op
            .value_inference(&known)
            .with_context(|| format!("Value inference of node {self:?}"))
    }

    /// Type inference, then value inference when possible.
    ///
    /// A folded value must agree with the inferred type. A failing value
    /// inference is an error: the type alone is still available through
    /// `type_inference`.
    pub fn infer(&self) -> MilResult<TypedFact> {
        let mut fact = self.type_inference()?;
        if let Some(value) = self.value_inference()? {
            ensure!(
                fact.matches(&value),
                "Node {:?} inferred {:?} but folded to {:?}",
                self,
                fact,
                value
            );
            debug!("{}: folded to {:?}", self.name, value);
            fact.konst = Some(value.into_arc_tensor());
        }
        Ok(fact)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{} ({})", self.name, self.op.name())
    }
}
