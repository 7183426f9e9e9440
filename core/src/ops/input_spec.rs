//! Input contracts of operators, their defaults, and inputs bound to a node.
use crate::internal::*;
use itertools::Itertools;

/// Element types an input accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeDomain {
    /// A type variable of the operator. All inputs sharing it must have the
    /// same element type.
    Generic(&'static [DatumType]),
    Fixed(DatumType),
}

impl TypeDomain {
    pub fn accepts(&self, dt: DatumType) -> bool {
        match self {
            TypeDomain::Generic(dts) => dts.contains(&dt),
            TypeDomain::Fixed(it) => *it == dt,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TensorInputType {
    pub name: &'static str,
    /// Must be known at graph construction time.
    pub konst: bool,
    pub optional: bool,
    pub domain: TypeDomain,
}

impl TensorInputType {
    pub fn new(name: &'static str, domain: TypeDomain) -> TensorInputType {
        TensorInputType { name, konst: false, optional: false, domain }
    }

    pub fn konst(self) -> TensorInputType {
        TensorInputType { konst: true, ..self }
    }

    pub fn optional(self) -> TensorInputType {
        TensorInputType { optional: true, ..self }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct InputSpec(pub TVec<TensorInputType>);

impl InputSpec {
    pub fn new(inputs: impl IntoIterator<Item = TensorInputType>) -> InputSpec {
        InputSpec(inputs.into_iter().collect())
    }

    pub fn get(&self, name: &str) -> Option<&TensorInputType> {
        self.0.iter().find(|i| i.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TensorInputType> {
        self.0.iter()
    }
}

/// Values substituted for omitted optional inputs. `None` keeps the input
/// absent.
#[derive(Clone, Debug, Default)]
pub struct DefaultInputs(pub TVec<(&'static str, Option<Tensor>)>);

impl DefaultInputs {
    pub fn with(mut self, name: &'static str, value: Option<Tensor>) -> DefaultInputs {
        self.0.push((name, value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.0.iter().find(|(n, _)| *n == name).and_then(|(_, v)| v.as_ref())
    }
}

/// Inputs of a node, checked against the operator input spec, with defaults
/// applied. Ordered as in the spec.
#[derive(Clone, Debug, Default)]
pub struct BoundInputs(TVec<(String, TypedFact)>);

impl BoundInputs {
    pub fn bind<S: Into<String>>(
        spec: &InputSpec,
        defaults: &DefaultInputs,
        inputs: impl IntoIterator<Item = (S, TypedFact)>,
    ) -> MilResult<BoundInputs> {
        let mut provided: TVec<(String, TypedFact)> =
            inputs.into_iter().map(|(n, f)| (n.into(), f)).collect();
        if let Some(dup) = provided.iter().map(|(n, _)| n).duplicates().next() {
            bail!("Input {} is bound more than once", dup)
        }
        if let Some((unknown, _)) = provided.iter().find(|(n, _)| spec.get(n).is_none()) {
            bail!(
                "Unexpected input {}, expected inputs are {}",
                unknown,
                spec.iter().map(|i| i.name).join(", ")
            )
        }
        let mut bound = tvec!();
        for input in spec.iter() {
            if let Some(pos) = provided.iter().position(|(n, _)| n == input.name) {
                bound.push(provided.remove(pos));
            } else if let Some(value) = defaults.get(input.name) {
                bound.push((input.name.to_string(), TypedFact::from(value.clone())));
            } else if !input.optional {
                bail!("Required input {} is missing", input.name)
            }
        }
        let bound = BoundInputs(bound);
        bound.check(spec)?;
        Ok(bound)
    }

    /// Check constness and type domains.
    pub fn check(&self, spec: &InputSpec) -> MilResult<()> {
        let mut generic: Option<(&str, DatumType)> = None;
        for (name, fact) in &self.0 {
            let input = spec.get(name).with_context(|| format!("Unexpected input {name}"))?;
            if input.konst && !fact.is_konst() {
                bail!("Input {} must be a constant", name)
            }
            if !input.domain.accepts(fact.datum_type) {
                bail!("Input {} has type {:?}, allowed: {:?}", name, fact.datum_type, input.domain)
            }
            if let Some(k) = &fact.konst {
                ensure!(fact.matches(k), "Input {} declared as {:?}, value is {:?}", name, fact, k);
            }
            if let TypeDomain::Generic(_) = input.domain {
                match generic {
                    Some((other, dt)) if dt != fact.datum_type => bail!(
                        "Inputs {} and {} share a type domain but have types {:?} and {:?}",
                        other,
                        name,
                        dt,
                        fact.datum_type
                    ),
                    _ => generic = Some((name.as_str(), fact.datum_type)),
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TypedFact> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    /// A required input.
    pub fn fact(&self, name: &str) -> MilResult<&TypedFact> {
        self.get(name).with_context(|| format!("Input {name} is not bound"))
    }

    pub fn konst(&self, name: &str) -> Option<&Arc<Tensor>> {
        self.get(name).and_then(|f| f.konst.as_ref())
    }

    /// Inputs as values, if every bound input is a constant.
    pub fn known(&self) -> Option<KnownInputs<'_>> {
        if self.0.iter().all(|(_, f)| f.is_konst()) { Some(KnownInputs(self)) } else { None }
    }
}

/// Bound inputs that are all constants. Only `BoundInputs::known` builds it.
#[derive(Clone, Copy, Debug)]
pub struct KnownInputs<'a>(&'a BoundInputs);

impl KnownInputs<'_> {
    /// Value of a required input.
    pub fn value(&self, name: &str) -> MilResult<&Arc<Tensor>> {
        self.0.konst(name).with_context(|| format!("Input {name} is not bound"))
    }
}

impl std::ops::Deref for KnownInputs<'_> {
    type Target = BoundInputs;
    fn deref(&self) -> &BoundInputs {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const T: TypeDomain = TypeDomain::Generic(&[DatumType::F16, DatumType::F32, DatumType::I32]);

    fn spec() -> InputSpec {
        InputSpec::new([
            TensorInputType::new("x", T),
            TensorInputType::new("y", T).optional(),
            TensorInputType::new("flag", TypeDomain::Fixed(DatumType::Bool)).konst().optional(),
        ])
    }

    fn defaults() -> DefaultInputs {
        DefaultInputs::default().with("y", None).with("flag", Some(tensor0(false)))
    }

    #[test]
    fn defaults_are_applied() {
        let bound =
            BoundInputs::bind(&spec(), &defaults(), [("x", DatumType::F32.fact([2]))]).unwrap();
        assert!(bound.get("y").is_none());
        assert_eq!(**bound.konst("flag").unwrap(), tensor0(false));
        assert!(bound.known().is_none());
    }

    #[test]
    fn known_when_all_konst() {
        let bound =
            BoundInputs::bind(&spec(), &defaults(), [("x", TypedFact::from(tensor1(&[1f32])))])
                .unwrap();
        let known = bound.known().unwrap();
        assert_eq!(**known.value("x").unwrap(), tensor1(&[1f32]));
        assert!(known.value("y").is_err());
    }

    #[test]
    fn missing_required() {
        let inputs: [(&str, TypedFact); 0] = [];
        assert!(BoundInputs::bind(&spec(), &defaults(), inputs).is_err());
    }

    #[test]
    fn unexpected_and_duplicated() {
        let x = DatumType::F32.fact([2]);
        assert!(BoundInputs::bind(&spec(), &defaults(), [("z", x.clone())]).is_err());
        assert!(BoundInputs::bind(&spec(), &defaults(), [("x", x.clone()), ("x", x)]).is_err());
    }

    #[test]
    fn konst_required() {
        let bound = BoundInputs::bind(
            &spec(),
            &defaults(),
            [("x", DatumType::F32.fact([2])), ("flag", DatumType::Bool.scalar_fact())],
        );
        assert!(bound.is_err());
    }

    #[test]
    fn domains() {
        let i64_x = BoundInputs::bind(&spec(), &defaults(), [("x", DatumType::I64.fact([2]))]);
        assert!(i64_x.is_err());
        let mixed = BoundInputs::bind(
            &spec(),
            &defaults(),
            [("x", DatumType::F32.fact([2])), ("y", DatumType::F16.fact([2]))],
        );
        assert!(mixed.is_err());
    }
}
