//! Explicit type conversion functions.
//!
//! Casts ride on the value model's total coercions: a conversion that the
//! variant cannot satisfy becomes an error value naming the source type,
//! while Null and Err inputs pass through untouched. `typeOf` is the one
//! function here that never propagates: it reports the variant of whatever
//! it is given, errors included.

use super::super::error::BindResult;
use super::super::expr::{
    check_arity, ChildDataSupplier, Function, Generator, Param, StoredValues,
};
use super::super::values::Val;

/// The conversion a [`Cast`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    String,
}

impl CastKind {
    pub fn name(&self) -> &'static str {
        match self {
            CastKind::Boolean => "toBoolean",
            CastKind::Integer => "toInteger",
            CastKind::Long => "toLong",
            CastKind::Float => "toFloat",
            CastKind::Double => "toDouble",
            CastKind::String => "toString",
        }
    }

    fn apply(&self, value: &Val) -> Option<Val> {
        match self {
            CastKind::Boolean => value.to_boolean().map(Val::Boolean),
            CastKind::Integer => value.to_integer().map(Val::Integer),
            CastKind::Long => value.to_long().map(Val::Long),
            CastKind::Float => value.to_float().map(Val::Float),
            CastKind::Double => value.to_double().map(Val::Double),
            CastKind::String => Some(Val::String(value.to_display_string())),
        }
    }
}

/// `toBoolean`, `toInteger`, `toLong`, `toFloat`, `toDouble`, `toString`.
pub struct Cast {
    kind: CastKind,
    param: Param,
}

impl Cast {
    pub fn new(kind: CastKind, params: Vec<Param>) -> BindResult<Self> {
        let mut params = params;
        check_arity(kind.name(), 1, 1, &params)?;
        Ok(Self {
            kind,
            param: params.remove(0),
        })
    }
}

impl Function for Cast {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(CastGenerator {
            kind: self.kind,
            child: self.param.create_generator(),
        })
    }

    fn has_aggregate(&self) -> bool {
        self.param.has_aggregate()
    }

    fn requires_child_data(&self) -> bool {
        self.param.requires_child_data()
    }
}

struct CastGenerator {
    kind: CastKind,
    child: Box<dyn Generator>,
}

impl Generator for CastGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.child.set(values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let value = self.child.eval(storage, child_data);
        if !value.is_value() {
            return value;
        }
        match self.kind.apply(&value) {
            Some(converted) => converted,
            None => Val::err(format!(
                "Unable to convert {} '{}' with {}",
                value.type_name(),
                value.to_display_string(),
                self.kind.name()
            )),
        }
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.child.merge(target, source);
    }
}

/// `typeOf(value)`: the lower-case variant name, reported even for Null
/// and Err inputs.
pub struct TypeOf {
    param: Param,
}

impl TypeOf {
    pub fn new(params: Vec<Param>) -> BindResult<Self> {
        let mut params = params;
        check_arity("typeOf", 1, 1, &params)?;
        Ok(Self {
            param: params.remove(0),
        })
    }
}

impl Function for TypeOf {
    fn create_generator(&self) -> Box<dyn Generator> {
        Box::new(TypeOfGenerator {
            child: self.param.create_generator(),
        })
    }

    fn has_aggregate(&self) -> bool {
        self.param.has_aggregate()
    }

    fn requires_child_data(&self) -> bool {
        self.param.requires_child_data()
    }
}

struct TypeOfGenerator {
    child: Box<dyn Generator>,
}

impl Generator for TypeOfGenerator {
    fn set(&mut self, values: &[Val], storage: &mut StoredValues) {
        self.child.set(values, storage);
    }

    fn eval(&self, storage: &StoredValues, child_data: Option<&dyn ChildDataSupplier>) -> Val {
        let value = self.child.eval(storage, child_data);
        Val::String(value.type_name().to_lowercase())
    }

    fn merge(&self, target: &mut StoredValues, source: &StoredValues) {
        self.child.merge(target, source);
    }
}
