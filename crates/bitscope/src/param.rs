//! Parameters that are either constants or derived from the parse context.

use std::{fmt, sync::Arc};

use crate::{
    context::Context,
    errors::Error,
    field::{FieldList, TypeRef},
    value::Value,
};

type DeriveFn = dyn Fn(&Context<'_>) -> Result<Param, Error> + Send + Sync;

/// A dynamic expression: computes a parameter from the record being decoded.
///
/// The result may itself be [Param::Derived], in which case it is evaluated
/// again until a constant emerges.
#[derive(Clone)]
pub struct Derive(Arc<DeriveFn>);

impl Derive {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context<'_>) -> Result<Param, Error> + Send + Sync + 'static,
    {
        Derive(Arc::new(f))
    }

    pub fn eval(&self, context: &Context<'_>) -> Result<Param, Error> {
        (self.0)(context)
    }
}

impl fmt::Debug for Derive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Derive(..)")
    }
}

/// A positional argument of a parameterized type reference.
#[derive(Debug, Clone)]
pub enum Param {
    /// A constant value (length, encoding name, flag, type name, ...).
    Value(Value),
    /// A type reference, e.g. the element type of an array.
    Type(TypeRef),
    /// A dynamic expression evaluated against the current context.
    Derived(Derive),
}

/// A parameter after all dynamic expressions have been evaluated.
#[derive(Debug, Clone)]
pub enum Resolved {
    Value(Value),
    Type(TypeRef),
}

impl Param {
    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&Context<'_>) -> Result<Param, Error> + Send + Sync + 'static,
    {
        Param::Derived(Derive::new(f))
    }

    /// Null parameter: "unbounded" for lengths, the default for flags.
    pub fn null() -> Self {
        Param::Value(Value::Null)
    }

    /// Evaluates dynamic expressions until a constant remains.
    pub fn resolve(&self, context: &Context<'_>) -> Result<Resolved, Error> {
        let mut current = match self {
            Param::Value(value) => return Ok(Resolved::Value(value.clone())),
            Param::Type(ty) => return Ok(Resolved::Type(ty.clone())),
            Param::Derived(derive) => derive.eval(context)?,
        };

        loop {
            current = match current {
                Param::Value(value) => return Ok(Resolved::Value(value)),
                Param::Type(ty) => return Ok(Resolved::Type(ty)),
                Param::Derived(derive) => derive.eval(context)?,
            };
        }
    }

    /// True if the parameter can be resolved without a context.
    pub(crate) fn is_constant(&self) -> bool {
        !matches!(self, Param::Derived(_))
    }
}

impl Resolved {
    /// Interprets the resolved parameter as a type reference: strings name a
    /// decoder, non-negative integers are bit widths.
    pub fn into_type(self) -> Result<TypeRef, Error> {
        match self {
            Resolved::Type(ty) => Ok(ty),
            Resolved::Value(Value::String(name)) => Ok(TypeRef::Named(name)),
            Resolved::Value(value) => match value.as_u64() {
                Some(bits) => Ok(TypeRef::Bits(bits)),
                None => Err(Error::UnknownType(format!("{value:?}"))),
            },
        }
    }

    pub fn into_value(self, name: &'static str) -> Result<Value, Error> {
        match self {
            Resolved::Value(value) => Ok(value),
            Resolved::Type(ty) => Err(Error::bad_parameter(name, ty)),
        }
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Param::Value(value)
    }
}

impl From<TypeRef> for Param {
    fn from(value: TypeRef) -> Self {
        Param::Type(value)
    }
}

impl From<FieldList> for Param {
    fn from(value: FieldList) -> Self {
        Param::Type(TypeRef::Record(value))
    }
}

impl From<Derive> for Param {
    fn from(value: Derive) -> Self {
        Param::Derived(value)
    }
}

macro_rules! param_from_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Param {
                fn from(value: $ty) -> Self {
                    Param::Value(Value::from(value))
                }
            }
        )*
    };
}

param_from_value!((), bool, i32, i64, u32, u64, usize, f64, &str, String);
