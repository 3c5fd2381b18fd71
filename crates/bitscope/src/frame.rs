//! The state a decoder runs against.

use crate::{
    compiled::Procedure,
    context::Context,
    cursor::BitSource,
    errors::Error,
    field::TypeRef,
    param::{Param, Resolved},
    registry::Registry,
    value::Value,
};

/// Everything a [crate::registry::Decoder] needs: the registry for nested type
/// lookups, the enclosing record's context for dynamic parameters, and the
/// active cursor.
///
/// The active cursor is a [crate::scoped::ScopedCursor] while a record with a
/// bit budget is being decoded. A frame never outlives the call it was created
/// for, so the previous cursor is back in place as soon as the call returns.
///
/// Nested decoding is bounded: once `max_depth` procedures are running at
/// once, the next one fails with [Error::DepthExceeded].
pub struct Frame<'a> {
    pub(crate) registry: &'a Registry,
    pub(crate) scope: Option<&'a Context<'a>>,
    pub(crate) cursor: &'a mut dyn BitSource,
    pub(crate) depth: usize,
    pub(crate) max_depth: usize,
}

/// Default bound on nested decoding, see [Frame::with_max_depth].
pub const DEFAULT_MAX_DEPTH: usize = 256;

impl<'a> Frame<'a> {
    pub fn new(
        registry: &'a Registry,
        scope: Option<&'a Context<'a>>,
        cursor: &'a mut dyn BitSource,
    ) -> Self {
        Frame {
            registry,
            scope,
            cursor,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Frame for the fields of a nested record: same limits, one level in.
    pub(crate) fn nested(
        registry: &'a Registry,
        scope: &'a Context<'a>,
        cursor: &'a mut dyn BitSource,
        depth: usize,
        max_depth: usize,
    ) -> Self {
        Frame {
            registry,
            scope: Some(scope),
            cursor,
            depth,
            max_depth,
        }
    }

    /// Number of procedures currently running below the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Runs `f` one nesting level deeper.
    pub(crate) fn descend<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        if self.depth >= self.max_depth {
            return Err(Error::DepthExceeded(self.max_depth));
        }

        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// The record the value being decoded belongs to; absent at the top level.
    pub fn context(&self) -> Option<&'a Context<'a>> {
        self.scope
    }

    pub fn cursor(&mut self) -> &mut dyn BitSource {
        &mut *self.cursor
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn resolve(&self, param: &Param) -> Result<Resolved, Error> {
        match self.scope {
            Some(context) => param.resolve(context),
            None => param.resolve(&Context::new(None)),
        }
    }

    /// Resolves an optional argument to a value; a missing argument is [Value::Null].
    pub fn value(&self, param: Option<&Param>, name: &'static str) -> Result<Value, Error> {
        match param {
            Some(param) => self.resolve(param)?.into_value(name),
            None => Ok(Value::Null),
        }
    }

    /// Resolves a length-like argument: `None` means unbounded.
    pub fn length(&self, param: Option<&Param>, name: &'static str) -> Result<Option<u64>, Error> {
        let value = self.value(param, name)?;
        match &value {
            Value::Null => Ok(None),
            Value::Int(n) if *n >= 0 => Ok(Some(*n as u64)),
            Value::BigInt(n) => u64::try_from(n)
                .map(Some)
                .map_err(|_| Error::bad_parameter(name, &value)),
            Value::Float64(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64 => {
                Ok(Some(*n as u64))
            }
            Value::Float32(n) if *n >= 0.0 && n.fract() == 0.0 => Ok(Some(*n as u64)),
            _ => Err(Error::bad_parameter(name, &value)),
        }
    }

    /// Resolves an argument naming a type (e.g. an array element type).
    pub fn type_ref(&self, param: Option<&Param>, name: &'static str) -> Result<TypeRef, Error> {
        match param {
            Some(param) => self.resolve(param)?.into_type(),
            None => Err(Error::bad_parameter(name, Value::Null)),
        }
    }

    pub(crate) fn compile(&self, ty: &TypeRef) -> Result<Procedure, Error> {
        let registry = self.registry;
        Procedure::compile(ty, &|name| registry.contains(name))
    }

    /// Decodes a value of type `ty` from the active cursor.
    pub fn decode(&mut self, ty: &TypeRef, args: &[Param]) -> Result<Value, Error> {
        self.compile(ty)?.run(self, args)
    }

    /// Invokes the decoder registered under `name`.
    pub fn call(&mut self, name: &str, args: &[Param]) -> Result<Value, Error> {
        let registry = self.registry;
        let decoder = registry
            .get(name)
            .ok_or_else(|| Error::UnknownType(name.to_string()))?;

        decoder.decode(self, args)
    }
}
