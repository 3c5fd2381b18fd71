//! Named decoders.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    compiled::CompiledRecord, errors::Error, frame::Frame, param::Param, value::Value,
};

type DecodeFn = dyn Fn(&mut Frame<'_>, &[Param]) -> Result<Value, Error> + Send + Sync;

/// A decoding procedure: reads zero or more bits from the frame's active
/// cursor and returns a value. Receives the positional arguments of the
/// type reference that invoked it.
#[derive(Clone)]
pub struct Decoder(Arc<DecodeFn>);

impl Decoder {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Frame<'_>, &[Param]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Decoder(Arc::new(f))
    }

    /// Decoder for a compiled record type; its optional first argument is a bit budget.
    pub(crate) fn record(record: Arc<CompiledRecord>) -> Self {
        Decoder::new(move |frame, args| record.decode(frame, args.first()))
    }

    pub fn decode(&self, frame: &mut Frame<'_>, args: &[Param]) -> Result<Value, Error> {
        (self.0)(frame, args)
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Decoder(..)")
    }
}

/// Mapping from type names to decoders.
///
/// [Registry::default] holds the built-in vocabulary (`uint8`, `int32le`,
/// `string`, `array`, ...). Callers may insert or override entries before
/// compiling a schema; compiling adds one entry per record type.
#[derive(Debug, Clone)]
pub struct Registry {
    decoders: HashMap<String, Decoder>,
}

impl Registry {
    /// Registry without any decoders.
    pub fn empty() -> Self {
        Registry {
            decoders: HashMap::new(),
        }
    }

    /// Registry seeded with the built-in decoders.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        crate::defaults::install(&mut registry);
        registry
    }

    /// Registers `decoder` under `name`, returning the decoder it replaces.
    pub fn insert(&mut self, name: impl Into<String>, decoder: Decoder) -> Option<Decoder> {
        self.decoders.insert(name.into(), decoder)
    }

    /// Builder-style [Registry::insert].
    pub fn with(mut self, name: impl Into<String>, decoder: Decoder) -> Self {
        self.insert(name, decoder);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Decoder> {
        self.decoders.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decoders.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.decoders.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
