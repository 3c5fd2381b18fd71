//! Schema: a compiled [Definition] plus the registry it decodes with.

use std::sync::Arc;

use log::debug;

use crate::{
    compiled::CompiledRecord,
    cursor::{BitCursor, BitSource},
    errors::Error,
    field::{Definition, TypeRef},
    frame::{DEFAULT_MAX_DEPTH, Frame},
    registry::{Decoder, Registry},
    value::Value,
};

/// A compiled schema. Use [Schema::compile] to build one from a [Definition],
/// then [Schema::parse] to decode a cursor into a [Value] tree.
///
/// A schema is immutable once compiled and can be shared between threads;
/// every parse owns its own cursor.
///
/// Recursive record types are decoded up to [Schema::max_depth] nested
/// procedures; deeper input fails with [Error::DepthExceeded].
#[derive(Debug, Clone)]
pub struct Schema {
    registry: Registry,
    max_depth: usize,
}

impl Schema {
    /// Compiles `definition` against the built-in decoders.
    pub fn compile(definition: &Definition) -> Result<Self, Error> {
        Self::compile_with(definition, Registry::default())
    }

    /// Compiles `definition` against `registry`, which may override or extend
    /// the built-ins. Record types take precedence over registry entries of
    /// the same name.
    ///
    /// Every named reference must be either a registry entry or a record type
    /// of `definition`; record types may refer to each other in any order,
    /// including recursively.
    pub fn compile_with(definition: &Definition, mut registry: Registry) -> Result<Self, Error> {
        let is_known = |name: &str| definition.contains(name) || registry.contains(name);

        let mut records = Vec::with_capacity(definition.len());
        for (name, fields) in definition.iter() {
            let record = CompiledRecord::compile(fields, &is_known)?;
            records.push((name.to_string(), Arc::new(record)));
        }

        for (name, record) in records {
            registry.insert(name, Decoder::record(record));
        }

        debug!(
            "compiled {} record types ({} decoders registered)",
            definition.len(),
            registry.len()
        );

        Ok(Schema {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    /// Sets the nesting bound for every parse with this schema.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Decodes a value of type `root` from `cursor`.
    pub fn parse(&self, mut cursor: BitCursor, root: impl Into<TypeRef>) -> Result<Value, Error> {
        self.parse_from(&mut cursor, root)
    }

    pub fn parse_bytes(&self, data: &[u8], root: impl Into<TypeRef>) -> Result<Value, Error> {
        self.parse(BitCursor::from_bytes(data), root)
    }

    /// Decodes a value of type `root` from any bit source, leaving unread bits
    /// in place.
    pub fn parse_from(&self, cursor: &mut dyn BitSource, root: impl Into<TypeRef>) -> Result<Value, Error> {
        let root = root.into();
        let available = cursor.total_bits_left();
        debug!("parsing {root:?} from {available} bits");

        let mut frame = Frame::new(&self.registry, None, cursor).with_max_depth(self.max_depth);
        let value = frame.decode(&root, &[])?;

        debug!("parsed {root:?}: {} bits consumed", available - frame.cursor().total_bits_left());
        Ok(value)
    }
}
