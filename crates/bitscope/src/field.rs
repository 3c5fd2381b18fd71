//! Declarative schema description: type references, field lists and the
//! named record types that make up a [Definition].

use indexmap::IndexMap;

use crate::{
    context::Context,
    errors::Error,
    param::{Derive, Param},
};

/// Reference to the type of a field.
#[derive(Debug, Clone)]
pub enum TypeRef {
    /// A decoder registered under this name: a built-in or a schema record type.
    Named(String),
    /// Shorthand for an unsigned big-endian integer of this many bits.
    Bits(u64),
    /// A decoder selected by `head` and invoked with positional `args`,
    /// e.g. `array` with `["uint8", 4]`. The head may be dynamic.
    Call { head: Box<Param>, args: Vec<Param> },
    /// A type chosen per instance from the parse context.
    Dynamic(Derive),
    /// An anonymous record type.
    Record(FieldList),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// Parameterized reference: `head` followed by positional arguments.
    pub fn call(head: impl Into<Param>, args: impl IntoIterator<Item = Param>) -> Self {
        TypeRef::Call {
            head: Box::new(head.into()),
            args: args.into_iter().collect(),
        }
    }

    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&Context<'_>) -> Result<Param, Error> + Send + Sync + 'static,
    {
        TypeRef::Dynamic(Derive::new(f))
    }
}

impl From<&str> for TypeRef {
    fn from(value: &str) -> Self {
        TypeRef::Named(value.to_string())
    }
}

impl From<String> for TypeRef {
    fn from(value: String) -> Self {
        TypeRef::Named(value)
    }
}

impl From<u64> for TypeRef {
    fn from(value: u64) -> Self {
        TypeRef::Bits(value)
    }
}

impl From<u32> for TypeRef {
    fn from(value: u32) -> Self {
        TypeRef::Bits(value as u64)
    }
}

impl From<FieldList> for TypeRef {
    fn from(value: FieldList) -> Self {
        TypeRef::Record(value)
    }
}

impl From<Derive> for TypeRef {
    fn from(value: Derive) -> Self {
        TypeRef::Dynamic(value)
    }
}

/// Ordered list of `(field name, type)` pairs; fields decode in this order.
#[derive(Debug, Clone, Default)]
pub struct FieldList {
    fields: Vec<(String, TypeRef)>,
}

impl FieldList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field (builder style).
    pub fn field(mut self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.push(name, ty);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, ty: impl Into<TypeRef>) {
        self.fields.push((name.into(), ty.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeRef)> {
        self.fields.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<N: Into<String>, T: Into<TypeRef>> FromIterator<(N, T)> for FieldList {
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        let mut fields = FieldList::new();
        for (name, ty) in iter {
            fields.push(name, ty);
        }
        fields
    }
}

/// Named record types, compiled together by [crate::schema::Schema::compile].
#[derive(Debug, Clone, Default)]
pub struct Definition {
    types: IndexMap<String, FieldList>,
}

impl Definition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record type (builder style). A later type with the same name replaces the earlier one.
    pub fn record(mut self, name: impl Into<String>, fields: FieldList) -> Self {
        self.insert(name, fields);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, fields: FieldList) {
        self.types.insert(name.into(), fields);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldList> {
        self.types.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldList)> {
        self.types.iter().map(|(name, fields)| (name.as_str(), fields))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
