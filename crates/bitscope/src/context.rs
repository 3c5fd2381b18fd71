//! The record under construction, as seen by dynamic expressions.

use crate::{
    errors::Error,
    value::{Record, Value},
};

/// A record being decoded, linked to the record that encloses it.
///
/// Fields become visible in declaration order as soon as they are decoded, so
/// a dynamic expression can read every sibling declared before it and every
/// field of its ancestors. The parent link is a plain borrow: it is never part
/// of the produced [Record].
#[derive(Debug)]
pub struct Context<'a> {
    record: Record,
    parent: Option<&'a Context<'a>>,
}

impl<'a> Context<'a> {
    pub fn new(parent: Option<&'a Context<'a>>) -> Self {
        Context {
            record: Record::new(),
            parent,
        }
    }

    /// The enclosing record's context, absent for the root record.
    pub fn parent(&self) -> Option<&'a Context<'a>> {
        self.parent
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &'a Context<'a>> + use<'a> {
        std::iter::successors(self.parent, |context| context.parent)
    }

    /// Fields decoded so far in this record.
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.record.get(field)
    }

    /// Like [Context::get], but a missing field is an [Error::UnknownField].
    pub fn value(&self, field: &str) -> Result<&Value, Error> {
        self.get(field)
            .ok_or_else(|| Error::UnknownField(field.to_string()))
    }

    /// Looks a field up in this record, then in each ancestor in turn.
    pub fn lookup(&self, field: &str) -> Option<&Value> {
        self.get(field)
            .or_else(|| self.ancestors().find_map(|context| context.get(field)))
    }

    /// Integer field of this record.
    pub fn int(&self, field: &str) -> Result<i64, Error> {
        let value = self.value(field)?;
        value
            .as_i64()
            .ok_or_else(|| Error::bad_parameter("field", value))
    }

    pub(crate) fn insert(&mut self, field: &str, value: Value) {
        self.record.insert(field, value);
    }

    pub(crate) fn into_record(self) -> Record {
        self.record
    }
}
