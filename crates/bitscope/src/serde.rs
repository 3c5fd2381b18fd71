//! JSON-deserializable schema description.
//!
//! A [SchemaDef] maps record type names to ordered field maps. Field types
//! are written as:
//!
//! - a string: a decoder or record type name, `"uint16le"`;
//! - a number: an unsigned big-endian integer of that many bits, `4`;
//! - an array: a call, head first, `["array", "Point", 3]`;
//! - an object: an anonymous record, `{"x": "uint8", "y": "uint8"}`.
//!
//! Call arguments are JSON scalars, nested types, or `{"$field": "name"}`,
//! which takes the value of a field decoded earlier in this record or an
//! enclosing one. Dotted paths reach into nested records.
//!
//! ```json
//! {
//!   "Header": { "kind": "uint8", "size": "uint8" },
//!   "Packet": {
//!     "header": "Header",
//!     "body": ["buffer", { "$field": "header.size" }]
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    context::Context,
    errors::Error,
    field::{Definition, FieldList, TypeRef},
    param::Param,
    value::Value,
};

/// Top-level schema definition: record type name to its fields.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SchemaDef {
    pub types: IndexMap<String, RecordDef>,
}

/// Fields of one record type, in decode order.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RecordDef {
    pub fields: IndexMap<String, TypeDef>,
}

/// Type of a single field.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TypeDef {
    Bits(u64),
    Name(String),
    /// Head followed by positional arguments.
    Call(Vec<ArgDef>),
    Record(RecordDef),
}

/// Positional argument of a call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ArgDef {
    Null,
    Flag(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Field(FieldRef),
    Type(TypeDef),
}

/// Reference to an already-decoded field.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldRef {
    #[serde(rename = "$field")]
    pub field: String,
}

/// Looks up a dotted path such as `header.size`: the first segment in the
/// context chain, the rest inside the records found there.
fn field_value<'c>(context: &'c Context<'_>, path: &str) -> Option<&'c Value> {
    let mut segments = path.split('.');
    let first = context.lookup(segments.next()?)?;
    segments.try_fold(first, |value, segment| value.get(segment))
}

impl TryFrom<SchemaDef> for Definition {
    type Error = Error;

    fn try_from(value: SchemaDef) -> Result<Self, Self::Error> {
        let mut definition = Definition::new();
        for (name, record) in value.types {
            let fields = FieldList::try_from(record).map_err(|error| error.in_field(&name))?;
            definition.insert(name, fields);
        }
        Ok(definition)
    }
}

impl TryFrom<RecordDef> for FieldList {
    type Error = Error;

    fn try_from(value: RecordDef) -> Result<Self, Self::Error> {
        let mut fields = FieldList::new();
        for (name, ty) in value.fields {
            let ty = TypeRef::try_from(ty).map_err(|error| error.in_field(&name))?;
            fields.push(name, ty);
        }
        Ok(fields)
    }
}

impl TryFrom<TypeDef> for TypeRef {
    type Error = Error;

    fn try_from(value: TypeDef) -> Result<Self, Self::Error> {
        match value {
            TypeDef::Bits(bits) => Ok(TypeRef::Bits(bits)),
            TypeDef::Name(name) => Ok(TypeRef::Named(name)),
            TypeDef::Call(args) => {
                let mut args = args.into_iter().map(Param::try_from);
                let head = args
                    .next()
                    .ok_or_else(|| Error::bad_parameter("type", "[]"))??;
                Ok(TypeRef::Call {
                    head: Box::new(head),
                    args: args.collect::<Result<_, _>>()?,
                })
            }
            TypeDef::Record(record) => Ok(TypeRef::Record(record.try_into()?)),
        }
    }
}

impl TryFrom<ArgDef> for Param {
    type Error = Error;

    fn try_from(value: ArgDef) -> Result<Self, Self::Error> {
        Ok(match value {
            ArgDef::Null => Param::null(),
            ArgDef::Flag(flag) => Param::from(flag),
            ArgDef::Int(n) => Param::from(n),
            ArgDef::Float(n) => Param::from(n),
            ArgDef::Text(text) => Param::from(text),
            ArgDef::Field(FieldRef { field }) => Param::derived(move |context| {
                field_value(context, &field)
                    .cloned()
                    .map(Param::Value)
                    .ok_or_else(|| Error::UnknownField(field.clone()))
            }),
            ArgDef::Type(ty) => Param::Type(ty.try_into()?),
        })
    }
}
