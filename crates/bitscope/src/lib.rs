//! # bitscope
//!
//! A library for decoding binary data with declarative, recursive record
//! schemas.
//!
//! Describe each record type as an ordered list of fields, each with a type:
//! a built-in decoder (`uint16le`, `utf8CString`, ...), a bit width, another
//! record type, or a call with parameters that may be computed from fields
//! decoded earlier. Compile the definition once, then parse any number of
//! byte streams into [Value] trees. Reads are bit-granular, integers may be
//! of any width, and a record can be confined to an exact bit budget.
//!
//! ## Example
//!
//! ```
//! use bitscope::{Definition, FieldList, Param, Schema, TypeRef, Value};
//!
//! let definition = Definition::new()
//!     .record("Point", FieldList::new().field("x", "uint8").field("y", "uint8"))
//!     .record(
//!         "Shape",
//!         FieldList::new()
//!             .field("count", "uint8")
//!             .field("flags", 4u64)
//!             .field("reserved", 4u64)
//!             .field(
//!                 "points",
//!                 TypeRef::call(
//!                     "array",
//!                     [
//!                         Param::from("Point"),
//!                         Param::derived(|ctx| Ok(ctx.int("count")?.into())),
//!                     ],
//!                 ),
//!             ),
//!     );
//!
//! let schema = Schema::compile(&definition).unwrap();
//! let shape = schema.parse_bytes(&[0x02, 0xA0, 1, 2, 3, 4], "Shape").unwrap();
//!
//! assert_eq!(shape.get("flags"), Some(&Value::Int(0xA)));
//! let points = shape.get("points").and_then(Value::as_array).unwrap();
//! assert_eq!(points[1].get("y"), Some(&Value::Int(4)));
//! ```

pub mod bits;
mod compiled;
pub mod context;
pub mod cursor;
pub mod decode;
mod defaults;
pub mod encoding;
pub mod errors;
pub mod field;
pub mod frame;
pub mod param;
pub mod registry;
pub mod schema;
pub mod scoped;
#[cfg(feature = "serde")]
pub mod serde;
pub mod value;

pub use context::Context;
pub use cursor::{BitCursor, BitSource, Chunk};
pub use encoding::Encoding;
pub use errors::{Error, ReadError};
pub use field::{Definition, FieldList, TypeRef};
pub use frame::Frame;
pub use param::{Derive, Param, Resolved};
pub use registry::{Decoder, Registry};
pub use schema::Schema;
pub use scoped::ScopedCursor;
pub use value::{Record, Value};
