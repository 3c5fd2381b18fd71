//! Error types for cursor reads and schema compilation/decoding.

use thiserror::Error;

/// Errors produced by a [crate::cursor::BitSource] when reading bits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// More bits were requested than remain in the stream or in the current scope.
    #[error("stream exhausted: requested {requested} bits but only {available} remain")]
    StreamExhausted { requested: u64, available: u64 },
    /// More than 64 bits were requested in a single integer read.
    #[error("cannot read {0} bits into a single integer (maximum is 64)")]
    TooManyBits(u32),
}

/// Errors produced while compiling a schema or decoding a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The underlying cursor ran out of data.
    #[error(transparent)]
    Read(#[from] ReadError),
    /// A type reference does not name a registered decoder or a recognized form.
    #[error("no decoder found for `{0}`")]
    UnknownType(String),
    /// A resolved parameter has the wrong shape (e.g. a negative length).
    #[error("bad parameter `{name}`: {value}")]
    BadParameter { name: &'static str, value: String },
    /// A dynamic expression looked up a field that has not been decoded.
    #[error("field `{0}` is not available in the parse context")]
    UnknownField(String),
    /// Records or calls nested deeper than the schema allows.
    #[error("nesting exceeds the maximum depth of {0}")]
    DepthExceeded(usize),
    /// Decoding of a named field failed.
    #[error("field `{field}`: {source}")]
    Field { field: String, source: Box<Error> },
}

impl Error {
    pub(crate) fn bad_parameter(name: &'static str, value: impl std::fmt::Debug) -> Self {
        Error::BadParameter {
            name,
            value: format!("{value:?}"),
        }
    }

    pub(crate) fn in_field(self, field: &str) -> Self {
        Error::Field {
            field: field.to_string(),
            source: Box::new(self),
        }
    }

    /// Innermost error, with all field wrappers removed.
    pub fn cause(&self) -> &Error {
        let mut error = self;
        while let Error::Field { source, .. } = error {
            error = source;
        }
        error
    }

    /// Names of the fields (outermost first) that were being decoded when the error occurred.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut error = self;
        while let Error::Field { field, source } = error {
            path.push(field.as_str());
            error = source;
        }
        path
    }

    /// True if the error comes from reading past the available data.
    pub fn is_stream_exhausted(&self) -> bool {
        matches!(self.cause(), Error::Read(ReadError::StreamExhausted { .. }))
    }
}
