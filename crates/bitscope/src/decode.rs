//! Primitive decoders: integers, floats, strings, arrays, buffers, bit
//! sequences and fixed values.
//!
//! Every public function here has the [crate::registry::Decoder] shape: it
//! takes the current [Frame] and the positional arguments of the type
//! reference. The `read_*` helpers do the actual work against a [BitSource].

use num_bigint::BigInt;

use crate::{
    cursor::BitSource,
    encoding::Encoding,
    errors::{Error, ReadError},
    frame::Frame,
    param::Param,
    value::Value,
};

/// Widest integer decoded with native arithmetic. Wider values are
/// accumulated as [BigInt] so no precision is lost.
pub const NATIVE_MAX_BITS: u64 = 51;

/// Byte order of a multi-byte integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Big,
    Little,
}

impl Endian {
    /// Little-endian for `"le"`, `"little"`, `"l"`, `"false"`, `"0"`, `false`
    /// and `0`; big-endian for anything else, including null.
    pub fn from_flag(flag: &Value) -> Self {
        let little = match flag {
            Value::String(s) => matches!(s.as_str(), "le" | "little" | "l" | "false" | "0"),
            Value::Bool(b) => !b,
            Value::Int(n) => *n == 0,
            Value::Float64(n) => *n == 0.0,
            Value::Float32(n) => *n == 0.0,
            _ => false,
        };

        if little { Endian::Little } else { Endian::Big }
    }
}

/// Signed for any truthy value other than `"unsigned"`, `"u"`, `"0"` and `"false"`.
pub fn signed_flag(flag: &Value) -> bool {
    if let Value::String(s) = flag {
        if matches!(s.as_str(), "unsigned" | "u" | "0" | "false") {
            return false;
        }
    }

    flag.is_truthy()
}

/// `int(bits, endian, signed)`; a null bit count consumes every remaining bit.
pub fn int(frame: &mut Frame<'_>, args: &[Param]) -> Result<Value, Error> {
    let bits = frame.length(args.first(), "bits")?;
    let endian = Endian::from_flag(&frame.value(args.get(1), "endian")?);
    let signed = signed_flag(&frame.value(args.get(2), "signed")?);

    read_int(frame.cursor(), bits, endian, signed)
}

/// Fixed-width integer decoder used by the `uint8`, `int32le`, ... aliases.
pub fn fixed_int(frame: &mut Frame<'_>, bits: u64, endian: Endian, signed: bool) -> Result<Value, Error> {
    read_int(frame.cursor(), Some(bits), endian, signed)
}

/// Reads a `bits`-wide integer: a leading partial byte of `bits % 8` bits
/// followed by whole bytes. For little-endian values the whole bytes are
/// least significant first and the leading partial bits are the most
/// significant ones.
pub fn read_int(
    cursor: &mut dyn BitSource,
    bits: Option<u64>,
    endian: Endian,
    signed: bool,
) -> Result<Value, Error> {
    let available = cursor.total_bits_left();
    let bits = bits.unwrap_or(available);
    if bits > available {
        return Err(ReadError::StreamExhausted {
            requested: bits,
            available,
        }
        .into());
    }

    let lead = (bits % 8) as u32;
    let mut bytes = Vec::with_capacity(bits.div_ceil(8) as usize);
    if lead > 0 {
        bytes.push(cursor.read_bits(lead)? as u8);
    }
    bytes.extend_from_slice(&cursor.read_bytes((bits / 8) as usize)?);

    // most significant byte first from here on
    if endian == Endian::Little {
        let start = usize::from(lead > 0);
        bytes[start..].reverse();
    }

    let mut negative = false;
    if signed && bits > 0 {
        let sign_bit = ((bits - 1) % 8) as u32;
        let top = &mut bytes[0];
        negative = (*top >> sign_bit) & 1 == 1;
        *top &= ((1u16 << sign_bit) - 1) as u8;
    }

    if bits <= NATIVE_MAX_BITS {
        let mut value = bytes
            .iter()
            .fold(0i64, |acc, &byte| acc * 256 + byte as i64);
        if negative {
            value -= 1i64 << (bits - 1);
        }

        Ok(Value::Int(value))
    } else {
        let mut value = bytes
            .iter()
            .fold(BigInt::from(0u8), |acc, &byte| acc * 256u32 + byte);
        if negative {
            value -= BigInt::from(1u8) << (bits - 1) as usize;
        }

        Ok(Value::BigInt(value))
    }
}

/// 32-bit IEEE 754, big-endian.
pub fn float(frame: &mut Frame<'_>, _args: &[Param]) -> Result<Value, Error> {
    let bytes = frame.cursor().read_bytes(4)?;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes);

    Ok(Value::Float32(f32::from_be_bytes(raw)))
}

/// 64-bit IEEE 754, big-endian.
pub fn double(frame: &mut Frame<'_>, _args: &[Param]) -> Result<Value, Error> {
    let bytes = frame.cursor().read_bytes(8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes);

    Ok(Value::Float64(f64::from_be_bytes(raw)))
}

fn encoding(frame: &Frame<'_>, param: Option<&Param>) -> Result<Encoding, Error> {
    match frame.value(param, "encoding")? {
        Value::Null => Ok(Encoding::default()),
        Value::String(name) if name.is_empty() => Ok(Encoding::default()),
        Value::String(name) => name.parse(),
        other => Err(Error::bad_parameter("encoding", other)),
    }
}

/// `string(length, encoding)`; a null length reads to the end of the active cursor.
pub fn string(frame: &mut Frame<'_>, args: &[Param]) -> Result<Value, Error> {
    let encoding = encoding(frame, args.get(1))?;
    string_with(frame, args.first(), encoding)
}

/// String of `length` bytes in a fixed encoding.
pub fn string_with(frame: &mut Frame<'_>, length: Option<&Param>, encoding: Encoding) -> Result<Value, Error> {
    let length = frame.length(length, "length")?;
    let bytes = match length {
        Some(n) => frame.cursor().read_bytes(n as usize)?,
        None => frame.cursor().read_to_end()?,
    };

    Ok(Value::String(encoding.decode(&bytes)))
}

/// `cString(encoding)`: bytes up to a zero byte, which is consumed but not included.
pub fn c_string(frame: &mut Frame<'_>, args: &[Param]) -> Result<Value, Error> {
    let encoding = encoding(frame, args.first())?;
    c_string_with(frame, encoding)
}

pub fn c_string_with(frame: &mut Frame<'_>, encoding: Encoding) -> Result<Value, Error> {
    let bytes = read_until_zero(frame.cursor())?;
    Ok(Value::String(encoding.decode(&bytes)))
}

fn read_until_zero(cursor: &mut dyn BitSource) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();
    loop {
        match cursor.read_bits(8)? as u8 {
            0 => return Ok(bytes),
            byte => bytes.push(byte),
        }
    }
}

/// `array(type, length)`. Elements are decoded against the same context as
/// the array field itself. A null length decodes until the active cursor is
/// exhausted, stopping early if an element consumes no bits.
pub fn array(frame: &mut Frame<'_>, args: &[Param]) -> Result<Value, Error> {
    let element = frame.type_ref(args.first(), "type")?;
    let length = frame.length(args.get(1), "length")?;
    let procedure = frame.compile(&element)?;

    let mut values = Vec::new();
    match length {
        Some(length) => {
            values.reserve(length.min(1024) as usize);
            for index in 0..length {
                let value = procedure
                    .run(frame, &[])
                    .map_err(|error| error.in_field(&format!("[{index}]")))?;
                values.push(value);
            }
        }
        None => {
            while !frame.cursor().is_end_reached() {
                let before = frame.cursor().total_bits_left();
                let value = procedure
                    .run(frame, &[])
                    .map_err(|error| error.in_field(&format!("[{}]", values.len())))?;
                values.push(value);

                if frame.cursor().total_bits_left() == before {
                    break;
                }
            }
        }
    }

    Ok(Value::Array(values))
}

/// `buffer(length)`: raw bytes; a null length reads to the end.
pub fn buffer(frame: &mut Frame<'_>, args: &[Param]) -> Result<Value, Error> {
    let bytes = match frame.length(args.first(), "length")? {
        Some(n) => frame.cursor().read_bytes(n as usize)?,
        None => frame.cursor().read_to_end()?,
    };

    Ok(Value::Bytes(bytes))
}

/// `bits(length)`: raw bit sequence; a null length reads to the end.
pub fn bits(frame: &mut Frame<'_>, args: &[Param]) -> Result<Value, Error> {
    let bits = match frame.length(args.first(), "length")? {
        Some(n) => frame.cursor().read_bit_sequence(n)?,
        None => frame.cursor().read_bits_to_end()?,
    };

    Ok(Value::Bits(bits))
}

/// `fixed(value)`: a constant or derived value; consumes no bits.
pub fn fixed(frame: &mut Frame<'_>, args: &[Param]) -> Result<Value, Error> {
    frame.value(args.first(), "value")
}
