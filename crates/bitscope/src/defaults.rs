//! The built-in decoder vocabulary.
//!
//! Names and parameter order are part of the schema format and must stay
//! stable.

use crate::{
    decode::{self, Endian},
    encoding::Encoding,
    registry::{Decoder, Registry},
};

/// `(name, bits, endian, signed)` for every fixed-width integer alias.
const FIXED_INTS: &[(&str, u64, Endian, bool)] = &[
    ("byte", 8, Endian::Big, false),
    ("int8", 8, Endian::Big, true),
    ("uint8", 8, Endian::Big, false),
    ("int16", 16, Endian::Big, true),
    ("int16be", 16, Endian::Big, true),
    ("int16le", 16, Endian::Little, true),
    ("uint16", 16, Endian::Big, false),
    ("uint16be", 16, Endian::Big, false),
    ("uint16le", 16, Endian::Little, false),
    ("int32", 32, Endian::Big, true),
    ("int32be", 32, Endian::Big, true),
    ("int32le", 32, Endian::Little, true),
    ("uint32", 32, Endian::Big, false),
    ("uint32be", 32, Endian::Big, false),
    ("uint32le", 32, Endian::Little, false),
    ("int64", 64, Endian::Big, true),
    ("int64be", 64, Endian::Big, true),
    ("int64le", 64, Endian::Little, true),
    ("uint64", 64, Endian::Big, false),
    ("uint64be", 64, Endian::Big, false),
    ("uint64le", 64, Endian::Little, false),
];

/// `(length-prefixed name, null-terminated name, encoding)`.
const STRINGS: &[(&str, &str, Encoding)] = &[
    ("asciiString", "asciiCString", Encoding::Ascii),
    ("utf8String", "utf8CString", Encoding::Utf8),
    ("utf16LEString", "utf16LECString", Encoding::Utf16Le),
    ("base64String", "base64CString", Encoding::Base64),
    ("hexString", "hexCString", Encoding::Hex),
];

pub(crate) fn install(registry: &mut Registry) {
    // int(bits, endian, signed). Little-endian widths that are not a
    // multiple of 8 start with the `bits % 8` most significant bits, then
    // the whole bytes least significant first, so the sign bit is the
    // first bit read.
    registry.insert("int", Decoder::new(decode::int));

    for &(name, bits, endian, signed) in FIXED_INTS {
        registry.insert(
            name,
            Decoder::new(move |frame, _| decode::fixed_int(frame, bits, endian, signed)),
        );
    }

    registry.insert("float", Decoder::new(decode::float));
    registry.insert("double", Decoder::new(decode::double));

    registry.insert("string", Decoder::new(decode::string));
    registry.insert("cString", Decoder::new(decode::c_string));
    for &(sized, terminated, encoding) in STRINGS {
        registry.insert(
            sized,
            Decoder::new(move |frame, args| decode::string_with(frame, args.first(), encoding)),
        );
        registry.insert(
            terminated,
            Decoder::new(move |frame, _| decode::c_string_with(frame, encoding)),
        );
    }

    registry.insert("array", Decoder::new(decode::array));
    registry.insert("buffer", Decoder::new(decode::buffer));
    registry.insert("bits", Decoder::new(decode::bits));
    registry.insert("fixed", Decoder::new(decode::fixed));
}
