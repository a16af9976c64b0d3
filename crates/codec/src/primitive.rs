//! Closed table of primitive leaf types.

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use endian::ByteOrder;

use crate::Value;

/// Every scalar type a leaf node may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    SInt8,
    UInt8,
    Char,
    SInt16,
    UInt16,
    SInt32,
    UInt32,
    SInt64,
    UInt64,
    Float,
    Double,
}

/// Width and conversion functions for one [`Primitive`].
///
/// `decode` receives exactly `width` bytes; `encode` fills exactly `width`
/// bytes or reports a mismatch.
#[derive(Clone, Copy)]
pub struct PrimitiveCodec {
    pub width: u64,
    pub decode: fn(&[u8], ByteOrder) -> Value,
    pub encode: fn(&Value, ByteOrder, &mut [u8]) -> Result<(), &'static str>,
}

impl std::fmt::Debug for PrimitiveCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimitiveCodec")
            .field("width", &self.width)
            .finish()
    }
}

impl Primitive {
    /// Maps a schema type name to its primitive, including the engine's
    /// C-style aliases.
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        let p = match name {
            "bool" => Primitive::Bool,
            "SInt8" => Primitive::SInt8,
            "UInt8" => Primitive::UInt8,
            "char" => Primitive::Char,
            "SInt16" | "short" => Primitive::SInt16,
            "UInt16" | "unsigned short" => Primitive::UInt16,
            "SInt32" | "int" => Primitive::SInt32,
            "UInt32" | "unsigned int" => Primitive::UInt32,
            "SInt64" | "long" | "long long" => Primitive::SInt64,
            "UInt64" | "unsigned long" | "unsigned long long" => Primitive::UInt64,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            _ => return None,
        };
        Some(p)
    }

    /// The codec entry for this primitive.
    #[must_use]
    pub fn codec(self) -> PrimitiveCodec {
        match self {
            Primitive::Bool => PrimitiveCodec { width: 1, decode: dec_bool, encode: enc_bool },
            Primitive::SInt8 => PrimitiveCodec { width: 1, decode: dec_i8, encode: enc_i8 },
            Primitive::UInt8 => PrimitiveCodec { width: 1, decode: dec_u8, encode: enc_u8 },
            Primitive::Char => PrimitiveCodec { width: 1, decode: dec_char, encode: enc_char },
            Primitive::SInt16 => PrimitiveCodec { width: 2, decode: dec_i16, encode: enc_i16 },
            Primitive::UInt16 => PrimitiveCodec { width: 2, decode: dec_u16, encode: enc_u16 },
            Primitive::SInt32 => PrimitiveCodec { width: 4, decode: dec_i32, encode: enc_i32 },
            Primitive::UInt32 => PrimitiveCodec { width: 4, decode: dec_u32, encode: enc_u32 },
            Primitive::SInt64 => PrimitiveCodec { width: 8, decode: dec_i64, encode: enc_i64 },
            Primitive::UInt64 => PrimitiveCodec { width: 8, decode: dec_u64, encode: enc_u64 },
            Primitive::Float => PrimitiveCodec { width: 4, decode: dec_f32, encode: enc_f32 },
            Primitive::Double => PrimitiveCodec { width: 8, decode: dec_f64, encode: enc_f64 },
        }
    }

    /// Name of the [`Value`] variant this primitive decodes to.
    #[must_use]
    pub fn value_kind(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::SInt8 => "i8",
            Primitive::UInt8 => "u8",
            Primitive::Char => "char",
            Primitive::SInt16 => "i16",
            Primitive::UInt16 => "u16",
            Primitive::SInt32 => "i32",
            Primitive::UInt32 => "u32",
            Primitive::SInt64 => "i64",
            Primitive::UInt64 => "u64",
            Primitive::Float => "f32",
            Primitive::Double => "f64",
        }
    }
}

fn dec_bool(b: &[u8], _: ByteOrder) -> Value {
    Value::Bool(b[0] != 0)
}

fn enc_bool(v: &Value, _: ByteOrder, out: &mut [u8]) -> Result<(), &'static str> {
    match v {
        Value::Bool(x) => {
            out[0] = u8::from(*x);
            Ok(())
        }
        other => Err(other.kind()),
    }
}

fn dec_i8(b: &[u8], _: ByteOrder) -> Value {
    Value::I8(b[0] as i8)
}

fn enc_i8(v: &Value, _: ByteOrder, out: &mut [u8]) -> Result<(), &'static str> {
    match v {
        Value::I8(x) => {
            out[0] = *x as u8;
            Ok(())
        }
        other => Err(other.kind()),
    }
}

fn dec_u8(b: &[u8], _: ByteOrder) -> Value {
    Value::U8(b[0])
}

fn enc_u8(v: &Value, _: ByteOrder, out: &mut [u8]) -> Result<(), &'static str> {
    match v {
        Value::U8(x) => {
            out[0] = *x;
            Ok(())
        }
        other => Err(other.kind()),
    }
}

fn dec_char(b: &[u8], _: ByteOrder) -> Value {
    Value::Char(b[0])
}

fn enc_char(v: &Value, _: ByteOrder, out: &mut [u8]) -> Result<(), &'static str> {
    match v {
        Value::Char(x) => {
            out[0] = *x;
            Ok(())
        }
        other => Err(other.kind()),
    }
}

/// Generates an order-aware decode/encode pair for a multi-byte scalar.
macro_rules! wide_codec {
    ($dec:ident, $enc:ident, $variant:ident, $read:ident, $write:ident) => {
        fn $dec(b: &[u8], order: ByteOrder) -> Value {
            Value::$variant(match order {
                ByteOrder::Little => LittleEndian::$read(b),
                ByteOrder::Big => BigEndian::$read(b),
            })
        }

        fn $enc(v: &Value, order: ByteOrder, out: &mut [u8]) -> Result<(), &'static str> {
            match v {
                Value::$variant(x) => {
                    match order {
                        ByteOrder::Little => LittleEndian::$write(out, *x),
                        ByteOrder::Big => BigEndian::$write(out, *x),
                    }
                    Ok(())
                }
                other => Err(other.kind()),
            }
        }
    };
}

wide_codec!(dec_i16, enc_i16, I16, read_i16, write_i16);
wide_codec!(dec_u16, enc_u16, U16, read_u16, write_u16);
wide_codec!(dec_i32, enc_i32, I32, read_i32, write_i32);
wide_codec!(dec_u32, enc_u32, U32, read_u32, write_u32);
wide_codec!(dec_i64, enc_i64, I64, read_i64, write_i64);
wide_codec!(dec_u64, enc_u64, U64, read_u64, write_u64);
wide_codec!(dec_f32, enc_f32, F32, read_f32, write_f32);
wide_codec!(dec_f64, enc_f64, F64, read_f64, write_f64);
