//! # Codec - schema-driven value decoding and encoding
//!
//! Turns the raw bytes of one serialized object into a [`Value`] tree by
//! walking its [`TypeNode`] schema, and writes a `Value` tree back out.
//!
//! ## Node shapes
//!
//! Every schema node is interpreted as exactly one of four shapes:
//!
//! | Shape     | Recognised by                                        | Wire form                       |
//! |-----------|------------------------------------------------------|---------------------------------|
//! | String    | type name `string`, one array child of `char`        | `count: i32` + `count` bytes    |
//! | Array     | array flag, children `size` and `data`               | `count: i32` + `count` × `data` |
//! | Primitive | no children, type name in the [`Primitive`] table    | fixed-width scalar              |
//! | Record    | anything else with children                          | each child in declared order    |
//!
//! Counts and scalars follow the byte order of the reader/writer passed in.
//!
//! [`measure`] walks the same shapes without building values and always
//! consumes exactly the bytes [`decode`] would.
//!
//! A schema that does not describe the object's real layout decodes garbage
//! or fails part way; there is no resynchronisation.

mod decode;
mod encode;
mod primitive;
mod value;

use endian::{ByteOrder, CursorError, EndianReader, EndianWriter};
use thiserror::Error;
use typetree::TypeNode;

pub use decode::{decode, measure};
pub use encode::encode;
pub use primitive::{Primitive, PrimitiveCodec};
pub use value::Value;

/// Errors produced by the value codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The schema node does not have the structure its shape requires.
    #[error("malformed schema: {0}")]
    Format(String),

    /// A leaf names a type outside the primitive table.
    #[error("unsupported primitive type '{0}'")]
    UnsupportedType(String),

    /// A value handed to the encoder does not fit the schema node.
    #[error("type mismatch at '{field}': schema expects {expected}, value is {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },

    #[error(transparent)]
    Cursor(#[from] CursorError),
}

/// Decodes one value from an in-memory byte slice.
pub fn decode_bytes(node: &TypeNode, bytes: &[u8], order: ByteOrder) -> Result<Value, CodecError> {
    let mut r = EndianReader::from_bytes(bytes, order);
    decode(node, &mut r)
}

/// Encodes one value into a new byte vector.
pub fn encode_to_vec(node: &TypeNode, value: &Value, order: ByteOrder) -> Result<Vec<u8>, CodecError> {
    let mut w = EndianWriter::in_memory(order);
    encode(node, value, &mut w)?;
    Ok(w.into_bytes())
}

/// Number of bytes `decode` would consume for the value at the start of
/// `bytes`.
pub fn measure_bytes(node: &TypeNode, bytes: &[u8], order: ByteOrder) -> Result<u64, CodecError> {
    let mut r = EndianReader::from_bytes(bytes, order);
    measure(node, &mut r)
}

/// The shape a schema node is decoded as.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Shape<'a> {
    Primitive(Primitive),
    String,
    Array { data: &'a TypeNode },
    Record,
}

impl<'a> Shape<'a> {
    pub(crate) fn of(node: &'a TypeNode) -> Result<Self, CodecError> {
        if node.type_name == "string" {
            check_string(node)?;
            return Ok(Shape::String);
        }

        if node.is_array {
            return Ok(Shape::Array {
                data: array_data(node)?,
            });
        }

        if node.children.is_empty() {
            let prim = Primitive::from_type_name(&node.type_name)
                .ok_or_else(|| CodecError::UnsupportedType(node.type_name.clone()))?;
            let width = prim.codec().width;
            if node.byte_size != -1 && node.byte_size as u64 != width {
                return Err(CodecError::Format(format!(
                    "'{} {}' declares {} byte(s) but {} is {} byte(s) wide",
                    node.type_name, node.field_name, node.byte_size, node.type_name, width
                )));
            }
            return Ok(Shape::Primitive(prim));
        }

        Ok(Shape::Record)
    }
}

/// The `data` child of an array node with exactly the children `size` and
/// `data`.
fn array_data(node: &TypeNode) -> Result<&TypeNode, CodecError> {
    let [size, data] = node.children.as_slice() else {
        return Err(CodecError::Format(format!(
            "array '{}' must have exactly two children, found {}",
            node.field_name,
            node.children.len()
        )));
    };
    if size.field_name != "size" || data.field_name != "data" {
        return Err(CodecError::Format(format!(
            "array '{}' children must be 'size' and 'data', found '{}' and '{}'",
            node.field_name, size.field_name, data.field_name
        )));
    }
    Ok(data)
}

fn check_string(node: &TypeNode) -> Result<(), CodecError> {
    let [array] = node.children.as_slice() else {
        return Err(CodecError::Format(format!(
            "string '{}' must have a single array child, found {} children",
            node.field_name,
            node.children.len()
        )));
    };
    if !array.is_array {
        return Err(CodecError::Format(format!(
            "string '{}' child '{}' is not an array",
            node.field_name, array.field_name
        )));
    }
    let data = array_data(array)?;
    if data.type_name != "char" {
        return Err(CodecError::Format(format!(
            "string '{}' elements must be char, found {}",
            node.field_name, data.type_name
        )));
    }
    Ok(())
}
