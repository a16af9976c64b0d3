use std::io::{Read, Seek};

use endian::{CursorError, EndianReader};
use typetree::TypeNode;

use crate::{CodecError, Shape, Value};

/// Decodes one value described by `node` from the reader's current position.
///
/// On success the reader sits just past the value. On error its position is
/// unspecified.
pub fn decode<R: Read + Seek>(
    node: &TypeNode,
    r: &mut EndianReader<R>,
) -> Result<Value, CodecError> {
    match Shape::of(node)? {
        Shape::Primitive(prim) => {
            let codec = prim.codec();
            let mut buf = [0u8; 8];
            let bytes = &mut buf[..codec.width as usize];
            r.read_exact_into(bytes)?;
            Ok((codec.decode)(bytes, r.order()))
        }
        Shape::String => {
            let start = r.position();
            let count = read_count(node, r)?;
            let bytes = r.read_bytes(count)?;
            String::from_utf8(bytes)
                .map(Value::String)
                .map_err(|_| {
                    CodecError::Format(format!(
                        "string '{}' at offset {start} is not valid UTF-8",
                        node.field_name
                    ))
                })
        }
        Shape::Array { data } => {
            let count = read_count(node, r)?;
            let reserve = count.min(usize::try_from(r.remaining()).unwrap_or(usize::MAX));
            let mut items = Vec::with_capacity(reserve);
            for _ in 0..count {
                items.push(decode(data, r)?);
            }
            Ok(Value::Array(items))
        }
        Shape::Record => {
            let mut fields = Vec::with_capacity(node.children.len());
            for child in &node.children {
                fields.push((child.field_name.clone(), decode(child, r)?));
            }
            Ok(Value::Record(fields))
        }
    }
}

/// Advances past one value described by `node` without building it and
/// returns the number of bytes consumed.
pub fn measure<R: Read + Seek>(
    node: &TypeNode,
    r: &mut EndianReader<R>,
) -> Result<u64, CodecError> {
    let start = r.position();
    skip_value(node, r)?;
    Ok(r.position() - start)
}

fn skip_value<R: Read + Seek>(
    node: &TypeNode,
    r: &mut EndianReader<R>,
) -> Result<(), CodecError> {
    match Shape::of(node)? {
        Shape::Primitive(prim) => skip(r, prim.codec().width),
        Shape::String => {
            let count = read_count(node, r)?;
            skip(r, count as u64)
        }
        Shape::Array { data } => {
            let count = read_count(node, r)?;
            if count == 0 {
                return Ok(());
            }
            // Fixed-width elements can be skipped in one step.
            if let Shape::Primitive(prim) = Shape::of(data)? {
                let total = (count as u64)
                    .checked_mul(prim.codec().width)
                    .ok_or_else(|| {
                        CodecError::Format(format!("array '{}' is too large", node.field_name))
                    })?;
                return skip(r, total);
            }
            for _ in 0..count {
                skip_value(data, r)?;
            }
            Ok(())
        }
        Shape::Record => {
            for child in &node.children {
                skip_value(child, r)?;
            }
            Ok(())
        }
    }
}

fn skip<R: Read + Seek>(r: &mut EndianReader<R>, n: u64) -> Result<(), CodecError> {
    if n > r.remaining() {
        return Err(CursorError::Bounds {
            offset: r.position(),
            requested: n,
            len: r.len(),
        }
        .into());
    }
    r.seek(r.position() + n)?;
    Ok(())
}

/// Reads an `i32` element count, rejecting negative values.
fn read_count<R: Read + Seek>(
    node: &TypeNode,
    r: &mut EndianReader<R>,
) -> Result<usize, CodecError> {
    let offset = r.position();
    let count = r.read_i32()?;
    usize::try_from(count).map_err(|_| {
        CodecError::Format(format!(
            "negative count {count} for '{}' at offset {offset}",
            node.field_name
        ))
    })
}
