use std::io::{Seek, Write};

use endian::EndianWriter;
use typetree::TypeNode;

use crate::{CodecError, Shape, Value};

/// Writes `value` in the layout described by `node`.
///
/// The value must mirror the schema: records carry the same fields in the
/// same order, arrays and strings carry their elements, and each leaf holds
/// the variant its primitive decodes to.
pub fn encode<W: Write + Seek>(
    node: &TypeNode,
    value: &Value,
    w: &mut EndianWriter<W>,
) -> Result<(), CodecError> {
    match (Shape::of(node)?, value) {
        (Shape::Primitive(prim), v) => {
            let codec = prim.codec();
            let mut buf = [0u8; 8];
            let bytes = &mut buf[..codec.width as usize];
            (codec.encode)(v, w.order(), bytes).map_err(|found| CodecError::TypeMismatch {
                field: node.field_name.clone(),
                expected: prim.value_kind().to_string(),
                found,
            })?;
            w.write_bytes(bytes)?;
            Ok(())
        }
        (Shape::String, Value::String(s)) => {
            write_count(node, s.len(), w)?;
            w.write_bytes(s.as_bytes())?;
            Ok(())
        }
        (Shape::Array { data }, Value::Array(items)) => {
            write_count(node, items.len(), w)?;
            for item in items {
                encode(data, item, w)?;
            }
            Ok(())
        }
        (Shape::Record, Value::Record(fields)) => {
            if fields.len() != node.children.len() {
                return Err(CodecError::TypeMismatch {
                    field: node.field_name.clone(),
                    expected: format!("record with {} field(s)", node.children.len()),
                    found: "record",
                });
            }
            for (child, (name, v)) in node.children.iter().zip(fields) {
                if *name != child.field_name {
                    return Err(CodecError::TypeMismatch {
                        field: name.clone(),
                        expected: format!("field '{}'", child.field_name),
                        found: v.kind(),
                    });
                }
                encode(child, v, w)?;
            }
            Ok(())
        }
        (shape, v) => Err(CodecError::TypeMismatch {
            field: node.field_name.clone(),
            expected: shape_name(shape).to_string(),
            found: v.kind(),
        }),
    }
}

fn shape_name(shape: Shape<'_>) -> &'static str {
    match shape {
        Shape::Primitive(p) => p.value_kind(),
        Shape::String => "string",
        Shape::Array { .. } => "array",
        Shape::Record => "record",
    }
}

fn write_count<W: Write + Seek>(
    node: &TypeNode,
    len: usize,
    w: &mut EndianWriter<W>,
) -> Result<(), CodecError> {
    let count = i32::try_from(len).map_err(|_| {
        CodecError::Format(format!(
            "'{}' holds {len} elements, more than a count can express",
            node.field_name
        ))
    })?;
    w.write_i32(count)?;
    Ok(())
}
