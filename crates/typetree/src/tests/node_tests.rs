use crate::*;
use endian::{ByteOrder, EndianReader, EndianWriter};

fn transform_node() -> TypeNode {
    TypeNode::record(
        "Transform",
        "Base",
        vec![
            TypeNode::record(
                "Vector3f",
                "m_LocalPosition",
                vec![
                    TypeNode::leaf("float", "x", 4),
                    TypeNode::leaf("float", "y", 4),
                    TypeNode::leaf("float", "z", 4),
                ],
            ),
            TypeNode::vector("m_Children", TypeNode::leaf("SInt64", "data", 8)),
            TypeNode::string("m_Name"),
        ],
    )
}

#[test]
fn canonical_shapes() {
    let s = TypeNode::string("m_Name");
    assert_eq!(s.type_name, "string");
    assert_eq!(s.children.len(), 1);
    let arr = &s.children[0];
    assert!(arr.is_array);
    assert_eq!(arr.children[0].field_name, "size");
    assert_eq!(arr.children[1].field_name, "data");
    assert_eq!(arr.children[1].type_name, "char");

    let v = TypeNode::vector("m_Items", TypeNode::leaf("int", "whatever", 4));
    assert_eq!(v.child("Array").unwrap().children[1].field_name, "data");
}

#[test]
fn node_count_covers_subtree() {
    // Transform, Vector3f + 3 floats, vector + Array + size + data,
    // string + Array + size + data.
    assert_eq!(transform_node().node_count(), 1 + 4 + 4 + 4);
}

#[test]
fn wire_roundtrip_in_both_orders() {
    let node = transform_node();
    for order in [ByteOrder::Little, ByteOrder::Big] {
        let mut w = EndianWriter::in_memory(order);
        node.write_to(&mut w).unwrap();
        let bytes = w.into_bytes();

        let mut r = EndianReader::from_bytes(&bytes, order);
        let back = TypeNode::read_from(&mut r).unwrap();
        assert_eq!(back, node);
        assert_eq!(r.remaining(), 0);
    }
}

#[test]
fn leaf_wire_layout_is_exact() {
    let node = TypeNode::leaf("int", "x", 4);
    let mut w = EndianWriter::in_memory(ByteOrder::Big);
    node.write_to(&mut w).unwrap();
    let bytes = w.into_bytes();

    let mut expected = Vec::new();
    expected.extend_from_slice(b"int\0x\0");
    expected.extend_from_slice(&4i32.to_be_bytes()); // byte_size
    expected.extend_from_slice(&0i32.to_be_bytes()); // index
    expected.extend_from_slice(&0i32.to_be_bytes()); // is_array
    expected.extend_from_slice(&1i32.to_be_bytes()); // version
    expected.extend_from_slice(&0i32.to_be_bytes()); // meta_flags
    expected.extend_from_slice(&0i32.to_be_bytes()); // child_count
    assert_eq!(bytes, expected);
}

#[test]
fn negative_child_count_is_format_error() {
    let mut w = EndianWriter::in_memory(ByteOrder::Little);
    w.write_cstring("Base").unwrap();
    w.write_cstring("Base").unwrap();
    for v in [-1, 0, 0, 1, 0, -5] {
        w.write_i32(v).unwrap();
    }
    let bytes = w.into_bytes();
    let mut r = EndianReader::from_bytes(&bytes, ByteOrder::Little);
    assert!(matches!(
        TypeNode::read_from(&mut r),
        Err(SchemaError::Format(_))
    ));
}

#[test]
fn truncated_tree_is_cursor_error() {
    let mut w = EndianWriter::in_memory(ByteOrder::Little);
    transform_node().write_to(&mut w).unwrap();
    let mut bytes = w.into_bytes();
    bytes.truncate(bytes.len() - 3);

    let mut r = EndianReader::from_bytes(&bytes, ByteOrder::Little);
    assert!(matches!(
        TypeNode::read_from(&mut r),
        Err(SchemaError::Cursor(endian::CursorError::Bounds { .. }))
    ));
}

#[test]
fn excessive_nesting_is_rejected() {
    let mut node = TypeNode::leaf("int", "x", 4);
    for _ in 0..(MAX_TREE_DEPTH + 1) {
        node = TypeNode::record("Nest", "n", vec![node]);
    }
    let mut w = EndianWriter::in_memory(ByteOrder::Little);
    node.write_to(&mut w).unwrap();
    let bytes = w.into_bytes();

    let mut r = EndianReader::from_bytes(&bytes, ByteOrder::Little);
    assert!(matches!(
        TypeNode::read_from(&mut r),
        Err(SchemaError::Format(_))
    ));
}
