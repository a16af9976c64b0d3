use crate::*;
use anyhow::Result;
use codec::Value;
use endian::ByteOrder;
use typetree::{SchemaRepository, SchemaRepositoryBuilder, TypeNode};

pub const TRANSFORM: i32 = 4;
pub const UNKNOWN_CLASS: i32 = 999;
pub const SIGNATURE: &str = "4.6.1f1";

pub fn transform_schema() -> TypeNode {
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
            TypeNode::string("m_Name"),
        ],
    )
}

pub fn transform_value(name: &str) -> Value {
    Value::Record(vec![
        (
            "m_LocalPosition".into(),
            Value::Record(vec![
                ("x".into(), Value::F32(1.0)),
                ("y".into(), Value::F32(2.0)),
                ("z".into(), Value::F32(3.0)),
            ]),
        ),
        ("m_Name".into(), Value::String(name.into())),
    ])
}

pub fn repo() -> SchemaRepository {
    let mut b = SchemaRepositoryBuilder::new(1);
    b.bind(TRANSFORM, SIGNATURE, transform_schema());
    b.build()
}

pub fn transform_bytes(name: &str, order: ByteOrder) -> Result<Vec<u8>> {
    Ok(codec::encode_to_vec(
        &transform_schema(),
        &transform_value(name),
        order,
    )?)
}

/// Two transforms ("Root": 20 bytes, "Child": 21 bytes), one opaque
/// 5-byte object and one external reference.
pub fn sample(format_version: i32, order: ByteOrder) -> Result<Container> {
    let repo = repo();
    let mut c = Container::new(format_version, order, SIGNATURE)?;
    c.add_object(ObjectInfo::new(1, TRANSFORM), transform_bytes("Root", order)?, &repo)?;
    c.add_object(ObjectInfo::new(2, TRANSFORM), transform_bytes("Child", order)?, &repo)?;
    c.add_object(ObjectInfo::new(3, UNKNOWN_CLASS), vec![1, 2, 3, 4, 5], &repo)?;
    c.add_external(ExternalReference {
        asset_path: (format_version > ASSET_PATH_VERSION).then(String::new),
        guid: [7; 16],
        ref_type: 0,
        file_path: "shared.assets".into(),
        resolved: None,
    });
    Ok(c)
}
