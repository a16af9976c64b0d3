use super::helpers::*;
use crate::*;
use anyhow::Result;
use codec::Value;
use endian::ByteOrder;

#[test]
fn decode_object_uses_bound_schema() -> Result<()> {
    let c = sample(9, ByteOrder::Little)?;
    assert_eq!(c.decode_object(1)?, transform_value("Root"));
    assert_eq!(c.object_byte_len(1)?, 20);
    assert_eq!(c.object_byte_len(2)?, 21);
    Ok(())
}

#[test]
fn edited_object_is_saved_with_new_size() -> Result<()> {
    let repo = repo();
    let mut c = sample(9, ByteOrder::Big)?;

    let mut value = c.decode_object(1)?;
    *value.field_mut("m_Name").unwrap() = Value::String("A much longer name".into());
    c.encode_object(1, &value)?;
    assert_eq!(c.object(1).unwrap().info().byte_size, 12 + 4 + 18);

    let bytes = c.to_bytes()?;
    let loaded = Container::from_bytes(&bytes, &repo)?;
    assert_eq!(loaded.decode_object(1)?, value);
    assert_eq!(loaded.decode_object(2)?, transform_value("Child"));
    // 34 bytes, so the second object moves to 40.
    assert_eq!(loaded.object(2).unwrap().info().byte_start, 40);
    Ok(())
}

#[test]
fn encode_rejects_mismatched_value() -> Result<()> {
    let mut c = sample(9, ByteOrder::Little)?;
    let before = c.object(1).unwrap().bytes().to_vec();
    assert!(matches!(
        c.encode_object(1, &Value::I32(5)),
        Err(ContainerError::Codec(codec::CodecError::TypeMismatch { .. }))
    ));
    assert_eq!(c.object(1).unwrap().bytes(), before.as_slice());
    Ok(())
}

#[test]
fn opaque_objects_accept_raw_bytes_only() -> Result<()> {
    let repo = repo();
    let mut c = sample(9, ByteOrder::Little)?;
    assert!(matches!(
        c.encode_object(3, &Value::U8(1)),
        Err(ContainerError::NoSchema { .. })
    ));
    assert!(matches!(
        c.object_byte_len(3),
        Err(ContainerError::NoSchema { .. })
    ));

    c.set_object_bytes(3, vec![9; 12])?;
    let loaded = Container::from_bytes(&c.to_bytes()?, &repo)?;
    assert_eq!(loaded.object(3).unwrap().bytes(), &[9; 12]);
    Ok(())
}

#[test]
fn schema_less_class_is_opaque() -> Result<()> {
    let repo = repo();
    let mut c = Container::new(9, ByteOrder::Little, SIGNATURE)?;
    c.add_object(
        ObjectInfo::new(5, MONO_BEHAVIOUR_CLASS_ID),
        vec![0; 8],
        &repo,
    )?;
    assert!(c.object(5).unwrap().is_opaque());
    Ok(())
}

#[test]
fn unknown_and_duplicate_ids() -> Result<()> {
    let repo = repo();
    let mut c = sample(9, ByteOrder::Little)?;
    assert!(matches!(
        c.decode_object(42),
        Err(ContainerError::ObjectNotFound(42))
    ));
    assert!(matches!(
        c.set_object_bytes(42, Vec::new()),
        Err(ContainerError::ObjectNotFound(42))
    ));
    assert!(matches!(
        c.add_object(ObjectInfo::new(1, TRANSFORM), Vec::new(), &repo),
        Err(ContainerError::Format(_))
    ));
    Ok(())
}

#[test]
fn index_preserves_insertion_order() -> Result<()> {
    let repo = repo();
    let mut c = Container::new(9, ByteOrder::Little, SIGNATURE)?;
    for id in [30, 10, 20] {
        c.add_object(ObjectInfo::new(id, UNKNOWN_CLASS), vec![id as u8], &repo)?;
    }
    let loaded = Container::from_bytes(&c.to_bytes()?, &repo)?;
    let ids: Vec<i64> = loaded.objects().iter().map(|o| o.info().object_id).collect();
    assert_eq!(ids, vec![30, 10, 20]);
    Ok(())
}
