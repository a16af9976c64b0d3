use super::helpers::*;
use crate::*;
use anyhow::Result;
use endian::ByteOrder;

fn be_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes(bytes[at..at + 4].try_into().unwrap())
}

// -------------------- Modern layout --------------------

#[test]
fn modern_header_and_padding() -> Result<()> {
    let mut c = sample(9, ByteOrder::Little)?;
    let bytes = c.to_bytes()?;

    // schema table 20 + object index 64 + externals 39 + 1
    assert_eq!(be_u32(&bytes, 0), 124);
    assert_eq!(be_u32(&bytes, 4), bytes.len() as u32);
    assert_eq!(be_u32(&bytes, 8), 9);
    assert_eq!(be_u32(&bytes, 12), 4096);
    assert_eq!(bytes[16], 0);
    assert_eq!(&bytes[17..20], &[0, 0, 0]);

    // Objects aligned to 8 after the data offset: 20, 21 and 5 bytes.
    let starts: Vec<u32> = c.objects().iter().map(|o| o.info().byte_start).collect();
    assert_eq!(starts, vec![0, 24, 48]);
    assert_eq!(bytes.len(), 4096 + 48 + 5);

    // Padding between metadata and data is zero.
    assert!(bytes[143..4096].iter().all(|&b| b == 0));
    Ok(())
}

#[test]
fn modern_extents_follow_block_order() -> Result<()> {
    let mut c = sample(9, ByteOrder::Big)?;
    let bytes = c.to_bytes()?;
    assert_eq!(bytes[16], 1);

    let e = *c.extents();
    assert_eq!(e.header, Extent::new(0, 20));
    assert_eq!(e.schema_table, Extent::new(20, 40));
    assert_eq!(e.object_index, Extent::new(40, 104));
    assert_eq!(e.externals, Extent::new(104, 143));
    assert_eq!(e.object_data, Extent::new(4096, 4149));
    e.check_disjoint()?;

    let loaded = Container::from_bytes(&bytes, &repo())?;
    assert_eq!(*loaded.extents(), e);
    Ok(())
}

#[test]
fn large_metadata_skips_minimum_padding() -> Result<()> {
    let repo = repo();
    let mut c = Container::new(9, ByteOrder::Little, SIGNATURE)?;
    for id in 0..301 {
        c.add_object(ObjectInfo::new(id, TRANSFORM), vec![0xAB], &repo)?;
    }
    let bytes = c.to_bytes()?;

    // 20 + 20 + (4 + 301 * 20) + 4 = 6068 bytes of header and metadata.
    let data_offset = be_u32(&bytes, 12);
    assert_eq!(data_offset, 6080);
    assert_eq!(data_offset % 16, 0);
    Ok(())
}

#[test]
fn wide_index_aligns_each_entry() -> Result<()> {
    let mut c = sample(15, ByteOrder::Little)?;
    c.to_bytes()?;
    // count 4, then per entry: 8 + 4 + 4 + 4 + 2 + 2 + 2 + 1 = 27, padded to 28
    // before every entry but the first.
    let index = c.extents().object_index;
    assert_eq!(index.start % 4, 0);
    assert_eq!(index.len(), 4 + 28 + 28 + 27);
    Ok(())
}

// -------------------- Legacy layout --------------------

#[test]
fn legacy_stores_data_before_metadata() -> Result<()> {
    let mut c = sample(8, ByteOrder::Big)?;
    let bytes = c.to_bytes()?;

    let metadata_size = be_u32(&bytes, 0);
    let file_size = be_u32(&bytes, 4);
    assert_eq!(be_u32(&bytes, 12), 0);
    assert_eq!(file_size as usize, bytes.len());
    assert_eq!(metadata_size, 20 + 64 + 39 + 2);

    // The body endianness flag sits at file_size - metadata_size.
    let flag_pos = (file_size - metadata_size) as usize;
    assert_eq!(flag_pos, 69);
    assert_eq!(bytes[flag_pos], 1);
    assert_eq!(*bytes.last().unwrap(), 0);

    let starts: Vec<u32> = c.objects().iter().map(|o| o.info().byte_start).collect();
    assert_eq!(starts, vec![16, 40, 64]);

    let e = c.extents();
    assert_eq!(e.header, Extent::new(0, 16));
    assert_eq!(e.object_data, Extent::new(16, 69));
    assert_eq!(e.schema_table.start, 70);
    Ok(())
}

#[test]
fn oldest_format_has_no_asset_path() -> Result<()> {
    let mut c = sample(5, ByteOrder::Little)?;
    c.to_bytes()?;
    assert_eq!(c.extents().externals.len(), 38);
    assert_eq!(c.externals()[0].asset_path, None);
    Ok(())
}

#[test]
fn legacy_metadata_size_past_file_size_is_rejected() -> Result<()> {
    let mut bytes = sample(8, ByteOrder::Little)?.to_bytes()?;
    bytes[0..4].copy_from_slice(&u32::MAX.to_be_bytes());
    assert!(matches!(
        Container::from_bytes(&bytes, &repo()),
        Err(ContainerError::Format(_))
    ));
    Ok(())
}

// -------------------- Validation --------------------

#[test]
fn unsupported_versions_are_rejected() -> Result<()> {
    assert!(matches!(
        Container::new(4, ByteOrder::Little, SIGNATURE),
        Err(ContainerError::UnsupportedVersion(4))
    ));

    let mut bytes = sample(9, ByteOrder::Little)?.to_bytes()?;
    bytes[8..12].copy_from_slice(&18i32.to_be_bytes());
    assert!(matches!(
        Container::from_bytes(&bytes, &repo()),
        Err(ContainerError::UnsupportedVersion(18))
    ));
    Ok(())
}

#[test]
fn truncated_object_data_is_bounds_error() -> Result<()> {
    let mut bytes = sample(9, ByteOrder::Little)?.to_bytes()?;
    bytes.truncate(bytes.len() - 1);
    assert!(matches!(
        Container::from_bytes(&bytes, &repo()),
        Err(ContainerError::Cursor(endian::CursorError::Bounds { .. }))
    ));
    Ok(())
}

#[test]
fn objects_overlapping_header_violate_invariant() -> Result<()> {
    let mut bytes = sample(9, ByteOrder::Little)?.to_bytes()?;
    bytes[12..16].copy_from_slice(&0u32.to_be_bytes());
    match Container::from_bytes(&bytes, &repo()) {
        Err(ContainerError::InvariantViolation { first, second, .. }) => {
            assert_eq!(first, "header");
            assert_eq!(second, "object data");
        }
        other => panic!("expected invariant violation, got {other:?}"),
    }
    Ok(())
}

#[test]
fn overlapping_objects_are_rejected() -> Result<()> {
    let mut bytes = sample(9, ByteOrder::Little)?.to_bytes()?;
    // Index at 40: count, then 20-byte entries; byte_start follows the id.
    let second_start = 40 + 4 + 20 + 4;
    bytes[second_start..second_start + 4].copy_from_slice(&0u32.to_le_bytes());
    match Container::from_bytes(&bytes, &repo()) {
        Err(ContainerError::Format(msg)) => {
            assert!(msg.contains("object 1"), "{msg}");
            assert!(msg.contains("object 2"), "{msg}");
        }
        other => panic!("expected format error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn disjointness_check_names_the_pair() {
    let extents = BlockExtents {
        header: Extent::new(0, 20),
        schema_table: Extent::new(20, 40),
        object_index: Extent::new(39, 60),
        externals: Extent::new(60, 70),
        object_data: Extent::default(),
    };
    assert!(matches!(
        extents.check_disjoint(),
        Err(ContainerError::InvariantViolation {
            first: "schema table",
            second: "object index",
            ..
        })
    ));
}

#[test]
fn empty_extents_never_intersect() {
    let empty = Extent::new(10, 10);
    assert!(!empty.intersects(&Extent::new(0, 100)));
    assert!(Extent::new(0, 11).intersects(&Extent::new(10, 20)));
    assert!(!Extent::new(0, 10).intersects(&Extent::new(10, 20)));
}
