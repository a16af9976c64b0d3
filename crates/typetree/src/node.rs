use endian::{EndianReader, EndianWriter};
use std::io::{Read, Seek, Write};

use crate::SchemaError;

/// Deepest nesting accepted when reading a tree. Real schemas stay well
/// below this; anything deeper is treated as corrupt input.
pub const MAX_TREE_DEPTH: usize = 128;

/// Upper bound on children per node accepted when reading.
const MAX_CHILDREN: i32 = 1 << 16;

/// One node of a runtime type tree.
///
/// A root describes a whole object; every child describes one serialized
/// field in declaration order. Leaves are primitives, `byte_size == -1`
/// marks nodes whose size depends on their content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    pub type_name: String,
    pub field_name: String,
    pub byte_size: i32,
    pub index: i32,
    pub is_array: bool,
    pub version: i32,
    pub meta_flags: i32,
    pub children: Vec<TypeNode>,
}

impl TypeNode {
    /// A primitive leaf of a fixed size.
    pub fn leaf(type_name: &str, field_name: &str, byte_size: i32) -> Self {
        Self {
            type_name: type_name.to_string(),
            field_name: field_name.to_string(),
            byte_size,
            index: 0,
            is_array: false,
            version: 1,
            meta_flags: 0,
            children: Vec::new(),
        }
    }

    /// A composite node whose size is computed from `children`.
    pub fn record(type_name: &str, field_name: &str, children: Vec<TypeNode>) -> Self {
        Self {
            children,
            ..Self::leaf(type_name, field_name, -1)
        }
    }

    /// The canonical array node: `Array Array { int size; <data> data; }`.
    pub fn array(data: TypeNode) -> Self {
        let mut data = data;
        data.field_name = "data".to_string();
        Self {
            is_array: true,
            ..Self::record(
                "Array",
                "Array",
                vec![Self::leaf("int", "size", 4), data],
            )
        }
    }

    /// A `vector` field wrapping an array of `data` elements.
    pub fn vector(field_name: &str, data: TypeNode) -> Self {
        Self::record("vector", field_name, vec![Self::array(data)])
    }

    /// The canonical string node: `string <name> { Array Array { int size; char data; } }`.
    pub fn string(field_name: &str) -> Self {
        Self::record(
            "string",
            field_name,
            vec![Self::array(Self::leaf("char", "data", 1))],
        )
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the first direct child named `field_name`.
    #[must_use]
    pub fn child(&self, field_name: &str) -> Option<&TypeNode> {
        self.children.iter().find(|c| c.field_name == field_name)
    }

    /// Number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TypeNode::node_count).sum::<usize>()
    }

    /// Reads one tree in the reader's current byte order.
    pub fn read_from<R: Read + Seek>(r: &mut EndianReader<R>) -> Result<Self, SchemaError> {
        Self::read_at_depth(r, 0)
    }

    fn read_at_depth<R: Read + Seek>(
        r: &mut EndianReader<R>,
        depth: usize,
    ) -> Result<Self, SchemaError> {
        if depth > MAX_TREE_DEPTH {
            return Err(SchemaError::Format(format!(
                "type tree nested deeper than {} levels at offset {}",
                MAX_TREE_DEPTH,
                r.position()
            )));
        }

        let type_name = r.read_cstring()?;
        let field_name = r.read_cstring()?;
        let byte_size = r.read_i32()?;
        let index = r.read_i32()?;
        let is_array = r.read_i32()? != 0;
        let version = r.read_i32()?;
        let meta_flags = r.read_i32()?;

        let child_count = r.read_i32()?;
        if !(0..=MAX_CHILDREN).contains(&child_count) {
            return Err(SchemaError::Format(format!(
                "node '{} {}' has invalid child count {}",
                type_name, field_name, child_count
            )));
        }

        let mut children = Vec::with_capacity(child_count as usize);
        for _ in 0..child_count {
            children.push(Self::read_at_depth(r, depth + 1)?);
        }

        Ok(Self {
            type_name,
            field_name,
            byte_size,
            index,
            is_array,
            version,
            meta_flags,
            children,
        })
    }

    /// Writes this tree in the writer's current byte order.
    pub fn write_to<W: Write + Seek>(&self, w: &mut EndianWriter<W>) -> Result<(), SchemaError> {
        w.write_cstring(&self.type_name)?;
        w.write_cstring(&self.field_name)?;
        w.write_i32(self.byte_size)?;
        w.write_i32(self.index)?;
        w.write_i32(i32::from(self.is_array))?;
        w.write_i32(self.version)?;
        w.write_i32(self.meta_flags)?;
        w.write_i32(self.children.len() as i32)?;
        for child in &self.children {
            child.write_to(w)?;
        }
        Ok(())
    }
}
