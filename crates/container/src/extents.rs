use std::fmt;

use crate::ContainerError;

/// Half-open byte range `[start, end)` inside a container file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub start: u64,
    pub end: u64,
}

impl Extent {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty extents never intersect anything.
    #[must_use]
    pub fn intersects(&self, other: &Extent) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}) ({} bytes)", self.start, self.end, self.len())
    }
}

/// The five logical blocks of a container as last loaded or saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockExtents {
    pub header: Extent,
    /// Schema table, plus the preload table when present.
    pub schema_table: Extent,
    pub object_index: Extent,
    pub externals: Extent,
    /// From the lowest object start to the highest object end.
    pub object_data: Extent,
}

impl BlockExtents {
    /// Blocks paired with their names, in file-format order.
    #[must_use]
    pub fn named(&self) -> [(&'static str, Extent); 5] {
        [
            ("header", self.header),
            ("schema table", self.schema_table),
            ("object index", self.object_index),
            ("external references", self.externals),
            ("object data", self.object_data),
        ]
    }

    /// Fails on the first pair of overlapping blocks.
    pub fn check_disjoint(&self) -> Result<(), ContainerError> {
        let blocks = self.named();
        for (i, &(first, a)) in blocks.iter().enumerate() {
            for &(second, b) in &blocks[i + 1..] {
                if a.intersects(&b) {
                    return Err(ContainerError::InvariantViolation {
                        first,
                        second,
                        detail: format!("{a} overlaps {b}"),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Running minimum/maximum over object byte ranges.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DataSpan {
    min: u64,
    max: u64,
}

impl DataSpan {
    pub(crate) fn new() -> Self {
        Self {
            min: u64::MAX,
            max: 0,
        }
    }

    pub(crate) fn add(&mut self, start: u64, len: u64) {
        self.min = self.min.min(start);
        self.max = self.max.max(start + len);
    }

    pub(crate) fn extent(&self) -> Extent {
        if self.min > self.max {
            Extent::default()
        } else {
            Extent::new(self.min, self.max)
        }
    }
}
