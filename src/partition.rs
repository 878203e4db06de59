use crate::MAX_NAME_LENGTH;
use crate::error::Error;
use crate::registry::{PartitionType, SubType};
use alloc::string::String;
use core::fmt;
use core::ops::{BitOr, BitOrAssign};

/// Flag bits stored in the last word of a record slot. Bits without a named constant are kept
/// as they are so that tables written by other tools survive a decode/encode cycle.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Flags(pub u32);

impl Flags {
    pub const NONE: Flags = Flags(0);
    pub const ENCRYPTED: Flags = Flags(1 << 0);
    pub const READONLY: Flags = Flags(1 << 1);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Self) -> Self::Output {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

/// One entry of the partition table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Partition {
    /// The subtype, which also determines the partition type.
    pub subtype: SubType,
    /// Absolute flash address the partition starts at.
    pub offset: u32,
    /// Length of the partition in bytes.
    pub size: u32,
    /// Label of the partition. Only the first [`MAX_NAME_LENGTH`] bytes are stored on flash.
    pub name: String,
    pub flags: Flags,
}

impl Partition {
    pub fn new(subtype: impl Into<SubType>, offset: u32, size: u32, name: impl Into<String>) -> Self {
        Self {
            subtype: subtype.into(),
            offset,
            size,
            name: name.into(),
            flags: Flags::NONE,
        }
    }

    /// Creates a partition from registry names, e.g. `("data", "nvs")`.
    ///
    /// Fails with [`Error::UnknownTypeName`] or [`Error::UnknownSubTypeName`] if the names are
    /// not part of the registry.
    pub fn from_names(
        partition_type: &str,
        subtype: &str,
        offset: u32,
        size: u32,
        name: impl Into<String>,
    ) -> Result<Self, Error> {
        let partition_type = PartitionType::from_name(partition_type)?;
        let subtype = SubType::from_name(partition_type, subtype)?;
        Ok(Self::new(subtype, offset, size, name))
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub const fn partition_type(&self) -> PartitionType {
        self.subtype.partition_type()
    }

    /// First address after the partition.
    pub const fn end(&self) -> u64 {
        self.offset as u64 + self.size as u64
    }

    /// Returns `true` if both partitions claim at least one common byte. Empty partitions never
    /// overlap anything.
    pub const fn overlaps(&self, other: &Partition) -> bool {
        self.size != 0
            && other.size != 0
            && (self.offset as u64) < other.end()
            && (other.offset as u64) < self.end()
    }

    /// The name as it is stored on flash: truncated to at most [`MAX_NAME_LENGTH`] bytes, on a
    /// character boundary.
    pub fn encoded_name(&self) -> &[u8] {
        let mut end = self.name.len().min(MAX_NAME_LENGTH);
        while !self.name.is_char_boundary(end) {
            end -= 1;
        }
        &self.name.as_bytes()[..end]
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<16} {:<4} {:<8} 0x{:08x} 0x{:08x}",
            self.name,
            self.partition_type(),
            self.subtype,
            self.offset,
            self.size
        )
    }
}
