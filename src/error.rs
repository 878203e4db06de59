use crate::registry::PartitionType;
use thiserror::Error;

/// Errors that can occur while decoding, encoding or editing a partition table. Marked as
/// non-exhaustive to allow for future additions without breaking the API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The MD5 digest stored in the trailer slot does not match the records preceding it.
    #[error("partition table is corrupted")]
    Corrupted,

    /// A record slot carries a type byte that is not part of the registry.
    #[error("unknown partition type 0x{0:02x}")]
    UnknownType(u8),

    /// A record slot carries a subtype byte that is not registered for its type.
    #[error("unknown subtype 0x{subtype:02x} for partition type {partition_type}")]
    UnknownSubType {
        partition_type: PartitionType,
        subtype: u8,
    },

    /// The given name is not a registered partition type.
    #[error("unknown partition type name")]
    UnknownTypeName,

    /// The given name is not a registered subtype of the partition type.
    #[error("unknown subtype name for partition type {0}")]
    UnknownSubTypeName(PartitionType),

    /// The records plus the MD5 trailer do not fit into the table region.
    #[error("too many partitions: {0} (max {max})", max = crate::MAX_PARTITIONS)]
    TooManyPartitions(usize),

    /// Only reported when decoding with `DecodeOptions::strict_magic`.
    #[error("invalid magic bytes in slot {slot}")]
    InvalidMagic { slot: usize },

    #[error("partition index {0} out of range")]
    IndexOutOfRange(usize),

    /// Two partitions share the same name. The index of the second occurrence is reported.
    #[error("duplicate partition name at index {0}")]
    DuplicateName(usize),

    /// The partitions at the two indices occupy overlapping flash ranges.
    #[error("partitions {0} and {1} overlap")]
    Overlap(usize, usize),

    /// The table offset has to be aligned to the erase size of the flash.
    #[error("invalid partition table offset 0x{0:08x}")]
    InvalidTableOffset(u32),

    /// The internal error value is returned from the provided flash driver
    #[error("internal flash error")]
    FlashError,
}
