use crate::error::Error;
use crate::partition::{Flags, Partition};
use crate::registry::{PartitionType, SubType};
use alloc::string::String;
use core::ops::Range;

/// Default flash address of the partition table.
pub const PARTITION_TABLE_OFFSET: u32 = 0x8000;
/// Length of the partition table region.
pub const TABLE_LENGTH: usize = 0xC00;
pub const SLOT_SIZE: usize = 32;
pub const MAX_NAME_LENGTH: usize = 16;
pub(crate) const SLOT_COUNT: usize = TABLE_LENGTH / SLOT_SIZE;

pub const MAGIC: [u8; 2] = [0xAA, 0x50];
/// Marks the trailer slot holding the MD5 digest.
pub const MD5_MAGIC: [u8; 16] = [
    0xEB, 0xEB, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
];
pub const MD5_DIGEST_SIZE: usize = 16;

// Field positions inside a record slot
const MAGIC_RANGE: Range<usize> = 0..2;
const TYPE_POS: usize = 2;
const SUBTYPE_POS: usize = 3;
const OFFSET_RANGE: Range<usize> = 4..8;
const SIZE_RANGE: Range<usize> = 8..12;
const NAME_RANGE: Range<usize> = 12..28;
const FLAGS_RANGE: Range<usize> = 28..32;

const _: () = assert!(
    FLAGS_RANGE.end == SLOT_SIZE && NAME_RANGE.end - NAME_RANGE.start == MAX_NAME_LENGTH,
    "record fields must fill exactly one slot"
);
const _: () = assert!(
    MD5_MAGIC.len() + MD5_DIGEST_SIZE == SLOT_SIZE,
    "trailer marker plus digest must fill exactly one slot"
);
const _: () = assert!(
    TABLE_LENGTH % SLOT_SIZE == 0,
    "table region must consist of whole slots"
);

pub(crate) type Slot = [u8; SLOT_SIZE];

/// How a single slot of the table region is interpreted.
#[derive(Debug, PartialEq)]
pub(crate) enum SlotKind<'a> {
    /// Unwritten flash, the table ends here.
    Erased,
    /// The MD5 trailer with the digest over all preceding record slots.
    Checksum(&'a [u8; MD5_DIGEST_SIZE]),
    Record,
}

pub(crate) fn classify(slot: &Slot) -> SlotKind<'_> {
    if slot.iter().all(|&b| b == 0xFF) {
        return SlotKind::Erased;
    }

    let (marker, digest) = slot.split_at(MD5_MAGIC.len());
    if marker == MD5_MAGIC {
        // split_at of a 32 byte array at 16 always leaves 16 bytes
        if let Ok(digest) = <&[u8; MD5_DIGEST_SIZE]>::try_from(digest) {
            return SlotKind::Checksum(digest);
        }
    }

    SlotKind::Record
}

pub(crate) fn has_magic(slot: &Slot) -> bool {
    slot[MAGIC_RANGE] == MAGIC
}

/// Parses a record slot. The magic bytes are not inspected here.
pub(crate) fn parse_record(slot: &Slot) -> Result<Partition, Error> {
    let partition_type = PartitionType::from_byte(slot[TYPE_POS])?;
    let subtype = SubType::from_byte(partition_type, slot[SUBTYPE_POS])?;

    Ok(Partition {
        subtype,
        offset: read_u32(slot, OFFSET_RANGE),
        size: read_u32(slot, SIZE_RANGE),
        name: name_from_field(&slot[NAME_RANGE]),
        flags: Flags(read_u32(slot, FLAGS_RANGE)),
    })
}

pub(crate) fn serialize_record(partition: &Partition) -> Slot {
    let mut slot = [0u8; SLOT_SIZE];
    slot[MAGIC_RANGE].copy_from_slice(&MAGIC);
    slot[TYPE_POS] = partition.partition_type().to_byte();
    slot[SUBTYPE_POS] = partition.subtype.to_byte();
    slot[OFFSET_RANGE].copy_from_slice(&partition.offset.to_le_bytes());
    slot[SIZE_RANGE].copy_from_slice(&partition.size.to_le_bytes());

    let name = partition.encoded_name();
    slot[NAME_RANGE.start..NAME_RANGE.start + name.len()].copy_from_slice(name);

    slot[FLAGS_RANGE].copy_from_slice(&partition.flags.bits().to_le_bytes());
    slot
}

pub(crate) fn serialize_trailer(digest: &[u8; MD5_DIGEST_SIZE]) -> Slot {
    let mut slot = [0u8; SLOT_SIZE];
    slot[..MD5_MAGIC.len()].copy_from_slice(&MD5_MAGIC);
    slot[MD5_MAGIC.len()..].copy_from_slice(digest);
    slot
}

fn read_u32(slot: &Slot, range: Range<usize>) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&slot[range]);
    u32::from_le_bytes(word)
}

/// Names are stored as C strings in a 16 byte field, padded with null bytes. The padding is
/// stripped; a name using all 16 bytes has no terminator at all.
///
/// Invalid UTF-8 bytes are replaced one for one with `?`, so the name never grows past the
/// field and encodes back to the same bytes.
fn name_from_field(raw: &[u8]) -> String {
    let len = raw.iter().rposition(|&b| b != 0x00).map_or(0, |idx| idx + 1);
    let mut name = String::with_capacity(len);
    for chunk in raw[..len].utf8_chunks() {
        name.push_str(chunk.valid());
        name.extend(core::iter::repeat_n('?', chunk.invalid().len()));
    }
    name
}
