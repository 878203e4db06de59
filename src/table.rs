use crate::error::Error;
use crate::partition::Partition;
use crate::raw::{
    MD5_DIGEST_SIZE, SLOT_COUNT, SLOT_SIZE, Slot, SlotKind, TABLE_LENGTH, classify, has_magic,
    parse_record, serialize_record, serialize_trailer,
};
use crate::registry::{PartitionType, SubType};
use alloc::vec;
use alloc::vec::Vec;
#[cfg(feature = "defmt")]
use defmt::trace;
use md5::{Digest, Md5};

/// Maximum number of partitions in a table. One slot is reserved for the MD5 trailer.
pub const MAX_PARTITIONS: usize = SLOT_COUNT - 1;

/// Knobs for [`PartitionTable::decode_with`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodeOptions {
    /// Reject record slots that don't start with the `0xAA 0x50` magic. The bootloader itself
    /// doesn't check them, so this is off by default.
    pub strict_magic: bool,
}

/// An ordered list of partitions as stored in the partition table region.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PartitionTable {
    /// Partitions in the order of their slots.
    pub partitions: Vec<Partition>,
}

impl PartitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a partition table region. See [`PartitionTable::decode_with`].
    pub fn decode(data: &[u8]) -> Result<Self, Error> {
        Self::decode_with(data, DecodeOptions::default())
    }

    /// Decodes a partition table region.
    ///
    /// Slots are processed until an erased slot, the MD5 trailer or the end of `data` is
    /// reached. A trailing partial slot is ignored. If a trailer is found, its digest has to
    /// match all record slots before it, otherwise [`Error::Corrupted`] is returned.
    ///
    /// The digest is verified before any record is interpreted, so a damaged table reports
    /// [`Error::Corrupted`] even if the damage also produced an unknown type or subtype.
    pub fn decode_with(data: &[u8], options: DecodeOptions) -> Result<Self, Error> {
        #[cfg(feature = "defmt")]
        trace!("decode: [{}]", data.len());

        let mut records: Vec<&Slot> = Vec::new();
        let mut hasher = Md5::new();

        for chunk in data.chunks_exact(SLOT_SIZE) {
            let slot: &Slot = chunk.try_into().map_err(|_| Error::Corrupted)?;

            match classify(slot) {
                SlotKind::Erased => break,
                SlotKind::Checksum(stored) => {
                    let computed = finalize(hasher);

                    #[cfg(feature = "debug-logs")]
                    println!("decode: stored digest {stored:02x?}, computed {computed:02x?}");

                    if &computed != stored {
                        return Err(Error::Corrupted);
                    }
                    break;
                }
                SlotKind::Record => {
                    hasher.update(slot);
                    records.push(slot);
                }
            }
        }

        let mut partitions = Vec::with_capacity(records.len());
        for (index, slot) in records.into_iter().enumerate() {
            if options.strict_magic && !has_magic(slot) {
                return Err(Error::InvalidMagic { slot: index });
            }
            let partition = parse_record(slot)?;

            #[cfg(feature = "debug-logs")]
            println!("decode: slot {index}: {partition}");

            partitions.push(partition);
        }

        Ok(Self { partitions })
    }

    /// Encodes the table into a region of exactly `TABLE_LENGTH` bytes.
    ///
    /// Unused space is left erased (0xFF). Fails with [`Error::TooManyPartitions`] if the
    /// partitions and the MD5 trailer don't fit.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        #[cfg(feature = "defmt")]
        trace!("encode: {} partitions", self.partitions.len());

        if self.partitions.len() > MAX_PARTITIONS {
            return Err(Error::TooManyPartitions(self.partitions.len()));
        }

        let mut buf = vec![0xFFu8; TABLE_LENGTH];
        let mut hasher = Md5::new();
        let mut cursor = 0;

        for partition in &self.partitions {
            let slot = serialize_record(partition);
            hasher.update(slot);
            buf[cursor..cursor + SLOT_SIZE].copy_from_slice(&slot);
            cursor += SLOT_SIZE;
        }

        let digest = finalize(hasher);
        buf[cursor..cursor + SLOT_SIZE].copy_from_slice(&serialize_trailer(&digest));

        #[cfg(feature = "debug-logs")]
        println!("encode: {} record slots, digest {digest:02x?}", self.partitions.len());

        Ok(buf)
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Partition> {
        self.partitions.iter()
    }

    /// Returns the first partition with the given name.
    pub fn find(&self, name: &str) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.name == name)
    }

    /// Appends a partition to the end of the table.
    pub fn push(&mut self, partition: Partition) {
        self.partitions.push(partition)
    }

    /// Removes and returns the partition at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Partition, Error> {
        if index >= self.partitions.len() {
            return Err(Error::IndexOutOfRange(index));
        }
        Ok(self.partitions.remove(index))
    }

    /// Replaces the partition at `index` and returns the previous one.
    pub fn update(&mut self, index: usize, partition: Partition) -> Result<Partition, Error> {
        let slot = self
            .partitions
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange(index))?;
        Ok(core::mem::replace(slot, partition))
    }

    /// Changes the type of the partition at `index`. The subtype is reset to the first subtype
    /// of the new type unless the type stays the same.
    pub fn set_type(&mut self, index: usize, partition_type: PartitionType) -> Result<(), Error> {
        let partition = self
            .partitions
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange(index))?;
        if partition.partition_type() != partition_type {
            partition.subtype = SubType::default_for(partition_type);
        }
        Ok(())
    }

    /// Checks the table for duplicate names and overlapping partitions. Names are compared as
    /// they are stored on flash, after truncation.
    ///
    /// This is not required for encoding, the bootloader accepts such tables, but they are
    /// almost always a mistake.
    pub fn validate(&self) -> Result<(), Error> {
        for (i, partition) in self.partitions.iter().enumerate() {
            for (j, other) in self.partitions[..i].iter().enumerate() {
                if partition.encoded_name() == other.encoded_name() {
                    return Err(Error::DuplicateName(i));
                }
                if partition.overlaps(other) {
                    return Err(Error::Overlap(j, i));
                }
            }
        }
        Ok(())
    }
}

fn finalize(hasher: Md5) -> [u8; MD5_DIGEST_SIZE] {
    let mut digest = [0u8; MD5_DIGEST_SIZE];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

impl From<Vec<Partition>> for PartitionTable {
    fn from(partitions: Vec<Partition>) -> Self {
        Self { partitions }
    }
}

impl FromIterator<Partition> for PartitionTable {
    fn from_iter<I: IntoIterator<Item = Partition>>(iter: I) -> Self {
        Self {
            partitions: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PartitionTable {
    type Item = &'a Partition;
    type IntoIter = core::slice::Iter<'a, Partition>;

    fn into_iter(self) -> Self::IntoIter {
        self.partitions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AppSubType, DataSubType};

    fn sample() -> PartitionTable {
        PartitionTable::from(vec![
            Partition::new(DataSubType::Nvs, 0x9000, 0x6000, "nvs"),
            Partition::new(DataSubType::Phy, 0xF000, 0x1000, "phy_init"),
            Partition::new(AppSubType::Factory, 0x10000, 0x100000, "factory"),
        ])
    }

    #[test]
    fn mutations() {
        let mut table = sample();

        table.push(Partition::new(DataSubType::Spiffs, 0x110000, 0x10000, "storage"));
        assert_eq!(table.len(), 4);

        let removed = table.remove(1).unwrap();
        assert_eq!(removed.name, "phy_init");
        assert_eq!(table.remove(10), Err(Error::IndexOutOfRange(10)));

        let previous = table
            .update(0, Partition::new(DataSubType::Nvs, 0x9000, 0x5000, "nvs"))
            .unwrap();
        assert_eq!(previous.size, 0x6000);
        assert_eq!(table.find("nvs").unwrap().size, 0x5000);

        table.set_type(2, PartitionType::App).unwrap();
        assert_eq!(table.partitions[2].subtype, SubType::App(AppSubType::Factory));
        table.set_type(1, PartitionType::App).unwrap();
        assert_eq!(table.partitions[1].subtype, SubType::App(AppSubType::Factory));
        assert_eq!(
            table.set_type(7, PartitionType::Data),
            Err(Error::IndexOutOfRange(7))
        );
    }

    #[test]
    fn set_type_keeps_subtype_of_same_type() {
        let mut table = PartitionTable::from(vec![Partition::new(AppSubType::Ota3, 0, 0, "a")]);
        table.set_type(0, PartitionType::App).unwrap();
        assert_eq!(table.partitions[0].subtype, SubType::App(AppSubType::Ota3));
    }

    #[test]
    fn validate() {
        assert_eq!(sample().validate(), Ok(()));

        let mut duplicate = sample();
        duplicate.push(Partition::new(DataSubType::Fat, 0x200000, 0x1000, "nvs"));
        assert_eq!(duplicate.validate(), Err(Error::DuplicateName(3)));

        let mut overlap = sample();
        overlap.push(Partition::new(DataSubType::Fat, 0x80000, 0x1000, "fat"));
        assert_eq!(overlap.validate(), Err(Error::Overlap(2, 3)));

        let mut truncated = sample();
        truncated.push(Partition::new(DataSubType::Fat, 0x200000, 0x1000, "storage_partition_a"));
        truncated.push(Partition::new(DataSubType::Fat, 0x201000, 0x1000, "storage_partition_b"));
        assert_eq!(truncated.validate(), Err(Error::DuplicateName(4)));
    }

    #[test]
    fn max_partitions_fill_the_region() {
        assert_eq!(MAX_PARTITIONS, 95);
        assert_eq!((MAX_PARTITIONS + 1) * SLOT_SIZE, TABLE_LENGTH);
    }
}
