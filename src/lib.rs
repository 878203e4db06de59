#![doc = include_str ! ("../README.md")]
#![cfg_attr(not(target_arch = "x86_64"), no_std)]

pub mod error;
mod partition;
pub mod platform;
mod raw;
pub mod registry;
mod table;

extern crate alloc;

pub use error::Error;
pub use partition::{Flags, Partition};
pub use raw::{
    MAGIC as PARTITION_MAGIC, MAX_NAME_LENGTH, MD5_DIGEST_SIZE, MD5_MAGIC, PARTITION_TABLE_OFFSET,
    SLOT_SIZE, TABLE_LENGTH,
};
pub use registry::{AppSubType, DataSubType, PartitionType, SubType};
pub use table::{DecodeOptions, MAX_PARTITIONS, PartitionTable};

use crate::platform::{AlignedWriteOps, read_aligned, write_aligned};
use alloc::vec;
#[cfg(feature = "defmt")]
use defmt::trace;
use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};

impl PartitionTable {
    /// Reads and decodes the partition table at the default location `PARTITION_TABLE_OFFSET`.
    pub fn read_from<T: ReadNorFlash>(hal: &mut T) -> Result<Self, Error> {
        Self::read_from_offset(hal, PARTITION_TABLE_OFFSET, DecodeOptions::default())
    }

    /// Reads and decodes a partition table that was moved to `offset`, e.g. via
    /// `CONFIG_PARTITION_TABLE_OFFSET`.
    pub fn read_from_offset<T: ReadNorFlash>(
        hal: &mut T,
        offset: u32,
        options: DecodeOptions,
    ) -> Result<Self, Error> {
        #[cfg(feature = "defmt")]
        trace!("read_from_offset: @{:#08x}", offset);

        #[cfg(feature = "debug-logs")]
        println!("PartitionTable: read @{offset:#08x}");

        let mut buf = vec![0xFFu8; TABLE_LENGTH];
        read_aligned(hal, offset, &mut buf).map_err(|_| Error::FlashError)?;
        Self::decode_with(&buf, options)
    }

    /// Encodes the table and writes it to the default location `PARTITION_TABLE_OFFSET`.
    pub fn write_to<T: NorFlash>(&self, hal: &mut T) -> Result<(), Error> {
        self.write_to_offset(hal, PARTITION_TABLE_OFFSET)
    }

    /// Encodes the table and replaces the whole table region at `offset`.
    ///
    /// The table is encoded before the flash is touched, so an encoding error leaves the flash
    /// as it was. The erase covers every sector the region touches, `offset` therefore has to be
    /// aligned to the erase size.
    pub fn write_to_offset<T: NorFlash>(&self, hal: &mut T, offset: u32) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        trace!("write_to_offset: @{:#08x}", offset);

        let data = self.encode()?;

        if !(offset as usize).is_multiple_of(T::ERASE_SIZE) {
            return Err(Error::InvalidTableOffset(offset));
        }

        let erase_end = offset
            .checked_add(T::align_erase_ceil(TABLE_LENGTH) as u32)
            .ok_or(Error::InvalidTableOffset(offset))?;

        #[cfg(feature = "debug-logs")]
        println!(
            "PartitionTable: erase {offset:#08x}..{erase_end:#08x}, write {} partitions",
            self.len()
        );

        hal.erase(offset, erase_end).map_err(|_| Error::FlashError)?;
        write_aligned(hal, offset, &data).map_err(|_| Error::FlashError)
    }
}
