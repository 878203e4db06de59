use alloc::vec;
#[cfg(feature = "defmt")]
use defmt::trace;
use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};

/// Alignment helpers derived from the flash driver's read, write and erase granularity.
pub trait AlignedOps: ReadNorFlash {
    fn align_read(size: usize) -> usize {
        align_ceil(size, Self::READ_SIZE)
    }

    fn align_read_floor(offset: usize) -> usize {
        align_floor(offset, Self::READ_SIZE)
    }
}

impl<T: ReadNorFlash> AlignedOps for T {}

pub trait AlignedWriteOps: NorFlash {
    fn align_write_ceil(size: usize) -> usize {
        align_ceil(size, Self::WRITE_SIZE)
    }

    fn align_write_floor(size: usize) -> usize {
        align_floor(size, Self::WRITE_SIZE)
    }

    fn align_erase_ceil(size: usize) -> usize {
        align_ceil(size, Self::ERASE_SIZE)
    }
}

impl<T: NorFlash> AlignedWriteOps for T {}

#[inline(always)]
const fn align_ceil(size: usize, alignment: usize) -> usize {
    if alignment.is_power_of_two() {
        size.saturating_add(alignment - 1) & !(alignment - 1)
    } else {
        size.saturating_add(alignment - 1) / alignment * alignment
    }
}

#[inline(always)]
const fn align_floor(size: usize, alignment: usize) -> usize {
    if alignment.is_power_of_two() {
        size & !(alignment - 1)
    } else {
        size / alignment * alignment
    }
}

/// Reads `bytes.len()` bytes at an arbitrary `offset`, widening the access to the read alignment
/// of the driver where necessary.
pub(crate) fn read_aligned<T: ReadNorFlash>(
    hal: &mut T,
    offset: u32,
    bytes: &mut [u8],
) -> Result<(), T::Error> {
    #[cfg(feature = "defmt")]
    trace!("read_aligned @{:#08x}: [{}]", offset, bytes.len());

    let start = T::align_read_floor(offset as usize);
    let head = offset as usize - start;
    let len = T::align_read(head + bytes.len());

    if head == 0 && len == bytes.len() {
        return hal.read(offset, bytes);
    }

    let mut buf = vec![0xFFu8; len];
    hal.read(start as u32, &mut buf)?;
    bytes.copy_from_slice(&buf[head..head + bytes.len()]);
    Ok(())
}

/// Writes `bytes` to an already erased region starting at the write aligned `offset`.
#[inline(always)]
pub(crate) fn write_aligned<T: NorFlash>(
    hal: &mut T,
    offset: u32,
    bytes: &[u8],
) -> Result<(), T::Error> {
    #[cfg(feature = "defmt")]
    trace!("write_aligned @{:#08x}: [{}]", offset, bytes.len());

    if bytes.len().is_multiple_of(T::WRITE_SIZE) {
        hal.write(offset, bytes)
    } else {
        let pivot = T::align_write_floor(bytes.len());
        let header = &bytes[..pivot];
        let trailer = &bytes[pivot..];
        if !header.is_empty() {
            hal.write(offset, header)?;
        }

        // no need to write the trailer if remaining data is all ones - this the default state of the flash
        if trailer.iter().any(|&e| e != 0xFF) {
            let mut buf = vec![0xFFu8; T::align_write_ceil(trailer.len())];
            buf[..trailer.len()].copy_from_slice(trailer);
            hal.write(offset + (pivot as u32), &buf)?
        }

        Ok(())
    }
}
