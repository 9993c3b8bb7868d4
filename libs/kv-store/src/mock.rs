//! NOR flash simulated in RAM.

use embedded_storage::nor_flash::{ErrorType, NorFlash, NorFlashErrorKind, ReadNorFlash};

/// `SIZE` bytes of NOR flash with 4 KiB sectors. Like real NOR flash, writes can only clear
/// bits, so a region has to be erased before it is written again.
pub struct RamFlash<const SIZE: usize> {
    data: [u8; SIZE],
    erases: usize,
    fail_writes: bool,
}

impl<const SIZE: usize> Default for RamFlash<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SIZE: usize> RamFlash<SIZE> {
    pub const fn new() -> Self {
        Self {
            data: [0xFF; SIZE],
            erases: 0,
            fail_writes: false,
        }
    }

    /// Makes every following write fail. Erases still succeed, so a commit in that state
    /// leaves the region blank.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of erase operations so far.
    pub fn erase_count(&self) -> usize {
        self.erases
    }

    /// Flips bits of the byte at `offset`.
    pub fn corrupt(&mut self, offset: usize) {
        self.data[offset] ^= 0x5A;
    }

    fn check(offset: usize, len: usize, align: usize) -> Result<(), NorFlashErrorKind> {
        if offset % align != 0 || len % align != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        if offset + len > SIZE {
            return Err(NorFlashErrorKind::OutOfBounds);
        }
        Ok(())
    }
}

impl<const SIZE: usize> ErrorType for RamFlash<SIZE> {
    type Error = NorFlashErrorKind;
}

impl<const SIZE: usize> ReadNorFlash for RamFlash<SIZE> {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let offset = offset as usize;
        Self::check(offset, bytes.len(), Self::READ_SIZE)?;
        bytes.copy_from_slice(&self.data[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        SIZE
    }
}

impl<const SIZE: usize> NorFlash for RamFlash<SIZE> {
    const WRITE_SIZE: usize = 4;
    const ERASE_SIZE: usize = 4096;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        let (from, to) = (from as usize, to as usize);
        if to < from {
            return Err(NorFlashErrorKind::OutOfBounds);
        }
        Self::check(from, to - from, Self::ERASE_SIZE)?;
        self.data[from..to].fill(0xFF);
        self.erases += 1;
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(NorFlashErrorKind::Other);
        }
        let offset = offset as usize;
        Self::check(offset, bytes.len(), Self::WRITE_SIZE)?;
        for (cell, byte) in self.data[offset..].iter_mut().zip(bytes) {
            *cell &= byte;
        }
        Ok(())
    }
}
