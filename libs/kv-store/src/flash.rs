use crc::{Crc, CRC_32_ISO_HDLC};
use embedded_storage::nor_flash::NorFlash;

use crate::{
    error::{flash_error, Error, FlashError, Result},
    memory::read_into,
    table::{name, Name, Table},
    KeyValueStore, Session,
};

const CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Store mirrored in RAM and committed to a `REGION_SIZE` byte region of NOR flash.
///
/// The region holds the postcard encoded table of all entries followed by the CRC-32 of that
/// encoding. Every commit erases and rewrites the whole region, so `REGION_SIZE` has to be a
/// multiple of the flash erase size and large enough for the encoded table.
pub struct NorFlashStore<F, const ENTRIES: usize, const VALUE_SIZE: usize, const REGION_SIZE: usize>
{
    flash: F,
    offset: u32,
    table: Table<ENTRIES, VALUE_SIZE>,
    /// The region may not hold the mirror after a failed commit.
    stale: bool,
}

impl<F, const ENTRIES: usize, const VALUE_SIZE: usize, const REGION_SIZE: usize>
    NorFlashStore<F, ENTRIES, VALUE_SIZE, REGION_SIZE>
where
    F: NorFlash,
{
    /// Loads the store from the region starting at `offset`. A missing or corrupted record
    /// results in an empty store.
    ///
    /// # Errors
    ///
    /// This function will return an error if the region is not erase aligned or exceeds the
    /// flash capacity.
    pub fn mount(mut flash: F, offset: u32) -> Result<Self> {
        if offset as usize % F::ERASE_SIZE != 0 || REGION_SIZE % F::ERASE_SIZE != 0 {
            error!("store region is not aligned to the erase size");
            return Err(Error::Flash(FlashError::NotAligned));
        }
        if offset as usize + REGION_SIZE > flash.capacity() {
            error!("store region exceeds the flash capacity");
            return Err(Error::Flash(FlashError::OutOfBounds));
        }

        let table = Self::load(&mut flash, offset).unwrap_or_default();
        info!("mounted store with {} entries", table.len());
        Ok(Self {
            flash,
            offset,
            table,
            stale: false,
        })
    }

    /// Gives back the flash peripheral. Uncommitted changes don't exist at this point as
    /// every session commits when it is released.
    pub fn release(self) -> F {
        self.flash
    }

    fn load(flash: &mut F, offset: u32) -> Option<Table<ENTRIES, VALUE_SIZE>> {
        let mut buf = [0; REGION_SIZE];
        if flash.read(offset, &mut buf).is_err() {
            error!("Couldn't read from flash! Starting with an empty store");
            return None;
        }

        let Ok((table, rest)) = postcard::take_from_bytes::<Table<ENTRIES, VALUE_SIZE>>(&buf)
        else {
            warn!("No store record found in flash, starting with an empty store");
            return None;
        };
        let Ok((checksum, _)) = postcard::take_from_bytes::<u32>(rest) else {
            warn!("Store record has no checksum, starting with an empty store");
            return None;
        };

        let real_checksum = CRC.checksum(&buf[..REGION_SIZE - rest.len()]);
        debug!("comparing 0x{:x} with 0x{:x}", checksum, real_checksum);
        if checksum == real_checksum {
            Some(table)
        } else {
            error!("Loaded store record is not valid! Starting with an empty store");
            None
        }
    }

    fn commit(&mut self) -> Result<()> {
        // erased flash reads as 0xFF, keep the tail of the region in that state
        let mut buf = [0xFF; REGION_SIZE];
        let Ok(table_bytes) = postcard::to_slice(&self.table, &mut buf) else {
            error!("unable to encode store table!");
            return Err(Error::Encoding);
        };
        let len = table_bytes.len();
        let checksum = CRC.checksum(table_bytes);
        if postcard::to_slice(&checksum, &mut buf[len..]).is_err() {
            error!("no space left for the store checksum!");
            return Err(Error::Encoding);
        }

        let end = self.offset + REGION_SIZE as u32;
        self.stale = true;
        self.flash.erase(self.offset, end).map_err(flash_error)?;
        self.flash.write(self.offset, &buf).map_err(flash_error)?;
        self.stale = false;
        Ok(())
    }
}

impl<F, const ENTRIES: usize, const VALUE_SIZE: usize, const REGION_SIZE: usize> KeyValueStore
    for NorFlashStore<F, ENTRIES, VALUE_SIZE, REGION_SIZE>
where
    F: NorFlash,
{
    type Session<'s> = FlashSession<'s, F, ENTRIES, VALUE_SIZE, REGION_SIZE>
    where
        Self: 's;

    fn begin(&mut self, namespace: &str, read_only: bool) -> Result<Self::Session<'_>> {
        Ok(FlashSession {
            namespace: name(namespace)?,
            store: self,
            read_only,
            backup: None,
            dirty: false,
            ended: false,
        })
    }
}

/// Session on a [`NorFlashStore`]. Changes are applied to the RAM mirror right away and
/// written to flash once the session ends. Dropping a session with pending changes commits
/// them as well, failures are only logged in that case.
///
/// If the commit fails, the mirror is rolled back to its state before the session's first
/// change. A writable session on a store whose last commit failed rewrites the region even
/// without changes of its own.
pub struct FlashSession<
    's,
    F: NorFlash,
    const ENTRIES: usize,
    const VALUE_SIZE: usize,
    const REGION_SIZE: usize,
> {
    store: &'s mut NorFlashStore<F, ENTRIES, VALUE_SIZE, REGION_SIZE>,
    namespace: Name,
    read_only: bool,
    backup: Option<Table<ENTRIES, VALUE_SIZE>>,
    dirty: bool,
    ended: bool,
}

impl<F, const ENTRIES: usize, const VALUE_SIZE: usize, const REGION_SIZE: usize>
    FlashSession<'_, F, ENTRIES, VALUE_SIZE, REGION_SIZE>
where
    F: NorFlash,
{
    /// Checks write access and saves the mirror before the first change.
    fn prepare_change(&mut self) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly);
        }
        if self.backup.is_none() {
            self.backup = Some(self.store.table.clone());
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty && (self.read_only || !self.store.stale) {
            return Ok(());
        }
        match self.store.commit() {
            Ok(()) => {
                self.dirty = false;
                self.backup = None;
                Ok(())
            }
            Err(err) => {
                if let Some(backup) = self.backup.take() {
                    warn!("rolling back store session");
                    self.store.table = backup;
                }
                self.dirty = false;
                Err(err)
            }
        }
    }
}

impl<F, const ENTRIES: usize, const VALUE_SIZE: usize, const REGION_SIZE: usize> Session
    for FlashSession<'_, F, ENTRIES, VALUE_SIZE, REGION_SIZE>
where
    F: NorFlash,
{
    fn contains_key(&self, key: &str) -> bool {
        self.store.table.get(&self.namespace, key).is_some()
    }

    fn bytes_len(&self, key: &str) -> Option<usize> {
        self.store.table.get(&self.namespace, key).map(<[u8]>::len)
    }

    fn read_bytes(&self, key: &str, buf: &mut [u8]) -> Result<Option<usize>> {
        read_into(self.store.table.get(&self.namespace, key), buf)
    }

    fn write_bytes(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        self.prepare_change()?;
        self.store.table.insert(&self.namespace, key, bytes)?;
        self.dirty = true;
        Ok(())
    }

    fn remove_key(&mut self, key: &str) -> Result<bool> {
        self.prepare_change()?;
        let removed = self.store.table.remove(&self.namespace, key);
        self.dirty |= removed;
        Ok(removed)
    }

    fn clear(&mut self) -> Result<()> {
        self.prepare_change()?;
        self.dirty |= self.store.table.clear_namespace(&self.namespace) > 0;
        Ok(())
    }

    fn end(mut self) -> Result<()> {
        self.ended = true;
        self.flush()
    }
}

impl<F, const ENTRIES: usize, const VALUE_SIZE: usize, const REGION_SIZE: usize> Drop
    for FlashSession<'_, F, ENTRIES, VALUE_SIZE, REGION_SIZE>
where
    F: NorFlash,
{
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        if let Err(err) = self.flush() {
            error!("couldn't commit store session: {:?}", err);
        }
    }
}
