use crate::{
    error::{Error, Result},
    table::{name, Name, Table},
    KeyValueStore, Session,
};

/// Store kept in RAM. Holds up to `ENTRIES` values of at most `VALUE_SIZE` bytes each.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore<const ENTRIES: usize, const VALUE_SIZE: usize> {
    table: Table<ENTRIES, VALUE_SIZE>,
}

impl<const ENTRIES: usize, const VALUE_SIZE: usize> MemoryStore<ENTRIES, VALUE_SIZE> {
    pub const fn new() -> Self {
        Self {
            table: Table::new(),
        }
    }

    /// Number of stored values over all namespaces.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const ENTRIES: usize, const VALUE_SIZE: usize> KeyValueStore
    for MemoryStore<ENTRIES, VALUE_SIZE>
{
    type Session<'s> = MemorySession<'s, ENTRIES, VALUE_SIZE>;

    fn begin(&mut self, namespace: &str, read_only: bool) -> Result<Self::Session<'_>> {
        Ok(MemorySession {
            table: &mut self.table,
            namespace: name(namespace)?,
            read_only,
        })
    }
}

pub struct MemorySession<'s, const ENTRIES: usize, const VALUE_SIZE: usize> {
    table: &'s mut Table<ENTRIES, VALUE_SIZE>,
    namespace: Name,
    read_only: bool,
}

impl<const ENTRIES: usize, const VALUE_SIZE: usize> MemorySession<'_, ENTRIES, VALUE_SIZE> {
    fn writable(&self) -> Result<()> {
        if self.read_only {
            Err(Error::ReadOnly)
        } else {
            Ok(())
        }
    }
}

impl<const ENTRIES: usize, const VALUE_SIZE: usize> Session
    for MemorySession<'_, ENTRIES, VALUE_SIZE>
{
    fn contains_key(&self, key: &str) -> bool {
        self.table.get(&self.namespace, key).is_some()
    }

    fn bytes_len(&self, key: &str) -> Option<usize> {
        self.table.get(&self.namespace, key).map(<[u8]>::len)
    }

    fn read_bytes(&self, key: &str, buf: &mut [u8]) -> Result<Option<usize>> {
        read_into(self.table.get(&self.namespace, key), buf)
    }

    fn write_bytes(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        self.writable()?;
        self.table.insert(&self.namespace, key, bytes)
    }

    fn remove_key(&mut self, key: &str) -> Result<bool> {
        self.writable()?;
        Ok(self.table.remove(&self.namespace, key))
    }

    fn clear(&mut self) -> Result<()> {
        self.writable()?;
        self.table.clear_namespace(&self.namespace);
        Ok(())
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

pub(crate) fn read_into(value: Option<&[u8]>, buf: &mut [u8]) -> Result<Option<usize>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let Some(dst) = buf.get_mut(..value.len()) else {
        return Err(Error::BufferTooSmall);
    };
    dst.copy_from_slice(value);
    Ok(Some(value.len()))
}
