#![cfg_attr(any(not(test), target_arch = "arm"), no_std)]

//! Namespaced byte blob storage that survives power loss.
//!
//! Access always goes through a [`Session`] opened on one namespace with
//! [`KeyValueStore::begin`]. A session mutably borrows its store, so only one
//! can be open at a time and it is released when [`Session::end`] is called or
//! it goes out of scope.
//!
//! Backends:
//! - [`MemoryStore`]: RAM only, for hosts and tests.
//! - [`NorFlashStore`]: RAM mirror committed to a NOR flash region.
//! - [`NoStore`]: refuses every session, for builds without persistence.

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod error;
pub mod flash;
pub mod memory;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod table;

pub use error::{Error, FlashError, Result};
pub use flash::{FlashSession, NorFlashStore};
pub use memory::{MemorySession, MemoryStore};

/// Longest namespace or key in bytes.
pub const MAX_NAME_LEN: usize = 15;

pub trait KeyValueStore {
    type Session<'s>: Session
    where
        Self: 's;

    /// Opens a session on `namespace`.
    ///
    /// # Errors
    ///
    /// Fails if the namespace name is invalid or the backend is unavailable.
    fn begin(&mut self, namespace: &str, read_only: bool) -> Result<Self::Session<'_>>;
}

pub trait Session {
    fn contains_key(&self, key: &str) -> bool;

    /// Length of the stored value, `None` if the key doesn't exist.
    fn bytes_len(&self, key: &str) -> Option<usize>;

    /// Copies the value into `buf` and returns its length, `None` if the key doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] if the value is longer than `buf`.
    fn read_bytes(&self, key: &str, buf: &mut [u8]) -> Result<Option<usize>>;

    /// Stores `bytes` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Fails for read only sessions, invalid keys and when the value doesn't fit. The previous
    /// value is kept in that case.
    fn write_bytes(&mut self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Removes `key`. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Fails for read only sessions.
    fn remove_key(&mut self, key: &str) -> Result<bool>;

    /// Removes every key of the namespace.
    ///
    /// # Errors
    ///
    /// Fails for read only sessions.
    fn clear(&mut self) -> Result<()>;

    /// Releases the session and commits pending changes to the backend.
    ///
    /// # Errors
    ///
    /// Fails if the backend couldn't persist the changes.
    fn end(self) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &mut T {
    type Session<'s> = T::Session<'s>
    where
        Self: 's;

    fn begin(&mut self, namespace: &str, read_only: bool) -> Result<Self::Session<'_>> {
        (**self).begin(namespace, read_only)
    }
}

/// Store for builds without persistent memory. Every session fails with [`Error::Unavailable`].
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct NoStore;

/// Session type of [`NoStore`], can't be constructed.
pub enum NoSession {}

impl KeyValueStore for NoStore {
    type Session<'s> = NoSession;

    fn begin(&mut self, _namespace: &str, _read_only: bool) -> Result<NoSession> {
        Err(Error::Unavailable)
    }
}

impl Session for NoSession {
    fn contains_key(&self, _key: &str) -> bool {
        match *self {}
    }

    fn bytes_len(&self, _key: &str) -> Option<usize> {
        match *self {}
    }

    fn read_bytes(&self, _key: &str, _buf: &mut [u8]) -> Result<Option<usize>> {
        match *self {}
    }

    fn write_bytes(&mut self, _key: &str, _bytes: &[u8]) -> Result<()> {
        match *self {}
    }

    fn remove_key(&mut self, _key: &str) -> Result<bool> {
        match *self {}
    }

    fn clear(&mut self) -> Result<()> {
        match *self {}
    }

    fn end(self) -> Result<()> {
        match self {}
    }
}
