use embedded_storage::nor_flash::{NorFlashError, NorFlashErrorKind};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The backend can't open sessions, e.g. a build without flash.
    Unavailable,
    /// Namespace or key is empty or longer than [`crate::MAX_NAME_LEN`].
    InvalidName,
    /// Write access through a session opened read only.
    ReadOnly,
    /// No free entry left in the table.
    Full,
    ValueTooLarge,
    /// The stored value doesn't fit into the read buffer.
    BufferTooSmall,
    Encoding,
    Flash(FlashError),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    NotAligned,
    OutOfBounds,
    Other,
}

impl From<NorFlashErrorKind> for FlashError {
    fn from(kind: NorFlashErrorKind) -> Self {
        match kind {
            NorFlashErrorKind::NotAligned => Self::NotAligned,
            NorFlashErrorKind::OutOfBounds => Self::OutOfBounds,
            _ => Self::Other,
        }
    }
}

pub(crate) fn flash_error<E: NorFlashError>(err: E) -> Error {
    Error::Flash(err.kind().into())
}

pub type Result<T> = core::result::Result<T, Error>;
