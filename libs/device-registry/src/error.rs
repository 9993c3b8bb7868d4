/// Reasons a directory operation was rejected. A rejected operation never changes the
/// directory.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The identifier maps to an index outside of the directory.
    IdOutOfRange,
    /// The identifier belongs to the local device.
    SelfId,
    /// The address belongs to the local device.
    SelfAddress,
    /// The broadcast address can't be stored, it marks empty slots.
    BroadcastAddress,
    /// The slot already holds a device. It has to be removed first.
    Occupied,
    /// The slot holds no device.
    NotRegistered,
    /// Another slot already holds the address.
    DuplicateAddress,
}

pub type Result<T> = core::result::Result<T, Error>;
