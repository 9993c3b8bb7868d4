/// Identifier of a device slot.
///
/// Every identifier maps to a fixed slot index. Indices at or above the capacity of a
/// directory are rejected by it.
pub trait DeviceId: Copy + Eq {
    fn index(self) -> usize;

    /// Inverse of [`DeviceId::index`], `None` if no identifier maps to `index`.
    fn from_index(index: usize) -> Option<Self>;
}

impl DeviceId for u8 {
    fn index(self) -> usize {
        usize::from(self)
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::try_from(index).ok()
    }
}

impl DeviceId for u16 {
    fn index(self) -> usize {
        usize::from(self)
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::try_from(index).ok()
    }
}

impl DeviceId for usize {
    fn index(self) -> usize {
        self
    }

    fn from_index(index: usize) -> Option<Self> {
        Some(index)
    }
}

/// Raw value without a matching identifier.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidId(pub u8);

/// Declares an enum of device identifiers.
///
/// The variants are numbered from 0 in declaration order. The enum gets a `COUNT` constant to
/// size a directory with, an `ALL` list and a checked `TryFrom<u8>` conversion.
///
/// ```
/// device_registry::device_ids! {
///     pub enum Peer {
///         Basestation,
///         Maincontroller,
///         Motorcontroller,
///     }
/// }
///
/// assert_eq!(Peer::COUNT, 3);
/// assert_eq!(Peer::try_from(1), Ok(Peer::Maincontroller));
/// assert!(Peer::try_from(3).is_err());
/// ```
#[macro_export]
macro_rules! device_ids {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        #[repr(u8)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const COUNT: usize = Self::ALL.len();
        }

        impl $crate::DeviceId for $name {
            fn index(self) -> usize {
                self as usize
            }

            fn from_index(index: usize) -> ::core::option::Option<Self> {
                Self::ALL.get(index).copied()
            }
        }

        impl ::core::convert::TryFrom<u8> for $name {
            type Error = $crate::InvalidId;

            fn try_from(raw: u8) -> ::core::result::Result<Self, Self::Error> {
                <Self as $crate::DeviceId>::from_index(usize::from(raw)).ok_or($crate::InvalidId(raw))
            }
        }
    };
}
