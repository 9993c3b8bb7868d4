//! Layout of the persisted registry: the addresses of all slots concatenated in identifier
//! order, 6 bytes each. Empty slots are stored as the broadcast address. There is no header
//! or checksum.

use crate::mac::{MacAddress, MAC_LEN};

pub(crate) type Image<const N: usize> = [[u8; MAC_LEN]; N];

pub(crate) fn encode<const N: usize>(slots: &[Option<MacAddress>; N]) -> Image<N> {
    slots.map(|slot| slot.unwrap_or(MacAddress::BROADCAST).to_bytes())
}

pub(crate) fn decode<const N: usize>(image: &Image<N>) -> [Option<MacAddress>; N] {
    image.map(|bytes| {
        let mac = MacAddress::new(bytes);
        (!mac.is_broadcast()).then_some(mac)
    })
}
