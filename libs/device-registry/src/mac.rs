use core::{fmt, str::FromStr};

pub const MAC_LEN: usize = 6;

/// 6 byte hardware address of a device.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct MacAddress([u8; MAC_LEN]);

impl MacAddress {
    /// Link layer broadcast address. Also marks an empty slot in the stored registry, so it is
    /// never accepted as the address of a device.
    pub const BROADCAST: Self = Self([0xFF; MAC_LEN]);

    pub const fn new(bytes: [u8; MAC_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; MAC_LEN] {
        self.0
    }

    pub const fn as_bytes(&self) -> &[u8; MAC_LEN] {
        &self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    pub fn is_locally_administered(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    pub fn is_universally_administered(&self) -> bool {
        !self.is_locally_administered()
    }
}

impl From<[u8; MAC_LEN]> for MacAddress {
    fn from(bytes: [u8; MAC_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<MacAddress> for [u8; MAC_LEN] {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

impl TryFrom<&[u8]> for MacAddress {
    type Error = ParseMacError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; MAC_LEN]>::try_from(bytes)
            .map(Self)
            .map_err(|_| ParseMacError::Length)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for MacAddress {
    fn format(&self, f: defmt::Formatter) {
        let [a, b, c, d, e, g] = self.0;
        defmt::write!(
            f,
            "{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}",
            a,
            b,
            c,
            d,
            e,
            g
        );
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseMacError {
    /// Not exactly 6 octets.
    Length,
    /// An octet is not two hex digits.
    Digit,
}

impl FromStr for MacAddress {
    type Err = ParseMacError;

    /// Parses `AA:BB:CC:DD:EE:FF`, `-` is accepted as separator as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let separator = match s.as_bytes().get(2) {
            Some(b'-') => '-',
            _ => ':',
        };
        let mut bytes = [0; MAC_LEN];
        let mut octets = s.split(separator);
        for byte in &mut bytes {
            let octet = octets.next().ok_or(ParseMacError::Length)?;
            if octet.len() != 2 || !octet.bytes().all(|c| c.is_ascii_hexdigit()) {
                return Err(ParseMacError::Digit);
            }
            *byte = u8::from_str_radix(octet, 16).map_err(|_| ParseMacError::Digit)?;
        }
        if octets.next().is_some() {
            return Err(ParseMacError::Length);
        }
        Ok(Self(bytes))
    }
}
