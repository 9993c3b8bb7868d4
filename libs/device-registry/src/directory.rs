use kv_store::{KeyValueStore, Session};

use crate::{
    error::{Error, Result},
    image,
    mac::{MacAddress, MAC_LEN},
    DeviceId,
};

/// Where the registry is stored.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RegistryConfig {
    pub namespace: &'static str,
    pub key: &'static str,
}

impl RegistryConfig {
    pub const DEFAULT_NAMESPACE: &'static str = "dReg";
    pub const DEFAULT_KEY: &'static str = "val";

    pub const fn new() -> Self {
        Self {
            namespace: Self::DEFAULT_NAMESPACE,
            key: Self::DEFAULT_KEY,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier and address of the local device.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SelfIdentity<I> {
    pub id: I,
    pub mac: MacAddress,
}

/// Fixed size table of `N` peer devices and their hardware addresses.
///
/// Every slot is either empty or holds the address of one device. No address is held by two
/// slots, and neither the broadcast address nor the address of the local device can be
/// stored. The local device itself, if given, lives outside of the slots: it is always
/// present and can't be changed.
///
/// The slots are loaded from `store` on construction and written back with
/// [`DeviceDirectory::save_to_flash`]. Store failures are logged and otherwise ignored.
pub struct DeviceDirectory<I, S, const N: usize> {
    slots: [Option<MacAddress>; N],
    identity: Option<SelfIdentity<I>>,
    store: S,
    config: RegistryConfig,
}

impl<I, S, const N: usize> DeviceDirectory<I, S, N>
where
    I: DeviceId,
    S: KeyValueStore,
{
    /// Size of the persisted registry in bytes.
    pub const BLOB_LEN: usize = N * MAC_LEN;

    pub fn new(store: S) -> Self {
        Self::with_config(store, RegistryConfig::default(), None)
    }

    /// Creates a directory of the local device `id` with address `mac`.
    pub fn with_identity(store: S, id: I, mac: MacAddress) -> Self {
        Self::with_config(
            store,
            RegistryConfig::default(),
            Some(SelfIdentity { id, mac }),
        )
    }

    pub fn with_config(
        store: S,
        config: RegistryConfig,
        identity: Option<SelfIdentity<I>>,
    ) -> Self {
        let mut directory = Self {
            slots: [None; N],
            identity,
            store,
            config,
        };
        directory.read_from_flash();
        directory
    }

    /// Registers a device in an empty slot.
    ///
    /// # Errors
    ///
    /// Fails if `id` is out of range or the local device, if `mac` is the local, the broadcast
    /// or another device's address, or if the slot is already in use.
    pub fn add_device(&mut self, id: I, mac: MacAddress) -> Result<()> {
        let index = self.peer_index(id)?;
        self.check_address(index, mac)?;
        if self.slots[index].is_some() {
            warn!("device already exists: {}", index);
            return Err(Error::Occupied);
        }

        self.slots[index] = Some(mac);
        debug!("added device {}: {}", index, mac);
        Ok(())
    }

    /// Empties the slot of a registered device.
    ///
    /// # Errors
    ///
    /// Fails if `id` is out of range, the local device or not registered.
    pub fn remove_device(&mut self, id: I) -> Result<()> {
        self.write_slot(id, None)
    }

    /// Address of a device. The local device always resolves to its own address.
    pub fn get_device_mac(&self, id: I) -> Option<MacAddress> {
        let index = self.index(id).ok()?;
        if let Some(identity) = self.identity.filter(|identity| identity.id == id) {
            debug!("returning self mac for device: {}", index);
            return Some(identity.mac);
        }
        let mac = self.slots[index];
        if mac.is_none() {
            debug!("device not registered: {}", index);
        }
        mac
    }

    /// Replaces the address of a registered device.
    ///
    /// # Errors
    ///
    /// Fails if `id` is out of range, the local device or not registered, or if `mac` is the
    /// local, the broadcast or another device's address.
    pub fn update_device_mac(&mut self, id: I, mac: MacAddress) -> Result<()> {
        self.write_slot(id, Some(mac))
    }

    /// Identifier of the device using `mac`.
    pub fn find_device(&self, mac: MacAddress) -> Option<I> {
        if let Some(identity) = self.identity.filter(|identity| identity.mac == mac) {
            return Some(identity.id);
        }
        let index = self.slots.iter().position(|slot| *slot == Some(mac))?;
        I::from_index(index)
    }

    /// All registered peers in identifier order. The local device is not included.
    pub fn registered(&self) -> impl Iterator<Item = (I, MacAddress)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| Some((I::from_index(index)?, (*slot)?)))
    }

    /// Number of registered peers.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Empties all slots. The stored registry is kept until the next save.
    pub fn clear(&mut self) {
        self.slots = [None; N];
    }

    pub fn self_identity(&self) -> Option<SelfIdentity<I>> {
        self.identity
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Writes all slots to the store, replacing the stored registry.
    pub fn save_to_flash(&mut self) {
        let image = image::encode(&self.slots);
        match self.write_blob(image.as_flattened()) {
            Ok(()) => info!("saved {} devices", self.len()),
            Err(err) => error!("couldn't save device registry: {:?}", err),
        }
    }

    /// Removes the stored registry. The slots in memory are not touched.
    pub fn delete_flash(&mut self) {
        match self.remove_blob() {
            Ok(true) => info!("deleted stored device registry"),
            Ok(false) => debug!("no stored device registry to delete"),
            Err(err) => error!("couldn't delete device registry: {:?}", err),
        }
    }

    /// Replaces the slots with the stored registry. Nothing changes if there is none or it
    /// doesn't have the size of this directory. A stored entry for the local device is dropped.
    pub fn read_from_flash(&mut self) {
        match self.read_blob() {
            Ok(Some(mut slots)) => {
                if let Some(index) = self.self_index() {
                    if slots[index].take().is_some() {
                        warn!("dropping stored mac of self device: {}", index);
                    }
                }
                self.slots = slots;
                info!("loaded {} devices", self.len());
            }
            Ok(None) => debug!("no stored device registry"),
            Err(err) => warn!("couldn't read device registry: {:?}", err),
        }
    }

    fn index(&self, id: I) -> Result<usize> {
        let index = id.index();
        if index >= N {
            warn!("device id out of bounds: {}", index);
            return Err(Error::IdOutOfRange);
        }
        Ok(index)
    }

    /// Slot of the local device, if it has one.
    fn self_index(&self) -> Option<usize> {
        let index = self.identity?.id.index();
        (index < N).then_some(index)
    }

    /// Index of a slot that may be changed.
    fn peer_index(&self, id: I) -> Result<usize> {
        let index = self.index(id)?;
        if self.identity.is_some_and(|identity| identity.id == id) {
            warn!("cannot change self device: {}", index);
            return Err(Error::SelfId);
        }
        Ok(index)
    }

    /// Checks that `mac` may be stored in slot `index`.
    fn check_address(&self, index: usize, mac: MacAddress) -> Result<()> {
        if self.identity.is_some_and(|identity| identity.mac == mac) {
            warn!("cannot set self mac for device: {}", index);
            return Err(Error::SelfAddress);
        }
        if mac.is_broadcast() {
            warn!("cannot set broadcast mac for device: {}", index);
            return Err(Error::BroadcastAddress);
        }
        let duplicate = self
            .slots
            .iter()
            .enumerate()
            .any(|(other, slot)| other != index && *slot == Some(mac));
        if duplicate {
            warn!("mac {} is already used by another device", mac);
            return Err(Error::DuplicateAddress);
        }
        Ok(())
    }

    /// Overwrites an occupied slot. Writing `None` removes the device.
    fn write_slot(&mut self, id: I, mac: Option<MacAddress>) -> Result<()> {
        let index = self.peer_index(id)?;
        if let Some(mac) = mac {
            self.check_address(index, mac)?;
        }
        if self.slots[index].is_none() {
            warn!("device not registered: {}", index);
            return Err(Error::NotRegistered);
        }
        self.slots[index] = mac;
        Ok(())
    }

    fn write_blob(&mut self, blob: &[u8]) -> kv_store::Result<()> {
        let RegistryConfig { namespace, key } = self.config;
        let mut session = self.store.begin(namespace, false)?;
        session.write_bytes(key, blob)?;
        session.end()
    }

    fn remove_blob(&mut self) -> kv_store::Result<bool> {
        let RegistryConfig { namespace, key } = self.config;
        let mut session = self.store.begin(namespace, false)?;
        let removed = session.remove_key(key)?;
        session.end()?;
        Ok(removed)
    }

    fn read_blob(&mut self) -> kv_store::Result<Option<[Option<MacAddress>; N]>> {
        let RegistryConfig { namespace, key } = self.config;
        let session = self.store.begin(namespace, true)?;
        match session.bytes_len(key) {
            None => return session.end().map(|()| None),
            Some(len) if len != Self::BLOB_LEN => {
                warn!(
                    "stored device registry has {} bytes, expected {}",
                    len,
                    Self::BLOB_LEN
                );
                return session.end().map(|()| None);
            }
            Some(_) => {}
        }

        let mut image: image::Image<N> = [[0; MAC_LEN]; N];
        let read = session.read_bytes(key, image.as_flattened_mut())?;
        session.end()?;
        Ok(read
            .filter(|&len| len == Self::BLOB_LEN)
            .map(|_| image::decode(&image)))
    }
}
