use device_registry::{device_ids, DeviceDirectory, Error, MacAddress, RegistryConfig, SelfIdentity};
use kv_store::{mock::RamFlash, KeyValueStore, MemoryStore, NoStore, NorFlashStore, Session};

device_ids! {
    enum Peer {
        TestDevice1,
        TestDevice2,
        TestDevice3,
        TestDevice4,
        TestDeviceSelf,
    }
}

type Store = MemoryStore<8, 64>;
type Directory<'s> = DeviceDirectory<Peer, &'s mut Store, { Peer::COUNT }>;
type FlashStore = NorFlashStore<RamFlash<16384>, 8, 64, 4096>;

const SELF_MAC: MacAddress = MacAddress::new([0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x00]);
const MAC_1: MacAddress = MacAddress::new([0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01]);
const MAC_2: MacAddress = MacAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
const MAC_3: MacAddress = MacAddress::new([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);

fn open(store: &mut Store) -> Directory<'_> {
    Directory::with_identity(store, Peer::TestDeviceSelf, SELF_MAC)
}

fn stored_len(store: &mut Store) -> Option<usize> {
    let session = store.begin("dReg", true).unwrap();
    session.bytes_len("val")
}

#[test]
fn store_initially_empty() {
    let mut store = Store::new();
    let directory = open(&mut store);
    assert!(directory.is_empty());
    drop(directory);
    assert_eq!(stored_len(&mut store), None);
}

#[test]
fn concrete_scenario() {
    let mut store = Store::new();
    let mut directory = open(&mut store);
    let id = Peer::TestDevice3;

    assert_eq!(directory.add_device(id, MAC_2), Ok(()));
    assert_eq!(directory.add_device(id, MAC_1), Err(Error::Occupied));
    assert_eq!(directory.get_device_mac(id), Some(MAC_2));
    assert_eq!(directory.update_device_mac(id, MAC_3), Ok(()));
    assert_eq!(directory.get_device_mac(id), Some(MAC_3));
    assert_eq!(directory.remove_device(id), Ok(()));
    assert_eq!(directory.get_device_mac(id), None);
    assert_eq!(directory.remove_device(id), Err(Error::NotRegistered));
}

#[test]
fn saved_registry_is_restored() {
    let mut store = Store::new();
    let mut directory = open(&mut store);
    directory.add_device(Peer::TestDevice2, MAC_1).unwrap();
    directory.add_device(Peer::TestDevice4, MAC_2).unwrap();
    directory.save_to_flash();
    drop(directory);
    assert_eq!(stored_len(&mut store), Some(30));

    let restored = open(&mut store);
    assert_eq!(restored.get_device_mac(Peer::TestDevice1), None);
    assert_eq!(restored.get_device_mac(Peer::TestDevice2), Some(MAC_1));
    assert_eq!(restored.get_device_mac(Peer::TestDevice3), None);
    assert_eq!(restored.get_device_mac(Peer::TestDevice4), Some(MAC_2));
    assert_eq!(restored.get_device_mac(Peer::TestDeviceSelf), Some(SELF_MAC));
}

#[test]
fn self_identity_is_not_persisted() {
    let mut store = Store::new();
    let mut directory = open(&mut store);
    directory.add_device(Peer::TestDevice1, MAC_1).unwrap();
    directory.save_to_flash();
    drop(directory);

    // the same table seen from a controller without a self identity
    let restored = Directory::new(&mut store);
    assert_eq!(restored.get_device_mac(Peer::TestDevice1), Some(MAC_1));
    assert_eq!(restored.get_device_mac(Peer::TestDeviceSelf), None);
    assert_eq!(restored.self_identity(), None);
}

#[test]
fn stored_slot_of_the_local_device_is_dropped() {
    let mut store = Store::new();
    let mut directory = Directory::new(&mut store);
    directory.add_device(Peer::TestDeviceSelf, MAC_3).unwrap();
    directory.add_device(Peer::TestDevice2, MAC_2).unwrap();
    directory.save_to_flash();
    drop(directory);

    let mut directory = open(&mut store);
    assert_eq!(directory.len(), 1);
    assert_eq!(
        directory.registered().collect::<Vec<_>>(),
        [(Peer::TestDevice2, MAC_2)]
    );
    assert_eq!(directory.get_device_mac(Peer::TestDeviceSelf), Some(SELF_MAC));
    assert_eq!(directory.find_device(MAC_3), None);
    assert_eq!(directory.add_device(Peer::TestDevice1, MAC_3), Ok(()));

    directory.read_from_flash();
    assert_eq!(directory.find_device(MAC_3), None);
}

#[test]
fn unsaved_changes_are_lost() {
    let mut store = Store::new();
    let mut directory = open(&mut store);
    directory.add_device(Peer::TestDevice1, MAC_1).unwrap();
    directory.save_to_flash();
    directory.remove_device(Peer::TestDevice1).unwrap();
    directory.add_device(Peer::TestDevice2, MAC_2).unwrap();
    drop(directory);

    let restored = open(&mut store);
    assert_eq!(restored.get_device_mac(Peer::TestDevice1), Some(MAC_1));
    assert_eq!(restored.get_device_mac(Peer::TestDevice2), None);
}

#[test]
fn delete_removes_stored_registry() {
    let mut store = Store::new();
    let mut directory = open(&mut store);
    directory.add_device(Peer::TestDevice2, MAC_1).unwrap();
    directory.save_to_flash();
    directory.delete_flash();
    // memory is untouched
    assert_eq!(directory.get_device_mac(Peer::TestDevice2), Some(MAC_1));
    drop(directory);

    assert_eq!(stored_len(&mut store), None);
    assert!(open(&mut store).is_empty());
}

#[test]
fn saving_an_empty_directory_keeps_the_key() {
    let mut store = Store::new();
    let mut directory = open(&mut store);
    directory.add_device(Peer::TestDevice1, MAC_1).unwrap();
    directory.save_to_flash();
    directory.clear();
    directory.save_to_flash();
    drop(directory);

    assert_eq!(stored_len(&mut store), Some(30));
    assert!(open(&mut store).is_empty());
}

#[test]
fn blob_of_wrong_size_is_ignored() {
    let mut store = Store::new();
    let mut session = store.begin("dReg", false).unwrap();
    session.write_bytes("val", &[0x01; 12]).unwrap();
    session.end().unwrap();

    let mut directory = open(&mut store);
    assert!(directory.is_empty());

    directory.add_device(Peer::TestDevice1, MAC_1).unwrap();
    directory.read_from_flash();
    assert_eq!(directory.get_device_mac(Peer::TestDevice1), Some(MAC_1));
}

#[test]
fn reload_discards_unsaved_changes() {
    let mut store = Store::new();
    let mut directory = open(&mut store);
    directory.add_device(Peer::TestDevice1, MAC_1).unwrap();
    directory.save_to_flash();
    directory.update_device_mac(Peer::TestDevice1, MAC_3).unwrap();

    directory.read_from_flash();
    assert_eq!(directory.get_device_mac(Peer::TestDevice1), Some(MAC_1));
}

#[test]
fn registries_in_different_namespaces_are_independent() {
    const OTHER: RegistryConfig = RegistryConfig {
        namespace: "dRegB",
        key: "val",
    };

    let mut store = Store::new();
    let mut first = open(&mut store);
    first.add_device(Peer::TestDevice1, MAC_1).unwrap();
    first.save_to_flash();
    drop(first);

    let identity = SelfIdentity {
        id: Peer::TestDevice1,
        mac: MAC_3,
    };
    let mut second = Directory::with_config(&mut store, OTHER, Some(identity));
    assert!(second.is_empty());
    second.add_device(Peer::TestDevice2, MAC_2).unwrap();
    second.save_to_flash();
    assert_eq!(second.config(), &OTHER);
    drop(second);

    let first = open(&mut store);
    assert_eq!(first.get_device_mac(Peer::TestDevice1), Some(MAC_1));
    assert_eq!(first.get_device_mac(Peer::TestDevice2), None);
}

#[test]
fn failed_save_is_swallowed() {
    // the only entry of the store is taken by another namespace
    let mut store = MemoryStore::<1, 64>::new();
    let mut session = store.begin("other", false).unwrap();
    session.write_bytes("val", &[1]).unwrap();
    session.end().unwrap();

    let mut directory = DeviceDirectory::<Peer, _, { Peer::COUNT }>::new(&mut store);
    directory.add_device(Peer::TestDevice1, MAC_1).unwrap();
    directory.save_to_flash();
    assert_eq!(directory.get_device_mac(Peer::TestDevice1), Some(MAC_1));
    drop(directory);

    assert!(!store.begin("dReg", true).unwrap().contains_key("val"));
}

#[test]
fn oversized_registry_is_not_saved() {
    // 5 slots need 30 bytes
    let mut store = MemoryStore::<4, 16>::new();
    let mut directory = DeviceDirectory::<Peer, _, { Peer::COUNT }>::new(&mut store);
    directory.add_device(Peer::TestDevice1, MAC_1).unwrap();
    directory.save_to_flash();
    drop(directory);
    assert!(store.is_empty());
}

#[test]
fn directory_without_store() {
    let mut directory = DeviceDirectory::<u8, _, 4>::new(NoStore);
    directory.add_device(0, MAC_1).unwrap();
    directory.save_to_flash();
    directory.delete_flash();
    directory.read_from_flash();
    assert_eq!(directory.get_device_mac(0), Some(MAC_1));
}

#[test]
fn registry_survives_power_cycle_on_flash() {
    let mut store = FlashStore::mount(RamFlash::new(), 8192).unwrap();
    let mut directory = DeviceDirectory::<Peer, _, { Peer::COUNT }>::with_identity(
        &mut store,
        Peer::TestDeviceSelf,
        SELF_MAC,
    );
    directory.add_device(Peer::TestDevice1, MAC_1).unwrap();
    directory.add_device(Peer::TestDevice3, MAC_2).unwrap();
    directory.save_to_flash();
    drop(directory);

    let mut store = FlashStore::mount(store.release(), 8192).unwrap();
    let directory = DeviceDirectory::<Peer, _, { Peer::COUNT }>::with_identity(
        &mut store,
        Peer::TestDeviceSelf,
        SELF_MAC,
    );
    let registered: Vec<_> = directory.registered().collect();
    assert_eq!(
        registered,
        [(Peer::TestDevice1, MAC_1), (Peer::TestDevice3, MAC_2)]
    );
    assert_eq!(directory.find_device(MAC_2), Some(Peer::TestDevice3));
}

#[test]
fn deleted_registry_stays_deleted_on_flash() {
    let mut store = FlashStore::mount(RamFlash::new(), 0).unwrap();
    let mut directory = DeviceDirectory::<Peer, _, { Peer::COUNT }>::new(&mut store);
    directory.add_device(Peer::TestDevice2, MAC_1).unwrap();
    directory.save_to_flash();
    directory.delete_flash();
    drop(directory);

    let mut store = FlashStore::mount(store.release(), 0).unwrap();
    assert!(!store.begin("dReg", true).unwrap().contains_key("val"));
    let directory = DeviceDirectory::<Peer, _, { Peer::COUNT }>::new(&mut store);
    assert!(directory.is_empty());
}

#[test]
fn corrupted_flash_starts_empty() {
    let mut store = FlashStore::mount(RamFlash::new(), 0).unwrap();
    let mut directory = DeviceDirectory::<Peer, _, { Peer::COUNT }>::new(&mut store);
    directory.add_device(Peer::TestDevice2, MAC_1).unwrap();
    directory.save_to_flash();
    drop(directory);

    let mut flash = store.release();
    flash.corrupt(20);
    let mut store = FlashStore::mount(flash, 0).unwrap();
    let directory = DeviceDirectory::<Peer, _, { Peer::COUNT }>::new(&mut store);
    assert!(directory.is_empty());
}
