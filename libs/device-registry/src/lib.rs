#![cfg_attr(any(not(test), target_arch = "arm"), no_std)]

//! Persistent directory of paired peer devices.
//!
//! A [`DeviceDirectory`] maps small device identifiers to the hardware addresses of the peers
//! a controller is paired with, and keeps that table in a [`kv_store::KeyValueStore`] so it
//! survives power cycles:
//!
//! ```
//! use device_registry::{device_ids, DeviceDirectory, MacAddress};
//! use kv_store::MemoryStore;
//!
//! device_ids! {
//!     pub enum Peer {
//!         Basestation,
//!         Robot0,
//!         Robot1,
//!     }
//! }
//!
//! let own_mac = MacAddress::new([0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x00]);
//! let robot_mac: MacAddress = "AA:BB:CC:DD:EE:01".parse().unwrap();
//!
//! let mut store = MemoryStore::<4, 64>::new();
//! let mut directory =
//!     DeviceDirectory::<Peer, _, { Peer::COUNT }>::with_identity(&mut store, Peer::Basestation, own_mac);
//! directory.add_device(Peer::Robot0, robot_mac).unwrap();
//! directory.save_to_flash();
//! drop(directory);
//!
//! let directory = DeviceDirectory::<Peer, _, { Peer::COUNT }>::new(&mut store);
//! assert_eq!(directory.get_device_mac(Peer::Robot0), Some(robot_mac));
//! assert_eq!(directory.get_device_mac(Peer::Robot1), None);
//! ```

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod directory;
pub mod error;
mod id;
mod image;
pub mod mac;

pub use directory::{DeviceDirectory, RegistryConfig, SelfIdentity};
pub use error::{Error, Result};
pub use id::{DeviceId, InvalidId};
pub use mac::{MacAddress, ParseMacError, MAC_LEN};
