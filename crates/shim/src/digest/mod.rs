// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Compatibility digest
//!
//! A deterministic 128-bit value over version numbers, process identity and the visible
//! devices, checked by a cooperating external validator. The construction is chained, so
//! every byte of input, layout and table contents affects every output bit; none of it may
//! change without breaking validation.
//!
//! [`compat_digest`] is pure. [`DigestInput::collect`] gathers the live inputs for the
//! calling thread.

mod engine;
mod tables;

use abibridge_abi::DIGEST_LEN;
use engine::Engine;
use tables::{
	FIXED_DIGEST, FIXED_PATCH_OFFSET, FIXED_PATCH_VALUE, INNER_PAD, KEY_TABLE, OUTER_PAD,
};
use tracing::{instrument, trace, warn};

use crate::{
	driver::{DeviceIdentity, NativeDriver},
	error::{Error, Result},
};

pub type Digest = [u8; DIGEST_LEN];

/// Size of the primary record
pub const RECORD_LEN: usize = 48;

/// Size of one device record
pub const DEVICE_RECORD_LEN: usize = 28;

const KEY_WALK_START: usize = 13;

/// Everything the digest is computed over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestInput {
	pub runtime_version: u32,
	pub driver_version: u32,
	pub process_id: u32,
	pub thread_id: u32,
	/// Stable process-local addresses, used only as salt
	pub salts: [u64; 2],
	pub timestamp: u64,
	/// Visible devices, in enumeration order
	pub devices: Vec<DeviceIdentity>,
}

// Addresses of these statics salt the digest
static SALT_ANCHOR_1: u8 = 0x5a;
static SALT_ANCHOR_2: u8 = 0xa5;

impl DigestInput {
	/// Gather the inputs for the calling thread
	///
	/// A device whose identity cannot be read is not visible and is left out of both the
	/// device records and the device count. A driver without PCI location support fails the
	/// whole collection with [`Error::Unsupported`].
	#[instrument(name = "digest::collect", level = "debug", skip(driver))]
	pub fn collect(driver: &dyn NativeDriver, runtime_version: u32, timestamp: u64) -> Result<Self> {
		let driver_version = driver.driver_version()? as u32;

		let count = driver.device_count()?;
		let mut devices = Vec::new();
		for ordinal in 0..count {
			match driver.device_identity(ordinal) {
				Ok(identity) => {
					devices.try_reserve(1).map_err(|_| Error::ResourceExhaustion("device records"))?;
					devices.push(identity);
				}
				Err(err @ Error::Unsupported(_)) => return Err(err),
				Err(err) => warn!(ordinal, %err, "skipping device whose identity cannot be read"),
			}
		}

		Ok(Self {
			runtime_version,
			driver_version,
			process_id: std::process::id(),
			thread_id: current_thread_id(),
			salts: salts(),
			timestamp,
			devices,
		})
	}

	/// The 48-byte primary record, little endian
	pub fn record(&self) -> [u8; RECORD_LEN] {
		let mut record = [0u8; RECORD_LEN];
		record[0..4].copy_from_slice(&self.runtime_version.to_le_bytes());
		record[4..8].copy_from_slice(&self.driver_version.to_le_bytes());
		record[8..12].copy_from_slice(&self.process_id.to_le_bytes());
		record[12..16].copy_from_slice(&self.thread_id.to_le_bytes());
		record[16..24].copy_from_slice(&self.salts[0].to_le_bytes());
		record[24..32].copy_from_slice(&self.salts[1].to_le_bytes());
		record[32..40].copy_from_slice(&self.timestamp.to_le_bytes());
		record[40..44].copy_from_slice(&(self.devices.len() as u32).to_le_bytes());
		record
	}
}

/// One 28-byte device record, little endian
pub fn device_record(device: &DeviceIdentity) -> [u8; DEVICE_RECORD_LEN] {
	let mut record = [0u8; DEVICE_RECORD_LEN];
	record[0..16].copy_from_slice(&device.uuid);
	record[16..20].copy_from_slice(&device.pci_domain.to_le_bytes());
	record[20..24].copy_from_slice(&device.pci_bus.to_le_bytes());
	record[24..28].copy_from_slice(&device.pci_device.to_le_bytes());
	record
}

/// Compute the compatibility digest
#[instrument(name = "digest::compute", level = "trace", skip(input), fields(runtime_version = input.runtime_version))]
pub fn compat_digest(input: &DigestInput) -> Digest {
	match input.runtime_version % 10 {
		0 => return FIXED_DIGEST,
		1 => {
			let mut digest = FIXED_DIGEST;
			digest[FIXED_PATCH_OFFSET] = FIXED_PATCH_VALUE;
			return digest;
		}
		_ => {}
	}

	let key = derive_key();
	let mut engine = Engine::new();

	engine.absorb(key.iter().map(|b| b ^ INNER_PAD));
	engine.absorb(input.record());
	for device in &input.devices {
		engine.absorb(device_record(device));
	}
	engine.pad();

	let inner = engine.output();
	engine.reset_for_outer();

	engine.absorb(key.iter().map(|b| b ^ OUTER_PAD));
	engine.absorb(inner);
	engine.pad();

	let digest = engine.output();
	trace!(devices = input.devices.len(), "digest computed");
	digest
}

/// Walk table A from index 13 back to 13, writing one key byte per step
fn derive_key() -> [u8; 16] {
	let mut key = [0u8; 16];
	let mut acc = 0u8;
	let mut i = KEY_WALK_START;

	loop {
		let out = KEY_TABLE[i + 16].wrapping_add(KEY_TABLE[i + 32]) ^ KEY_TABLE[i + 48];
		let ctrl = KEY_TABLE[i] ^ KEY_TABLE[(i + 5) & 15] ^ KEY_TABLE[(i + 11) & 15] ^ acc;

		key[(ctrl & 15) as usize] = out;
		acc = acc.wrapping_add(out);
		i = (ctrl & 15) as usize;

		if i == KEY_WALK_START {
			return key;
		}
	}
}

fn salts() -> [u64; 2] {
	[&SALT_ANCHOR_1 as *const u8 as u64, &SALT_ANCHOR_2 as *const u8 as u64]
}

#[cfg(target_os = "linux")]
fn current_thread_id() -> u32 {
	unsafe { libc::syscall(libc::SYS_gettid) as u32 }
}

#[cfg(not(target_os = "linux"))]
fn current_thread_id() -> u32 {
	unsafe { libc::pthread_self() as u32 }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn dev0() -> DeviceIdentity {
		DeviceIdentity {
			uuid: std::array::from_fn(|i| i as u8),
			pci_domain: 0,
			pci_bus: 0x65,
			pci_device: 0,
		}
	}

	fn dev1() -> DeviceIdentity {
		DeviceIdentity {
			uuid: std::array::from_fn(|i| 16 + i as u8),
			pci_domain: 1,
			pci_bus: 0x17,
			pci_device: 3,
		}
	}

	fn input(devices: Vec<DeviceIdentity>) -> DigestInput {
		DigestInput {
			runtime_version: 12023,
			driver_version: 12042,
			process_id: 4242,
			thread_id: 4243,
			salts: [0x7f00_1000_2000, 0x7f00_1000_3000],
			timestamp: 1_700_000_000,
			devices,
		}
	}

	#[test]
	fn test_key_walk() {
		assert_eq!(
			derive_key(),
			[0x00, 0x9c, 0x00, 0x00, 0xb1, 0xbf, 0x00, 0x38, 0x00, 0xe4, 0xe5, 0x00, 0x21, 0x1d, 0x00, 0x00]
		);
	}

	#[test]
	fn test_record_layout() {
		let record = input(vec![dev0(), dev1()]).record();
		assert_eq!(&record[0..4], &12023u32.to_le_bytes());
		assert_eq!(&record[12..16], &4243u32.to_le_bytes());
		assert_eq!(&record[24..32], &0x7f00_1000_3000u64.to_le_bytes());
		assert_eq!(&record[40..44], &2u32.to_le_bytes());
		assert_eq!(&record[44..48], &[0; 4]);

		let device = device_record(&dev1());
		assert_eq!(device[0], 16);
		assert_eq!(&device[20..24], &0x17u32.to_le_bytes());
		assert_eq!(&device[24..28], &3u32.to_le_bytes());
	}

	#[test]
	fn test_golden_no_devices() {
		assert_eq!(
			compat_digest(&input(vec![])),
			[0xe8, 0x81, 0x24, 0xfd, 0x18, 0x4a, 0x9a, 0x92, 0x2d, 0x46, 0x45, 0x6e, 0x44, 0x55, 0x8e, 0x72]
		);
	}

	#[test]
	fn test_golden_one_device() {
		assert_eq!(
			compat_digest(&input(vec![dev0()])),
			[0x6f, 0x77, 0xef, 0x2a, 0x80, 0x57, 0x9c, 0x20, 0x1c, 0xcb, 0x88, 0x92, 0xc4, 0xc2, 0xe6, 0x9b]
		);
	}

	#[test]
	fn test_golden_two_devices() {
		let input = DigestInput {
			runtime_version: 11085,
			driver_version: 12027,
			process_id: 1,
			thread_id: 2,
			salts: [0x1000, 0x2000],
			timestamp: 0,
			devices: vec![dev0(), dev1()],
		};
		assert_eq!(
			compat_digest(&input),
			[0xbd, 0xc0, 0x9e, 0xa0, 0x8f, 0x50, 0x6c, 0x45, 0x2a, 0xb3, 0x89, 0x1e, 0xf6, 0xea, 0x4e, 0x35]
		);
	}

	#[test]
	fn test_single_uuid_byte_changes_digest() {
		let mut device = dev0();
		device.uuid[15] = 16;
		let changed = compat_digest(&input(vec![device]));

		assert_eq!(
			changed,
			[0xbc, 0x05, 0x6f, 0xb6, 0xf4, 0xe3, 0xf1, 0xcb, 0xe9, 0xa4, 0xc7, 0x66, 0x81, 0x38, 0xc3, 0x33]
		);
		assert_ne!(changed, compat_digest(&input(vec![dev0()])));
	}

	#[test]
	fn test_deterministic() {
		let input = input(vec![dev0(), dev1()]);
		assert_eq!(compat_digest(&input), compat_digest(&input.clone()));
	}

	#[test]
	fn test_fixed_for_versions_ending_in_zero() {
		for version in [0, 10, 12000, 12030] {
			let mut input = input(vec![dev0()]);
			input.runtime_version = version;
			input.timestamp = version as u64 * 31;
			assert_eq!(compat_digest(&input), FIXED_DIGEST);
		}
	}

	#[test]
	fn test_patched_for_versions_ending_in_one() {
		let mut expected = FIXED_DIGEST;
		expected[7] = 24;

		for version in [1, 11, 12021] {
			let mut input = input(vec![]);
			input.runtime_version = version;
			input.process_id = version * 3;
			assert_eq!(compat_digest(&input), expected);
		}
	}

	/// Driver whose devices answer from a fixed list, failing past its end
	struct ListedDriver {
		count: u32,
		devices: Vec<Result<DeviceIdentity>>,
	}

	impl NativeDriver for ListedDriver {
		fn query_interface(&self, _id: crate::negotiate::InterfaceId) -> Result<crate::driver::HostTable> {
			Err(Error::NotFound)
		}

		fn driver_version(&self) -> Result<i32> {
			Ok(12042)
		}

		fn device_count(&self) -> Result<u32> {
			Ok(self.count)
		}

		fn device_identity(&self, ordinal: u32) -> Result<DeviceIdentity> {
			match self.devices.get(ordinal as usize) {
				Some(Ok(identity)) => Ok(*identity),
				Some(Err(Error::Unsupported(what))) => Err(Error::Unsupported(what)),
				_ => Err(Error::Host(101)),
			}
		}
	}

	#[test]
	fn test_collect_skips_failing_devices() {
		let driver = ListedDriver {
			count: 3,
			devices: vec![Ok(dev0()), Err(Error::Host(101)), Ok(dev1())],
		};

		let input = DigestInput::collect(&driver, 12023, 0).unwrap();
		assert_eq!(input.devices, vec![dev0(), dev1()]);
		assert_eq!(input.driver_version, 12042);
	}

	#[test]
	fn test_collect_fails_without_pci_location() {
		let driver = ListedDriver {
			count: 2,
			devices: vec![Ok(dev0()), Err(Error::Unsupported("device_get_pci_location"))],
		};

		assert!(matches!(
			DigestInput::collect(&driver, 12023, 0),
			Err(Error::Unsupported("device_get_pci_location"))
		));
	}

	#[test]
	fn test_collect_does_not_size_by_reported_count() {
		let driver = ListedDriver {
			count: u32::MAX,
			devices: vec![Err(Error::Unsupported("device_get_pci_location"))],
		};

		assert!(matches!(DigestInput::collect(&driver, 12023, 0), Err(Error::Unsupported(_))));
	}
}
