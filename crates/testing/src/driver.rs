// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	ffi::c_void,
	ptr::NonNull,
	sync::atomic::{AtomicUsize, Ordering},
};

use abibridge_abi::{ContextStorageHostTable, DriverPrivateHostTable, STATUS_INVALID_VALUE, STATUS_NOT_FOUND};
use abibridge_shim::{
	Error, Result,
	driver::{DeviceIdentity, HostTable, NativeDriver},
	negotiate::{InterfaceId, InterfaceKind},
};

use crate::host;

/// A device as reported by [`FakeDriver`]
#[derive(Debug, Clone)]
pub struct FakeDevice {
	pub identity: DeviceIdentity,
	/// Status returned instead of the identity
	pub failure: Option<i32>,
}

impl FakeDevice {
	pub fn new(uuid: [u8; 16], pci_domain: u32, pci_bus: u32, pci_device: u32) -> Self {
		Self {
			identity: DeviceIdentity {
				uuid,
				pci_domain,
				pci_bus,
				pci_device,
			},
			failure: None,
		}
	}

	pub fn failing(mut self, status: i32) -> Self {
		self.failure = Some(status);
		self
	}
}

/// An in-process native driver
///
/// Host tables are always fully populated; the declared size written into their first
/// field decides how much of them the shim may use.
pub struct FakeDriver {
	private: Box<DriverPrivateHostTable>,
	storage: Box<ContextStorageHostTable>,
	version: i32,
	devices: Vec<FakeDevice>,
	failing_interfaces: Vec<(InterfaceId, i32)>,
	pci_location: bool,
	queries: AtomicUsize,
}

impl FakeDriver {
	pub fn new() -> Self {
		Self {
			private: Box::new(host::private_table()),
			storage: Box::new(host::storage_table()),
			version: 12040,
			devices: Vec::new(),
			failing_interfaces: Vec::new(),
			pci_location: true,
			queries: AtomicUsize::new(0),
		}
	}

	/// Declare a different size for the private interface table
	pub fn with_private_size(mut self, size: usize) -> Self {
		self.private.size = size;
		self
	}

	pub fn with_storage_size(mut self, size: usize) -> Self {
		self.storage.size = size;
		self
	}

	pub fn with_driver_version(mut self, version: i32) -> Self {
		self.version = version;
		self
	}

	pub fn with_device(mut self, device: FakeDevice) -> Self {
		self.devices.push(device);
		self
	}

	/// Make the interface query for `id` fail with `status`
	pub fn with_failing_interface(mut self, id: impl Into<InterfaceId>, status: i32) -> Self {
		self.failing_interfaces.push((id.into(), status));
		self
	}

	/// Behave like a driver without the optional PCI location entry point
	pub fn without_pci_location(mut self) -> Self {
		self.pci_location = false;
		self
	}

	/// Interface queries answered so far
	pub fn queries(&self) -> usize {
		self.queries.load(Ordering::SeqCst)
	}

	fn table<T>(table: &T) -> HostTable {
		let ptr = NonNull::from(table).cast::<c_void>();
		unsafe { HostTable::from_sized(ptr) }
	}
}

impl Default for FakeDriver {
	fn default() -> Self {
		Self::new()
	}
}

impl NativeDriver for FakeDriver {
	fn query_interface(&self, id: InterfaceId) -> Result<HostTable> {
		self.queries.fetch_add(1, Ordering::SeqCst);

		if let Some((_, status)) = self.failing_interfaces.iter().find(|(failing, _)| *failing == id) {
			return Err(Error::Host(*status));
		}

		match InterfaceKind::from_id(id) {
			Some(InterfaceKind::DriverPrivate) => Ok(Self::table(&*self.private)),
			Some(InterfaceKind::ContextStorage) => Ok(Self::table(&*self.storage)),
			_ => Err(Error::Host(STATUS_NOT_FOUND)),
		}
	}

	fn driver_version(&self) -> Result<i32> {
		Ok(self.version)
	}

	fn device_count(&self) -> Result<u32> {
		Ok(self.devices.len() as u32)
	}

	fn device_identity(&self, ordinal: u32) -> Result<DeviceIdentity> {
		if !self.pci_location {
			return Err(Error::Unsupported("device_get_pci_location"));
		}

		let device = self.devices.get(ordinal as usize).ok_or(Error::Host(STATUS_INVALID_VALUE))?;
		match device.failure {
			Some(status) => Err(Error::Host(status)),
			None => Ok(device.identity),
		}
	}
}
