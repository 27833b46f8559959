// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Native driver loaded from a shared library

use std::{
	ffi::{CString, c_void},
	path::{Path, PathBuf},
	ptr::{self, NonNull},
};

use abibridge_abi::{
	DeviceGetCountFn, DeviceGetPciLocationFn, DeviceGetUuidFn, DriverGetExportTableFn, DriverGetVersionFn,
	InterfaceIdFFI, STATUS_INVALID_VALUE,
};
use libloading::Library;
use tracing::{debug, error, warn};

use super::{DeviceIdentity, HostTable, NativeDriver};
use crate::{
	config::{DriverConfig, DriverSymbols},
	error::{Error, Result},
	negotiate::InterfaceId,
};

/// Entry points resolved once at load time
struct Entries {
	get_export_table: DriverGetExportTableFn,
	driver_get_version: DriverGetVersionFn,
	device_get_count: DeviceGetCountFn,
	device_get_uuid: DeviceGetUuidFn,
	device_get_pci_location: Option<DeviceGetPciLocationFn>,
}

/// A native driver backed by a loaded shared library
pub struct LibraryDriver {
	entries: Entries,
	path: PathBuf,
	// Keeps every resolved entry point valid; must outlive `entries`.
	_library: Library,
}

impl LibraryDriver {
	/// Load the driver library and resolve its entry points
	///
	/// A missing required symbol aborts loading with [`Error::FatalInit`]; a missing optional
	/// symbol is tolerated and reported as [`Error::Unsupported`] when used.
	pub fn load(config: &DriverConfig) -> Result<Self> {
		let path = config.library_path.clone();
		let library = unsafe { Library::new(&path) }.map_err(|source| Error::Library {
			path: path.clone(),
			source,
		})?;

		let entries = unsafe { Self::resolve(&library, &config.symbols) }?;
		debug!(
			path = %path.display(),
			pci_location = entries.device_get_pci_location.is_some(),
			"native driver loaded"
		);

		Ok(Self {
			entries,
			path,
			_library: library,
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// # Safety
	/// The named symbols must have the signatures declared in `abibridge_abi::driver`.
	unsafe fn resolve(library: &Library, symbols: &DriverSymbols) -> Result<Entries> {
		unsafe {
			Ok(Entries {
				get_export_table: required(library, &symbols.get_export_table)?,
				driver_get_version: required(library, &symbols.driver_get_version)?,
				device_get_count: required(library, &symbols.device_get_count)?,
				device_get_uuid: required(library, &symbols.device_get_uuid)?,
				device_get_pci_location: optional(library, &symbols.device_get_pci_location),
			})
		}
	}
}

unsafe fn lookup<F: Copy>(library: &Library, name: &str) -> Option<F> {
	let c_name = CString::new(name).ok()?;
	unsafe { library.get::<F>(c_name.as_bytes_with_nul()) }.ok().map(|symbol| *symbol)
}

unsafe fn required<F: Copy>(library: &Library, name: &str) -> Result<F> {
	unsafe { lookup(library, name) }.ok_or_else(|| {
		error!(symbol = name, "required driver symbol missing");
		Error::FatalInit {
			symbol: name.to_string(),
		}
	})
}

unsafe fn optional<F: Copy>(library: &Library, name: &str) -> Option<F> {
	let entry = unsafe { lookup(library, name) };
	if entry.is_none() {
		warn!(symbol = name, "optional driver symbol missing");
	}
	entry
}

impl NativeDriver for LibraryDriver {
	fn query_interface(&self, id: InterfaceId) -> Result<HostTable> {
		let raw = InterfaceIdFFI::from(id);
		let mut table: *const c_void = ptr::null();
		Error::check_host(unsafe { (self.entries.get_export_table)(&mut table, &raw) })?;

		let table = NonNull::new(table.cast_mut()).ok_or(Error::Host(STATUS_INVALID_VALUE))?;
		Ok(unsafe { HostTable::from_sized(table) })
	}

	fn driver_version(&self) -> Result<i32> {
		let mut version = 0;
		Error::check_host(unsafe { (self.entries.driver_get_version)(&mut version) })?;
		Ok(version)
	}

	fn device_count(&self) -> Result<u32> {
		let mut count = 0;
		Error::check_host(unsafe { (self.entries.device_get_count)(&mut count) })?;
		Ok(count.max(0) as u32)
	}

	fn device_identity(&self, ordinal: u32) -> Result<DeviceIdentity> {
		let pci_location = self.entries.device_get_pci_location.ok_or(Error::Unsupported("device_get_pci_location"))?;
		let ordinal = i32::try_from(ordinal).map_err(|_| Error::InvalidValue("device ordinal"))?;

		let mut identity = DeviceIdentity::default();
		Error::check_host(unsafe { (self.entries.device_get_uuid)(&mut identity.uuid, ordinal) })?;

		let (mut domain, mut bus, mut device) = (0i32, 0i32, 0i32);
		Error::check_host(unsafe { pci_location(&mut domain, &mut bus, &mut device, ordinal) })?;
		identity.pci_domain = domain as u32;
		identity.pci_bus = bus as u32;
		identity.pci_device = device as u32;

		Ok(identity)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_missing_library_is_a_load_error() {
		let config = DriverConfig::default().with_library_path("/nonexistent/abibridge/libmissing_driver.so");
		match LibraryDriver::load(&config) {
			Err(Error::Library {
				path,
				..
			}) => assert_eq!(path, PathBuf::from("/nonexistent/abibridge/libmissing_driver.so")),
			Err(other) => panic!("unexpected error: {other}"),
			Ok(_) => panic!("loading a missing library must fail"),
		}
	}
}
