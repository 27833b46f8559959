// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

//! Entry points exported by the native driver library
//!
//! All driver entry points use the host (`extern "C"`) convention and return 0 on success
//! or a driver status code on failure.

use core::ffi::c_void;

use crate::interface::InterfaceIdFFI;

/// Fetch the host table for an interface
///
/// The table's first `usize` holds its declared size in bytes.
pub type DriverGetExportTableFn = unsafe extern "C" fn(table: *mut *const c_void, id: *const InterfaceIdFFI) -> i32;

/// Report the driver version
pub type DriverGetVersionFn = unsafe extern "C" fn(version: *mut i32) -> i32;

/// Report the number of devices
pub type DeviceGetCountFn = unsafe extern "C" fn(count: *mut i32) -> i32;

/// Report the 16-byte UUID of a device
pub type DeviceGetUuidFn = unsafe extern "C" fn(uuid: *mut [u8; 16], ordinal: i32) -> i32;

/// Report the PCI location of a device
pub type DeviceGetPciLocationFn =
	unsafe extern "C" fn(domain: *mut i32, bus: *mut i32, device: *mut i32, ordinal: i32) -> i32;

/// FFI-safe device identity
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceIdentityFFI {
	pub uuid: [u8; 16],
	pub pci_domain: u32,
	pub pci_bus: u32,
	pub pci_device: u32,
}
