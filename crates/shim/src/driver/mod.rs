// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Boundary with the native driver library

mod library;

use std::{ffi::c_void, ptr::NonNull};

pub use abibridge_abi::DeviceIdentityFFI as DeviceIdentity;
pub use library::LibraryDriver;

use crate::{error::Result, negotiate::InterfaceId};

/// The native driver as seen by the shim
///
/// Implemented over a loaded shared library by [`LibraryDriver`]; tests provide in-process
/// fakes.
pub trait NativeDriver: Send + Sync {
	/// Fetch the host table for an interface
	///
	/// Driver failures come back as [`crate::Error::Host`] carrying the driver status verbatim.
	fn query_interface(&self, id: InterfaceId) -> Result<HostTable>;

	fn driver_version(&self) -> Result<i32>;

	fn device_count(&self) -> Result<u32>;

	fn device_identity(&self, ordinal: u32) -> Result<DeviceIdentity>;
}

/// A host interface table supplied by the driver
///
/// Host tables live for as long as the driver library stays loaded, which is the lifetime
/// of the process state holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostTable {
	ptr: NonNull<c_void>,
	size: usize,
}

// SAFETY: host tables are immutable driver-owned data for the life of the process
unsafe impl Send for HostTable {}
unsafe impl Sync for HostTable {}

impl HostTable {
	/// # Safety
	/// `ptr` must point to at least `size` readable bytes that stay valid and unmodified
	/// while the driver is loaded.
	pub unsafe fn new(ptr: NonNull<c_void>, size: usize) -> Self {
		Self {
			ptr,
			size,
		}
	}

	/// Wrap a table whose first `usize` holds its declared size
	///
	/// # Safety
	/// `ptr` must point to a table laid out that way, valid while the driver is loaded.
	pub unsafe fn from_sized(ptr: NonNull<c_void>) -> Self {
		let size = unsafe { ptr.cast::<usize>().as_ptr().read_unaligned() };
		Self {
			ptr,
			size,
		}
	}

	pub fn as_ptr(&self) -> *const c_void {
		self.ptr.as_ptr()
	}

	/// Declared size in bytes
	pub fn size(&self) -> usize {
		self.size
	}
}
