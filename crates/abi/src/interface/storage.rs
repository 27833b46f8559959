// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use core::ffi::c_void;

use crate::callbacks::{ContextHandle, GuestStorageDestructorFn, HostStorageDestructorFn};

/// Guest view of per-context keyed storage
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ContextStorageGuestTable {
	/// Declared size of this table in bytes
	pub size: usize,

	/// Store a value under `(owner, key)`
	///
	/// # Parameters
	/// - `owner`: Context that owns the value
	/// - `key`: Opaque key, compared by address
	/// - `value`: Opaque value
	/// - `destructor`: Optional destructor, invoked once with the original triple
	///
	/// # Returns
	/// - 0 on success, the host status on host failure, `STATUS_OUT_OF_MEMORY` if wrapping
	///   the value failed
	pub set: Option<
		unsafe extern "system" fn(
			owner: ContextHandle,
			key: *mut c_void,
			value: *mut c_void,
			destructor: Option<GuestStorageDestructorFn>,
		) -> i32,
	>,

	/// Remove the value under `(owner, key)`
	///
	/// The destructor supplied to `set` runs once the host has dropped the value.
	pub remove: Option<unsafe extern "system" fn(owner: ContextHandle, key: *mut c_void) -> i32>,

	/// Fetch the value under `(owner, key)`
	///
	/// # Returns
	/// - 0 on success, `STATUS_NOT_FOUND` if nothing is stored, the host status otherwise
	pub get: Option<unsafe extern "system" fn(value: *mut *mut c_void, owner: ContextHandle, key: *mut c_void) -> i32>,
}

/// Host view of per-context keyed storage
///
/// The host stores whatever pointer it is given and calls `destructor` with that pointer
/// when the owning context is destroyed.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ContextStorageHostTable {
	/// Declared size of this table in bytes
	pub size: usize,
	pub set: Option<
		unsafe extern "C" fn(
			owner: ContextHandle,
			key: *mut c_void,
			value: *mut c_void,
			destructor: Option<HostStorageDestructorFn>,
		) -> i32,
	>,
	pub remove: Option<unsafe extern "C" fn(owner: ContextHandle, key: *mut c_void) -> i32>,
	pub get: Option<unsafe extern "C" fn(value: *mut *mut c_void, owner: ContextHandle, key: *mut c_void) -> i32>,
}
