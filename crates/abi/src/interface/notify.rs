// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use core::ffi::c_void;

use crate::callbacks::NotificationCallbackFn;

/// Lifecycle notification registry
///
/// Implemented entirely by the shim; the host never sees this table.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct NotificationTable {
	/// Declared size of this table in bytes
	pub size: usize,

	/// Register a callback
	///
	/// # Parameters
	/// - `handle`: Receives the registration handle
	/// - `callback`: Callback invoked on every lifecycle notification
	/// - `user_data`: Passed back to `callback` unchanged
	///
	/// # Returns
	/// - 0 on success, `STATUS_OUT_OF_MEMORY` if the registration could not be allocated
	pub register: Option<
		unsafe extern "system" fn(
			handle: *mut u64,
			callback: Option<NotificationCallbackFn>,
			user_data: *mut c_void,
		) -> i32,
	>,

	/// Unregister a callback
	///
	/// # Returns
	/// - 0 on success, `STATUS_NOT_FOUND` for an unknown or already removed handle
	pub unregister: Option<unsafe extern "system" fn(handle: u64) -> i32>,
}
