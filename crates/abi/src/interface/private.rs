// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use core::ffi::{c_char, c_void};

use crate::callbacks::{ContextHandle, GuestHostCallbackFn, HostHostCallbackFn, StreamHandle};

/// Guest view of the private driver interface
///
/// Handed out by the shim. Each slot relays to the same slot of
/// [`DriverPrivateHostTable`]; slots past the negotiated size are zeroed.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct DriverPrivateGuestTable {
	/// Declared size of this table in bytes
	pub size: usize,

	/// Get the context bound to the calling thread
	pub context_get_current: Option<unsafe extern "system" fn(ctx: *mut ContextHandle) -> i32>,

	/// Read the private flags of a context
	pub context_get_flags: Option<unsafe extern "system" fn(ctx: ContextHandle, flags: *mut u32) -> i32>,

	/// Replace the private flags of a context
	pub context_set_flags: Option<unsafe extern "system" fn(ctx: ContextHandle, flags: u32) -> i32>,

	/// Query a device attribute not exposed through the public API
	pub device_get_attribute:
		Option<unsafe extern "system" fn(value: *mut i32, attribute: i32, device: i32) -> i32>,

	/// Query the module loading mode (eager or lazy)
	pub module_get_loading_mode: Option<unsafe extern "system" fn(mode: *mut i32) -> i32>,

	/// Get the driver-unique id of a stream
	pub stream_get_id: Option<unsafe extern "system" fn(stream: StreamHandle, id: *mut u64) -> i32>,

	/// Get the allocation containing an address
	pub memory_get_address_range:
		Option<unsafe extern "system" fn(base: *mut u64, size: *mut usize, address: u64) -> i32>,

	/// Enqueue a guest callback on a stream
	///
	/// The host delivers the callback in its own convention, so the shim re-wraps it.
	pub launch_host_callback: Option<
		unsafe extern "system" fn(
			stream: StreamHandle,
			callback: Option<GuestHostCallbackFn>,
			user_data: *mut c_void,
		) -> i32,
	>,

	/// Emit a named profiler marker
	pub profiler_mark: Option<unsafe extern "system" fn(name: *const c_char) -> i32>,

	/// Block until all work in a context has completed
	pub context_synchronize: Option<unsafe extern "system" fn(ctx: ContextHandle) -> i32>,
}

/// Host view of the private driver interface, as supplied by the native driver
#[repr(C)]
#[derive(Clone, Copy)]
pub struct DriverPrivateHostTable {
	/// Declared size of this table in bytes
	pub size: usize,
	pub context_get_current: Option<unsafe extern "C" fn(ctx: *mut ContextHandle) -> i32>,
	pub context_get_flags: Option<unsafe extern "C" fn(ctx: ContextHandle, flags: *mut u32) -> i32>,
	pub context_set_flags: Option<unsafe extern "C" fn(ctx: ContextHandle, flags: u32) -> i32>,
	pub device_get_attribute: Option<unsafe extern "C" fn(value: *mut i32, attribute: i32, device: i32) -> i32>,
	pub module_get_loading_mode: Option<unsafe extern "C" fn(mode: *mut i32) -> i32>,
	pub stream_get_id: Option<unsafe extern "C" fn(stream: StreamHandle, id: *mut u64) -> i32>,
	pub memory_get_address_range:
		Option<unsafe extern "C" fn(base: *mut u64, size: *mut usize, address: u64) -> i32>,
	pub launch_host_callback: Option<
		unsafe extern "C" fn(stream: StreamHandle, callback: Option<HostHostCallbackFn>, user_data: *mut c_void) -> i32,
	>,
	pub profiler_mark: Option<unsafe extern "C" fn(name: *const c_char) -> i32>,
	pub context_synchronize: Option<unsafe extern "C" fn(ctx: ContextHandle) -> i32>,
}
