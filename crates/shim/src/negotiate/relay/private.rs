// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Private driver interface relays

use std::{
	ffi::{c_char, c_void},
	mem::size_of,
};

use abibridge_abi::{ContextHandle, DriverPrivateGuestTable, DriverPrivateHostTable, GuestHostCallbackFn, StreamHandle};
use tracing::{error, warn};

use super::relay;
use crate::{negotiate::InterfaceKind, negotiate::host_slot, state::ProcessState};

pub(super) static GUEST_TABLE: DriverPrivateGuestTable = DriverPrivateGuestTable {
	size: size_of::<DriverPrivateGuestTable>(),
	context_get_current: Some(context_get_current),
	context_get_flags: Some(context_get_flags),
	context_set_flags: Some(context_set_flags),
	device_get_attribute: Some(device_get_attribute),
	module_get_loading_mode: Some(module_get_loading_mode),
	stream_get_id: Some(stream_get_id),
	memory_get_address_range: Some(memory_get_address_range),
	launch_host_callback: Some(launch_host_callback),
	profiler_mark: Some(profiler_mark),
	context_synchronize: Some(context_synchronize),
};

macro_rules! pass_through {
	($($name:ident($($arg:ident: $ty:ty),* $(,)?);)*) => {$(
		unsafe extern "system" fn $name($($arg: $ty),*) -> i32 {
			relay(InterfaceKind::DriverPrivate, stringify!($name), |_, negotiated| {
				let host = host_slot!(negotiated, DriverPrivateHostTable, $name)?;
				Ok(unsafe { host($($arg),*) })
			})
		}
	)*};
}

pass_through! {
	context_get_current(ctx: *mut ContextHandle);
	context_get_flags(ctx: ContextHandle, flags: *mut u32);
	context_set_flags(ctx: ContextHandle, flags: u32);
	device_get_attribute(value: *mut i32, attribute: i32, device: i32);
	module_get_loading_mode(mode: *mut i32);
	stream_get_id(stream: StreamHandle, id: *mut u64);
	memory_get_address_range(base: *mut u64, size: *mut usize, address: u64);
	profiler_mark(name: *const c_char);
	context_synchronize(ctx: ContextHandle);
}

/// The host delivers in its own convention, so the guest callback is parked in the process
/// trampoline and the host is handed [`host_callback_adapter`].
unsafe extern "system" fn launch_host_callback(
	stream: StreamHandle,
	callback: Option<GuestHostCallbackFn>,
	user_data: *mut c_void,
) -> i32 {
	relay(InterfaceKind::DriverPrivate, "launch_host_callback", |state, negotiated| {
		let host = host_slot!(negotiated, DriverPrivateHostTable, launch_host_callback)?;

		let Some(callback) = callback else {
			return Ok(unsafe { host(stream, None, user_data) });
		};

		if let Some(displaced) = state.host_callback().arm(callback)
			&& displaced as usize != callback as usize
		{
			warn!("host callback trampoline re-armed; the previous guest callback will not be delivered");
		}

		Ok(unsafe { host(stream, Some(host_callback_adapter), user_data) })
	})
}

/// Host-convention adapter forwarding to the parked guest callback
///
/// May run on a driver-owned thread.
pub unsafe extern "C" fn host_callback_adapter(stream: StreamHandle, status: i32, user_data: *mut c_void) {
	let target = match ProcessState::current() {
		Ok(state) => state.host_callback().target(),
		Err(err) => {
			error!(%err, "host callback delivered without process state");
			return;
		}
	};

	match target {
		Some(callback) => unsafe { callback(stream, status, user_data) },
		None => error!("host callback delivered with no guest callback armed"),
	}
}
