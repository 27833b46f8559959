// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Guest-facing entry points
//!
//! Every export runs inside [`guarded`]: errors become status codes and a panic is reported
//! as `STATUS_UNKNOWN` instead of unwinding into the caller.

use std::{
	ffi::{CStr, c_char, c_void},
	panic::{AssertUnwindSafe, catch_unwind},
	ptr,
};

use abibridge_abi::{InterfaceIdFFI, STATUS_OK, STATUS_UNKNOWN};
use tracing::{debug, error, trace};

use crate::{
	error::{Error, Result},
	state::ProcessState,
};

/// Run an FFI body, mapping errors to their status and containing panics
pub(crate) fn guarded(entry: &'static str, body: impl FnOnce() -> Result<i32>) -> i32 {
	match catch_unwind(AssertUnwindSafe(body)) {
		Ok(Ok(status)) => status,
		Ok(Err(err)) => {
			debug!(entry, %err, "call failed");
			err.status()
		}
		Err(e) => {
			error!(entry, ?e, "panic in ffi entry point");
			STATUS_UNKNOWN
		}
	}
}

/// Negotiate an interface and hand out its table
///
/// # Safety
/// `table` must be writable and `id` must point to a readable identifier.
#[unsafe(no_mangle)]
pub unsafe extern "system" fn abibridge_get_export_table(table: *mut *const c_void, id: *const InterfaceIdFFI) -> i32 {
	guarded("abibridge_get_export_table", || unsafe { export_table(table, id) })
}

unsafe fn export_table(table: *mut *const c_void, id: *const InterfaceIdFFI) -> Result<i32> {
	if table.is_null() {
		return Err(Error::InvalidValue("table"));
	}
	unsafe { table.write(ptr::null()) };
	if id.is_null() {
		return Err(Error::InvalidValue("id"));
	}

	let id = unsafe { id.read() };
	let negotiated = ProcessState::current()?.negotiate(id.into())?;
	unsafe { table.write(negotiated.exposed_table()) };
	Ok(STATUS_OK)
}

/// Resolve a versioned entry point
///
/// A miss writes null and returns `STATUS_NOT_FOUND`.
///
/// # Safety
/// `symbol` must be a NUL-terminated string and `out` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "system" fn abibridge_get_proc_address(
	symbol: *const c_char,
	out: *mut *const c_void,
	version: u32,
	flags: u64,
) -> i32 {
	guarded("abibridge_get_proc_address", || {
		if out.is_null() {
			return Err(Error::InvalidValue("out"));
		}
		unsafe { out.write(ptr::null()) };

		if symbol.is_null() {
			return Err(Error::InvalidValue("symbol"));
		}
		let name = unsafe { CStr::from_ptr(symbol) }.to_str().map_err(|_| Error::InvalidValue("symbol"))?;

		let resolved = ProcessState::current()?.resolve(name, version, flags).ok_or(Error::NotFound)?;
		trace!(name, version, flags, "symbol resolved");
		unsafe { out.write(resolved.as_ptr()) };
		Ok(STATUS_OK)
	})
}

/// # Safety
/// `version` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "system" fn abibridge_driver_get_version(version: *mut i32) -> i32 {
	guarded("abibridge_driver_get_version", || {
		if version.is_null() {
			return Err(Error::InvalidValue("version"));
		}
		let driver_version = ProcessState::current()?.driver().driver_version()?;
		unsafe { version.write(driver_version) };
		Ok(STATUS_OK)
	})
}

/// Loader hook for a thread leaving the shim; runs the notification callbacks
#[unsafe(no_mangle)]
pub extern "system" fn abibridge_thread_detach() {
	guarded("abibridge_thread_detach", || {
		if let Ok(state) = ProcessState::current() {
			state.thread_detached();
		}
		Ok(STATUS_OK)
	});
}

#[cfg(test)]
mod tests {
	use abibridge_abi::DRIVER_PRIVATE_ID;

	use super::*;

	#[test]
	fn test_null_table_is_named() {
		let result = unsafe { export_table(ptr::null_mut(), &DRIVER_PRIVATE_ID) };
		assert!(matches!(result, Err(Error::InvalidValue("table"))));
	}

	#[test]
	fn test_null_id_is_named_and_clears_table() {
		let mut table = 0x1 as *const c_void;
		let result = unsafe { export_table(&mut table, ptr::null()) };
		assert!(matches!(result, Err(Error::InvalidValue("id"))));
		assert!(table.is_null());
	}
}
