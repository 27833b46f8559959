// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Notification interface, served by the process registry

use std::{ffi::c_void, mem::size_of};

use abibridge_abi::{NotificationCallbackFn, NotificationTable, STATUS_OK};

use crate::{
	error::Error,
	exports::guarded,
	notify::SlotHandle,
	state::ProcessState,
};

pub(super) static TABLE: NotificationTable = NotificationTable {
	size: size_of::<NotificationTable>(),
	register: Some(register),
	unregister: Some(unregister),
};

unsafe extern "system" fn register(
	handle: *mut u64,
	callback: Option<NotificationCallbackFn>,
	user_data: *mut c_void,
) -> i32 {
	guarded("register", || {
		if handle.is_null() {
			return Err(Error::InvalidValue("handle"));
		}
		let callback = callback.ok_or(Error::InvalidValue("callback"))?;

		let registered = ProcessState::current()?.notifications().register(callback, user_data)?;
		unsafe { handle.write(registered.into_raw()) };
		Ok(STATUS_OK)
	})
}

unsafe extern "system" fn unregister(handle: u64) -> i32 {
	guarded("unregister", || {
		ProcessState::current()?.notifications().unregister(SlotHandle::from_raw(handle))?;
		Ok(STATUS_OK)
	})
}
