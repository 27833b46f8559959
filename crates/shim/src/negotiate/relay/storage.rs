// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Context storage relays

use std::{ffi::c_void, mem::size_of, ptr};

use abibridge_abi::{
	ContextHandle, ContextStorageGuestTable, ContextStorageHostTable, GuestStorageDestructorFn,
	HostStorageDestructorFn, STATUS_OK,
};

use super::relay;
use crate::{
	error::{Error, Result},
	negotiate::{InterfaceKind, NegotiatedInterface, host_slot},
	storage::{HostStore, KeyedStorage},
};

pub(super) static GUEST_TABLE: ContextStorageGuestTable = ContextStorageGuestTable {
	size: size_of::<ContextStorageGuestTable>(),
	set: Some(set),
	remove: Some(remove),
	get: Some(get),
};

/// The host keyed store behind a negotiated context storage interface
pub struct NegotiatedStore<'a>(pub &'a NegotiatedInterface);

impl HostStore for NegotiatedStore<'_> {
	fn set(
		&self,
		owner: ContextHandle,
		key: *mut c_void,
		value: *mut c_void,
		destructor: Option<HostStorageDestructorFn>,
	) -> Result<()> {
		let host = host_slot!(self.0, ContextStorageHostTable, set)?;
		Error::check_host(unsafe { host(owner, key, value, destructor) })
	}

	fn get(&self, owner: ContextHandle, key: *mut c_void) -> Result<*mut c_void> {
		let host = host_slot!(self.0, ContextStorageHostTable, get)?;
		let mut value = ptr::null_mut();
		Error::check_host(unsafe { host(&mut value, owner, key) })?;
		Ok(value)
	}

	fn remove(&self, owner: ContextHandle, key: *mut c_void) -> Result<()> {
		let host = host_slot!(self.0, ContextStorageHostTable, remove)?;
		Error::check_host(unsafe { host(owner, key) })
	}
}

unsafe extern "system" fn set(
	owner: ContextHandle,
	key: *mut c_void,
	value: *mut c_void,
	destructor: Option<GuestStorageDestructorFn>,
) -> i32 {
	relay(InterfaceKind::ContextStorage, "set", |_, negotiated| {
		KeyedStorage::new(NegotiatedStore(negotiated)).set(owner, key, value, destructor)?;
		Ok(STATUS_OK)
	})
}

unsafe extern "system" fn remove(owner: ContextHandle, key: *mut c_void) -> i32 {
	relay(InterfaceKind::ContextStorage, "remove", |_, negotiated| {
		KeyedStorage::new(NegotiatedStore(negotiated)).remove(owner, key)?;
		Ok(STATUS_OK)
	})
}

unsafe extern "system" fn get(value: *mut *mut c_void, owner: ContextHandle, key: *mut c_void) -> i32 {
	relay(InterfaceKind::ContextStorage, "get", |_, negotiated| {
		if value.is_null() {
			return Err(Error::InvalidValue("value"));
		}
		let stored = KeyedStorage::new(NegotiatedStore(negotiated)).get(owner, key)?;
		unsafe { value.write(stored) };
		Ok(STATUS_OK)
	})
}
