// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Per-context keyed storage with destructor forwarding
//!
//! Values live in the host's own keyed store, but the host never sees a guest value or a
//! guest destructor. Each value is wrapped in a [`StorageEntry`] and the host is given
//! [`storage_entry_destructor`], a host-convention destructor that unwraps the entry, runs
//! the guest destructor with the original `(owner, key, value)` and frees the entry.
//!
//! A concurrent `remove` and host-driven destruction of the same key can both act on one
//! entry. No extra synchronisation guards against that.

use std::{
	alloc::{Layout, alloc, dealloc},
	ffi::c_void,
	panic::{AssertUnwindSafe, catch_unwind},
	ptr,
};

use abibridge_abi::{ContextHandle, GuestStorageDestructorFn, HostStorageDestructorFn};
use tracing::{error, trace};

use crate::error::{Error, Result};

/// The host's keyed store, as seen by [`KeyedStorage`]
pub trait HostStore {
	fn set(
		&self,
		owner: ContextHandle,
		key: *mut c_void,
		value: *mut c_void,
		destructor: Option<HostStorageDestructorFn>,
	) -> Result<()>;

	fn get(&self, owner: ContextHandle, key: *mut c_void) -> Result<*mut c_void>;

	fn remove(&self, owner: ContextHandle, key: *mut c_void) -> Result<()>;
}

/// The wrapper the host stores in place of a guest value
#[repr(C)]
#[derive(Debug)]
pub struct StorageEntry {
	pub value: *mut c_void,
	pub destructor: Option<GuestStorageDestructorFn>,
}

impl StorageEntry {
	const LAYOUT: Layout = Layout::new::<StorageEntry>();

	/// Allocate an entry without aborting on allocation failure
	fn allocate(value: *mut c_void, destructor: Option<GuestStorageDestructorFn>) -> Result<*mut StorageEntry> {
		let entry = unsafe { alloc(Self::LAYOUT) }.cast::<StorageEntry>();
		if entry.is_null() {
			return Err(Error::ResourceExhaustion("storage entry"));
		}
		unsafe {
			entry.write(StorageEntry {
				value,
				destructor,
			})
		};
		Ok(entry)
	}

	/// # Safety
	/// `entry` must come from [`StorageEntry::allocate`] and not have been freed.
	unsafe fn free(entry: *mut StorageEntry) {
		unsafe { dealloc(entry.cast(), Self::LAYOUT) };
	}
}

/// Keyed storage delegating to a host store
pub struct KeyedStorage<H> {
	host: H,
}

impl<H: HostStore> KeyedStorage<H> {
	pub fn new(host: H) -> Self {
		Self {
			host,
		}
	}

	/// Store `value` under `(owner, key)`
	///
	/// If the host rejects the entry, it is freed again and the host status is returned.
	pub fn set(
		&self,
		owner: ContextHandle,
		key: *mut c_void,
		value: *mut c_void,
		destructor: Option<GuestStorageDestructorFn>,
	) -> Result<()> {
		let entry = StorageEntry::allocate(value, destructor)?;

		if let Err(err) = self.host.set(owner, key, entry.cast(), Some(storage_entry_destructor)) {
			unsafe { StorageEntry::free(entry) };
			return Err(err);
		}

		trace!(?owner, ?key, ?entry, "storage entry set");
		Ok(())
	}

	pub fn get(&self, owner: ContextHandle, key: *mut c_void) -> Result<*mut c_void> {
		let entry = self.entry(owner, key)?;
		Ok(unsafe { (*entry).value })
	}

	/// Remove the value under `(owner, key)`
	///
	/// When the entry can be fetched it is freed after the host call whatever the host
	/// returns. The guest destructor runs only when the host actually removed the value.
	pub fn remove(&self, owner: ContextHandle, key: *mut c_void) -> Result<()> {
		let entry = self.entry(owner, key).ok();
		let removed = self.host.remove(owner, key);

		if let Some(entry) = entry {
			let StorageEntry {
				value,
				destructor,
			} = unsafe { entry.read() };

			if removed.is_ok()
				&& let Some(destructor) = destructor
			{
				unsafe { destructor(owner, key, value) };
			}
			unsafe { StorageEntry::free(entry) };
			trace!(?owner, ?key, ?entry, "storage entry removed");
		}

		removed
	}

	fn entry(&self, owner: ContextHandle, key: *mut c_void) -> Result<*mut StorageEntry> {
		let entry = self.host.get(owner, key)?.cast::<StorageEntry>();
		if entry.is_null() {
			return Err(Error::NotFound);
		}
		Ok(entry)
	}
}

/// Host-convention destructor handed to the host with every entry
///
/// # Safety
/// `value` must be a live [`StorageEntry`] created by [`KeyedStorage::set`].
pub unsafe extern "C" fn storage_entry_destructor(owner: ContextHandle, key: *mut c_void, value: *mut c_void) {
	let entry = value.cast::<StorageEntry>();
	if entry.is_null() {
		return;
	}

	let result = catch_unwind(AssertUnwindSafe(|| {
		let StorageEntry {
			value,
			destructor,
		} = unsafe { ptr::read(entry) };

		if let Some(destructor) = destructor {
			unsafe { destructor(owner, key, value) };
		}
		unsafe { StorageEntry::free(entry) };
	}));

	if let Err(e) = result {
		error!(?e, "panic in storage_entry_destructor");
	}
}
