// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Context storage relayed to the driver's keyed store.

use std::{ffi::c_void, ptr};

use abibridge_abi::{
	CONTEXT_STORAGE_ID, ContextHandle, ContextStorageGuestTable, STATUS_INVALID_VALUE, STATUS_NOT_FOUND, STATUS_OK,
};
use abibridge_shim::{ProcessState, exports::abibridge_get_export_table};
use abibridge_testing::{FakeDriver, host};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

static STATE: Lazy<&'static ProcessState> = Lazy::new(|| ProcessState::new(FakeDriver::new()).install().unwrap());

static DESTROYED: Mutex<Vec<(usize, usize, usize)>> = Mutex::new(Vec::new());

unsafe extern "system" fn record_destroy(owner: ContextHandle, key: *mut c_void, value: *mut c_void) {
	DESTROYED.lock().push((owner as usize, key as usize, value as usize));
}

fn destroyed_for(owner: usize) -> Vec<(usize, usize, usize)> {
	DESTROYED.lock().iter().filter(|(o, _, _)| *o == owner).copied().collect()
}

fn storage_table() -> &'static ContextStorageGuestTable {
	Lazy::force(&STATE);
	let mut table = ptr::null();
	assert_eq!(unsafe { abibridge_get_export_table(&mut table, &CONTEXT_STORAGE_ID) }, STATUS_OK);
	unsafe { &*table.cast::<ContextStorageGuestTable>() }
}

fn handle(n: usize) -> *mut c_void {
	n as *mut c_void
}

fn get(owner: usize, key: usize) -> (i32, *mut c_void) {
	let mut value = ptr::null_mut();
	let status = unsafe { (storage_table().get.unwrap())(&mut value, handle(owner), handle(key)) };
	(status, value)
}

#[test]
fn test_set_get_remove() {
	let table = storage_table();
	let (owner, key) = (0x1000, 0x1);

	assert_eq!(unsafe { (table.set.unwrap())(handle(owner), handle(key), handle(0xfeed), None) }, STATUS_OK);
	assert_eq!(get(owner, key), (STATUS_OK, handle(0xfeed)));
	assert_eq!(host::stored_entries(handle(owner)), 1);

	assert_eq!(unsafe { (table.remove.unwrap())(handle(owner), handle(key)) }, STATUS_OK);
	assert_eq!(get(owner, key), (STATUS_NOT_FOUND, ptr::null_mut()));
	assert_eq!(host::stored_entries(handle(owner)), 0);
}

#[test]
fn test_overwrite_returns_latest_value() {
	let table = storage_table();
	let (owner, key) = (0x2000, 0x2);

	assert_eq!(unsafe { (table.set.unwrap())(handle(owner), handle(key), handle(1), None) }, STATUS_OK);
	assert_eq!(unsafe { (table.set.unwrap())(handle(owner), handle(key), handle(2), None) }, STATUS_OK);
	assert_eq!(get(owner, key), (STATUS_OK, handle(2)));
}

#[test]
fn test_context_destruction_runs_each_destructor_once() {
	let table = storage_table();
	let owner = 0x3000;

	for key in 1..=3 {
		let status = unsafe { (table.set.unwrap())(handle(owner), handle(key), handle(0xa0 + key), Some(record_destroy)) };
		assert_eq!(status, STATUS_OK);
	}

	assert_eq!(host::destroy_context(handle(owner)), 3);

	let mut destroyed = destroyed_for(owner);
	destroyed.sort();
	assert_eq!(destroyed, vec![(owner, 1, 0xa1), (owner, 2, 0xa2), (owner, 3, 0xa3)]);

	assert_eq!(host::destroy_context(handle(owner)), 0);
	assert_eq!(destroyed_for(owner).len(), 3);
}

#[test]
fn test_remove_runs_destructor_once() {
	let table = storage_table();
	let owner = 0x4000;

	assert_eq!(unsafe { (table.set.unwrap())(handle(owner), handle(9), handle(0x99), Some(record_destroy)) }, STATUS_OK);
	assert_eq!(unsafe { (table.remove.unwrap())(handle(owner), handle(9)) }, STATUS_OK);
	assert_eq!(host::destroy_context(handle(owner)), 0);

	assert_eq!(destroyed_for(owner), vec![(owner, 9, 0x99)]);
}

#[test]
fn test_rejected_set_returns_host_status() {
	let table = storage_table();
	let owner = 0x5000;
	host::reject_sets_for(handle(owner), 304);

	let status = unsafe { (table.set.unwrap())(handle(owner), handle(1), handle(7), Some(record_destroy)) };
	assert_eq!(status, 304);
	assert_eq!(host::stored_entries(handle(owner)), 0);
	assert!(destroyed_for(owner).is_empty());
}

#[test]
fn test_remove_unknown_key_returns_host_status() {
	let table = storage_table();
	assert_eq!(unsafe { (table.remove.unwrap())(handle(0x6000), handle(1)) }, STATUS_NOT_FOUND);
}

#[test]
fn test_get_requires_output() {
	let table = storage_table();
	let status = unsafe { (table.get.unwrap())(ptr::null_mut(), handle(0x7000), handle(1)) };
	assert_eq!(status, STATUS_INVALID_VALUE);
}
