// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Guest callbacks delivered by the host through the calling-convention trampoline.

use std::{
	ffi::{CString, c_void},
	ptr,
	sync::atomic::{AtomicUsize, Ordering},
};

use abibridge_abi::{DRIVER_PRIVATE_ID, DriverPrivateGuestTable, STATUS_INVALID_VALUE, STATUS_OK, StreamHandle};
use abibridge_shim::{ProcessState, exports::abibridge_get_export_table};
use abibridge_testing::{FakeDriver, host};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

static STATE: Lazy<&'static ProcessState> = Lazy::new(|| ProcessState::new(FakeDriver::new()).install().unwrap());

// the trampoline has a single slot per process
static SERIAL: Mutex<()> = Mutex::new(());

fn private_table() -> &'static DriverPrivateGuestTable {
	Lazy::force(&STATE);
	let mut table = ptr::null();
	assert_eq!(unsafe { abibridge_get_export_table(&mut table, &DRIVER_PRIVATE_ID) }, STATUS_OK);
	unsafe { &*table.cast::<DriverPrivateGuestTable>() }
}

#[derive(Default)]
struct Delivery {
	first: AtomicUsize,
	second: AtomicUsize,
	stream: AtomicUsize,
	status: AtomicUsize,
}

unsafe extern "system" fn first_callback(stream: StreamHandle, status: i32, user_data: *mut c_void) {
	let delivery = unsafe { &*(user_data as *const Delivery) };
	delivery.first.fetch_add(1, Ordering::SeqCst);
	delivery.stream.store(stream as usize, Ordering::SeqCst);
	delivery.status.store(status as usize, Ordering::SeqCst);
}

unsafe extern "system" fn second_callback(_stream: StreamHandle, _status: i32, user_data: *mut c_void) {
	let delivery = unsafe { &*(user_data as *const Delivery) };
	delivery.second.fetch_add(1, Ordering::SeqCst);
}

fn user_data(delivery: &Delivery) -> *mut c_void {
	delivery as *const Delivery as *mut c_void
}

#[test]
fn test_guest_callback_delivered_through_trampoline() {
	let _serial = SERIAL.lock();
	let table = private_table();
	let delivery = Delivery::default();

	let launch = table.launch_host_callback.unwrap();
	let status = unsafe { launch(0x77 as StreamHandle, Some(first_callback), user_data(&delivery)) };

	assert_eq!(status, STATUS_OK);
	assert_eq!(delivery.first.load(Ordering::SeqCst), 1);
	assert_eq!(delivery.stream.load(Ordering::SeqCst), 0x77);
	assert_eq!(delivery.status.load(Ordering::SeqCst), STATUS_OK as usize);
	assert!(STATE.host_callback().is_armed());
}

#[test]
fn test_rearming_replaces_the_guest_callback() {
	let _serial = SERIAL.lock();
	let table = private_table();
	let delivery = Delivery::default();
	let launch = table.launch_host_callback.unwrap();

	assert_eq!(unsafe { launch(ptr::null_mut(), Some(first_callback), user_data(&delivery)) }, STATUS_OK);
	assert_eq!(unsafe { launch(ptr::null_mut(), Some(second_callback), user_data(&delivery)) }, STATUS_OK);

	assert_eq!(delivery.first.load(Ordering::SeqCst), 1);
	assert_eq!(delivery.second.load(Ordering::SeqCst), 1);
}

#[test]
fn test_missing_callback_is_passed_through() {
	let _serial = SERIAL.lock();
	let table = private_table();

	let status = unsafe { (table.launch_host_callback.unwrap())(ptr::null_mut(), None, ptr::null_mut()) };
	assert_eq!(status, STATUS_INVALID_VALUE);
}

#[test]
fn test_full_size_table_exposes_every_slot() {
	let table = private_table();
	assert_eq!(table.size, size_of::<DriverPrivateGuestTable>());

	let name = CString::new("abibridge.phase").unwrap();
	assert_eq!(unsafe { (table.profiler_mark.unwrap())(name.as_ptr()) }, STATUS_OK);
	assert_eq!(host::profiler_marks(), vec!["abibridge.phase".to_string()]);

	assert_eq!(unsafe { (table.context_synchronize.unwrap())(ptr::null_mut()) }, STATUS_OK);
	assert_eq!(host::host_calls("context_synchronize"), 1);
}
