// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Host-convention slot implementations backed by process-wide fakes

use std::{
	collections::HashMap,
	ffi::{CStr, c_char, c_void},
};

use abibridge_abi::{
	ContextHandle, ContextStorageHostTable, DriverPrivateHostTable, HostHostCallbackFn, HostStorageDestructorFn,
	STATUS_INVALID_VALUE, STATUS_NOT_FOUND, STATUS_OK, StreamHandle,
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Context reported by `context_get_current`
pub const CURRENT_CONTEXT: usize = 0xc0_0000;

/// Granularity of the fake address ranges
pub const ALLOCATION_GRANULARITY: u64 = 0x1000;

/// Loading mode reported by `module_get_loading_mode`
pub const LOADING_MODE_LAZY: i32 = 1;

static CALLS: Lazy<Mutex<HashMap<&'static str, usize>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static CONTEXT_FLAGS: Lazy<Mutex<HashMap<usize, u32>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static PROFILER_MARKS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(Vec::new()));

type StoredValue = (usize, Option<HostStorageDestructorFn>);

static CONTEXT_STORE: Lazy<Mutex<HashMap<(usize, usize), StoredValue>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static REJECTED_OWNERS: Lazy<Mutex<HashMap<usize, i32>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn record(slot: &'static str) {
	*CALLS.lock().entry(slot).or_default() += 1;
}

/// Times the host slot `slot` has been invoked in this process
pub fn host_calls(slot: &str) -> usize {
	CALLS.lock().get(slot).copied().unwrap_or(0)
}

pub fn profiler_marks() -> Vec<String> {
	PROFILER_MARKS.lock().clone()
}

/// Make every host `set` for `owner` fail with `status`
pub fn reject_sets_for(owner: ContextHandle, status: i32) {
	REJECTED_OWNERS.lock().insert(owner as usize, status);
}

/// Values the host currently stores for `owner`
pub fn stored_entries(owner: ContextHandle) -> usize {
	CONTEXT_STORE.lock().keys().filter(|(o, _)| *o == owner as usize).count()
}

/// Destroy a context: drop its stored values and run their destructors
///
/// Returns the number of values dropped.
pub fn destroy_context(owner: ContextHandle) -> usize {
	let doomed: Vec<((usize, usize), StoredValue)> = {
		let mut store = CONTEXT_STORE.lock();
		let keys: Vec<(usize, usize)> = store.keys().filter(|(o, _)| *o == owner as usize).copied().collect();
		keys.into_iter().filter_map(|key| store.remove(&key).map(|value| (key, value))).collect()
	};

	for ((owner, key), (value, destructor)) in &doomed {
		if let Some(destructor) = destructor {
			unsafe { destructor(*owner as ContextHandle, *key as *mut c_void, *value as *mut c_void) };
		}
	}
	doomed.len()
}

pub fn private_table() -> DriverPrivateHostTable {
	DriverPrivateHostTable {
		size: size_of::<DriverPrivateHostTable>(),
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
	}
}

pub fn storage_table() -> ContextStorageHostTable {
	ContextStorageHostTable {
		size: size_of::<ContextStorageHostTable>(),
		set: Some(storage_set),
		remove: Some(storage_remove),
		get: Some(storage_get),
	}
}

unsafe extern "C" fn context_get_current(ctx: *mut ContextHandle) -> i32 {
	record("context_get_current");
	if ctx.is_null() {
		return STATUS_INVALID_VALUE;
	}
	unsafe { ctx.write(CURRENT_CONTEXT as ContextHandle) };
	STATUS_OK
}

unsafe extern "C" fn context_get_flags(ctx: ContextHandle, flags: *mut u32) -> i32 {
	record("context_get_flags");
	if flags.is_null() {
		return STATUS_INVALID_VALUE;
	}
	let value = CONTEXT_FLAGS.lock().get(&(ctx as usize)).copied().unwrap_or(0);
	unsafe { flags.write(value) };
	STATUS_OK
}

unsafe extern "C" fn context_set_flags(ctx: ContextHandle, flags: u32) -> i32 {
	record("context_set_flags");
	CONTEXT_FLAGS.lock().insert(ctx as usize, flags);
	STATUS_OK
}

unsafe extern "C" fn device_get_attribute(value: *mut i32, attribute: i32, device: i32) -> i32 {
	record("device_get_attribute");
	if value.is_null() || device < 0 {
		return STATUS_INVALID_VALUE;
	}
	unsafe { value.write(attribute * 100 + device) };
	STATUS_OK
}

unsafe extern "C" fn module_get_loading_mode(mode: *mut i32) -> i32 {
	record("module_get_loading_mode");
	if mode.is_null() {
		return STATUS_INVALID_VALUE;
	}
	unsafe { mode.write(LOADING_MODE_LAZY) };
	STATUS_OK
}

unsafe extern "C" fn stream_get_id(stream: StreamHandle, id: *mut u64) -> i32 {
	record("stream_get_id");
	if id.is_null() {
		return STATUS_INVALID_VALUE;
	}
	unsafe { id.write(stream as u64 + 1) };
	STATUS_OK
}

unsafe extern "C" fn memory_get_address_range(base: *mut u64, size: *mut usize, address: u64) -> i32 {
	record("memory_get_address_range");
	if base.is_null() || size.is_null() {
		return STATUS_INVALID_VALUE;
	}
	unsafe {
		base.write(address & !(ALLOCATION_GRANULARITY - 1));
		size.write(ALLOCATION_GRANULARITY as usize);
	}
	STATUS_OK
}

/// Delivers the callback synchronously, on the launching thread
unsafe extern "C" fn launch_host_callback(
	stream: StreamHandle,
	callback: Option<HostHostCallbackFn>,
	user_data: *mut c_void,
) -> i32 {
	record("launch_host_callback");
	let Some(callback) = callback else {
		return STATUS_INVALID_VALUE;
	};
	unsafe { callback(stream, STATUS_OK, user_data) };
	STATUS_OK
}

unsafe extern "C" fn profiler_mark(name: *const c_char) -> i32 {
	record("profiler_mark");
	if name.is_null() {
		return STATUS_INVALID_VALUE;
	}
	let name = unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned();
	PROFILER_MARKS.lock().push(name);
	STATUS_OK
}

unsafe extern "C" fn context_synchronize(_ctx: ContextHandle) -> i32 {
	record("context_synchronize");
	STATUS_OK
}

unsafe extern "C" fn storage_set(
	owner: ContextHandle,
	key: *mut c_void,
	value: *mut c_void,
	destructor: Option<HostStorageDestructorFn>,
) -> i32 {
	record("set");
	if let Some(status) = REJECTED_OWNERS.lock().get(&(owner as usize)) {
		return *status;
	}
	CONTEXT_STORE.lock().insert((owner as usize, key as usize), (value as usize, destructor));
	STATUS_OK
}

unsafe extern "C" fn storage_remove(owner: ContextHandle, key: *mut c_void) -> i32 {
	record("remove");
	match CONTEXT_STORE.lock().remove(&(owner as usize, key as usize)) {
		Some(_) => STATUS_OK,
		None => STATUS_NOT_FOUND,
	}
}

unsafe extern "C" fn storage_get(value: *mut *mut c_void, owner: ContextHandle, key: *mut c_void) -> i32 {
	record("get");
	if value.is_null() {
		return STATUS_INVALID_VALUE;
	}
	match CONTEXT_STORE.lock().get(&(owner as usize, key as usize)) {
		Some((stored, _)) => {
			unsafe { value.write(*stored as *mut c_void) };
			STATUS_OK
		}
		None => STATUS_NOT_FOUND,
	}
}
