// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Compatibility digest computed through its interface table.

use std::ptr;

use abibridge_abi::{COMPAT_DIGEST_ID, CompatDigestTable, DIGEST_LEN, STATUS_INVALID_VALUE, STATUS_OK};
use abibridge_shim::{
	ProcessState,
	digest::{DigestInput, compat_digest},
	exports::abibridge_get_export_table,
};
use abibridge_testing::{FakeDevice, FakeDriver};
use once_cell::sync::Lazy;

const DRIVER_VERSION: i32 = 12042;

fn driver() -> FakeDriver {
	FakeDriver::new()
		.with_driver_version(DRIVER_VERSION)
		.with_device(FakeDevice::new(std::array::from_fn(|i| i as u8), 0, 0x65, 0))
		.with_device(FakeDevice::new([0xff; 16], 0, 0x66, 0).failing(101))
		.with_device(FakeDevice::new(std::array::from_fn(|i| 16 + i as u8), 1, 0x17, 3))
}

static STATE: Lazy<&'static ProcessState> = Lazy::new(|| ProcessState::new(driver()).install().unwrap());

fn digest_table() -> &'static CompatDigestTable {
	Lazy::force(&STATE);
	let mut table = ptr::null();
	assert_eq!(unsafe { abibridge_get_export_table(&mut table, &COMPAT_DIGEST_ID) }, STATUS_OK);
	unsafe { &*table.cast::<CompatDigestTable>() }
}

fn compute(runtime_version: u32, timestamp: u64) -> [u8; DIGEST_LEN] {
	let mut digest = [0u8; DIGEST_LEN];
	let status = unsafe { (digest_table().compute.unwrap())(&mut digest, runtime_version, timestamp) };
	assert_eq!(status, STATUS_OK);
	digest
}

#[test]
fn test_table_matches_direct_computation() {
	let through_table = compute(12023, 1_700_000_000);

	let input = DigestInput::collect(STATE.driver(), 12023, 1_700_000_000).unwrap();
	assert_eq!(input.driver_version, DRIVER_VERSION as u32);
	assert_eq!(input.process_id, std::process::id());
	assert_eq!(through_table, compat_digest(&input));
}

#[test]
fn test_failing_device_is_not_visible() {
	let input = DigestInput::collect(STATE.driver(), 12023, 0).unwrap();

	assert_eq!(input.devices.len(), 2);
	assert_eq!(input.devices[1].pci_bus, 0x17);
	assert_eq!(&input.record()[40..44], &2u32.to_le_bytes());
}

#[test]
fn test_same_thread_is_deterministic() {
	assert_eq!(compute(12025, 99), compute(12025, 99));
	assert_ne!(compute(12025, 99), compute(12025, 100));
}

#[test]
fn test_fixed_digest_versions() {
	let fixed = compute(12000, 1);
	assert_eq!(compute(12010, 2), fixed);

	let patched = compute(12001, 3);
	assert_eq!(patched[7], 24);
	assert_eq!(patched[..7], fixed[..7]);
	assert_eq!(patched[8..], fixed[8..]);
}

#[test]
fn test_null_output_is_invalid() {
	let status = unsafe { (digest_table().compute.unwrap())(ptr::null_mut(), 12023, 0) };
	assert_eq!(status, STATUS_INVALID_VALUE);
}
