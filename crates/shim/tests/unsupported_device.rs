// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! A driver lacking PCI location support, installed with a reduced export table.

use std::{
	ffi::{CString, c_void},
	ptr,
};

use abibridge_abi::{
	COMPAT_DIGEST_ID, CompatDigestTable, DIGEST_LEN, PROC_FLAG_DEFAULT, STATUS_NOT_FOUND, STATUS_NOT_SUPPORTED,
	STATUS_OK,
};
use abibridge_shim::{
	Error, ProcessState,
	digest::DigestInput,
	exports::{abibridge_get_export_table, abibridge_get_proc_address},
	resolver::{SymbolPtr, SymbolResolver, VersionedSymbol},
};
use abibridge_testing::{FakeDevice, FakeDriver};
use once_cell::sync::Lazy;

fn driver() -> FakeDriver {
	FakeDriver::new().without_pci_location().with_device(FakeDevice::new([7; 16], 0, 0x65, 0))
}

fn resolver() -> SymbolResolver {
	SymbolResolver::new(vec![VersionedSymbol::new(
		"abibridge_get_export_table",
		3000,
		PROC_FLAG_DEFAULT,
		SymbolPtr::new(abibridge_get_export_table as *const c_void),
	)])
}

static STATE: Lazy<&'static ProcessState> =
	Lazy::new(|| ProcessState::new(driver()).with_resolver(resolver()).install().unwrap());

fn digest_table() -> &'static CompatDigestTable {
	Lazy::force(&STATE);
	let mut table = ptr::null();
	assert_eq!(unsafe { abibridge_get_export_table(&mut table, &COMPAT_DIGEST_ID) }, STATUS_OK);
	unsafe { &*table.cast::<CompatDigestTable>() }
}

#[test]
fn test_compute_reports_not_supported() {
	let mut digest = [0xaa; DIGEST_LEN];
	let status = unsafe { (digest_table().compute.unwrap())(&mut digest, 12023, 0) };
	assert_eq!(status, STATUS_NOT_SUPPORTED);
}

#[test]
fn test_collect_reports_missing_pci_location() {
	assert!(matches!(
		DigestInput::collect(&driver(), 12023, 0),
		Err(Error::Unsupported("device_get_pci_location"))
	));
	assert!(matches!(STATE.compat_digest(12023, 0), Err(Error::Unsupported(_))));
}

#[test]
fn test_installed_resolver_replaces_builtin_table() {
	Lazy::force(&STATE);
	assert_eq!(STATE.resolver().len(), 1);

	let lookup = |name: &str, version: u32| {
		let name = CString::new(name).unwrap();
		let mut out = ptr::null();
		let status = unsafe { abibridge_get_proc_address(name.as_ptr(), &mut out, version, PROC_FLAG_DEFAULT) };
		(status, out)
	};

	assert_eq!(
		lookup("abibridge_get_export_table", 3000),
		(STATUS_OK, abibridge_get_export_table as *const c_void)
	);
	assert_eq!(lookup("abibridge_driver_get_version", 2020), (STATUS_NOT_FOUND, ptr::null()));
}
