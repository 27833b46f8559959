// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Symbol rows served by the shim

use std::ffi::c_void;

use abibridge_abi::{PROC_FLAG_DEFAULT, PROC_FLAG_LEGACY_STREAM, PROC_FLAG_PER_THREAD_STREAM};

use super::{SymbolPtr, VersionedSymbol};
use crate::exports::{
	abibridge_driver_get_version, abibridge_get_export_table, abibridge_get_proc_address, abibridge_thread_detach,
};

/// The fixed symbol table, one row per supported `(name, version, flags)`
pub fn builtin_symbols() -> Vec<VersionedSymbol> {
	let export_table = SymbolPtr::new(abibridge_get_export_table as *const c_void);
	let proc_address = SymbolPtr::new(abibridge_get_proc_address as *const c_void);
	let driver_version = SymbolPtr::new(abibridge_driver_get_version as *const c_void);
	let thread_detach = SymbolPtr::new(abibridge_thread_detach as *const c_void);

	vec![
		VersionedSymbol::new("abibridge_get_export_table", 3000, PROC_FLAG_DEFAULT, export_table),
		VersionedSymbol::new("abibridge_get_proc_address", 3000, PROC_FLAG_DEFAULT, proc_address),
		VersionedSymbol::new("abibridge_get_proc_address", 12000, PROC_FLAG_DEFAULT, proc_address),
		VersionedSymbol::new("abibridge_get_proc_address", 12000, PROC_FLAG_LEGACY_STREAM, proc_address),
		VersionedSymbol::new("abibridge_get_proc_address", 12000, PROC_FLAG_PER_THREAD_STREAM, proc_address),
		VersionedSymbol::new("abibridge_driver_get_version", 2020, PROC_FLAG_DEFAULT, driver_version),
		VersionedSymbol::new("abibridge_thread_detach", 3000, PROC_FLAG_DEFAULT, thread_detach),
	]
}
