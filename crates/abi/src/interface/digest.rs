// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use crate::constants::DIGEST_LEN;

/// Compatibility digest interface, implemented entirely by the shim
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CompatDigestTable {
	/// Declared size of this table in bytes
	pub size: usize,

	/// Compute the compatibility digest for the calling process
	///
	/// The shim supplies driver version, process and thread identity, salts and the visible
	/// devices itself.
	///
	/// # Parameters
	/// - `digest`: Receives the 16-byte digest
	/// - `runtime_version`: Version of the calling runtime
	/// - `timestamp`: Caller-chosen timestamp mixed into the digest
	pub compute:
		Option<unsafe extern "system" fn(digest: *mut [u8; DIGEST_LEN], runtime_version: u32, timestamp: u64) -> i32>,
}
