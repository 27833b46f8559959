// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Compatibility digest interface

use std::mem::size_of;

use abibridge_abi::{CompatDigestTable, DIGEST_LEN, STATUS_OK};

use crate::{error::Error, exports::guarded, state::ProcessState};

pub(super) static TABLE: CompatDigestTable = CompatDigestTable {
	size: size_of::<CompatDigestTable>(),
	compute: Some(compute),
};

unsafe extern "system" fn compute(digest: *mut [u8; DIGEST_LEN], runtime_version: u32, timestamp: u64) -> i32 {
	guarded("compute", || {
		if digest.is_null() {
			return Err(Error::InvalidValue("digest"));
		}
		let value = ProcessState::current()?.compat_digest(runtime_version, timestamp)?;
		unsafe { digest.write_unaligned(value) };
		Ok(STATUS_OK)
	})
}
