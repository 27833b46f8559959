// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::path::PathBuf;

use abibridge_abi::{
	STATUS_INVALID_VALUE, STATUS_NOT_FOUND, STATUS_NOT_INITIALIZED, STATUS_NOT_SUPPORTED, STATUS_OUT_OF_MEMORY,
	STATUS_UNKNOWN,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Expected and non-fatal: the symbol, interface, key or handle does not exist
	#[error("not found")]
	NotFound,

	/// The driver does not provide an optional capability
	#[error("`{0}` is not supported by the loaded driver")]
	Unsupported(&'static str),

	/// A shim-side allocation failed; no shared state was changed
	#[error("out of memory while allocating {0}")]
	ResourceExhaustion(&'static str),

	/// The native driver reported a failure, carried verbatim
	#[error("driver reported status {0}")]
	Host(i32),

	/// A required driver symbol is missing
	#[error("required driver symbol `{symbol}` is missing")]
	FatalInit {
		symbol: String,
	},

	#[error("failed to load driver library {}: {source}", path.display())]
	Library {
		path: PathBuf,
		#[source]
		source: libloading::Error,
	},

	#[error("invalid value: {0}")]
	InvalidValue(&'static str),

	#[error("process state is not installed")]
	NotInstalled,

	#[error("process state is already installed")]
	AlreadyInstalled,

	#[error("invalid configuration: {0}")]
	Config(String),
}

impl Error {
	/// Status code reported across the ABI for this error
	pub fn status(&self) -> i32 {
		match self {
			Error::NotFound => STATUS_NOT_FOUND,
			Error::Unsupported(_) => STATUS_NOT_SUPPORTED,
			Error::ResourceExhaustion(_) => STATUS_OUT_OF_MEMORY,
			Error::Host(code) => *code,
			Error::InvalidValue(_) => STATUS_INVALID_VALUE,
			Error::NotInstalled => STATUS_NOT_INITIALIZED,
			Error::FatalInit {
				..
			}
			| Error::Library {
				..
			}
			| Error::AlreadyInstalled
			| Error::Config(_) => STATUS_UNKNOWN,
		}
	}

	/// Interpret a driver status, treating 0 as success
	pub fn check_host(code: i32) -> Result<()> {
		if code == 0 {
			Ok(())
		} else {
			Err(Error::Host(code))
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;
