// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

//! Status codes and flags shared across the ABI

/// Operation completed successfully
pub const STATUS_OK: i32 = 0;

/// An argument was null or out of range
pub const STATUS_INVALID_VALUE: i32 = 1;

/// A shim-side allocation failed
pub const STATUS_OUT_OF_MEMORY: i32 = 2;

/// The shim has not been initialised for this process
pub const STATUS_NOT_INITIALIZED: i32 = 3;

/// The requested symbol, interface, key or handle does not exist
pub const STATUS_NOT_FOUND: i32 = 500;

/// The capability exists in the ABI but the loaded driver does not provide it
pub const STATUS_NOT_SUPPORTED: i32 = 801;

/// Unexpected failure inside the shim
pub const STATUS_UNKNOWN: i32 = 999;

/// Symbol lookup flag: default stream semantics
pub const PROC_FLAG_DEFAULT: u64 = 0;

/// Symbol lookup flag: legacy default stream
pub const PROC_FLAG_LEGACY_STREAM: u64 = 1 << 0; // 0x01

/// Symbol lookup flag: per-thread default stream
pub const PROC_FLAG_PER_THREAD_STREAM: u64 = 1 << 1; // 0x02

/// Size in bytes of a compatibility digest
pub const DIGEST_LEN: usize = 16;
