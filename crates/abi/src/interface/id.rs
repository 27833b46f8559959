// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

/// FFI-safe 128-bit interface identifier
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceIdFFI {
	/// Raw UUID bytes in RFC 4122 order
	pub bytes: [u8; 16],
}

impl InterfaceIdFFI {
	pub const fn from_bytes(bytes: [u8; 16]) -> Self {
		Self {
			bytes,
		}
	}
}

/// Private driver entry points relayed to the host table
pub const DRIVER_PRIVATE_ID: InterfaceIdFFI = InterfaceIdFFI::from_bytes([
	0x6b, 0xd5, 0xfb, 0x6c, 0x5b, 0xf4, 0xe7, 0x4a, 0x89, 0x87, 0xd9, 0x39, 0x12, 0xfd, 0x9d, 0xf9,
]);

/// Per-context keyed storage, relayed to the host store with wrapped values
pub const CONTEXT_STORAGE_ID: InterfaceIdFFI = InterfaceIdFFI::from_bytes([
	0xc6, 0x93, 0x33, 0x6e, 0x11, 0x21, 0xdf, 0x11, 0xa8, 0xc3, 0x68, 0xf3, 0x55, 0xd8, 0x95, 0x93,
]);

/// Lifecycle notification registry, implemented entirely by the shim
pub const NOTIFICATION_ID: InterfaceIdFFI = InterfaceIdFFI::from_bytes([
	0x19, 0x5b, 0xcb, 0xf4, 0xd6, 0x7d, 0x02, 0x4a, 0xac, 0xc5, 0x1d, 0x29, 0xce, 0xa6, 0x31, 0xae,
]);

/// Compatibility digest, implemented entirely by the shim
pub const COMPAT_DIGEST_ID: InterfaceIdFFI = InterfaceIdFFI::from_bytes([
	0xd4, 0x08, 0x20, 0x55, 0xbd, 0xe6, 0x70, 0x4b, 0x8d, 0x34, 0xba, 0x12, 0x3c, 0x66, 0xe1, 0xf2,
]);
