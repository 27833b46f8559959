// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

//! Callback signatures passed between guest, shim and host

use core::ffi::c_void;

/// Opaque per-context owner handle
pub type ContextHandle = *mut c_void;

/// Opaque stream handle
pub type StreamHandle = *mut c_void;

/// Guest callback delivered once a stream reaches a host callback launch
///
/// # Parameters
/// - `stream`: Stream the callback was launched on
/// - `status`: Status of the stream at delivery time
/// - `user_data`: Pointer supplied at launch, passed back unchanged
pub type GuestHostCallbackFn = unsafe extern "system" fn(stream: StreamHandle, status: i32, user_data: *mut c_void);

/// Host-convention twin of [`GuestHostCallbackFn`]
pub type HostHostCallbackFn = unsafe extern "C" fn(stream: StreamHandle, status: i32, user_data: *mut c_void);

/// Guest destructor for a keyed storage value
///
/// Invoked with the original `(owner, key, value)` triple when the value is removed or its
/// owning context is destroyed.
pub type GuestStorageDestructorFn = unsafe extern "system" fn(owner: ContextHandle, key: *mut c_void, value: *mut c_void);

/// Host-convention destructor the native driver calls when a context is destroyed
pub type HostStorageDestructorFn = unsafe extern "C" fn(owner: ContextHandle, key: *mut c_void, value: *mut c_void);

/// Guest callback for lifecycle notifications
///
/// # Parameters
/// - `user_data`: Pointer supplied at registration, passed back unchanged
pub type NotificationCallbackFn = unsafe extern "system" fn(user_data: *mut c_void);
