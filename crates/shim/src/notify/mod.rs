// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Lifecycle notification registry
//!
//! Implemented entirely by the shim. Every registration carries a reference count that
//! starts at 1 for registry membership; dispatch holds a temporary reference around each
//! invocation. Registrations are never freed while a dispatch is running: dispatch and
//! unregister only mark them, and the last dispatch to finish sweeps everything whose count
//! reached zero.
//!
//! The lock is released around every callback, so callbacks may register and unregister
//! reentrantly.

mod arena;

use std::{
	ffi::c_void,
	sync::atomic::{AtomicUsize, Ordering},
};

pub use arena::SlotHandle;
use abibridge_abi::NotificationCallbackFn;
use arena::Arena;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Opaque user data passed back to a callback
#[derive(Debug, Clone, Copy)]
struct UserData(*mut c_void);

// SAFETY: the registry never dereferences user data; it only hands it back to the callback
unsafe impl Send for UserData {}

struct Registration {
	callback: NotificationCallbackFn,
	user_data: UserData,
	ref_count: usize,
	registered: bool,
}

struct Inner {
	registrations: Arena<Registration>,
	/// Registration order; only appended to while a dispatch is running
	order: Vec<SlotHandle>,
	dispatching: usize,
}

impl Inner {
	fn release(&mut self, handle: SlotHandle) {
		self.order.retain(|h| *h != handle);
		self.registrations.remove(handle);
	}

	fn sweep(&mut self) {
		let Inner {
			registrations,
			order,
			..
		} = self;

		order.retain(|handle| {
			let dead = registrations.get(*handle).is_none_or(|r| r.ref_count == 0);
			if dead {
				registrations.remove(*handle);
			}
			!dead
		});
	}
}

pub struct NotificationRegistry {
	inner: Mutex<Inner>,
	/// Registered callbacks, readable without the lock
	registered: AtomicUsize,
}

impl NotificationRegistry {
	pub fn new() -> Self {
		Self {
			inner: Mutex::new(Inner {
				registrations: Arena::new(),
				order: Vec::new(),
				dispatching: 0,
			}),
			registered: AtomicUsize::new(0),
		}
	}

	pub fn register(&self, callback: NotificationCallbackFn, user_data: *mut c_void) -> Result<SlotHandle> {
		let mut inner = self.inner.lock();

		inner.order.try_reserve(1).map_err(|_| Error::ResourceExhaustion("callback registration"))?;
		let handle = inner.registrations.try_insert(Registration {
			callback,
			user_data: UserData(user_data),
			ref_count: 1,
			registered: true,
		})?;
		inner.order.push(handle);
		self.registered.fetch_add(1, Ordering::Release);

		debug!(handle = handle.into_raw(), "notification callback registered");
		Ok(handle)
	}

	/// Drop the registry's reference to a registration
	///
	/// An in-flight invocation of the same callback still completes; the registration is
	/// freed once that dispatch releases it.
	pub fn unregister(&self, handle: SlotHandle) -> Result<()> {
		let mut inner = self.inner.lock();
		let dispatching = inner.dispatching;

		let registration = inner.registrations.get_mut(handle).filter(|r| r.registered).ok_or(Error::NotFound)?;
		registration.registered = false;
		registration.ref_count -= 1;
		let released = registration.ref_count == 0 && dispatching == 0;

		if released {
			inner.release(handle);
		}
		self.registered.fetch_sub(1, Ordering::Release);

		debug!(handle = handle.into_raw(), released, "notification callback unregistered");
		Ok(())
	}

	/// Invoke every registered callback once, in registration order
	///
	/// Callbacks registered during the dispatch are first invoked by the next one.
	pub fn dispatch(&self) {
		if self.registered.load(Ordering::Acquire) == 0 {
			return;
		}

		let end = {
			let mut inner = self.inner.lock();
			inner.dispatching += 1;
			inner.order.len()
		};

		for position in 0..end {
			let target = {
				let mut inner = self.inner.lock();
				let handle = inner.order[position];
				inner.registrations.get_mut(handle).filter(|r| r.registered).map(|r| {
					r.ref_count += 1;
					(handle, r.callback, r.user_data)
				})
			};

			let Some((handle, callback, user_data)) = target else {
				continue;
			};

			trace!(handle = handle.into_raw(), "notification dispatch");
			unsafe { callback(user_data.0) };

			let mut inner = self.inner.lock();
			if let Some(registration) = inner.registrations.get_mut(handle) {
				registration.ref_count -= 1;
			}
		}

		let mut inner = self.inner.lock();
		inner.dispatching -= 1;
		if inner.dispatching == 0 {
			inner.sweep();
		}
	}

	/// Registered callbacks
	pub fn len(&self) -> usize {
		self.registered.load(Ordering::Acquire)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl Default for NotificationRegistry {
	fn default() -> Self {
		Self::new()
	}
}
