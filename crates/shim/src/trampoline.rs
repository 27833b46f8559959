// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Calling-convention trampolines
//!
//! Some host entry points deliver an asynchronous callback in the host convention while the
//! guest supplied a guest-convention function. The shim hands the host a fixed adapter and
//! parks the guest function in a [`TrampolineSlot`], which the adapter reads on delivery.
//!
//! A slot holds exactly one registration. Arming an occupied slot displaces the previous
//! registration, and [`TrampolineSlot::arm`] returns it so the caller has to decide what
//! happens to it; a displaced registration is never delivered.

use parking_lot::Mutex;

/// A capacity-1 slot holding the guest function a host adapter forwards to
pub struct TrampolineSlot<F: Copy> {
	slot: Mutex<Option<F>>,
}

impl<F: Copy> TrampolineSlot<F> {
	pub fn new() -> Self {
		Self {
			slot: Mutex::new(None),
		}
	}

	/// Park `target` and return the registration it displaced, if any
	#[must_use = "a displaced registration is never delivered"]
	pub fn arm(&self, target: F) -> Option<F> {
		self.slot.lock().replace(target)
	}

	/// The parked target
	///
	/// Reading does not consume the registration; a host may deliver through the adapter
	/// more than once.
	pub fn target(&self) -> Option<F> {
		*self.slot.lock()
	}

	pub fn disarm(&self) -> Option<F> {
		self.slot.lock().take()
	}

	pub fn is_armed(&self) -> bool {
		self.slot.lock().is_some()
	}
}

impl<F: Copy> Default for TrampolineSlot<F> {
	fn default() -> Self {
		Self::new()
	}
}
