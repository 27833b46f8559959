// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Shim-side interface tables
//!
//! Each table is a static of guest-convention functions. Host-backed slots look up the
//! negotiated interface, read the matching host slot and return the host status unchanged;
//! self-contained slots are implemented here.

mod digest;
mod notify;
mod private;
mod storage;

use std::{ffi::c_void, mem::size_of};

use abibridge_abi::{CompatDigestTable, ContextStorageGuestTable, DriverPrivateGuestTable, NotificationTable};
use tracing::trace;

use super::{InterfaceKind, NegotiatedInterface};
use crate::{
	error::{Error, Result},
	exports::guarded,
	state::ProcessState,
};

pub(crate) fn shim_table(kind: InterfaceKind) -> *const c_void {
	match kind {
		InterfaceKind::DriverPrivate => (&private::GUEST_TABLE as *const DriverPrivateGuestTable).cast(),
		InterfaceKind::ContextStorage => (&storage::GUEST_TABLE as *const ContextStorageGuestTable).cast(),
		InterfaceKind::Notification => (&notify::TABLE as *const NotificationTable).cast(),
		InterfaceKind::CompatDigest => (&digest::TABLE as *const CompatDigestTable).cast(),
	}
}

pub(crate) fn shim_size(kind: InterfaceKind) -> usize {
	match kind {
		InterfaceKind::DriverPrivate => size_of::<DriverPrivateGuestTable>(),
		InterfaceKind::ContextStorage => size_of::<ContextStorageGuestTable>(),
		InterfaceKind::Notification => size_of::<NotificationTable>(),
		InterfaceKind::CompatDigest => size_of::<CompatDigestTable>(),
	}
}

/// Run a host-backed slot against its negotiated interface
fn relay(
	kind: InterfaceKind,
	slot: &'static str,
	call: impl FnOnce(&ProcessState, &NegotiatedInterface) -> Result<i32>,
) -> i32 {
	guarded(slot, || {
		let state = ProcessState::current()?;
		let negotiated = state.negotiator().cached(kind).ok_or(Error::NotFound)?;
		trace!(?kind, slot, "relay");
		call(state, &negotiated)
	})
}
