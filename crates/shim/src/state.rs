// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Process-wide shim state
//!
//! Everything the shim mutates lives in one [`ProcessState`]: the negotiated interface
//! cache, the notification registry and the host callback trampoline. It is installed once
//! per process. Only the guest-facing `extern` functions read the installed state; every
//! other component is handed what it needs explicitly.

use std::{fmt, sync::Arc};

use abibridge_abi::GuestHostCallbackFn;
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::{
	config::ShimConfig,
	digest::{Digest, DigestInput, compat_digest},
	driver::{LibraryDriver, NativeDriver},
	error::{Error, Result},
	logging,
	negotiate::{InterfaceId, InterfaceNegotiator, NegotiatedInterface},
	notify::NotificationRegistry,
	resolver::{SymbolPtr, SymbolResolver, builtin_symbols},
	trampoline::TrampolineSlot,
};

static PROCESS_STATE: OnceCell<ProcessState> = OnceCell::new();

pub struct ProcessState {
	driver: Box<dyn NativeDriver>,
	resolver: SymbolResolver,
	negotiator: InterfaceNegotiator,
	notifications: NotificationRegistry,
	host_callback: TrampolineSlot<GuestHostCallbackFn>,
}

impl ProcessState {
	pub fn new(driver: impl NativeDriver + 'static) -> Self {
		Self {
			driver: Box::new(driver),
			resolver: SymbolResolver::new(builtin_symbols()),
			negotiator: InterfaceNegotiator::new(),
			notifications: NotificationRegistry::new(),
			host_callback: TrampolineSlot::new(),
		}
	}

	pub fn with_resolver(mut self, resolver: SymbolResolver) -> Self {
		self.resolver = resolver;
		self
	}

	/// Install as the state of this process
	pub fn install(self) -> Result<&'static ProcessState> {
		PROCESS_STATE.set(self).map_err(|_| Error::AlreadyInstalled)?;
		debug!("process state installed");
		Self::current()
	}

	pub fn current() -> Result<&'static ProcessState> {
		PROCESS_STATE.get().ok_or(Error::NotInstalled)
	}

	pub fn negotiate(&self, id: InterfaceId) -> Result<Arc<NegotiatedInterface>> {
		self.negotiator.negotiate(id, self.driver.as_ref())
	}

	pub fn resolve(&self, name: &str, version: u32, flags: u64) -> Option<SymbolPtr> {
		self.resolver.resolve(name, version, flags)
	}

	pub fn compat_digest(&self, runtime_version: u32, timestamp: u64) -> Result<Digest> {
		let input = DigestInput::collect(self.driver.as_ref(), runtime_version, timestamp)?;
		Ok(compat_digest(&input))
	}

	/// Lifecycle hook run when a thread detaches from the shim
	pub fn thread_detached(&self) {
		self.notifications.dispatch();
	}

	pub fn driver(&self) -> &dyn NativeDriver {
		self.driver.as_ref()
	}

	pub fn resolver(&self) -> &SymbolResolver {
		&self.resolver
	}

	pub fn negotiator(&self) -> &InterfaceNegotiator {
		&self.negotiator
	}

	pub fn notifications(&self) -> &NotificationRegistry {
		&self.notifications
	}

	pub fn host_callback(&self) -> &TrampolineSlot<GuestHostCallbackFn> {
		&self.host_callback
	}
}

impl fmt::Debug for ProcessState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProcessState")
			.field("symbols", &self.resolver.len())
			.field("negotiated", &self.negotiator.len())
			.field("notifications", &self.notifications.len())
			.field("host_callback_armed", &self.host_callback.is_armed())
			.finish()
	}
}

/// Initialise logging, load the native driver and install the process state
pub fn bootstrap(config: &ShimConfig) -> Result<&'static ProcessState> {
	logging::init(&config.log)?;

	let driver = LibraryDriver::load(&config.driver)?;
	info!(path = %driver.path().display(), "abibridge shim starting");

	ProcessState::new(driver).install()
}
