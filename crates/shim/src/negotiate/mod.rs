// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Interface negotiation
//!
//! A caller asks for an interface by identifier. Self-contained interfaces (notification,
//! compatibility digest) are served by the shim alone. Host-backed interfaces query the
//! driver for its table, reconcile the two declared sizes and expose the shim's relay table
//! truncated to the negotiated size. Results are cached for the life of the process.

pub(crate) mod relay;

use std::{
	collections::HashMap,
	ffi::c_void,
	fmt,
	mem::size_of,
	ptr,
	sync::Arc,
};

use abibridge_abi::{COMPAT_DIGEST_ID, CONTEXT_STORAGE_ID, DRIVER_PRIVATE_ID, InterfaceIdFFI, NOTIFICATION_ID};
use parking_lot::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{
	driver::{HostTable, NativeDriver},
	error::{Error, Result},
};

/// 128-bit interface identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceId(Uuid);

impl InterfaceId {
	pub const fn from_bytes(bytes: [u8; 16]) -> Self {
		Self(Uuid::from_bytes(bytes))
	}
}

impl fmt::Display for InterfaceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0.hyphenated(), f)
	}
}

impl fmt::Debug for InterfaceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "InterfaceId({})", self.0.hyphenated())
	}
}

impl From<InterfaceIdFFI> for InterfaceId {
	fn from(id: InterfaceIdFFI) -> Self {
		Self::from_bytes(id.bytes)
	}
}

impl From<InterfaceId> for InterfaceIdFFI {
	fn from(id: InterfaceId) -> Self {
		InterfaceIdFFI::from_bytes(*id.0.as_bytes())
	}
}

/// The interfaces the shim knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceKind {
	DriverPrivate,
	ContextStorage,
	Notification,
	CompatDigest,
}

impl InterfaceKind {
	pub const ALL: [InterfaceKind; 4] = [
		InterfaceKind::DriverPrivate,
		InterfaceKind::ContextStorage,
		InterfaceKind::Notification,
		InterfaceKind::CompatDigest,
	];

	pub fn from_id(id: InterfaceId) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.id() == id)
	}

	pub fn id(self) -> InterfaceId {
		match self {
			InterfaceKind::DriverPrivate => DRIVER_PRIVATE_ID.into(),
			InterfaceKind::ContextStorage => CONTEXT_STORAGE_ID.into(),
			InterfaceKind::Notification => NOTIFICATION_ID.into(),
			InterfaceKind::CompatDigest => COMPAT_DIGEST_ID.into(),
		}
	}

	/// Served by the shim without asking the driver
	pub fn is_self_contained(self) -> bool {
		matches!(self, InterfaceKind::Notification | InterfaceKind::CompatDigest)
	}

	/// Declared size of the shim's table
	pub fn shim_size(self) -> usize {
		relay::shim_size(self)
	}
}

/// Which side offers more than the other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMismatch {
	/// The host table is larger; the extra host slots are ignored
	HostNewer,
	/// The shim table is larger; the exposed table is truncated
	ShimNewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeReconciliation {
	pub negotiated: usize,
	pub mismatch: Option<SizeMismatch>,
}

pub fn reconcile(host_size: usize, shim_size: usize) -> SizeReconciliation {
	let mismatch = match host_size.cmp(&shim_size) {
		std::cmp::Ordering::Greater => Some(SizeMismatch::HostNewer),
		std::cmp::Ordering::Less => Some(SizeMismatch::ShimNewer),
		std::cmp::Ordering::Equal => None,
	};

	SizeReconciliation {
		negotiated: host_size.min(shim_size),
		mismatch,
	}
}

/// The outcome of negotiating one interface
pub struct NegotiatedInterface {
	kind: InterfaceKind,
	reconciliation: SizeReconciliation,
	host: Option<HostTable>,
	/// Copy of the shim table: size word set to the negotiated size, slots past it zeroed
	exposed: Box<[*const c_void]>,
}

// SAFETY: the exposed table is immutable after construction and only holds code addresses
unsafe impl Send for NegotiatedInterface {}
unsafe impl Sync for NegotiatedInterface {}

impl NegotiatedInterface {
	pub fn self_contained(kind: InterfaceKind) -> Self {
		let shim_size = kind.shim_size();
		Self::build(kind, reconcile(shim_size, shim_size), None)
	}

	pub fn host_backed(kind: InterfaceKind, host: HostTable) -> Self {
		Self::build(kind, reconcile(host.size(), kind.shim_size()), Some(host))
	}

	fn build(kind: InterfaceKind, reconciliation: SizeReconciliation, host: Option<HostTable>) -> Self {
		let words = kind.shim_size() / size_of::<usize>();
		let shim = relay::shim_table(kind).cast::<*const c_void>();

		let exposed = (0..words)
			.map(|word| {
				let offset = word * size_of::<usize>();
				if word == 0 {
					ptr::without_provenance(reconciliation.negotiated)
				} else if offset + size_of::<usize>() <= reconciliation.negotiated {
					unsafe { shim.add(word).read() }
				} else {
					ptr::null()
				}
			})
			.collect();

		Self {
			kind,
			reconciliation,
			host,
			exposed,
		}
	}

	pub fn id(&self) -> InterfaceId {
		self.kind.id()
	}

	pub fn kind(&self) -> InterfaceKind {
		self.kind
	}

	pub fn negotiated_size(&self) -> usize {
		self.reconciliation.negotiated
	}

	pub fn mismatch(&self) -> Option<SizeMismatch> {
		self.reconciliation.mismatch
	}

	pub fn host(&self) -> Option<&HostTable> {
		self.host.as_ref()
	}

	/// The table handed to the guest
	pub fn exposed_table(&self) -> *const c_void {
		self.exposed.as_ptr().cast()
	}

	/// Whether the exposed table carries a slot at `offset`
	pub fn exposes_slot(&self, offset: usize) -> bool {
		offset != 0 && self.exposed.get(offset / size_of::<usize>()).is_some_and(|slot| !slot.is_null())
	}

	/// Base of the host table, provided the slot at `offset` lies within the negotiated size
	///
	/// This is the only path by which a relay reaches host memory; nothing at or past the
	/// negotiated size is ever read.
	pub fn host_slot_base(&self, offset: usize, slot: &'static str) -> Result<*const c_void> {
		let host = self.host.as_ref().ok_or(Error::Unsupported(slot))?;
		let end = offset.checked_add(size_of::<usize>()).ok_or(Error::Unsupported(slot))?;
		if offset == 0 || end > self.reconciliation.negotiated {
			return Err(Error::Unsupported(slot));
		}
		Ok(host.as_ptr())
	}
}

/// Read a host slot of a negotiated interface
///
/// Evaluates to `Result<F>` where `F` is the slot's function type; a slot outside the
/// negotiated size or left null by the host is [`Error::Unsupported`].
macro_rules! host_slot {
	($negotiated:expr, $table:ty, $field:ident) => {{
		let slot = stringify!($field);
		$negotiated.host_slot_base(core::mem::offset_of!($table, $field), slot).and_then(|base| {
			let base = base.cast::<$table>();
			unsafe { core::ptr::addr_of!((*base).$field).read_unaligned() }
				.ok_or($crate::error::Error::Unsupported(slot))
		})
	}};
}
pub(crate) use host_slot;

/// Process-wide cache of negotiated interfaces
pub struct InterfaceNegotiator {
	cache: RwLock<HashMap<InterfaceKind, Arc<NegotiatedInterface>>>,
}

impl InterfaceNegotiator {
	pub fn new() -> Self {
		Self {
			cache: RwLock::new(HashMap::new()),
		}
	}

	/// Negotiate `id` with `driver`, or return the cached result
	///
	/// Unknown identifiers are [`Error::NotFound`] without a driver query. A failed driver
	/// query is returned verbatim and not cached, so nothing is retried on the caller's
	/// behalf.
	#[instrument(name = "negotiate", level = "debug", skip(self, driver), fields(interface = %id))]
	pub fn negotiate(&self, id: InterfaceId, driver: &dyn NativeDriver) -> Result<Arc<NegotiatedInterface>> {
		let Some(kind) = InterfaceKind::from_id(id) else {
			debug!("unknown interface");
			return Err(Error::NotFound);
		};

		if let Some(negotiated) = self.cache.read().get(&kind) {
			return Ok(negotiated.clone());
		}

		let mut cache = self.cache.write();
		if let Some(negotiated) = cache.get(&kind) {
			return Ok(negotiated.clone());
		}

		let negotiated = if kind.is_self_contained() {
			NegotiatedInterface::self_contained(kind)
		} else {
			let host = driver.query_interface(id)?;
			let negotiated = NegotiatedInterface::host_backed(kind, host);
			match negotiated.mismatch() {
				Some(SizeMismatch::HostNewer) => warn!(
					?kind,
					host_size = host.size(),
					shim_size = kind.shim_size(),
					"driver offers a newer interface than the shim implements; extra host slots are ignored"
				),
				Some(SizeMismatch::ShimNewer) => warn!(
					?kind,
					host_size = host.size(),
					shim_size = kind.shim_size(),
					"driver offers an older interface than the shim implements; exposed table is truncated"
				),
				None => {}
			}
			negotiated
		};

		debug!(?kind, negotiated_size = negotiated.negotiated_size(), "interface negotiated");
		let negotiated = Arc::new(negotiated);
		cache.insert(kind, negotiated.clone());
		Ok(negotiated)
	}

	/// A previously negotiated interface
	pub fn cached(&self, kind: InterfaceKind) -> Option<Arc<NegotiatedInterface>> {
		self.cache.read().get(&kind).cloned()
	}

	pub fn len(&self) -> usize {
		self.cache.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl Default for InterfaceNegotiator {
	fn default() -> Self {
		Self::new()
	}
}
