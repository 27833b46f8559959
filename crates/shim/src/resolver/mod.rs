// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Versioned symbol resolution
//!
//! The resolver is built once from a fixed table and never mutated, so lookups take no lock.
//! A row matches only when name, version and flags are all exactly equal. Rows are meant to
//! be unique per triple; if a table nevertheless carries duplicates, the first row in table
//! order wins.

mod table;

use std::{collections::HashSet, ffi::c_void, fmt};

pub use table::builtin_symbols;
use tracing::warn;

/// An opaque entry point address
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolPtr(*const c_void);

// SAFETY: entry points are immutable code addresses
unsafe impl Send for SymbolPtr {}
unsafe impl Sync for SymbolPtr {}

impl SymbolPtr {
	pub const fn new(ptr: *const c_void) -> Self {
		Self(ptr)
	}

	pub const fn as_ptr(self) -> *const c_void {
		self.0
	}
}

impl fmt::Debug for SymbolPtr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SymbolPtr({:p})", self.0)
	}
}

/// One row of the symbol table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionedSymbol {
	pub name: &'static str,
	pub version: u32,
	pub flags: u64,
	pub ptr: SymbolPtr,
}

impl VersionedSymbol {
	pub const fn new(name: &'static str, version: u32, flags: u64, ptr: SymbolPtr) -> Self {
		Self {
			name,
			version,
			flags,
			ptr,
		}
	}

	fn matches(&self, name: &str, version: u32, flags: u64) -> bool {
		self.version == version && self.flags == flags && self.name == name
	}
}

pub struct SymbolResolver {
	table: Box<[VersionedSymbol]>,
	duplicates: usize,
}

impl SymbolResolver {
	pub fn new(table: impl Into<Vec<VersionedSymbol>>) -> Self {
		let table = table.into().into_boxed_slice();

		let mut seen = HashSet::with_capacity(table.len());
		let mut duplicates = 0;
		for row in table.iter() {
			if !seen.insert((row.name, row.version, row.flags)) {
				duplicates += 1;
				warn!(
					name = row.name,
					version = row.version,
					flags = row.flags,
					"duplicate symbol row, the first row in table order wins"
				);
			}
		}

		Self {
			table,
			duplicates,
		}
	}

	/// Resolve `(name, version, flags)` to an entry point
	///
	/// `None` means the capability is unavailable under this version and flag set; callers
	/// report it as not found rather than failing.
	pub fn resolve(&self, name: &str, version: u32, flags: u64) -> Option<SymbolPtr> {
		self.table.iter().find(|row| row.matches(name, version, flags)).map(|row| row.ptr)
	}

	pub fn len(&self) -> usize {
		self.table.len()
	}

	pub fn is_empty(&self) -> bool {
		self.table.is_empty()
	}

	/// Rows whose triple already appeared earlier in the table
	pub fn duplicates(&self) -> usize {
		self.duplicates
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	fn ptr(n: usize) -> SymbolPtr {
		SymbolPtr::new(n as *const c_void)
	}

	#[test]
	fn test_exact_triple_match() {
		let resolver = SymbolResolver::new(vec![
			VersionedSymbol::new("alpha", 100, 0, ptr(0xa)),
			VersionedSymbol::new("alpha", 200, 0, ptr(0xb)),
		]);

		assert_eq!(resolver.resolve("alpha", 100, 0), Some(ptr(0xa)));
		assert_eq!(resolver.resolve("alpha", 200, 0), Some(ptr(0xb)));
		assert_eq!(resolver.resolve("alpha", 300, 0), None);
	}

	#[test]
	fn test_flags_must_match() {
		let resolver = SymbolResolver::new(vec![
			VersionedSymbol::new("launch", 7000, 0, ptr(1)),
			VersionedSymbol::new("launch", 7000, 2, ptr(2)),
		]);

		assert_eq!(resolver.resolve("launch", 7000, 0), Some(ptr(1)));
		assert_eq!(resolver.resolve("launch", 7000, 2), Some(ptr(2)));
		assert_eq!(resolver.resolve("launch", 7000, 1), None);
	}

	#[test]
	fn test_unknown_name() {
		let resolver = SymbolResolver::new(vec![VersionedSymbol::new("alpha", 100, 0, ptr(1))]);
		assert_eq!(resolver.resolve("beta", 100, 0), None);
		assert_eq!(resolver.resolve("alph", 100, 0), None);
	}

	#[test]
	fn test_duplicate_rows_first_wins() {
		let resolver = SymbolResolver::new(vec![
			VersionedSymbol::new("alpha", 100, 0, ptr(1)),
			VersionedSymbol::new("beta", 100, 0, ptr(2)),
			VersionedSymbol::new("alpha", 100, 0, ptr(3)),
		]);

		assert_eq!(resolver.duplicates(), 1);
		assert_eq!(resolver.resolve("alpha", 100, 0), Some(ptr(1)));
	}

	#[test]
	fn test_empty_table() {
		let resolver = SymbolResolver::new(Vec::new());
		assert!(resolver.is_empty());
		assert_eq!(resolver.resolve("alpha", 100, 0), None);
	}

	proptest! {
		#[test]
		fn prop_unique_rows_resolve_to_their_pointer(
			rows in proptest::collection::hash_set(("[a-d]{1,3}", 0u32..5, 0u64..3), 1..24),
			probe in ("[a-d]{1,3}", 0u32..5, 0u64..3),
		) {
			let rows: Vec<(String, u32, u64)> = rows.into_iter().collect();
			let table: Vec<VersionedSymbol> = rows
				.iter()
				.enumerate()
				.map(|(i, (name, version, flags))| {
					let name: &'static str = Box::leak(name.clone().into_boxed_str());
					VersionedSymbol::new(name, *version, *flags, ptr(i + 1))
				})
				.collect();
			let resolver = SymbolResolver::new(table);
			prop_assert_eq!(resolver.duplicates(), 0);

			for (i, (name, version, flags)) in rows.iter().enumerate() {
				prop_assert_eq!(resolver.resolve(name, *version, *flags), Some(ptr(i + 1)));
			}

			let (name, version, flags) = probe;
			let expected = rows
				.iter()
				.position(|(n, v, f)| *n == name && *v == version && *f == flags)
				.map(|i| ptr(i + 1));
			prop_assert_eq!(resolver.resolve(&name, version, flags), expected);
		}
	}
}
