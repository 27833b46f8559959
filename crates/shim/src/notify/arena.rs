// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Index-stable slot arena with generation-checked handles

use crate::error::{Error, Result};

/// Packed `(generation, index)` handle; never zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle(u64);

impl SlotHandle {
	fn new(index: u32, generation: u32) -> Self {
		Self(((generation as u64) << 32) | index as u64)
	}

	pub fn from_raw(raw: u64) -> Self {
		Self(raw)
	}

	pub fn into_raw(self) -> u64 {
		self.0
	}

	pub fn index(self) -> u32 {
		self.0 as u32
	}

	fn generation(self) -> u32 {
		(self.0 >> 32) as u32
	}
}

struct Slot<T> {
	generation: u32,
	value: Option<T>,
}

/// Slots never move while occupied; a freed slot is reused with a bumped generation so
/// stale handles stop resolving.
pub struct Arena<T> {
	slots: Vec<Slot<T>>,
	free: Vec<u32>,
}

impl<T> Arena<T> {
	pub const fn new() -> Self {
		Self {
			slots: Vec::new(),
			free: Vec::new(),
		}
	}

	/// Insert without aborting on allocation failure
	pub fn try_insert(&mut self, value: T) -> Result<SlotHandle> {
		if let Some(index) = self.free.pop() {
			let slot = &mut self.slots[index as usize];
			slot.value = Some(value);
			return Ok(SlotHandle::new(index, slot.generation));
		}

		let index = u32::try_from(self.slots.len()).map_err(|_| Error::ResourceExhaustion("registry slot"))?;
		self.slots.try_reserve(1).map_err(|_| Error::ResourceExhaustion("registry slot"))?;
		// free-list capacity always covers every slot
		self.free
			.try_reserve(self.slots.len() + 1 - self.free.len())
			.map_err(|_| Error::ResourceExhaustion("registry slot"))?;

		self.slots.push(Slot {
			generation: 1,
			value: Some(value),
		});
		Ok(SlotHandle::new(index, 1))
	}

	pub fn get(&self, handle: SlotHandle) -> Option<&T> {
		self.slots
			.get(handle.index() as usize)
			.filter(|slot| slot.generation == handle.generation())
			.and_then(|slot| slot.value.as_ref())
	}

	pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
		self.slots
			.get_mut(handle.index() as usize)
			.filter(|slot| slot.generation == handle.generation())
			.and_then(|slot| slot.value.as_mut())
	}

	pub fn remove(&mut self, handle: SlotHandle) -> Option<T> {
		let slot = self.slots.get_mut(handle.index() as usize).filter(|slot| slot.generation == handle.generation())?;
		let value = slot.value.take()?;
		slot.generation = slot.generation.wrapping_add(1).max(1);
		self.free.push(handle.index());
		Some(value)
	}
}

impl<T> Default for Arena<T> {
	fn default() -> Self {
		Self::new()
	}
}
