// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Round function, mixing pass and padding of the compatibility digest
//!
//! Working buffer layout:
//! - `0..16`: state, the first 16 bytes are the output
//! - `16..32`: current input block
//! - `32..48`: state XOR input
//! - `48..64`: running checksum
//! - `64`: block cursor
//! - `65`: last checksum byte

use super::tables::SUBSTITUTION;

const BLOCK: usize = 16;
const MIXED: usize = 48;
const CHECKSUM: usize = 48;
const CURSOR: usize = 64;
const LAST: usize = 65;
const MIX_ROUNDS: u8 = 18;

#[derive(Clone)]
pub(crate) struct Engine {
	buf: [u8; 66],
}

impl Engine {
	pub(crate) fn new() -> Self {
		Self {
			buf: [0; 66],
		}
	}

	pub(crate) fn feed(&mut self, byte: u8) {
		let cursor = self.buf[CURSOR] as usize;

		self.buf[cursor + 2 * BLOCK] = self.buf[cursor] ^ byte;
		self.buf[cursor + BLOCK] = byte;
		self.buf[cursor + CHECKSUM] ^= SUBSTITUTION[(self.buf[LAST] ^ byte) as usize];
		self.buf[LAST] = self.buf[cursor + CHECKSUM];

		self.buf[CURSOR] = ((cursor + 1) % BLOCK) as u8;
		if self.buf[CURSOR] == 0 {
			self.mix();
		}
	}

	pub(crate) fn absorb(&mut self, bytes: impl IntoIterator<Item = u8>) {
		for byte in bytes {
			self.feed(byte);
		}
	}

	fn mix(&mut self) {
		let mut carry = 0u8;
		for round in 0..MIX_ROUNDS {
			for byte in &mut self.buf[..MIXED] {
				*byte ^= SUBSTITUTION[carry as usize];
				carry = *byte;
			}
			carry = carry.wrapping_add(round);
		}
	}

	/// Pad to a block boundary, then feed the checksum back in
	pub(crate) fn pad(&mut self) {
		let rounds = (BLOCK - self.buf[CURSOR] as usize) as u8;
		for _ in 0..rounds {
			self.feed(rounds);
		}

		for i in CHECKSUM..CHECKSUM + BLOCK {
			let byte = self.buf[i];
			self.feed(byte);
		}
	}

	pub(crate) fn output(&self) -> [u8; 16] {
		let mut out = [0; 16];
		out.copy_from_slice(&self.buf[..BLOCK]);
		out
	}

	/// Clear the state and checksum for the outer pass
	pub(crate) fn reset_for_outer(&mut self) {
		self.buf[..BLOCK].fill(0);
		self.buf[CHECKSUM..].fill(0);
	}
}
