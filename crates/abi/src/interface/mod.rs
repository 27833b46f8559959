// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

//! Interface identifiers and capability tables
//!
//! Every table starts with a `size` field holding its declared size in bytes, followed by
//! nullable slots. A zeroed slot is a missing slot, which lets a table be truncated to a
//! negotiated size by zeroing its tail.

mod digest;
mod id;
mod notify;
mod private;
mod storage;

pub use digest::*;
pub use id::*;
pub use notify::*;
pub use private::*;
pub use storage::*;
