// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! In-process native driver for exercising the shim
//!
//! [`FakeDriver`] hands out host-convention tables whose slots are plain Rust functions
//! in [`host`]. Every slot counts its calls, so a test can assert that a slot past a
//! negotiated size was never touched. Context storage is an in-memory map that invokes
//! the stored destructors when a context is destroyed, the way a real driver does.

pub mod driver;
pub mod host;

pub use driver::{FakeDevice, FakeDriver};
