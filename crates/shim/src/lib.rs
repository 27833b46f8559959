// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Guest/host ABI negotiation shim
//!
//! Sits between guest callers and a natively loaded driver library that speaks a different
//! calling convention. The shim resolves versioned entry points, negotiates UUID-identified
//! interface tables with the driver, implements the interfaces the driver lacks, and computes
//! the compatibility digest cooperating callers use to validate it.

// #![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod config;
pub mod digest;
pub mod driver;
pub mod error;
pub mod exports;
pub mod logging;
pub mod negotiate;
pub mod notify;
pub mod resolver;
pub mod state;
pub mod storage;
pub mod trampoline;

pub use config::{DriverConfig, DriverSymbols, LogConfig, LogFormat, ShimConfig};
pub use error::{Error, Result};
pub use state::{ProcessState, bootstrap};
