// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

//! C ABI definitions for the abibridge shim
//!
//! This crate provides the stable C ABI that sits between guest callers, the shim and the
//! native driver library. It defines FFI-safe types and function signatures only; all
//! behaviour lives in `abibridge-shim`.
//!
//! Two calling conventions meet here:
//! - guest functions are declared `extern "system"`
//! - host (native driver) functions are declared `extern "C"`
//!
//! Every interface therefore has a guest table and a host table with identical slot
//! layout but different function pointer types.

// #![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod callbacks;
pub mod constants;
pub mod driver;
pub mod interface;

pub use callbacks::*;
pub use constants::*;
pub use driver::*;
pub use interface::*;
