// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use tracing_subscriber::{EnvFilter, fmt};

use crate::{
	config::{LogConfig, LogFormat},
	error::{Error, Result},
};

/// Install the global tracing subscriber
///
/// Idempotent: if a subscriber is already installed, by an earlier call or by the host
/// application, the existing one is kept.
pub fn init(config: &LogConfig) -> Result<()> {
	let filter = EnvFilter::try_new(&config.filter)
		.map_err(|e| Error::Config(format!("invalid log filter `{}`: {}", config.filter, e)))?;

	let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr).with_thread_ids(true);
	let installed = match config.format {
		LogFormat::Pretty => builder.try_init(),
		LogFormat::Json => builder.json().try_init(),
	};

	if installed.is_err() {
		tracing::debug!("tracing subscriber already installed, keeping it");
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_init_is_idempotent() {
		let config = LogConfig::default().with_filter("abibridge_shim=debug");
		assert!(init(&config).is_ok());
		assert!(init(&config.clone().with_format(LogFormat::Json)).is_ok());
	}

	#[test]
	fn test_invalid_filter_is_a_config_error() {
		let config = LogConfig::default().with_filter("abibridge_shim=verbose");
		assert!(matches!(init(&config), Err(Error::Config(_))));
	}
}
