// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Shim configuration
//!
//! Defaults can be overridden from the environment with [`ShimConfig::from_env`]:
//! - `ABIBRIDGE_DRIVER_PATH`: path of the native driver library
//! - `ABIBRIDGE_LOG`: tracing filter directive, e.g. `abibridge_shim=debug`
//! - `ABIBRIDGE_LOG_FORMAT`: `pretty` or `json`

use std::{env, path::PathBuf};

use crate::error::{Error, Result};

pub const ENV_DRIVER_PATH: &str = "ABIBRIDGE_DRIVER_PATH";
pub const ENV_LOG: &str = "ABIBRIDGE_LOG";
pub const ENV_LOG_FORMAT: &str = "ABIBRIDGE_LOG_FORMAT";

#[derive(Debug, Clone, Default)]
pub struct ShimConfig {
	pub driver: DriverConfig,
	pub log: LogConfig,
}

impl ShimConfig {
	/// Defaults overlaid with any `ABIBRIDGE_*` environment variables
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
		let mut config = Self::default();

		if let Some(path) = lookup(ENV_DRIVER_PATH) {
			config.driver.library_path = PathBuf::from(path);
		}
		if let Some(filter) = lookup(ENV_LOG) {
			config.log.filter = filter;
		}
		if let Some(format) = lookup(ENV_LOG_FORMAT) {
			config.log.format = format.parse()?;
		}

		Ok(config)
	}

	pub fn with_driver(mut self, driver: DriverConfig) -> Self {
		self.driver = driver;
		self
	}

	pub fn with_log(mut self, log: LogConfig) -> Self {
		self.log = log;
		self
	}
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
	/// Path handed to the dynamic loader
	pub library_path: PathBuf,
	pub symbols: DriverSymbols,
}

impl Default for DriverConfig {
	fn default() -> Self {
		Self {
			library_path: PathBuf::from(platform_library_name("native_driver")),
			symbols: DriverSymbols::default(),
		}
	}
}

impl DriverConfig {
	pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.library_path = path.into();
		self
	}

	pub fn with_symbols(mut self, symbols: DriverSymbols) -> Self {
		self.symbols = symbols;
		self
	}
}

/// Names of the native driver entry points
#[derive(Debug, Clone)]
pub struct DriverSymbols {
	pub get_export_table: String,
	pub driver_get_version: String,
	pub device_get_count: String,
	pub device_get_uuid: String,
	/// Optional; without it device identities are unsupported
	pub device_get_pci_location: String,
}

impl Default for DriverSymbols {
	fn default() -> Self {
		Self {
			get_export_table: "driver_get_export_table".to_string(),
			driver_get_version: "driver_get_version".to_string(),
			device_get_count: "device_get_count".to_string(),
			device_get_uuid: "device_get_uuid".to_string(),
			device_get_pci_location: "device_get_pci_location".to_string(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
}

impl std::str::FromStr for LogFormat {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s.trim().to_ascii_lowercase().as_str() {
			"pretty" => Ok(LogFormat::Pretty),
			"json" => Ok(LogFormat::Json),
			other => Err(Error::Config(format!("unknown log format `{other}`"))),
		}
	}
}

#[derive(Debug, Clone)]
pub struct LogConfig {
	/// `EnvFilter` directive
	pub filter: String,
	pub format: LogFormat,
}

impl Default for LogConfig {
	fn default() -> Self {
		Self {
			filter: "warn".to_string(),
			format: LogFormat::Pretty,
		}
	}
}

impl LogConfig {
	pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
		self.filter = filter.into();
		self
	}

	pub fn with_format(mut self, format: LogFormat) -> Self {
		self.format = format;
		self
	}
}

/// Platform-specific file name of a shared library
fn platform_library_name(name: &str) -> String {
	#[cfg(target_os = "windows")]
	{
		format!("{}.dll", name)
	}
	#[cfg(target_os = "macos")]
	{
		format!("lib{}.dylib", name)
	}
	#[cfg(not(any(target_os = "windows", target_os = "macos")))]
	{
		format!("lib{}.so", name)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		move |name: &str| vars.get(name).cloned()
	}

	#[test]
	fn test_defaults_without_environment() {
		let config = ShimConfig::from_lookup(lookup(&[])).unwrap();
		assert_eq!(config.log.filter, "warn");
		assert_eq!(config.log.format, LogFormat::Pretty);
		assert_eq!(config.driver.symbols.get_export_table, "driver_get_export_table");
		#[cfg(target_os = "linux")]
		assert_eq!(config.driver.library_path, PathBuf::from("libnative_driver.so"));
	}

	#[test]
	fn test_environment_overrides() {
		let config = ShimConfig::from_lookup(lookup(&[
			(ENV_DRIVER_PATH, "/opt/driver/libdrv.so"),
			(ENV_LOG, "abibridge_shim=trace"),
			(ENV_LOG_FORMAT, "JSON"),
		]))
		.unwrap();
		assert_eq!(config.driver.library_path, PathBuf::from("/opt/driver/libdrv.so"));
		assert_eq!(config.log.filter, "abibridge_shim=trace");
		assert_eq!(config.log.format, LogFormat::Json);
	}

	#[test]
	fn test_unknown_log_format_is_rejected() {
		let result = ShimConfig::from_lookup(lookup(&[(ENV_LOG_FORMAT, "xml")]));
		assert!(matches!(result, Err(Error::Config(_))));
	}

	#[test]
	fn test_builders() {
		let config = ShimConfig::default()
			.with_driver(DriverConfig::default().with_library_path("/tmp/libx.so"))
			.with_log(LogConfig::default().with_filter("debug").with_format(LogFormat::Json));
		assert_eq!(config.driver.library_path, PathBuf::from("/tmp/libx.so"));
		assert_eq!(config.log.filter, "debug");
		assert_eq!(config.log.format, LogFormat::Json);
	}
}
