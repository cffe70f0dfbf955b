use std::{env, fmt::Display, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::info;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://hostel.db?mode=rwc";
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid {key} value {value:?}: {reason}")]
pub struct ConfigError {
	pub key: String,
	pub value: String,
	pub reason: String,
}

#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub addr: String,
	pub max_connections: u32,
	/// Bounds both connection establishment and pool acquire.
	pub acquire_timeout: Duration,
}

impl Config {
	/// Reads the process environment. Call [`dotenvy::dotenv`] first to pick
	/// up a `.env` file.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		Ok(Self {
			database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
			addr: lookup("HOSTEL_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
			max_connections: try_load(&lookup, "DB_MAX_CONNECTIONS", 5)?,
			acquire_timeout: Duration::from_secs(try_load(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 3)?),
		})
	}
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
	F: Fn(&str) -> Option<String>,
	T: FromStr + Display,
	T::Err: Display,
{
	match lookup(key) {
		Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError {
			key: key.to_string(),
			value: value.clone(),
			reason: e.to_string(),
		}),
		None => {
			info!("{key} not set, using default: {default}");
			Ok(default)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |key| map.get(key).cloned()
	}

	#[test]
	fn defaults_when_unset() {
		let config = Config::from_lookup(lookup_in(&[])).unwrap();
		assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
		assert_eq!(config.addr, DEFAULT_ADDR);
		assert_eq!(config.max_connections, 5);
		assert_eq!(config.acquire_timeout, Duration::from_secs(3));
	}

	#[test]
	fn reads_overrides() {
		let config = Config::from_lookup(lookup_in(&[
			("DATABASE_URL", "sqlite::memory:"),
			("HOSTEL_ADDR", "127.0.0.1:9000"),
			("DB_MAX_CONNECTIONS", " 12 "),
			("DB_ACQUIRE_TIMEOUT_SECS", "1"),
		]))
		.unwrap();
		assert_eq!(config.database_url, "sqlite::memory:");
		assert_eq!(config.addr, "127.0.0.1:9000");
		assert_eq!(config.max_connections, 12);
		assert_eq!(config.acquire_timeout, Duration::from_secs(1));
	}

	#[test]
	fn rejects_garbage_numbers() {
		let err = Config::from_lookup(lookup_in(&[("DB_MAX_CONNECTIONS", "many")])).unwrap_err();
		assert_eq!(err.key, "DB_MAX_CONNECTIONS");
		assert_eq!(err.value, "many");
	}
}
