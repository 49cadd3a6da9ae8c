//! Error types for repository calls and configuration loading.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Failure reported by a [`crate::Repository`] call.
///
/// Cancellation is never shown to the user; every other failure becomes the
/// view's error message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
	/// The request was superseded or the view was torn down.
	#[error("request cancelled")]
	Cancelled,

	/// The backend call failed.
	#[error("{message}")]
	Network {
		/// Human-readable message derived from the collaborator's error.
		message: Arc<str>,
	},
}

impl RepositoryError {
	/// Creates a network failure with the given message.
	pub fn network(message: impl Into<Arc<str>>) -> Self {
		Self::Network { message: message.into() }
	}

	/// Derives a failure from a backend error payload.
	///
	/// A string payload is used verbatim. Objects are searched for `message`,
	/// then `detail`, then an `errors` map whose values are joined with `"; "`.
	/// Anything else falls back to its JSON text.
	pub fn from_payload(payload: &serde_json::Value) -> Self {
		Self::network(payload_message(payload))
	}

	/// Returns true when this failure only reflects cancellation.
	pub const fn is_cancellation(&self) -> bool {
		matches!(self, Self::Cancelled)
	}

	/// Returns the user-facing message.
	pub fn message(&self) -> Arc<str> {
		match self {
			Self::Cancelled => Arc::from("request cancelled"),
			Self::Network { message } => Arc::clone(message),
		}
	}
}

fn payload_message(payload: &serde_json::Value) -> String {
	use serde_json::Value;

	fn scalar(value: &Value) -> String {
		match value {
			Value::String(s) => s.clone(),
			other => other.to_string(),
		}
	}

	match payload {
		Value::String(s) => s.clone(),
		Value::Object(map) => {
			if let Some(message) = map.get("message") {
				return scalar(message);
			}
			if let Some(detail) = map.get("detail") {
				return scalar(detail);
			}
			if let Some(Value::Object(errors)) = map.get("errors") {
				let entries: Vec<String> = errors
					.values()
					.flat_map(|value| match value {
						Value::Array(items) => items.iter().map(scalar).collect::<Vec<_>>(),
						other => vec![scalar(other)],
					})
					.collect();
				return entries.join("; ");
			}
			payload.to_string()
		}
		other => other.to_string(),
	}
}

/// Errors that can occur when loading search configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error converting a configuration value.
	#[error("invalid configuration value: {0}")]
	Value(String),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A digit bucket has an empty or inverted range.
	#[error("view '{view}': {bucket} bucket range {min}..={max} is empty")]
	InvalidBucket {
		/// View whose classifier is misconfigured.
		view: String,
		/// Bucket name (`id-document` or `phone`).
		bucket: &'static str,
		/// Configured lower bound.
		min: usize,
		/// Configured upper bound.
		max: usize,
	},

	/// A view was configured with a zero quiet period.
	#[error("view '{0}': debounce-ms must be greater than zero")]
	ZeroDebounce(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
