//! Per-view search configuration.
//!
//! Configuration is TOML with one table per view. Every key is optional; a
//! missing key keeps the built-in preset for that view (see [`crate::profile`]).
//!
//! ```toml
//! [customers]
//! debounce-ms = 250
//!
//! [customers.classifier.id-document]
//! min-digits = 12
//! max-digits = 12
//!
//! [services.classifier]
//! always-substring = true
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::profile;

/// Default quiet period between the last keystroke and the query.
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;

/// A digit-length bucket of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DigitBucket {
	pub enabled: bool,
	pub min_digits: usize,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_digits: Option<usize>,
}

impl DigitBucket {
	/// An enabled bucket accepting `min..=max` digits.
	pub const fn range(min: usize, max: usize) -> Self {
		Self {
			enabled: true,
			min_digits: min,
			max_digits: Some(max),
		}
	}

	/// An enabled bucket accepting at least `min` digits.
	pub const fn at_least(min: usize) -> Self {
		Self {
			enabled: true,
			min_digits: min,
			max_digits: None,
		}
	}

	/// A bucket that never matches.
	pub const fn disabled() -> Self {
		Self {
			enabled: false,
			min_digits: 0,
			max_digits: None,
		}
	}

	/// Returns true when a digit string of `len` falls in this bucket.
	pub fn accepts(&self, len: usize) -> bool {
		self.enabled && len >= self.min_digits && self.max_digits.is_none_or(|max| len <= max)
	}
}

/// Which heuristic buckets a view's classifier enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClassifierConfig {
	/// Identity-document bucket, checked before `phone`.
	pub id_document: DigitBucket,
	/// Phone bucket.
	pub phone: DigitBucket,
	/// Treat digits separated by whitespace as a phone number.
	pub spaced_phone: bool,
	/// Scan the snapshot locally for every non-blank query.
	pub always_substring: bool,
	/// The backend exposes a name filter; otherwise names are scanned locally.
	pub server_name_filter: bool,
}

impl Default for ClassifierConfig {
	fn default() -> Self {
		Self {
			id_document: DigitBucket::range(9, 12),
			phone: DigitBucket::at_least(3),
			spaced_phone: false,
			always_substring: false,
			server_name_filter: true,
		}
	}
}

impl ClassifierConfig {
	fn validate(&self, view: &str) -> Result<()> {
		for (bucket, config) in [("id-document", self.id_document), ("phone", self.phone)] {
			if !config.enabled {
				continue;
			}
			let max = config.max_digits.unwrap_or(usize::MAX);
			if config.min_digits == 0 || config.min_digits > max {
				return Err(ConfigError::InvalidBucket {
					view: view.to_owned(),
					bucket,
					min: config.min_digits,
					max,
				});
			}
		}
		Ok(())
	}
}

/// Settings for one list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ViewConfig {
	pub debounce_ms: u64,
	pub classifier: ClassifierConfig,
}

impl Default for ViewConfig {
	fn default() -> Self {
		Self {
			debounce_ms: DEFAULT_DEBOUNCE_MS,
			classifier: ClassifierConfig::default(),
		}
	}
}

impl ViewConfig {
	/// Quiet period as a [`Duration`].
	pub const fn debounce(&self) -> Duration {
		Duration::from_millis(self.debounce_ms)
	}

	fn validate(&self, view: &str) -> Result<()> {
		if self.debounce_ms == 0 {
			return Err(ConfigError::ZeroDebounce(view.to_owned()));
		}
		self.classifier.validate(view)
	}
}

/// View settings keyed by view name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
	views: BTreeMap<String, ViewConfig>,
}

impl Default for SearchConfig {
	fn default() -> Self {
		Self {
			views: profile::presets().map(|(name, config)| (name.to_owned(), config)).collect(),
		}
	}
}

impl SearchConfig {
	/// Parses TOML overrides on top of the built-in presets.
	pub fn from_toml_str(input: &str) -> Result<Self> {
		let overrides: toml::Table = toml::from_str(input)?;
		let mut config = Self::default();

		for (name, overlay) in overrides {
			let base = config.views.get(&name).copied().unwrap_or_default();
			let mut merged = toml::Value::try_from(base).map_err(|err| ConfigError::Value(err.to_string()))?;
			merge_value(&mut merged, overlay);
			let view: ViewConfig = merged.try_into()?;
			view.validate(&name)?;
			tracing::debug!(view = %name, debounce_ms = view.debounce_ms, "search.config.view");
			config.views.insert(name, view);
		}

		Ok(config)
	}

	/// Reads and parses a TOML file.
	pub fn from_path(path: &Path) -> Result<Self> {
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}

	/// Settings for `name`; unknown views get the defaults.
	pub fn view(&self, name: &str) -> ViewConfig {
		self.views.get(name).copied().unwrap_or_default()
	}

	/// Configured view names, sorted.
	pub fn view_names(&self) -> impl Iterator<Item = &str> {
		self.views.keys().map(String::as_str)
	}
}

fn merge_value(base: &mut toml::Value, overlay: toml::Value) {
	match (base, overlay) {
		(toml::Value::Table(base), toml::Value::Table(overlay)) => {
			for (key, value) in overlay {
				match base.get_mut(&key) {
					Some(existing) => merge_value(existing, value),
					None => {
						base.insert(key, value);
					}
				}
			}
		}
		(slot, value) => *slot = value,
	}
}
