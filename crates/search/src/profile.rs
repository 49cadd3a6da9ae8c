//! Built-in settings for the hotel list views.

use crate::config::{ClassifierConfig, DEFAULT_DEBOUNCE_MS, DigitBucket, ViewConfig};

/// Customer list: id-document, phone (typed with or without spaces), email, and server-side name search.
pub fn customers() -> ViewConfig {
	ViewConfig {
		debounce_ms: DEFAULT_DEBOUNCE_MS,
		classifier: ClassifierConfig {
			spaced_phone: true,
			..ClassifierConfig::default()
		},
	}
}

/// Staff list: id-document, phone, email, and server-side name search.
pub fn staff() -> ViewConfig {
	ViewConfig::default()
}

/// Booking list: every query scans guest name, phone, room, room type, and status locally.
pub fn bookings() -> ViewConfig {
	ViewConfig {
		debounce_ms: 300,
		classifier: ClassifierConfig {
			id_document: DigitBucket::disabled(),
			phone: DigitBucket::disabled(),
			spaced_phone: false,
			always_substring: true,
			server_name_filter: false,
		},
	}
}

/// Service list: name, unit, status, and price are scanned locally.
pub fn services() -> ViewConfig {
	ViewConfig {
		debounce_ms: DEFAULT_DEBOUNCE_MS,
		classifier: ClassifierConfig {
			id_document: DigitBucket::disabled(),
			phone: DigitBucket::disabled(),
			spaced_phone: false,
			always_substring: true,
			server_name_filter: false,
		},
	}
}

/// Every preset keyed by view name.
pub fn presets() -> impl Iterator<Item = (&'static str, ViewConfig)> {
	[("customers", customers()), ("staff", staff()), ("bookings", bookings()), ("services", services())].into_iter()
}
