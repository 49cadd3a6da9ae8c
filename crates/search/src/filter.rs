//! Client-side matching over normalized search fields.

use std::sync::Arc;

use crate::Entity;
use crate::classify::FilterIntent;
use crate::normalize::{digits_only, normalize};

/// Returns true when any normalized search field of `entity` contains `needle`.
///
/// `needle` must already be normalized. A blank needle matches everything.
pub fn matches_needle<E: Entity>(entity: &E, needle: &str) -> bool {
	needle.is_empty() || entity.search_fields().iter().any(|field| normalize(field).contains(needle))
}

/// Keeps the rows matching `needle`, in their original order.
pub fn filter_rows<E: Entity>(rows: &[E], needle: &str) -> Arc<[E]> {
	rows.iter().filter(|row| matches_needle(*row, needle)).cloned().collect()
}

/// Local approximation of whether `entity` would be part of the result for `intent`.
///
/// Used to decide if a freshly created record belongs in the current view
/// without asking the server again.
pub fn matches_intent<E: Entity>(entity: &E, intent: &FilterIntent) -> bool {
	match intent {
		FilterIntent::Empty => true,
		FilterIntent::NameOrEmailSubstring(needle) => matches_needle(entity, needle),
		FilterIntent::ByName(name) => matches_needle(entity, &normalize(name)),
		FilterIntent::ById(digits) | FilterIntent::ByPhone(digits) => entity
			.search_fields()
			.iter()
			.any(|field| digits_only(field).contains(digits.as_str())),
	}
}
