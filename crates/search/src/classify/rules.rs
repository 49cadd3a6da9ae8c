use std::sync::Arc;

use super::{FilterIntent, SearchQuery};
use crate::config::ClassifierConfig;
use crate::normalize::{digits_only, is_all_digits};

/// Precomputed shape of a query, shared by every rule.
#[derive(Debug, Clone)]
pub struct QueryShape<'a> {
	/// Trimmed text as typed.
	pub raw: &'a str,
	/// Case- and accent-folded text.
	pub normalized: &'a str,
	/// ASCII digits of `raw`, in order.
	pub digits: String,
	/// `raw` is non-empty and made of ASCII digits only.
	pub all_digits: bool,
	/// `raw` holds digits separated only by whitespace.
	pub spaced_digits: bool,
	/// `raw` contains `@`.
	pub has_at: bool,
}

impl<'a> QueryShape<'a> {
	pub fn of(query: &'a SearchQuery) -> Self {
		let raw = query.raw();
		let digits = digits_only(raw);
		let all_digits = is_all_digits(raw);
		let spaced_digits = !digits.is_empty() && raw.chars().all(|c| c.is_ascii_digit() || c.is_whitespace());
		Self {
			raw,
			normalized: query.normalized(),
			digits,
			all_digits,
			spaced_digits,
			has_at: raw.contains('@'),
		}
	}
}

type Matcher = dyn Fn(&QueryShape<'_>) -> Option<FilterIntent> + Send + Sync;

/// One predicate-to-intent entry of a classifier table.
#[derive(Clone)]
pub struct Rule {
	name: &'static str,
	matcher: Arc<Matcher>,
}

impl std::fmt::Debug for Rule {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Rule").field(&self.name).finish()
	}
}

impl Rule {
	/// Creates a rule from a name and a matcher returning `Some` on match.
	pub fn new<F>(name: &'static str, matcher: F) -> Self
	where
		F: Fn(&QueryShape<'_>) -> Option<FilterIntent> + Send + Sync + 'static,
	{
		Self {
			name,
			matcher: Arc::new(matcher),
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn apply(&self, shape: &QueryShape<'_>) -> Option<FilterIntent> {
		(self.matcher)(shape)
	}
}

pub(super) fn standard_rules(config: &ClassifierConfig) -> Vec<Rule> {
	let mut rules = vec![Rule::new("empty", |shape| shape.raw.is_empty().then_some(FilterIntent::Empty))];

	let always_substring = config.always_substring;
	rules.push(Rule::new("substring", move |shape| {
		(shape.has_at || always_substring).then(|| FilterIntent::NameOrEmailSubstring(shape.normalized.to_owned()))
	}));

	let id_document = config.id_document;
	if id_document.enabled {
		rules.push(Rule::new("id-document", move |shape| {
			(shape.all_digits && id_document.accepts(shape.digits.len())).then(|| FilterIntent::ById(shape.digits.clone()))
		}));
	}

	let phone = config.phone;
	if phone.enabled {
		rules.push(Rule::new("phone", move |shape| {
			(shape.all_digits && phone.accepts(shape.digits.len())).then(|| FilterIntent::ByPhone(shape.digits.clone()))
		}));

		if config.spaced_phone {
			rules.push(Rule::new("spaced-phone", move |shape| {
				(shape.spaced_digits && phone.accepts(shape.digits.len())).then(|| FilterIntent::ByPhone(shape.digits.clone()))
			}));
		}
	}

	rules
}
