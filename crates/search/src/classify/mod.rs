//! Heuristic routing of free-text queries to filter intents.
//!
//! # Mental model
//!
//! A settled query becomes a [`SearchQuery`] (trimmed raw text plus its
//! normalized form). The [`Classifier`] walks an ordered rule table and the
//! first rule that matches decides the [`FilterIntent`]. The intent is then
//! mapped to a [`Route`]: the cached snapshot, a server-side filter, or a
//! client-side substring scan.
//!
//! # Standard rule order
//!
//! | Rule | Matches | Intent |
//! |---|---|---|
//! | `empty` | blank query | [`FilterIntent::Empty`] |
//! | `substring` | raw contains `@`, or profile always scans locally | [`FilterIntent::NameOrEmailSubstring`] |
//! | `id-document` | all digits, length in the id bucket | [`FilterIntent::ById`] |
//! | `phone` | all digits, length in the phone bucket | [`FilterIntent::ByPhone`] |
//! | `spaced-phone` | digits separated by whitespace only (opt-in) | [`FilterIntent::ByPhone`] |
//! | fallback | anything else | [`FilterIntent::ByName`] |
//!
//! The id bucket is checked before the phone bucket so an id-shaped number is
//! never routed to phone search. Queries mixing letters and digits are never
//! numeric.

mod rules;

use std::sync::Arc;

pub use rules::{QueryShape, Rule};

use crate::config::ClassifierConfig;
use crate::entity::Criteria;
use crate::normalize::normalize;

/// One settled query, immutable once classified.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
	raw: Arc<str>,
	normalized: Arc<str>,
}

impl SearchQuery {
	/// Builds a query from user input; surrounding whitespace is dropped.
	pub fn new(input: &str) -> Self {
		let raw = input.trim();
		Self {
			raw: Arc::from(raw),
			normalized: Arc::from(normalize(raw)),
		}
	}

	/// The blank query.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Trimmed text as typed.
	pub fn raw(&self) -> &str {
		&self.raw
	}

	/// Shared handle to the trimmed text.
	pub fn raw_arc(&self) -> Arc<str> {
		Arc::clone(&self.raw)
	}

	/// Case- and accent-folded text.
	pub fn normalized(&self) -> &str {
		&self.normalized
	}

	/// Returns true for a blank query.
	pub fn is_empty(&self) -> bool {
		self.raw.is_empty()
	}
}

/// What a query asks for. Exactly one variant holds per query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterIntent {
	/// Blank query: show the unfiltered snapshot.
	Empty,
	/// Identity-document lookup (digits).
	ById(String),
	/// Phone lookup (digits).
	ByPhone(String),
	/// Client-side scan over every searchable field (normalized needle).
	NameOrEmailSubstring(String),
	/// Name lookup (trimmed text as typed).
	ByName(String),
}

impl FilterIntent {
	/// Stable label used in traces.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Empty => "empty",
			Self::ById(_) => "by_id",
			Self::ByPhone(_) => "by_phone",
			Self::NameOrEmailSubstring(_) => "substring",
			Self::ByName(_) => "by_name",
		}
	}

	/// Decides where this intent is resolved.
	pub fn route(&self, config: &ClassifierConfig) -> Route {
		match self {
			Self::Empty => Route::Snapshot,
			Self::ById(digits) => Route::Server(Criteria::IdDocument(digits.clone())),
			Self::ByPhone(digits) => Route::Server(Criteria::Phone(digits.clone())),
			Self::NameOrEmailSubstring(needle) => Route::Substring(needle.clone()),
			Self::ByName(name) if config.server_name_filter => Route::Server(Criteria::Name(name.clone())),
			Self::ByName(name) => Route::Substring(normalize(name)),
		}
	}
}

/// Where an intent is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
	/// Serve the cached unfiltered snapshot.
	Snapshot,
	/// Ask the repository for a filtered subset.
	Server(Criteria),
	/// Scan the cached snapshot in-process for a normalized needle.
	Substring(String),
}

/// Ordered rule table for one view.
#[derive(Clone)]
pub struct Classifier {
	config: ClassifierConfig,
	rules: Vec<Rule>,
}

impl std::fmt::Debug for Classifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Classifier")
			.field("config", &self.config)
			.field("rules", &self.rule_names().collect::<Vec<_>>())
			.finish()
	}
}

impl Default for Classifier {
	fn default() -> Self {
		Self::new(ClassifierConfig::default())
	}
}

impl Classifier {
	/// Builds the standard rule table for `config`.
	pub fn new(config: ClassifierConfig) -> Self {
		let rules = rules::standard_rules(&config);
		Self { config, rules }
	}

	/// Appends a rule after the standard ones, ahead of the name fallback.
	pub fn with_rule(mut self, rule: Rule) -> Self {
		self.rules.push(rule);
		self
	}

	/// Returns the configuration this table was built from.
	pub fn config(&self) -> &ClassifierConfig {
		&self.config
	}

	/// Rule names in evaluation order, excluding the name fallback.
	pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.rules.iter().map(Rule::name)
	}

	/// Classifies a settled query. The first matching rule wins.
	pub fn classify(&self, query: &SearchQuery) -> FilterIntent {
		let shape = QueryShape::of(query);
		self.rules
			.iter()
			.find_map(|rule| rule.apply(&shape))
			.unwrap_or_else(|| FilterIntent::ByName(query.raw().to_owned()))
	}

	/// Classifies and routes in one step.
	pub fn plan(&self, query: &SearchQuery) -> (FilterIntent, Route) {
		let intent = self.classify(query);
		let route = intent.route(&self.config);
		(intent, route)
	}
}
