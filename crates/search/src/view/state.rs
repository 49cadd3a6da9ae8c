use std::sync::Arc;

use innkeep_worker::RequestToken;

/// Lifecycle of the most recent query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchPhase {
	/// Nothing issued yet.
	#[default]
	Idle,
	/// The query with this token is resolving.
	Loading(RequestToken),
	/// The query with this token resolved; `visible` holds its rows.
	Ready(RequestToken),
	/// The query with this token failed; `visible` keeps the previous rows.
	Errored(Arc<str>, RequestToken),
}

impl SearchPhase {
	/// Token of the query this phase describes.
	pub fn token(&self) -> Option<RequestToken> {
		match self {
			Self::Idle => None,
			Self::Loading(token) | Self::Ready(token) | Self::Errored(_, token) => Some(*token),
		}
	}

	pub const fn label(&self) -> &'static str {
		match self {
			Self::Idle => "idle",
			Self::Loading(_) => "loading",
			Self::Ready(_) => "ready",
			Self::Errored(..) => "errored",
		}
	}
}

/// What the presentation layer renders.
///
/// `loading` and `error` are derived from `phase` and never disagree with it.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<E> {
	pub visible: Arc<[E]>,
	pub loading: bool,
	pub error: Option<Arc<str>>,
	/// Trimmed text of the query `phase` refers to.
	pub query: Arc<str>,
	pub phase: SearchPhase,
}

impl<E> ViewState<E> {
	pub(crate) fn new(visible: Arc<[E]>, query: Arc<str>, phase: SearchPhase) -> Self {
		let error = match &phase {
			SearchPhase::Errored(message, _) => Some(Arc::clone(message)),
			_ => None,
		};
		Self {
			visible,
			loading: matches!(phase, SearchPhase::Loading(_)),
			error,
			query,
			phase,
		}
	}

	/// State before any query was issued.
	pub fn idle() -> Self {
		Self::new(Arc::from(Vec::new()), Arc::from(""), SearchPhase::Idle)
	}

	/// Returns true once the latest query has resolved successfully.
	pub fn is_ready(&self) -> bool {
		matches!(self.phase, SearchPhase::Ready(_))
	}
}
