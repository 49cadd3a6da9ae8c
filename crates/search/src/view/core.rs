//! Lock-protected view state and its pure transitions.
//!
//! Nothing here awaits or spawns. The orchestrator takes the lock, calls one
//! transition, publishes, and releases.

use std::sync::Arc;

use innkeep_worker::{RequestTicket, RequestToken};

use super::state::{SearchPhase, ViewState};
use crate::Entity;
use crate::cache::Patch;
use crate::classify::{FilterIntent, SearchQuery};
use crate::filter::matches_intent;

/// Visibility predicate applied on top of every result.
pub type Scope<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// The query currently resolving, plus mutations observed since it was issued.
struct InFlight<E: Entity> {
	ticket: RequestTicket,
	patches: Vec<Patch<E>>,
}

pub(crate) struct ViewCore<E: Entity> {
	phase: SearchPhase,
	query: SearchQuery,
	/// Intent of the latest issued query.
	intent: FilterIntent,
	/// Intent `visible` was computed for; lags `intent` while a query is loading.
	/// `None` until the first result lands.
	shown_intent: Option<FilterIntent>,
	visible: Arc<[E]>,
	inflight: Option<InFlight<E>>,
	settled: Option<SearchQuery>,
}

impl<E: Entity> ViewCore<E> {
	pub(crate) fn new() -> Self {
		Self {
			phase: SearchPhase::Idle,
			query: SearchQuery::empty(),
			intent: FilterIntent::Empty,
			shown_intent: None,
			visible: Arc::from(Vec::new()),
			inflight: None,
			settled: None,
		}
	}

	pub(crate) fn query(&self) -> &SearchQuery {
		&self.query
	}

	/// Returns true when `query` equals the last query issued.
	pub(crate) fn is_repeat(&self, query: &SearchQuery) -> bool {
		self.settled.as_ref().is_some_and(|settled| settled.raw() == query.raw())
	}

	/// Enters `Loading` for `ticket`, cancelling whatever was in flight.
	pub(crate) fn start(&mut self, ticket: RequestTicket, query: SearchQuery, intent: FilterIntent) {
		if let Some(previous) = self.inflight.take() {
			previous.ticket.cancel();
		}
		self.phase = SearchPhase::Loading(ticket.token());
		self.settled = Some(query.clone());
		self.query = query;
		self.intent = intent;
		self.inflight = Some(InFlight {
			ticket,
			patches: Vec::new(),
		});
	}

	/// Commits `rows` as the result of `token`.
	///
	/// Mutations observed while the query was in flight are replayed onto the
	/// rows so a late response cannot resurrect a deleted record.
	pub(crate) fn complete(&mut self, token: RequestToken, rows: Arc<[E]>, scope: Option<&Scope<E>>) {
		let patches = self.take_inflight(token);
		let mut rows = scoped(rows, scope);
		if !patches.is_empty() {
			let mut next = rows.to_vec();
			for patch in &patches {
				patch_visible(&mut next, patch, &self.intent, scope);
			}
			rows = Arc::from(next);
		}
		self.visible = rows;
		self.shown_intent = Some(self.intent.clone());
		self.phase = SearchPhase::Ready(token);
	}

	/// Records a failure for `token`. `visible` keeps its previous rows.
	pub(crate) fn fail(&mut self, token: RequestToken, message: Arc<str>) {
		self.take_inflight(token);
		self.phase = SearchPhase::Errored(message, token);
	}

	/// Applies a local mutation to the visible rows and remembers it for the query in flight.
	///
	/// Visible rows are judged against the query they came from, not the one
	/// loading. Returns true when the visible rows changed. The phase is never touched.
	pub(crate) fn apply_patch(&mut self, patch: Patch<E>, scope: Option<&Scope<E>>) -> bool {
		let changed = match &self.shown_intent {
			Some(shown) => {
				let mut next = self.visible.to_vec();
				let changed = patch_visible(&mut next, &patch, shown, scope);
				if changed {
					self.visible = Arc::from(next);
				}
				changed
			}
			None => false,
		};
		if let Some(inflight) = &mut self.inflight {
			inflight.patches.push(patch);
		}
		changed
	}

	/// Cancels the query in flight. Called once, on dispose.
	pub(crate) fn abort(&mut self) {
		if let Some(inflight) = self.inflight.take() {
			inflight.ticket.cancel();
		}
	}

	pub(crate) fn view_state(&self) -> ViewState<E> {
		ViewState::new(Arc::clone(&self.visible), self.query.raw_arc(), self.phase.clone())
	}

	fn take_inflight(&mut self, token: RequestToken) -> Vec<Patch<E>> {
		match self.inflight.take() {
			Some(inflight) if inflight.ticket.token() == token => inflight.patches,
			other => {
				self.inflight = other;
				Vec::new()
			}
		}
	}
}

fn scoped<E: Entity>(rows: Arc<[E]>, scope: Option<&Scope<E>>) -> Arc<[E]> {
	match scope {
		Some(scope) if !rows.iter().all(|row| scope(row)) => rows.iter().filter(|row| scope(row)).cloned().collect(),
		_ => rows,
	}
}

/// Applies `patch` to rows already filtered for `intent`.
///
/// A created record only joins when it plausibly matches the current query.
/// A record edited out of scope leaves the list.
fn patch_visible<E: Entity>(rows: &mut Vec<E>, patch: &Patch<E>, intent: &FilterIntent, scope: Option<&Scope<E>>) -> bool {
	let in_scope = |entity: &E| scope.is_none_or(|scope| scope(entity));
	match patch {
		Patch::Insert(entity) if !in_scope(entity) || !matches_intent(entity, intent) => false,
		Patch::Update(entity) if !in_scope(entity) => Patch::<E>::Remove(entity.id()).apply(rows),
		_ => patch.apply(rows),
	}
}
