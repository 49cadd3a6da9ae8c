use std::sync::Arc;
use std::time::Duration;

use innkeep_worker::{CancellationToken, Debouncer, RequestSequencer, RequestTicket, TaskClass};
use parking_lot::Mutex;
use tokio::sync::watch;

use super::core::{Scope, ViewCore};
use super::state::ViewState;
use crate::cache::{Patch, SnapshotCache};
use crate::classify::{Classifier, Route, SearchQuery};
use crate::config::{DEFAULT_DEBOUNCE_MS, ViewConfig};
use crate::filter::filter_rows;
use crate::{Entity, Repository, RepositoryError};

/// A query that passed [`ViewShared::begin`] and still needs I/O.
pub(crate) struct Pending {
	pub(crate) ticket: RequestTicket,
	pub(crate) route: Route,
}

/// State shared between the handle, the debounce task, and resolution tasks.
pub(crate) struct ViewShared<E: Entity> {
	name: Arc<str>,
	sequencer: RequestSequencer,
	lifetime: CancellationToken,
	cache: Arc<SnapshotCache<E>>,
	repository: Arc<dyn Repository<E>>,
	classifier: Classifier,
	scope: Option<Scope<E>>,
	core: Mutex<ViewCore<E>>,
	state_tx: watch::Sender<ViewState<E>>,
}

impl<E: Entity> ViewShared<E> {
	fn is_live(&self) -> bool {
		!self.lifetime.is_cancelled()
	}

	/// Classifies `query` and makes it the current request.
	///
	/// Publishes `Loading` and returns the pending work when I/O is needed.
	/// When the snapshot already answers the query the result is committed
	/// immediately and `None` is returned. Repeats of the last issued query
	/// are ignored unless `force` is set.
	pub(crate) fn begin(&self, query: SearchQuery, force: bool) -> Option<Pending> {
		let (intent, route) = self.classifier.plan(&query);

		let mut core = self.core.lock();
		if !self.is_live() {
			return None;
		}
		if !force && core.is_repeat(&query) {
			tracing::trace!(view = %self.name, query = query.raw(), "view.query.repeat");
			return None;
		}

		let ticket = self.sequencer.issue(&self.lifetime);
		let token = ticket.token();
		tracing::debug!(view = %self.name, %token, intent = intent.kind(), "view.query.begin");

		let local = match &route {
			Route::Snapshot => self.cache.snapshot(),
			Route::Substring(needle) => self.cache.snapshot().map(|rows| filter_rows(&rows, needle)),
			Route::Server(_) => None,
		};

		core.start(ticket.clone(), query, intent);
		if let Some(rows) = local {
			core.complete(token, rows, self.scope.as_ref());
			tracing::debug!(view = %self.name, %token, "view.query.local");
			self.publish(&core);
			return None;
		}
		self.publish(&core);
		Some(Pending { ticket, route })
	}

	/// Performs the I/O for `pending`. Resolves to `Cancelled` as soon as its ticket is cancelled.
	pub(crate) async fn resolve(&self, pending: &Pending) -> Result<Arc<[E]>, RepositoryError> {
		let work = async {
			match &pending.route {
				Route::Snapshot => self.snapshot().await,
				Route::Substring(needle) => {
					let rows = self.snapshot().await?;
					Ok(filter_rows(&rows, needle))
				}
				Route::Server(criteria) => {
					tracing::trace!(view = %self.name, token = %pending.ticket.token(), field = criteria.field(), "view.query.server");
					self.repository.fetch_filtered(criteria, pending.ticket.cancellation()).await.map(Arc::from)
				}
			}
		};

		tokio::select! {
			biased;
			_ = pending.ticket.cancelled() => Err(RepositoryError::Cancelled),
			result = work => result,
		}
	}

	async fn snapshot(&self) -> Result<Arc<[E]>, RepositoryError> {
		let repository = Arc::clone(&self.repository);
		self.cache.get_or_fetch(move || async move { repository.fetch_all().await }).await
	}

	/// Commits the outcome of `ticket` if it is still the current request.
	///
	/// Returns true when the published state changed.
	pub(crate) fn finish(&self, ticket: &RequestTicket, outcome: Result<Arc<[E]>, RepositoryError>) -> bool {
		let token = ticket.token();
		let mut core = self.core.lock();
		if !self.is_live() {
			tracing::trace!(view = %self.name, %token, "view.result.disposed");
			return false;
		}
		if !self.sequencer.is_current(token) {
			tracing::trace!(view = %self.name, %token, "view.result.stale");
			return false;
		}

		match outcome {
			Ok(rows) => {
				tracing::debug!(view = %self.name, %token, rows = rows.len(), "view.query.ready");
				core.complete(token, rows, self.scope.as_ref());
			}
			Err(err) if err.is_cancellation() => {
				tracing::trace!(view = %self.name, %token, "view.result.cancelled");
				return false;
			}
			Err(err) => {
				tracing::warn!(view = %self.name, %token, error = %err, "view.query.failed");
				core.fail(token, err.message());
			}
		}
		self.publish(&core);
		true
	}

	/// Applies a local mutation to the snapshot and the visible rows. No I/O.
	pub(crate) fn mutate(&self, patch: Patch<E>) {
		if !self.is_live() {
			return;
		}
		self.cache.patch(patch.clone());

		let mut core = self.core.lock();
		if !self.is_live() {
			return;
		}
		if core.apply_patch(patch, self.scope.as_ref()) {
			self.publish(&core);
		}
	}

	/// Stops the view for good. Returns false if it was already disposed.
	pub(crate) fn dispose(&self) -> bool {
		let mut core = self.core.lock();
		if !self.is_live() {
			return false;
		}
		self.lifetime.cancel();
		self.sequencer.retire();
		core.abort();
		tracing::debug!(view = %self.name, "view.dispose");
		true
	}

	fn run(self: &Arc<Self>, query: SearchQuery, force: bool) {
		let Some(pending) = self.begin(query, force) else {
			return;
		};
		let shared = Arc::clone(self);
		innkeep_worker::spawn(TaskClass::Interactive, async move {
			let outcome = shared.resolve(&pending).await;
			shared.finish(&pending.ticket, outcome);
		});
	}

	fn publish(&self, core: &ViewCore<E>) {
		self.state_tx.send_replace(core.view_state());
	}
}

/// Live search over one entity list.
///
/// Feed it raw input with [`Self::set_query`] and mutation notices with the
/// `notify_*` methods; render from [`Self::subscribe`]. Dropping the handle
/// disposes the view.
pub struct SearchOrchestrator<E: Entity> {
	shared: Arc<ViewShared<E>>,
	input: Debouncer<SearchQuery>,
	state_rx: watch::Receiver<ViewState<E>>,
}

impl<E: Entity> std::fmt::Debug for SearchOrchestrator<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SearchOrchestrator")
			.field("view", &self.shared.name)
			.field("phase", &self.state_rx.borrow().phase)
			.field("disposed", &self.is_disposed())
			.finish()
	}
}

impl<E: Entity> SearchOrchestrator<E> {
	/// Starts configuring a view backed by `repository`.
	pub fn builder(repository: Arc<dyn Repository<E>>) -> SearchOrchestratorBuilder<E> {
		SearchOrchestratorBuilder::new(repository)
	}

	/// Records new raw input. It is classified once it has been stable for the debounce delay.
	pub fn set_query(&self, raw: &str) {
		if self.is_disposed() {
			return;
		}
		self.input.push(SearchQuery::new(raw));
	}

	/// Issues the pending input now instead of waiting out the debounce delay.
	pub fn flush(&self) {
		self.input.flush();
	}

	/// A record was created elsewhere in the application.
	pub fn notify_created(&self, entity: E) {
		self.shared.mutate(Patch::Insert(entity));
	}

	/// A record was edited elsewhere in the application.
	pub fn notify_updated(&self, entity: E) {
		self.shared.mutate(Patch::Update(entity));
	}

	/// A record was deleted elsewhere in the application.
	pub fn notify_deleted(&self, id: E::Id) {
		self.shared.mutate(Patch::Remove(id));
	}

	/// Drops the snapshot and reissues the current query.
	pub fn refresh(&self) {
		if self.is_disposed() {
			return;
		}
		self.shared.cache.invalidate();
		let query = self.shared.core.lock().query().clone();
		tracing::debug!(view = %self.shared.name, "view.refresh");
		self.shared.run(query, true);
	}

	/// Cancels in-flight work and stops all further state changes. Idempotent.
	pub fn dispose(&self) {
		self.shared.dispose();
	}

	pub fn is_disposed(&self) -> bool {
		!self.shared.is_live()
	}

	/// Receiver for every published [`ViewState`].
	pub fn subscribe(&self) -> watch::Receiver<ViewState<E>> {
		self.state_rx.clone()
	}

	/// The latest published state.
	pub fn state(&self) -> ViewState<E> {
		self.state_rx.borrow().clone()
	}

	pub fn cache(&self) -> &Arc<SnapshotCache<E>> {
		&self.shared.cache
	}

	pub fn classifier(&self) -> &Classifier {
		&self.shared.classifier
	}

	#[cfg(test)]
	pub(crate) fn shared(&self) -> &Arc<ViewShared<E>> {
		&self.shared
	}
}

impl<E: Entity> Drop for SearchOrchestrator<E> {
	fn drop(&mut self) {
		self.shared.dispose();
	}
}

/// Builder for [`SearchOrchestrator`].
pub struct SearchOrchestratorBuilder<E: Entity> {
	name: Arc<str>,
	repository: Arc<dyn Repository<E>>,
	classifier: Classifier,
	debounce: Duration,
	cache: Option<Arc<SnapshotCache<E>>>,
	scope: Option<Scope<E>>,
	initial_load: bool,
}

impl<E: Entity> SearchOrchestratorBuilder<E> {
	fn new(repository: Arc<dyn Repository<E>>) -> Self {
		Self {
			name: Arc::from("view"),
			repository,
			classifier: Classifier::default(),
			debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
			cache: None,
			scope: None,
			initial_load: true,
		}
	}

	/// Name attached to every trace event of this view.
	pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
		self.name = name.into();
		self
	}

	/// Applies a view preset: classifier rules and debounce delay.
	pub fn config(mut self, config: &ViewConfig) -> Self {
		self.classifier = Classifier::new(config.classifier);
		self.debounce = config.debounce();
		self
	}

	pub fn classifier(mut self, classifier: Classifier) -> Self {
		self.classifier = classifier;
		self
	}

	pub fn debounce(mut self, delay: Duration) -> Self {
		self.debounce = delay;
		self
	}

	/// Shares `cache` with other views of the same entity type.
	pub fn cache(mut self, cache: Arc<SnapshotCache<E>>) -> Self {
		self.cache = Some(cache);
		self
	}

	/// Hides rows failing `scope` from every result.
	pub fn scope(mut self, scope: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
		self.scope = Some(Arc::new(scope));
		self
	}

	/// Whether to issue the blank query on spawn. Defaults to true.
	pub fn initial_load(mut self, enabled: bool) -> Self {
		self.initial_load = enabled;
		self
	}

	/// Spawns the debounce task and, unless disabled, the initial load.
	///
	/// Must be called within a tokio runtime or after the worker's global runtime is available.
	pub fn spawn(self) -> SearchOrchestrator<E> {
		let lifetime = CancellationToken::new();
		let (state_tx, state_rx) = watch::channel(ViewState::idle());
		let shared = Arc::new(ViewShared {
			name: self.name,
			sequencer: RequestSequencer::new(),
			lifetime: lifetime.clone(),
			cache: self.cache.unwrap_or_else(SnapshotCache::new),
			repository: self.repository,
			classifier: self.classifier,
			scope: self.scope,
			core: Mutex::new(ViewCore::new()),
			state_tx,
		});

		let weak = Arc::downgrade(&shared);
		let input = Debouncer::spawn(self.debounce, lifetime.child_token(), move |query: SearchQuery| {
			if let Some(shared) = weak.upgrade() {
				shared.run(query, false);
			}
		});

		tracing::debug!(view = %shared.name, debounce = ?self.debounce, "view.spawn");
		if self.initial_load {
			shared.run(SearchQuery::empty(), false);
		}

		SearchOrchestrator { shared, input, state_rx }
	}
}
