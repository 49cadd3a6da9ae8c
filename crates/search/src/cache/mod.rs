//! Per-entity snapshot of the unfiltered list.
//!
//! # Mental model
//!
//! The cache is a three-state slot:
//!
//! * `Empty`: nothing fetched yet, or invalidated, or the last fetch failed.
//! * `Populating`: exactly one `fetch_all` is in flight. Every caller of
//!   [`SnapshotCache::get_or_fetch`] awaits the same shared future. Patches
//!   arriving now are journaled and replayed onto the fetched rows.
//! * `Ready`: the snapshot. Patches rebuild it copy-on-write.
//!
//! # Invariants
//!
//! * Must run at most one population fetch at a time.
//! * Must not stay poisoned after a failed fetch.
//! * Must not let a population started before [`SnapshotCache::invalidate`] repopulate the slot.
//! * Must hand out immutable `Arc<[E]>` snapshots only.
//!
//! The population runs as its own task, so a caller dropping its wait (for
//! example a superseded query) does not stall the fetch for other callers.

mod patch;

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use innkeep_worker::TaskClass;
use parking_lot::Mutex;
use tokio::sync::oneshot;

pub use patch::Patch;

use crate::{Entity, RepositoryError};

type SharedFetch<E> = Shared<BoxFuture<'static, Result<Arc<[E]>, RepositoryError>>>;

enum Slot<E: Entity> {
	Empty,
	Populating {
		epoch: u64,
		fetch: SharedFetch<E>,
		journal: Vec<Patch<E>>,
	},
	Ready(Arc<[E]>),
}

struct CacheState<E: Entity> {
	slot: Slot<E>,
	next_epoch: u64,
	fetches: u64,
}

/// Unfiltered snapshot shared by every view of one entity type.
pub struct SnapshotCache<E: Entity> {
	state: Mutex<CacheState<E>>,
}

impl<E: Entity> std::fmt::Debug for SnapshotCache<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.lock();
		let slot = match &state.slot {
			Slot::Empty => "empty",
			Slot::Populating { .. } => "populating",
			Slot::Ready(_) => "ready",
		};
		f.debug_struct("SnapshotCache").field("slot", &slot).field("fetches", &state.fetches).finish()
	}
}

impl<E: Entity> Default for SnapshotCache<E> {
	fn default() -> Self {
		Self {
			state: Mutex::new(CacheState {
				slot: Slot::Empty,
				next_epoch: 0,
				fetches: 0,
			}),
		}
	}
}

impl<E: Entity> SnapshotCache<E> {
	/// Creates an empty cache.
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Returns the snapshot if populated. Never fetches.
	pub fn snapshot(&self) -> Option<Arc<[E]>> {
		match &self.state.lock().slot {
			Slot::Ready(rows) => Some(Arc::clone(rows)),
			_ => None,
		}
	}

	/// Returns true once a snapshot is held.
	pub fn is_populated(&self) -> bool {
		matches!(self.state.lock().slot, Slot::Ready(_))
	}

	/// Returns true while a population fetch is in flight.
	pub fn is_populating(&self) -> bool {
		matches!(self.state.lock().slot, Slot::Populating { .. })
	}

	/// Number of population fetches started so far.
	pub fn fetch_count(&self) -> u64 {
		self.state.lock().fetches
	}

	/// Returns the snapshot, running `fetch_all` only when nothing is held or in flight.
	///
	/// Concurrent callers share one in-flight fetch. A failed fetch leaves the
	/// cache empty so a later call retries. `fetch_all` runs without the cache
	/// lock held, so it may inspect this cache.
	pub async fn get_or_fetch<F, Fut>(self: &Arc<Self>, fetch_all: F) -> Result<Arc<[E]>, RepositoryError>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<Vec<E>, RepositoryError>> + Send + 'static,
	{
		let (fetch, start) = {
			let mut state = self.state.lock();
			match &state.slot {
				Slot::Ready(rows) => return Ok(Arc::clone(rows)),
				Slot::Populating { fetch, .. } => {
					tracing::trace!("snapshot.fetch.coalesced");
					(fetch.clone(), None)
				}
				Slot::Empty => {
					state.next_epoch = state.next_epoch.wrapping_add(1);
					state.fetches = state.fetches.wrapping_add(1);
					let epoch = state.next_epoch;
					let (done, fetch) = self.reserve_population(epoch);
					state.slot = Slot::Populating {
						epoch,
						fetch: fetch.clone(),
						journal: Vec::new(),
					};
					tracing::debug!(epoch, "snapshot.fetch.start");
					(fetch, Some((epoch, done)))
				}
			}
		};

		if let Some((epoch, done)) = start {
			let fut = fetch_all();
			let cache = Arc::clone(self);
			innkeep_worker::spawn(TaskClass::Background, async move {
				let result = fut.await;
				let _ = done.send(cache.complete(epoch, result));
			});
		}
		fetch.await
	}

	/// Builds the shared future every caller awaits for population `epoch`.
	///
	/// It resolves when the population task reports through `done`. A task that
	/// dies without reporting releases the slot.
	fn reserve_population(self: &Arc<Self>, epoch: u64) -> (oneshot::Sender<Result<Arc<[E]>, RepositoryError>>, SharedFetch<E>) {
		let (done, outcome) = oneshot::channel();
		let cache = Arc::clone(self);
		let fetch = async move {
			match outcome.await {
				Ok(result) => result,
				Err(_) => {
					cache.abandon(epoch);
					Err(RepositoryError::network("snapshot fetch task failed"))
				}
			}
		}
		.boxed()
		.shared();
		(done, fetch)
	}

	fn complete(&self, epoch: u64, result: Result<Vec<E>, RepositoryError>) -> Result<Arc<[E]>, RepositoryError> {
		let mut state = self.state.lock();
		let journal = match &mut state.slot {
			Slot::Populating { epoch: active, journal, .. } if *active == epoch => std::mem::take(journal),
			_ => {
				tracing::debug!(epoch, "snapshot.fetch.superseded");
				return result.map(Arc::from);
			}
		};

		match result {
			Ok(mut rows) => {
				for patch in &journal {
					patch.apply(&mut rows);
				}
				let snapshot: Arc<[E]> = Arc::from(rows);
				tracing::debug!(epoch, rows = snapshot.len(), replayed = journal.len(), "snapshot.fetch.ready");
				state.slot = Slot::Ready(Arc::clone(&snapshot));
				Ok(snapshot)
			}
			Err(err) => {
				tracing::debug!(epoch, error = %err, "snapshot.fetch.failed");
				state.slot = Slot::Empty;
				Err(err)
			}
		}
	}

	fn abandon(&self, epoch: u64) {
		let mut state = self.state.lock();
		if matches!(&state.slot, Slot::Populating { epoch: active, .. } if *active == epoch) {
			state.slot = Slot::Empty;
		}
	}

	/// Applies `patch` to the held snapshot, or journals it while a fetch is in flight.
	///
	/// Returns false when there is nothing to patch.
	pub fn patch(&self, patch: Patch<E>) -> bool {
		let mut state = self.state.lock();
		match &mut state.slot {
			Slot::Ready(rows) => {
				let mut next = rows.to_vec();
				let changed = patch.apply(&mut next);
				if changed {
					*rows = Arc::from(next);
				}
				changed
			}
			Slot::Populating { journal, .. } => {
				journal.push(patch);
				true
			}
			Slot::Empty => false,
		}
	}

	/// Prepends a newly created record.
	pub fn patch_insert(&self, entity: E) -> bool {
		self.patch(Patch::Insert(entity))
	}

	/// Replaces the record with the same id.
	pub fn patch_update(&self, entity: E) -> bool {
		self.patch(Patch::Update(entity))
	}

	/// Removes the record with `id`.
	pub fn patch_remove(&self, id: E::Id) -> bool {
		self.patch(Patch::Remove(id))
	}

	/// Drops the snapshot; the next [`Self::get_or_fetch`] refetches.
	pub fn invalidate(&self) {
		let mut state = self.state.lock();
		if !matches!(state.slot, Slot::Empty) {
			tracing::debug!("snapshot.invalidate");
		}
		state.slot = Slot::Empty;
	}
}
