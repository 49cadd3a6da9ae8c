//! Debounced, generation-gated search over one entity list.
//!
//! # Purpose
//!
//! * Turns keystrokes into at most one settled query per quiet period.
//! * Routes each query to the snapshot, a server filter, or a local scan.
//! * Guarantees the published rows always belong to the latest query.
//! * Folds create/update/delete notices into the snapshot and the visible rows without refetching.
//!
//! # Mental model
//!
//! * [`SearchOrchestrator`] is a handle over shared view state:
//!   * raw input goes through a [`innkeep_worker::Debouncer`];
//!   * every settled query gets a fresh [`innkeep_worker::RequestTicket`] from the view's sequencer;
//!   * resolution runs on a spawned task and hands its outcome back with the ticket.
//! * The sequencer is the gate: an outcome is committed only if its ticket is still current.
//! * A newer query cancels the previous ticket, so superseded server calls are aborted rather than ignored.
//! * All state transitions happen under one lock in `core.rs`. Nothing awaits while holding it.
//!
//! # Key types
//!
//! | Type | Meaning | Constraints | Constructed / mutated in |
//! |---|---|---|---|
//! | [`SearchOrchestrator`] | Handle owned by the list page | Must dispose on drop | [`SearchOrchestratorBuilder::spawn`] |
//! | [`ViewState`] | Published render state | `loading`/`error` must agree with `phase` | `ViewCore::view_state` |
//! | [`SearchPhase`] | Lifecycle of the latest query | Must carry the token of the query it describes | `ViewCore::start`/`complete`/`fail` |
//! | `ViewCore` | Lock-protected state machine | Must not await | `core.rs` |
//! | `Pending` | A begun query still needing I/O | Must be finished with its own ticket | `ViewShared::begin` |
//!
//! # Invariants
//!
//! * Must only publish rows for the latest issued query.
//! * Must treat a cancelled outcome as a no-op, never as an error.
//! * Must not publish anything after dispose.
//! * Must never enter `Loading` because of a local mutation.
//! * Must replay mutations observed during a query onto its late result.
//! * Must not issue network calls for a query answerable from the snapshot.
//!
//! # Data flow
//!
//! 1. `set_query(raw)` pushes a trimmed [`crate::SearchQuery`] into the debouncer.
//! 2. After the quiet period the debouncer calls `ViewShared::run`.
//! 3. `begin` classifies, issues a ticket, cancels the previous one, and publishes `Loading`.
//!    When the snapshot answers the route the result is committed right here.
//! 4. Otherwise a task resolves the route and calls `finish(ticket, outcome)`.
//! 5. `finish` drops stale, disposed, and cancelled outcomes; commits the rest and publishes.
//!
//! # Lifecycle
//!
//! * Build with [`SearchOrchestrator::builder`], apply a preset with `config`, then `spawn`.
//! * Unless `initial_load(false)`, the blank query is issued at spawn.
//! * Call `notify_created`/`notify_updated`/`notify_deleted` after successful mutations.
//! * Call `refresh` to drop the snapshot and reissue the current query.
//! * Call `dispose` (or drop the handle) when the page goes away.
//!
//! # Concurrency & ordering
//!
//! * Arrival order of responses is irrelevant; only the current ticket commits.
//! * The debounce task, resolution tasks, and the caller may race on the core lock; each transition is atomic.
//! * The snapshot cache has its own lock. It is taken inside the core lock, never the other way round.
//!
//! # Failure modes & recovery
//!
//! * Repository error: phase becomes `Errored`, previous rows stay visible, the next query clears it.
//! * Snapshot fetch error: the cache stays empty and the next snapshot route retries.
//! * Cancelled request: silently dropped.
//! * Repeated identical query: ignored; use `refresh` to force a refetch.

mod core;
mod orchestrator;
mod state;

pub use self::core::Scope;
pub use orchestrator::{SearchOrchestrator, SearchOrchestratorBuilder};
pub use state::{SearchPhase, ViewState};

#[cfg(test)]
mod invariants;
