//! Live, race-safe search for the list pages of a hotel front desk.
//!
//! A page owns one [`SearchOrchestrator`] per entity list. Keystrokes are
//! debounced into settled queries, each query is classified by shape (id
//! document, phone, email fragment, name) and routed to the cheapest source
//! that can answer it: the per-entity [`SnapshotCache`], a server-side filter
//! through the page's [`Repository`], or a local substring scan. Only the
//! latest query may publish results.
//!
//! * [`normalize`]: case and accent folding shared by every comparison.
//! * [`Classifier`]: ordered rules from a [`SearchQuery`] to a [`FilterIntent`] and [`Route`].
//! * [`SnapshotCache`]: single-flight unfiltered snapshot with copy-on-write patches.
//! * [`SearchOrchestrator`]: debounce, sequencing, and publication of [`ViewState`].
//! * [`config`]: per-view presets ([`profile`]) with TOML overrides.

mod cache;
mod classify;
pub mod config;
mod entity;
pub mod error;
mod filter;
pub mod normalize;
pub mod profile;
mod view;

#[cfg(test)]
mod testing;

pub use cache::{Patch, SnapshotCache};
pub use classify::{Classifier, FilterIntent, QueryShape, Route, Rule, SearchQuery};
pub use config::{ClassifierConfig, DigitBucket, SearchConfig, ViewConfig};
pub use entity::{Criteria, Entity, Repository, SearchFields};
pub use error::{ConfigError, RepositoryError};
pub use filter::{filter_rows, matches_intent, matches_needle};
pub use innkeep_worker::RequestToken;
pub use view::{Scope, SearchOrchestrator, SearchOrchestratorBuilder, SearchPhase, ViewState};
