use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::{SearchOrchestrator, SearchPhase};
use crate::classify::SearchQuery;
use crate::profile;
use crate::testing::{Guest, ScriptedRepository, guest, ids, roster};
use crate::{Repository, RepositoryError};

fn idle_view(repo: &Arc<ScriptedRepository>) -> SearchOrchestrator<Guest> {
	SearchOrchestrator::builder(Arc::clone(repo) as Arc<dyn Repository<Guest>>)
		.name("guests")
		.config(&profile::customers())
		.initial_load(false)
		.spawn()
}

fn rows(wanted: &[u32]) -> Arc<[Guest]> {
	roster().into_iter().filter(|row| wanted.contains(&row.id)).collect()
}

/// Must only publish rows for the latest issued query.
///
/// - Enforced in: `ViewShared::finish`
/// - Failure symptom: a slow response for an earlier keystroke overwrites the list for the current input.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_stale_success_is_discarded() {
	let repo = ScriptedRepository::new(roster()).shared();
	let view = idle_view(&repo);
	let shared = view.shared();

	let first = shared.begin(SearchQuery::new("0901"), false).expect("phone goes to the server");
	let second = shared.begin(SearchQuery::new("0913"), false).expect("phone goes to the server");

	assert!(!shared.finish(&first.ticket, Ok(rows(&[1]))));
	assert_eq!(view.state().phase, SearchPhase::Loading(second.ticket.token()));

	assert!(shared.finish(&second.ticket, Ok(rows(&[3]))));
	let state = view.state();
	assert_eq!(ids(&state.visible), vec![3]);
	assert_eq!(state.phase, SearchPhase::Ready(second.ticket.token()));
	assert_eq!(&*state.query, "0913");
}

/// Must not let a stale failure mask a newer result.
///
/// - Enforced in: `ViewShared::finish`
/// - Failure symptom: an error banner for an abandoned query appears over correct rows.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_stale_error_is_discarded() {
	let repo = ScriptedRepository::new(roster()).shared();
	let view = idle_view(&repo);
	let shared = view.shared();

	let first = shared.begin(SearchQuery::new("0901"), false).expect("server route");
	let second = shared.begin(SearchQuery::new("0902"), false).expect("server route");
	assert!(shared.finish(&second.ticket, Ok(rows(&[2]))));

	assert!(!shared.finish(&first.ticket, Err(RepositoryError::network("Request failed with status code 500"))));
	let state = view.state();
	assert_eq!(state.error, None);
	assert_eq!(ids(&state.visible), vec![2]);
}

/// Must treat a cancelled outcome as a no-op, never as an error.
///
/// - Enforced in: `ViewShared::finish`
/// - Failure symptom: an aborted request flashes an error message.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_cancelled_outcome_is_silent() {
	let repo = ScriptedRepository::new(roster()).shared();
	let view = idle_view(&repo);
	let shared = view.shared();

	let pending = shared.begin(SearchQuery::new("0901"), false).expect("server route");
	assert!(!shared.finish(&pending.ticket, Err(RepositoryError::Cancelled)));

	let state = view.state();
	assert_eq!(state.phase, SearchPhase::Loading(pending.ticket.token()));
	assert!(state.loading);
	assert_eq!(state.error, None);
}

/// Must not publish anything after dispose.
///
/// - Enforced in: `ViewShared::finish`, `ViewShared::begin`, `ViewShared::mutate`
/// - Failure symptom: state updates on an unmounted page.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_no_state_change_after_dispose() {
	let repo = ScriptedRepository::new(roster()).shared();
	let view = idle_view(&repo);
	let shared = view.shared();

	let pending = shared.begin(SearchQuery::new("0901"), false).expect("server route");
	let before = view.state();
	view.dispose();
	view.dispose();

	assert!(pending.ticket.is_cancelled());
	assert!(!shared.finish(&pending.ticket, Ok(rows(&[1]))));
	assert!(shared.begin(SearchQuery::new("0913"), true).is_none());
	view.notify_created(guest(5, "Phạm Thu", "0987654321", "079300111222"));
	view.refresh();

	assert!(view.is_disposed());
	assert_eq!(view.state(), before);
}

/// Must never enter `Loading` because of a local mutation.
///
/// - Enforced in: `ViewCore::apply_patch`
/// - Failure symptom: a spinner flashes after every save or delete.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_mutation_keeps_phase() {
	let repo = ScriptedRepository::new(roster()).shared();
	let view = idle_view(&repo);
	let shared = view.shared();

	let pending = shared.begin(SearchQuery::empty(), false).expect("empty cache needs a fetch");
	assert!(shared.finish(&pending.ticket, Ok(rows(&[1, 2, 3, 4]))));
	let ready = view.state().phase;

	view.notify_deleted(2);
	view.notify_updated(guest(3, "Đặng Minh Đức Anh", "0913456789", "001099012345"));
	let state = view.state();
	assert_eq!(state.phase, ready);
	assert_eq!(ids(&state.visible), vec![1, 3, 4]);
	assert_eq!(state.visible[1].name, "Đặng Minh Đức Anh");

	let next = shared.begin(SearchQuery::new("0934"), false).expect("server route");
	view.notify_deleted(1);
	assert_eq!(view.state().phase, SearchPhase::Loading(next.ticket.token()));
}

/// Must replay mutations observed during a query onto its late result.
///
/// - Enforced in: `ViewCore::complete`
/// - Failure symptom: a record deleted while a search was in flight reappears when the response lands.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_inflight_mutations_are_replayed() {
	let repo = ScriptedRepository::new(roster()).shared();
	let view = idle_view(&repo);
	let shared = view.shared();

	let pending = shared.begin(SearchQuery::new("090"), false).expect("server route");
	view.notify_deleted(1);
	view.notify_updated(guest(2, "Trần Thị Bình Minh", "0902345678", "079201005678"));
	view.notify_created(guest(6, "Phan Văn Tài", "0988111222", "079555000111"));

	assert!(shared.finish(&pending.ticket, Ok(rows(&[1, 2]))));
	let state = view.state();
	assert_eq!(ids(&state.visible), vec![2]);
	assert_eq!(state.visible[0].name, "Trần Thị Bình Minh");
}

/// Must not issue network calls for a query answerable from the snapshot.
///
/// - Enforced in: `ViewShared::begin`
/// - Failure symptom: clearing the search box or typing an email refetches the whole list.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_snapshot_answers_locally() {
	let repo = ScriptedRepository::new(roster()).shared();
	let view = idle_view(&repo);
	let shared = view.shared();

	let pending = shared.begin(SearchQuery::empty(), false).expect("empty cache needs a fetch");
	let outcome = shared.resolve(&pending).await;
	assert!(shared.finish(&pending.ticket, outcome));
	assert_eq!(repo.fetch_all_calls(), 1);

	assert!(shared.begin(SearchQuery::new("hoang.le@"), false).is_none());
	assert_eq!(ids(&view.state().visible), vec![4]);
	assert!(shared.begin(SearchQuery::empty(), false).is_none());

	let state = view.state();
	assert!(state.is_ready());
	assert!(Arc::ptr_eq(&state.visible, &view.cache().snapshot().expect("populated")));
	assert_eq!(repo.network_calls(), 1);
}

/// Must judge a local mutation against the query the visible rows came from, not the one loading.
///
/// - Enforced in: `ViewCore::apply_patch`, `ViewCore::complete`
/// - Failure symptom: a record created while a search loads lands among the previous query's
///   rows and stays there when the search fails or is cancelled.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_mutation_during_loading_uses_shown_query() {
	let repo = ScriptedRepository::new(roster()).shared();
	let view = idle_view(&repo);
	let shared = view.shared();

	let by_name = shared.begin(SearchQuery::new("Bình"), false).expect("name goes to the server");
	assert!(shared.finish(&by_name.ticket, Ok(rows(&[2]))));

	let by_phone = shared.begin(SearchQuery::new("0988"), false).expect("phone goes to the server");
	view.notify_created(guest(6, "Phan Văn Tài", "0988111222", "079555000111"));
	let loading = view.state();
	assert!(loading.loading);
	assert_eq!(ids(&loading.visible), vec![2]);

	assert!(!shared.finish(&by_phone.ticket, Err(RepositoryError::Cancelled)));
	assert_eq!(ids(&view.state().visible), vec![2]);

	assert!(shared.finish(&by_phone.ticket, Err(RepositoryError::network("Máy chủ không phản hồi"))));
	let errored = view.state();
	assert_eq!(errored.error.as_deref(), Some("Máy chủ không phản hồi"));
	assert_eq!(ids(&errored.visible), vec![2]);

	view.notify_created(guest(8, "Bình An", "0977333444", "079777333444"));
	assert_eq!(ids(&view.state().visible), vec![8, 2]);
}

/// Must replay mutations observed while loading against the query that is loading.
///
/// - Enforced in: `ViewCore::complete`
/// - Failure symptom: a record created during a search is missing from that search's result.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_mutation_during_loading_joins_matching_result() {
	let repo = ScriptedRepository::new(roster()).shared();
	let view = idle_view(&repo);
	let shared = view.shared();

	let by_name = shared.begin(SearchQuery::new("Bình"), false).expect("name goes to the server");
	assert!(shared.finish(&by_name.ticket, Ok(rows(&[2]))));

	let by_phone = shared.begin(SearchQuery::new("0988"), false).expect("phone goes to the server");
	view.notify_created(guest(6, "Phan Văn Tài", "0988111222", "079555000111"));
	assert!(shared.finish(&by_phone.ticket, Ok(rows(&[]))));

	assert_eq!(ids(&view.state().visible), vec![6]);
}
