//! Quiet-period debouncing for rapidly changing input.
//!
//! A [`Debouncer`] owns one background task. Each [`Debouncer::push`] replaces
//! the pending value and restarts the quiet period; the settle callback only
//! runs for a value that survives the full delay. Cancelling the scope passed to
//! [`Debouncer::spawn`] (or dropping every handle) stops the task without
//! firing the pending value.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{TaskClass, spawn};

#[derive(Debug)]
enum DebounceMsg<T> {
	Value(T),
	Flush,
}

/// Handle to a running debounce task.
#[derive(Debug)]
pub struct Debouncer<T> {
	tx: mpsc::UnboundedSender<DebounceMsg<T>>,
	cancel: CancellationToken,
	delay: Duration,
	_task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
	T: Send + 'static,
{
	/// Spawns the debounce task.
	///
	/// `on_settle` runs on the debounce task for every value that stays
	/// unsuperseded for `delay`. It never runs after `cancel` fires.
	pub fn spawn<F>(delay: Duration, cancel: CancellationToken, mut on_settle: F) -> Self
	where
		F: FnMut(T) + Send + 'static,
	{
		let (tx, mut rx) = mpsc::unbounded_channel::<DebounceMsg<T>>();
		let scope = cancel.clone();
		let task = spawn(TaskClass::Interactive, async move {
			let mut pending: Option<T> = None;
			loop {
				let Some(value) = pending.take() else {
					tokio::select! {
						biased;
						_ = scope.cancelled() => return,
						msg = rx.recv() => match msg {
							Some(DebounceMsg::Value(value)) => pending = Some(value),
							Some(DebounceMsg::Flush) => {}
							None => return,
						},
					}
					continue;
				};

				tokio::select! {
					biased;
					_ = scope.cancelled() => return,
					msg = rx.recv() => match msg {
						Some(DebounceMsg::Value(next)) => {
							tracing::trace!("debounce.superseded");
							pending = Some(next);
						}
						Some(DebounceMsg::Flush) => {
							tracing::trace!("debounce.flush");
							on_settle(value);
						}
						None => return,
					},
					_ = sleep(delay) => {
						if scope.is_cancelled() {
							return;
						}
						tracing::trace!(?delay, "debounce.settled");
						on_settle(value);
					}
				}
			}
		});

		Self {
			tx,
			cancel,
			delay,
			_task: task,
		}
	}

	/// Replaces the pending value and restarts the quiet period.
	///
	/// Returns false once the debouncer has been cancelled.
	pub fn push(&self, value: T) -> bool {
		!self.cancel.is_cancelled() && self.tx.send(DebounceMsg::Value(value)).is_ok()
	}

	/// Emits the pending value immediately, if there is one.
	pub fn flush(&self) -> bool {
		!self.cancel.is_cancelled() && self.tx.send(DebounceMsg::Flush).is_ok()
	}

	/// Stops the task; a pending value is dropped without firing.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Returns the configured quiet period.
	pub const fn delay(&self) -> Duration {
		self.delay
	}
}
