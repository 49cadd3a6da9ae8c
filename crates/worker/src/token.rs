use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Generation identity of one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
	/// Returns the raw generation number.
	pub const fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for RequestToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Monotonic generation clock for one view's requests.
///
/// The most recently issued token is the only current one. Once retired, no
/// token (issued before or after) is ever current again.
#[derive(Debug, Default)]
pub struct RequestSequencer {
	current: AtomicU64,
	retired: AtomicBool,
}

impl RequestSequencer {
	/// Creates a sequencer whose first token is `#1`.
	pub fn new() -> Self {
		Self::default()
	}

	/// Issues the next token and makes it current.
	pub fn next(&self) -> RequestToken {
		RequestToken(self.current.fetch_add(1, Ordering::AcqRel).wrapping_add(1))
	}

	/// Issues the next token together with a cancellation scope derived from `parent`.
	pub fn issue(&self, parent: &CancellationToken) -> RequestTicket {
		RequestTicket::new(self.next(), parent.child_token())
	}

	/// Returns the latest issued token, if any.
	pub fn current(&self) -> Option<RequestToken> {
		match self.current.load(Ordering::Acquire) {
			0 => None,
			generation => Some(RequestToken(generation)),
		}
	}

	/// Returns true when `token` is the latest issued token and the sequencer is live.
	pub fn is_current(&self, token: RequestToken) -> bool {
		!self.retired.load(Ordering::Acquire) && self.current.load(Ordering::Acquire) == token.0
	}

	/// Makes every token permanently stale.
	pub fn retire(&self) {
		self.retired.store(true, Ordering::Release);
	}

	/// Returns true once [`Self::retire`] has been called.
	pub fn is_retired(&self) -> bool {
		self.retired.load(Ordering::Acquire)
	}
}

/// Generation-scoped cancellation handle carried through one request's continuations.
#[derive(Debug, Clone)]
pub struct RequestTicket {
	token: RequestToken,
	cancel: CancellationToken,
}

impl RequestTicket {
	/// Creates a ticket from an issued token and its cancellation scope.
	pub fn new(token: RequestToken, cancel: CancellationToken) -> Self {
		Self { token, cancel }
	}

	/// Returns the generation token.
	pub const fn token(&self) -> RequestToken {
		self.token
	}

	/// Returns true when cancellation is requested.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Requests cancellation.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Future resolving when cancellation is requested.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}

	/// Returns a clone of the cancellation scope, for handing to collaborators.
	pub fn cancellation(&self) -> CancellationToken {
		self.cancel.clone()
	}
}
