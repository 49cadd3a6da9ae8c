//! Async runtime primitives shared by innkeep list views.
//!
//! * [`TaskClass`] tags spawned work for tracing.
//! * [`RequestSequencer`] and [`RequestTicket`] gate asynchronous continuations by generation.
//! * [`Debouncer`] delays a rapidly changing value until it has been stable for a quiet period.

mod class;
mod debounce;
mod spawn;
mod token;

pub use class::TaskClass;
pub use debounce::Debouncer;
pub use spawn::spawn;
pub use token::{RequestSequencer, RequestTicket, RequestToken};
pub use tokio_util::sync::CancellationToken;
