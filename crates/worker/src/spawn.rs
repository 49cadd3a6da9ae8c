use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::TaskClass;

/// Runtime used when a view is driven from outside any tokio context.
fn fallback_runtime() -> &'static Runtime {
	static FALLBACK: OnceLock<Runtime> = OnceLock::new();
	FALLBACK.get_or_init(|| {
		Builder::new_multi_thread()
			.enable_all()
			.worker_threads(1)
			.thread_name("innkeep-worker")
			.build()
			.expect("failed to build innkeep-worker fallback runtime")
	})
}

/// Spawns `fut` on the ambient runtime, or on a lazily built fallback runtime
/// when the caller is not inside one.
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	match Handle::try_current() {
		Ok(handle) => {
			tracing::trace!(worker_class = class.as_str(), "worker.spawn");
			handle.spawn(fut)
		}
		Err(_) => {
			tracing::trace!(worker_class = class.as_str(), "worker.spawn.fallback");
			fallback_runtime().spawn(fut)
		}
	}
}
