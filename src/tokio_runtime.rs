//! Global Tokio runtime
//!
//! Session tickers run as tasks on this runtime, and the command loops use
//! it to wait on signals and stdin. Lazily initialized on first use.

use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::Runtime;

static TOKIO_RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn runtime() -> &'static Runtime {
    TOKIO_RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("murmur-rt")
            .enable_all()
            .build()
            .expect("Failed to create Tokio runtime")
    })
}

/// Get the global Tokio runtime handle
pub fn handle() -> tokio::runtime::Handle {
    runtime().handle().clone()
}

/// Run a future to completion on the global runtime from synchronous code
pub fn block_on<F: Future>(future: F) -> F::Output {
    runtime().block_on(future)
}
