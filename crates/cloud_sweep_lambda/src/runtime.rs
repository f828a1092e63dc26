use std::future::Future;

/// Runs an SDK future to completion from synchronous handler code.
///
/// Requires the multi-threaded tokio runtime the Lambda binaries start with.
pub fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// JSON log lines on stdout. CloudWatch stamps time and stream itself.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_target(false)
        .without_time()
        .with_max_level(tracing::Level::INFO)
        .init();
}
