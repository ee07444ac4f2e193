//! Token-driven cancellation for cooperative invocations.
//!
//! Dropping an invocation future already cancels it and releases any session it
//! owns; [`run_cancellable`] does the same when a [`CancellationToken`] fires,
//! reporting [`Error::Cancelled`] instead of silently vanishing.

use crate::{Error, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Drive `fut` until it completes or `token` is cancelled, whichever is first.
///
/// A token cancelled before the call starts wins; `fut` is never polled.
pub async fn run_cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!("invocation cancelled");
            Err(Error::Cancelled)
        }
        result = fut => result,
    }
}
