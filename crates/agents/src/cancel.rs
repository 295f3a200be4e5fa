//! Cancellation plumbing shared by the stages

use crate::{AgentError, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Race `future` against `cancel`. Cancellation wins ties and drops the
/// in-flight call.
pub async fn or_cancelled<F, T>(cancel: &CancellationToken, future: F) -> Result<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AgentError::Cancelled),
        output = future => Ok(output),
    }
}
