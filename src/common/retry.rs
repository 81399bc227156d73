// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry an async operation with exponential backoff.
///
/// Used for read-only queries (nonce, fee history, metadata) only; workflow
/// submissions go out exactly once.
pub async fn retry_async<F, Fut, T, E>(
    mut op: F,
    attempts: usize,
    initial_delay: Duration,
) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = initial_delay;
    let last = attempts.max(1);
    for attempt in 1..last {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(_) => {
                tracing::debug!(target: "retry", attempt, "Attempt failed; backing off");
                sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
        }
    }
    op(last).await
}
