// ABOUTME: Detached best-effort tasks whose failures are logged, never surfaced
// ABOUTME: Provides a bounded join for the few places that need completion ordering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::future::Future;
use std::time::Duration;

use bubble_core::errors::AppResult;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{warn, Instrument, Span};

use crate::logging::AppLogger;

/// Spawn `operation` detached; resolves to whether it succeeded
///
/// Failures are logged as degraded writes against `user_id`.
pub fn spawn_best_effort<F>(operation: &'static str, user_id: String, task: F) -> JoinHandle<bool>
where
    F: Future<Output = AppResult<()>> + Send + 'static,
{
    tokio::spawn(
        async move {
            match task.await {
                Ok(()) => true,
                Err(e) => {
                    AppLogger::log_degraded_write(operation, &user_id, &e);
                    false
                }
            }
        }
        .instrument(Span::current()),
    )
}

/// Await a best-effort task for at most `limit`
///
/// On timeout the task keeps running detached. Returns whether it finished
/// successfully within the limit.
pub async fn join_bounded(handle: JoinHandle<bool>, limit: Duration, operation: &str) -> bool {
    match timeout(limit, handle).await {
        Ok(Ok(succeeded)) => succeeded,
        Ok(Err(e)) => {
            warn!(operation = %operation, error = %e, "Background task aborted");
            false
        }
        Err(_) => {
            warn!(
                operation = %operation,
                limit_ms = limit.as_millis(),
                "Background task still running, continuing without it"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_core::errors::AppError;

    #[tokio::test]
    async fn test_join_reports_outcome() {
        let ok = spawn_best_effort("ok", "u1".to_owned(), async { Ok(()) });
        assert!(join_bounded(ok, Duration::from_secs(1), "ok").await);

        let failed = spawn_best_effort("fail", "u1".to_owned(), async {
            Err(AppError::database("down"))
        });
        assert!(!join_bounded(failed, Duration::from_secs(1), "fail").await);
    }

    #[tokio::test]
    async fn test_join_times_out() {
        let slow = spawn_best_effort("slow", "u1".to_owned(), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        });
        assert!(!join_bounded(slow, Duration::from_millis(20), "slow").await);
    }
}
