use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineError {
    #[error("operation did not finish within {0:?}")]
    Elapsed(Duration),

    #[error("operation cancelled by shutdown")]
    Cancelled,
}

/// Upper bound for an awaited operation.
///
/// The wrapped future is dropped when the limit passes or the token fires,
/// so whatever it holds (pool connections, sockets) is released immediately.
#[derive(Debug, Clone)]
pub struct Deadline {
    limit: Duration,
    cancel: CancellationToken,
}

impl Deadline {
    pub fn new(limit: Duration, cancel: CancellationToken) -> Self {
        Self { limit, cancel }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub async fn run<F>(&self, fut: F) -> Result<F::Output, DeadlineError>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DeadlineError::Cancelled),
            res = tokio::time::timeout(self.limit, fut) => res.map_err(|_| DeadlineError::Elapsed(self.limit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn returns_output_when_fast() {
        let deadline = Deadline::new(Duration::from_secs(1), CancellationToken::new());
        assert_eq!(deadline.run(async { 7 }).await, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn drops_slow_future_on_elapse() {
        struct Flag(Arc<AtomicBool>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicBool::new(false));
        let guard = Flag(dropped.clone());
        let deadline = Deadline::new(Duration::from_millis(50), CancellationToken::new());

        let res = deadline
            .run(async move {
                let _guard = guard;
                tokio::time::sleep(Duration::from_secs(60)).await;
            })
            .await;

        assert_eq!(res, Err(DeadlineError::Elapsed(Duration::from_millis(50))));
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancelled_token_wins() {
        let token = CancellationToken::new();
        token.cancel();
        let deadline = Deadline::new(Duration::from_secs(60), token);
        let res = deadline.run(std::future::pending::<()>()).await;
        assert_eq!(res, Err(DeadlineError::Cancelled));
    }
}
