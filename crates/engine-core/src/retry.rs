use std::{future::Future, time::Duration};
use tokio::time::sleep;

/// Whether a failed attempt is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

#[derive(Debug)]
pub enum RetryError<E> {
    /// The classifier refused to retry this error.
    Fatal(E),
    /// Every attempt failed with a retryable error; holds the last one.
    AttemptsExceeded(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal(err) | RetryError::AttemptsExceeded(err) => err,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::for_connections(2)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// Short backoff for rebuilding a database handle.
    pub fn for_connections(max_attempts: usize) -> Self {
        Self::new(
            max_attempts,
            Duration::from_millis(100),
            Duration::from_secs(2),
        )
    }

    pub async fn run<F, Fut, T, E, C>(&self, mut op: F, classify: C) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> RetryDisposition,
    {
        let mut attempt = 0;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if classify(&err) == RetryDisposition::Stop {
                return Err(RetryError::Fatal(err));
            }
            attempt += 1;
            if attempt >= self.max_attempts {
                return Err(RetryError::AttemptsExceeded(err));
            }
            sleep(self.backoff_delay(attempt - 1)).await;
        }
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        let factor = 1u32 << attempt.min(6);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick(attempts: usize) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_succeeds_on_second_attempt() {
        let calls = &AtomicUsize::new(0);
        let result = quick(2)
            .run(
                move || async move {
                    match calls.fetch_add(1, Ordering::SeqCst) {
                        0 => Err("refused"),
                        _ => Ok(42),
                    }
                },
                |_| RetryDisposition::Retry,
            )
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_attempts_exhausted() {
        let calls = &AtomicUsize::new(0);
        let result: Result<(), _> = quick(2)
            .run(
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("down")
                },
                |_| RetryDisposition::Retry,
            )
            .await;
        assert!(matches!(result, Err(RetryError::AttemptsExceeded("down"))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fatal_stops_immediately() {
        let calls = &AtomicUsize::new(0);
        let result: Result<(), _> = quick(5)
            .run(
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("bad config")
                },
                |_| RetryDisposition::Stop,
            )
            .await;
        assert_eq!(result.unwrap_err().into_inner(), "bad config");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::new(10, Duration::from_millis(100), Duration::from_millis(300));
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(4), Duration::from_millis(300));
    }
}
