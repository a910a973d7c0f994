//! Per-venue call pacing.
//!
//! Calls to one venue are serialised through an async mutex. Each call waits
//! until the previous call's completion plus the venue's minimum interval,
//! then runs and records its own completion instant.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct Pacer {
    interval: Duration,
    last_completed: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_completed: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `call` once the venue is free and its interval has elapsed.
    pub async fn run<F, T>(&self, call: F) -> T
    where
        F: Future<Output = T>,
    {
        let mut last = self.last_completed.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.interval).await;
        }
        let output = call.await;
        *last = Some(Instant::now());
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_immediate() {
        let pacer = Pacer::new(Duration::from_millis(100));
        let start = Instant::now();
        pacer.run(async {}).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_follows_completion() {
        let pacer = Pacer::new(Duration::from_millis(100));
        let start = Instant::now();

        pacer
            .run(tokio::time::sleep(Duration::from_millis(30)))
            .await;
        let second_started = pacer.run(async { Instant::now() }).await;

        // 30ms call + 100ms gap
        assert_eq!(second_started - start, Duration::from_millis(130));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_calls_are_serialised() {
        let pacer = Arc::new(Pacer::new(Duration::from_millis(50)));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let pacer = Arc::clone(&pacer);
                tokio::spawn(async move { pacer.run(async { Instant::now() }).await })
            })
            .collect();

        let mut started = Vec::new();
        for handle in handles {
            started.push(handle.await.unwrap() - start);
        }
        started.sort();
        assert_eq!(
            started,
            vec![
                Duration::ZERO,
                Duration::from_millis(50),
                Duration::from_millis(100)
            ]
        );
    }
}
