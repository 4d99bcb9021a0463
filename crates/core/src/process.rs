use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;

use crate::error::Result;

/// Concurrency cap for per-segment analysis tasks. Fan-out is one task
/// per segment; the semaphore keeps in-flight oracle calls bounded.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub max_in_flight: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self { max_in_flight: 8 }
    }
}

/// A completed per-segment result, tagged with the originating segment
/// index so out-of-order completions can be re-sorted or correlated.
#[derive(Debug, Clone)]
pub struct SegmentOutcome<T> {
    pub index: usize,
    pub value: T,
}

/// Run `f` over every item concurrently and return the successful
/// outcomes sorted back into original item order. A failing item
/// contributes nothing; the error is logged, not propagated.
pub async fn process_ordered<I, T, F, Fut>(
    items: Vec<I>,
    config: &ProcessorConfig,
    f: F,
) -> Vec<SegmentOutcome<T>>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(usize, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let mut streaming = process_streaming(items, config, f);
    let mut outcomes = Vec::new();
    while let Some(outcome) = streaming.recv().await {
        outcomes.push(outcome);
    }
    outcomes.sort_by_key(|o| o.index);
    outcomes
}

/// As-completed consumption of concurrent per-segment tasks. Outcomes
/// arrive in completion order, each tagged with its index; the stream
/// ends when every task has reported in or failed. Dropping the handle
/// aborts the remaining in-flight tasks.
pub fn process_streaming<I, T, F, Fut>(
    items: Vec<I>,
    config: &ProcessorConfig,
    f: F,
) -> StreamingOutcomes<T>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(usize, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let semaphore = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
    let f = Arc::new(f);

    let mut handles = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let tx = tx.clone();
        let semaphore = Arc::clone(&semaphore);
        let f = Arc::clone(&f);
        handles.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            match f(index, item).await {
                Ok(value) => {
                    let _ = tx.send(SegmentOutcome { index, value });
                }
                Err(err) => {
                    tracing::warn!(
                        segment = index,
                        error = %err,
                        "segment analysis failed, dropping its contribution"
                    );
                }
            }
        }));
    }
    drop(tx);

    StreamingOutcomes { rx, handles }
}

pub struct StreamingOutcomes<T> {
    rx: mpsc::UnboundedReceiver<SegmentOutcome<T>>,
    handles: Vec<JoinHandle<()>>,
}

impl<T> StreamingOutcomes<T> {
    /// Next completed outcome, in completion order. `None` once every
    /// task has finished.
    pub async fn recv(&mut self) -> Option<SegmentOutcome<T>> {
        self.rx.recv().await
    }
}

impl<T> Drop for StreamingOutcomes<T> {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KonspektError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn ordered_results_come_back_in_item_order() {
        // Earlier items sleep longer, so completion order is reversed.
        let items: Vec<u64> = vec![40, 30, 20, 10];
        let outcomes = process_ordered(items, &ProcessorConfig::default(), |index, delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(index * 10)
        })
        .await;

        let indices: Vec<usize> = outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        let values: Vec<usize> = outcomes.iter().map(|o| o.value).collect();
        assert_eq!(values, vec![0, 10, 20, 30]);
    }

    #[tokio::test]
    async fn one_failure_drops_only_that_contribution() {
        let items: Vec<usize> = (0..5).collect();
        let outcomes = process_ordered(items, &ProcessorConfig::default(), |index, n| async move {
            if n == 2 {
                Err(KonspektError::OracleRejected {
                    reason: "scripted failure".into(),
                })
            } else {
                Ok(index)
            }
        })
        .await;

        let indices: Vec<usize> = outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 1, 3, 4]);
    }

    #[tokio::test]
    async fn streaming_delivers_every_outcome_with_its_index() {
        let items: Vec<u64> = vec![30, 10, 20];
        let mut streaming =
            process_streaming(items, &ProcessorConfig::default(), |index, delay| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(index)
            });

        let mut seen = Vec::new();
        while let Some(outcome) = streaming.recv().await {
            assert_eq!(outcome.index, outcome.value);
            seen.push(outcome.index);
        }
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn in_flight_tasks_respect_the_concurrency_cap() {
        static IN_FLIGHT: AtomicUsize = AtomicUsize::new(0);
        static PEAK: AtomicUsize = AtomicUsize::new(0);

        let config = ProcessorConfig { max_in_flight: 2 };
        let items: Vec<usize> = (0..8).collect();
        let outcomes = process_ordered(items, &config, |index, _| async move {
            let now = IN_FLIGHT.fetch_add(1, Ordering::SeqCst) + 1;
            PEAK.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            IN_FLIGHT.fetch_sub(1, Ordering::SeqCst);
            Ok(index)
        })
        .await;

        assert_eq!(outcomes.len(), 8);
        assert!(PEAK.load(Ordering::SeqCst) <= 2);
    }
}
