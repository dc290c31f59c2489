use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::warn;

/// Runs `f` over every item with at most `limit` invocations in flight.
/// Results come back in item order. A panicking task loses its slot in the
/// output and is logged rather than taking the whole run down.
pub async fn for_each_bounded<T, R, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let f = Arc::new(f);

    let mut handles = Vec::with_capacity(items.len());
    for item in items {
        let semaphore = semaphore.clone();
        let f = f.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore never closed");
            f(item).await
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(result) => results.push(result),
            Err(err) => warn!(%err, "fanout task panicked"),
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_concurrency_limit() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let items: Vec<usize> = (0..20).collect();
        let f = {
            let active = active.clone();
            let peak = peak.clone();
            move |i: usize| {
                let active = active.clone();
                let peak = peak.clone();
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    i * 2
                }
            }
        };

        let results = for_each_bounded(items, 3, f).await;

        assert_eq!(results.len(), 20);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn preserves_item_order() {
        let items: Vec<usize> = (0..10).collect();
        let results = for_each_bounded(items, 4, |i: usize| async move {
            // Later items finish first to stress ordering.
            tokio::time::sleep(Duration::from_millis((10 - i as u64) * 2)).await;
            i
        })
        .await;
        assert_eq!(results, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let results = for_each_bounded(Vec::<usize>::new(), 3, |i: usize| async move { i }).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn zero_limit_is_clamped_to_one() {
        let items: Vec<usize> = vec![1, 2, 3];
        let results = for_each_bounded(items, 0, |i: usize| async move { i }).await;
        assert_eq!(results, vec![1, 2, 3]);
    }
}
