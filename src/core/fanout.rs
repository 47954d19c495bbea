use crate::utils::error::{LensError, Result};
use futures::stream::{self, StreamExt};
use std::future::Future;

/// Upper bound on items processed concurrently within one request.
pub const MAX_FANOUT: usize = 10;

pub fn ensure_fanout_size(what: &str, len: usize) -> Result<()> {
    if len == 0 {
        return Err(LensError::validation(format!("{} must not be empty", what)));
    }
    if len > MAX_FANOUT {
        return Err(LensError::validation(format!(
            "at most {} {} per request, got {}",
            MAX_FANOUT, what, len
        )));
    }
    Ok(())
}

/// Run `task` for every item with bounded concurrency.
///
/// Results come back in input order and each item keeps its own `Result`; a
/// failure never cancels the remaining items.
pub async fn fan_out<I, T, F, Fut>(items: Vec<I>, concurrency: usize, task: F) -> Vec<Result<T>>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let limit = concurrency.clamp(1, MAX_FANOUT);
    stream::iter(items.into_iter().map(task))
        .buffered(limit)
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fan_out_isolates_failures_and_keeps_order() {
        let results = fan_out(vec![1u64, 2, 3, 4], 4, |n| async move {
            tokio::time::sleep(Duration::from_millis(40 - n * 10)).await;
            if n == 2 {
                Err(LensError::processing("item 2 failed"))
            } else {
                Ok(n * 10)
            }
        })
        .await;

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap(), &10);
        assert!(results[1].is_err());
        assert_eq!(results[3].as_ref().unwrap(), &40);
    }

    #[tokio::test]
    async fn test_fan_out_respects_limit() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = fan_out((0..10).collect::<Vec<_>>(), 3, |_| {
            let running = running.clone();
            let peak = peak.clone();
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, LensError>(())
            }
        })
        .await;

        assert_eq!(results.len(), 10);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn test_ensure_fanout_size() {
        assert!(ensure_fanout_size("items", 10).is_ok());
        assert!(ensure_fanout_size("items", 11).is_err());
        assert!(ensure_fanout_size("items", 0).is_err());
    }
}
