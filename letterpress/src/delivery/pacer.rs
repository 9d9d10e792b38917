use std::time::Duration;

/// Outbound transport allows at most this many recipients per request
const TRANSPORT_BATCH_CEILING: usize = 50;
/// Pause between batches to stay under the transport rate limit
const INTER_BATCH_PAUSE: Duration = Duration::from_millis(500);

/// Fixed-window rate limiting for the dispatch loop, decoupled from the
/// delivery semantics so the batch size and pause can change without
/// touching the executor.
#[derive(Debug, Clone)]
pub struct BatchPacer {
    batch_size: usize,
    pause: Duration,
}

impl BatchPacer {
    pub fn new(batch_size: usize, pause: Duration) -> Self {
        assert!(batch_size > 0, "batch size must be non-zero");
        Self { batch_size, pause }
    }

    /// Partition a recipient list into transport-sized batches
    pub fn batches<'a, T>(&self, items: &'a [T]) -> std::slice::Chunks<'a, T> {
        items.chunks(self.batch_size)
    }

    /// Wait out the inter-batch window
    pub async fn pause(&self) {
        tokio::time::sleep(self.pause).await;
    }
}

impl Default for BatchPacer {
    fn default() -> Self {
        Self::new(TRANSPORT_BATCH_CEILING, INTER_BATCH_PAUSE)
    }
}
