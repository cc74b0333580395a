//! Fixed-size batch producer with a blocking pause between batches.
//!
//! The pause is taken before every batch except the first, so a run of
//! N batches pauses N - 1 times and never after the last one.

use std::time::Duration;
use tracing::debug;

pub struct BatchPacer<'a, T> {
    items: &'a [T],
    batch_size: usize,
    pause: Duration,
    cursor: usize,
    batches: usize,
    pauses: usize,
}

impl<'a, T> BatchPacer<'a, T> {
    pub fn new(items: &'a [T], batch_size: usize, pause: Duration) -> Self {
        Self {
            items,
            batch_size: batch_size.max(1),
            pause,
            cursor: 0,
            batches: 0,
            pauses: 0,
        }
    }

    /// Next input-order slice, or `None` once every item has been handed out
    pub async fn next_batch(&mut self) -> Option<&'a [T]> {
        if self.cursor >= self.items.len() {
            return None;
        }

        if self.batches > 0 && !self.pause.is_zero() {
            debug!("Pausing {}ms before batch {}", self.pause.as_millis(), self.batches + 1);
            tokio::time::sleep(self.pause).await;
            self.pauses += 1;
        }

        let end = (self.cursor + self.batch_size).min(self.items.len());
        let batch = &self.items[self.cursor..end];
        self.cursor = end;
        self.batches += 1;
        Some(batch)
    }

    pub fn batches_yielded(&self) -> usize {
        self.batches
    }

    pub fn pauses_taken(&self) -> usize {
        self.pauses
    }
}
