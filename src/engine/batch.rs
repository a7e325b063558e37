use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Observes the engine's generation counter. A pass is superseded once a newer one starts.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    latest: watch::Receiver<u64>,
    generation: u64,
}

impl CancelSignal {
    pub(crate) fn new(latest: watch::Receiver<u64>, generation: u64) -> Self {
        Self { latest, generation }
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        let (_sender, latest) = watch::channel(0);
        Self {
            latest,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        *self.latest.borrow() != self.generation
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed { batches: usize, items: usize },
    Cancelled { batches: usize, items: usize },
}

impl BatchOutcome {
    pub fn batches(self) -> usize {
        match self {
            Self::Completed { batches, .. } | Self::Cancelled { batches, .. } => batches,
        }
    }

    pub fn items(self) -> usize {
        match self {
            Self::Completed { items, .. } | Self::Cancelled { items, .. } => items,
        }
    }

    pub fn is_cancelled(self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Hands `items` to `render_batch` in chunks of `batch_size`, yielding to the runtime
/// between chunks. A superseded pass stops before its next chunk.
pub async fn render_in_batches<'a, T, F, Fut>(
    items: &'a [T],
    batch_size: usize,
    cancel: &CancelSignal,
    mut render_batch: F,
) -> BatchOutcome
where
    F: FnMut(&'a [T]) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut batches = 0usize;
    let mut rendered = 0usize;
    let mut chunks = items.chunks(batch_size.max(1)).peekable();

    while let Some(chunk) = chunks.next() {
        if cancel.is_cancelled() {
            return BatchOutcome::Cancelled {
                batches,
                items: rendered,
            };
        }

        render_batch(chunk).await;
        batches += 1;
        rendered += chunk.len();

        if chunks.peek().is_some() {
            tokio::task::yield_now().await;
        }
    }

    BatchOutcome::Completed {
        batches,
        items: rendered,
    }
}

/// Trailing-edge debounce: each request restarts the timer, only the last one runs.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Must be called from within a tokio runtime.
    pub fn request<F>(&mut self, update: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let interval = self.interval;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            update();
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }
}

impl Drop for Throttle {
    fn drop(&mut self) {
        self.cancel();
    }
}
