//! Progress reporting for file transfers.

/// Default reporting interval, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// Receives `(total, processed)` byte counts while a file moves.
///
/// `total` is 0 until the size is known. `processed` never decreases within
/// one transfer.
pub trait ProgressHandler: Send {
    /// Engine buffer size, which bounds how often `handle` can fire.
    fn buffer_size(&self) -> usize {
        DEFAULT_BUFFER_SIZE
    }

    fn handle(&mut self, total: u64, processed: u64);
}

impl<F> ProgressHandler for F
where
    F: FnMut(u64, u64) + Send,
{
    fn handle(&mut self, total: u64, processed: u64) {
        self(total, processed)
    }
}

/// Which side of the transfer a handler observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Download,
    Upload,
}

/// A handler bound to a direction, deduplicating repeated engine ticks.
pub(crate) struct ProgressTracker {
    handler: Box<dyn ProgressHandler>,
    direction: Direction,
    last: Option<(u64, u64)>,
}

impl ProgressTracker {
    pub(crate) fn new(handler: Box<dyn ProgressHandler>, direction: Direction) -> Self {
        Self {
            handler,
            direction,
            last: None,
        }
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn buffer_size(&self) -> usize {
        self.handler.buffer_size()
    }

    pub(crate) fn reset(&mut self) {
        self.last = None;
    }

    /// Engine tick, in the engine's `(dltotal, dlnow, ultotal, ulnow)` order.
    pub(crate) fn tick(&mut self, dltotal: f64, dlnow: f64, ultotal: f64, ulnow: f64) {
        let (total, now) = match self.direction {
            Direction::Download => (dltotal, dlnow),
            Direction::Upload => (ultotal, ulnow),
        };
        self.report(total.max(0.0) as u64, now.max(0.0) as u64);
    }

    /// Final report once the transfer is over, in case the engine's last tick
    /// came before the last bytes moved.
    pub(crate) fn finish(&mut self, processed: u64) {
        let total = match self.last {
            Some((total, _)) if total >= processed => total,
            _ => processed,
        };
        self.report(total, processed);
    }

    fn report(&mut self, total: u64, processed: u64) {
        let processed = match self.last {
            Some((_, previous)) => processed.max(previous),
            None => processed,
        };
        if self.last == Some((total, processed)) {
            return;
        }
        self.last = Some((total, processed));
        self.handler.handle(total, processed);
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("direction", &self.direction)
            .field("last", &self.last)
            .finish()
    }
}
