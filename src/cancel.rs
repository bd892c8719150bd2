// Cancellation for in-flight analyses
// The engine only polls a flag; supersession policy lives with the caller.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag polled by long-running analysis loops.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Handle for one analysis started through an [`AnalysisSlot`].
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    generation: u64,
    token: CancellationToken,
}

impl AnalysisTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Last-call-wins bookkeeping for a caller that re-analyzes on every edit.
///
/// Starting a new analysis cancels the previous one; a result is accepted
/// only if its ticket is still the latest.
#[derive(Debug, Default)]
pub struct AnalysisSlot {
    current: Mutex<Option<AnalysisTicket>>,
    next_generation: Mutex<u64>,
}

impl AnalysisSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new analysis, cancelling whichever one was in flight.
    pub fn begin(&self) -> AnalysisTicket {
        let generation = {
            let mut next = self.next_generation.lock();
            *next += 1;
            *next
        };

        let ticket = AnalysisTicket {
            generation,
            token: CancellationToken::new(),
        };

        let mut current = self.current.lock();
        if let Some(previous) = current.replace(ticket.clone()) {
            tracing::debug!(
                superseded = previous.generation,
                generation = generation,
                "Superseding in-flight analysis"
            );
            previous.token.cancel();
        }
        ticket
    }

    /// Whether `ticket` is still the most recent analysis.
    pub fn is_current(&self, ticket: &AnalysisTicket) -> bool {
        self.current
            .lock()
            .as_ref()
            .map(|t| t.generation == ticket.generation)
            .unwrap_or(false)
    }

    /// Hand back a finished result. Stale results are dropped (`None`);
    /// the current one clears the slot and is returned.
    pub fn accept<T>(&self, ticket: &AnalysisTicket, result: T) -> Option<T> {
        let mut current = self.current.lock();
        match current.as_ref() {
            Some(t) if t.generation == ticket.generation => {
                *current = None;
                Some(result)
            }
            _ => {
                tracing::debug!(generation = ticket.generation, "Discarding stale analysis result");
                None
            }
        }
    }

    /// Cancel the in-flight analysis, if any.
    pub fn cancel(&self) {
        if let Some(ticket) = self.current.lock().take() {
            ticket.token.cancel();
        }
    }
}
