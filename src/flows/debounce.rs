//! Trailing-edge debouncing of keyed work items
//!
//! Each call (re)arms a timer; the item only runs once the timer expires
//! without another call landing on it. With [`DebounceScope::Global`] every
//! key shares one timer, so a call for `b` replaces a pending call for `a`
//! and `a` is reported back as [`Debounced::Superseded`].

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::DebounceScope;

/// Items that can be debounced carry a key
pub trait Keyed {
    fn key(&self) -> &str;
}

/// What the handler is asked to do with an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Debounced<T> {
    /// The timer expired; run the item
    Fire(T),
    /// Another key took over the shared timer before this one expired
    Superseded(T),
}

/// Handle to a running debounce task.
///
/// Dropping the handle cancels pending timers and aborts handlers that are
/// still running.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
    cancel: CancellationToken,
}

impl<T> Debouncer<T>
where
    T: Keyed + Send + 'static,
{
    /// Spawn the debounce task. `parent` bounds its lifetime: cancelling it
    /// stops this debouncer too.
    pub fn spawn<F, Fut>(
        window: Duration,
        scope: DebounceScope,
        parent: &CancellationToken,
        handler: F,
    ) -> Self
    where
        F: Fn(Debounced<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = parent.child_token();

        tokio::spawn(run(rx, window, scope, cancel.clone(), handler));

        Self { tx, cancel }
    }

    /// Schedule `item`, resetting its timer. Returns false once the
    /// debouncer has been cancelled.
    pub fn call(&self, item: T) -> bool {
        !self.cancel.is_cancelled() && self.tx.send(item).is_ok()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run<T, F, Fut>(
    mut rx: mpsc::UnboundedReceiver<T>,
    window: Duration,
    scope: DebounceScope,
    cancel: CancellationToken,
    handler: F,
) where
    T: Keyed + Send + 'static,
    F: Fn(Debounced<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut pending: HashMap<String, (Instant, T)> = HashMap::new();
    // Dropped on exit, which aborts whatever is still in flight.
    let mut in_flight = JoinSet::new();

    loop {
        let next_deadline = pending.values().map(|(deadline, _)| *deadline).min();

        tokio::select! {
            _ = cancel.cancelled() => break,

            item = rx.recv() => {
                let Some(item) = item else { break };
                let item_key = item.key().to_string();
                let slot = match scope {
                    DebounceScope::Global => String::new(),
                    DebounceScope::PerVideo => item_key.clone(),
                };

                if let Some((_, previous)) = pending.insert(slot, (Instant::now() + window, item)) {
                    if previous.key() != item_key {
                        tracing::debug!(key = previous.key(), "Debounced call superseded");
                        in_flight.spawn(handler(Debounced::Superseded(previous)));
                    }
                }
            }

            _ = tokio::time::sleep_until(next_deadline.unwrap_or_else(Instant::now)),
                if next_deadline.is_some() =>
            {
                let now = Instant::now();
                let due: Vec<String> = pending
                    .iter()
                    .filter(|(_, (deadline, _))| *deadline <= now)
                    .map(|(slot, _)| slot.clone())
                    .collect();

                for slot in due {
                    if let Some((_, item)) = pending.remove(&slot) {
                        tracing::debug!(key = item.key(), "Debounce window elapsed");
                        in_flight.spawn(handler(Debounced::Fire(item)));
                    }
                }
            }

            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        tracing::error!(error = %e, "Debounced handler panicked");
                    }
                }
            }
        }
    }
}
