//! Ordered action channel with a single delivery lane.
//!
//! Emitters and subscriptions talk to one worker task through one queue, so
//! every subscriber observes actions in enqueue order, and a subscription
//! registered before an emit is guaranteed to see it. Subscriber queues are
//! unbounded: a slow subscriber never holds back or drops deliveries for
//! another one.
//!
//! Teardown is drain-then-close. Once the [`ActionEmitter`] is dropped, sinks
//! fail with [`MirrorError::EmitterClosed`]; actions already queued are still
//! delivered, then every subscription ends.

use shared::error::MirrorError;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info};

enum Envelope<A> {
    Action(A),
    Subscribe(mpsc::UnboundedSender<A>),
}

pub struct ActionEmitter<A> {
    tx: mpsc::UnboundedSender<Envelope<A>>,
    worker: JoinHandle<()>,
}

impl<A> ActionEmitter<A>
where
    A: Clone + Send + 'static,
{
    /// Spawns the delivery lane; must be called inside a tokio runtime.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(deliver(rx));
        Self { tx, worker }
    }

    pub fn emit(&self, action: A) -> Result<(), MirrorError> {
        self.tx
            .send(Envelope::Action(action))
            .map_err(|_| MirrorError::EmitterClosed)
    }

    /// A cloneable handle for emitting that does not keep the channel open.
    pub fn sink(&self) -> ActionSink<A> {
        ActionSink {
            tx: self.tx.downgrade(),
        }
    }

    pub fn subscribe(&self) -> ActionSubscription<A> {
        let (tx, rx) = mpsc::unbounded_channel();
        // The worker only stops once every strong sender is gone, and we hold one.
        let _ = self.tx.send(Envelope::Subscribe(tx));
        ActionSubscription { rx }
    }

    /// Closes the channel and waits until queued actions have been handed to
    /// every subscriber.
    pub async fn close(self) {
        let Self { tx, worker } = self;
        drop(tx);
        let _ = worker.await;
    }
}

impl<A> Default for ActionEmitter<A>
where
    A: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

async fn deliver<A: Clone>(mut rx: mpsc::UnboundedReceiver<Envelope<A>>) {
    let mut subscribers: Vec<mpsc::UnboundedSender<A>> = Vec::new();
    let mut delivered = 0_u64;

    while let Some(envelope) = rx.recv().await {
        match envelope {
            Envelope::Subscribe(subscriber) => {
                subscribers.push(subscriber);
                debug!(subscribers = subscribers.len(), "action subscriber registered");
            }
            Envelope::Action(action) => {
                subscribers.retain(|subscriber| subscriber.send(action.clone()).is_ok());
                delivered += 1;
            }
        }
    }

    info!(delivered, "action channel drained and closed");
}

pub struct ActionSink<A> {
    tx: mpsc::WeakUnboundedSender<Envelope<A>>,
}

impl<A> ActionSink<A> {
    pub fn emit(&self, action: A) -> Result<(), MirrorError> {
        let tx = self.tx.upgrade().ok_or(MirrorError::EmitterClosed)?;
        tx.send(Envelope::Action(action))
            .map_err(|_| MirrorError::EmitterClosed)
    }
}

impl<A> Clone for ActionSink<A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

pub struct ActionSubscription<A> {
    rx: mpsc::UnboundedReceiver<A>,
}

impl<A> ActionSubscription<A> {
    /// `None` once the channel is closed and drained.
    pub async fn recv(&mut self) -> Option<A> {
        self.rx.recv().await
    }

    pub fn into_stream(self) -> UnboundedReceiverStream<A> {
        UnboundedReceiverStream::new(self.rx)
    }
}

#[cfg(test)]
#[path = "tests/emitter_tests.rs"]
mod tests;
