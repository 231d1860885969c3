//! Origin tagging for actions and states sharing one channel.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use futures::{future, Stream, StreamExt};
use uuid::Uuid;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one emission. Only ever compared for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(u64);

impl Token {
    pub fn new() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marked<T> {
    mark: Token,
    payload: T,
}

impl<T> Marked<T> {
    pub fn new(payload: T) -> Self {
        Self::with_mark(Token::new(), payload)
    }

    pub fn with_mark(mark: Token, payload: T) -> Self {
        Self { mark, payload }
    }

    pub fn mark(&self) -> Token {
        self.mark
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }

    /// True when the two values come from different emissions, whatever
    /// their payloads.
    pub fn has_different_mark<U>(&self, other: &Marked<U>) -> bool {
        self.mark != other.mark
    }

    /// Carries the mark over to a derived payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Marked<U> {
        Marked {
            mark: self.mark,
            payload: f(self.payload),
        }
    }
}

impl<T: fmt::Debug> fmt::Display for Marked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Marked<{} -> {:?}>", self.mark, self.payload)
    }
}

/// Action routed to one of several component instances sharing a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct UuidAction<A> {
    pub uuid: String,
    pub payload: A,
}

impl<A> UuidAction<A> {
    pub fn new(uuid: impl Into<String>, action: A) -> Self {
        Self {
            uuid: uuid.into(),
            payload: action,
        }
    }

    pub fn generated(action: A) -> Self {
        Self::new(Uuid::new_v4().to_string(), action)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UuidState<S> {
    pub uuid: String,
    pub payload: S,
}

impl<S> UuidState<S> {
    pub fn new(uuid: impl Into<String>, state: S) -> Self {
        Self {
            uuid: uuid.into(),
            payload: state,
        }
    }

    pub fn is_for<A>(&self, action: &UuidAction<A>) -> bool {
        self.uuid == action.uuid
    }
}

/// Reducer output. `modified == false` means the action was valid but left
/// the state unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct StateActionPair<S, A> {
    pub state: S,
    pub action: A,
    pub modified: bool,
}

impl<S, A> StateActionPair<S, A> {
    pub fn new(state: S, action: A) -> Self {
        Self {
            state,
            action,
            modified: true,
        }
    }

    pub fn unmodified(state: S, action: A) -> Self {
        Self {
            state,
            action,
            modified: false,
        }
    }
}

pub fn filter_modified<S, A>(
    pairs: impl Stream<Item = StateActionPair<S, A>>,
) -> impl Stream<Item = S> {
    pairs.filter_map(|pair| future::ready(pair.modified.then_some(pair.state)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Echo of the observer's own last emission.
    Own,
    External,
}

/// Remembers the last token a component emitted with.
#[derive(Debug, Default)]
pub struct EchoFilter {
    last_emitted: Option<Token>,
}

impl EchoFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an outgoing action and records its token.
    pub fn stamp<A>(&mut self, action: A) -> Marked<A> {
        let marked = Marked::new(action);
        self.last_emitted = Some(marked.mark());
        marked
    }

    pub fn origin_of<S>(&self, state: &Marked<S>) -> Origin {
        if self.last_emitted == Some(state.mark()) {
            Origin::Own
        } else {
            Origin::External
        }
    }
}

#[cfg(test)]
#[path = "tests/marked_tests.rs"]
mod tests;
