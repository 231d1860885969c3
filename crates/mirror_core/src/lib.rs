use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use remote_api::{RemoteApi, RpcResult};
use shared::error::MirrorError;

pub mod commands;
pub mod component;
pub mod config;
pub mod controller;
pub mod emitter;
mod entity;
pub mod marked;
pub mod snapshot;

pub use commands::{plan_open, OpenStep};
pub use component::Component;
pub use config::MirrorSettings;
pub use controller::{ControllerEvent, MirrorAction, MirrorController, MirrorState};
pub use emitter::{ActionEmitter, ActionSink, ActionSubscription};
pub use marked::{EchoFilter, Marked, Origin, StateActionPair, Token, UuidAction, UuidState};

pub type MirrorResult<T> = Result<T, MirrorError>;

/// Local, read-only mirror of a remote editor session.
///
/// Holds no entity state of its own: every query assembles a fresh snapshot
/// and every mutation is a remote command.
pub struct EditorMirror {
    api: Arc<dyn RemoteApi>,
    call_timeout: Option<Duration>,
    resizing: AtomicBool,
}

impl EditorMirror {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            api,
            call_timeout: None,
            resizing: AtomicBool::new(false),
        }
    }

    pub fn with_settings(api: Arc<dyn RemoteApi>, settings: &MirrorSettings) -> Self {
        let mut mirror = Self::new(api);
        mirror.call_timeout = settings.call_timeout;
        mirror
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }

    pub fn is_resizing(&self) -> bool {
        self.resizing.load(Ordering::Acquire)
    }

    fn set_resizing(&self, resizing: bool) {
        self.resizing.store(resizing, Ordering::Release);
    }

    /// Awaits one remote call, bounding it by the configured timeout.
    async fn call<T>(
        &self,
        call: &'static str,
        request: impl Future<Output = RpcResult<T>> + Send,
    ) -> MirrorResult<T> {
        let outcome = match self.call_timeout {
            Some(after) => tokio::time::timeout(after, request)
                .await
                .map_err(|_| MirrorError::Timeout { call, after })?,
            None => request.await,
        };
        outcome.map_err(|source| MirrorError::remote(call, source))
    }
}
