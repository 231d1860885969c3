//! Action-driven controller: UI intents in, marked state out.

use std::{path::PathBuf, sync::Arc};

use futures::{future, Stream, StreamExt};
use serde::Serialize;
use shared::{
    domain::{Buffer, CursorPosition, GridSize, Snapshot},
    error::MirrorError,
};
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

use crate::{
    marked::filter_modified, ActionSubscription, EditorMirror, Marked, MirrorResult,
    MirrorSettings, StateActionPair, Token,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MirrorAction {
    Refresh,
    Open(Vec<PathBuf>),
    OpenInNewTab(Vec<PathBuf>),
    OpenInCurrentTab(PathBuf),
    OpenInHorizontalSplit(Vec<PathBuf>),
    OpenInVerticalSplit(Vec<PathBuf>),
    Select(Buffer),
    NewTab,
    CloseCurrentTab,
    CloseCurrentTabWithoutSaving,
    SaveCurrentTab,
    SaveCurrentTabTo(PathBuf),
    QuitWithoutSaving,
    CursorGo(CursorPosition),
    RunCommand(String),
    FocusChanged(bool),
    EnterResizeMode,
    ExitResizeMode(GridSize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MirrorState {
    pub snapshot: Snapshot,
    pub focused: bool,
    pub resizing: bool,
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    State(StateActionPair<Marked<MirrorState>, MirrorAction>),
    CommandOutput {
        mark: Token,
        command: String,
        output: String,
    },
    ActionFailed {
        mark: Token,
        action: MirrorAction,
        error: MirrorError,
    },
}

enum Effect {
    Refresh,
    Local,
    Output { command: String, output: String },
    Detached,
}

pub struct MirrorController {
    mirror: Arc<EditorMirror>,
    events: broadcast::Sender<ControllerEvent>,
}

impl MirrorController {
    pub fn new(mirror: Arc<EditorMirror>, settings: &MirrorSettings) -> Arc<Self> {
        let (events, _) = broadcast::channel(settings.state_channel_capacity);
        Arc::new(Self { mirror, events })
    }

    pub fn mirror(&self) -> &Arc<EditorMirror> {
        &self.mirror
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// States that actually changed, each carrying the mark of the action
    /// that produced it. Lagging consumers skip ahead.
    pub fn state_stream(&self) -> impl Stream<Item = Marked<MirrorState>> + Send + 'static {
        let pairs = BroadcastStream::new(self.events.subscribe()).filter_map(|event| {
            future::ready(match event {
                Ok(ControllerEvent::State(pair)) => Some(pair),
                _ => None,
            })
        });
        filter_modified(pairs)
    }

    /// Processes actions one at a time, in delivery order, until the
    /// action channel closes.
    pub fn spawn(
        self: &Arc<Self>,
        actions: ActionSubscription<Marked<MirrorAction>>,
    ) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.run(actions).await })
    }

    async fn run(&self, mut actions: ActionSubscription<Marked<MirrorAction>>) {
        info!("mirror controller started");
        let mut state = MirrorState::default();
        while let Some(action) = actions.recv().await {
            self.handle(&mut state, action).await;
        }
        info!("mirror controller stopped");
    }

    async fn handle(&self, state: &mut MirrorState, action: Marked<MirrorAction>) {
        let mark = action.mark();
        let action = action.into_payload();
        debug!(%mark, ?action, "dispatching action");

        let mut focused = state.focused;
        let effect = match self.perform(&action, &mut focused).await {
            Ok(effect) => effect,
            Err(error) => return self.fail(mark, action, error),
        };

        let snapshot = match effect {
            Effect::Detached => return,
            Effect::Local if !state.snapshot.tabs.is_empty() => state.snapshot.clone(),
            // nothing assembled yet, so there is no snapshot to reuse
            Effect::Local | Effect::Refresh => match self.mirror.all_tabs().await {
                Ok(snapshot) => snapshot,
                Err(error) => return self.fail(mark, action, error),
            },
            Effect::Output { command, output } => {
                let _ = self.events.send(ControllerEvent::CommandOutput {
                    mark,
                    command,
                    output,
                });
                match self.mirror.all_tabs().await {
                    Ok(snapshot) => snapshot,
                    Err(error) => return self.fail(mark, action, error),
                }
            }
        };

        let next = MirrorState {
            snapshot,
            focused,
            resizing: self.mirror.is_resizing(),
        };
        let modified = next != *state;
        *state = next.clone();

        let marked = Marked::with_mark(mark, next);
        let pair = if modified {
            StateActionPair::new(marked, action)
        } else {
            StateActionPair::unmodified(marked, action)
        };
        let _ = self.events.send(ControllerEvent::State(pair));
    }

    async fn perform(&self, action: &MirrorAction, focused: &mut bool) -> MirrorResult<Effect> {
        let mirror = &self.mirror;
        match action {
            MirrorAction::Refresh => {}
            MirrorAction::Open(urls) => mirror.open(urls).await?,
            MirrorAction::OpenInNewTab(urls) => mirror.open_in_new_tab(urls).await?,
            MirrorAction::OpenInCurrentTab(url) => mirror.open_in_current_tab(url).await?,
            MirrorAction::OpenInHorizontalSplit(urls) => {
                mirror.open_in_horizontal_split(urls).await?
            }
            MirrorAction::OpenInVerticalSplit(urls) => mirror.open_in_vertical_split(urls).await?,
            MirrorAction::Select(buffer) => mirror.select(buffer).await?,
            MirrorAction::NewTab => mirror.new_tab().await?,
            MirrorAction::CloseCurrentTab => mirror.close_current_tab().await?,
            MirrorAction::CloseCurrentTabWithoutSaving => {
                mirror.close_current_tab_without_saving().await?
            }
            MirrorAction::SaveCurrentTab => mirror.save_current_tab().await?,
            MirrorAction::SaveCurrentTabTo(url) => mirror.save_current_tab_to(url).await?,
            MirrorAction::QuitWithoutSaving => {
                mirror.quit_without_saving().await?;
                return Ok(Effect::Detached);
            }
            MirrorAction::CursorGo(position) => mirror.cursor_go(*position).await?,
            MirrorAction::RunCommand(command) => {
                let output = mirror.command_output(command).await?;
                return Ok(Effect::Output {
                    command: command.clone(),
                    output,
                });
            }
            MirrorAction::FocusChanged(gained) => {
                mirror.focus_gained(*gained).await?;
                *focused = *gained;
            }
            MirrorAction::EnterResizeMode => {
                mirror.enter_resize_mode();
                return Ok(Effect::Local);
            }
            MirrorAction::ExitResizeMode(size) => mirror.exit_resize_mode(*size).await?,
        }
        Ok(Effect::Refresh)
    }

    fn fail(&self, mark: Token, action: MirrorAction, error: MirrorError) {
        warn!(%mark, ?action, %error, "action failed");
        let _ = self.events.send(ControllerEvent::ActionFailed {
            mark,
            action,
            error,
        });
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
