use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mirror_core::{
    config::{load_settings, load_settings_from},
    ActionEmitter, ControllerEvent, EditorMirror, Marked, MirrorAction, MirrorController,
};
use sim_editor::SimulatedEditor;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Drives an editor mirror against an in-process simulated session.
#[derive(Parser, Debug)]
struct Cli {
    /// Settings file; defaults to ./mirror.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Ex commands run on the simulated session before the action.
    #[arg(long = "seed", value_name = "EX_COMMAND")]
    seed: Vec<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Opens files and prints the resulting state.
    Open {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = OpenMode::Auto)]
        mode: OpenMode,
    },
    /// Runs an ex command and prints its output.
    Run { command: String },
    /// Prints every buffer of the session.
    Buffers,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OpenMode {
    Auto,
    Tab,
    Split,
    Vsplit,
}

impl OpenMode {
    fn action(self, paths: Vec<PathBuf>) -> MirrorAction {
        match self {
            Self::Auto => MirrorAction::Open(paths),
            Self::Tab => MirrorAction::OpenInNewTab(paths),
            Self::Split => MirrorAction::OpenInHorizontalSplit(paths),
            Self::Vsplit => MirrorAction::OpenInVerticalSplit(paths),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => load_settings_from(path),
        None => load_settings(),
    };

    let editor = Arc::new(SimulatedEditor::new());
    for line in &cli.seed {
        editor
            .script(line)
            .with_context(|| format!("seeding session with `{line}`"))?;
    }
    let mirror = Arc::new(EditorMirror::with_settings(editor, &settings));

    let action = match cli.command {
        Command::Open { paths, mode } => mode.action(paths),
        Command::Run { command } => MirrorAction::RunCommand(command),
        Command::Buffers => {
            let buffers = mirror.all_buffers().await?;
            println!("{}", serde_json::to_string_pretty(&buffers)?);
            return Ok(());
        }
    };

    let controller = MirrorController::new(mirror, &settings);
    let mut events = controller.subscribe_events();
    let emitter = ActionEmitter::new();
    let worker = controller.spawn(emitter.subscribe());

    let action = Marked::new(action);
    let mark = action.mark();
    info!(%mark, "emitting action");
    emitter.emit(action)?;

    loop {
        match events.recv().await.context("controller stopped")? {
            ControllerEvent::CommandOutput { mark: from, output, .. } if from == mark => {
                println!("{output}");
            }
            ControllerEvent::State(pair) if pair.state.mark() == mark => {
                println!("{}", serde_json::to_string_pretty(pair.state.payload())?);
                break;
            }
            ControllerEvent::ActionFailed { mark: from, error, .. } if from == mark => {
                bail!(error);
            }
            _ => {}
        }
    }

    emitter.close().await;
    worker.await?;
    Ok(())
}
