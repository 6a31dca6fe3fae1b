// src/lib.rs

pub mod actions;
pub mod cli;
pub mod config;
pub mod confirm;
pub mod dialog;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod menu;
pub mod types;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::actions::Actions;
use crate::cli::{CliArgs, Command, MenuCommand};
use crate::config::resolve_config;
use crate::dialog::TerminalPresenter;
use crate::engine::{Runtime, Supervisor, SupervisorEvent};
use crate::exec::RealProcessBackend;
use crate::menu::{FileItem, MenuAction, background_items, file_items};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config resolution
/// - the real process backend and the terminal dialog presenter
/// - the supervisor and the runtime that drives it until idle
pub async fn run(args: CliArgs) -> Result<()> {
    let (action, name) = match args.command {
        Command::Menu(menu) => {
            print_menu(&menu);
            return Ok(());
        }
        Command::CreateSubvolume { directory, name } => (
            MenuAction::CreateSubvolume {
                directory: FileItem::parse(&directory),
            },
            name,
        ),
        Command::Snapshot { source, name } => (
            MenuAction::CreateSnapshot {
                file: FileItem::parse(&source),
            },
            name,
        ),
        Command::Delete { paths } => (
            MenuAction::DeleteSubvolumes {
                files: paths.iter().map(|p| FileItem::parse(p)).collect(),
            },
            None,
        ),
    };

    let cfg = resolve_config(args.config.as_deref())?;
    let actions = Actions::from_config(&cfg);

    if args.dry_run {
        print_dry_run(&actions, &action, name.as_deref());
        return Ok(());
    }

    // Everything the supervisor waits on reports through this channel.
    let (tx, rx) = mpsc::channel::<SupervisorEvent>(64);

    let backend = RealProcessBackend::new(tx.clone(), cfg.output);
    let presenter = TerminalPresenter::spawn(tx)?;
    let mut supervisor = Supervisor::new(backend, presenter);

    actions.activate(&mut supervisor, action, name);

    let supervisor = Runtime::new(supervisor, rx).run().await;
    info!(
        processes = supervisor.live_processes(),
        dialogs = supervisor.open_dialogs(),
        "done"
    );
    Ok(())
}

fn print_menu(menu: &MenuCommand) {
    let items = match menu {
        MenuCommand::Background { directory } => background_items(&FileItem::parse(directory)),
        MenuCommand::Files { files } => {
            let files: Vec<FileItem> = files.iter().map(|f| FileItem::parse(f)).collect();
            file_items(&files)
        }
    };
    for item in items {
        println!("{item}");
    }
}

fn print_dry_run(actions: &Actions, action: &MenuAction, name: Option<&str>) {
    println!("subvolmenu dry-run");
    println!("  helper = {}", actions.helper().path().display());
    for command in actions.planned_commands(action, name) {
        println!("  {command}");
    }
    debug!("dry-run complete (no execution)");
}
