pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod due;
pub mod manager;
pub mod render;
pub mod reorder;
pub mod storage;
pub mod task;

use std::ffi::OsString;
use std::io;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing::{debug, info};

use crate::auth::Gate;
use crate::cli::Command;
use crate::manager::TaskListManager;
use crate::storage::FileStore;

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting greentasker"
    );

    let cfg = config::Config::load(cli.rc.as_deref())?;
    debug!(files = ?cfg.loaded_files, "config loaded");

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;
    let session_dir = config::resolve_session_dir(&cfg, cli.session.as_deref());

    let durable = FileStore::open(&data_dir)
        .with_context(|| format!("failed to open data store at {}", data_dir.display()))?;
    let session = FileStore::open(&session_dir).with_context(|| {
        format!(
            "failed to open session store at {}",
            session_dir.display()
        )
    })?;

    let mut manager = TaskListManager::new(durable, session, cfg.prefers_dark());
    manager.load().context("failed to load stored state")?;

    let mut renderer = render::Renderer::new(&cfg, manager.theme())?;
    let gate = Gate::new(cfg.password());
    let command = cli.command.unwrap_or(Command::List);

    commands::dispatch(
        &mut manager,
        &gate,
        &mut renderer,
        command,
        Local::now().naive_local(),
        io::stdout().lock(),
    )?;

    info!("done");
    Ok(())
}
