use std::io::Write;

use anyhow::{Context, anyhow};
use chrono::NaiveDateTime;
use tracing::{debug, info, instrument};

use crate::auth::Gate;
use crate::cli::{Command, ThemeArg};
use crate::due::parse_due;
use crate::manager::{ColorSchemeSignal, TaskListManager};
use crate::render::{LOCKED_MESSAGE, Renderer};
use crate::storage::KeyValueStore;
use crate::task::{Task, Theme};

/// Runs one user gesture against the manager and writes the re-rendered view.
#[instrument(skip_all)]
pub fn dispatch<D, S, C, W>(
    manager: &mut TaskListManager<D, S, C>,
    gate: &Gate,
    renderer: &mut Renderer,
    command: Command,
    now: NaiveDateTime,
    mut out: W,
) -> anyhow::Result<()>
where
    D: KeyValueStore,
    S: KeyValueStore,
    C: ColorSchemeSignal,
    W: Write,
{
    let gated = !matches!(command, Command::Unlock { .. } | Command::Lock);
    if gated && !manager.is_authenticated() {
        debug!("refusing command while locked");
        return Err(anyhow!(LOCKED_MESSAGE));
    }

    match command {
        Command::Unlock { password } => {
            manager.unlock(gate, &password)?;
            writeln!(out, "Unlocked.")?;
        }
        Command::Lock => {
            manager.lock().context("failed to clear session")?;
            writeln!(out, "Locked.")?;
            return Ok(());
        }
        Command::List => {}
        Command::Add { title, due } => {
            let due = match due {
                Some(raw) => parse_due(&raw, now)?,
                None => None,
            };
            manager
                .add(&title.join(" "), due)
                .context("failed to save todos")?;
        }
        Command::Toggle { task } => {
            let id = resolve_task_ref(manager.tasks(), &task)?;
            manager.toggle(&id).context("failed to save todos")?;
        }
        Command::Remove { task } => {
            let id = resolve_task_ref(manager.tasks(), &task)?;
            manager.remove(&id).context("failed to save todos")?;
        }
        Command::Edit {
            task,
            title,
            due,
            clear_due,
        } => {
            let id = resolve_task_ref(manager.tasks(), &task)?;
            let due = if clear_due {
                None
            } else if let Some(raw) = due {
                parse_due(&raw, now)?
            } else {
                manager.find(&id).and_then(|existing| existing.due_date.clone())
            };
            manager
                .update(&id, &title.join(" "), due)
                .context("failed to save todos")?;
        }
        Command::Move { source, target } => {
            let source = resolve_task_ref(manager.tasks(), &source)?;
            let target = resolve_task_ref(manager.tasks(), &target)?;
            manager
                .reorder(&source, &target)
                .context("failed to save todos")?;
        }
        Command::Theme { mode } => {
            let theme = match mode {
                None => Ok(manager.theme()),
                Some(ThemeArg::Dark) => manager.set_theme(Theme::Dark),
                Some(ThemeArg::Light) => manager.set_theme(Theme::Light),
                Some(ThemeArg::Toggle) => manager.toggle_theme(),
            }
            .context("failed to save theme")?;
            info!(theme = %theme, "theme resolved");
            renderer.set_theme(theme);
            return renderer.write_theme(out);
        }
    }

    render_list(manager, renderer, now, out)
}

fn render_list<D, S, C, W>(
    manager: &TaskListManager<D, S, C>,
    renderer: &Renderer,
    now: NaiveDateTime,
    out: W,
) -> anyhow::Result<()>
where
    D: KeyValueStore,
    S: KeyValueStore,
    C: ColorSchemeSignal,
    W: Write,
{
    renderer.write_task_list(out, manager.tasks(), manager.summary(), now)
}

/// Resolves a 1-based list position, a full id, or an unambiguous id prefix.
pub fn resolve_task_ref(tasks: &[Task], reference: &str) -> anyhow::Result<String> {
    let reference = reference.trim();

    if let Ok(position) = reference.parse::<usize>()
        && (1..=tasks.len()).contains(&position)
    {
        return Ok(tasks[position - 1].id.clone());
    }

    if let Some(task) = tasks.iter().find(|task| task.id == reference) {
        return Ok(task.id.clone());
    }

    let mut matches = tasks
        .iter()
        .filter(|task| !reference.is_empty() && task.id.starts_with(reference));
    match (matches.next(), matches.next()) {
        (Some(task), None) => Ok(task.id.clone()),
        (Some(_), Some(_)) => Err(anyhow!("task reference {reference} is ambiguous")),
        (None, _) => Err(anyhow!("no task matches {reference}")),
    }
}
