use std::collections::BTreeSet;

use tracing::{debug, error, info, warn};

use crate::auth::{AuthError, Gate};
use crate::reorder::reorder_by_id;
use crate::storage::{KeyValueStore, StoreError, load_json, save_json};
use crate::task::{Task, Theme};

pub const TODOS_KEY: &str = "greentasker-todos";
pub const THEME_KEY: &str = "greentasker-theme";
pub const AUTH_KEY: &str = "greentasker-auth";

const AUTH_VALUE: &str = "true";

/// Read-only OS/terminal "prefers dark" signal.
pub trait ColorSchemeSignal {
    fn prefers_dark(&self) -> bool;
}

impl ColorSchemeSignal for bool {
    fn prefers_dark(&self) -> bool {
        *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Loaded,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub completed: usize,
    pub total: usize,
}

/// Owns the ordered task list, theme flag and auth flag.
///
/// Every mutation rewrites the whole list (or theme) under its key, but only
/// once [`TaskListManager::load`] has moved the manager to [`Phase::Ready`].
/// Before that, mutations only touch memory so unloaded storage is never
/// clobbered with defaults.
#[derive(Debug)]
pub struct TaskListManager<D, S, C> {
    durable: D,
    session: S,
    scheme: C,
    tasks: Vec<Task>,
    theme: Theme,
    authenticated: bool,
    phase: Phase,
}

impl<D, S, C> TaskListManager<D, S, C>
where
    D: KeyValueStore,
    S: KeyValueStore,
    C: ColorSchemeSignal,
{
    pub fn new(durable: D, session: S, scheme: C) -> Self {
        Self {
            durable,
            session,
            scheme,
            tasks: Vec::new(),
            theme: Theme::Light,
            authenticated: false,
            phase: Phase::Uninitialized,
        }
    }

    /// Reads the auth flag, task list and theme once, then arms persistence.
    ///
    /// Malformed stored values fall back to defaults. Only read I/O failures
    /// are returned, in which case the manager stays uninitialized.
    #[tracing::instrument(skip(self))]
    pub fn load(&mut self) -> Result<(), StoreError> {
        if self.phase != Phase::Uninitialized {
            debug!(phase = ?self.phase, "already loaded");
            return Ok(());
        }

        let authenticated = self.session.load(AUTH_KEY)?.as_deref() == Some(AUTH_VALUE);
        let tasks = self.load_tasks()?;
        let theme = self.resolve_theme()?;

        self.authenticated = authenticated;
        self.tasks = tasks;
        self.theme = theme;
        self.phase = Phase::Loaded;
        info!(
            authenticated,
            tasks = self.tasks.len(),
            theme = %self.theme,
            "loaded state"
        );

        self.phase = Phase::Ready;
        debug!("persistence armed");
        self.persist_tasks()?;
        self.persist_theme()?;
        Ok(())
    }

    fn load_tasks(&self) -> Result<Vec<Task>, StoreError> {
        match load_json::<Vec<Task>, _>(&self.durable, TODOS_KEY) {
            Ok(Some(tasks)) => Ok(sanitize(tasks)),
            Ok(None) => Ok(Vec::new()),
            Err(err) if err.is_malformed() => {
                error!(error = ?err, "failed parsing todos from storage");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// A stored value decides on its own (only `"dark"` is dark); the OS
    /// signal is consulted only when nothing, or an empty string, is stored.
    fn resolve_theme(&self) -> Result<Theme, StoreError> {
        let stored = match self.durable.load(THEME_KEY) {
            Ok(stored) => stored,
            Err(err) if err.is_malformed() => {
                error!(error = ?err, "failed reading theme from storage");
                return Ok(Theme::Light);
            }
            Err(err) => return Err(err),
        };

        if let Some(raw) = stored.as_deref().filter(|raw| !raw.is_empty()) {
            return Ok(Theme::from_storage(raw).unwrap_or_else(|| {
                warn!(value = %raw, "unknown stored theme, using light");
                Theme::Light
            }));
        }

        if self.scheme.prefers_dark() {
            Ok(Theme::Dark)
        } else {
            Ok(Theme::Light)
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn summary(&self) -> Summary {
        Summary {
            completed: self.tasks.iter().filter(|task| task.completed).count(),
            total: self.tasks.len(),
        }
    }

    pub fn durable(&self) -> &D {
        &self.durable
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    #[tracing::instrument(skip(self, title))]
    pub fn add(&mut self, title: &str, due_date: Option<String>) -> Result<&[Task], StoreError> {
        let Some(task) = Task::new(title, due_date) else {
            debug!("rejected empty title");
            return Ok(self.tasks.as_slice());
        };

        info!(id = %task.id, "added task");
        self.tasks.insert(0, task);
        self.persist_tasks()?;
        Ok(self.tasks.as_slice())
    }

    #[tracing::instrument(skip(self))]
    pub fn remove(&mut self, id: &str) -> Result<&[Task], StoreError> {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        if self.tasks.len() == before {
            debug!("remove target not in list");
            return Ok(self.tasks.as_slice());
        }

        info!("removed task");
        self.persist_tasks()?;
        Ok(self.tasks.as_slice())
    }

    #[tracing::instrument(skip(self))]
    pub fn toggle(&mut self, id: &str) -> Result<&[Task], StoreError> {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!("toggle target not in list");
            return Ok(self.tasks.as_slice());
        };

        task.completed = !task.completed;
        info!(completed = task.completed, "toggled task");
        self.persist_tasks()?;
        Ok(self.tasks.as_slice())
    }

    /// Replaces title and due date as given; the title is not trimmed.
    /// A blank title leaves the task unchanged.
    #[tracing::instrument(skip(self, title))]
    pub fn update(
        &mut self,
        id: &str,
        title: &str,
        due_date: Option<String>,
    ) -> Result<&[Task], StoreError> {
        if title.trim().is_empty() {
            debug!("rejected empty title on update");
            return Ok(self.tasks.as_slice());
        }
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!("update target not in list");
            return Ok(self.tasks.as_slice());
        };

        task.title = title.to_string();
        task.due_date = due_date;
        info!("updated task");
        self.persist_tasks()?;
        Ok(self.tasks.as_slice())
    }

    #[tracing::instrument(skip(self))]
    pub fn reorder(&mut self, source: &str, target: &str) -> Result<&[Task], StoreError> {
        if !reorder_by_id(&mut self.tasks, source, target) {
            return Ok(self.tasks.as_slice());
        }

        self.persist_tasks()?;
        Ok(self.tasks.as_slice())
    }

    #[tracing::instrument(skip(self))]
    pub fn set_theme(&mut self, theme: Theme) -> Result<Theme, StoreError> {
        self.theme = theme;
        self.persist_theme()?;
        Ok(self.theme)
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, StoreError> {
        self.set_theme(self.theme.toggled())
    }

    /// Opens the session on a matching password.
    pub fn unlock(&mut self, gate: &Gate, attempt: &str) -> Result<(), AuthError> {
        gate.check(attempt)?;
        self.authenticated = true;
        self.session.save(AUTH_KEY, AUTH_VALUE)?;
        Ok(())
    }

    pub fn lock(&mut self) -> Result<(), StoreError> {
        self.authenticated = false;
        info!("session locked");
        self.session.remove(AUTH_KEY)
    }

    fn persist_tasks(&mut self) -> Result<(), StoreError> {
        if self.phase != Phase::Ready {
            debug!(phase = ?self.phase, "skipping todo persistence before load");
            return Ok(());
        }
        debug!(count = self.tasks.len(), "persisting todos");
        save_json(&mut self.durable, TODOS_KEY, &self.tasks)
    }

    fn persist_theme(&mut self) -> Result<(), StoreError> {
        if self.phase != Phase::Ready {
            debug!(phase = ?self.phase, "skipping theme persistence before load");
            return Ok(());
        }
        self.durable.save(THEME_KEY, self.theme.storage_value())
    }
}

fn sanitize(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = BTreeSet::new();
    tasks
        .into_iter()
        .filter(|task| {
            if task.id.trim().is_empty() || task.title.trim().is_empty() {
                warn!(id = %task.id, "dropping stored task with empty id or title");
                return false;
            }
            if !seen.insert(task.id.clone()) {
                warn!(id = %task.id, "dropping stored task with duplicate id");
                return false;
            }
            true
        })
        .collect()
}
