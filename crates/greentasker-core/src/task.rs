use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub completed: bool,

    /// ISO 8601 timestamp as entered, usually the `YYYY-MM-DDTHH:MM` form.
    #[serde(
        default,
        rename = "dueDate",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<String>,
}

impl Task {
    /// Returns `None` when the trimmed title is empty.
    pub fn new(title: &str, due_date: Option<String>) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }

        Some(Self {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            completed: false,
            due_date,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn storage_value(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Exact match on the stored literal, no trimming or case folding.
    pub fn from_storage(raw: &str) -> Option<Self> {
        match raw {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.storage_value())
    }
}
