use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::NaiveDateTime;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::due::{format_due, is_overdue};
use crate::manager::Summary;
use crate::task::{Task, Theme};

pub const EMPTY_LIST_MESSAGE: &str = "No tasks yet. Add one above!";
pub const LOCKED_MESSAGE: &str = "GreenTasker is locked to protect your data. Run `greentasker unlock <password>`.";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    theme: Theme,
}

impl Renderer {
    pub fn new(cfg: &Config, theme: Theme) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => io::stdout().is_terminal(),
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color, theme })
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    #[tracing::instrument(skip(self, out, tasks, summary, now))]
    pub fn write_task_list<W: Write>(
        &self,
        mut out: W,
        tasks: &[Task],
        summary: Summary,
        now: NaiveDateTime,
    ) -> anyhow::Result<()> {
        if tasks.is_empty() {
            writeln!(out, "{EMPTY_LIST_MESSAGE}")?;
        } else {
            let headers = vec![
                "#".to_string(),
                " ".to_string(),
                "Title".to_string(),
                "Due".to_string(),
                "Id".to_string(),
            ];

            let rows = tasks
                .iter()
                .enumerate()
                .map(|(idx, task)| self.task_row(idx, task, now))
                .collect();

            write_table(&mut out, headers, rows)?;
        }

        writeln!(out)?;
        writeln!(
            out,
            "{}/{} tasks completed",
            summary.completed, summary.total
        )?;
        Ok(())
    }

    fn task_row(&self, idx: usize, task: &Task, now: NaiveDateTime) -> Vec<String> {
        let position = self.paint(&(idx + 1).to_string(), self.accent());
        let check = if task.completed { "[x]" } else { "[ ]" };

        let title = if task.completed {
            self.paint(&task.title, "9")
        } else {
            task.title.clone()
        };

        let due = match task.due_date.as_deref() {
            Some(raw) => {
                let shown = format_due(raw);
                if !task.completed && is_overdue(raw, now) {
                    self.paint(&shown, "31")
                } else {
                    shown
                }
            }
            None => String::new(),
        };

        let short_id: String = task.id.chars().take(8).collect();
        vec![
            position,
            check.to_string(),
            title,
            due,
            self.paint(&short_id, "2"),
        ]
    }

    pub fn write_theme<W: Write>(&self, mut out: W) -> anyhow::Result<()> {
        writeln!(out, "theme: {}", self.paint(self.theme.storage_value(), self.accent()))?;
        Ok(())
    }

    fn accent(&self) -> &'static str {
        if self.theme.is_dark() { "92" } else { "32" }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(header.as_str()))
        .collect();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ", width = *width)?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths).take(column_count) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn plain() -> Renderer {
        Renderer {
            color: false,
            theme: Theme::Light,
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 17)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("valid now")
    }

    #[test]
    fn empty_list_shows_hint_and_summary() {
        let mut out = Vec::new();
        plain()
            .write_task_list(&mut out, &[], Summary { completed: 0, total: 0 }, now())
            .expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with(EMPTY_LIST_MESSAGE));
        assert!(text.ends_with("0/0 tasks completed\n"));
    }

    #[test]
    fn rows_follow_list_order() {
        let tasks = vec![
            Task {
                id: "11111111-aaaa".to_string(),
                title: "second added".to_string(),
                completed: true,
                due_date: Some("2026-03-01T09:30".to_string()),
            },
            Task {
                id: "22222222-bbbb".to_string(),
                title: "first added".to_string(),
                completed: false,
                due_date: None,
            },
        ];
        let mut out = Vec::new();
        plain()
            .write_task_list(&mut out, &tasks, Summary { completed: 1, total: 2 }, now())
            .expect("render");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[2].starts_with("1 [x] second added Mar 1, 09:30 11111111"));
        assert!(lines[3].starts_with("2 [ ] first added"));
        assert!(text.contains("1/2 tasks completed"));
    }

    #[test]
    fn strip_ansi_removes_escape_codes() {
        assert_eq!(strip_ansi("\x1b[31mred\x1b[0m"), "red");
    }
}
