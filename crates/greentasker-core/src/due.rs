use anyhow::{Context, anyhow};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Storage form written by a `datetime-local` input.
pub const DUE_FORMAT: &str = "%Y-%m-%dT%H:%M";

const DISPLAY_FORMAT: &str = "%b %-d, %H:%M";

/// Parses user input into the stored due-date form.
///
/// Accepts `today`, `tomorrow`, RFC 3339, `YYYY-MM-DDTHH:MM[:SS]`,
/// `YYYY-MM-DD HH:MM` and `YYYY-MM-DD` (midnight). Blank input means no due date.
pub fn parse_due(input: &str, now: NaiveDateTime) -> anyhow::Result<Option<String>> {
    let token = input.trim();
    if token.is_empty() {
        return Ok(None);
    }

    let midnight = |date: NaiveDate| date.and_time(NaiveTime::MIN);
    let parsed = match token.to_ascii_lowercase().as_str() {
        "today" => midnight(now.date()),
        "tomorrow" => midnight(now.date()) + Duration::days(1),
        _ => parse_timestamp(token)
            .or_else(|| {
                NaiveDate::parse_from_str(token, "%Y-%m-%d")
                    .ok()
                    .map(midnight)
            })
            .ok_or_else(|| anyhow!("unrecognized due date: {token}"))
            .context("expected YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339")?,
    };

    Ok(Some(parsed.format(DUE_FORMAT).to_string()))
}

/// Formats a stored due date like `Mar 1, 09:30`; unparseable values are shown as-is.
pub fn format_due(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|value| value.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn is_overdue(raw: &str, now: NaiveDateTime) -> bool {
    parse_timestamp(raw).is_some_and(|due| due < now)
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Some(value.with_timezone(&Local).naive_local());
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 17)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("valid now")
    }

    #[test]
    fn normalizes_accepted_forms() {
        let cases = [
            ("2026-03-01T09:30", "2026-03-01T09:30"),
            ("2026-03-01T09:30:45", "2026-03-01T09:30"),
            ("2026-03-01 09:30", "2026-03-01T09:30"),
            ("2026-03-01", "2026-03-01T00:00"),
            ("today", "2026-02-17T00:00"),
            ("Tomorrow", "2026-02-18T00:00"),
        ];
        for (input, expected) in cases {
            assert_eq!(
                parse_due(input, now()).expect(input).as_deref(),
                Some(expected),
                "input {input}"
            );
        }
    }

    #[test]
    fn blank_means_no_due_date() {
        assert_eq!(parse_due("   ", now()).expect("blank"), None);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_due("next blue moon", now()).is_err());
    }

    #[test]
    fn formats_for_display() {
        assert_eq!(format_due("2026-03-01T09:05"), "Mar 1, 09:05");
        assert_eq!(format_due("someday"), "someday");
    }

    #[test]
    fn overdue_compares_against_now() {
        assert!(is_overdue("2026-02-17T11:59", now()));
        assert!(!is_overdue("2026-02-17T12:01", now()));
        assert!(!is_overdue("not a date", now()));
    }
}
