/// ICS calendar export
///
/// Renders scheduled tasks as an RFC 5545 `VCALENDAR`. One `VEVENT` is
/// emitted per task with a `due_date`; unscheduled tasks are skipped.
///
/// Events start at the task's due date (or at its `post_time` on that UTC
/// date, when set) and last [`EVENT_DURATION_MINUTES`]. Lines end in CRLF and
/// are folded at 75 octets.

use crate::models::task::Task;
use chrono::{DateTime, Duration, Utc};

/// Fixed length of every exported event
pub const EVENT_DURATION_MINUTES: i64 = 30;

/// Domain part of every event UID
pub const UID_DOMAIN: &str = "clearlaunch.app";

const PRODID: &str = "-//ClearLaunch//Launch Calendar//EN";
const MAX_LINE_OCTETS: usize = 75;

/// `YYYYMMDDTHHMMSSZ`
pub fn format_utc(at: &DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escapes a TEXT property value
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Folds a content line to 75-octet segments joined by CRLF + space
///
/// Splits only on char boundaries so multi-byte characters stay intact.
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut width = 0;
    // Continuation lines spend one octet on the leading space
    let mut limit = MAX_LINE_OCTETS;

    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > limit {
            out.push_str("\r\n ");
            width = 0;
            limit = MAX_LINE_OCTETS - 1;
        }
        out.push(c);
        width += len;
    }

    out
}

/// Start instant of a task's event, if it is scheduled
pub fn event_start(task: &Task) -> Option<DateTime<Utc>> {
    let due = task.due_date?;
    Some(match task.post_time {
        Some(time) => due.date_naive().and_time(time).and_utc(),
        None => due,
    })
}

fn event_description(task: &Task) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(description) = task.description.as_deref().filter(|d| !d.trim().is_empty()) {
        parts.push(description.trim().to_string());
    }
    if let Some(platform) = task.platform.as_deref() {
        parts.push(format!("Platform: {}", platform));
    }
    if let Some(phase) = task.phase.as_deref() {
        parts.push(format!("Phase: {}", phase));
    }

    (!parts.is_empty()).then(|| parts.join("\n"))
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(&fold_line(line));
    out.push_str("\r\n");
}

/// Builds a calendar stamped with the current time
pub fn build_calendar(name: &str, tasks: &[Task]) -> String {
    build_calendar_at(name, tasks, Utc::now())
}

/// Builds a calendar with an explicit `DTSTAMP`
pub fn build_calendar_at(name: &str, tasks: &[Task], stamp: DateTime<Utc>) -> String {
    let mut out = String::new();
    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, &format!("PRODID:{}", PRODID));
    push_line(&mut out, "CALSCALE:GREGORIAN");
    push_line(&mut out, "METHOD:PUBLISH");
    push_line(&mut out, &format!("X-WR-CALNAME:{}", escape_text(name)));

    let dtstamp = format_utc(&stamp);
    for task in tasks {
        let Some(start) = event_start(task) else {
            continue;
        };
        let end = start + Duration::minutes(EVENT_DURATION_MINUTES);

        push_line(&mut out, "BEGIN:VEVENT");
        push_line(&mut out, &format!("UID:{}@{}", task.id, UID_DOMAIN));
        push_line(&mut out, &format!("DTSTAMP:{}", dtstamp));
        push_line(&mut out, &format!("DTSTART:{}", format_utc(&start)));
        push_line(&mut out, &format!("DTEND:{}", format_utc(&end)));
        push_line(&mut out, &format!("SUMMARY:{}", escape_text(&task.title)));
        if let Some(description) = event_description(task) {
            push_line(&mut out, &format!("DESCRIPTION:{}", escape_text(&description)));
        }
        if let Some(category) = task.category.as_deref() {
            push_line(&mut out, &format!("CATEGORIES:{}", escape_text(category)));
        }
        if task.is_completed() {
            push_line(&mut out, "STATUS:COMPLETED");
        }
        push_line(&mut out, "END:VEVENT");
    }

    push_line(&mut out, "END:VCALENDAR");
    out
}

/// Attachment filename for a calendar named `name`
///
/// Keeps ASCII alphanumerics, collapses everything else to single dashes.
pub fn calendar_filename(name: &str) -> String {
    let mut slug = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        "launch.ics".to_string()
    } else {
        format!("{}.ics", slug)
    }
}
