//! Parsing and formatting helpers shared by the CLI and the TUI.
//!
//! Covers human-friendly due date input, relative due date labels, elapsed
//! time formatting and the plain-text task table printed by `study list`.

use chrono::{Datelike, Duration, NaiveDate};

use crate::task::Task;

/// Parse human-readable due date input relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "monday" .. "sunday" (and "mon" .. "sun"), with optional "this"/"next"
/// - "end of week" / "eow", "end of month" / "eom", "weekend"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD"
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        "this weekend" | "weekend" => {
            let days_until_saturday = (5 + 7 - today.weekday().num_days_from_monday()) % 7;
            return Some(today + Duration::days(days_until_saturday as i64));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        if let Some(unit) = rest.chars().last() {
            let amount = &rest[..rest.len() - unit.len_utf8()];
            if let Ok(n) = amount.trim().parse::<i64>() {
                let offset = match unit {
                    'd' => Some(Duration::try_days(n)),
                    'w' => Some(Duration::try_weeks(n)),
                    // Approximate: 30 days per month
                    'm' => Some(n.checked_mul(30).and_then(Duration::try_days)),
                    _ => None,
                };
                if let Some(offset) = offset {
                    // Out-of-range amounts yield no date rather than a panic.
                    return offset.and_then(|o| today.checked_add_signed(o));
                }
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current = today.weekday().num_days_from_monday() as i64;
    for (day_name, target) in weekdays {
        let days_ahead = (target + 7 - current) % 7;
        if s == day_name || s == format!("this {day_name}") {
            return Some(today + Duration::days(days_ahead));
        }
        if s == format!("next {day_name}") {
            let days = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return Some(today + Duration::days(days));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Start and end dates of the ISO week (Monday to Sunday) containing `day`.
pub fn start_end_of_week(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = day.weekday().num_days_from_monday() as i64;
    let start = day - Duration::days(weekday);
    (start, start + Duration::days(6))
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let days = (d - today).num_days();
            match days {
                0 => "today".into(),
                1 => "tomorrow".into(),
                n if n > 1 => format!("in {n}d"),
                n => format!("{}d late", -n),
            }
        }
    }
}

/// Format elapsed seconds as `H:MM:SS`.
pub fn format_elapsed(seconds: u64) -> String {
    format!(
        "{}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Print tasks as a plain table.
pub fn print_table(tasks: &[&Task], today: NaiveDate) {
    println!(
        "{:<9} {:<4} {:<7} {:<12} {:>9}  {}",
        "ID", "Done", "Pri", "Due", "Time", "Name"
    );
    for t in tasks {
        println!(
            "{:<9} {:<4} {:<7} {:<12} {:>9}  {}",
            t.short_id(),
            if t.completed { "x" } else { "" },
            t.priority.label(),
            format_due_relative(t.due_date, today),
            format_elapsed(t.time_spent),
            truncate(&t.name, 60),
        );
    }
}
