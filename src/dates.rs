//! Relative date expressions (`today`, `-7d`, `next_friday`, ...).
//!
//! Resolution is a pure function of the expression and the current date.
//! The current date comes from a [`Clock`], so tests can pin it.

use crate::error::{QueryError, Result};
use chrono::{Datelike, Days, Local, NaiveDate, Weekday};
use regex::Regex;
use std::sync::LazyLock;

/// Output format of every resolved date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Keys whose scalar values go through relative-date resolution.
const DATE_FIELDS: &[&str] = &["due", "due_date", "start", "start_date", "created", "updated"];

static DAYS_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:last_|-)(\d+)d$").expect("static regex"));
static DAYS_AHEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+(\d+)d$").expect("static regex"));
static RELATIVE_WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(last|next)_(monday|tuesday|wednesday|thursday|friday|saturday|sunday)$")
        .expect("static regex")
});

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub fn is_date_field(key: &str) -> bool {
    DATE_FIELDS.contains(&key)
}

/// Resolves `expr` against `today` and formats it as `YYYY-MM-DD`.
pub fn resolve(expr: &str, today: NaiveDate) -> Result<String> {
    resolve_date(expr, today)
        .map(|date| date.format(DATE_FORMAT).to_string())
        .ok_or_else(|| QueryError::UnknownRelativeDate {
            expr: expr.to_string(),
        })
}

fn resolve_date(expr: &str, today: NaiveDate) -> Option<NaiveDate> {
    match expr {
        "today" | "overdue" => return Some(today),
        "yesterday" => return today.checked_sub_days(Days::new(1)),
        "tomorrow" => return today.checked_add_days(Days::new(1)),
        "this_week" | "this_week_start" => return week_start(today),
        "this_week_end" => return week_start(today)?.checked_add_days(Days::new(6)),
        _ => {}
    }

    if let Some(caps) = DAYS_AGO.captures(expr) {
        let days: u64 = caps[1].parse().ok()?;
        return today.checked_sub_days(Days::new(days));
    }

    if let Some(caps) = DAYS_AHEAD.captures(expr) {
        let days: u64 = caps[1].parse().ok()?;
        return today.checked_add_days(Days::new(days));
    }

    if let Some(caps) = RELATIVE_WEEKDAY.captures(expr) {
        let target = parse_weekday(&caps[2])?;
        return if &caps[1] == "last" {
            today.checked_sub_days(Days::new(days_since(today.weekday(), target)))
        } else {
            today.checked_add_days(Days::new(days_until(today.weekday(), target)))
        };
    }

    None
}

/// Monday of the ISO week containing `date`.
fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    let offset = u64::from(date.weekday().number_from_monday() - 1);
    date.checked_sub_days(Days::new(offset))
}

/// Days back to the previous `target`, always in `1..=7`.
fn days_since(today: Weekday, target: Weekday) -> u64 {
    let mut delta = today.number_from_monday() as i64 - target.number_from_monday() as i64;
    if delta <= 0 {
        delta += 7;
    }
    delta as u64
}

/// Days forward to the next `target`, always in `1..=7`.
fn days_until(today: Weekday, target: Weekday) -> u64 {
    let mut delta = target.number_from_monday() as i64 - today.number_from_monday() as i64;
    if delta <= 0 {
        delta += 7;
    }
    delta as u64
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}
