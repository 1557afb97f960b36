//! Kickoff parsing for the date formats fussball.de has used.
//!
//! * short: `"Fr, 25.07.25"` with `"19:30"` (the current print layout)
//! * long: `"Sonntag, 15.06.2025"` with `"09:15 Uhr"` or `"09:15"`
//!
//! Weekday names come from a fixed German table so parsing never depends on
//! the host locale. The weekday is required but not checked against the date.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};

const TIME_SUFFIX: &str = " Uhr";

const WEEKDAYS: [(&str, &str, Weekday); 7] = [
    ("Mo", "Montag", Weekday::Mon),
    ("Di", "Dienstag", Weekday::Tue),
    ("Mi", "Mittwoch", Weekday::Wed),
    ("Do", "Donnerstag", Weekday::Thu),
    ("Fr", "Freitag", Weekday::Fri),
    ("Sa", "Samstag", Weekday::Sat),
    ("So", "Sonntag", Weekday::Sun),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse kickoff from date {date:?} and time {time:?}")]
pub struct NotParseable {
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateShape {
    Short,
    Long,
}

impl DateShape {
    fn of(date: &str) -> Self {
        let fields: Vec<&str> = date.split('.').collect();
        if fields.len() == 3 && fields[2].trim().len() == 2 {
            DateShape::Short
        } else {
            DateShape::Long
        }
    }
}

/// Parses a headline date and time into civil (German local) time.
pub fn parse_kickoff(date: &str, time: &str) -> Result<NaiveDateTime, NotParseable> {
    let parsed = match DateShape::of(date) {
        DateShape::Short => parse_short(date, time),
        DateShape::Long => parse_long(date, time),
    };
    parsed.ok_or_else(|| NotParseable {
        date: date.to_string(),
        time: time.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekdayForm {
    /// `"Fr"`
    Short,
    /// `"Freitag"`
    Long,
}

/// German weekday written in the given form.
pub fn weekday_from_german(name: &str, form: WeekdayForm) -> Option<Weekday> {
    let name = name.trim();
    WEEKDAYS
        .iter()
        .find(|(short, long, _)| match form {
            WeekdayForm::Short => short.eq_ignore_ascii_case(name),
            WeekdayForm::Long => long.eq_ignore_ascii_case(name),
        })
        .map(|(_, _, weekday)| *weekday)
}

fn parse_short(date: &str, time: &str) -> Option<NaiveDateTime> {
    let (weekday, day) = date.trim().split_once(',')?;
    weekday_from_german(weekday, WeekdayForm::Short)?;

    let date = NaiveDate::parse_from_str(day.trim(), "%d.%m.%y").ok()?;
    let time = parse_clock(strip_suffix(time))?;
    Some(date.and_time(time))
}

fn parse_long(date: &str, time: &str) -> Option<NaiveDateTime> {
    let (weekday, day) = date.trim().split_once(',')?;
    weekday_from_german(weekday, WeekdayForm::Long)?;

    let date = NaiveDate::parse_from_str(day.trim(), "%d.%m.%Y").ok()?;
    // Older pages print "09:15 Uhr", some only "09:15".
    let time = parse_clock(strip_suffix(time)).or_else(|| parse_clock(time))?;
    Some(date.and_time(time))
}

fn strip_suffix(time: &str) -> &str {
    let time = time.trim();
    time.strip_suffix(TIME_SUFFIX).unwrap_or(time).trim()
}

fn parse_clock(time: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M").ok()
}
