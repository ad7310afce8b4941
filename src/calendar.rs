use std::collections::BTreeMap;

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::api::date_segment;

pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// The month the calendar panel is showing, held as its first day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthCursor {
    first: NaiveDate,
}

impl MonthCursor {
    pub fn containing(date: NaiveDate) -> Self {
        let first = date
            .checked_sub_days(Days::new(u64::from(date.day0())))
            .unwrap_or(date);
        Self { first }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn previous(&self) -> Self {
        self.first
            .checked_sub_months(Months::new(1))
            .map(|first| Self { first })
            .unwrap_or(*self)
    }

    pub fn next(&self) -> Self {
        self.first
            .checked_add_months(Months::new(1))
            .map(|first| Self { first })
            .unwrap_or(*self)
    }

    pub fn title(&self) -> String {
        self.first.format("%B %Y").to_string()
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let month = self.first.month();
        self.first.iter_days().take_while(move |day| day.month() == month)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub worked_out: bool,
}

pub type CalendarWeek = [Option<CalendarCell>; 7];

/// Lays the month out in Monday-first weeks. Days before the 1st and after
/// the last day of the month are `None`.
pub fn month_grid(cursor: MonthCursor, days: &BTreeMap<String, bool>) -> Vec<CalendarWeek> {
    let mut weeks = Vec::new();
    let mut week: CalendarWeek = [None; 7];
    for date in cursor.days() {
        let column = date.weekday().num_days_from_monday() as usize;
        week[column] = Some(CalendarCell {
            date,
            worked_out: days.get(&date_segment(date)).copied().unwrap_or(false),
        });
        if column == 6 {
            weeks.push(week);
            week = [None; 7];
        }
    }
    if week.iter().any(Option::is_some) {
        weeks.push(week);
    }
    weeks
}

pub fn workout_count(days: &BTreeMap<String, bool>) -> usize {
    days.values().filter(|worked_out| **worked_out).count()
}
