use chrono::{Datelike, NaiveDate, TimeDelta};

use crate::models::{ProgressPoint, Progression};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    Weight,
    Reps,
    Volume,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Weight, Metric::Reps, Metric::Volume];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Weight => "Weight (kg)",
            Metric::Reps => "Reps",
            Metric::Volume => "Volume (kg x reps)",
        }
    }

    pub fn value(self, point: &ProgressPoint) -> f64 {
        match self {
            Metric::Weight => point.weight,
            Metric::Reps => point.reps,
            Metric::Volume => point.volume,
        }
    }
}

/// One line of the chart: a set number followed across dates.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub set_number: u32,
    pub points: Vec<(String, f64)>,
}

impl Series {
    pub fn label(&self) -> String {
        format!("Set {}", self.set_number)
    }
}

fn numbered_sets(progression: &Progression) -> Vec<(u32, &Vec<ProgressPoint>)> {
    let mut sets: Vec<(u32, &Vec<ProgressPoint>)> = progression
        .set_data
        .iter()
        .filter_map(|(key, points)| match key.trim().parse::<u32>() {
            Ok(number) => Some((number, points)),
            Err(_) => {
                log::warn!("Ignoring progression data for set '{}'", key);
                None
            }
        })
        .collect();
    // Keys arrive as strings, so "10" would otherwise sort before "2".
    sets.sort_by_key(|(number, _)| *number);
    sets
}

pub fn build_series(progression: &Progression, metric: Metric) -> Vec<Series> {
    numbered_sets(progression)
        .into_iter()
        .map(|(set_number, points)| {
            let mut points: Vec<(String, f64)> = points
                .iter()
                .map(|point| (point.date.clone(), metric.value(point)))
                .collect();
            points.sort_by(|a, b| a.0.cmp(&b.0));
            Series { set_number, points }
        })
        .collect()
}

/// Chart coordinates for every series. X counts days from `origin`, the
/// earliest date on the chart, so gaps between sessions stay visible.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartData {
    pub origin: NaiveDate,
    pub lines: Vec<ChartLine>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartLine {
    pub label: String,
    pub points: Vec<[f64; 2]>,
}

fn parse_day(date: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
        Ok(day) => Some(day),
        Err(_) => {
            log::warn!("Ignoring progression point with date '{}'", date);
            None
        }
    }
}

pub fn chart_data(series: &[Series]) -> Option<ChartData> {
    let dated: Vec<(String, Vec<(NaiveDate, f64)>)> = series
        .iter()
        .map(|series| {
            let points = series
                .points
                .iter()
                .filter_map(|(date, value)| Some((parse_day(date)?, *value)))
                .collect();
            (series.label(), points)
        })
        .collect();
    let origin = dated
        .iter()
        .flat_map(|(_, points)| points.iter().map(|(day, _)| *day))
        .min()?;
    let first_day = origin.num_days_from_ce();

    let lines = dated
        .into_iter()
        .filter(|(_, points)| !points.is_empty())
        .map(|(label, points)| ChartLine {
            label,
            points: points
                .into_iter()
                .map(|(day, value)| [f64::from(day.num_days_from_ce() - first_day), value])
                .collect(),
        })
        .collect();
    Some(ChartData { origin, lines })
}

/// Date under an x axis mark. Marks between whole days get no label.
pub fn day_label(origin: NaiveDate, x: f64) -> String {
    let days = x.round();
    if (x - days).abs() > 1e-6 {
        return String::new();
    }
    TimeDelta::try_days(days as i64)
        .and_then(|offset| origin.checked_add_signed(offset))
        .map(|day| day.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub set_number: u32,
    pub point: ProgressPoint,
}

pub fn table_rows(progression: &Progression) -> Vec<TableRow> {
    let mut rows: Vec<TableRow> = numbered_sets(progression)
        .into_iter()
        .flat_map(|(set_number, points)| {
            points.iter().map(move |point| TableRow {
                set_number,
                point: point.clone(),
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        a.point
            .date
            .cmp(&b.point.date)
            .then(a.set_number.cmp(&b.set_number))
    });
    rows
}
