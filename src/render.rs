//! View-models rebuilt from scratch out of every server response.

use crate::error::ApiError;
use crate::models::{Exercise, TemplateBook, WorkoutSet};
use crate::templates::format_exercise_list;

pub const NO_EXERCISES: &str = "No exercises found for this date.";
pub const WORKOUTS_LOAD_FAILED: &str = "Error loading workouts.";
pub const TEMPLATES_LOAD_FAILED: &str = "Error loading templates.";

/// Whole numbers print without a fractional part, everything else as-is.
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

pub fn set_line(index: usize, set: &WorkoutSet) -> String {
    format!(
        "Set {}: {} reps, {} kg",
        index + 1,
        set.reps,
        format_number(set.weight)
    )
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseBlock {
    pub title: String,
    pub set_lines: Vec<String>,
    pub reps_input: String,
    pub weight_input: String,
}

impl ExerciseBlock {
    /// Reads the add-set form, clearing it when the input is usable.
    pub fn take_set_input(&mut self) -> Result<WorkoutSet, ApiError> {
        let set = parse_set(&self.reps_input, &self.weight_input)?;
        self.reps_input.clear();
        self.weight_input.clear();
        Ok(set)
    }
}

pub fn parse_set(reps: &str, weight: &str) -> Result<WorkoutSet, ApiError> {
    let reps = reps
        .trim()
        .parse::<u32>()
        .map_err(|_| ApiError::validation("Reps must be a whole number"))?;
    let weight = weight
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|weight| weight.is_finite())
        .ok_or_else(|| ApiError::validation("Weight must be a number"))?;
    Ok(WorkoutSet { reps, weight })
}

#[derive(Clone, Debug, PartialEq)]
pub enum WorkoutView {
    Loading,
    Empty,
    Exercises(Vec<ExerciseBlock>),
    Error(String),
}

pub fn render_workouts(exercises: &[Exercise]) -> WorkoutView {
    if exercises.is_empty() {
        return WorkoutView::Empty;
    }
    let blocks = exercises
        .iter()
        .map(|exercise| ExerciseBlock {
            title: exercise.name.clone(),
            set_lines: exercise
                .sets
                .iter()
                .enumerate()
                .map(|(index, set)| set_line(index, set))
                .collect(),
            reps_input: String::new(),
            weight_input: String::new(),
        })
        .collect();
    WorkoutView::Exercises(blocks)
}

/// One editable row of the template manager.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateRow {
    pub name: String,
    pub exercises_input: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TemplateView {
    Loading,
    Rows(Vec<TemplateRow>),
    Error(String),
}

pub fn render_templates(book: &TemplateBook) -> TemplateView {
    TemplateView::Rows(
        book.templates
            .iter()
            .map(|(name, exercises)| TemplateRow {
                name: name.clone(),
                exercises_input: format_exercise_list(exercises),
            })
            .collect(),
    )
}
