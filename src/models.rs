//models.rs
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One performance of an exercise. Sets have no identity of their own;
/// the backend addresses them by position inside the exercise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub reps: u32,
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
}

/// `GET /workouts/{date}`. Days with nothing logged come back without
/// `exercises`, only a `message`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct WorkoutDay {
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TemplateBook {
    #[serde(default)]
    pub templates: BTreeMap<String, Vec<String>>,
}

impl TemplateBook {
    pub fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CalendarDays {
    #[serde(default)]
    pub days: BTreeMap<String, bool>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ProgressPoint {
    pub date: String,
    pub weight: f64,
    pub reps: f64,
    pub volume: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Progression {
    #[serde(default)]
    pub exercise_name: String,
    #[serde(default)]
    pub set_data: BTreeMap<String, Vec<ProgressPoint>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewExercise<'a> {
    pub name: &'a str,
    pub sets: Vec<WorkoutSet>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewTemplate<'a> {
    pub name: &'a str,
    pub exercises: &'a [String],
}

#[derive(Clone, Debug, Serialize)]
pub struct TemplateExercises<'a> {
    pub exercises: &'a [String],
}
