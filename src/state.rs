//! What the screens show, kept apart from egui. Backend outcomes and form
//! submissions land here; the app only draws this state and forwards the
//! requests it hands back to the dispatcher.

use std::collections::VecDeque;

use chrono::NaiveDate;

use crate::calendar::MonthCursor;
use crate::error::ApiError;
use crate::models::{CalendarDays, Credentials, Progression};
use crate::progression::Metric;
use crate::refresh::{Mutation, Outcome, RefreshKey};
use crate::render::{
    render_templates, render_workouts, TemplateView, WorkoutView, TEMPLATES_LOAD_FAILED,
    WORKOUTS_LOAD_FAILED,
};
use crate::session::{auth_failure_message, validate_credentials, Session};
use crate::templates::TemplateDraft;

pub const SESSION_EXPIRED: &str = "Session expired, please log in again";

#[derive(Debug, PartialEq)]
pub enum Loadable<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub message: String,
    pub pending: bool,
}

/// Work the app has to start after an outcome was applied.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub enum Followup {
    Nothing,
    LoadMainView,
}

pub struct ViewState {
    pub session: Session,
    pub login: LoginForm,
    pub alerts: VecDeque<String>,
    pub selected_date: NaiveDate,
    /// Date the exercise list was rendered for. Controls inside the list act
    /// on this one, not on whatever the picker shows now.
    pub workouts_date: NaiveDate,
    pub workouts: WorkoutView,
    pub new_exercise_name: String,
    pub templates: TemplateView,
    pub template_names: Vec<String>,
    pub selected_template: Option<String>,
    pub new_template: TemplateDraft,
    pub calendar_cursor: MonthCursor,
    pub calendar: Loadable<CalendarDays>,
    pub progression_input: String,
    pub progression_metric: Metric,
    pub progression: Loadable<Progression>,
}

impl ViewState {
    pub fn new(session: Session, today: NaiveDate) -> Self {
        ViewState {
            session,
            login: LoginForm::default(),
            alerts: VecDeque::new(),
            selected_date: today,
            workouts_date: today,
            workouts: WorkoutView::Loading,
            new_exercise_name: String::new(),
            templates: TemplateView::Loading,
            template_names: Vec::new(),
            selected_template: None,
            new_template: TemplateDraft::default(),
            calendar_cursor: MonthCursor::containing(today),
            calendar: Loadable::Idle,
            progression_input: String::new(),
            progression_metric: Metric::Weight,
            progression: Loadable::Idle,
        }
    }

    pub fn alert(&mut self, message: impl Into<String>) {
        self.alerts.push_back(message.into());
    }

    /// Drops back to the login screen when the backend no longer accepts us.
    /// Returns true if the error was handled that way.
    fn handle_auth_failure(&mut self, err: &ApiError) -> bool {
        if !(err.is_unauthorized() || *err == ApiError::NotAuthenticated) {
            return false;
        }
        self.session.clear();
        self.login.message = SESSION_EXPIRED.to_string();
        true
    }

    pub fn logout(&mut self) {
        self.session.clear();
        self.login = LoginForm {
            message: "Logged out".to_string(),
            ..LoginForm::default()
        };
        self.workouts = WorkoutView::Loading;
        self.templates = TemplateView::Loading;
        self.calendar = Loadable::Idle;
        self.progression = Loadable::Idle;
        log::info!("Logged out");
    }

    pub fn apply_outcome(&mut self, outcome: Outcome) -> Followup {
        match outcome {
            Outcome::Workouts { date, result } => match result {
                Ok(exercises) => {
                    self.workouts = render_workouts(&exercises);
                    self.workouts_date = date;
                }
                Err(err) => {
                    self.handle_auth_failure(&err);
                    self.workouts = WorkoutView::Error(WORKOUTS_LOAD_FAILED.to_string());
                }
            },
            Outcome::Templates(result) => match result {
                Ok(book) => {
                    self.template_names = book.names();
                    if let Some(selected) = &self.selected_template {
                        if !self.template_names.contains(selected) {
                            self.selected_template = None;
                        }
                    }
                    if self.selected_template.is_none() {
                        self.selected_template = self.template_names.first().cloned();
                    }
                    self.templates = render_templates(&book);
                }
                Err(err) => {
                    self.handle_auth_failure(&err);
                    self.templates = TemplateView::Error(TEMPLATES_LOAD_FAILED.to_string());
                }
            },
            Outcome::Applied(mutation) => {
                match &mutation {
                    Mutation::AddExercise { .. } => self.new_exercise_name.clear(),
                    Mutation::AddTemplate { .. } => self.new_template.clear(),
                    _ => {}
                }
                if let RefreshKey::Date(_) = mutation.key() {
                    // The month view is stale now; reload it next time it is shown.
                    self.calendar = Loadable::Idle;
                }
                if let Some(notice) = mutation.success_notice() {
                    self.alert(notice);
                }
            }
            Outcome::Failed { error, .. } => {
                if !self.handle_auth_failure(&error) {
                    self.alert(error.to_string());
                }
            }
            Outcome::Calendar {
                year,
                month,
                result,
            } => {
                if (year, month) != (self.calendar_cursor.year(), self.calendar_cursor.month()) {
                    log::debug!("Dropping calendar for {}-{:02}", year, month);
                    return Followup::Nothing;
                }
                self.calendar = match result {
                    Ok(days) => Loadable::Loaded(days),
                    Err(err) => {
                        self.handle_auth_failure(&err);
                        Loadable::Failed(format!("Error loading calendar: {}", err))
                    }
                };
            }
            Outcome::Progression { exercise, result } => {
                self.progression = match result {
                    Ok(progression) => Loadable::Loaded(progression),
                    Err(err) => {
                        self.handle_auth_failure(&err);
                        Loadable::Failed(format!("Error loading progression for {}: {}", exercise, err))
                    }
                };
            }
            Outcome::LoggedIn(result) => {
                self.login.pending = false;
                match result {
                    Ok(token) => {
                        self.session.store_token(token);
                        self.login.password.clear();
                        self.login.message = "Login successful!".to_string();
                        return Followup::LoadMainView;
                    }
                    Err(err) => self.login.message = auth_failure_message(&err, "Login failed"),
                }
            }
            Outcome::Registered(result) => {
                self.login.pending = false;
                self.login.message = match result {
                    Ok(()) => "Registration successful! You can now log in.".to_string(),
                    Err(err) => auth_failure_message(&err, "Registration failed"),
                };
            }
        }
        Followup::Nothing
    }

    /// Credentials from the login form, or None with the reason shown under it.
    pub fn submit_credentials(&mut self) -> Option<Credentials> {
        match validate_credentials(&self.login.username, &self.login.password) {
            Ok(credentials) => {
                self.login.pending = true;
                Some(credentials)
            }
            Err(err) => {
                self.login.message = err.to_string();
                None
            }
        }
    }

    pub fn add_exercise(&mut self) -> Option<Mutation> {
        let name = self.new_exercise_name.trim();
        if name.is_empty() {
            self.alert("Please enter an exercise name");
            return None;
        }
        Some(Mutation::AddExercise {
            date: self.selected_date,
            name: name.to_string(),
        })
    }

    pub fn apply_template(&mut self) -> Option<Mutation> {
        let Some(template) = self.selected_template.clone() else {
            self.alert("Please select a template");
            return None;
        };
        Some(Mutation::ApplyTemplate {
            date: self.selected_date,
            template,
        })
    }

    pub fn create_template(&mut self) -> Option<Mutation> {
        match self.new_template.validate() {
            Ok((name, exercises)) => Some(Mutation::AddTemplate { name, exercises }),
            Err(err) => {
                self.alert(err.to_string());
                None
            }
        }
    }

    /// Exercise to chart. Marks the chart as loading when there is one.
    pub fn progression_request(&mut self) -> Option<String> {
        let exercise = self.progression_input.trim().to_string();
        if exercise.is_empty() {
            self.alert("Please enter an exercise name");
            return None;
        }
        self.progression = Loadable::Loading;
        Some(exercise)
    }
}
