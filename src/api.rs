use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::{ApiError, ConfigError};
use crate::models::{
    CalendarDays, Credentials, Exercise, NewExercise, NewTemplate, Progression, TemplateBook,
    TemplateExercises, TokenResponse, WorkoutDay, WorkoutSet,
};
use crate::session::Session;

/// The backend contract. Every call blocks until the response is in, so
/// callers run these off the UI thread.
pub trait Backend: Send + Sync {
    fn login(&self, credentials: &Credentials) -> Result<String, ApiError>;
    fn register(&self, credentials: &Credentials) -> Result<(), ApiError>;

    fn workouts(&self, date: NaiveDate) -> Result<Vec<Exercise>, ApiError>;
    fn add_exercise(&self, date: NaiveDate, name: &str) -> Result<(), ApiError>;
    fn delete_exercise(&self, date: NaiveDate, exercise: &str) -> Result<(), ApiError>;
    fn add_set(&self, date: NaiveDate, exercise: &str, set: &WorkoutSet) -> Result<(), ApiError>;
    fn delete_set(&self, date: NaiveDate, exercise: &str, index: usize) -> Result<(), ApiError>;

    fn templates(&self) -> Result<TemplateBook, ApiError>;
    fn add_template(&self, name: &str, exercises: &[String]) -> Result<(), ApiError>;
    fn edit_template(&self, name: &str, exercises: &[String]) -> Result<(), ApiError>;
    fn delete_template(&self, name: &str) -> Result<(), ApiError>;
    fn apply_template(&self, date: NaiveDate, template: &str) -> Result<(), ApiError>;

    fn calendar(&self, year: i32, month: u32) -> Result<CalendarDays, ApiError>;
    fn progression(&self, exercise: &str) -> Result<Progression, ApiError>;
}

pub fn date_segment(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Whether a request carried the session token. Only a 401 on a bearer
/// request means the session is gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Access {
    Public,
    Bearer,
}

pub struct HttpBackend {
    client: Client,
    base_url: Url,
    session: Session,
}

impl HttpBackend {
    pub fn new(config: &AppConfig, session: Session) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|_| ConfigError::BaseUrl(config.api_base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::BaseUrl(config.api_base_url.clone()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let token = self.session.token().ok_or(ApiError::NotAuthenticated)?;
        let url = self.endpoint(segments);
        log::debug!("{} {}", method, url);
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    fn send(&self, request: RequestBuilder, access: Access) -> Result<Response, ApiError> {
        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| status.to_string());
        if status == StatusCode::UNAUTHORIZED && access == Access::Bearer {
            log::warn!("Backend rejected our token, logging out");
            self.session.clear();
        } else {
            log::warn!("Backend answered {}: {}", status, message);
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    fn body_of(&self, request: RequestBuilder, access: Access) -> Result<String, ApiError> {
        let body = self.send(request, access)?.text()?;
        if let Some(message) = rejection(&body) {
            log::warn!("Backend refused request: {}", message);
            return Err(ApiError::Rejected(message));
        }
        Ok(body)
    }

    fn fetch<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let body = self.body_of(self.authorized(Method::GET, segments)?, Access::Bearer)?;
        Ok(serde_json::from_str(&body)?)
    }

    fn mutate(&self, method: Method, segments: &[&str]) -> Result<(), ApiError> {
        self.body_of(self.authorized(method, segments)?, Access::Bearer)
            .map(drop)
    }

    fn mutate_json<B: Serialize>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<(), ApiError> {
        self.body_of(self.authorized(method, segments)?.json(body), Access::Bearer)
            .map(drop)
    }

    fn auth_request(&self, action: &str, credentials: &Credentials) -> Result<String, ApiError> {
        let url = self.endpoint(&["auth", action]);
        log::debug!("POST {}", url);
        self.body_of(self.client.post(url).json(credentials), Access::Public)
    }
}

impl Backend for HttpBackend {
    fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let body = self.auth_request("login", credentials)?;
        let token: TokenResponse = serde_json::from_str(&body)?;
        log::info!("Logged in as {}", credentials.username);
        Ok(token.access_token)
    }

    fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.auth_request("register", credentials).map(drop)
    }

    fn workouts(&self, date: NaiveDate) -> Result<Vec<Exercise>, ApiError> {
        let day: WorkoutDay = self.fetch(&["workouts", &date_segment(date)])?;
        Ok(day.exercises)
    }

    fn add_exercise(&self, date: NaiveDate, name: &str) -> Result<(), ApiError> {
        let body = NewExercise {
            name,
            sets: Vec::new(),
        };
        self.mutate_json(Method::POST, &["add_exercise", &date_segment(date)], &body)
    }

    fn delete_exercise(&self, date: NaiveDate, exercise: &str) -> Result<(), ApiError> {
        self.mutate(
            Method::DELETE,
            &["delete_exercise", &date_segment(date), exercise],
        )
    }

    fn add_set(&self, date: NaiveDate, exercise: &str, set: &WorkoutSet) -> Result<(), ApiError> {
        self.mutate_json(
            Method::POST,
            &["add_set", &date_segment(date), exercise],
            set,
        )
    }

    fn delete_set(&self, date: NaiveDate, exercise: &str, index: usize) -> Result<(), ApiError> {
        self.mutate(
            Method::DELETE,
            &["delete_set", &date_segment(date), exercise, &index.to_string()],
        )
    }

    fn templates(&self) -> Result<TemplateBook, ApiError> {
        self.fetch(&["templates"])
    }

    fn add_template(&self, name: &str, exercises: &[String]) -> Result<(), ApiError> {
        self.mutate_json(Method::POST, &["add_template"], &NewTemplate { name, exercises })
    }

    fn edit_template(&self, name: &str, exercises: &[String]) -> Result<(), ApiError> {
        self.mutate_json(
            Method::PUT,
            &["edit_template", name],
            &TemplateExercises { exercises },
        )
    }

    fn delete_template(&self, name: &str) -> Result<(), ApiError> {
        self.mutate(Method::DELETE, &["delete_template", name])
    }

    fn apply_template(&self, date: NaiveDate, template: &str) -> Result<(), ApiError> {
        self.mutate(
            Method::POST,
            &["apply_template", &date_segment(date), template],
        )
    }

    fn calendar(&self, year: i32, month: u32) -> Result<CalendarDays, ApiError> {
        self.fetch(&[
            "analytics",
            "calendar",
            &year.to_string(),
            &month.to_string(),
        ])
    }

    fn progression(&self, exercise: &str) -> Result<Progression, ApiError> {
        self.fetch(&["analytics", "exercise_progression", exercise])
    }
}

/// Message out of a FastAPI-style error body: `{"detail": ...}` or
/// `{"error": ...}`.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail").or_else(|| value.get("error"))? {
        Value::String(message) => Some(message.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Older backend routes answer 200 with `{"error": ...}` instead of failing.
fn rejection(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("error")?.as_str().map(str::to_string)
}
