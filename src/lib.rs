pub mod api;
pub mod app;
pub mod calendar;
pub mod config;
pub mod error;
pub mod models;
pub mod progression;
pub mod refresh;
pub mod render;
pub mod session;
pub mod state;
pub mod templates;
pub mod timer;

pub use api::{Backend, HttpBackend};
pub use app::WorkoutApp;
pub use config::AppConfig;
pub use error::{ApiError, ConfigError};
pub use session::{Session, TokenStore};
