//! Outgoing mail: on-demand nutrition results and scheduled daily reports.

pub mod handlers;
pub mod mailer;
pub mod scheduler;
pub mod services;
pub mod templates;

use axum::Router;

use crate::state::AppState;

pub use mailer::{DisabledMailer, Mailer, SmtpMailer};
pub use services::NutritionLog;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
