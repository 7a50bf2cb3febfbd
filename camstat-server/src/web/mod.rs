//! Web layer for journey route queries.
//!
//! Provides HTTP endpoints for listing sites, extracting route journeys and
//! computing grouped statistics over them.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
