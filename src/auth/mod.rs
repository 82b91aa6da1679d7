use crate::state::AppState;
use axum::Router;

mod claims;
pub mod dto;
pub mod handlers;
pub mod jwt;
mod password;
pub mod repo;
mod repo_types;

pub use jwt::{AuthUser, JwtKeys};
pub use repo::UserStore;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::preference_routes())
}
