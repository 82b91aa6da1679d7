use super::dto::Preferences;

/// User record held by the in-memory store.
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,      // login name, also the JWT subject
    pub password_hash: String, // Argon2 PHC string
    pub preferences: Preferences,
}
