use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{
    dto::{Preferences, PreferencesUpdate},
    password::{hash_password, password_matches},
    repo_types::User,
};
use crate::config::DemoUser;

/// Volatile user and preference store. Contents are lost on restart.
#[derive(Debug)]
pub struct UserStore {
    users: RwLock<HashMap<String, User>>,
    /// Verified against when the username is unknown, so both rejections
    /// cost one argon2 verification.
    dummy_hash: String,
}

impl UserStore {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            users: RwLock::new(HashMap::new()),
            dummy_hash: hash_password("labellens-unknown-user")?,
        })
    }

    /// Store seeded with the configured demo account.
    pub fn with_demo_user(demo: &DemoUser) -> anyhow::Result<Self> {
        let mut store = Self::new()?;
        store.add_user(&demo.username, &demo.password)?;
        Ok(store)
    }

    /// Adds (or replaces) a user with default preferences.
    pub fn add_user(&mut self, username: &str, password: &str) -> anyhow::Result<()> {
        let user = User {
            username: username.to_string(),
            password_hash: hash_password(password)?,
            preferences: Preferences::default(),
        };
        self.users.get_mut().insert(user.username.clone(), user);
        Ok(())
    }

    /// Returns the canonical username when the credentials are valid.
    ///
    /// Unknown usernames are checked against a throwaway hash so the response
    /// time does not reveal which accounts exist.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> Option<String> {
        let stored = {
            let users = self.users.read().await;
            users.get(username).map(|u| u.password_hash.clone())
        };
        let known = stored.is_some();
        let hash = stored.unwrap_or_else(|| self.dummy_hash.clone());

        let plain = password.to_string();
        let matches = match tokio::task::spawn_blocking(move || password_matches(&plain, &hash)).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "password verification task failed");
                false
            }
        };

        if known && matches {
            Some(username.to_string())
        } else {
            debug!(username, known, "credentials rejected");
            None
        }
    }

    pub async fn preferences(&self, username: &str) -> Option<Preferences> {
        self.users
            .read()
            .await
            .get(username)
            .map(|u| u.preferences.clone())
    }

    /// Merges `update` into the stored preferences; `None` for unknown users.
    pub async fn update_preferences(
        &self,
        username: &str,
        update: PreferencesUpdate,
    ) -> Option<Preferences> {
        let mut users = self.users.write().await;
        let user = users.get_mut(username)?;
        user.preferences.merge(update);
        Some(user.preferences.clone())
    }
}
