//! Registration and login.
//!
//! A [`Session`] is the explicit "who is logged in" value that callers pass
//! to the logger, evaluator and reporter. Passwords are not stored; this is a
//! single-user local tool.

use crate::store::{Record, Store};
use crate::{energy, Error, Profile, Result, User};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The logged-in user
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Session {
            user_id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
        }
    }
}

/// Create a user. Usernames are unique regardless of case.
///
/// The display name defaults to the username.
pub fn register(
    store: &Store,
    username: &str,
    display_name: Option<&str>,
    profile: Option<Profile>,
    now: DateTime<Utc>,
) -> Result<User> {
    let display_name = display_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(username);

    let mut user = User::new(username, display_name, now);
    user.profile = profile;
    user.validate()?;

    if store.find_user_by_username(&user.username)?.is_some() {
        return Err(Error::Duplicate(format!(
            "username '{}' is already registered",
            user.username
        )));
    }

    store.create(&user)?;
    tracing::info!("Registered user '{}' ({})", user.username, user.id);
    Ok(user)
}

pub fn login(store: &Store, username: &str) -> Result<Session> {
    let user = store
        .find_user_by_username(username)?
        .ok_or_else(|| Error::not_found(User::ENTITY, username.trim()))?;

    tracing::info!("Logged in as '{}'", user.username);
    Ok(Session::from(&user))
}

/// Replace the profile and return the refreshed user
pub fn update_profile(store: &Store, user_id: Uuid, profile: Profile) -> Result<User> {
    store.update_profile(user_id, &profile)?;
    store.get(user_id)
}

/// Daily calorie target of a user, if they have a profile
pub fn calorie_target(user: &User) -> Option<f64> {
    user.profile.as_ref().map(energy::daily_calorie_target)
}
