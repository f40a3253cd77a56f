//! Catalog of timed activities with calorie burn rates.
//!
//! Lookups see three layers, later ones shadowing earlier ones by name:
//! the built-in list, activities from the config file, and the user's own
//! custom activities.

use crate::store::{Store, TimeRange};
use crate::{truncate_to_millis, Config, CustomActivity, Error, IntensityRates, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use uuid::Uuid;

/// Where an activity definition comes from
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySource {
    BuiltIn,
    Configured,
    Custom,
}

#[derive(Clone, Debug, Serialize)]
pub struct Activity {
    pub name: String,
    pub rates: IntensityRates,
    pub source: ActivitySource,
}

/// Built once and shared by every catalog
static BUILTIN_ACTIVITIES: Lazy<Vec<Activity>> = Lazy::new(|| {
    [
        ("Running", IntensityRates::new(8.0, 11.0, 14.0)),
        ("Swimming", IntensityRates::new(11.0, 14.0, 17.0)),
        ("Padel", IntensityRates::new(5.0, 8.0, 11.0)),
        ("Climbing", IntensityRates::new(7.0, 10.0, 13.0)),
    ]
    .into_iter()
    .map(|(name, rates)| Activity {
        name: name.to_string(),
        rates,
        source: ActivitySource::BuiltIn,
    })
    .collect()
});

pub fn builtin_activities() -> &'static [Activity] {
    &BUILTIN_ACTIVITIES
}

/// All activities visible to one user
#[derive(Clone, Debug)]
pub struct ActivityCatalog {
    activities: Vec<Activity>,
}

impl ActivityCatalog {
    /// Built-in and configured activities only
    pub fn from_config(config: &Config) -> Self {
        let mut activities = builtin_activities().to_vec();
        activities.extend(config.activities.custom.iter().map(|a| Activity {
            name: a.name.trim().to_string(),
            rates: a.rates(),
            source: ActivitySource::Configured,
        }));
        Self { activities }
    }

    /// Built-in, configured and the user's custom activities
    pub fn load(store: &Store, config: &Config, user_id: Uuid) -> Result<Self> {
        let mut catalog = Self::from_config(config);
        let custom: Vec<CustomActivity> = store.list_by_user(user_id, TimeRange::all())?;
        catalog.activities.extend(custom.into_iter().map(|a| Activity {
            name: a.name,
            rates: a.rates,
            source: ActivitySource::Custom,
        }));
        Ok(catalog)
    }

    /// Case-insensitive lookup; the most specific layer wins
    pub fn find(&self, name: &str) -> Option<&Activity> {
        let name = name.trim();
        self.activities
            .iter()
            .rev()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Every visible activity, shadowed definitions removed
    pub fn visible(&self) -> Vec<&Activity> {
        let mut visible: Vec<&Activity> = Vec::new();
        for activity in self.activities.iter().rev() {
            if !visible
                .iter()
                .any(|v| v.name.eq_ignore_ascii_case(&activity.name))
            {
                visible.push(activity);
            }
        }
        visible.reverse();
        visible
    }
}

/// Store a custom activity for a user.
///
/// Fails with `Duplicate` when the name is already a built-in activity or
/// one of the user's own.
pub fn add_custom_activity(
    store: &Store,
    user_id: Uuid,
    name: &str,
    rates: IntensityRates,
    now: DateTime<Utc>,
) -> Result<CustomActivity> {
    let name = name.trim();
    if builtin_activities()
        .iter()
        .any(|a| a.name.eq_ignore_ascii_case(name))
    {
        return Err(Error::Duplicate(format!(
            "'{}' is a built-in activity",
            name
        )));
    }

    let activity = CustomActivity {
        id: Uuid::new_v4(),
        user_id,
        name: name.to_string(),
        rates,
        created_at: truncate_to_millis(now),
    };
    store.create(&activity)?;

    tracing::info!("Added custom activity '{}' for user {}", activity.name, user_id);
    Ok(activity)
}
