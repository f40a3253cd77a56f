//! Logging of exercise, food and workout entries.
//!
//! Each call validates its input, checks the user exists and writes exactly
//! one row. A rejected entry never reaches the store.

use crate::activities::ActivityCatalog;
use crate::store::Store;
use crate::{
    energy, truncate_to_millis, Config, Error, ExerciseEntry, FoodEntry, Intensity, Measurement,
    Metric, Result, WorkoutEntry, WorkoutSource,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// How the calories of a workout should be determined
#[derive(Clone, Debug, PartialEq)]
pub enum WorkoutInput {
    /// Calories already known
    Manual { calories: f64 },
    Weightlifting { intensity: Intensity, minutes: f64 },
    /// A named activity from the user's activity catalog
    Activity {
        name: String,
        intensity: Intensity,
        minutes: f64,
    },
}

pub struct Logger<'a> {
    store: &'a Store,
    config: &'a Config,
}

impl<'a> Logger<'a> {
    pub fn new(store: &'a Store, config: &'a Config) -> Self {
        Self { store, config }
    }

    pub fn log_exercise(
        &self,
        user_id: Uuid,
        name: &str,
        metric: Metric,
        value: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<ExerciseEntry> {
        let entry = ExerciseEntry {
            id: Uuid::new_v4(),
            user_id,
            name: name.trim().to_string(),
            measurement: Measurement { metric, value },
            timestamp: resolve_timestamp(timestamp),
        };
        self.store.create(&entry)?;

        tracing::info!(
            "Logged {} {} for user {}",
            entry.name,
            entry.measurement,
            user_id
        );
        Ok(entry)
    }

    pub fn log_food(
        &self,
        user_id: Uuid,
        name: &str,
        calories: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<FoodEntry> {
        let entry = FoodEntry {
            id: Uuid::new_v4(),
            user_id,
            name: name.trim().to_string(),
            calories,
            timestamp: resolve_timestamp(timestamp),
        };
        self.store.create(&entry)?;

        tracing::info!(
            "Logged food '{}' ({} kcal) for user {}",
            entry.name,
            calories,
            user_id
        );
        Ok(entry)
    }

    /// Log a workout, computing calories burned from its input.
    ///
    /// Activity names are resolved against the user's catalog; an unknown
    /// name fails with `NotFound`.
    pub fn log_workout(
        &self,
        user_id: Uuid,
        input: WorkoutInput,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<WorkoutEntry> {
        self.store.require_user(user_id)?;

        let (source, calories_burned) = match input {
            WorkoutInput::Manual { calories } => (WorkoutSource::Manual, calories),
            WorkoutInput::Weightlifting { intensity, minutes } => {
                let rates = self.config.energy.weightlifting_rates();
                (
                    WorkoutSource::Weightlifting { intensity, minutes },
                    energy::calories_burned(&rates, intensity, minutes),
                )
            }
            WorkoutInput::Activity {
                name,
                intensity,
                minutes,
            } => {
                let catalog = ActivityCatalog::load(self.store, self.config, user_id)?;
                let activity = catalog
                    .find(&name)
                    .ok_or_else(|| Error::not_found("Activity", name.trim()))?;
                (
                    WorkoutSource::Activity {
                        name: activity.name.clone(),
                        intensity,
                        minutes,
                    },
                    energy::calories_burned(&activity.rates, intensity, minutes),
                )
            }
        };

        let entry = WorkoutEntry {
            id: Uuid::new_v4(),
            user_id,
            source,
            calories_burned,
            timestamp: resolve_timestamp(timestamp),
        };
        self.store.create(&entry)?;

        tracing::info!(
            "Logged workout {} ({} kcal) for user {}",
            entry.source,
            entry.calories_burned,
            user_id
        );
        Ok(entry)
    }
}

fn resolve_timestamp(timestamp: Option<DateTime<Utc>>) -> DateTime<Utc> {
    truncate_to_millis(timestamp.unwrap_or_else(Utc::now))
}
