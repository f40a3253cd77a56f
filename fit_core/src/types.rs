//! Core domain types for fittrack.
//!
//! This module defines the records persisted by the store and the derived
//! values computed from them:
//! - Users and their optional biometric profile
//! - Exercise, food and workout entries
//! - Goals and goal progress
//! - Custom activities and routines

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Metrics
// ============================================================================

/// What an exercise entry measures. Also the kind of a goal.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Reps,
    Time,
    Distance,
    Weight,
}

/// How values of one metric combine over a period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregation {
    /// Cumulative: values add up
    Sum,
    /// Point-in-time measurement: the most recent value wins
    Latest,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Reps, Metric::Time, Metric::Distance, Metric::Weight];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Reps => "reps",
            Metric::Time => "time",
            Metric::Distance => "distance",
            Metric::Weight => "weight",
        }
    }

    /// Unit the value is recorded in
    pub fn unit(self) -> &'static str {
        match self {
            Metric::Reps => "reps",
            Metric::Time => "min",
            Metric::Distance => "km",
            Metric::Weight => "kg",
        }
    }

    pub fn aggregation(self) -> Aggregation {
        match self {
            Metric::Weight => Aggregation::Latest,
            Metric::Reps | Metric::Time | Metric::Distance => Aggregation::Sum,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "reps" | "rep" => Ok(Metric::Reps),
            "time" | "duration" => Ok(Metric::Time),
            "distance" => Ok(Metric::Distance),
            "weight" => Ok(Metric::Weight),
            other => Err(Error::validation(format!(
                "unknown metric '{}' (expected reps, time, distance or weight)",
                other
            ))),
        }
    }
}

/// A metric that can be charted day by day.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMetric {
    Exercise(Metric),
    CaloriesConsumed,
    CaloriesBurned,
    /// Consumed minus burned
    NetCalories,
}

impl SeriesMetric {
    pub fn aggregation(self) -> Aggregation {
        match self {
            SeriesMetric::Exercise(metric) => metric.aggregation(),
            _ => Aggregation::Sum,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            SeriesMetric::Exercise(metric) => metric.unit(),
            _ => "kcal",
        }
    }
}

impl fmt::Display for SeriesMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesMetric::Exercise(metric) => write!(f, "{}", metric),
            SeriesMetric::CaloriesConsumed => f.write_str("calories"),
            SeriesMetric::CaloriesBurned => f.write_str("burned"),
            SeriesMetric::NetCalories => f.write_str("net"),
        }
    }
}

impl FromStr for SeriesMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "calories" | "consumed" | "calories_consumed" => Ok(SeriesMetric::CaloriesConsumed),
            "burned" | "calories_burned" => Ok(SeriesMetric::CaloriesBurned),
            "net" | "net_calories" => Ok(SeriesMetric::NetCalories),
            other => other.parse().map(SeriesMetric::Exercise).map_err(|_| {
                Error::validation(format!(
                    "unknown series metric '{}' (expected reps, time, distance, weight, calories, burned or net)",
                    other
                ))
            }),
        }
    }
}

/// A value tagged with the metric (and so the unit) it was recorded in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub metric: Metric,
    pub value: f64,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.metric.unit())
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl FromStr for Sex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            other => Err(Error::validation(format!(
                "unknown sex '{}' (expected male or female)",
                other
            ))),
        }
    }
}

/// Long-term body composition goal, used for the daily calorie target
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FitnessGoal {
    Lose,
    Gain,
    Maintain,
}

impl FitnessGoal {
    pub fn as_str(self) -> &'static str {
        match self {
            FitnessGoal::Lose => "lose",
            FitnessGoal::Gain => "gain",
            FitnessGoal::Maintain => "maintain",
        }
    }
}

impl FromStr for FitnessGoal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lose" => Ok(FitnessGoal::Lose),
            "gain" => Ok(FitnessGoal::Gain),
            "maintain" => Ok(FitnessGoal::Maintain),
            other => Err(Error::validation(format!(
                "unknown fitness goal '{}' (expected lose, gain or maintain)",
                other
            ))),
        }
    }
}

/// Biometrics used for energy calculations
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub age_years: f64,
    pub sex: Sex,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub fitness_goal: FitnessGoal,
}

impl Profile {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("age", self.age_years)?;
        ensure_positive("weight", self.weight_kg)?;
        ensure_positive("height", self.height_cm)?;
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub profile: Option<Profile>,
}

impl User {
    pub fn new(username: &str, display_name: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.trim().to_string(),
            display_name: display_name.trim().to_string(),
            created_at: truncate_to_millis(created_at),
            profile: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_name("username", &self.username)?;
        if self.username.chars().any(char::is_whitespace) {
            return Err(Error::validation("username must not contain whitespace"));
        }
        ensure_name("display name", &self.display_name)?;
        if let Some(profile) = &self.profile {
            profile.validate()?;
        }
        Ok(())
    }
}

// ============================================================================
// Entries
// ============================================================================

/// One logged exercise measurement. Immutable once stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub measurement: Measurement,
    pub timestamp: DateTime<Utc>,
}

impl ExerciseEntry {
    pub fn validate(&self) -> Result<()> {
        ensure_name("exercise name", &self.name)?;
        ensure_non_negative(self.measurement.metric.as_str(), self.measurement.value)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub calories: f64,
    pub timestamp: DateTime<Utc>,
}

impl FoodEntry {
    pub fn validate(&self) -> Result<()> {
        ensure_name("food name", &self.name)?;
        ensure_non_negative("calories", self.calories)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Light,
    Moderate,
    Intense,
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intensity::Light => "light",
            Intensity::Moderate => "moderate",
            Intensity::Intense => "intense",
        };
        f.write_str(s)
    }
}

impl FromStr for Intensity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" | "1" => Ok(Intensity::Light),
            "moderate" | "2" => Ok(Intensity::Moderate),
            "intense" | "3" => Ok(Intensity::Intense),
            other => Err(Error::validation(format!(
                "unknown intensity '{}' (expected light, moderate or intense)",
                other
            ))),
        }
    }
}

/// Calories burned per minute at each intensity
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct IntensityRates {
    pub light: f64,
    pub moderate: f64,
    pub intense: f64,
}

impl IntensityRates {
    pub const fn new(light: f64, moderate: f64, intense: f64) -> Self {
        Self {
            light,
            moderate,
            intense,
        }
    }

    pub fn per_minute(&self, intensity: Intensity) -> f64 {
        match intensity {
            Intensity::Light => self.light,
            Intensity::Moderate => self.moderate,
            Intensity::Intense => self.intense,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("light rate", self.light)?;
        ensure_non_negative("moderate rate", self.moderate)?;
        ensure_non_negative("intense rate", self.intense)
    }
}

/// How the calories of a workout were obtained
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkoutSource {
    /// Calories entered directly
    Manual,
    Weightlifting { intensity: Intensity, minutes: f64 },
    Activity {
        name: String,
        intensity: Intensity,
        minutes: f64,
    },
}

impl fmt::Display for WorkoutSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkoutSource::Manual => f.write_str("manual"),
            WorkoutSource::Weightlifting { intensity, minutes } => {
                write!(f, "weightlifting ({}, {} min)", intensity, minutes)
            }
            WorkoutSource::Activity {
                name,
                intensity,
                minutes,
            } => write!(f, "{} ({}, {} min)", name, intensity, minutes),
        }
    }
}

/// Calories burned in one training session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub source: WorkoutSource,
    pub calories_burned: f64,
    pub timestamp: DateTime<Utc>,
}

impl WorkoutEntry {
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("calories burned", self.calories_burned)?;
        match &self.source {
            WorkoutSource::Manual => Ok(()),
            WorkoutSource::Weightlifting { minutes, .. } => ensure_non_negative("minutes", *minutes),
            WorkoutSource::Activity { name, minutes, .. } => {
                ensure_name("activity name", name)?;
                ensure_non_negative("minutes", *minutes)
            }
        }
    }
}

// ============================================================================
// Goals
// ============================================================================

/// Which side of the target counts as reached
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalDirection {
    /// Reached when the value is at or above the target
    AtLeast,
    /// Reached when the value is at or below the target (weight loss)
    AtMost,
}

impl GoalDirection {
    /// Direction used when a goal is set without one
    pub fn default_for(_kind: Metric) -> Self {
        GoalDirection::AtLeast
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GoalDirection::AtLeast => "at_least",
            GoalDirection::AtMost => "at_most",
        }
    }
}

impl FromStr for GoalDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "at_least" | "up" | "gain" => Ok(GoalDirection::AtLeast),
            "at_most" | "down" | "lose" => Ok(GoalDirection::AtMost),
            other => Err(Error::validation(format!(
                "unknown goal direction '{}' (expected at-least or at-most)",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: Metric,
    pub target: f64,
    pub direction: GoalDirection,
    /// Only entries for this exercise count (case-insensitive)
    pub exercise: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub fn new(user_id: Uuid, kind: Metric, target: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            target,
            direction: GoalDirection::default_for(kind),
            exercise: None,
            target_date: None,
            created_at: truncate_to_millis(created_at),
        }
    }

    pub fn with_direction(mut self, direction: GoalDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn for_exercise(mut self, exercise: impl Into<String>) -> Self {
        self.exercise = Some(exercise.into().trim().to_string());
        self
    }

    pub fn due_by(mut self, date: NaiveDate) -> Self {
        self.target_date = Some(date);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.target.is_finite() || self.target <= 0.0 {
            return Err(Error::validation(format!(
                "goal target must be positive, got {}",
                self.target
            )));
        }
        if self.direction == GoalDirection::AtMost && self.kind.aggregation() == Aggregation::Sum {
            return Err(Error::validation(format!(
                "{} goals accumulate and can only be at-least goals",
                self.kind
            )));
        }
        if let Some(exercise) = &self.exercise {
            ensure_name("goal exercise", exercise)?;
        }
        Ok(())
    }

    /// Whether an entry counts towards this goal
    pub fn matches(&self, entry: &ExerciseEntry) -> bool {
        entry.user_id == self.user_id
            && entry.measurement.metric == self.kind
            && self
                .exercise
                .as_deref()
                .map_or(true, |name| name.eq_ignore_ascii_case(entry.name.trim()))
    }
}

/// Progress of one goal, recomputed on every evaluation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GoalProgress {
    pub goal_id: Uuid,
    pub kind: Metric,
    pub direction: GoalDirection,
    pub accumulated: f64,
    pub target: f64,
    /// Always within [0, 100]
    pub percentage: f64,
    pub completed: bool,
    /// Number of entries that contributed
    pub entries_counted: usize,
    /// Days until the target date; negative once overdue
    pub days_remaining: Option<i64>,
}

// ============================================================================
// Activities and routines
// ============================================================================

/// A user-defined activity with its own calorie rates
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomActivity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub rates: IntensityRates,
    pub created_at: DateTime<Utc>,
}

impl CustomActivity {
    pub fn validate(&self) -> Result<()> {
        ensure_name("activity name", &self.name)?;
        self.rates.validate()
    }
}

/// One exercise of a routine, repeated `sets` times
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoutineItem {
    pub exercise: String,
    pub sets: u32,
    pub reps: u32,
    pub weight_kg: f64,
    pub duration_min: f64,
    pub distance_km: f64,
}

impl RoutineItem {
    pub fn validate(&self) -> Result<()> {
        ensure_name("routine exercise", &self.exercise)?;
        if self.sets == 0 {
            return Err(Error::validation(format!(
                "'{}' needs at least one set",
                self.exercise
            )));
        }
        ensure_non_negative("weight", self.weight_kg)?;
        ensure_non_negative("duration", self.duration_min)?;
        ensure_non_negative("distance", self.distance_km)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Routine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub items: Vec<RoutineItem>,
    pub created_at: DateTime<Utc>,
}

impl Routine {
    pub fn validate(&self) -> Result<()> {
        ensure_name("routine name", &self.name)?;
        if self.items.is_empty() {
            return Err(Error::validation("a routine needs at least one exercise"));
        }
        self.items.iter().try_for_each(RoutineItem::validate)
    }
}

/// Drop sub-millisecond precision so an instant survives a store roundtrip
pub fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

// ============================================================================
// Validation helpers
// ============================================================================

fn ensure_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn ensure_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::validation(format!(
            "{} must be a non-negative number, got {}",
            field, value
        )));
    }
    Ok(())
}

fn ensure_positive(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::validation(format!(
            "{} must be positive, got {}",
            field, value
        )));
    }
    Ok(())
}
