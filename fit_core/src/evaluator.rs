//! Goal evaluation.
//!
//! Progress is recomputed from the stored entries on every call:
//! - reps, time and distance goals sum the matching entries logged between
//!   the goal's creation and now
//! - weight goals take the most recent matching entry up to now
//!
//! Completion depends on the goal's direction. At-least goals are reached when
//! the accumulated value meets the target; at-most goals (weight loss) when the
//! latest weight is at or below it.

use crate::store::{Store, TimeRange};
use crate::{
    Aggregation, ExerciseEntry, Goal, GoalDirection, GoalProgress, Result,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub struct GoalEvaluator<'a> {
    store: &'a Store,
}

impl<'a> GoalEvaluator<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn evaluate(&self, goal_id: Uuid) -> Result<GoalProgress> {
        self.evaluate_at(goal_id, Utc::now())
    }

    /// Evaluate as of `now`; entries after it are ignored
    pub fn evaluate_at(&self, goal_id: Uuid, now: DateTime<Utc>) -> Result<GoalProgress> {
        let goal: Goal = self.store.get(goal_id)?;
        self.progress_of(&goal, now)
    }

    /// Progress of every goal of a user, oldest goal first
    pub fn evaluate_all(&self, user_id: Uuid) -> Result<Vec<GoalProgress>> {
        self.evaluate_all_at(user_id, Utc::now())
    }

    pub fn evaluate_all_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Vec<GoalProgress>> {
        let goals: Vec<Goal> = self.store.list_by_user(user_id, TimeRange::all())?;
        goals.iter().map(|goal| self.progress_of(goal, now)).collect()
    }

    fn progress_of(&self, goal: &Goal, now: DateTime<Utc>) -> Result<GoalProgress> {
        let aggregation = goal.kind.aggregation();
        let range = match aggregation {
            Aggregation::Sum if goal.created_at > now => {
                // Nothing can count before the goal exists
                return Ok(build_progress(goal, None, 0, now));
            }
            Aggregation::Sum => TimeRange::between(goal.created_at, now),
            Aggregation::Latest => TimeRange::until(now),
        };

        let entries: Vec<ExerciseEntry> = self.store.list_by_user(goal.user_id, range)?;
        let matching: Vec<&ExerciseEntry> = entries.iter().filter(|e| goal.matches(e)).collect();

        let accumulated = match aggregation {
            // fold from +0.0: an empty f64 sum() is -0.0
            Aggregation::Sum => {
                Some(matching.iter().fold(0.0, |acc, e| acc + e.measurement.value))
            }
            // Entries come back oldest first
            Aggregation::Latest => matching.last().map(|e| e.measurement.value),
        };

        let progress = build_progress(goal, accumulated, matching.len(), now);
        tracing::debug!(
            "Goal {} ({}): {:.2}/{:.2} = {:.1}%",
            goal.id,
            goal.kind,
            progress.accumulated,
            progress.target,
            progress.percentage
        );
        Ok(progress)
    }
}

/// `observed` is `None` when no entry could be used (no weight recorded yet)
fn build_progress(
    goal: &Goal,
    observed: Option<f64>,
    entries_counted: usize,
    now: DateTime<Utc>,
) -> GoalProgress {
    let accumulated = observed.unwrap_or(0.0);
    let (ratio, completed) = match goal.direction {
        GoalDirection::AtLeast => (accumulated / goal.target, accumulated >= goal.target),
        GoalDirection::AtMost => match observed {
            None => (0.0, false),
            Some(value) if value <= goal.target => (1.0, true),
            Some(value) => (goal.target / value, false),
        },
    };

    GoalProgress {
        goal_id: goal.id,
        kind: goal.kind,
        direction: goal.direction,
        accumulated,
        target: goal.target,
        percentage: clamp_percentage(ratio),
        completed,
        entries_counted,
        days_remaining: goal
            .target_date
            .map(|date| (date - now.date_naive()).num_days()),
    }
}

fn clamp_percentage(ratio: f64) -> f64 {
    if ratio.is_nan() {
        return 0.0;
    }
    ratio.clamp(0.0, 1.0) * 100.0
}
