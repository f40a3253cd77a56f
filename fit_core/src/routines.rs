//! Named workout routines: an ordered list of exercises with sets and reps.

use crate::store::{Store, TimeRange};
use crate::{truncate_to_millis, Result, Routine, RoutineItem};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Store a routine. Names are unique per user.
pub fn create_routine(
    store: &Store,
    user_id: Uuid,
    name: &str,
    items: Vec<RoutineItem>,
    now: DateTime<Utc>,
) -> Result<Routine> {
    let routine = Routine {
        id: Uuid::new_v4(),
        user_id,
        name: name.trim().to_string(),
        items: items
            .into_iter()
            .map(|item| RoutineItem {
                exercise: item.exercise.trim().to_string(),
                ..item
            })
            .collect(),
        created_at: truncate_to_millis(now),
    };
    store.create(&routine)?;

    tracing::info!(
        "Created routine '{}' with {} exercises for user {}",
        routine.name,
        routine.items.len(),
        user_id
    );
    Ok(routine)
}

/// Routines of a user, oldest first
pub fn list_routines(store: &Store, user_id: Uuid) -> Result<Vec<Routine>> {
    store.list_by_user(user_id, TimeRange::all())
}

pub fn get_routine(store: &Store, routine_id: Uuid) -> Result<Routine> {
    store.get(routine_id)
}

/// Look a routine up by name (case-insensitive) among a user's routines
pub fn find_routine(store: &Store, user_id: Uuid, name: &str) -> Result<Option<Routine>> {
    let name = name.trim();
    Ok(list_routines(store, user_id)?
        .into_iter()
        .find(|r| r.name.eq_ignore_ascii_case(name)))
}

pub fn delete_routine(store: &Store, routine_id: Uuid) -> Result<()> {
    store.delete::<Routine>(routine_id)?;
    tracing::info!("Deleted routine {}", routine_id);
    Ok(())
}
