//! Table mappings for each persisted type.

use super::columns::{date_at, instant_at, json_at, millis, parsed_at, uuid_at};
use super::{Record, UserOwned};
use crate::{
    CustomActivity, ExerciseEntry, FoodEntry, Goal, IntensityRates, Measurement, Profile, Result,
    Routine, RoutineItem, User, WorkoutEntry,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

impl Record for User {
    const ENTITY: &'static str = "User";
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str =
        "id, username, display_name, created_at, age_years, sex, weight_kg, height_cm, fitness_goal";

    fn id(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> String {
        self.username.clone()
    }

    fn validate(&self) -> Result<()> {
        User::validate(self)
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let profile = self.profile.as_ref();
        conn.execute(
            "INSERT INTO users (id, username, display_name, created_at,
                                age_years, sex, weight_kg, height_cm, fitness_goal)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                self.id.to_string(),
                self.username,
                self.display_name,
                millis(self.created_at),
                profile.map(|p| p.age_years),
                profile.map(|p| p.sex.as_str()),
                profile.map(|p| p.weight_kg),
                profile.map(|p| p.height_cm),
                profile.map(|p| p.fitness_goal.as_str()),
            ],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let age: Option<f64> = row.get(4)?;
        let sex: Option<String> = row.get(5)?;
        let weight: Option<f64> = row.get(6)?;
        let height: Option<f64> = row.get(7)?;
        let goal: Option<String> = row.get(8)?;

        // A profile is stored whole or not at all
        let profile = match (age, sex, weight, height, goal) {
            (Some(age_years), Some(_), Some(weight_kg), Some(height_cm), Some(_)) => Some(Profile {
                age_years,
                sex: parsed_at(row, 5)?,
                weight_kg,
                height_cm,
                fitness_goal: parsed_at(row, 8)?,
            }),
            _ => None,
        };

        Ok(User {
            id: uuid_at(row, 0)?,
            username: row.get(1)?,
            display_name: row.get(2)?,
            created_at: instant_at(row, 3)?,
            profile,
        })
    }
}

impl Record for ExerciseEntry {
    const ENTITY: &'static str = "Exercise entry";
    const TABLE: &'static str = "exercise_entries";
    const COLUMNS: &'static str = "id, user_id, name, metric, value, recorded_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.user_id)
    }

    fn validate(&self) -> Result<()> {
        ExerciseEntry::validate(self)
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO exercise_entries (id, user_id, name, metric, value, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.id.to_string(),
                self.user_id.to_string(),
                self.name,
                self.measurement.metric.as_str(),
                self.measurement.value,
                millis(self.timestamp),
            ],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ExerciseEntry {
            id: uuid_at(row, 0)?,
            user_id: uuid_at(row, 1)?,
            name: row.get(2)?,
            measurement: Measurement {
                metric: parsed_at(row, 3)?,
                value: row.get(4)?,
            },
            timestamp: instant_at(row, 5)?,
        })
    }
}

impl UserOwned for ExerciseEntry {
    const TIME_COLUMN: &'static str = "recorded_at";
}

impl Record for FoodEntry {
    const ENTITY: &'static str = "Food entry";
    const TABLE: &'static str = "food_entries";
    const COLUMNS: &'static str = "id, user_id, name, calories, recorded_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.user_id)
    }

    fn validate(&self) -> Result<()> {
        FoodEntry::validate(self)
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO food_entries (id, user_id, name, calories, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.id.to_string(),
                self.user_id.to_string(),
                self.name,
                self.calories,
                millis(self.timestamp),
            ],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(FoodEntry {
            id: uuid_at(row, 0)?,
            user_id: uuid_at(row, 1)?,
            name: row.get(2)?,
            calories: row.get(3)?,
            timestamp: instant_at(row, 4)?,
        })
    }
}

impl UserOwned for FoodEntry {
    const TIME_COLUMN: &'static str = "recorded_at";
}

impl Record for WorkoutEntry {
    const ENTITY: &'static str = "Workout";
    const TABLE: &'static str = "workout_entries";
    const COLUMNS: &'static str = "id, user_id, source, calories_burned, recorded_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.user_id)
    }

    fn validate(&self) -> Result<()> {
        WorkoutEntry::validate(self)
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let source = serde_json::to_string(&self.source)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        conn.execute(
            "INSERT INTO workout_entries (id, user_id, source, calories_burned, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.id.to_string(),
                self.user_id.to_string(),
                source,
                self.calories_burned,
                millis(self.timestamp),
            ],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(WorkoutEntry {
            id: uuid_at(row, 0)?,
            user_id: uuid_at(row, 1)?,
            source: json_at(row, 2)?,
            calories_burned: row.get(3)?,
            timestamp: instant_at(row, 4)?,
        })
    }
}

impl UserOwned for WorkoutEntry {
    const TIME_COLUMN: &'static str = "recorded_at";
}

impl Record for Goal {
    const ENTITY: &'static str = "Goal";
    const TABLE: &'static str = "goals";
    const COLUMNS: &'static str =
        "id, user_id, kind, target, direction, exercise, target_date, created_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.user_id)
    }

    fn validate(&self) -> Result<()> {
        Goal::validate(self)
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO goals (id, user_id, kind, target, direction, exercise, target_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.id.to_string(),
                self.user_id.to_string(),
                self.kind.as_str(),
                self.target,
                self.direction.as_str(),
                self.exercise,
                self.target_date.map(|d| d.format("%Y-%m-%d").to_string()),
                millis(self.created_at),
            ],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Goal {
            id: uuid_at(row, 0)?,
            user_id: uuid_at(row, 1)?,
            kind: parsed_at(row, 2)?,
            target: row.get(3)?,
            direction: parsed_at(row, 4)?,
            exercise: row.get(5)?,
            target_date: date_at(row, 6)?,
            created_at: instant_at(row, 7)?,
        })
    }
}

impl UserOwned for Goal {
    const TIME_COLUMN: &'static str = "created_at";
}

impl Record for CustomActivity {
    const ENTITY: &'static str = "Activity";
    const TABLE: &'static str = "custom_activities";
    const COLUMNS: &'static str = "id, user_id, name, light, moderate, intense, created_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.user_id)
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn validate(&self) -> Result<()> {
        CustomActivity::validate(self)
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO custom_activities (id, user_id, name, light, moderate, intense, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.id.to_string(),
                self.user_id.to_string(),
                self.name,
                self.rates.light,
                self.rates.moderate,
                self.rates.intense,
                millis(self.created_at),
            ],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(CustomActivity {
            id: uuid_at(row, 0)?,
            user_id: uuid_at(row, 1)?,
            name: row.get(2)?,
            rates: IntensityRates::new(row.get(3)?, row.get(4)?, row.get(5)?),
            created_at: instant_at(row, 6)?,
        })
    }
}

impl UserOwned for CustomActivity {
    const TIME_COLUMN: &'static str = "created_at";
}

impl Record for Routine {
    const ENTITY: &'static str = "Routine";
    const TABLE: &'static str = "routines";
    const COLUMNS: &'static str = "id, user_id, name, created_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.user_id)
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn validate(&self) -> Result<()> {
        Routine::validate(self)
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO routines (id, user_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                self.id.to_string(),
                self.user_id.to_string(),
                self.name,
                millis(self.created_at),
            ],
        )?;

        for (position, item) in self.items.iter().enumerate() {
            tx.execute(
                "INSERT INTO routine_items
                 (routine_id, position, exercise, sets, reps, weight_kg, duration_min, distance_km)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    self.id.to_string(),
                    position as i64,
                    item.exercise,
                    item.sets,
                    item.reps,
                    item.weight_kg,
                    item.duration_min,
                    item.distance_km,
                ],
            )?;
        }

        tx.commit()
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Routine {
            id: uuid_at(row, 0)?,
            user_id: uuid_at(row, 1)?,
            name: row.get(2)?,
            items: Vec::new(),
            created_at: instant_at(row, 3)?,
        })
    }

    fn load_children(&mut self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(
            "SELECT exercise, sets, reps, weight_kg, duration_min, distance_km
             FROM routine_items
             WHERE routine_id = ?1
             ORDER BY position ASC",
        )?;

        let items = stmt.query_map([self.id.to_string()], |row| {
            Ok(RoutineItem {
                exercise: row.get(0)?,
                sets: row.get(1)?,
                reps: row.get(2)?,
                weight_kg: row.get(3)?,
                duration_min: row.get(4)?,
                distance_km: row.get(5)?,
            })
        })?;

        self.items = items.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(())
    }
}

impl UserOwned for Routine {
    const TIME_COLUMN: &'static str = "created_at";
}
