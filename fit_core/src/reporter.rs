//! Day-by-day summaries of logged data.
//!
//! A [`DailySeries`] yields exactly one point per calendar day (UTC) of its
//! range, in ascending order. Cumulative metrics report the day's total and
//! 0 on empty days. Weight carries the last observation forward, seeded from
//! the last weigh-in before the range; before any weigh-in it reports 0.

use crate::account;
use crate::store::{Store, TimeRange};
use crate::{
    Aggregation, Error, ExerciseEntry, FoodEntry, Metric, Result, SeriesMetric, User,
    WorkoutEntry,
};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use uuid::Uuid;

/// Inclusive range of calendar days
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::validation(format!(
                "date range starts after it ends ({} > {})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The `days` days ending with `today`
    pub fn last_days(today: NaiveDate, days: u32) -> Result<Self> {
        if days == 0 {
            return Err(Error::validation("a date range needs at least one day"));
        }
        let start = today
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .ok_or_else(|| Error::validation(format!("{} days before {} is out of range", days, today)))?;
        Self::new(start, today)
    }

    pub fn days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Instants covered by the range, first to last millisecond
    fn time_range(&self) -> TimeRange {
        TimeRange::between(start_of(self.start), end_of(self.end))
    }
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn end_of(day: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    day.and_time(last).and_utc()
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Restartable iterator over the points of one series.
///
/// Entries are read once when the series is built; points are produced on
/// demand from the per-day observations.
#[derive(Clone, Debug)]
pub struct DailySeries {
    metric: SeriesMetric,
    range: DateRange,
    /// One value per day that had data, ascending by date
    observations: Vec<(NaiveDate, f64)>,
    /// Last weight before the range
    seed: Option<f64>,
    next_day: Option<NaiveDate>,
    cursor: usize,
    carried: Option<f64>,
}

impl DailySeries {
    fn new(
        metric: SeriesMetric,
        range: DateRange,
        observations: BTreeMap<NaiveDate, f64>,
        seed: Option<f64>,
    ) -> Self {
        Self {
            metric,
            range,
            observations: observations.into_iter().collect(),
            seed,
            next_day: Some(range.start),
            cursor: 0,
            carried: seed,
        }
    }

    pub fn metric(&self) -> SeriesMetric {
        self.metric
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    /// Rewind to the first day of the range
    pub fn restart(&mut self) {
        self.next_day = Some(self.range.start);
        self.cursor = 0;
        self.carried = self.seed;
    }

    fn remaining(&self) -> usize {
        match self.next_day {
            Some(day) if day <= self.range.end => (self.range.end - day).num_days() as usize + 1,
            _ => 0,
        }
    }
}

impl Iterator for DailySeries {
    type Item = SeriesPoint;

    fn next(&mut self) -> Option<SeriesPoint> {
        let day = self.next_day.filter(|day| *day <= self.range.end)?;
        self.next_day = day.succ_opt();

        let observed = match self.observations.get(self.cursor) {
            Some(&(date, value)) if date == day => {
                self.cursor += 1;
                Some(value)
            }
            _ => None,
        };

        let value = match self.metric.aggregation() {
            Aggregation::Sum => observed.unwrap_or(0.0),
            Aggregation::Latest => {
                if observed.is_some() {
                    self.carried = observed;
                }
                self.carried.unwrap_or(0.0)
            }
        };
        Some(SeriesPoint { date: day, value })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DailySeries {}

/// Calories of one day
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CalorieSummary {
    pub date: NaiveDate,
    pub consumed: f64,
    pub burned: f64,
    pub net: f64,
    /// Daily target from the user's profile
    pub target: Option<f64>,
}

impl CalorieSummary {
    /// Calories left before reaching the target; negative when over
    pub fn remaining(&self) -> Option<f64> {
        self.target.map(|target| target - self.net)
    }
}

pub struct ProgressReporter<'a> {
    store: &'a Store,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn series(
        &self,
        user_id: Uuid,
        metric: SeriesMetric,
        range: DateRange,
    ) -> Result<DailySeries> {
        let window = range.time_range();
        let mut daily = BTreeMap::new();
        let mut seed = None;

        match metric {
            SeriesMetric::Exercise(kind) => {
                let entries: Vec<ExerciseEntry> = self.store.list_by_user(user_id, window)?;
                let values = entries
                    .iter()
                    .filter(|e| e.measurement.metric == kind)
                    .map(|e| (e.timestamp, e.measurement.value));

                match kind.aggregation() {
                    Aggregation::Sum => add_daily(&mut daily, values, 1.0),
                    Aggregation::Latest => {
                        // Ascending order, so the last write of a day wins
                        for (at, value) in values {
                            daily.insert(at.date_naive(), value);
                        }
                        seed = self.last_before(user_id, kind, start_of(range.start))?;
                    }
                }
            }
            SeriesMetric::CaloriesConsumed => {
                add_daily(&mut daily, self.food(user_id, window)?, 1.0);
            }
            SeriesMetric::CaloriesBurned => {
                add_daily(&mut daily, self.workouts(user_id, window)?, 1.0);
            }
            SeriesMetric::NetCalories => {
                add_daily(&mut daily, self.food(user_id, window)?, 1.0);
                add_daily(&mut daily, self.workouts(user_id, window)?, -1.0);
            }
        }

        tracing::debug!(
            "Series {} for user {} over {}..={}: {} days with data",
            metric,
            user_id,
            range.start,
            range.end,
            daily.len()
        );
        Ok(DailySeries::new(metric, range, daily, seed))
    }

    pub fn calorie_summary(&self, user_id: Uuid, date: NaiveDate) -> Result<CalorieSummary> {
        let user: User = self.store.get(user_id)?;
        let day = DateRange::new(date, date)?.time_range();

        let consumed: f64 = self.food(user_id, day)?.fold(0.0, |acc, (_, kcal)| acc + kcal);
        let burned: f64 = self.workouts(user_id, day)?.fold(0.0, |acc, (_, kcal)| acc + kcal);

        Ok(CalorieSummary {
            date,
            consumed,
            burned,
            net: consumed - burned,
            target: account::calorie_target(&user),
        })
    }

    fn food(
        &self,
        user_id: Uuid,
        window: TimeRange,
    ) -> Result<impl Iterator<Item = (DateTime<Utc>, f64)>> {
        let entries: Vec<FoodEntry> = self.store.list_by_user(user_id, window)?;
        Ok(entries.into_iter().map(|e| (e.timestamp, e.calories)))
    }

    fn workouts(
        &self,
        user_id: Uuid,
        window: TimeRange,
    ) -> Result<impl Iterator<Item = (DateTime<Utc>, f64)>> {
        let entries: Vec<WorkoutEntry> = self.store.list_by_user(user_id, window)?;
        Ok(entries.into_iter().map(|e| (e.timestamp, e.calories_burned)))
    }

    fn last_before(
        &self,
        user_id: Uuid,
        kind: Metric,
        before: DateTime<Utc>,
    ) -> Result<Option<f64>> {
        let entries: Vec<ExerciseEntry> =
            self.store.list_by_user(user_id, TimeRange::until(before))?;
        Ok(entries
            .iter()
            .rev()
            .find(|e| e.measurement.metric == kind && e.timestamp < before)
            .map(|e| e.measurement.value))
    }
}

fn add_daily(
    daily: &mut BTreeMap<NaiveDate, f64>,
    values: impl Iterator<Item = (DateTime<Utc>, f64)>,
    sign: f64,
) {
    for (at, value) in values {
        *daily.entry(at.date_naive()).or_insert(0.0) += sign * value;
    }
}

/// Write series points as `date,value` rows, replacing any existing file.
///
/// Returns the number of rows written.
pub fn write_series_csv(
    path: &Path,
    points: impl IntoIterator<Item = SeriesPoint>,
) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    let mut rows = 0;
    for point in points {
        writer.serialize(point)?;
        rows += 1;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} series rows to {:?}", rows, path);
    Ok(rows)
}
