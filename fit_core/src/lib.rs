#![forbid(unsafe_code)]

//! Core domain model and business logic for fittrack.
//!
//! This crate provides:
//! - Domain types (users, entries, goals, activities, routines)
//! - SQLite persistence
//! - Entry logging and calorie calculations
//! - Goal evaluation and day-by-day progress reports

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod store;
pub mod energy;
pub mod activities;
pub mod account;
pub mod logger;
pub mod evaluator;
pub mod reporter;
pub mod routines;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use store::{Store, TimeRange};
pub use account::Session;
pub use activities::{Activity, ActivityCatalog};
pub use logger::{Logger, WorkoutInput};
pub use evaluator::GoalEvaluator;
pub use reporter::{CalorieSummary, DailySeries, DateRange, ProgressReporter, SeriesPoint};
