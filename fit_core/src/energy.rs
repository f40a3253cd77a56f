//! Energy calculations: basal metabolic rate, daily calorie target and
//! calories burned by timed activities.

use crate::{FitnessGoal, Intensity, IntensityRates, Profile, Sex};

/// Daily deficit or surplus applied for lose/gain goals (kcal)
pub const GOAL_ADJUSTMENT_KCAL: f64 = 300.0;

/// Basal metabolic rate in kcal/day (Harris-Benedict)
pub fn bmr(profile: &Profile) -> f64 {
    let w = profile.weight_kg;
    let h = profile.height_cm;
    let a = profile.age_years;
    match profile.sex {
        Sex::Female => 655.1 + 9.563 * w + 1.850 * h - 4.676 * a,
        Sex::Male => 66.47 + 13.75 * w + 5.003 * h - 6.755 * a,
    }
}

/// Calories to eat per day for the profile's fitness goal
pub fn daily_calorie_target(profile: &Profile) -> f64 {
    let base = bmr(profile);
    match profile.fitness_goal {
        FitnessGoal::Lose => base - GOAL_ADJUSTMENT_KCAL,
        FitnessGoal::Gain => base + GOAL_ADJUSTMENT_KCAL,
        FitnessGoal::Maintain => base,
    }
}

pub fn calories_burned(rates: &IntensityRates, intensity: Intensity, minutes: f64) -> f64 {
    rates.per_minute(intensity) * minutes
}
