mod chart;
mod menu;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand};
use fit_core::*;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "fittrack")]
#[command(about = "Personal fitness tracker: log exercise and food, set goals, chart progress", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Username to act as
    #[arg(long, short, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new user
    Register {
        username: String,

        /// Display name (defaults to the username)
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Log an exercise, food or workout entry
    Log {
        #[command(subcommand)]
        entry: LogCommand,
    },

    /// Manage goals
    Goal {
        #[command(subcommand)]
        action: GoalCommand,
    },

    /// Show progress of every goal
    Progress {
        #[arg(long)]
        json: bool,
    },

    /// Show a metric day by day
    Series {
        /// reps, time, distance, weight, calories, burned or net
        #[arg(long, value_parser = parse_value::<SeriesMetric>)]
        metric: SeriesMetric,

        /// First day (YYYY-MM-DD)
        #[arg(long, conflicts_with = "days")]
        from: Option<NaiveDate>,

        /// Last day, defaults to today
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Number of days ending with --to
        #[arg(long)]
        days: Option<u32>,

        /// Write the series to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Calories consumed and burned on one day
    Calories {
        /// Day to summarize, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        json: bool,
    },

    /// Manage timed activities
    Activity {
        #[command(subcommand)]
        action: ActivityCommand,
    },

    /// Manage routines
    Routine {
        #[command(subcommand)]
        action: RoutineCommand,
    },

    /// Manage the biometric profile
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },

    /// Interactive menu (default)
    Menu,
}

#[derive(Subcommand)]
enum LogCommand {
    /// Log an exercise measurement
    Exercise {
        name: String,

        #[arg(long, value_parser = parse_value::<Metric>)]
        metric: Metric,

        #[arg(long, allow_negative_numbers = true)]
        value: f64,

        /// When it happened (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Log food eaten
    Food {
        name: String,

        #[arg(long, allow_negative_numbers = true)]
        calories: f64,

        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Log a workout and the calories it burned
    #[command(group(
        ArgGroup::new("source")
            .required(true)
            .args(["calories", "weightlifting", "activity"]),
    ))]
    Workout {
        /// Calories burned, entered directly
        #[arg(long, allow_negative_numbers = true)]
        calories: Option<f64>,

        /// Weightlifting at the given intensity
        #[arg(long, value_parser = parse_value::<Intensity>, requires = "minutes")]
        weightlifting: Option<Intensity>,

        /// Named activity
        #[arg(long, requires_all = ["intensity", "minutes"])]
        activity: Option<String>,

        /// Intensity of the activity
        #[arg(long, value_parser = parse_value::<Intensity>)]
        intensity: Option<Intensity>,

        #[arg(long, allow_negative_numbers = true)]
        minutes: Option<f64>,

        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

#[derive(Subcommand)]
enum GoalCommand {
    /// Set a new goal
    Add {
        #[arg(long, value_parser = parse_value::<Metric>)]
        kind: Metric,

        #[arg(long, allow_negative_numbers = true)]
        target: f64,

        /// at-least (default) or at-most (weight only)
        #[arg(long, value_parser = parse_value::<GoalDirection>)]
        direction: Option<GoalDirection>,

        /// Only count entries for this exercise
        #[arg(long)]
        exercise: Option<String>,

        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        by: Option<NaiveDate>,
    },

    /// List goals
    List {
        #[arg(long)]
        json: bool,
    },

    /// Delete a goal
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum ActivityCommand {
    /// Add a custom activity with kcal/min rates
    Add {
        name: String,

        #[arg(long)]
        light: f64,

        #[arg(long)]
        moderate: f64,

        #[arg(long)]
        intense: f64,
    },

    /// List activities
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RoutineCommand {
    /// Create a routine
    Add {
        name: String,

        /// name:sets:reps[:weight_kg[:minutes[:km]]], repeatable
        #[arg(long = "item", required = true, value_parser = parse_routine_item)]
        items: Vec<RoutineItem>,
    },

    /// List routines
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show a routine
    Show { name: String },

    /// Delete a routine
    Delete { name: String },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Set profile fields; unset ones keep their stored value
    Set {
        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Show the profile and daily calorie target
    Show,
}

#[derive(Args, Clone, Debug, Default)]
struct ProfileArgs {
    #[arg(long)]
    age: Option<f64>,

    #[arg(long, value_parser = parse_value::<Sex>)]
    sex: Option<Sex>,

    /// Weight in kg
    #[arg(long)]
    weight: Option<f64>,

    /// Height in cm
    #[arg(long)]
    height: Option<f64>,

    /// lose, gain or maintain
    #[arg(long, value_parser = parse_value::<FitnessGoal>)]
    goal: Option<FitnessGoal>,
}

impl ProfileArgs {
    /// `None` when no field is given; every field is required otherwise
    fn into_profile(self) -> Result<Option<Profile>> {
        match (self.age, self.sex, self.weight, self.height, self.goal) {
            (None, None, None, None, None) => Ok(None),
            (Some(age_years), Some(sex), Some(weight_kg), Some(height_cm), Some(fitness_goal)) => {
                Ok(Some(Profile {
                    age_years,
                    sex,
                    weight_kg,
                    height_cm,
                    fitness_goal,
                }))
            }
            _ => Err(Error::validation(
                "a profile needs --age, --sex, --weight, --height and --goal",
            )),
        }
    }

    fn is_empty(&self) -> bool {
        self.age.is_none()
            && self.sex.is_none()
            && self.weight.is_none()
            && self.height.is_none()
            && self.goal.is_none()
    }

    /// Apply the given fields over a stored profile. Without one, every
    /// field is required.
    fn merge_over(self, existing: Option<Profile>) -> Result<Profile> {
        let Some(mut profile) = existing else {
            return self
                .into_profile()?
                .ok_or_else(|| Error::validation("no profile fields given"));
        };
        if self.is_empty() {
            return Err(Error::validation("no profile fields given"));
        }
        if let Some(age) = self.age {
            profile.age_years = age;
        }
        if let Some(sex) = self.sex {
            profile.sex = sex;
        }
        if let Some(weight) = self.weight {
            profile.weight_kg = weight;
        }
        if let Some(height) = self.height {
            profile.height_cm = height;
        }
        if let Some(goal) = self.goal {
            profile.fitness_goal = goal;
        }
        Ok(profile)
    }
}

/// clap parser for the core types' `FromStr`
fn parse_value<T>(s: &str) -> std::result::Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    s.parse().map_err(|e: T::Err| e.to_string())
}

fn parse_routine_item(s: &str) -> std::result::Result<RoutineItem, String> {
    let parts: Vec<&str> = s.split(':').map(str::trim).collect();
    if parts.len() < 3 || parts.len() > 6 {
        return Err(format!(
            "expected name:sets:reps[:weight_kg[:minutes[:km]]], got '{}'",
            s
        ));
    }

    let number = |index: usize, what: &str| -> std::result::Result<f64, String> {
        parts
            .get(index)
            .map_or(Ok(0.0), |p| p.parse().map_err(|_| format!("invalid {} '{}'", what, p)))
    };

    Ok(RoutineItem {
        exercise: parts[0].to_string(),
        sets: parts[1]
            .parse()
            .map_err(|_| format!("invalid sets '{}'", parts[1]))?,
        reps: parts[2]
            .parse()
            .map_err(|_| format!("invalid reps '{}'", parts[2]))?,
        weight_kg: number(3, "weight")?,
        duration_min: number(4, "duration")?,
        distance_km: number(5, "distance")?,
    })
}

fn main() -> ExitCode {
    // Initialize logging
    fit_core::logging::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Everything a command needs: configuration and an open store
pub struct App {
    pub config: Config,
    pub store: Store,
}

impl App {
    fn open(config_path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) if path.exists() => Config::load_from(path)?,
            Some(path) => {
                tracing::info!("No config file found at {:?}, using defaults", path);
                Config::default()
            }
            None => Config::load()?,
        };
        if let Some(dir) = data_dir {
            config.data.data_dir = dir;
        }

        let store = Store::open(&config.database_path())?;
        Ok(Self { config, store })
    }

    /// Log in as the `--user` given on the command line
    fn session(&self, username: Option<&str>) -> Result<Session> {
        let username =
            username.ok_or_else(|| Error::validation("this command needs --user <username>"))?;
        account::login(&self.store, username)
    }

    pub fn logger(&self) -> Logger<'_> {
        Logger::new(&self.store, &self.config)
    }
}

fn run(cli: Cli) -> Result<()> {
    let app = App::open(cli.config.as_deref(), cli.data_dir)?;
    let user = cli.user.as_deref();

    match cli.command {
        Some(Commands::Register {
            username,
            name,
            profile,
        }) => cmd_register(&app, &username, name.as_deref(), profile),
        Some(Commands::Log { entry }) => cmd_log(&app, &app.session(user)?, entry),
        Some(Commands::Goal { action }) => cmd_goal(&app, &app.session(user)?, action),
        Some(Commands::Progress { json }) => cmd_progress(&app, &app.session(user)?, json),
        Some(Commands::Series {
            metric,
            from,
            to,
            days,
            csv,
            json,
        }) => {
            let session = app.session(user)?;
            let range = resolve_range(&app.config, from, to, days)?;
            cmd_series(&app, &session, metric, range, csv.as_deref(), json)
        }
        Some(Commands::Calories { date, json }) => {
            cmd_calories(&app, &app.session(user)?, date, json)
        }
        Some(Commands::Activity { action }) => cmd_activity(&app, &app.session(user)?, action),
        Some(Commands::Routine { action }) => cmd_routine(&app, &app.session(user)?, action),
        Some(Commands::Profile { action }) => cmd_profile(&app, &app.session(user)?, action),
        Some(Commands::Menu) | None => {
            // Default to the interactive menu
            let session = user.map(|u| account::login(&app.store, u)).transpose()?;
            let stdin = std::io::stdin();
            menu::Menu::new(&app, session, stdin.lock(), std::io::stdout()).run()
        }
    }
}

fn cmd_register(
    app: &App,
    username: &str,
    name: Option<&str>,
    profile: ProfileArgs,
) -> Result<()> {
    let user = account::register(
        &app.store,
        username,
        name,
        profile.into_profile()?,
        Utc::now(),
    )?;

    println!("✓ Registered {} ({})", user.username, user.id);
    if let Some(target) = account::calorie_target(&user) {
        println!("  Daily calorie target: {:.0} kcal", target);
    }
    Ok(())
}

fn cmd_log(app: &App, session: &Session, entry: LogCommand) -> Result<()> {
    let logger = app.logger();
    match entry {
        LogCommand::Exercise {
            name,
            metric,
            value,
            at,
        } => {
            let entry = logger.log_exercise(session.user_id, &name, metric, value, at)?;
            println!("✓ Logged {}: {}", entry.name, entry.measurement);
        }
        LogCommand::Food { name, calories, at } => {
            let entry = logger.log_food(session.user_id, &name, calories, at)?;
            println!("✓ Logged {}: {} kcal", entry.name, chart::format_value(entry.calories));
        }
        LogCommand::Workout {
            calories,
            weightlifting,
            activity,
            intensity,
            minutes,
            at,
        } => {
            let input = match (calories, weightlifting, activity) {
                (Some(calories), _, _) => WorkoutInput::Manual { calories },
                (_, Some(intensity), _) => WorkoutInput::Weightlifting {
                    intensity,
                    minutes: minutes.unwrap_or_default(),
                },
                (_, _, Some(name)) => WorkoutInput::Activity {
                    name,
                    intensity: intensity.unwrap_or(Intensity::Moderate),
                    minutes: minutes.unwrap_or_default(),
                },
                _ => return Err(Error::validation("no workout source given")),
            };
            let entry = logger.log_workout(session.user_id, input, at)?;
            println!(
                "✓ Logged workout {}: {} kcal burned",
                entry.source,
                chart::format_value(entry.calories_burned)
            );
        }
    }
    Ok(())
}

fn cmd_goal(app: &App, session: &Session, action: GoalCommand) -> Result<()> {
    match action {
        GoalCommand::Add {
            kind,
            target,
            direction,
            exercise,
            by,
        } => {
            let goal = add_goal(app, session, kind, target, direction, exercise, by)?;
            println!("✓ Added goal {}", goal.id);
            println!("  {}", describe_goal(&goal));
        }
        GoalCommand::List { json } => {
            let goals: Vec<Goal> = app.store.list_by_user(session.user_id, TimeRange::all())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&goals)?);
            } else if goals.is_empty() {
                println!("No goals yet.");
            } else {
                for goal in &goals {
                    println!("{}  {}", goal.id, describe_goal(goal));
                }
            }
        }
        GoalCommand::Delete { id } => {
            let goal: Goal = app.store.get(id)?;
            if goal.user_id != session.user_id {
                return Err(Error::not_found("Goal", id));
            }
            app.store.delete::<Goal>(id)?;
            println!("✓ Deleted goal {}", id);
        }
    }
    Ok(())
}

pub fn add_goal(
    app: &App,
    session: &Session,
    kind: Metric,
    target: f64,
    direction: Option<GoalDirection>,
    exercise: Option<String>,
    by: Option<NaiveDate>,
) -> Result<Goal> {
    let mut goal = Goal::new(session.user_id, kind, target, Utc::now())
        .with_direction(direction.unwrap_or_else(|| GoalDirection::default_for(kind)));
    if let Some(exercise) = exercise {
        goal = goal.for_exercise(exercise.trim());
    }
    if let Some(date) = by {
        goal = goal.due_by(date);
    }
    app.store.create(&goal)?;
    Ok(goal)
}

pub fn describe_goal(goal: &Goal) -> String {
    let comparison = match goal.direction {
        GoalDirection::AtLeast => "≥",
        GoalDirection::AtMost => "≤",
    };
    let mut text = format!(
        "{} {} {} {}",
        goal.kind,
        comparison,
        chart::format_value(goal.target),
        goal.kind.unit()
    );
    if let Some(exercise) = &goal.exercise {
        text.push_str(&format!(" of {}", exercise));
    }
    if let Some(date) = goal.target_date {
        text.push_str(&format!(" by {}", date));
    }
    text
}

fn cmd_progress(app: &App, session: &Session, json: bool) -> Result<()> {
    let progress = GoalEvaluator::new(&app.store).evaluate_all(session.user_id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&progress)?);
    } else {
        print!("{}", format_progress(&progress));
    }
    Ok(())
}

pub fn format_progress(progress: &[GoalProgress]) -> String {
    if progress.is_empty() {
        return "No goals yet.\n".to_string();
    }

    let mut out = String::new();
    for p in progress {
        let mark = if p.completed { "✓" } else { " " };
        out.push_str(&format!(
            "[{}] {} {}: {}/{} {} ({:.0}%)",
            mark,
            p.kind,
            p.direction.as_str().replace('_', "-"),
            chart::format_value(p.accumulated),
            chart::format_value(p.target),
            p.kind.unit(),
            p.percentage
        ));
        match p.days_remaining {
            Some(days) if days < 0 => out.push_str(&format!(", {} days overdue", -days)),
            Some(days) => out.push_str(&format!(", {} days left", days)),
            None => {}
        }
        out.push('\n');
    }
    out
}

/// Explicit bounds, or the last `days` days (config default) ending `to`
fn resolve_range(
    config: &Config,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    days: Option<u32>,
) -> Result<DateRange> {
    let to = to.unwrap_or_else(|| Utc::now().date_naive());
    match from {
        Some(from) => DateRange::new(from, to),
        None => DateRange::last_days(to, days.unwrap_or(config.reporting.default_range_days)),
    }
}

fn cmd_series(
    app: &App,
    session: &Session,
    metric: SeriesMetric,
    range: DateRange,
    csv: Option<&Path>,
    json: bool,
) -> Result<()> {
    let series = ProgressReporter::new(&app.store).series(session.user_id, metric, range)?;

    if let Some(path) = csv {
        let rows = reporter::write_series_csv(path, series)?;
        println!("✓ Wrote {} days to {}", rows, path.display());
        return Ok(());
    }

    let points: Vec<SeriesPoint> = series.collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&points)?);
    } else {
        print!(
            "{}",
            chart::render(
                &metric.to_string(),
                metric.unit(),
                &points,
                app.config.reporting.chart_width
            )
        );
    }
    Ok(())
}

fn cmd_calories(app: &App, session: &Session, date: Option<NaiveDate>, json: bool) -> Result<()> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let summary = ProgressReporter::new(&app.store).calorie_summary(session.user_id, date)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", format_calories(&summary));
    }
    Ok(())
}

pub fn format_calories(summary: &CalorieSummary) -> String {
    let mut out = format!(
        "Calories on {}\n  Consumed: {} kcal\n  Burned:   {} kcal\n  Net:      {} kcal\n",
        summary.date,
        chart::format_value(summary.consumed),
        chart::format_value(summary.burned),
        chart::format_value(summary.net)
    );
    if let (Some(target), Some(remaining)) = (summary.target, summary.remaining()) {
        out.push_str(&format!(
            "  Target:   {:.0} kcal ({:.0} remaining)\n",
            target, remaining
        ));
    }
    out
}

fn cmd_activity(app: &App, session: &Session, action: ActivityCommand) -> Result<()> {
    match action {
        ActivityCommand::Add {
            name,
            light,
            moderate,
            intense,
        } => {
            let activity = activities::add_custom_activity(
                &app.store,
                session.user_id,
                &name,
                IntensityRates::new(light, moderate, intense),
                Utc::now(),
            )?;
            println!("✓ Added activity {}", activity.name);
        }
        ActivityCommand::List { json } => {
            let catalog = ActivityCatalog::load(&app.store, &app.config, session.user_id)?;
            let visible = catalog.visible();
            if json {
                println!("{}", serde_json::to_string_pretty(&visible)?);
            } else {
                println!("{:<16} {:>7} {:>9} {:>8}  source", "activity", "light", "moderate", "intense");
                for activity in visible {
                    println!(
                        "{:<16} {:>7} {:>9} {:>8}  {:?}",
                        activity.name,
                        chart::format_value(activity.rates.light),
                        chart::format_value(activity.rates.moderate),
                        chart::format_value(activity.rates.intense),
                        activity.source
                    );
                }
            }
        }
    }
    Ok(())
}

fn cmd_routine(app: &App, session: &Session, action: RoutineCommand) -> Result<()> {
    match action {
        RoutineCommand::Add { name, items } => {
            let routine =
                routines::create_routine(&app.store, session.user_id, &name, items, Utc::now())?;
            println!(
                "✓ Created routine {} with {} exercises",
                routine.name,
                routine.items.len()
            );
        }
        RoutineCommand::List { json } => {
            let all = routines::list_routines(&app.store, session.user_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else if all.is_empty() {
                println!("No routines yet.");
            } else {
                for routine in &all {
                    println!("{} ({} exercises)", routine.name, routine.items.len());
                }
            }
        }
        RoutineCommand::Show { name } => {
            let routine = find_routine(app, session, &name)?;
            println!("{}", routine.name);
            for item in &routine.items {
                println!("  {}", describe_routine_item(item));
            }
        }
        RoutineCommand::Delete { name } => {
            let routine = find_routine(app, session, &name)?;
            routines::delete_routine(&app.store, routine.id)?;
            println!("✓ Deleted routine {}", routine.name);
        }
    }
    Ok(())
}

/// `Squat: 5 x 5 @ 100 kg`, with minutes and km when set
pub fn describe_routine_item(item: &RoutineItem) -> String {
    let mut line = format!("{}: {} x {}", item.exercise, item.sets, item.reps);
    if item.weight_kg > 0.0 {
        line.push_str(&format!(" @ {} kg", chart::format_value(item.weight_kg)));
    }
    if item.duration_min > 0.0 {
        line.push_str(&format!(", {} min", chart::format_value(item.duration_min)));
    }
    if item.distance_km > 0.0 {
        line.push_str(&format!(", {} km", chart::format_value(item.distance_km)));
    }
    line
}

fn find_routine(app: &App, session: &Session, name: &str) -> Result<Routine> {
    routines::find_routine(&app.store, session.user_id, name)?
        .ok_or_else(|| Error::not_found("Routine", name.trim()))
}

fn cmd_profile(app: &App, session: &Session, action: ProfileCommand) -> Result<()> {
    let user = match action {
        ProfileCommand::Set { profile } => {
            let current: User = app.store.get(session.user_id)?;
            let profile = profile.merge_over(current.profile)?;
            let user = account::update_profile(&app.store, session.user_id, profile)?;
            println!("✓ Profile updated");
            user
        }
        ProfileCommand::Show => app.store.get(session.user_id)?,
    };

    match &user.profile {
        Some(profile) => {
            println!(
                "  {} years, {}, {} kg, {} cm, goal: {}",
                chart::format_value(profile.age_years),
                profile.sex.as_str(),
                chart::format_value(profile.weight_kg),
                chart::format_value(profile.height_cm),
                profile.fitness_goal.as_str()
            );
            println!("  BMR: {:.0} kcal/day", energy::bmr(profile));
            println!(
                "  Daily calorie target: {:.0} kcal",
                energy::daily_calorie_target(profile)
            );
        }
        None => println!("No profile set."),
    }
    Ok(())
}
