//! Interactive menu loop.
//!
//! Every action reports its error and returns to the menu; only end of input
//! or a quit command leaves the loop.

use crate::{
    add_goal, chart, describe_goal, describe_routine_item, format_calories, format_progress, App,
    ProfileArgs,
};
use chrono::{NaiveDate, Utc};
use fit_core::*;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

const MENU: &str = "\
─────────────────────────────────────────
 1) Register        7) View progress
 2) Log in          8) View series
 3) Log exercise    9) Calories today
 4) Log food       10) Create routine
 5) Log workout    11) View routines
 6) Set goal        p) Update profile
 o) Log out         q) Quit
─────────────────────────────────────────";

pub struct Menu<'a, R, W> {
    app: &'a App,
    session: Option<Session>,
    input: R,
    output: W,
}

enum Flow {
    Continue,
    Quit,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(app: &'a App, session: Option<Session>, input: R, output: W) -> Self {
        Self {
            app,
            session,
            input,
            output,
        }
    }

    pub fn run(mut self) -> Result<()> {
        loop {
            match &self.session {
                Some(session) => writeln!(self.output, "\nLogged in as {}", session.display_name)?,
                None => writeln!(self.output, "\nNot logged in")?,
            }
            writeln!(self.output, "{}", MENU)?;

            let choice = match self.prompt("> ")? {
                Some(choice) => choice,
                None => break,
            };

            match self.dispatch(choice.as_str()) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(Error::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => {
                    if !e.is_user_error() {
                        tracing::warn!("Menu action failed: {}", e);
                    }
                    writeln!(self.output, "Error: {}", e)?;
                }
            }
        }

        writeln!(self.output, "Bye!")?;
        Ok(())
    }

    fn dispatch(&mut self, choice: &str) -> Result<Flow> {
        match choice {
            "1" => self.register()?,
            "2" => self.login()?,
            "3" => self.log_exercise()?,
            "4" => self.log_food()?,
            "5" => self.log_workout()?,
            "6" => self.set_goal()?,
            "7" => self.view_progress()?,
            "8" => self.view_series()?,
            "9" => self.view_calories()?,
            "10" => self.create_routine()?,
            "11" => self.view_routines()?,
            "p" | "P" => self.update_profile()?,
            "o" | "O" => self.logout()?,
            "q" | "Q" | "quit" | "exit" => return Ok(Flow::Quit),
            "" => {}
            other => writeln!(self.output, "Unknown choice '{}'", other)?,
        }
        Ok(Flow::Continue)
    }

    fn register(&mut self) -> Result<()> {
        let username = self.ask("Username: ")?;
        let name = self.ask("Display name (blank for username): ")?;
        let user = account::register(&self.app.store, &username, Some(&name), None, Utc::now())?;
        writeln!(self.output, "✓ Registered {}", user.username)?;
        self.session = Some(Session::from(&user));
        Ok(())
    }

    fn login(&mut self) -> Result<()> {
        let username = self.ask("Username: ")?;
        let session = account::login(&self.app.store, &username)?;
        writeln!(self.output, "✓ Welcome back, {}", session.display_name)?;
        self.session = Some(session);
        Ok(())
    }

    fn log_exercise(&mut self) -> Result<()> {
        let session = self.require_session()?;
        let name = self.ask("Exercise: ")?;
        let metric: Metric = self.ask_parsed("Metric (reps/time/distance/weight): ")?;
        let value: f64 = self.ask_parsed(&format!("Value ({}): ", metric.unit()))?;

        let entry = self
            .app
            .logger()
            .log_exercise(session.user_id, &name, metric, value, None)?;
        writeln!(self.output, "✓ Logged {}: {}", entry.name, entry.measurement)?;
        Ok(())
    }

    fn log_food(&mut self) -> Result<()> {
        let session = self.require_session()?;
        let name = self.ask("Food: ")?;
        let calories: f64 = self.ask_parsed("Calories: ")?;

        let entry = self
            .app
            .logger()
            .log_food(session.user_id, &name, calories, None)?;
        writeln!(
            self.output,
            "✓ Logged {}: {} kcal",
            entry.name,
            chart::format_value(entry.calories)
        )?;
        Ok(())
    }

    fn log_workout(&mut self) -> Result<()> {
        let session = self.require_session()?;
        let kind = self.ask("Workout (manual/weightlifting/<activity name>): ")?;

        let input = if kind.eq_ignore_ascii_case("manual") {
            WorkoutInput::Manual {
                calories: self.ask_parsed("Calories burned: ")?,
            }
        } else {
            let intensity: Intensity = self.ask_parsed("Intensity (1 light, 2 moderate, 3 intense): ")?;
            let minutes: f64 = self.ask_parsed("Minutes: ")?;
            if kind.eq_ignore_ascii_case("weightlifting") {
                WorkoutInput::Weightlifting { intensity, minutes }
            } else {
                WorkoutInput::Activity {
                    name: kind,
                    intensity,
                    minutes,
                }
            }
        };

        let entry = self.app.logger().log_workout(session.user_id, input, None)?;
        writeln!(
            self.output,
            "✓ Logged workout {}: {} kcal burned",
            entry.source,
            chart::format_value(entry.calories_burned)
        )?;
        Ok(())
    }

    fn set_goal(&mut self) -> Result<()> {
        let session = self.require_session()?;
        let kind: Metric = self.ask_parsed("Goal kind (reps/time/distance/weight): ")?;
        let target: f64 = self.ask_parsed(&format!("Target ({}): ", kind.unit()))?;

        let direction = if kind == Metric::Weight {
            let default = GoalDirection::default_for(kind);
            let label = format!(
                "Direction (at-least/at-most) [{}]: ",
                default.as_str().replace('_', "-")
            );
            Some(self.ask_optional(&label, "direction")?.unwrap_or(default))
        } else {
            None
        };

        let exercise = Some(self.ask("Exercise (blank for any): ")?).filter(|e| !e.is_empty());
        let by: Option<NaiveDate> =
            self.ask_optional("Target date YYYY-MM-DD (blank for none): ", "date")?;

        let goal = add_goal(self.app, &session, kind, target, direction, exercise, by)?;
        writeln!(self.output, "✓ Goal set: {}", describe_goal(&goal))?;
        Ok(())
    }

    fn view_progress(&mut self) -> Result<()> {
        let session = self.require_session()?;
        let progress = GoalEvaluator::new(&self.app.store).evaluate_all(session.user_id)?;
        write!(self.output, "{}", format_progress(&progress))?;
        Ok(())
    }

    fn view_series(&mut self) -> Result<()> {
        let session = self.require_session()?;
        let metric: SeriesMetric =
            self.ask_parsed("Metric (reps/time/distance/weight/calories/burned/net): ")?;
        let default_days = self.app.config.reporting.default_range_days;
        let days = self
            .ask_optional(&format!("Days [{}]: ", default_days), "number of days")?
            .unwrap_or(default_days);

        let range = DateRange::last_days(Utc::now().date_naive(), days)?;
        let points: Vec<SeriesPoint> = ProgressReporter::new(&self.app.store)
            .series(session.user_id, metric, range)?
            .collect();
        write!(
            self.output,
            "{}",
            chart::render(
                &metric.to_string(),
                metric.unit(),
                &points,
                self.app.config.reporting.chart_width
            )
        )?;
        Ok(())
    }

    fn view_calories(&mut self) -> Result<()> {
        let session = self.require_session()?;
        let summary = ProgressReporter::new(&self.app.store)
            .calorie_summary(session.user_id, Utc::now().date_naive())?;
        write!(self.output, "{}", format_calories(&summary))?;
        Ok(())
    }

    fn create_routine(&mut self) -> Result<()> {
        let session = self.require_session()?;
        let name = self.ask("Routine name: ")?;

        let mut items = Vec::new();
        loop {
            let exercise = self.ask("Exercise (blank to finish): ")?;
            if exercise.is_empty() {
                break;
            }
            let sets: u32 = self.ask_parsed("Sets: ")?;
            let reps: u32 = self.ask_parsed("Reps: ")?;
            let weight_kg = self.ask_optional("Weight kg [0]: ", "weight")?.unwrap_or(0.0);
            let duration_min = self.ask_optional("Minutes [0]: ", "minutes")?.unwrap_or(0.0);
            let distance_km = self.ask_optional("Km [0]: ", "distance")?.unwrap_or(0.0);
            items.push(RoutineItem {
                exercise,
                sets,
                reps,
                weight_kg,
                duration_min,
                distance_km,
            });
        }

        let routine =
            routines::create_routine(&self.app.store, session.user_id, &name, items, Utc::now())?;
        writeln!(
            self.output,
            "✓ Created routine {} with {} exercises",
            routine.name,
            routine.items.len()
        )?;
        Ok(())
    }

    fn view_routines(&mut self) -> Result<()> {
        let session = self.require_session()?;
        let all = routines::list_routines(&self.app.store, session.user_id)?;
        if all.is_empty() {
            writeln!(self.output, "No routines yet.")?;
        }
        for routine in &all {
            writeln!(self.output, "{}", routine.name)?;
            for item in &routine.items {
                writeln!(self.output, "  {}", describe_routine_item(item))?;
            }
        }
        Ok(())
    }

    fn update_profile(&mut self) -> Result<()> {
        let session = self.require_session()?;
        let user: User = self.app.store.get(session.user_id)?;
        writeln!(self.output, "Blank keeps the current value.")?;

        let fields = ProfileArgs {
            age: self.ask_optional("Age: ", "age")?,
            sex: self.ask_optional("Sex (male/female): ", "sex")?,
            weight: self.ask_optional("Weight kg: ", "weight")?,
            height: self.ask_optional("Height cm: ", "height")?,
            goal: self.ask_optional("Goal (lose/gain/maintain): ", "goal")?,
        };
        let profile = fields.merge_over(user.profile)?;
        let user = account::update_profile(&self.app.store, session.user_id, profile)?;

        writeln!(self.output, "✓ Profile updated")?;
        if let Some(target) = account::calorie_target(&user) {
            writeln!(self.output, "  Daily calorie target: {:.0} kcal", target)?;
        }
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        let session = self.require_session()?;
        self.session = None;
        writeln!(self.output, "✓ Logged out {}", session.display_name)?;
        Ok(())
    }

    fn require_session(&self) -> Result<Session> {
        self.session
            .clone()
            .ok_or_else(|| Error::validation("log in or register first"))
    }

    /// Print a prompt and read one trimmed line; `None` at end of input
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn ask(&mut self, label: &str) -> Result<String> {
        self.prompt(label)?
            .ok_or_else(|| Error::Io(io::Error::from(io::ErrorKind::UnexpectedEof)))
    }

    fn ask_parsed<T>(&mut self, label: &str) -> Result<T>
    where
        T: FromStr,
    {
        let answer = self.ask(label)?;
        parse_field(&answer, label.trim_end_matches([':', ' ']))
    }

    /// Like `ask_parsed`, but a blank answer is `None`
    fn ask_optional<T: FromStr>(&mut self, label: &str, what: &str) -> Result<Option<T>> {
        let answer = self.ask(label)?;
        if answer.is_empty() {
            return Ok(None);
        }
        parse_field(&answer, what).map(Some)
    }
}

fn parse_field<T: FromStr>(input: &str, what: &str) -> Result<T> {
    input
        .parse()
        .map_err(|_| Error::validation(format!("invalid {}: '{}'", what, input)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn app(dir: &TempDir) -> App {
        let mut config = Config::default();
        config.data.data_dir = dir.path().to_path_buf();
        let store = Store::open(&config.database_path()).unwrap();
        App { config, store }
    }

    fn run_menu(app: &App, session: Option<Session>, script: &str) -> String {
        let mut output = Vec::new();
        Menu::new(app, session, script.as_bytes(), &mut output)
            .run()
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_register_log_and_progress() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let script = "1\nnia\nNia\n6\ndistance\n5\n\n\n3\nRun\ndistance\n3\n3\nRun\ndistance\n2.5\n7\nq\n";

        let output = run_menu(&app, None, script);
        assert!(output.contains("✓ Registered nia"));
        assert!(output.contains("[✓] distance at-least: 5.50/5 km (100%)"));
        assert!(output.ends_with("Bye!\n"));
    }

    #[test]
    fn test_errors_do_not_end_loop() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let user = account::register(&app.store, "omar", None, None, Utc::now()).unwrap();

        let script = "4\nCake\n-10\n4\nCake\nlots\n2\nnobody\n4\nApple\n95\nq\n";
        let output = run_menu(&app, Some(Session::from(&user)), script);

        assert!(output.contains("Error: Validation error"));
        assert!(output.contains("invalid Calories: 'lots'"));
        assert!(output.contains("Error: User not found: nobody"));
        assert!(output.contains("✓ Logged Apple: 95 kcal"));

        let foods: Vec<FoodEntry> = app.store.list_by_user(user.id, TimeRange::all()).unwrap();
        assert_eq!(foods.len(), 1);
    }

    #[test]
    fn test_actions_need_login() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        let output = run_menu(&app, None, "7\n");
        assert!(output.contains("Error: Validation error: log in or register first"));
        assert!(output.ends_with("Bye!\n"));
    }

    #[test]
    fn test_weight_goal_default_direction() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        let output = run_menu(&app, None, "1\nann\n\n6\nweight\n70\n\n\n\nq\n");
        assert!(output.contains("Direction (at-least/at-most) [at-least]: "));
        assert!(output.contains("✓ Goal set: weight ≥ 70 kg"));

        let session = account::login(&app.store, "ann").unwrap();
        let goals: Vec<Goal> = app.store.list_by_user(session.user_id, TimeRange::all()).unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].direction, GoalDirection::default_for(Metric::Weight));
    }

    #[test]
    fn test_create_and_view_routines() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let user = account::register(&app.store, "ria", None, None, Utc::now()).unwrap();

        let script = "11\n10\nLegs\nSquat\n5\n5\n100\n\n\nRow\n1\n1\n\n20\n5\n\n11\nq\n";
        let output = run_menu(&app, Some(Session::from(&user)), script);

        assert!(output.contains("No routines yet."));
        assert!(output.contains("✓ Created routine Legs with 2 exercises"));
        assert!(output.contains("Legs\n  Squat: 5 x 5 @ 100 kg\n  Row: 1 x 1, 20 min, 5 km\n"));
        assert_eq!(routines::list_routines(&app.store, user.id).unwrap().len(), 1);
    }

    #[test]
    fn test_update_profile_keeps_blank_fields() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let profile = Profile {
            age_years: 30.0,
            sex: Sex::Male,
            weight_kg: 70.0,
            height_cm: 175.0,
            fitness_goal: FitnessGoal::Maintain,
        };
        let user = account::register(&app.store, "sam", None, Some(profile), Utc::now()).unwrap();

        let output = run_menu(&app, Some(Session::from(&user)), "p\n\n\n72\n\n\nq\n");
        assert!(output.contains("✓ Profile updated"));
        assert!(output.contains("Daily calorie target: 1729 kcal"));

        let stored: User = app.store.get(user.id).unwrap();
        let stored = stored.profile.unwrap();
        assert_eq!(stored.weight_kg, 72.0);
        assert_eq!(stored.age_years, 30.0);
        assert_eq!(stored.fitness_goal, FitnessGoal::Maintain);
    }

    #[test]
    fn test_first_profile_needs_every_field() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let user = account::register(&app.store, "tom", None, None, Utc::now()).unwrap();

        let output = run_menu(&app, Some(Session::from(&user)), "p\n30\n\n\n\n\nq\n");
        assert!(output.contains("Error: Validation error: a profile needs"));

        let stored: User = app.store.get(user.id).unwrap();
        assert!(stored.profile.is_none());
    }

    #[test]
    fn test_logout() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let user = account::register(&app.store, "una", None, None, Utc::now()).unwrap();

        let output = run_menu(&app, Some(Session::from(&user)), "o\n7\nq\n");
        assert!(output.contains("✓ Logged out"));
        assert!(output.contains("Error: Validation error: log in or register first"));
        assert!(output.contains("\nNot logged in\n"));
    }

    #[test]
    fn test_end_of_input_mid_action() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        let output = run_menu(&app, None, "1\nzed");
        // "zed" is read, then the display name prompt hits end of input
        assert!(output.ends_with("Bye!\n"));
        assert!(account::login(&app.store, "zed").is_err());
    }
}
