//! Integration tests for the fittrack binary.
//!
//! These tests verify end-to-end behavior including:
//! - Registration and logging
//! - Goal progress and day-by-day series
//! - JSON and CSV output
//! - Error reporting

use assert_cmd::Command;
use chrono::Utc;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

/// A data directory and a config path that does not exist, so the user's
/// own config never leaks into a test
struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    fn cli(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fittrack"));
        cmd.arg("--data-dir")
            .arg(self.dir.path())
            .arg("--config")
            .arg(self.dir.path().join("missing.toml"));
        cmd
    }

    /// Run as an existing user
    fn as_user(&self, username: &str) -> Command {
        let mut cmd = self.cli();
        cmd.arg("--user").arg(username);
        cmd
    }

    fn register(&self, username: &str) {
        self.cli().args(["register", username]).assert().success();
    }

    fn json(&self, username: &str, args: &[&str]) -> Value {
        let output = self.as_user(username).args(args).output().unwrap();
        assert!(output.status.success(), "command failed: {:?}", output);
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
    }
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("fittrack"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Personal fitness tracker"));
}

#[test]
fn test_register_creates_database() {
    let env = TestEnv::new();
    env.cli()
        .args(["register", "ana", "--name", "Ana"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered ana"));

    assert!(env.dir.path().join("fittrack.db").exists());
}

#[test]
fn test_duplicate_username_rejected() {
    let env = TestEnv::new();
    env.register("ana");

    env.cli()
        .args(["register", "ANA"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already registered"));
}

#[test]
fn test_register_with_profile_prints_target() {
    let env = TestEnv::new();
    env.cli()
        .args([
            "register", "ben", "--age", "30", "--sex", "male", "--weight", "70", "--height",
            "175", "--goal", "maintain",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Daily calorie target: 1702 kcal"));
}

#[test]
fn test_partial_profile_rejected() {
    let env = TestEnv::new();
    env.cli()
        .args(["register", "ben", "--age", "30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("a profile needs"));
}

#[test]
fn test_unknown_user() {
    let env = TestEnv::new();
    env.as_user("ghost")
        .args(["log", "food", "Apple", "--calories", "95"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("User not found: ghost"));
}

#[test]
fn test_command_without_user() {
    let env = TestEnv::new();
    env.cli()
        .args(["progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--user"));
}

#[test]
fn test_distance_goal_reached() {
    let env = TestEnv::new();
    env.register("cleo");

    env.as_user("cleo")
        .args(["goal", "add", "--kind", "distance", "--target", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("distance ≥ 5 km"));

    for km in ["3.0", "2.5"] {
        env.as_user("cleo")
            .args(["log", "exercise", "Run", "--metric", "distance", "--value", km])
            .assert()
            .success();
    }

    let progress = env.json("cleo", &["progress", "--json"]);
    let goal = &progress[0];
    assert_eq!(goal["accumulated"], 5.5);
    assert_eq!(goal["percentage"], 100.0);
    assert_eq!(goal["completed"], true);

    env.as_user("cleo")
        .arg("progress")
        .assert()
        .success()
        .stdout(predicate::str::contains("[✓] distance at-least: 5.50/5 km (100%)"));
}

#[test]
fn test_empty_reps_goal() {
    let env = TestEnv::new();
    env.register("dev");
    env.as_user("dev")
        .args(["goal", "add", "--kind", "reps", "--target", "10"])
        .assert()
        .success();

    let progress = env.json("dev", &["progress", "--json"]);
    assert_eq!(progress[0]["accumulated"], 0.0);
    assert_eq!(progress[0]["percentage"], 0.0);
    assert_eq!(progress[0]["completed"], false);
}

#[test]
fn test_negative_value_rejected() {
    let env = TestEnv::new();
    env.register("eli");

    env.as_user("eli")
        .args(["log", "exercise", "Run", "--metric", "distance", "--value", "-3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation error"));

    let today = Utc::now().date_naive().to_string();
    let series = env.json(
        "eli",
        &["series", "--metric", "distance", "--from", &today, "--to", &today, "--json"],
    );
    assert_eq!(series[0]["value"], 0.0);
}

#[test]
fn test_weight_loss_goal() {
    let env = TestEnv::new();
    env.register("fay");

    env.as_user("fay")
        .args(["goal", "add", "--kind", "reps", "--target", "10", "--direction", "at-most"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at-least"));

    env.as_user("fay")
        .args(["goal", "add", "--kind", "weight", "--target", "70", "--direction", "at-most"])
        .assert()
        .success();
    env.as_user("fay")
        .args(["log", "exercise", "Scale", "--metric", "weight", "--value", "69.5"])
        .assert()
        .success();

    let progress = env.json("fay", &["progress", "--json"]);
    assert_eq!(progress[0]["direction"], "at_most");
    assert_eq!(progress[0]["completed"], true);
}

#[test]
fn test_goal_list_and_delete() {
    let env = TestEnv::new();
    env.register("gus");
    env.as_user("gus")
        .args(["goal", "add", "--kind", "time", "--target", "120", "--by", "2030-01-01"])
        .assert()
        .success();

    let goals = env.json("gus", &["goal", "list", "--json"]);
    let id = goals[0]["id"].as_str().unwrap().to_string();
    assert_eq!(goals[0]["target_date"], "2030-01-01");

    env.as_user("gus")
        .args(["goal", "delete", &id])
        .assert()
        .success();
    env.as_user("gus")
        .args(["goal", "delete", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Goal not found"));

    let goals = env.json("gus", &["goal", "list", "--json"]);
    assert_eq!(goals.as_array().unwrap().len(), 0);
}

#[test]
fn test_goal_of_other_user_cannot_be_deleted() {
    let env = TestEnv::new();
    env.register("hal");
    env.register("ivy");
    env.as_user("hal")
        .args(["goal", "add", "--kind", "reps", "--target", "50"])
        .assert()
        .success();

    let goals = env.json("hal", &["goal", "list", "--json"]);
    let id = goals[0]["id"].as_str().unwrap().to_string();

    env.as_user("ivy")
        .args(["goal", "delete", &id])
        .assert()
        .failure();
    assert_eq!(env.json("hal", &["goal", "list", "--json"]).as_array().unwrap().len(), 1);
}

#[test]
fn test_series_one_point_per_day() {
    let env = TestEnv::new();
    env.register("jon");

    env.as_user("jon")
        .args(["log", "exercise", "Squat", "--metric", "reps", "--value", "20"])
        .args(["--at", "2024-03-09T12:00:00Z"])
        .assert()
        .success();
    env.as_user("jon")
        .args(["log", "exercise", "Squat", "--metric", "reps", "--value", "15"])
        .args(["--at", "2024-03-10T08:00:00Z"])
        .assert()
        .success();

    let series = env.json(
        "jon",
        &["series", "--metric", "reps", "--to", "2024-03-10", "--days", "7", "--json"],
    );
    let points = series.as_array().unwrap();
    assert_eq!(points.len(), 7);
    assert_eq!(points[0]["date"], "2024-03-04");
    assert_eq!(points[5]["value"], 20.0);
    assert_eq!(points[6]["value"], 15.0);
    assert_eq!(points[6]["date"], "2024-03-10");

    let dates: Vec<&str> = points.iter().map(|p| p["date"].as_str().unwrap()).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
}

#[test]
fn test_series_chart() {
    let env = TestEnv::new();
    env.register("kai");
    env.as_user("kai")
        .args(["log", "food", "Pasta", "--calories", "800"])
        .assert()
        .success();

    env.as_user("kai")
        .args(["series", "--metric", "calories", "--days", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("calories (kcal)"))
        .stdout(predicate::str::contains("3 days, total 800 kcal"));
}

#[test]
fn test_series_csv_export() {
    let env = TestEnv::new();
    env.register("lea");
    env.as_user("lea")
        .args(["log", "exercise", "Bike", "--metric", "time", "--value", "45"])
        .assert()
        .success();

    let csv_path = env.dir.path().join("export").join("time.csv");
    env.as_user("lea")
        .args(["series", "--metric", "time", "--days", "2", "--csv"])
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 days"));

    let content = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "date,value");
    assert!(lines[2].ends_with(",45.0"));
}

#[test]
fn test_series_invalid_range() {
    let env = TestEnv::new();
    env.register("max");
    env.as_user("max")
        .args(["series", "--metric", "reps", "--from", "2024-05-10", "--to", "2024-05-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("starts after it ends"));

    env.as_user("max")
        .args(["series", "--metric", "steps", "--days", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown series metric"));
}

#[test]
fn test_workouts_and_calorie_summary() {
    let env = TestEnv::new();
    env.register("neo");

    env.as_user("neo")
        .args(["log", "food", "Burrito", "--calories", "900"])
        .assert()
        .success();
    env.as_user("neo")
        .args(["log", "workout", "--activity", "running", "--intensity", "moderate", "--minutes", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("330 kcal burned"));
    env.as_user("neo")
        .args(["log", "workout", "--weightlifting", "light", "--minutes", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("80 kcal burned"));

    let summary = env.json("neo", &["calories", "--json"]);
    assert_eq!(summary["consumed"], 900.0);
    assert_eq!(summary["burned"], 410.0);
    assert_eq!(summary["net"], 490.0);
    assert_eq!(summary["target"], Value::Null);
}

#[test]
fn test_workout_needs_a_source() {
    let env = TestEnv::new();
    env.register("ora");
    env.as_user("ora")
        .args(["log", "workout", "--minutes", "30"])
        .assert()
        .failure();

    env.as_user("ora")
        .args(["log", "workout", "--activity", "Curling", "--intensity", "light", "--minutes", "30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Activity not found: Curling"));
}

#[test]
fn test_custom_activity() {
    let env = TestEnv::new();
    env.register("pia");

    env.as_user("pia")
        .args(["activity", "add", "Rowing", "--light", "6", "--moderate", "9", "--intense", "12"])
        .assert()
        .success();
    env.as_user("pia")
        .args(["activity", "add", "rowing", "--light", "1", "--moderate", "2", "--intense", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate"));

    let activities = env.json("pia", &["activity", "list", "--json"]);
    let names: Vec<&str> = activities
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Running", "Swimming", "Padel", "Climbing", "Rowing"]);

    env.as_user("pia")
        .args(["log", "workout", "--activity", "Rowing", "--intensity", "intense", "--minutes", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("120 kcal burned"));
}

#[test]
fn test_configured_activity() {
    let env = TestEnv::new();
    let config_path = env.dir.path().join("config.toml");
    fs::write(
        &config_path,
        "[[activities.custom]]\nname = \"Yoga\"\nlight = 2.0\nmoderate = 3.0\nintense = 4.0\n",
    )
    .unwrap();
    env.register("quinn");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fittrack"));
    cmd.arg("--data-dir")
        .arg(env.dir.path())
        .arg("--config")
        .arg(&config_path)
        .args(["--user", "quinn", "log", "workout", "--activity", "yoga", "--intensity", "2", "--minutes", "60"])
        .assert()
        .success()
        .stdout(predicate::str::contains("180 kcal burned"));
}

#[test]
fn test_invalid_config_rejected() {
    let env = TestEnv::new();
    let config_path = env.dir.path().join("config.toml");
    fs::write(&config_path, "[reporting]\nchart_width = 2\n").unwrap();

    Command::new(assert_cmd::cargo::cargo_bin!("fittrack"))
        .arg("--data-dir")
        .arg(env.dir.path())
        .arg("--config")
        .arg(&config_path)
        .args(["register", "rae"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("chart_width"));
}

#[test]
fn test_routines() {
    let env = TestEnv::new();
    env.register("sam");

    env.as_user("sam")
        .args(["routine", "add", "Legs", "--item", "Squat:5:5:100", "--item", "Lunge:3:12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 exercises"));
    env.as_user("sam")
        .args(["routine", "add", "Legs", "--item", "Squat:1:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate"));

    env.as_user("sam")
        .args(["routine", "show", "legs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Squat: 5 x 5 @ 100 kg"));

    env.as_user("sam")
        .args(["routine", "delete", "Legs"])
        .assert()
        .success();
    env.as_user("sam")
        .args(["routine", "show", "Legs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Routine not found"));
}

#[test]
fn test_profile_set_and_show() {
    let env = TestEnv::new();
    env.register("tia");

    env.as_user("tia")
        .args(["profile", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No profile set"));

    env.as_user("tia")
        .args([
            "profile", "set", "--age", "30", "--sex", "male", "--weight", "70", "--height",
            "175", "--goal", "lose",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Daily calorie target: 1402 kcal"));

    let summary = env.json("tia", &["calories", "--json"]);
    let target = summary["target"].as_f64().unwrap();
    assert!((target - 1401.845).abs() < 0.001);
}

#[test]
fn test_profile_set_single_field() {
    let env = TestEnv::new();
    env.cli()
        .args([
            "register", "ugo", "--age", "30", "--sex", "male", "--weight", "70", "--height",
            "175", "--goal", "maintain",
        ])
        .assert()
        .success();

    env.as_user("ugo")
        .args(["profile", "set", "--weight", "72"])
        .assert()
        .success()
        .stdout(predicate::str::contains("30 years, male, 72 kg, 175 cm, goal: maintain"))
        .stdout(predicate::str::contains("Daily calorie target: 1729 kcal"));
}

#[test]
fn test_profile_set_single_field_needs_stored_profile() {
    let env = TestEnv::new();
    env.register("vic");

    env.as_user("vic")
        .args(["profile", "set", "--weight", "72"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("a profile needs"));
}

#[test]
fn test_menu_session() {
    let env = TestEnv::new();
    env.cli()
        .arg("menu")
        .write_stdin("1\numa\nUma\n4\nSalad\n-5\n4\nSalad\n250\n9\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Registered uma"))
        .stdout(predicate::str::contains("Error: Validation error"))
        .stdout(predicate::str::contains("Consumed: 250 kcal"))
        .stdout(predicate::str::contains("Bye!"));
}

#[test]
fn test_menu_is_default() {
    let env = TestEnv::new();
    env.cli()
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Log exercise"));
}

#[test]
fn test_data_persists_across_runs() {
    let env = TestEnv::new();
    env.register("val");
    for value in ["10", "20", "30"] {
        env.as_user("val")
            .args(["log", "exercise", "Push-up", "--metric", "reps", "--value", value])
            .assert()
            .success();
    }

    let series = env.json("val", &["series", "--metric", "reps", "--days", "1", "--json"]);
    assert_eq!(series[0]["value"], 60.0);
}
