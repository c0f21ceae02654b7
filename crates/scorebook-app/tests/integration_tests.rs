// Integration tests for the scorebook.
//
// These exercise the store, the legacy importer and the statistics engine
// together through the library crate's public API.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use scorebook_app::app;
use scorebook_app::config::parse_config;
use scorebook_app::db::Database;
use scorebook_app::legacy;
use scorebook_core::{
    compute_summary, personal_window, record_event, BattingEvent, ClassificationPolicy,
    EventDraft, PlateResult, Player, PolicyVersion, RunnerSituation,
};

// ===========================================================================
// Test helpers
// ===========================================================================

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn draft(number: &str, day: NaiveDate, result: PlateResult, runner: RunnerSituation) -> EventDraft {
    EventDraft {
        player_number: number.into(),
        date: day,
        result,
        has_runner: runner,
        rbi: "0".into(),
    }
}

/// Run one submission the way the POST handler does.
fn submit(db: &Database, policy: &ClassificationPolicy, d: EventDraft) -> BattingEvent {
    let players = db.list_players().unwrap();
    let prior = db.list_events().unwrap();
    db.append_event(record_event(policy, &players, &prior, d))
        .unwrap()
}

fn imported_store() -> Database {
    let db = Database::open(":memory:").unwrap();
    let inserted = app::import_legacy_if_empty(&db, &fixtures().join("legacy")).unwrap();
    assert_eq!(inserted, Some((2, 5)));
    db
}

// ===========================================================================
// Legacy import
// ===========================================================================

#[test]
fn legacy_fixture_keeps_row_with_bad_date() {
    let data = legacy::load_legacy_dir(&fixtures().join("legacy")).unwrap();
    assert_eq!(
        data.players,
        vec![Player::new("7", "林志明"), Player::new("12", "陳建宏")]
    );
    assert_eq!(data.records.len(), 5);
    assert_eq!(data.undated, 1);
    assert_eq!(data.records[3].date, "2023/09/17");
    assert_eq!(data.records[4].has_runner, RunnerSituation::None);
}

#[test]
fn legacy_import_keeps_stored_averages() {
    let db = imported_store();
    let events = db.list_events().unwrap();

    let averages: Vec<String> = events
        .iter()
        .map(|e| e.running_average.to_string())
        .collect();
    assert_eq!(averages, vec!["1.000", "0.333", "1.000", "0.500", "0.500"]);
    assert!(events.iter().all(|e| e.policy_version.is_none()));
    assert_eq!(events[1].has_runner, RunnerSituation::OnFirst);
    assert_eq!(events[3].date, None);
    assert_eq!(events[4].date, Some(date(2023, 9, 17)));
}

#[test]
fn legacy_summary_matches_hand_count() {
    let db = imported_store();
    let policy = ClassificationPolicy::default();
    let lines = compute_summary(&policy, &db.list_players().unwrap(), &db.list_events().unwrap());

    let lin = lines.iter().find(|l| l.number == "7").unwrap();
    // The walk with the unparseable date still counts.
    assert_eq!(lin.totals.plate_appearances, 4);
    assert_eq!(lin.totals.at_bats, 2);
    assert_eq!(lin.totals.hits, 1);
    assert_eq!(lin.totals.walks, 2);
    assert_eq!(lin.rates.average.to_string(), "0.500");
    assert_eq!(lin.rates.on_base_percentage.to_string(), "0.750");
    assert_eq!(lin.rates.runner_on_base_average.to_string(), "0.000");

    let chen = lines.iter().find(|l| l.number == "12").unwrap();
    assert_eq!(chen.totals.rbi, 2);
    assert_eq!(chen.rates.slugging.to_string(), "4.000");
    assert_eq!(chen.rates.scoring_position_average.to_string(), "1.000");
}

#[test]
fn second_import_is_skipped() {
    let db = imported_store();
    let again = app::import_legacy_if_empty(&db, &fixtures().join("legacy")).unwrap();
    assert_eq!(again, None);
    assert_eq!(db.event_count().unwrap(), 5);
}

// ===========================================================================
// Recording and deleting
// ===========================================================================

#[test]
fn new_records_continue_from_imported_log() {
    let db = imported_store();
    let policy = ClassificationPolicy::default();

    // Lin is 1 for 2 in valid at-bats; a double makes it 2 for 3.
    let stored = submit(
        &db,
        &policy,
        draft("7", date(2023, 9, 24), PlateResult::Double, RunnerSituation::None),
    );
    assert_eq!(stored.running_average.to_string(), "0.667");
    assert_eq!(stored.player_name, "林志明");
    assert_eq!(stored.policy_version, Some(PolicyVersion::Standard));
}

#[test]
fn delete_restores_summary_and_ids_are_not_reused() {
    let db = imported_store();
    let policy = ClassificationPolicy::default();
    let before = compute_summary(&policy, &db.list_players().unwrap(), &db.list_events().unwrap());

    let added = submit(
        &db,
        &policy,
        draft("12", date(2023, 9, 24), PlateResult::Strikeout, RunnerSituation::ScoringPosition),
    );
    assert!(db.delete_event(added.id).unwrap());
    assert!(!db.delete_event(added.id).unwrap());

    let after = compute_summary(&policy, &db.list_players().unwrap(), &db.list_events().unwrap());
    assert_eq!(before, after);

    let next = submit(
        &db,
        &policy,
        draft("12", date(2023, 9, 24), PlateResult::Walk, RunnerSituation::None),
    );
    assert!(next.id > added.id);
}

#[test]
fn unregistered_player_is_recorded_as_unknown() {
    let db = Database::open(":memory:").unwrap();
    let policy = ClassificationPolicy::default();
    let stored = submit(
        &db,
        &policy,
        draft("99", date(2024, 5, 4), PlateResult::Single, RunnerSituation::None),
    );
    assert_eq!(stored.player_name, "unknown");

    // Summary is roster-driven, so the event does not show up there.
    let lines = compute_summary(&policy, &db.list_players().unwrap(), &db.list_events().unwrap());
    assert!(lines.is_empty());
}

// ===========================================================================
// Personal window
// ===========================================================================

#[test]
fn personal_window_over_imported_log() {
    let db = imported_store();
    let policy = ClassificationPolicy::default();
    let lin = Player::new("7", "林志明");
    let events = db.list_events().unwrap();

    // Only the dated walk falls in the window; the undated one never matches.
    let window = personal_window(&policy, &lin, date(2023, 9, 17), date(2023, 9, 30), &events);
    assert_eq!(window.events.len(), 1);
    assert_eq!(window.events[0].result, PlateResult::Walk);
    assert_eq!(window.stats.totals.at_bats, 0);
    assert_eq!(window.stats.rates.on_base_percentage.to_string(), "1.000");

    let reversed = personal_window(&policy, &lin, date(2023, 9, 30), date(2023, 9, 1), &events);
    assert!(reversed.events.is_empty());
}

// ===========================================================================
// Configuration
// ===========================================================================

#[test]
fn shipped_defaults_are_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("defaults/scorebook.toml");
    let text = std::fs::read_to_string(&path).expect("defaults/scorebook.toml should exist");
    let config = parse_config(&text, &path).unwrap();

    assert_eq!(config.server.port, 8081);
    assert_eq!(config.db_path, "softball.db");
    assert_eq!(config.policy.version, PolicyVersion::Standard);
    assert!(config.import.legacy_csv_dir.is_none());
    assert_eq!(config.classification_policy(), ClassificationPolicy::default());
}

#[test]
fn policy_choice_leaves_stored_history_untouched() {
    let db = imported_store();
    let events = db.list_events().unwrap();
    let players = db.list_players().unwrap();

    let walk_only = ClassificationPolicy::for_version(PolicyVersion::WalkOnly);
    let standard = ClassificationPolicy::default();
    let a = compute_summary(&walk_only, &players, &events);
    let b = compute_summary(&standard, &players, &events);

    // No sacrifice flies in the fixture, so both policies agree here.
    assert_eq!(a[0].totals, b[0].totals);
    assert_eq!(db.list_events().unwrap(), events);
}
