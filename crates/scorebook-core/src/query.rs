// Read paths over the event log: the batting log and the per-player window.

use chrono::NaiveDate;
use serde::Serialize;

use crate::event::{BattingEvent, Player};
use crate::policy::ClassificationPolicy;
use crate::stats::{stat_line_for, PlayerStatLine};

/// Events in reverse insertion order (most recently recorded first), each
/// carrying its stored running average untouched.
pub fn batting_log(events: &[BattingEvent]) -> Vec<&BattingEvent> {
    events.iter().rev().collect()
}

/// A player's events dated within `start..=end`, newest game first.
///
/// Events on the same date keep their insertion order. Undated events never
/// match. An inverted range returns nothing.
pub fn query_personal(
    player_number: &str,
    start: NaiveDate,
    end: NaiveDate,
    events: &[BattingEvent],
) -> Vec<BattingEvent> {
    if start > end {
        return Vec::new();
    }
    let mut matched: Vec<BattingEvent> = events
        .iter()
        .filter(|e| {
            e.player_number == player_number
                && e.date.is_some_and(|d| (start..=end).contains(&d))
        })
        .cloned()
        .collect();
    // sort_by is stable
    matched.sort_by(|a, b| b.date.cmp(&a.date));
    matched
}

/// Events in a date window together with the stat line over just that window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonalWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub events: Vec<BattingEvent>,
    pub stats: PlayerStatLine,
}

pub fn personal_window(
    policy: &ClassificationPolicy,
    player: &Player,
    start: NaiveDate,
    end: NaiveDate,
    events: &[BattingEvent],
) -> PersonalWindow {
    let events = query_personal(&player.number, start, end, events);
    let stats = stat_line_for(policy, player, &events);
    PersonalWindow {
        start,
        end,
        events,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventId;
    use crate::outcome::{PlateResult, RunnerSituation};
    use crate::rate::Rate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn ev(id: i64, number: &str, day: u32, result: PlateResult) -> BattingEvent {
        BattingEvent {
            id: EventId(id),
            player_number: number.to_string(),
            player_name: "Lin".to_string(),
            date: Some(date(day)),
            running_average: Rate::from_thousandths(id as u32 * 100),
            result,
            has_runner: RunnerSituation::None,
            rbi: "0".to_string(),
            policy_version: None,
        }
    }

    fn five_games() -> Vec<BattingEvent> {
        vec![
            ev(1, "7", 1, PlateResult::Single),
            ev(2, "7", 8, PlateResult::Strikeout),
            ev(3, "12", 9, PlateResult::Double),
            ev(4, "7", 15, PlateResult::Walk),
            ev(5, "7", 3, PlateResult::HomeRun),
            ev(6, "7", 22, PlateResult::FlyOut),
        ]
    }

    #[test]
    fn window_returns_matching_events_newest_first() {
        let events = five_games();
        let found = query_personal("7", date(2), date(10), &events);
        let ids: Vec<i64> = found.iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![2, 5]);
    }

    #[test]
    fn range_is_inclusive_on_both_ends() {
        let events = five_games();
        let found = query_personal("7", date(1), date(22), &events);
        let ids: Vec<i64> = found.iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![6, 4, 2, 5, 1]);
    }

    #[test]
    fn same_day_events_keep_insertion_order() {
        let events = vec![
            ev(1, "7", 4, PlateResult::Single),
            ev(2, "7", 4, PlateResult::Walk),
            ev(3, "7", 5, PlateResult::Double),
            ev(4, "7", 4, PlateResult::Strikeout),
        ];
        let ids: Vec<i64> = query_personal("7", date(1), date(31), &events)
            .iter()
            .map(|e| e.id.0)
            .collect();
        assert_eq!(ids, vec![3, 1, 2, 4]);
    }

    #[test]
    fn inverted_range_is_empty() {
        assert!(query_personal("7", date(20), date(1), &five_games()).is_empty());
    }

    #[test]
    fn window_stats_cover_only_the_window() {
        let policy = ClassificationPolicy::default();
        let player = Player::new("7", "Lin");
        let window = personal_window(&policy, &player, date(2), date(10), &five_games());
        assert_eq!(window.events.len(), 2);
        assert_eq!(window.stats.totals.hits, 1);
        assert_eq!(window.stats.totals.at_bats, 2);
        assert_eq!(window.stats.rates.average.to_string(), "0.500");
    }

    #[test]
    fn undated_events_count_in_totals_but_not_in_windows() {
        let mut events = five_games();
        let mut undated = ev(7, "7", 1, PlateResult::HomeRun);
        undated.date = None;
        events.push(undated);

        let found = query_personal("7", date(1), date(31), &events);
        assert!(found.iter().all(|e| e.id.0 != 7));
        assert_eq!(found.len(), 5);

        let policy = ClassificationPolicy::default();
        let line = stat_line_for(&policy, &Player::new("7", "Lin"), &events);
        assert_eq!(line.totals.hits, 3);
        assert_eq!(line.totals.at_bats, 5);

        // The next recorded single sees the undated home run as prior history.
        let avg = crate::record::running_average(&policy, &events, "7", &PlateResult::Single);
        assert_eq!(avg.to_string(), "0.667");
    }

    #[test]
    fn batting_log_is_reverse_insertion_with_stored_snapshots() {
        let events = five_games();
        let log = batting_log(&events);
        assert_eq!(log.first().map(|e| e.id.0), Some(6));
        assert_eq!(log.last().map(|e| e.id.0), Some(1));
        assert_eq!(log[0].running_average.to_string(), "0.600");
    }
}
