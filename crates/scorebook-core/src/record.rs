// Insertion-time running average.
//
// When an event is recorded, the player's cumulative average including that
// event is computed once and frozen on the event. It is never recomputed,
// even if earlier events are deleted or the policy changes later.

use tracing::debug;

use crate::event::{player_name_for, BattingEvent, EventDraft, PendingEvent, Player};
use crate::outcome::PlateResult;
use crate::policy::ClassificationPolicy;
use crate::rate::Rate;

/// Cumulative average for `player_number` after adding `result` to the
/// player's prior events.
///
/// Only hits and valid at-bats matter here; a zero denominator (e.g. a walk
/// as the first plate appearance) yields exactly 0.000.
pub fn running_average(
    policy: &ClassificationPolicy,
    prior_events: &[BattingEvent],
    player_number: &str,
    result: &PlateResult,
) -> Rate {
    let (mut hits, mut at_bats) = prior_events
        .iter()
        .filter(|e| e.player_number == player_number)
        .fold((0u32, 0u32), |(h, ab), e| {
            (
                h + u32::from(policy.is_hit(&e.result)),
                ab + u32::from(policy.counts_as_valid_at_bat(&e.result)),
            )
        });

    hits += u32::from(policy.is_hit(result));
    at_bats += u32::from(policy.counts_as_valid_at_bat(result));

    Rate::ratio(hits, at_bats)
}

/// Build the event to append: resolve the display name from the roster and
/// compute the running-average snapshot under `policy`.
pub fn record_event(
    policy: &ClassificationPolicy,
    players: &[Player],
    prior_events: &[BattingEvent],
    draft: EventDraft,
) -> PendingEvent {
    let running_average =
        running_average(policy, prior_events, &draft.player_number, &draft.result);
    let player_name = player_name_for(players, &draft.player_number).to_string();

    debug!(
        player = %draft.player_number,
        result = %draft.result,
        average = %running_average,
        "recorded plate appearance"
    );

    PendingEvent {
        player_number: draft.player_number,
        player_name,
        date: draft.date,
        running_average,
        result: draft.result,
        has_runner: draft.has_runner,
        rbi: draft.rbi,
        policy_version: policy.version(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventId, UNKNOWN_PLAYER_NAME};
    use crate::outcome::RunnerSituation;
    use crate::policy::PolicyVersion;
    use chrono::NaiveDate;

    fn draft(number: &str, result: PlateResult) -> EventDraft {
        EventDraft {
            player_number: number.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            result,
            has_runner: RunnerSituation::None,
            rbi: "0".to_string(),
        }
    }

    /// Append drafts one by one the way the store does, assigning ids.
    fn replay(policy: &ClassificationPolicy, players: &[Player], drafts: Vec<EventDraft>) -> Vec<BattingEvent> {
        let mut log = Vec::new();
        for (i, d) in drafts.into_iter().enumerate() {
            let pending = record_event(policy, players, &log, d);
            log.push(pending.into_event(EventId(i as i64 + 1)));
        }
        log
    }

    #[test]
    fn first_walk_is_zero_not_an_error() {
        let policy = ClassificationPolicy::default();
        let avg = running_average(&policy, &[], "7", &PlateResult::Walk);
        assert_eq!(avg.to_string(), "0.000");
    }

    #[test]
    fn accumulates_only_the_players_own_events() {
        let policy = ClassificationPolicy::default();
        let players = vec![Player::new("7", "Lin"), Player::new("12", "Chen")];
        let log = replay(
            &policy,
            &players,
            vec![
                draft("7", PlateResult::Single),
                draft("12", PlateResult::Strikeout),
                draft("7", PlateResult::Strikeout),
                draft("7", PlateResult::Walk),
                draft("7", PlateResult::Double),
            ],
        );
        let averages: Vec<String> = log.iter().map(|e| e.running_average.to_string()).collect();
        assert_eq!(averages, vec!["1.000", "0.000", "0.500", "0.500", "0.667"]);
    }

    #[test]
    fn snapshot_is_reproducible_from_history() {
        let policy = ClassificationPolicy::for_version(PolicyVersion::WalkOnly);
        let players = vec![Player::new("7", "Lin")];
        let log = replay(
            &policy,
            &players,
            vec![
                draft("7", PlateResult::HomeRun),
                draft("7", PlateResult::SacrificeFly),
                draft("7", PlateResult::FlyOut),
                draft("7", PlateResult::Single),
            ],
        );
        for (i, event) in log.iter().enumerate() {
            let recomputed = running_average(&policy, &log[..i], &event.player_number, &event.result);
            assert_eq!(recomputed, event.running_average);
        }
    }

    #[test]
    fn snapshot_stays_frozen_after_earlier_deletion() {
        let policy = ClassificationPolicy::default();
        let players = vec![Player::new("7", "Lin")];
        let mut log = replay(
            &policy,
            &players,
            vec![draft("7", PlateResult::Single), draft("7", PlateResult::Strikeout)],
        );
        log.remove(0);
        assert_eq!(log[0].running_average.to_string(), "0.500");
    }

    #[test]
    fn unknown_player_gets_sentinel_name() {
        let policy = ClassificationPolicy::default();
        let pending = record_event(&policy, &[], &[], draft("42", PlateResult::Single));
        assert_eq!(pending.player_name, UNKNOWN_PLAYER_NAME);
        assert_eq!(pending.running_average.to_string(), "1.000");
        assert_eq!(pending.policy_version, PolicyVersion::Standard);
    }
}
