// Aggregate batting statistics per player.
//
// Counting totals are folded from the full event log under the active
// classification policy and converted to rates on every call. Nothing here
// is cached: the summary always reflects the current rules applied to the
// current log.

use serde::Serialize;
use tracing::{debug, trace};

use crate::event::{BattingEvent, Player};
use crate::outcome::{PlateResult, RunnerSituation};
use crate::policy::{ClassificationPolicy, ObpDenominator};
use crate::rate::Rate;

// ---------------------------------------------------------------------------
// Counting totals
// ---------------------------------------------------------------------------

/// Counting totals for a sequence of plate appearances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Tally {
    pub plate_appearances: u32,
    pub at_bats: u32,
    /// Denominator for average and slugging.
    pub valid_at_bats: u32,
    pub hits: u32,
    pub walks: u32,
    pub times_on_base: u32,
    pub total_bases: u32,
    pub rbi: u32,
    pub runner_on_base_at_bats: u32,
    pub runner_on_base_hits: u32,
    pub scoring_position_at_bats: u32,
    pub scoring_position_hits: u32,
}

impl Tally {
    /// Fold one plate appearance into the totals.
    pub fn add(
        &mut self,
        policy: &ClassificationPolicy,
        result: &PlateResult,
        runner: &RunnerSituation,
        rbi: u32,
    ) {
        if result.is_unrecognized() {
            trace!(result = %result, "unrecognized result, no hit or on-base credit");
        }
        let c = policy.classify(result, runner);

        self.plate_appearances += 1;
        self.rbi = self.rbi.saturating_add(rbi);
        if c.is_at_bat {
            self.at_bats += 1;
        }
        if c.is_valid_at_bat {
            self.valid_at_bats += 1;
        }
        if c.is_hit {
            self.hits += 1;
        }
        if c.is_walk {
            self.walks += 1;
        }
        if c.is_on_base {
            self.times_on_base += 1;
        }
        self.total_bases += c.total_bases;

        // Situational averages use the same denominator as the average.
        if c.runner_on_base && c.is_valid_at_bat {
            self.runner_on_base_at_bats += 1;
            if c.is_hit {
                self.runner_on_base_hits += 1;
            }
        }
        if c.scoring_position && c.is_valid_at_bat {
            self.scoring_position_at_bats += 1;
            if c.is_hit {
                self.scoring_position_hits += 1;
            }
        }
    }

    pub fn add_event(&mut self, policy: &ClassificationPolicy, event: &BattingEvent) {
        self.add(policy, &event.result, &event.has_runner, event.rbi_count());
    }

    /// Fold a sequence of events.
    pub fn from_events<'a, I>(policy: &ClassificationPolicy, events: I) -> Self
    where
        I: IntoIterator<Item = &'a BattingEvent>,
    {
        let mut tally = Tally::default();
        for event in events {
            tally.add_event(policy, event);
        }
        tally
    }

    pub fn average(&self) -> Rate {
        Rate::ratio(self.hits, self.valid_at_bats)
    }

    pub fn on_base_percentage(&self, denominator: ObpDenominator) -> Rate {
        let den = match denominator {
            ObpDenominator::AtBatsPlusWalks => self.at_bats + self.walks,
            ObpDenominator::AtBats => self.at_bats,
        };
        Rate::ratio(self.times_on_base, den)
    }

    pub fn slugging(&self) -> Rate {
        Rate::ratio(self.total_bases, self.valid_at_bats)
    }

    pub fn runner_on_base_average(&self) -> Rate {
        Rate::ratio(self.runner_on_base_hits, self.runner_on_base_at_bats)
    }

    pub fn scoring_position_average(&self) -> Rate {
        Rate::ratio(self.scoring_position_hits, self.scoring_position_at_bats)
    }
}

// ---------------------------------------------------------------------------
// Stat lines
// ---------------------------------------------------------------------------

/// Derived rates for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Rates {
    pub average: Rate,
    pub on_base_percentage: Rate,
    pub slugging: Rate,
    pub runner_on_base_average: Rate,
    pub scoring_position_average: Rate,
}

impl Rates {
    pub fn from_tally(tally: &Tally, policy: &ClassificationPolicy) -> Self {
        Rates {
            average: tally.average(),
            on_base_percentage: tally.on_base_percentage(policy.obp_denominator()),
            slugging: tally.slugging(),
            runner_on_base_average: tally.runner_on_base_average(),
            scoring_position_average: tally.scoring_position_average(),
        }
    }
}

/// One row of the summary view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerStatLine {
    pub number: String,
    pub name: String,
    #[serde(flatten)]
    pub totals: Tally,
    #[serde(flatten)]
    pub rates: Rates,
}

/// Compute one stat line from any subset of events. Events for other
/// players are ignored.
pub fn stat_line_for(
    policy: &ClassificationPolicy,
    player: &Player,
    events: &[BattingEvent],
) -> PlayerStatLine {
    let totals = Tally::from_events(
        policy,
        events.iter().filter(|e| e.player_number == player.number),
    );
    PlayerStatLine {
        number: player.number.clone(),
        name: player.name.clone(),
        rates: Rates::from_tally(&totals, policy),
        totals,
    }
}

/// One stat line per roster player, in roster order, including players with
/// no events.
pub fn compute_summary(
    policy: &ClassificationPolicy,
    players: &[Player],
    events: &[BattingEvent],
) -> Vec<PlayerStatLine> {
    debug!(
        policy = %policy.version(),
        players = players.len(),
        events = events.len(),
        "computing summary"
    );
    players
        .iter()
        .map(|player| stat_line_for(policy, player, events))
        .collect()
}
