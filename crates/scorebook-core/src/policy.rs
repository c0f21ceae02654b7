// Classification policy: which results count as at-bats, hits and on-base.
//
// The scorebook changed these rules over its lifetime without migrating
// historical data. Each rule set is kept as a named version so a deployment
// selects one explicitly, and the open parameters (OBP denominator, sacrifice
// fly and fielder's choice at-bat status) can be overridden on top.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outcome::{PlateResult, RunnerSituation};

// ---------------------------------------------------------------------------
// Versions and parameters
// ---------------------------------------------------------------------------

/// A named classification rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyVersion {
    /// Only walks are excluded from at-bats.
    WalkOnly,
    /// Walks and sacrifice flies are excluded from at-bats.
    #[default]
    Standard,
    /// At-bats as in `Standard`; the average denominator is an explicit
    /// allow-list of results.
    AllowList,
}

impl PolicyVersion {
    pub const ALL: [PolicyVersion; 3] = [
        PolicyVersion::WalkOnly,
        PolicyVersion::Standard,
        PolicyVersion::AllowList,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyVersion::WalkOnly => "walk-only",
            PolicyVersion::Standard => "standard",
            PolicyVersion::AllowList => "allow-list",
        }
    }
}

impl fmt::Display for PolicyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("unknown policy version `{0}` (expected walk-only, standard or allow-list)")]
    UnknownVersion(String),
}

impl FromStr for PolicyVersion {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        PolicyVersion::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| PolicyError::UnknownVersion(s.to_string()))
    }
}

/// Denominator used for on-base percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObpDenominator {
    /// at-bats + walks
    #[default]
    AtBatsPlusWalks,
    /// at-bats only
    AtBats,
}

/// How the batting-average denominator ("valid at-bats") is decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidAtBatRule {
    /// Valid at-bats are exactly the at-bats.
    SameAsAtBats,
    /// Only the listed results are valid at-bats.
    AllowList(BTreeSet<PlateResult>),
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Everything the engine needs to know about one plate appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub is_hit: bool,
    pub is_at_bat: bool,
    pub is_valid_at_bat: bool,
    pub is_walk: bool,
    pub is_on_base: bool,
    pub total_bases: u32,
    pub runner_on_base: bool,
    pub scoring_position: bool,
}

/// A complete, swappable set of classification rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationPolicy {
    version: PolicyVersion,
    at_bat_exclusions: BTreeSet<PlateResult>,
    valid_at_bats: ValidAtBatRule,
    on_base_extra: BTreeSet<PlateResult>,
    obp_denominator: ObpDenominator,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        ClassificationPolicy::for_version(PolicyVersion::Standard)
    }
}

impl ClassificationPolicy {
    /// Build the rule set for a named version with its default parameters.
    pub fn for_version(version: PolicyVersion) -> Self {
        let at_bat_exclusions: BTreeSet<PlateResult> = match version {
            PolicyVersion::WalkOnly => [PlateResult::Walk].into(),
            PolicyVersion::Standard | PolicyVersion::AllowList => {
                [PlateResult::Walk, PlateResult::SacrificeFly].into()
            }
        };

        let valid_at_bats = match version {
            PolicyVersion::WalkOnly | PolicyVersion::Standard => ValidAtBatRule::SameAsAtBats,
            PolicyVersion::AllowList => ValidAtBatRule::AllowList(
                [
                    PlateResult::Single,
                    PlateResult::Double,
                    PlateResult::Triple,
                    PlateResult::HomeRun,
                    PlateResult::Strikeout,
                    PlateResult::FlyOut,
                    PlateResult::GroundOut,
                    PlateResult::InfieldOut,
                    PlateResult::FieldersChoice,
                    PlateResult::ReachedOnError,
                ]
                .into(),
            ),
        };

        ClassificationPolicy {
            version,
            at_bat_exclusions,
            valid_at_bats,
            on_base_extra: [
                PlateResult::Walk,
                PlateResult::FieldersChoice,
                PlateResult::ReachedOnError,
            ]
            .into(),
            obp_denominator: ObpDenominator::AtBatsPlusWalks,
        }
    }

    pub fn with_obp_denominator(mut self, denominator: ObpDenominator) -> Self {
        self.obp_denominator = denominator;
        self
    }

    /// Decide whether sacrifice flies count as at-bats.
    pub fn with_sacrifice_fly_at_bat(self, counts: bool) -> Self {
        self.with_at_bat_status(PlateResult::SacrificeFly, counts)
    }

    /// Decide whether fielder's choices count as at-bats.
    pub fn with_fielders_choice_at_bat(self, counts: bool) -> Self {
        self.with_at_bat_status(PlateResult::FieldersChoice, counts)
    }

    fn with_at_bat_status(mut self, result: PlateResult, counts: bool) -> Self {
        if counts {
            self.at_bat_exclusions.remove(&result);
            if let ValidAtBatRule::AllowList(list) = &mut self.valid_at_bats {
                list.insert(result);
            }
        } else {
            self.at_bat_exclusions.insert(result.clone());
            if let ValidAtBatRule::AllowList(list) = &mut self.valid_at_bats {
                list.remove(&result);
            }
        }
        self
    }

    pub fn version(&self) -> PolicyVersion {
        self.version
    }

    pub fn obp_denominator(&self) -> ObpDenominator {
        self.obp_denominator
    }

    pub fn is_hit(&self, result: &PlateResult) -> bool {
        result.is_hit()
    }

    /// True unless the result is in the at-bat exclusion set. Unknown results
    /// are not excluded.
    pub fn counts_as_at_bat(&self, result: &PlateResult) -> bool {
        !self.at_bat_exclusions.contains(result)
    }

    /// The batting-average and slugging denominator.
    pub fn counts_as_valid_at_bat(&self, result: &PlateResult) -> bool {
        match &self.valid_at_bats {
            ValidAtBatRule::SameAsAtBats => self.counts_as_at_bat(result),
            ValidAtBatRule::AllowList(list) => list.contains(result),
        }
    }

    pub fn counts_as_on_base(&self, result: &PlateResult) -> bool {
        result.is_hit() || self.on_base_extra.contains(result)
    }

    pub fn total_bases_for(&self, result: &PlateResult) -> u32 {
        result.total_bases()
    }

    pub fn is_runner_on_any_base(&self, tag: &RunnerSituation) -> bool {
        matches!(
            tag,
            RunnerSituation::OnFirst | RunnerSituation::ScoringPosition
        )
    }

    pub fn is_runner_in_scoring_position(&self, tag: &RunnerSituation) -> bool {
        matches!(tag, RunnerSituation::ScoringPosition)
    }

    /// Answer every classification question for one plate appearance.
    pub fn classify(&self, result: &PlateResult, runner: &RunnerSituation) -> Classification {
        Classification {
            is_hit: self.is_hit(result),
            is_at_bat: self.counts_as_at_bat(result),
            is_valid_at_bat: self.counts_as_valid_at_bat(result),
            is_walk: *result == PlateResult::Walk,
            is_on_base: self.counts_as_on_base(result),
            total_bases: self.total_bases_for(result),
            runner_on_base: self.is_runner_on_any_base(runner),
            scoring_position: self.is_runner_in_scoring_position(runner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_excludes_walk_and_sacrifice_fly() {
        let p = ClassificationPolicy::default();
        assert_eq!(p.version(), PolicyVersion::Standard);
        assert!(!p.counts_as_at_bat(&PlateResult::Walk));
        assert!(!p.counts_as_at_bat(&PlateResult::SacrificeFly));
        assert!(p.counts_as_at_bat(&PlateResult::Strikeout));
        assert!(p.counts_as_at_bat(&PlateResult::FieldersChoice));
        assert!(p.counts_as_valid_at_bat(&PlateResult::Single));
    }

    #[test]
    fn walk_only_counts_sacrifice_fly() {
        let p = ClassificationPolicy::for_version(PolicyVersion::WalkOnly);
        assert!(!p.counts_as_at_bat(&PlateResult::Walk));
        assert!(p.counts_as_at_bat(&PlateResult::SacrificeFly));
    }

    #[test]
    fn allow_list_rejects_unknown_results() {
        let p = ClassificationPolicy::for_version(PolicyVersion::AllowList);
        let other = PlateResult::Other("catcher interference".into());
        assert!(p.counts_as_at_bat(&other));
        assert!(!p.counts_as_valid_at_bat(&other));
        assert!(p.counts_as_valid_at_bat(&PlateResult::GroundOut));
        assert!(!p.counts_as_valid_at_bat(&PlateResult::Walk));
        assert!(!p.counts_as_valid_at_bat(&PlateResult::SacrificeFly));
    }

    #[test]
    fn on_base_set() {
        let p = ClassificationPolicy::default();
        for r in [
            PlateResult::Single,
            PlateResult::HomeRun,
            PlateResult::Walk,
            PlateResult::FieldersChoice,
            PlateResult::ReachedOnError,
        ] {
            assert!(p.counts_as_on_base(&r), "{r} should be on base");
        }
        for r in [
            PlateResult::Strikeout,
            PlateResult::SacrificeFly,
            PlateResult::FlyOut,
            PlateResult::Other("??".into()),
        ] {
            assert!(!p.counts_as_on_base(&r), "{r} should not be on base");
        }
    }

    #[test]
    fn overrides_toggle_at_bat_status() {
        let p = ClassificationPolicy::default()
            .with_sacrifice_fly_at_bat(true)
            .with_fielders_choice_at_bat(false);
        assert!(p.counts_as_at_bat(&PlateResult::SacrificeFly));
        assert!(!p.counts_as_at_bat(&PlateResult::FieldersChoice));

        let allow = ClassificationPolicy::for_version(PolicyVersion::AllowList)
            .with_fielders_choice_at_bat(false);
        assert!(!allow.counts_as_valid_at_bat(&PlateResult::FieldersChoice));
    }

    #[test]
    fn runner_buckets() {
        let p = ClassificationPolicy::default();
        let risp = RunnerSituation::ScoringPosition;
        let first = RunnerSituation::OnFirst;
        let legacy = RunnerSituation::Unrecognized("yes".into());
        assert!(p.is_runner_on_any_base(&risp));
        assert!(p.is_runner_in_scoring_position(&risp));
        assert!(p.is_runner_on_any_base(&first));
        assert!(!p.is_runner_in_scoring_position(&first));
        assert!(!p.is_runner_on_any_base(&legacy));
        assert!(!p.is_runner_on_any_base(&RunnerSituation::None));
    }

    #[test]
    fn version_names_round_trip() {
        for v in PolicyVersion::ALL {
            assert_eq!(v.as_str().parse::<PolicyVersion>().unwrap(), v);
        }
        assert_eq!("Walk_Only".parse::<PolicyVersion>().unwrap(), PolicyVersion::WalkOnly);
        assert!(matches!(
            "v9".parse::<PolicyVersion>(),
            Err(PolicyError::UnknownVersion(_))
        ));
    }
}
