// Plate-appearance outcome vocabulary: batting results and runner situations.
//
// Both types normalize free-form input at ingestion. Scorekeepers have used
// English codes, display names and the original Chinese form labels over the
// years, so every known spelling maps onto one variant. Anything else is
// preserved verbatim in an `Other`/`Unrecognized` variant so that
// classification never fails on a new or misspelled value.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Plate results
// ---------------------------------------------------------------------------

/// The recorded result of one plate appearance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlateResult {
    Single,
    Double,
    Triple,
    HomeRun,
    Walk,
    Strikeout,
    FieldersChoice,
    SacrificeFly,
    ReachedOnError,
    FlyOut,
    GroundOut,
    InfieldOut,
    /// A value outside the known vocabulary, kept as submitted.
    Other(String),
}

impl PlateResult {
    /// Every known result, in form order.
    pub const KNOWN: [PlateResult; 12] = [
        PlateResult::Single,
        PlateResult::Double,
        PlateResult::Triple,
        PlateResult::HomeRun,
        PlateResult::Walk,
        PlateResult::Strikeout,
        PlateResult::FieldersChoice,
        PlateResult::SacrificeFly,
        PlateResult::ReachedOnError,
        PlateResult::FlyOut,
        PlateResult::GroundOut,
        PlateResult::InfieldOut,
    ];

    /// Parse a result label.
    ///
    /// Accepts the storage codes (`"home_run"`), display names
    /// (`"Home Run"`, `"sac fly"`), scorebook abbreviations (`"HR"`, `"BB"`,
    /// `"K"`) and the legacy form labels (`"全壘打"`, `"保送"`, ...).
    /// Unknown labels become [`PlateResult::Other`] with the trimmed input.
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match normalize_label(trimmed).as_str() {
            "single" | "1b" | "一壘" | "一壘安打" => PlateResult::Single,
            "double" | "2b" | "二壘" | "二壘安打" => PlateResult::Double,
            "triple" | "3b" | "三壘" | "三壘安打" => PlateResult::Triple,
            "home_run" | "homerun" | "hr" | "全壘打" => PlateResult::HomeRun,
            "walk" | "bb" | "base_on_balls" | "保送" | "四壞球" => PlateResult::Walk,
            "strikeout" | "strike_out" | "k" | "so" | "三振" => PlateResult::Strikeout,
            "fielders_choice" | "fielder's_choice" | "fc" | "野選" => {
                PlateResult::FieldersChoice
            }
            "sacrifice_fly" | "sac_fly" | "sf" | "高飛犧牲" | "高飛犧牲打" => {
                PlateResult::SacrificeFly
            }
            "reached_on_error" | "error" | "roe" | "e" | "對手失誤上壘" | "失誤上壘" => {
                PlateResult::ReachedOnError
            }
            "fly_out" | "flyout" | "fo" | "飛球出局" | "高飛球出局" => PlateResult::FlyOut,
            "ground_out" | "groundout" | "go" | "滾地出局" | "滾地球出局" => {
                PlateResult::GroundOut
            }
            "infield_out" | "infield_fly" | "if" | "內野出局" | "內野飛球" => {
                PlateResult::InfieldOut
            }
            _ => PlateResult::Other(trimmed.to_string()),
        }
    }

    /// The storage code for this result (the raw text for `Other`).
    pub fn code(&self) -> &str {
        match self {
            PlateResult::Single => "single",
            PlateResult::Double => "double",
            PlateResult::Triple => "triple",
            PlateResult::HomeRun => "home_run",
            PlateResult::Walk => "walk",
            PlateResult::Strikeout => "strikeout",
            PlateResult::FieldersChoice => "fielders_choice",
            PlateResult::SacrificeFly => "sacrifice_fly",
            PlateResult::ReachedOnError => "reached_on_error",
            PlateResult::FlyOut => "fly_out",
            PlateResult::GroundOut => "ground_out",
            PlateResult::InfieldOut => "infield_out",
            PlateResult::Other(raw) => raw,
        }
    }

    /// True for exactly single, double, triple and home run.
    pub fn is_hit(&self) -> bool {
        matches!(
            self,
            PlateResult::Single | PlateResult::Double | PlateResult::Triple | PlateResult::HomeRun
        )
    }

    /// Bases credited toward slugging: 1/2/3/4 for hits, 0 otherwise.
    pub fn total_bases(&self) -> u32 {
        match self {
            PlateResult::Single => 1,
            PlateResult::Double => 2,
            PlateResult::Triple => 3,
            PlateResult::HomeRun => 4,
            _ => 0,
        }
    }

    /// Whether this value came from outside the known vocabulary.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, PlateResult::Other(_))
    }
}

impl From<String> for PlateResult {
    fn from(s: String) -> Self {
        PlateResult::parse(&s)
    }
}

impl From<PlateResult> for String {
    fn from(r: PlateResult) -> Self {
        match r {
            PlateResult::Other(raw) => raw,
            known => known.code().to_string(),
        }
    }
}

impl fmt::Display for PlateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Runner situations
// ---------------------------------------------------------------------------

/// Runner occupancy at the moment of the at-bat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunnerSituation {
    /// Bases empty (also used for an empty tag).
    #[default]
    None,
    /// Runner on first only.
    OnFirst,
    /// Runner on second or third, or bases loaded.
    ScoringPosition,
    /// A legacy or free-form tag; matches no situational bucket.
    Unrecognized(String),
}

impl RunnerSituation {
    /// Parse a runner tag, accepting codes, display names and legacy labels.
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match normalize_label(trimmed).as_str() {
            "" | "none" | "no" | "no_runner" | "bases_empty" | "empty" | "無" | "無人" | "壘上無人" => {
                RunnerSituation::None
            }
            "on_first" | "runner_on_first" | "first" | "1b" | "一壘有人" => {
                RunnerSituation::OnFirst
            }
            "scoring_position" | "runner_in_scoring_position" | "risp" | "scoring"
            | "second" | "third" | "bases_loaded" | "loaded" | "得點圈有人" | "得點圈"
            | "滿壘" => RunnerSituation::ScoringPosition,
            _ => RunnerSituation::Unrecognized(trimmed.to_string()),
        }
    }

    /// The storage code for this situation (the raw text for `Unrecognized`).
    pub fn code(&self) -> &str {
        match self {
            RunnerSituation::None => "none",
            RunnerSituation::OnFirst => "on_first",
            RunnerSituation::ScoringPosition => "scoring_position",
            RunnerSituation::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for RunnerSituation {
    fn from(s: String) -> Self {
        RunnerSituation::parse(&s)
    }
}

impl From<RunnerSituation> for String {
    fn from(r: RunnerSituation) -> Self {
        match r {
            RunnerSituation::Unrecognized(raw) => raw,
            known => known.code().to_string(),
        }
    }
}

impl fmt::Display for RunnerSituation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// RBI
// ---------------------------------------------------------------------------

/// Parse a runs-batted-in value as submitted.
///
/// Anything that is not a non-negative integer (after trimming) counts as 0.
pub fn parse_rbi(raw: &str) -> u32 {
    raw.trim().parse::<u32>().unwrap_or(0)
}

/// Lowercase, then fold spaces and hyphens into underscores. Non-ASCII
/// labels pass through unchanged.
fn normalize_label(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}
