// Roster entries and recorded batting events.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::outcome::{parse_rbi, PlateResult, RunnerSituation};
use crate::policy::PolicyVersion;
use crate::rate::Rate;

/// Display name used when an event references a number not on the roster.
pub const UNKNOWN_PLAYER_NAME: &str = "unknown";

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// A roster entry. The jersey number is the key and need not be numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub number: String,
    pub name: String,
}

impl Player {
    pub fn new(number: impl Into<String>, name: impl Into<String>) -> Self {
        Player {
            number: number.into(),
            name: name.into(),
        }
    }
}

/// Outcome of a roster registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Registration {
    Added,
    /// The jersey number is already taken; the roster was not changed.
    AlreadyExists,
}

/// Look up a player's display name, falling back to [`UNKNOWN_PLAYER_NAME`].
pub fn player_name_for<'a>(players: &'a [Player], number: &str) -> &'a str {
    players
        .iter()
        .find(|p| p.number == number)
        .map(|p| p.name.as_str())
        .unwrap_or(UNKNOWN_PLAYER_NAME)
}

// ---------------------------------------------------------------------------
// Batting events
// ---------------------------------------------------------------------------

/// Store-assigned identifier of a batting event. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A plate appearance as submitted by the scorekeeper, before the
/// running average is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub player_number: String,
    pub date: NaiveDate,
    pub result: PlateResult,
    #[serde(default)]
    pub has_runner: RunnerSituation,
    /// Runs batted in, as submitted. Parsed defensively.
    #[serde(default, deserialize_with = "rbi_text")]
    pub rbi: String,
}

/// Accept RBI as text, a JSON number or null, keeping it as text.
fn rbi_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Int(n)) => n.to_string(),
        Some(Raw::Float(f)) => f.to_string(),
        None => String::new(),
    })
}

/// A fully computed event that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingEvent {
    pub player_number: String,
    pub player_name: String,
    pub date: NaiveDate,
    pub running_average: Rate,
    pub result: PlateResult,
    pub has_runner: RunnerSituation,
    pub rbi: String,
    pub policy_version: PolicyVersion,
}

impl PendingEvent {
    /// Attach the id the store assigned on append.
    pub fn into_event(self, id: EventId) -> BattingEvent {
        BattingEvent {
            id,
            player_number: self.player_number,
            player_name: self.player_name,
            date: Some(self.date),
            running_average: self.running_average,
            result: self.result,
            has_runner: self.has_runner,
            rbi: self.rbi,
            policy_version: Some(self.policy_version),
        }
    }
}

/// One recorded plate appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattingEvent {
    pub id: EventId,
    pub player_number: String,
    /// Name at recording time; not updated if the roster changes.
    pub player_name: String,
    /// Game date, not the recording timestamp. `None` for stored rows whose
    /// date text does not parse; such events still count toward totals.
    pub date: Option<NaiveDate>,
    /// Cumulative average after this at-bat, frozen at insertion time.
    pub running_average: Rate,
    pub result: PlateResult,
    pub has_runner: RunnerSituation,
    pub rbi: String,
    /// Policy the snapshot was computed under. `None` for legacy rows.
    #[serde(default)]
    pub policy_version: Option<PolicyVersion>,
}

impl BattingEvent {
    /// Runs batted in; malformed values count as 0.
    pub fn rbi_count(&self) -> u32 {
        parse_rbi(&self.rbi)
    }
}
