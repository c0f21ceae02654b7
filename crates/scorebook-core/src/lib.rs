// Statistics engine for a softball scorebook.
//
// Pure functions over a roster and an ordered event log: classification
// policy, insertion-time running averages, per-player summaries and the
// date-window query. No I/O happens in this crate.

pub mod event;
pub mod outcome;
pub mod policy;
pub mod query;
pub mod rate;
pub mod record;
pub mod stats;

pub use event::{
    player_name_for, BattingEvent, EventDraft, EventId, PendingEvent, Player, Registration,
    UNKNOWN_PLAYER_NAME,
};
pub use outcome::{PlateResult, RunnerSituation};
pub use policy::{ClassificationPolicy, ObpDenominator, PolicyVersion};
pub use query::{batting_log, personal_window, query_personal, PersonalWindow};
pub use rate::Rate;
pub use record::{record_event, running_average};
pub use stats::{compute_summary, stat_line_for, PlayerStatLine, Rates, Tally};
