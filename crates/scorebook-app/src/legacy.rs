// Flat-file interop: importing the CSV scorebook and exporting the summary.
//
// Before the SQLite store, the scorebook kept `players.csv` and `records.csv`
// next to the program. Those files are imported once into an empty database.
// The summary view can be exported in the same spirit.

use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use scorebook_core::{PlateResult, Player, PlayerStatLine, Rate, RunnerSituation};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One row of the legacy `records.csv`, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRecord {
    pub player_number: String,
    pub player_name: String,
    /// `%Y-%m-%d` when the file's date parses, otherwise the text as written.
    pub date: String,
    /// The average stored by the old program, kept verbatim.
    pub running_average: Rate,
    pub result: PlateResult,
    pub has_runner: RunnerSituation,
    pub rbi: String,
}

/// Everything read from a legacy directory.
#[derive(Debug, Clone, Default)]
pub struct LegacyData {
    pub players: Vec<Player>,
    pub records: Vec<LegacyRecord>,
    /// Rows whose date could not be parsed. They are still imported.
    pub undated: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// Legacy roster row. Header names varied between English and the original
/// Chinese form labels; extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawPlayer {
    #[serde(alias = "背號", alias = "player_number")]
    number: String,
    #[serde(default, alias = "姓名", alias = "player_name")]
    name: String,
}

/// Legacy record row. Every field is read as text and normalized after.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(alias = "背號", alias = "player_number")]
    number: String,
    #[serde(default, alias = "姓名", alias = "player_name")]
    name: String,
    #[serde(alias = "日期")]
    date: String,
    #[serde(default, alias = "打擊率", alias = "running_average")]
    average: String,
    #[serde(alias = "打擊結果")]
    result: String,
    #[serde(default, alias = "壘上有人")]
    has_runner: String,
    #[serde(default, alias = "打點")]
    rbi: String,
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Read `players.csv` and `records.csv` from `dir`. A missing `records.csv`
/// is treated as an empty log; a missing `players.csv` is an error.
pub fn load_legacy_dir(dir: &Path) -> Result<LegacyData, ImportError> {
    let players_path = dir.join("players.csv");
    let players_file = std::fs::File::open(&players_path).map_err(|e| ImportError::Io {
        path: players_path.display().to_string(),
        source: e,
    })?;
    let players = read_players(players_file).map_err(|e| ImportError::Csv {
        path: players_path.display().to_string(),
        source: e,
    })?;

    let records_path = dir.join("records.csv");
    let (records, undated) = if records_path.exists() {
        let file = std::fs::File::open(&records_path).map_err(|e| ImportError::Io {
            path: records_path.display().to_string(),
            source: e,
        })?;
        read_records(file).map_err(|e| ImportError::Csv {
            path: records_path.display().to_string(),
            source: e,
        })?
    } else {
        warn!("no records.csv in {}, importing roster only", dir.display());
        (Vec::new(), 0)
    };

    info!(
        "Read {} players and {} records from {} ({} undated)",
        players.len(),
        records.len(),
        dir.display(),
        undated
    );

    Ok(LegacyData {
        players,
        records,
        undated,
    })
}

/// Parse a legacy roster. Rows with an empty number are dropped.
pub fn read_players<R: Read>(rdr: R) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut players = Vec::new();
    for row in reader.deserialize::<RawPlayer>() {
        let raw = row?;
        if raw.number.is_empty() {
            warn!("skipping roster row with empty number");
            continue;
        }
        players.push(Player {
            number: raw.number,
            name: raw.name,
        });
    }
    Ok(players)
}

/// Parse a legacy record log. Returns the records and the number of rows
/// whose date did not parse; those rows are kept with their date text.
pub fn read_records<R: Read>(rdr: R) -> Result<(Vec<LegacyRecord>, usize), csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut records = Vec::new();
    let mut undated = 0;

    for (line, row) in reader.deserialize::<RawRecord>().enumerate() {
        let raw = row?;
        let date = match NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d") {
            Ok(d) => d.to_string(),
            Err(_) => {
                warn!(row = line + 1, date = %raw.date, "legacy record has an invalid date");
                undated += 1;
                raw.date
            }
        };
        records.push(LegacyRecord {
            player_number: raw.number,
            player_name: raw.name,
            date,
            running_average: raw.average.parse().unwrap_or(Rate::ZERO),
            result: PlateResult::parse(&raw.result),
            has_runner: RunnerSituation::parse(&raw.has_runner),
            rbi: raw.rbi,
        });
    }

    Ok((records, undated))
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Column order of the summary export.
const SUMMARY_HEADER: [&str; 12] = [
    "number",
    "name",
    "plate_appearances",
    "at_bats",
    "hits",
    "walks",
    "rbi",
    "average",
    "on_base_percentage",
    "slugging",
    "runner_on_base_average",
    "scoring_position_average",
];

/// Write stat lines as CSV. The header row is written even for an empty
/// roster; rates use the fixed three-decimal form.
pub fn export_summary_csv<W: Write>(lines: &[PlayerStatLine], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(SUMMARY_HEADER)?;
    for line in lines {
        let t = &line.totals;
        let r = &line.rates;
        wtr.write_record([
            line.number.clone(),
            line.name.clone(),
            t.plate_appearances.to_string(),
            t.at_bats.to_string(),
            t.hits.to_string(),
            t.walks.to_string(),
            t.rbi.to_string(),
            r.average.to_string(),
            r.on_base_percentage.to_string(),
            r.slugging.to_string(),
            r.runner_on_base_average.to_string(),
            r.scoring_position_average.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
