// Startup wiring between configuration, the store and the HTTP state.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use scorebook_core::PolicyVersion;

use crate::config::Config;
use crate::db::Database;
use crate::legacy;
use crate::web::AppState;

/// Open the database, pin the active policy version and run the one-time
/// legacy import if configured. Relative paths resolve against `base_dir`.
pub fn prepare_store(config: &Config, base_dir: &Path) -> Result<Database> {
    let db_path = if config.db_path == ":memory:" {
        config.db_path.clone()
    } else {
        base_dir.join(&config.db_path).to_string_lossy().into_owned()
    };
    let db = Database::open(&db_path).context("failed to open database")?;
    info!("Database opened at {db_path}");

    check_policy_version(&db, config.policy.version)?;

    if let Some(dir) = &config.import.legacy_csv_dir {
        import_legacy_if_empty(&db, &base_dir.join(dir))?;
    }

    Ok(db)
}

/// Record the policy version in the store, warning when it differs from the
/// one used by the previous run. Stored running averages keep the version
/// they were computed under.
pub fn check_policy_version(db: &Database, version: PolicyVersion) -> Result<()> {
    match db.record_policy_version(version)? {
        Some(previous) if previous != version => warn!(
            "Classification policy changed from {previous} to {version}; \
             stored running averages keep their original values"
        ),
        Some(_) => info!("Classification policy: {version}"),
        None => info!("Classification policy: {version} (first run)"),
    }
    Ok(())
}

/// Import `players.csv`/`records.csv` from `dir` when the store has no
/// batting records yet. Returns the (players, records) inserted, or `None`
/// if the import was skipped.
pub fn import_legacy_if_empty(db: &Database, dir: &Path) -> Result<Option<(usize, usize)>> {
    if db.event_count()? > 0 {
        info!(
            "Skipping legacy import from {}: database already has records",
            dir.display()
        );
        return Ok(None);
    }

    let data = legacy::load_legacy_dir(dir)
        .with_context(|| format!("failed to read legacy CSV files in {}", dir.display()))?;
    if data.undated > 0 {
        warn!(
            "{} legacy records have invalid dates; they count toward totals but not date windows",
            data.undated
        );
    }

    let counts = db.import_legacy(&data.players, &data.records)?;
    info!(
        "Imported {} players and {} records from {}",
        counts.0,
        counts.1,
        dir.display()
    );
    Ok(Some(counts))
}

/// Build the shared HTTP state from a prepared store.
pub fn build_state(config: &Config, db: Database) -> AppState {
    AppState::new(db, config.classification_policy(), config.team.name.clone())
}
