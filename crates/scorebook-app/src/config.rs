// Configuration loading and parsing (config/scorebook.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use scorebook_core::{ClassificationPolicy, ObpDenominator, PolicyVersion};

/// Name of the single configuration file under `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "scorebook.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub team: TeamConfig,
    pub server: ServerConfig,
    pub db_path: String,
    pub policy: PolicyConfig,
    pub import: ImportConfig,
}

impl Config {
    /// The classification policy selected by the `[policy]` section.
    pub fn classification_policy(&self) -> ClassificationPolicy {
        self.policy.build()
    }
}

// ---------------------------------------------------------------------------
// scorebook.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire scorebook.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ScorebookFile {
    team: TeamConfig,
    server: ServerConfig,
    database: DatabaseSection,
    #[serde(default)]
    policy: PolicyConfig,
    #[serde(default)]
    import: ImportConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    #[serde(default)]
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which classification rule set to use, plus optional parameter overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub version: PolicyVersion,
    #[serde(default)]
    pub obp_denominator: Option<ObpDenominator>,
    #[serde(default)]
    pub sacrifice_fly_is_at_bat: Option<bool>,
    #[serde(default)]
    pub fielders_choice_is_at_bat: Option<bool>,
}

impl PolicyConfig {
    pub fn build(&self) -> ClassificationPolicy {
        let mut policy = ClassificationPolicy::for_version(self.version);
        if let Some(den) = self.obp_denominator {
            policy = policy.with_obp_denominator(den);
        }
        if let Some(counts) = self.sacrifice_fly_is_at_bat {
            policy = policy.with_sacrifice_fly_at_bat(counts);
        }
        if let Some(counts) = self.fielders_choice_is_at_bat {
            policy = policy.with_fielders_choice_at_bat(counts);
        }
        policy
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportConfig {
    /// Directory holding `players.csv` and `records.csv` from the flat-file
    /// scorebook. Imported once, into an empty database.
    #[serde(default)]
    pub legacy_csv_dir: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/scorebook.toml` relative to
/// `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    parse_config(&text, &path)
}

/// Parse and validate configuration text. `path` is only used in errors.
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let file: ScorebookFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = Config {
        team: file.team,
        server: file.server,
        db_path: file.database.path,
        policy: file.policy,
        import: file.import,
    };

    validate(&config)?;

    Ok(config)
}

/// Copy `defaults/scorebook.toml` to `config/scorebook.toml` unless the
/// latter already exists. Returns the written path, or `None` when nothing
/// was copied.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let content = std::fs::read(&source).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!(
            "no config at {} and cannot read {}: {e}",
            target.display(),
            source.display()
        ),
    })?;
    std::fs::create_dir_all(base_dir.join("config")).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    // create_new so that a file written concurrently is never clobbered
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(None),
        Err(e) => {
            return Err(ConfigError::DefaultsCopyError {
                message: format!("failed to create {}: {e}", target.display()),
            })
        }
    };
    std::io::Write::write_all(&mut dest, &content).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to write {}: {e}", target.display()),
    })?;
    Ok(Some(target))
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Copies the default config file on first run.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    if let Some(path) = ensure_config_file(&cwd)? {
        tracing::info!("Wrote default config to {}", path.display());
    }
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    if config.server.host.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "server.host".into(),
            message: "must not be empty".into(),
        });
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError {
            field: "server.port".into(),
            message: "must be greater than 0".into(),
        });
    }

    if let Some(dir) = &config.import.legacy_csv_dir {
        if dir.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "import.legacy_csv_dir".into(),
                message: "must not be empty when set".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
