// Configuration loading and parsing (config/fantasta.toml).

use fantasta_core::{DraftConfig, DraftError, PerRole};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Name of the single config file under `config/` (and `defaults/`).
pub const CONFIG_FILE: &str = "fantasta.toml";

/// Percentage caps must add up to exactly this, within float noise.
const PERCENT_TOTAL: f64 = 100.0;
const PERCENT_TOLERANCE: f64 = 1e-6;

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

impl From<DraftError> for ConfigError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::InvalidConfiguration { field, message } => ConfigError::ValidationError {
                field: format!("draft.{field}"),
                message,
            },
            other => ConfigError::ValidationError {
                field: "draft".into(),
                message: other.to_string(),
            },
        }
    }
}

fn validation_error(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub draft: DraftConfig,
    pub server_port: u16,
    pub db_path: String,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// fantasta.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire fantasta.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    draft: DraftSettings,
    server: ServerSection,
    database: DatabaseSection,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerSection {
    port: u16,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    /// Player listing CSV.
    pub roster: String,
    /// JSON snapshot file written alongside the database.
    pub snapshot: String,
}

/// The `[draft]` table. Also accepted as the body of an init request.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftSettings {
    pub total_budget: u32,
    pub top_k: usize,
    pub user_score_weight: f64,
    pub targets: PerRole<u32>,
    pub caps: CapSettings,
}

/// How role caps are expressed in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapMode {
    /// Whole percentages of the total budget; must sum to 100.
    #[default]
    Percentage,
    /// Credits per role; their sum must not exceed the total budget.
    Absolute,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CapSettings {
    #[serde(default)]
    pub mode: CapMode,
    #[serde(alias = "p")]
    pub goalkeeper: f64,
    #[serde(alias = "d")]
    pub defender: f64,
    #[serde(alias = "c")]
    pub midfielder: f64,
    #[serde(alias = "a")]
    pub attacker: f64,
}

impl CapSettings {
    fn values(&self) -> PerRole<f64> {
        PerRole::new(self.goalkeeper, self.defender, self.midfielder, self.attacker)
    }

    /// Convert to the fractions the draft engine works with.
    pub fn to_fractions(&self, total_budget: u32) -> Result<PerRole<f64>, ConfigError> {
        let values = self.values();
        for (role, &v) in values.iter() {
            if !v.is_finite() || v < 0.0 {
                return Err(validation_error(
                    &format!("draft.caps.{role}"),
                    format!("must be a non-negative number, got {v}"),
                ));
            }
        }
        let sum: f64 = values.iter().map(|(_, v)| v).sum();

        match self.mode {
            CapMode::Percentage => {
                if (sum - PERCENT_TOTAL).abs() > PERCENT_TOLERANCE {
                    return Err(validation_error(
                        "draft.caps",
                        format!("percentages must sum to 100, got {sum}"),
                    ));
                }
                Ok(values.map(|_, v| v / PERCENT_TOTAL))
            }
            CapMode::Absolute => {
                if total_budget == 0 {
                    return Err(validation_error(
                        "draft.total_budget",
                        "must be greater than 0",
                    ));
                }
                if sum > total_budget as f64 {
                    return Err(validation_error(
                        "draft.caps",
                        format!("caps total {sum} exceeds the budget of {total_budget}"),
                    ));
                }
                Ok(values.map(|_, v| v / total_budget as f64))
            }
        }
    }
}

impl DraftSettings {
    /// Build and validate the engine configuration.
    pub fn into_draft_config(self) -> Result<DraftConfig, ConfigError> {
        let caps = self.caps.to_fractions(self.total_budget)?;
        let config = DraftConfig {
            total_budget: self.total_budget,
            targets: self.targets,
            caps,
            user_score_weight: self.user_score_weight,
            top_k: self.top_k,
        };
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/fantasta.toml` relative to `base_dir`.
///
/// Does not copy defaults. Prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    parse_config(&text, &path)
}

fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    if file.server.port == 0 {
        return Err(validation_error("server.port", "must be greater than 0"));
    }
    if file.database.path.trim().is_empty() {
        return Err(validation_error("database.path", "must not be empty"));
    }
    if file.data_paths.roster.trim().is_empty() {
        return Err(validation_error("data_paths.roster", "must not be empty"));
    }

    Ok(Config {
        draft: file.draft.into_draft_config()?,
        server_port: file.server.port,
        db_path: file.database.path,
        data_paths: file.data_paths,
    })
}

/// Seed `config/fantasta.toml` from `defaults/` on first run.
///
/// Returns the path written, or `None` when the config file already exists.
/// An existing file is never overwritten.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.exists() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither {} nor {} found; run from the crate root",
                target.display(),
                source.display()
            ),
        });
    }

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", parent.display()),
        })?;
    }
    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {}: {e}", source.display()),
    })?;
    info!("Seeded {} from defaults", target.display());
    Ok(Some(target))
}

/// Load config relative to the current working directory, seeding missing
/// files from `defaults/` first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// The crate root, where `defaults/` lives (cwd under `cargo test`).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("crates/fantasta-app/defaults").exists() {
            cwd.join("crates/fantasta-app")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    const VALID: &str = r#"
[draft]
total_budget = 300
top_k = 5
user_score_weight = 1.0

[draft.targets]
p = 3
d = 8
c = 8
a = 6

[draft.caps]
mode = "percentage"
p = 10
d = 20
c = 40
a = 30

[server]
port = 3000

[database]
path = "fantasta.db"

[data_paths]
roster = "data/players.csv"
snapshot = "data/fanta_state.json"
"#;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        parse_config(text, Path::new("test.toml"))
    }

    fn invalid_field(text: &str) -> String {
        match parse(text).unwrap_err() {
            ConfigError::ValidationError { field, .. } => field,
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_default_config_from_project_files() {
        let tmp = std::env::temp_dir().join("fantasta_config_test_defaults");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::copy(
            project_root().join("defaults").join(CONFIG_FILE),
            tmp.join("defaults").join(CONFIG_FILE),
        )
        .unwrap();

        ensure_config_file(&tmp).expect("should copy default config");
        let config = load_config_from(&tmp).expect("should load default config");
        assert_eq!(config.draft, DraftConfig::default());
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.db_path, "fantasta.db");
        assert_eq!(config.data_paths.roster, "data/players.csv");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn percentage_caps_become_fractions() {
        let config = parse(VALID).unwrap();
        assert_eq!(config.draft.total_budget, 300);
        assert_eq!(config.draft.top_k, 5);
        assert!((config.draft.caps.midfielder - 0.40).abs() < 1e-12);
        assert!((config.draft.caps.goalkeeper - 0.10).abs() < 1e-12);
    }

    #[test]
    fn percentages_must_sum_to_100() {
        let text = VALID.replace("a = 30\n\n[server]", "a = 35\n\n[server]");
        assert_eq!(invalid_field(&text), "draft.caps");
    }

    #[test]
    fn absolute_caps_become_fractions() {
        let text = VALID
            .replace("mode = \"percentage\"", "mode = \"absolute\"")
            .replace("p = 10", "p = 30")
            .replace("d = 20", "d = 60")
            .replace("c = 40", "c = 120")
            .replace("a = 30\n\n[server]", "a = 90\n\n[server]");
        let config = parse(&text).unwrap();
        assert!((config.draft.caps.goalkeeper - 0.10).abs() < 1e-12);
        assert!((config.draft.caps.midfielder - 0.40).abs() < 1e-12);
    }

    #[test]
    fn absolute_caps_may_not_exceed_budget() {
        let text = VALID
            .replace("mode = \"percentage\"", "mode = \"absolute\"")
            .replace("c = 40", "c = 400");
        assert_eq!(invalid_field(&text), "draft.caps");
    }

    #[test]
    fn negative_cap_is_rejected() {
        let text = VALID.replace("p = 10", "p = -10");
        assert_eq!(invalid_field(&text), "draft.caps.goalkeeper");
    }

    #[test]
    fn rejects_zero_budget() {
        let text = VALID.replace("total_budget = 300", "total_budget = 0");
        assert_eq!(invalid_field(&text), "draft.total_budget");
    }

    #[test]
    fn rejects_zero_target() {
        let text = VALID.replace("d = 8", "d = 0");
        assert_eq!(invalid_field(&text), "draft.targets.defender");
    }

    #[test]
    fn rejects_zero_port() {
        let text = VALID.replace("port = 3000", "port = 0");
        assert_eq!(invalid_field(&text), "server.port");
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let err = parse("[draft\ntotal_budget = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn parse_error_for_missing_section() {
        let text = VALID.replace("[server]\nport = 3000\n", "");
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = std::env::temp_dir().join("fantasta_config_test_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_keeps_existing_file() {
        let tmp = std::env::temp_dir().join("fantasta_config_test_ensure");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        let config_dir = tmp.join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::write(defaults_dir.join(CONFIG_FILE), "default").unwrap();

        let copied = ensure_config_file(&tmp).unwrap();
        assert_eq!(copied, Some(config_dir.join(CONFIG_FILE)));

        fs::write(config_dir.join(CONFIG_FILE), "user edited").unwrap();
        assert_eq!(ensure_config_file(&tmp).unwrap(), None);
        assert_eq!(
            fs::read_to_string(config_dir.join(CONFIG_FILE)).unwrap(),
            "user edited"
        );

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_errors_without_defaults() {
        let tmp = std::env::temp_dir().join("fantasta_config_test_empty");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_file(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::DefaultsCopyError { .. }));

        let _ = fs::remove_dir_all(&tmp);
    }
}
