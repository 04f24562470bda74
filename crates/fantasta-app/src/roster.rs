// Player listing ingestion.
//
// Reads the auction listing CSV: one row per player with Nome, Sq., Under,
// R., FVMP, P and S columns (English aliases accepted). Comma and semicolon
// delimiters are both recognized from the header line.

use fantasta_core::player::names_match;
use fantasta_core::{AgeBand, Player, Role};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("roster {0} produced zero valid rows")]
    Empty(String),
}

// ---------------------------------------------------------------------------
// Raw CSV row (private)
// ---------------------------------------------------------------------------

/// Every cell is read as text so one bad number never drops a whole row.
#[derive(Debug, Deserialize)]
struct RawListingRow {
    #[serde(rename = "Nome", alias = "name", alias = "nome")]
    name: String,
    #[serde(rename = "Sq.", alias = "team", default)]
    team: String,
    #[serde(rename = "Under", alias = "ageband", default)]
    ageband: String,
    #[serde(rename = "R.", alias = "role")]
    role: String,
    #[serde(rename = "FVMP", alias = "fvmp", default)]
    fvmp: String,
    #[serde(rename = "P", alias = "priority", default)]
    priority: String,
    #[serde(rename = "S", alias = "user_score", default)]
    user_score: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a listing number. Accepts a decimal comma.
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Priorities are positive integers; 0, negatives and junk mean "none".
fn parse_priority(s: &str) -> Option<u32> {
    parse_number(s)
        .map(f64::trunc)
        .filter(|v| *v >= 1.0 && *v <= u32::MAX as f64)
        .map(|v| v as u32)
}

/// A user score of 0 is the same as no score.
fn parse_user_score(s: &str) -> Option<f64> {
    parse_number(s).filter(|v| *v != 0.0)
}

fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    if header.contains(';') && !header.contains(',') {
        b';'
    } else {
        b','
    }
}

// ---------------------------------------------------------------------------
// Reader-based loader
// ---------------------------------------------------------------------------

/// Parse a listing from any reader.
///
/// Rows with an empty name or an unknown role are skipped with a warning.
/// Names are unique case-insensitively; later duplicates are dropped.
pub fn load_roster_from_reader<R: Read>(mut rdr: R) -> Result<Vec<Player>, csv::Error> {
    let mut text = String::new();
    rdr.read_to_string(&mut text)?;
    let text = text.trim_start_matches('\u{feff}');

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(text))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut players: Vec<Player> = Vec::new();
    for (idx, result) in reader.deserialize::<RawListingRow>().enumerate() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed listing row {}: {}", idx + 2, e);
                continue;
            }
        };

        let name = raw.name.trim();
        if name.is_empty() {
            warn!("skipping listing row {}: empty name", idx + 2);
            continue;
        }
        let Some(role) = Role::from_code(&raw.role) else {
            warn!("skipping '{}': unknown role '{}'", name, raw.role);
            continue;
        };
        if players.iter().any(|p| names_match(&p.name, name)) {
            warn!("duplicate listing entry for '{}', keeping the first", name);
            continue;
        }

        let base_value = parse_number(&raw.fvmp).unwrap_or_else(|| {
            if !raw.fvmp.trim().is_empty() {
                warn!("'{}': unreadable FVMP '{}', using 0", name, raw.fvmp);
            }
            0.0
        });

        let mut player = Player::new(name, role, base_value).with_team(raw.team.trim());
        player.ageband = AgeBand::from_str_band(&raw.ageband);
        player.priority = parse_priority(&raw.priority);
        player.user_score = parse_user_score(&raw.user_score);
        players.push(player);
    }
    Ok(players)
}

// ---------------------------------------------------------------------------
// Path-based loaders
// ---------------------------------------------------------------------------

/// Load the listing CSV at `path`. Fails if no row survives.
pub fn load_roster(path: &Path) -> Result<Vec<Player>, RosterError> {
    let file = std::fs::File::open(path).map_err(|e| RosterError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let players = load_roster_from_reader(file).map_err(|e| RosterError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    if players.is_empty() {
        return Err(RosterError::Empty(path.display().to_string()));
    }
    info!("Loaded {} players from {}", players.len(), path.display());
    Ok(players)
}

/// Raw bytes of the listing, for download.
pub fn read_listing_bytes(path: &Path) -> Result<Vec<u8>, RosterError> {
    std::fs::read(path).map_err(|e| RosterError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
