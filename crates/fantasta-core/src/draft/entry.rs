// Draft log entries, opponent tracking and advisories.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::player::Role;

/// A player bought by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickedEntry {
    /// Canonical roster name (not the caller's spelling).
    pub name: String,
    pub role: Role,
    pub price: u32,
}

/// A player taken by someone else. The name is free text and need not match
/// a roster entry.
///
/// Older snapshots stored some entries as a bare name string; both shapes
/// deserialize into this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "UnavailableRecord")]
pub struct UnavailableEntry {
    pub name: String,
    pub price: Option<u32>,
    pub owner: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UnavailableRecord {
    Name(String),
    Entry {
        #[serde(alias = "nome")]
        name: String,
        #[serde(default)]
        price: Option<u32>,
        #[serde(default)]
        owner: Option<String>,
    },
}

impl From<UnavailableRecord> for UnavailableEntry {
    fn from(record: UnavailableRecord) -> Self {
        match record {
            UnavailableRecord::Name(name) => UnavailableEntry {
                name,
                price: None,
                owner: None,
            },
            UnavailableRecord::Entry { name, price, owner } => UnavailableEntry {
                name,
                price,
                owner: owner.filter(|o| !o.trim().is_empty()),
            },
        }
    }
}

/// A player on an opponent's list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentPlayer {
    pub name: String,
    pub price: u32,
}

/// What we have observed an opponent spend. The budget is not clamped:
/// it is an observation, not an authority, and may go negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentState {
    pub budget_remaining: i64,
    pub players: Vec<OpponentPlayer>,
}

impl OpponentState {
    pub fn new(budget: u32) -> Self {
        OpponentState {
            budget_remaining: budget as i64,
            players: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Advisories
// ---------------------------------------------------------------------------

/// Non-fatal conditions reported alongside a successful mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// Cumulative spend on a role is above its cap.
    RoleCapExceeded { role: Role, spent: u32, cap: f64 },
    /// An opponent's tracked budget went below zero.
    OpponentOverBudget { owner: String, budget_remaining: i64 },
    /// A player marked unavailable is not in the roster.
    UnknownPlayer { name: String },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::RoleCapExceeded { role, spent, cap } => {
                write!(f, "{role} cap exceeded: spent {spent} of {cap:.1}")
            }
            Advisory::OpponentOverBudget {
                owner,
                budget_remaining,
            } => write!(f, "{owner} is over budget ({budget_remaining})"),
            Advisory::UnknownPlayer { name } => {
                write!(f, "'{name}' is not in the roster")
            }
        }
    }
}

/// Result of a successful pick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickOutcome {
    pub pick: PickedEntry,
    pub budget_remaining: u32,
    pub advisories: Vec<Advisory>,
}

/// Result of marking a player unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkOutcome {
    pub entry: UnavailableEntry,
    pub advisories: Vec<Advisory>,
}
