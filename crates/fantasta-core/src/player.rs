// Player records, roles and age bands.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Playing role. Players are only ever ranked against their own role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Goalkeeper,
    Defender,
    Midfielder,
    Attacker,
}

impl Role {
    /// All roles in display order.
    pub const ALL: [Role; 4] = [
        Role::Goalkeeper,
        Role::Defender,
        Role::Midfielder,
        Role::Attacker,
    ];

    /// Parse a role string.
    ///
    /// Accepts the single-letter listing codes (`p`, `d`, `c`, `a`) as well
    /// as the English names, case-insensitively.
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "p" | "gk" | "goalkeeper" => Some(Role::Goalkeeper),
            "d" | "def" | "defender" => Some(Role::Defender),
            "c" | "m" | "mid" | "midfielder" => Some(Role::Midfielder),
            "a" | "f" | "att" | "attacker" => Some(Role::Attacker),
            _ => None,
        }
    }

    /// Single-letter listing code.
    pub fn code(&self) -> &'static str {
        match self {
            Role::Goalkeeper => "p",
            Role::Defender => "d",
            Role::Midfielder => "c",
            Role::Attacker => "a",
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Role::Goalkeeper => "goalkeeper",
            Role::Defender => "defender",
            Role::Midfielder => "midfielder",
            Role::Attacker => "attacker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Per-role table
// ---------------------------------------------------------------------------

/// One value per role. Used for targets, caps, budgets and suggestions.
///
/// Deserializes from either the English role names or the listing codes
/// (`p`, `d`, `c`, `a`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerRole<T> {
    #[serde(alias = "p")]
    pub goalkeeper: T,
    #[serde(alias = "d")]
    pub defender: T,
    #[serde(alias = "c")]
    pub midfielder: T,
    #[serde(alias = "a")]
    pub attacker: T,
}

impl<T> PerRole<T> {
    pub fn new(goalkeeper: T, defender: T, midfielder: T, attacker: T) -> Self {
        PerRole {
            goalkeeper,
            defender,
            midfielder,
            attacker,
        }
    }

    /// Build a table by evaluating `f` once per role, in `Role::ALL` order.
    pub fn from_fn(mut f: impl FnMut(Role) -> T) -> Self {
        PerRole {
            goalkeeper: f(Role::Goalkeeper),
            defender: f(Role::Defender),
            midfielder: f(Role::Midfielder),
            attacker: f(Role::Attacker),
        }
    }

    pub fn get(&self, role: Role) -> &T {
        match role {
            Role::Goalkeeper => &self.goalkeeper,
            Role::Defender => &self.defender,
            Role::Midfielder => &self.midfielder,
            Role::Attacker => &self.attacker,
        }
    }

    pub fn get_mut(&mut self, role: Role) -> &mut T {
        match role {
            Role::Goalkeeper => &mut self.goalkeeper,
            Role::Defender => &mut self.defender,
            Role::Midfielder => &mut self.midfielder,
            Role::Attacker => &mut self.attacker,
        }
    }

    /// Iterate `(role, value)` pairs in `Role::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &T)> {
        Role::ALL.into_iter().map(move |role| (role, self.get(role)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Role, &T) -> U) -> PerRole<U> {
        PerRole::from_fn(|role| f(role, self.get(role)))
    }
}

// ---------------------------------------------------------------------------
// Age band
// ---------------------------------------------------------------------------

/// Age bracket from the player listing, youngest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeBand {
    U21,
    U23,
    U25,
    U28,
    U30,
    O30,
}

impl AgeBand {
    pub fn from_str_band(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "U21" => Some(AgeBand::U21),
            "U23" => Some(AgeBand::U23),
            "U25" => Some(AgeBand::U25),
            "U28" => Some(AgeBand::U28),
            "U30" => Some(AgeBand::U30),
            "O30" => Some(AgeBand::O30),
            _ => None,
        }
    }

    /// Score offset for this band. Younger players get a larger bonus;
    /// over-30s take a small penalty.
    pub fn bonus(&self) -> f64 {
        match self {
            AgeBand::U21 => 0.10,
            AgeBand::U23 => 0.07,
            AgeBand::U25 => 0.05,
            AgeBand::U28 => 0.02,
            AgeBand::U30 => 0.00,
            AgeBand::O30 => -0.02,
        }
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgeBand::U21 => "U21",
            AgeBand::U23 => "U23",
            AgeBand::U25 => "U25",
            AgeBand::U28 => "U28",
            AgeBand::U30 => "U30",
            AgeBand::O30 => "O30",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A roster entry.
///
/// `z_score` and `score` are filled by [`crate::valuation::scoring::compute_scores`]
/// and are only meaningful relative to other players of the same role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub ageband: Option<AgeBand>,
    /// Listing valuation ("fvmp").
    pub base_value: f64,
    /// Lower is more urgent.
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub user_score: Option<f64>,
    #[serde(default)]
    pub z_score: f64,
    #[serde(default)]
    pub score: f64,
}

impl Player {
    pub fn new(name: impl Into<String>, role: Role, base_value: f64) -> Self {
        Player {
            name: name.into(),
            role,
            team: String::new(),
            ageband: None,
            base_value,
            priority: None,
            user_score: None,
            z_score: 0.0,
            score: 0.0,
        }
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = team.into();
        self
    }

    pub fn with_ageband(mut self, band: AgeBand) -> Self {
        self.ageband = Some(band);
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_user_score(mut self, user_score: f64) -> Self {
        self.user_score = Some(user_score);
        self
    }

    /// Case-insensitive name comparison used for every roster lookup.
    pub fn name_matches(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

/// Case-insensitive, whitespace-trimmed name equality.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
