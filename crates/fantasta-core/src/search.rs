// Roster search by name, team, role and availability.

use serde::{Deserialize, Serialize};

use crate::draft::state::DraftState;
use crate::player::{names_match, Player, Role};
use crate::valuation::suggest::sort_by_score_desc;

/// Search criteria. Every field is optional; set fields are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive substring of the player name.
    #[serde(default)]
    pub name: Option<String>,
    /// Case-insensitive substring of the team name.
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub available_only: bool,
}

impl SearchQuery {
    /// True when no criterion is set. Blank strings count as unset.
    pub fn is_empty(&self) -> bool {
        non_blank(&self.name).is_none()
            && non_blank(&self.team).is_none()
            && self.role.is_none()
            && !self.available_only
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub player: Player,
    pub available: bool,
}

fn non_blank(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

/// Whether a roster player is still on the market: not picked, not marked
/// unavailable and not on any opponent's list.
pub fn is_available(state: &DraftState, name: &str) -> bool {
    !state.is_taken(name)
        && !state
            .opponents
            .values()
            .any(|o| o.players.iter().any(|p| names_match(&p.name, name)))
}

/// Search the roster. An empty query matches nothing.
pub fn search_players(state: &DraftState, query: &SearchQuery) -> Vec<SearchHit> {
    if query.is_empty() {
        return Vec::new();
    }
    let name = non_blank(&query.name);
    let team = non_blank(&query.team);

    let mut players: Vec<Player> = state
        .roster
        .iter()
        .filter(|p| {
            name.as_deref()
                .map_or(true, |n| p.name.to_lowercase().contains(n))
        })
        .filter(|p| {
            team.as_deref()
                .map_or(true, |t| p.team.to_lowercase().contains(t))
        })
        .filter(|p| query.role.map_or(true, |r| p.role == r))
        .filter(|p| !query.available_only || is_available(state, &p.name))
        .cloned()
        .collect();
    sort_by_score_desc(&mut players);

    players
        .into_iter()
        .map(|player| SearchHit {
            available: is_available(state, &player.name),
            player,
        })
        .collect()
}
