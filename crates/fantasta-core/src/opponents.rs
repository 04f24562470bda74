// Per-opponent roster summaries built from observed purchases.

use serde::Serialize;

use crate::draft::entry::OpponentPlayer;
use crate::draft::state::DraftState;
use crate::player::{PerRole, Role};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpponentSummary {
    pub owner: String,
    pub budget_remaining: i64,
    pub total_players: usize,
    /// Players per role, resolved against the roster.
    pub counts: PerRole<u32>,
    /// Target minus count, floored at zero.
    pub missing: PerRole<u32>,
    /// Players per role, most expensive first.
    pub players: PerRole<Vec<OpponentPlayer>>,
    /// Names that could not be found in the roster.
    pub unclassified: Vec<OpponentPlayer>,
}

/// Summarize every tracked opponent, ordered by owner name.
pub fn opponent_summaries(state: &DraftState) -> Vec<OpponentSummary> {
    state
        .opponents
        .iter()
        .map(|(owner, opponent)| {
            let mut players: PerRole<Vec<OpponentPlayer>> = PerRole::default();
            let mut unclassified = Vec::new();
            for bought in &opponent.players {
                match state.find_player(&bought.name) {
                    Some(p) => players.get_mut(p.role).push(bought.clone()),
                    None => unclassified.push(bought.clone()),
                }
            }
            for role in Role::ALL {
                players
                    .get_mut(role)
                    .sort_by(|a, b| b.price.cmp(&a.price));
            }

            let counts = players.map(|_, list| list.len() as u32);
            let missing = counts.map(|role, count| {
                state.config.targets.get(role).saturating_sub(*count)
            });

            OpponentSummary {
                owner: owner.clone(),
                budget_remaining: opponent.budget_remaining,
                total_players: opponent.players.len(),
                counts,
                missing,
                players,
                unclassified,
            }
        })
        .collect()
}
