// Draft state: roster, picks, unavailable players and opponent budgets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::entry::{
    Advisory, MarkOutcome, OpponentPlayer, OpponentState, PickOutcome, PickedEntry,
    UnavailableEntry,
};
use crate::config::DraftConfig;
use crate::error::DraftError;
use crate::player::{names_match, PerRole, Player, Role};
use crate::valuation::scoring::compute_scores;

/// The complete state of one draft session.
///
/// Created by [`DraftState::initialize`], changed only by [`DraftState::pick`]
/// and [`DraftState::mark_unavailable`], and replaced wholesale on
/// re-initialization or snapshot import. `picked`, `unavailable` and every
/// opponent's list are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftState {
    pub config: DraftConfig,
    /// The scored roster, in listing order.
    pub roster: Vec<Player>,
    /// `total_budget - sum(picked.price)`, floored at zero.
    pub budget_remaining: u32,
    pub picked: Vec<PickedEntry>,
    pub unavailable: Vec<UnavailableEntry>,
    /// Opponents keyed by owner name.
    pub opponents: BTreeMap<String, OpponentState>,
}

impl DraftState {
    /// Validate the configuration, score the roster and start a fresh draft.
    ///
    /// Nothing is created if the configuration is invalid.
    pub fn initialize(roster: Vec<Player>, config: DraftConfig) -> Result<Self, DraftError> {
        config.validate()?;
        let roster = compute_scores(roster, config.user_score_weight);
        info!(
            "Draft initialized: {} players, budget {}",
            roster.len(),
            config.total_budget
        );
        Ok(DraftState {
            budget_remaining: config.total_budget,
            config,
            roster,
            picked: Vec::new(),
            unavailable: Vec::new(),
            opponents: BTreeMap::new(),
        })
    }

    /// Case-insensitive roster lookup.
    pub fn find_player(&self, name: &str) -> Option<&Player> {
        self.roster.iter().find(|p| p.name_matches(name))
    }

    /// Whether a name is already picked or marked unavailable.
    pub fn is_taken(&self, name: &str) -> bool {
        self.is_picked(name) || self.unavailable.iter().any(|u| names_match(&u.name, name))
    }

    pub fn is_picked(&self, name: &str) -> bool {
        self.picked.iter().any(|p| names_match(&p.name, name))
    }

    /// Credits spent on a role so far. Saturates at `u32::MAX`.
    pub fn role_spent(&self, role: Role) -> u32 {
        self.picked
            .iter()
            .filter(|p| p.role == role)
            .fold(0, |acc, p| acc.saturating_add(p.price))
    }

    pub fn role_picked_count(&self, role: Role) -> usize {
        self.picked.iter().filter(|p| p.role == role).count()
    }

    /// Players still to buy per role: target minus picked, floored at zero.
    pub fn remaining_needed(&self) -> PerRole<u32> {
        PerRole::from_fn(|role| {
            let picked = self.role_picked_count(role) as u32;
            self.config.targets.get(role).saturating_sub(picked)
        })
    }

    /// Total credits spent by the user. Saturates at `u32::MAX`.
    pub fn total_spent(&self) -> u32 {
        self.picked
            .iter()
            .fold(0, |acc, p| acc.saturating_add(p.price))
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Record a purchase.
    ///
    /// The role and canonical name come from the roster entry, not from the
    /// caller. Exceeding the role cap never blocks the pick; it is reported
    /// as an [`Advisory`]. On error the state is unchanged.
    pub fn pick(&mut self, name: &str, price: u32) -> Result<PickOutcome, DraftError> {
        let player = self.find_player(name).ok_or_else(|| DraftError::NotFound {
            name: name.to_string(),
        })?;
        let entry = PickedEntry {
            name: player.name.clone(),
            role: player.role,
            price,
        };
        if self.is_taken(&entry.name) {
            return Err(DraftError::AlreadyTaken { name: entry.name });
        }

        let mut advisories = Vec::new();
        let cap = self.config.role_cap(entry.role);
        let spent = self.role_spent(entry.role).saturating_add(price);
        if spent as f64 > cap {
            warn!("{} cap exceeded: spent {} of {:.1}", entry.role, spent, cap);
            advisories.push(Advisory::RoleCapExceeded {
                role: entry.role,
                spent,
                cap,
            });
        }

        self.budget_remaining = self.budget_remaining.saturating_sub(price);
        self.picked.push(entry.clone());

        info!(
            "Picked {} ({}) for {}; {} remaining",
            entry.name, entry.role, price, self.budget_remaining
        );

        Ok(PickOutcome {
            pick: entry,
            budget_remaining: self.budget_remaining,
            advisories,
        })
    }

    /// Record a player taken by someone else.
    ///
    /// The name is free text. When `owner` is given (and not blank) the
    /// opponent is registered on first sight with the full configured budget,
    /// then charged `price`. Fails only if the name is already on the user's
    /// own picked list.
    pub fn mark_unavailable(
        &mut self,
        name: &str,
        price: u32,
        owner: Option<&str>,
    ) -> Result<MarkOutcome, DraftError> {
        if self.is_picked(name) {
            return Err(DraftError::AlreadyTaken {
                name: name.to_string(),
            });
        }

        let owner = owner.map(str::trim).filter(|o| !o.is_empty());
        let entry = UnavailableEntry {
            name: name.to_string(),
            price: Some(price),
            owner: owner.map(str::to_string),
        };
        self.unavailable.push(entry.clone());

        let mut advisories = Vec::new();
        if self.find_player(name).is_none() {
            advisories.push(Advisory::UnknownPlayer {
                name: name.to_string(),
            });
        }

        if let Some(owner) = owner {
            let total_budget = self.config.total_budget;
            let opponent = self
                .opponents
                .entry(owner.to_string())
                .or_insert_with(|| {
                    info!("Tracking new opponent: '{owner}'");
                    OpponentState::new(total_budget)
                });
            opponent.budget_remaining -= price as i64;
            opponent.players.push(OpponentPlayer {
                name: name.to_string(),
                price,
            });
            if opponent.budget_remaining < 0 {
                warn!("{owner} is over budget ({})", opponent.budget_remaining);
                advisories.push(Advisory::OpponentOverBudget {
                    owner: owner.to_string(),
                    budget_remaining: opponent.budget_remaining,
                });
            }
        }

        info!("Marked '{}' unavailable (price {})", name, price);

        Ok(MarkOutcome { entry, advisories })
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    pub fn to_snapshot_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn to_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Rehydrate a state from its serialized form.
    ///
    /// Rejects the snapshot as a whole when a required field is missing or
    /// has the wrong shape, when the embedded configuration is invalid, or
    /// when the picks do not agree with the roster and the budget. Scores are
    /// recomputed from the roster rather than trusted.
    pub fn from_snapshot_value(value: serde_json::Value) -> Result<Self, DraftError> {
        let mut state: DraftState = serde_json::from_value(value)
            .map_err(|e| DraftError::MalformedSnapshot(e.to_string()))?;
        state
            .config
            .validate()
            .map_err(|e| DraftError::MalformedSnapshot(e.to_string()))?;
        state.roster = compute_scores(
            std::mem::take(&mut state.roster),
            state.config.user_score_weight,
        );
        state.check_consistency()?;
        Ok(state)
    }

    fn check_consistency(&self) -> Result<(), DraftError> {
        let malformed = |msg: String| Err(DraftError::MalformedSnapshot(msg));

        for (i, entry) in self.picked.iter().enumerate() {
            let Some(player) = self.find_player(&entry.name) else {
                return malformed(format!("picked '{}' is not in the roster", entry.name));
            };
            if player.role != entry.role {
                return malformed(format!(
                    "picked '{}' recorded as {} but the roster says {}",
                    entry.name, entry.role, player.role
                ));
            }
            if self.picked[..i].iter().any(|p| names_match(&p.name, &entry.name)) {
                return malformed(format!("'{}' is picked twice", entry.name));
            }
            if self.unavailable.iter().any(|u| names_match(&u.name, &entry.name)) {
                return malformed(format!("'{}' is both picked and unavailable", entry.name));
            }
        }

        let spent = self.total_spent();
        let expected = self.config.total_budget.saturating_sub(spent);
        if self.budget_remaining != expected {
            return malformed(format!(
                "budget_remaining {} does not match total_budget {} minus spent {}",
                self.budget_remaining, self.config.total_budget, spent
            ));
        }
        Ok(())
    }

    pub fn from_snapshot(json: &str) -> Result<Self, DraftError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| DraftError::MalformedSnapshot(e.to_string()))?;
        Self::from_snapshot_value(value)
    }
}
