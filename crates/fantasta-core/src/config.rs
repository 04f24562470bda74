// Draft configuration: budget, per-role targets and caps, scoring weight.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::DraftError;
use crate::player::{PerRole, Role};

/// Tolerance used when checking that cap fractions add up to 1.
const CAP_SUM_TOLERANCE: f64 = 1e-6;

/// Session configuration. Immutable for the lifetime of a [`crate::DraftState`];
/// changing it means re-initializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftConfig {
    /// Total credits available to spend.
    pub total_budget: u32,
    /// How many players to buy per role.
    pub targets: PerRole<u32>,
    /// Fraction of `total_budget` each role is expected to consume.
    pub caps: PerRole<f64>,
    /// Multiplier applied to a player's `user_score`.
    pub user_score_weight: f64,
    /// Length of each suggestion list.
    pub top_k: usize,
}

impl Default for DraftConfig {
    fn default() -> Self {
        DraftConfig {
            total_budget: 200,
            targets: PerRole::new(3, 8, 8, 6),
            caps: PerRole::new(0.10, 0.25, 0.35, 0.30),
            user_score_weight: 0.5,
            top_k: 6,
        }
    }
}

impl DraftConfig {
    /// Check every field. Returns the first offending field.
    ///
    /// Cap fractions that do not sum to 1 are accepted with a warning.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.total_budget == 0 {
            return Err(DraftError::invalid("total_budget", "must be greater than 0"));
        }

        for (role, &target) in self.targets.iter() {
            if target == 0 {
                return Err(DraftError::invalid(
                    &format!("targets.{role}"),
                    "must be greater than 0",
                ));
            }
        }

        for (role, &cap) in self.caps.iter() {
            if !cap.is_finite() || cap < 0.0 {
                return Err(DraftError::invalid(
                    &format!("caps.{role}"),
                    format!("must be a non-negative number, got {cap}"),
                ));
            }
        }

        if !self.user_score_weight.is_finite() {
            return Err(DraftError::invalid(
                "user_score_weight",
                format!("must be a finite number, got {}", self.user_score_weight),
            ));
        }

        if self.top_k == 0 {
            return Err(DraftError::invalid("top_k", "must be greater than 0"));
        }

        let cap_sum: f64 = self.caps.iter().map(|(_, c)| c).sum();
        if (cap_sum - 1.0).abs() > CAP_SUM_TOLERANCE {
            warn!("role cap fractions sum to {cap_sum:.3}, expected 1.0");
        }

        Ok(())
    }

    /// Credit cap for a role: `total_budget * cap_fraction`.
    pub fn role_cap(&self, role: Role) -> f64 {
        self.total_budget as f64 * self.caps.get(role)
    }
}
