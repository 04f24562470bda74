// Diagnostic score for how closely spend follows the configured caps.

use serde::Serialize;
use std::fmt;

use crate::draft::state::DraftState;
use crate::valuation::budget::{budget_breakdown, SpendStatus};

const OVER_PENALTY: u8 = 10;
const UNDER_PENALTY: u8 = 5;

/// Coarse label for a balance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceRating {
    Good,
    Fair,
    Poor,
}

impl BalanceRating {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => BalanceRating::Good,
            60..=79 => BalanceRating::Fair,
            _ => BalanceRating::Poor,
        }
    }
}

impl fmt::Display for BalanceRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BalanceRating::Good => "good",
            BalanceRating::Fair => "fair",
            BalanceRating::Poor => "poor",
        };
        write!(f, "{s}")
    }
}

/// Start at 100; each role over its cap costs 10, each role below 30% of its
/// cap costs 5. Never below 0.
///
/// Purely informational. Nothing else reads it.
pub fn balance_score(state: &DraftState) -> u8 {
    let breakdown = budget_breakdown(state);
    breakdown
        .roles
        .iter()
        .fold(100u8, |score, (_, rb)| match rb.status() {
            SpendStatus::Over => score.saturating_sub(OVER_PENALTY),
            SpendStatus::Under => score.saturating_sub(UNDER_PENALTY),
            SpendStatus::OnTrack => score,
        })
}
