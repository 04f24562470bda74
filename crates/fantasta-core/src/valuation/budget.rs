// Per-role budget caps with redistribution of overspend.
//
// Each role gets `total_budget * cap_fraction` credits. When a role overshoots
// its cap, the overage is charged against the roles nobody has bought for
// yet, so the suggestion engine stops recommending another splurge there.
// Roles that already have at least one pick are left alone.

use serde::Serialize;
use tracing::debug;

use crate::draft::state::DraftState;
use crate::player::{PerRole, Role};

/// Fraction of the cap below which a role counts as under-spent.
pub const UNDERSPEND_FRACTION: f64 = 0.3;

/// How a role's spend compares with its cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendStatus {
    /// Spent more than the cap.
    Over,
    /// Spent less than 30% of the cap.
    Under,
    OnTrack,
}

/// Budget figures for a single role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoleBudget {
    /// `total_budget * cap_fraction`.
    pub cap: f64,
    pub spent: u32,
    /// Effective allowance left after redistribution. Never negative.
    pub remaining: f64,
    pub picked_count: usize,
    pub target_count: u32,
    /// How much of other roles' overage was charged to this role.
    pub deducted: f64,
    /// Whether this role absorbed part of another role's overage.
    pub adjusted: bool,
}

impl RoleBudget {
    pub fn status(&self) -> SpendStatus {
        let spent = self.spent as f64;
        if spent > self.cap {
            SpendStatus::Over
        } else if spent < self.cap * UNDERSPEND_FRACTION {
            SpendStatus::Under
        } else {
            SpendStatus::OnTrack
        }
    }
}

/// Budget figures for every role, plus the total overage that was spread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetBreakdown {
    pub roles: PerRole<RoleBudget>,
    /// Sum of the amounts by which roles exceeded their caps.
    pub total_excess: f64,
}

impl BudgetBreakdown {
    pub fn role(&self, role: Role) -> &RoleBudget {
        self.roles.get(role)
    }
}

/// Compute caps, spend and effective remaining allowance for every role.
///
/// Two passes:
/// 1. `remaining = cap - spent`. A negative remainder is an overage: it is
///    added to `total_excess` and the role's remaining is clamped to 0.
/// 2. If there is any excess, it is split evenly across eligible roles (no
///    picks yet and a positive remaining). Each eligible role loses
///    `min(share, remaining)` and is flagged as adjusted.
pub fn budget_breakdown(state: &DraftState) -> BudgetBreakdown {
    let mut total_excess = 0.0;

    // ---- 1. Caps and overage ----
    let mut roles = PerRole::from_fn(|role| {
        let cap = state.config.role_cap(role);
        let spent = state.role_spent(role);
        let mut remaining = cap - spent as f64;
        if remaining < 0.0 {
            total_excess += remaining.abs();
            remaining = 0.0;
        }
        RoleBudget {
            cap,
            spent,
            remaining,
            picked_count: state.role_picked_count(role),
            target_count: *state.config.targets.get(role),
            deducted: 0.0,
            adjusted: false,
        }
    });

    // ---- 2. Redistribution ----
    if total_excess > 0.0 {
        let eligible: Vec<Role> = Role::ALL
            .into_iter()
            .filter(|&role| {
                let rb = roles.get(role);
                rb.picked_count == 0 && rb.remaining > 0.0
            })
            .collect();

        if !eligible.is_empty() {
            let share = total_excess / eligible.len() as f64;
            debug!(
                "Spreading {:.1} overage across {} untouched roles ({:.1} each)",
                total_excess,
                eligible.len(),
                share
            );
            for role in eligible {
                let rb = roles.get_mut(role);
                let deduction = share.min(rb.remaining);
                rb.remaining -= deduction;
                rb.deducted = deduction;
                rb.adjusted = true;
            }
        }
    }

    BudgetBreakdown {
        roles,
        total_excess,
    }
}
