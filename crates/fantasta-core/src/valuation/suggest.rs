// Ranked purchase suggestions per role.

use serde::Serialize;

use crate::draft::state::DraftState;
use crate::player::{PerRole, Player, Role};
use crate::valuation::budget::budget_breakdown;

/// Suggestion lists for one role.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoleSuggestions {
    /// Best available players, ignoring budget.
    pub standard: Vec<Player>,
    /// Best available players priced within both the role's effective
    /// allowance and the overall remaining budget.
    pub optimized: Vec<Player>,
}

/// Sort players descending by score. Stable: ties keep pool order.
pub fn sort_by_score_desc(players: &mut [Player]) {
    players.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Players of `role` that are neither picked nor marked unavailable,
/// best first.
pub fn available_pool(state: &DraftState, role: Role) -> Vec<Player> {
    let mut pool: Vec<Player> = state
        .roster
        .iter()
        .filter(|p| p.role == role && !state.is_taken(&p.name))
        .cloned()
        .collect();
    sort_by_score_desc(&mut pool);
    pool
}

/// Build standard and optimized top-K lists for every role still being
/// filled. Roles whose target is met get two empty lists.
pub fn suggestions(state: &DraftState) -> PerRole<RoleSuggestions> {
    let need = state.remaining_needed();
    let budgets = budget_breakdown(state);
    let top_k = state.config.top_k;
    let budget_left = state.budget_remaining as f64;

    PerRole::from_fn(|role| {
        if *need.get(role) == 0 {
            return RoleSuggestions::default();
        }

        let pool = available_pool(state, role);
        let allowance = budgets.role(role).remaining;

        let standard = pool.iter().take(top_k).cloned().collect();
        let optimized = pool
            .into_iter()
            .filter(|p| p.base_value <= allowance && p.base_value <= budget_left)
            .take(top_k)
            .collect();

        RoleSuggestions {
            standard,
            optimized,
        }
    })
}

/// Top `k` players of a role by score. Ignores need, budget and
/// availability.
pub fn top_by_role(state: &DraftState, role: Role, k: usize) -> Vec<Player> {
    let mut pool: Vec<Player> = state
        .roster
        .iter()
        .filter(|p| p.role == role)
        .cloned()
        .collect();
    sort_by_score_desc(&mut pool);
    pool.truncate(k);
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DraftConfig;

    fn names(players: &[Player]) -> Vec<&str> {
        players.iter().map(|p| p.name.as_str()).collect()
    }

    fn roster() -> Vec<Player> {
        vec![
            Player::new("gk_a", Role::Goalkeeper, 25.0),
            Player::new("gk_b", Role::Goalkeeper, 15.0),
            Player::new("gk_c", Role::Goalkeeper, 8.0),
            Player::new("gk_d", Role::Goalkeeper, 2.0),
            Player::new("d_a", Role::Defender, 20.0),
            Player::new("d_b", Role::Defender, 10.0),
            Player::new("m_a", Role::Midfielder, 30.0),
            Player::new("a_a", Role::Attacker, 50.0),
            Player::new("a_b", Role::Attacker, 35.0),
            Player::new("a_c", Role::Attacker, 12.0),
        ]
    }

    fn state_with(config: DraftConfig) -> DraftState {
        DraftState::initialize(roster(), config).unwrap()
    }

    #[test]
    fn standard_list_is_top_k_by_score() {
        let config = DraftConfig {
            top_k: 2,
            ..DraftConfig::default()
        };
        let s = state_with(config);
        let sugg = suggestions(&s);
        assert_eq!(names(&sugg.goalkeeper.standard), vec!["gk_a", "gk_b"]);
        assert_eq!(names(&sugg.attacker.standard), vec!["a_a", "a_b"]);
    }

    #[test]
    fn optimized_list_respects_role_allowance() {
        // Goalkeeper cap: 200 * 0.10 = 20, so gk_a (25) is too expensive.
        let s = state_with(DraftConfig::default());
        let sugg = suggestions(&s);
        assert_eq!(names(&sugg.goalkeeper.optimized), vec!["gk_b", "gk_c", "gk_d"]);
        assert_eq!(sugg.goalkeeper.standard.len(), 4);
    }

    #[test]
    fn optimized_list_tightens_after_overspend_elsewhere() {
        let mut s = state_with(DraftConfig::default());
        // Attacker cap 60: 70 spent leaves 10 of overage; defender and
        // midfielder also get picks, so goalkeepers absorb it (20 -> 10).
        s.pick("a_a", 70).unwrap();
        s.pick("d_a", 10).unwrap();
        s.pick("m_a", 10).unwrap();
        let sugg = suggestions(&s);
        assert_eq!(names(&sugg.goalkeeper.optimized), vec!["gk_c", "gk_d"]);
        // Attacker allowance is clamped to zero.
        assert!(sugg.attacker.optimized.is_empty());
        assert_eq!(names(&sugg.attacker.standard), vec!["a_b", "a_c"]);
    }

    #[test]
    fn optimized_list_respects_overall_budget() {
        let mut config = DraftConfig::default();
        config.caps = PerRole::new(1.0, 1.0, 1.0, 1.0);
        let mut s = state_with(config);
        s.pick("d_a", 190).unwrap();
        let sugg = suggestions(&s);
        // 10 credits left overall.
        assert_eq!(names(&sugg.goalkeeper.optimized), vec!["gk_c", "gk_d"]);
    }

    #[test]
    fn taken_players_are_excluded() {
        let mut s = state_with(DraftConfig::default());
        s.pick("gk_a", 10).unwrap();
        s.mark_unavailable("GK_B", 5, Some("Marco")).unwrap();
        let sugg = suggestions(&s);
        assert_eq!(names(&sugg.goalkeeper.standard), vec!["gk_c", "gk_d"]);
    }

    #[test]
    fn filled_role_yields_empty_lists() {
        let mut config = DraftConfig::default();
        config.targets.goalkeeper = 1;
        let mut s = state_with(config);
        s.pick("gk_d", 1).unwrap();
        let sugg = suggestions(&s);
        assert!(sugg.goalkeeper.standard.is_empty());
        assert!(sugg.goalkeeper.optimized.is_empty());
        assert!(!sugg.defender.standard.is_empty());
    }

    #[test]
    fn suggestions_are_idempotent() {
        let mut s = state_with(DraftConfig::default());
        s.pick("a_a", 40).unwrap();
        assert_eq!(suggestions(&s), suggestions(&s));
    }

    #[test]
    fn ties_keep_roster_order() {
        let roster = vec![
            Player::new("first", Role::Defender, 10.0),
            Player::new("second", Role::Defender, 10.0),
            Player::new("third", Role::Defender, 10.0),
        ];
        let s = DraftState::initialize(roster, DraftConfig::default()).unwrap();
        let sugg = suggestions(&s);
        assert_eq!(names(&sugg.defender.standard), vec!["first", "second", "third"]);
    }

    #[test]
    fn top_by_role_ignores_availability() {
        let mut s = state_with(DraftConfig::default());
        s.pick("a_a", 10).unwrap();
        let top = top_by_role(&s, Role::Attacker, 2);
        assert_eq!(names(&top), vec!["a_a", "a_b"]);
        assert!(top_by_role(&s, Role::Midfielder, 0).is_empty());
    }
}
