// Role-relative z-score model with age, priority and user-score adjustments.

use tracing::debug;

use crate::player::{Player, Role};

// ---------------------------------------------------------------------------
// Pool statistics
// ---------------------------------------------------------------------------

/// Mean and standard deviation of `base_value` across one role's pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Divisor applied to a player's priority before it is subtracted.
const PRIORITY_DIVISOR: f64 = 50.0;

/// Compute mean and population standard deviation for a slice of values.
///
/// A deviation of exactly zero is replaced by 1, so a single
/// player or a uniformly valued pool scores 0 for everyone instead of
/// dividing by zero. An empty slice yields `{ mean: 0, stdev: 1 }`.
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats {
            mean: 0.0,
            stdev: 1.0,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let stdev = variance.sqrt();
    PoolStats {
        mean,
        stdev: if stdev == 0.0 { 1.0 } else { stdev },
    }
}

pub fn compute_zscore(value: f64, stats: &PoolStats) -> f64 {
    (value - stats.mean) / stats.stdev
}

/// Everything added on top of the raw z-score: age bonus, priority and the
/// weighted user score.
pub fn score_adjustment(player: &Player, user_score_weight: f64) -> f64 {
    let mut adjustment = player.ageband.map(|b| b.bonus()).unwrap_or(0.0);
    if let Some(priority) = player.priority {
        adjustment -= priority as f64 / PRIORITY_DIVISOR;
    }
    if let Some(user_score) = player.user_score {
        adjustment += user_score_weight * user_score;
    }
    adjustment
}

// ---------------------------------------------------------------------------
// Top-level entry point
// ---------------------------------------------------------------------------

/// Score every player in the roster against the other players of its role.
///
/// For each role the pool stats of `base_value` are computed, each player's
/// `z_score` is set to its z-score within that pool and `score` to the
/// z-score plus [`score_adjustment`]. Roster order is preserved.
///
/// Scores depend on the whole roster, so this must run again whenever the
/// roster changes. Picks do not invalidate them.
pub fn compute_scores(mut roster: Vec<Player>, user_score_weight: f64) -> Vec<Player> {
    for role in Role::ALL {
        let values: Vec<f64> = roster
            .iter()
            .filter(|p| p.role == role)
            .map(|p| p.base_value)
            .collect();
        if values.is_empty() {
            continue;
        }

        let stats = compute_pool_stats(&values);
        debug!(
            "{role}: {} players, mean={:.3}, stdev={:.3}",
            values.len(),
            stats.mean,
            stats.stdev
        );

        for player in roster.iter_mut().filter(|p| p.role == role) {
            let z = compute_zscore(player.base_value, &stats);
            player.z_score = z;
            player.score = z + score_adjustment(player, user_score_weight);
        }
    }
    roster
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::AgeBand;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn pool_stats_known_values() {
        // Mean 5, population variance 32/8 = 4, stdev 2.
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = compute_pool_stats(&values);
        assert!(approx_eq(stats.mean, 5.0, 1e-10));
        assert!(approx_eq(stats.stdev, 2.0, 1e-10));
    }

    #[test]
    fn pool_stats_single_value_substitutes_unit_stdev() {
        let stats = compute_pool_stats(&[42.0]);
        assert!(approx_eq(stats.mean, 42.0, 1e-10));
        assert!(approx_eq(stats.stdev, 1.0, 1e-10));
        assert!(approx_eq(compute_zscore(42.0, &stats), 0.0, 1e-10));
    }

    #[test]
    fn pool_stats_uniform_values_substitute_unit_stdev() {
        let stats = compute_pool_stats(&[7.0, 7.0, 7.0]);
        assert!(approx_eq(stats.stdev, 1.0, 1e-10));
    }

    #[test]
    fn pool_stats_keep_tiny_nonzero_stdev() {
        let stats = compute_pool_stats(&[0.0, 2e-12]);
        assert!(stats.stdev > 0.0 && stats.stdev < 1e-9);
        assert!(approx_eq(compute_zscore(2e-12, &stats), 1.0, 1e-6));
    }

    #[test]
    fn three_attackers_example() {
        let roster = vec![
            Player::new("A", Role::Attacker, 10.0),
            Player::new("B", Role::Attacker, 20.0),
            Player::new("C", Role::Attacker, 30.0),
        ];
        let scored = compute_scores(roster, 0.5);
        // stdev = sqrt(200/3) ~ 8.165
        assert!(approx_eq(scored[0].score, -1.2247, 1e-3));
        assert!(approx_eq(scored[1].score, 0.0, 1e-10));
        assert!(approx_eq(scored[2].score, 1.2247, 1e-3));
    }

    #[test]
    fn z_scores_are_normalized_within_each_role() {
        let roster = vec![
            Player::new("gk1", Role::Goalkeeper, 5.0),
            Player::new("gk2", Role::Goalkeeper, 12.0),
            Player::new("d1", Role::Defender, 1.0),
            Player::new("d2", Role::Defender, 3.0),
            Player::new("d3", Role::Defender, 8.0),
            Player::new("d4", Role::Defender, 21.0),
            Player::new("m1", Role::Midfielder, 14.0),
        ];
        let scored = compute_scores(roster, 0.5);

        for role in [Role::Goalkeeper, Role::Defender] {
            let z: Vec<f64> = scored
                .iter()
                .filter(|p| p.role == role)
                .map(|p| p.z_score)
                .collect();
            let n = z.len() as f64;
            let mean = z.iter().sum::<f64>() / n;
            let var = z.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            assert!(approx_eq(mean, 0.0, 1e-9), "{role} mean {mean}");
            assert!(approx_eq(var.sqrt(), 1.0, 1e-9), "{role} stdev {}", var.sqrt());
        }

        // Single midfielder: stdev substituted, z = 0.
        let m1 = scored.iter().find(|p| p.name == "m1").unwrap();
        assert!(approx_eq(m1.z_score, 0.0, 1e-12));
    }

    #[test]
    fn roles_are_scored_independently() {
        // The same base value means different things in different roles.
        let roster = vec![
            Player::new("gk_low", Role::Goalkeeper, 10.0),
            Player::new("gk_high", Role::Goalkeeper, 20.0),
            Player::new("a_low", Role::Attacker, 20.0),
            Player::new("a_high", Role::Attacker, 60.0),
        ];
        let scored = compute_scores(roster, 0.0);
        assert!(scored[1].score > 0.0); // gk_high: best goalkeeper
        assert!(scored[2].score < 0.0); // a_low: worst attacker, same base value
    }

    #[test]
    fn adjustments_are_applied() {
        let roster = vec![
            Player::new("young", Role::Defender, 10.0).with_ageband(AgeBand::U21),
            Player::new("old", Role::Defender, 10.0).with_ageband(AgeBand::O30),
            Player::new("urgent", Role::Defender, 10.0).with_priority(5),
            Player::new("liked", Role::Defender, 10.0).with_user_score(2.0),
        ];
        let scored = compute_scores(roster, 0.5);
        // Uniform base values: every z-score is 0, only adjustments remain.
        assert!(approx_eq(scored[0].score, 0.10, 1e-12));
        assert!(approx_eq(scored[1].score, -0.02, 1e-12));
        assert!(approx_eq(scored[2].score, -0.10, 1e-12));
        assert!(approx_eq(scored[3].score, 1.0, 1e-12));
        for p in &scored {
            assert!(approx_eq(p.z_score, 0.0, 1e-12));
        }
    }

    #[test]
    fn lower_priority_number_scores_higher() {
        let a = Player::new("a", Role::Midfielder, 10.0).with_priority(1);
        let b = Player::new("b", Role::Midfielder, 10.0).with_priority(10);
        assert!(score_adjustment(&a, 0.5) > score_adjustment(&b, 0.5));
    }

    #[test]
    fn empty_roster_is_a_no_op() {
        assert!(compute_scores(Vec::new(), 0.5).is_empty());
    }
}
