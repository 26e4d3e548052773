use crate::config::EngineConfig;

/// Optional context the caller knows about the fixture. Everything defaults
/// to "unknown", which leaves only the base context confidence.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextSignals {
    pub h2h_count: usize,
    pub recent_form_available: bool,
    pub fixture_congestion_known: bool,
}

/// Saturating iteration factor: grows linearly until the optimal iteration
/// count, then stays at 1.
pub fn iteration_factor(iterations: u32, cfg: &EngineConfig) -> f64 {
    (iterations as f64 / cfg.optimal_iterations as f64).min(1.0)
}

/// 1 for a perfectly even pairing, approaching 0 as one side dominates.
fn balance_factor(home_rate: f64, away_rate: f64) -> f64 {
    let total = home_rate + away_rate;
    if total > 0.0 {
        1.0 - (home_rate - away_rate).abs() / total
    } else {
        0.5
    }
}

/// Bounded calibration factor in [floor, cap]. Balanced fixtures with
/// moderate expected totals and large iteration counts calibrate best.
pub fn calibration_factor(
    home_rate: f64,
    away_rate: f64,
    iterations: u32,
    cfg: &EngineConfig,
) -> f64 {
    let balance = balance_factor(home_rate, away_rate);
    let iter_factor = iteration_factor(iterations, cfg);

    let expected_total = home_rate + away_rate;
    let goals_factor = if (2.0..=3.5).contains(&expected_total) {
        1.0
    } else if expected_total < 2.0 {
        0.85
    } else {
        0.9
    };

    ((balance * cfg.balance_weight + iter_factor * cfg.iteration_weight) * goals_factor)
        .clamp(cfg.calibration_floor, cfg.calibration_cap)
}

/// Reliability score in [0, cap], built from iteration volume, rate balance,
/// the expected-total band and whatever fixture context is available.
pub fn confidence_score(
    iterations: u32,
    home_rate: f64,
    away_rate: f64,
    context: &ContextSignals,
    cfg: &EngineConfig,
) -> f64 {
    let iter_conf = iteration_factor(iterations, cfg) * 0.4;
    let balance_conf = balance_factor(home_rate, away_rate) * 0.3;

    let expected_total = home_rate + away_rate;
    let goals_conf = if (2.0..=3.5).contains(&expected_total) {
        0.25
    } else if (1.5..2.0).contains(&expected_total) || (expected_total > 3.5 && expected_total <= 4.0)
    {
        0.2
    } else {
        0.15
    };

    let mut context_conf = 0.05;
    if context.h2h_count > 5 {
        context_conf += 0.05;
    }
    if context.recent_form_available {
        context_conf += 0.03;
    }
    if context.fixture_congestion_known {
        context_conf += 0.02;
    }

    (iter_conf + balance_conf + goals_conf + context_conf).clamp(0.0, cfg.confidence_cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn calibration_factor_stays_in_bounds() {
        let cfg = cfg();
        for &(home, away) in &[
            (0.1, 0.1),
            (0.1, 5.0),
            (1.5, 1.5),
            (1.8, 1.2),
            (3.0, 0.2),
            (4.0, 4.0),
        ] {
            for &iterations in &[1_000u32, 10_000, 100_000, 1_000_000] {
                let factor = calibration_factor(home, away, iterations, &cfg);
                assert!(
                    (cfg.calibration_floor..=cfg.calibration_cap).contains(&factor),
                    "out of bounds for ({home}, {away}, {iterations}): {factor}"
                );
            }
        }
    }

    #[test]
    fn confidence_stays_in_bounds() {
        let cfg = cfg();
        let full_context = ContextSignals {
            h2h_count: 12,
            recent_form_available: true,
            fixture_congestion_known: true,
        };
        for &(home, away) in &[(0.1, 0.1), (1.8, 1.2), (3.0, 3.0), (0.5, 4.5)] {
            for &iterations in &[1_000u32, 100_000, 10_000_000] {
                let score = confidence_score(iterations, home, away, &full_context, &cfg);
                assert!((0.0..=cfg.confidence_cap).contains(&score));
            }
        }
    }

    #[test]
    fn iteration_factor_grows_then_saturates() {
        let cfg = cfg();
        let below = iteration_factor(10_000, &cfg);
        let mid = iteration_factor(50_000, &cfg);
        let at_optimum = iteration_factor(100_000, &cfg);
        let beyond = iteration_factor(400_000, &cfg);
        assert!(below < mid && mid < at_optimum);
        assert_eq!(at_optimum, 1.0);
        assert_eq!(beyond, 1.0);
    }

    #[test]
    fn balanced_moderate_fixture_calibrates_best() {
        let cfg = cfg();
        let balanced = calibration_factor(1.4, 1.4, 100_000, &cfg);
        let lopsided = calibration_factor(2.4, 0.4, 100_000, &cfg);
        assert!(balanced > lopsided);
        // Balanced sweet-spot fixture at full iterations hits the cap.
        assert_eq!(balanced, cfg.calibration_cap);
    }

    #[test]
    fn expected_total_bands_shift_confidence() {
        let cfg = cfg();
        let context = ContextSignals::default();
        // Half the optimal iteration count keeps every band below the cap.
        let sweet = confidence_score(50_000, 1.4, 1.4, &context, &cfg);
        let near = confidence_score(50_000, 0.9, 0.9, &context, &cfg);
        let extreme = confidence_score(50_000, 0.5, 0.5, &context, &cfg);
        assert!(sweet > near && near > extreme);
        assert!((sweet - near - 0.05).abs() < 1e-9);
        assert!((near - extreme - 0.05).abs() < 1e-9);
    }

    #[test]
    fn context_signals_add_their_increments() {
        let cfg = cfg();
        // Low iteration count keeps the total away from the cap.
        let base = confidence_score(1_000, 1.0, 1.0, &ContextSignals::default(), &cfg);
        let with_h2h = confidence_score(
            1_000,
            1.0,
            1.0,
            &ContextSignals {
                h2h_count: 6,
                ..Default::default()
            },
            &cfg,
        );
        let with_all = confidence_score(
            1_000,
            1.0,
            1.0,
            &ContextSignals {
                h2h_count: 6,
                recent_form_available: true,
                fixture_congestion_known: true,
            },
            &cfg,
        );
        assert!((with_h2h - base - 0.05).abs() < 1e-9);
        assert!((with_all - base - 0.10).abs() < 1e-9);
    }
}
