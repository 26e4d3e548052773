use serde::Serialize;

use crate::config::EngineConfig;
use crate::simulation::MatchOutcomeProbs;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BenchmarkReport {
    pub target_rps: f64,
    pub achieved_rps: f64,
    pub benchmark_met: bool,
}

/// Heuristic expected 3-way distribution [home, draw, away] derived from the
/// rate gap. Stands in for a settled result, which does not exist at
/// simulation time.
fn expected_distribution(rate_gap: f64) -> [f64; 3] {
    if rate_gap > 0.3 {
        [1.0, 0.0, 0.0]
    } else if rate_gap < -0.3 {
        [0.0, 0.0, 1.0]
    } else if rate_gap > 0.1 {
        [0.7, 0.3, 0.0]
    } else if rate_gap < -0.1 {
        [0.0, 0.3, 0.7]
    } else {
        [0.3, 0.4, 0.3]
    }
}

/// Ranked Probability Score of the 1X2 forecast against the heuristic
/// expected distribution. Sum of squared cumulative differences over the
/// ordered categories; lower is better, 0 is a perfect match.
pub fn rps_score(forecast: &MatchOutcomeProbs, home_rate: f64, away_rate: f64) -> f64 {
    let expected = expected_distribution(home_rate - away_rate);

    let mut f = [forecast.home_win, forecast.draw, forecast.away_win];
    let sum: f64 = f.iter().sum();
    if sum > 0.0 {
        for v in &mut f {
            *v /= sum;
        }
    }

    let cumulative_forecast = [f[0], f[0] + f[1], 1.0];
    let cumulative_expected = [expected[0], expected[0] + expected[1], 1.0];

    cumulative_forecast
        .iter()
        .zip(&cumulative_expected)
        .map(|(a, b)| (a - b).powi(2))
        .sum()
}

pub fn benchmark_report(achieved_rps: f64, cfg: &EngineConfig) -> BenchmarkReport {
    BenchmarkReport {
        target_rps: cfg.rps_benchmark,
        achieved_rps,
        benchmark_met: achieved_rps <= cfg.rps_benchmark,
    }
}
