use std::time::Instant;

use rand::RngCore;
use thiserror::Error;
use tracing::debug;

use crate::benchmark;
use crate::boosts;
use crate::calibration::{self, ContextSignals};
use crate::config::EngineConfig;
use crate::distributions::{self, DistributionKind, ScoringModel};
use crate::odds;
use crate::simulation;
use crate::types::{
    HistoricalCounts, HistoricalMatch, MatchContext, SimulationMetadata, SimulationResponse,
    SimulationResults,
};
use crate::value;

/// Fixtures per venue role pooled into parameter estimation.
const ESTIMATION_WINDOW: usize = 6;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Stateless per invocation: one engine value can serve any number of
/// simulation requests, and nothing is shared between them beyond the
/// immutable configuration.
#[derive(Debug, Clone, Default)]
pub struct SimulationEngine {
    cfg: EngineConfig,
}

impl SimulationEngine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Runs with a fresh random seed.
    pub fn run(&self, ctx: &MatchContext) -> Result<SimulationResponse, EngineError> {
        self.run_seeded(ctx, rand::thread_rng().next_u64())
    }

    /// Deterministic run: the same context and seed always reproduce the
    /// same response (timing aside).
    pub fn run_seeded(
        &self,
        ctx: &MatchContext,
        seed: u64,
    ) -> Result<SimulationResponse, EngineError> {
        let started = Instant::now();
        let kind = DistributionKind::parse(&ctx.distribution_type)?;

        let history = &ctx.historical_data;
        let boosts = boosts::compute_boosts(
            &history.home_home,
            &history.away_away,
            &ctx.boost_settings,
            self.cfg.home_advantage,
        );

        // H2H plus the recent venue-role fixtures feed parameter estimation;
        // empty pools fall back to the documented defaults inside the
        // estimators.
        let pooled: Vec<HistoricalMatch> = history
            .h2h
            .iter()
            .chain(history.home_home.iter().take(ESTIMATION_WINDOW))
            .chain(history.away_away.iter().take(ESTIMATION_WINDOW))
            .copied()
            .collect();
        let home_goals: Vec<u32> = pooled.iter().map(|m| m.home_score_ft).collect();
        let away_goals: Vec<u32> = pooled.iter().map(|m| m.away_score_ft).collect();

        let model = match kind {
            DistributionKind::Poisson => ScoringModel::poisson(
                distributions::estimate_poisson_rate(&home_goals),
                distributions::estimate_poisson_rate(&away_goals),
                boosts.home_boost,
                boosts.away_boost,
            ),
            DistributionKind::NegativeBinomial => ScoringModel::negative_binomial(
                distributions::estimate_nb_params(&home_goals),
                distributions::estimate_nb_params(&away_goals),
                boosts.home_boost,
                boosts.away_boost,
            ),
        };

        let (home_rate, away_rate) = model.rates();
        debug!(
            home_team = ctx.home_team_id,
            away_team = ctx.away_team_id,
            home_rate,
            away_rate,
            "model prepared"
        );

        let sim = simulation::run_simulation(&model, ctx.iterations, seed, &self.cfg);

        let calibration_factor =
            calibration::calibration_factor(home_rate, away_rate, sim.iterations, &self.cfg);
        let context = ContextSignals {
            h2h_count: history.h2h.len(),
            recent_form_available: !history.home_home.is_empty(),
            fixture_congestion_known: ctx.fixture_congestion_known,
        };
        let confidence = calibration::confidence_score(
            sim.iterations,
            home_rate,
            away_rate,
            &context,
            &self.cfg,
        );

        let rps = benchmark::rps_score(&sim.probabilities.match_outcomes, home_rate, away_rate);
        let report = benchmark::benchmark_report(rps, &self.cfg);
        let true_odds = odds::true_odds(&sim.probabilities, calibration_factor);

        let value_opportunities = match &ctx.bookmaker_odds {
            Some(book) => {
                let quotes = odds::flatten_bookmaker_odds(book);
                value::detect_value(
                    &sim.probabilities.flat_markets(),
                    calibration_factor,
                    confidence,
                    &quotes,
                    ctx.bankroll.unwrap_or(self.cfg.default_bankroll),
                    &self.cfg,
                )
            }
            None => Vec::new(),
        };

        let results = SimulationResults {
            probabilities: sim.probabilities,
            true_odds,
            calibration_factor,
            confidence_score: confidence,
            rps_score: rps,
            professional_grade: report.benchmark_met,
            avg_home_goals: sim.avg_home_goals,
            avg_away_goals: sim.avg_away_goals,
            avg_total_goals: sim.avg_total_goals,
            metadata: SimulationMetadata {
                distribution: kind,
                requested_iterations: sim.requested_iterations,
                iterations: sim.iterations,
                iterations_clamped: sim.iterations_clamped,
                home_rate,
                away_rate,
                boosts,
                historical_counts: HistoricalCounts {
                    h2h: history.h2h.len(),
                    home_home: history.home_home.len(),
                    away_away: history.away_away.len(),
                },
            },
        };

        Ok(SimulationResponse {
            success: true,
            results: Some(results),
            value_opportunities,
            professional_benchmark: Some(report),
            execution_time_seconds: started.elapsed().as_secs_f64(),
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HistoricalData;

    fn context(distribution: &str, iterations: u32) -> MatchContext {
        MatchContext {
            home_team_id: 10,
            away_team_id: 20,
            league_id: 1,
            distribution_type: distribution.to_string(),
            iterations,
            boost_settings: Default::default(),
            bookmaker_odds: None,
            historical_data: HistoricalData::default(),
            bankroll: None,
            fixture_congestion_known: false,
            match_date: None,
        }
    }

    #[test]
    fn unknown_distribution_is_an_invalid_configuration() {
        let engine = SimulationEngine::default();
        let err = engine
            .run_seeded(&context("gaussian", 5_000), 1)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }

    #[test]
    fn empty_history_runs_on_default_parameters() {
        let engine = SimulationEngine::default();
        let response = engine.run_seeded(&context("poisson", 5_000), 1).unwrap();
        assert!(response.success);
        let results = response.results.unwrap();
        // Defaults 1.5/1.5 plus the 0.20 home advantage on the home side only.
        assert!((results.metadata.home_rate - 1.7).abs() < 1e-9);
        assert!((results.metadata.away_rate - 1.5).abs() < 1e-9);
        assert!(!results.metadata.iterations_clamped);
    }

    #[test]
    fn clamped_iterations_are_reported() {
        let engine = SimulationEngine::default();
        let response = engine.run_seeded(&context("poisson", 500), 3).unwrap();
        let meta = response.results.unwrap().metadata;
        assert_eq!(meta.requested_iterations, 500);
        assert_eq!(meta.iterations, 1_000);
        assert!(meta.iterations_clamped);
    }

    #[test]
    fn same_seed_reproduces_the_simulation() {
        let engine = SimulationEngine::default();
        let ctx = context("negative_binomial", 4_000);
        let a = engine.run_seeded(&ctx, 77).unwrap().results.unwrap();
        let b = engine.run_seeded(&ctx, 77).unwrap().results.unwrap();
        assert_eq!(
            a.probabilities.match_outcomes.home_win,
            b.probabilities.match_outcomes.home_win
        );
        assert_eq!(a.rps_score, b.rps_score);
    }
}
