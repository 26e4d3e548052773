use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

/// One qualified market: positive edge over the quoted price, sized by
/// capped fractional Kelly. Stake percent is in percent of bankroll.
#[derive(Debug, Clone, Serialize)]
pub struct ValueOpportunity {
    pub market: String,
    pub true_probability: f64,
    pub calibrated_probability: f64,
    pub market_odds: f64,
    pub implied_probability: f64,
    pub edge: f64,
    pub edge_percent: f64,
    pub kelly_fraction: f64,
    pub recommended_stake_percent: f64,
    pub recommended_stake_amount: f64,
    pub expected_value: f64,
    pub priority: Priority,
}

/// Full Kelly fraction f = (bp - q) / b with b = odds - 1. Zero whenever the
/// bet has no positive expectation or the inputs are degenerate. The
/// numerator is computed as `p * odds - 1`, algebraically identical but exact
/// at the fair-price boundary where `bp - q` rounds to a nonzero residue.
pub fn kelly_fraction(odds: f64, probability: f64) -> f64 {
    if probability <= 0.0 || probability >= 1.0 || odds <= 1.0 {
        return 0.0;
    }
    ((probability * odds - 1.0) / (odds - 1.0)).max(0.0)
}

fn priority(edge: f64, confidence: f64, calibration_factor: f64) -> Priority {
    let composite = edge * confidence * calibration_factor;
    if composite > 0.15 {
        Priority::Critical
    } else if composite > 0.08 {
        Priority::High
    } else if composite > 0.04 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Scans every market present in both the simulation output and the quote
/// map, and returns the qualifying opportunities sorted by edge percent,
/// best first.
pub fn detect_value(
    simulated_markets: &BTreeMap<String, f64>,
    calibration_factor: f64,
    confidence: f64,
    market_quotes: &BTreeMap<String, f64>,
    bankroll: f64,
    cfg: &EngineConfig,
) -> Vec<ValueOpportunity> {
    let mut opportunities = Vec::new();

    for (market, &true_probability) in simulated_markets {
        let Some(&quote) = market_quotes.get(market) else {
            continue;
        };
        if quote <= 0.0 {
            debug!(market, quote, "non-positive market odd, skipping");
            continue;
        }

        let implied_probability = 1.0 / quote;
        let calibrated_probability = true_probability * calibration_factor;
        let edge = calibrated_probability - implied_probability;
        if edge <= cfg.min_edge {
            continue;
        }

        let kelly = kelly_fraction(quote, calibrated_probability);
        let stake_fraction = (kelly * cfg.kelly_multiplier * confidence).min(cfg.max_stake_fraction);
        if stake_fraction <= cfg.min_stake_fraction {
            debug!(market, stake_fraction, "stake below minimum, discarding");
            continue;
        }

        let expected_value =
            calibrated_probability * (quote - 1.0) - (1.0 - calibrated_probability);

        opportunities.push(ValueOpportunity {
            market: market.clone(),
            true_probability,
            calibrated_probability,
            market_odds: quote,
            implied_probability,
            edge,
            edge_percent: edge / implied_probability * 100.0,
            kelly_fraction: kelly,
            recommended_stake_percent: stake_fraction * 100.0,
            recommended_stake_amount: bankroll * stake_fraction,
            expected_value,
            priority: priority(edge, confidence, calibration_factor),
        });
    }

    opportunities.sort_by(|a, b| {
        b.edge_percent
            .partial_cmp(&a.edge_percent)
            .unwrap_or(Ordering::Equal)
    });
    opportunities
}
