use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::simulation::MarketProbabilities;
use crate::types::BookmakerOdds;

/// Sentinel decimal odd for zero or negative probabilities.
pub const MAX_ODDS: f64 = 999.99;

/// Calibrated probabilities are floored here before inversion, capping true
/// odds at 100.
const PROBABILITY_FLOOR: f64 = 0.01;

/// Decimal odds for a raw probability, rounded to 2 decimals. Non-positive
/// probabilities map to the sentinel max odd instead of failing.
pub fn probability_to_odds(probability: f64) -> f64 {
    if probability > 0.0 {
        (1.0 / probability * 100.0).round() / 100.0
    } else {
        MAX_ODDS
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MatchOutcomeOdds {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct YesNoTrueOdds {
    pub yes: f64,
    pub no: f64,
}

/// Fair decimal odds per market, mirroring the probability tree.
#[derive(Debug, Clone, Serialize)]
pub struct TrueOdds {
    pub match_outcomes: MatchOutcomeOdds,
    pub goal_markets: BTreeMap<String, f64>,
    pub btts: YesNoTrueOdds,
    pub first_half: BTreeMap<String, f64>,
}

fn calibrated_odd(probability: f64, calibration_factor: f64) -> f64 {
    1.0 / (probability * calibration_factor).max(PROBABILITY_FLOOR)
}

/// Converts every simulated probability into a fair decimal odd after
/// applying the calibration factor.
pub fn true_odds(probabilities: &MarketProbabilities, calibration_factor: f64) -> TrueOdds {
    let odd = |p: f64| calibrated_odd(p, calibration_factor);
    TrueOdds {
        match_outcomes: MatchOutcomeOdds {
            home_win: odd(probabilities.match_outcomes.home_win),
            draw: odd(probabilities.match_outcomes.draw),
            away_win: odd(probabilities.match_outcomes.away_win),
        },
        goal_markets: probabilities
            .goal_markets
            .iter()
            .map(|(key, p)| (key.clone(), odd(*p)))
            .collect(),
        btts: YesNoTrueOdds {
            yes: odd(probabilities.btts.yes),
            no: odd(probabilities.btts.no),
        },
        first_half: probabilities
            .first_half
            .iter()
            .map(|(key, p)| (key.clone(), odd(*p)))
            .collect(),
    }
}

/// Translates the nested UI odds shape into the flat market-key form the
/// value detector consumes (`1x2_home`, `goals_over_2_5`, `btts_yes`, ...).
/// Unrecognized over/under keys are skipped, not fatal.
pub fn flatten_bookmaker_odds(odds: &BookmakerOdds) -> BTreeMap<String, f64> {
    let mut flat = BTreeMap::new();

    if let Some(result) = &odds.match_result {
        flat.insert("1x2_home".to_string(), result.home);
        flat.insert("1x2_draw".to_string(), result.draw);
        flat.insert("1x2_away".to_string(), result.away);
    }

    for (key, pair) in &odds.over_under {
        let Some(line) = parse_ou_key(key) else {
            warn!(key, "unrecognized over/under market key, skipping");
            continue;
        };
        flat.insert(format!("goals_over_{line}"), pair.over);
        flat.insert(format!("goals_under_{line}"), pair.under);
    }

    if let Some(btts) = &odds.both_teams_score {
        flat.insert("btts_yes".to_string(), btts.yes);
        flat.insert("btts_no".to_string(), btts.no);
    }

    flat
}

/// `ou25` -> `2_5`, `ou15` -> `1_5`, etc.
fn parse_ou_key(key: &str) -> Option<String> {
    let digits = key.strip_prefix("ou")?;
    if digits.len() != 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}_{}", &digits[..1], &digits[1..]))
}
