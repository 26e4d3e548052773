use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::benchmark::BenchmarkReport;
use crate::boosts::Boosts;
use crate::distributions::DistributionKind;
use crate::odds::TrueOdds;
use crate::simulation::MarketProbabilities;
use crate::value::ValueOpportunity;

/// One finished fixture as aggregated by the caller. Scores are full-time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HistoricalMatch {
    pub home_score_ft: u32,
    pub away_score_ft: u32,
}

/// Pre-aggregated history for a pairing, newest fixture first.
///
/// `home_home` holds the home side's recent fixtures in its home role,
/// `away_away` the away side's in its away role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoricalData {
    #[serde(default)]
    pub h2h: Vec<HistoricalMatch>,
    #[serde(default)]
    pub home_home: Vec<HistoricalMatch>,
    #[serde(default)]
    pub away_away: Vec<HistoricalMatch>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BoostSettings {
    /// Overrides the configured home advantage when present.
    #[serde(default)]
    pub home_advantage: Option<f64>,
    #[serde(default)]
    pub custom_home_boost: f64,
    #[serde(default)]
    pub custom_away_boost: f64,
}

/// Bookmaker odds as the UI ships them: nested per market family.
/// `odds::flatten_bookmaker_odds` turns this into the flat key form the
/// value detector works on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookmakerOdds {
    #[serde(rename = "1x2", default, skip_serializing_if = "Option::is_none")]
    pub match_result: Option<MatchResultOdds>,
    /// Keyed `ou15`, `ou25`, ... `ou55`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub over_under: BTreeMap<String, OverUnderOdds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub both_teams_score: Option<YesNoOdds>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatchResultOdds {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OverUnderOdds {
    pub over: f64,
    pub under: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct YesNoOdds {
    pub yes: f64,
    pub no: f64,
}

/// A single simulation request. Immutable input; historical aggregates and
/// market quotes must be fully resolved by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchContext {
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub league_id: u32,
    #[serde(default = "default_distribution_type")]
    pub distribution_type: String,
    pub iterations: u32,
    #[serde(default)]
    pub boost_settings: BoostSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmaker_odds: Option<BookmakerOdds>,
    #[serde(default)]
    pub historical_data: HistoricalData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bankroll: Option<f64>,
    #[serde(default)]
    pub fixture_congestion_known: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_date: Option<NaiveDate>,
}

fn default_distribution_type() -> String {
    "poisson".to_string()
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HistoricalCounts {
    pub h2h: usize,
    pub home_home: usize,
    pub away_away: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationMetadata {
    pub distribution: DistributionKind,
    pub requested_iterations: u32,
    pub iterations: u32,
    pub iterations_clamped: bool,
    pub home_rate: f64,
    pub away_rate: f64,
    pub boosts: Boosts,
    pub historical_counts: HistoricalCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResults {
    pub probabilities: MarketProbabilities,
    pub true_odds: TrueOdds,
    pub calibration_factor: f64,
    pub confidence_score: f64,
    pub rps_score: f64,
    pub professional_grade: bool,
    pub avg_home_goals: f64,
    pub avg_away_goals: f64,
    pub avg_total_goals: f64,
    pub metadata: SimulationMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<SimulationResults>,
    pub value_opportunities: Vec<ValueOpportunity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional_benchmark: Option<BenchmarkReport>,
    pub execution_time_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SimulationResponse {
    pub fn failure(error: impl Into<String>, elapsed_seconds: f64) -> Self {
        Self {
            success: false,
            results: None,
            value_opportunities: Vec::new(),
            professional_benchmark: None,
            execution_time_seconds: elapsed_seconds,
            error: Some(error.into()),
        }
    }
}
