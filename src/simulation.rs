use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::distributions::ScoringModel;

/// Full-time goal-total lines quoted as markets.
pub const GOAL_LINES: [f64; 5] = [1.5, 2.5, 3.5, 4.5, 5.5];
/// First-half goal-total lines.
pub const FIRST_HALF_LINES: [f64; 2] = [0.5, 1.5];

/// Draws per parallel chunk. Tallies are merged by summation, so the chunk
/// size only affects scheduling, never the result.
const CHUNK_SIZE: usize = 8_192;

const STREAM_FULL_TIME: u64 = 0;
const STREAM_FIRST_HALF: u64 = 1;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MatchOutcomeProbs {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct YesNoProbs {
    pub yes: f64,
    pub no: f64,
}

/// Probabilities per market category. Within one mutually exclusive category
/// the entries sum to 1 up to floating error.
#[derive(Debug, Clone, Serialize)]
pub struct MarketProbabilities {
    pub match_outcomes: MatchOutcomeProbs,
    /// Keyed `over_1_5`, `under_1_5`, ... `under_5_5`.
    pub goal_markets: BTreeMap<String, f64>,
    pub btts: YesNoProbs,
    /// Keyed `over_0_5`, `under_0_5`, `over_1_5`, `under_1_5`. Drawn from an
    /// independent simulation at the first-half share of each side's mean, so
    /// these are not a decomposition of the full-time numbers.
    pub first_half: BTreeMap<String, f64>,
}

impl MarketProbabilities {
    /// Flat market keys scanned for value: `1x2_*`, `goals_*`, `btts_*`.
    /// First-half markets are reported but not value-scanned.
    pub fn flat_markets(&self) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        out.insert("1x2_home".to_string(), self.match_outcomes.home_win);
        out.insert("1x2_draw".to_string(), self.match_outcomes.draw);
        out.insert("1x2_away".to_string(), self.match_outcomes.away_win);
        for (key, prob) in &self.goal_markets {
            out.insert(format!("goals_{key}"), *prob);
        }
        out.insert("btts_yes".to_string(), self.btts.yes);
        out.insert("btts_no".to_string(), self.btts.no);
        out
    }
}

#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub probabilities: MarketProbabilities,
    pub avg_home_goals: f64,
    pub avg_away_goals: f64,
    pub avg_total_goals: f64,
    pub requested_iterations: u32,
    pub iterations: u32,
    pub iterations_clamped: bool,
}

/// Per-chunk counters for the full-time draw. Merging is plain summation, so
/// chunk order is irrelevant.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    home_wins: u64,
    draws: u64,
    away_wins: u64,
    over: [u64; GOAL_LINES.len()],
    under: [u64; GOAL_LINES.len()],
    btts: u64,
    home_goals: u64,
    away_goals: u64,
}

impl Tally {
    fn record(&mut self, home: u32, away: u32) {
        if home > away {
            self.home_wins += 1;
        } else if home < away {
            self.away_wins += 1;
        } else {
            self.draws += 1;
        }

        let total = (home + away) as f64;
        for (i, line) in GOAL_LINES.iter().enumerate() {
            if total > *line {
                self.over[i] += 1;
            }
            // Counted independently of "over"; for half-goal lines this is
            // exactly the complement.
            if total < *line {
                self.under[i] += 1;
            }
        }

        if home > 0 && away > 0 {
            self.btts += 1;
        }
        self.home_goals += home as u64;
        self.away_goals += away as u64;
    }

    fn merge(mut self, other: Tally) -> Tally {
        self.home_wins += other.home_wins;
        self.draws += other.draws;
        self.away_wins += other.away_wins;
        for i in 0..GOAL_LINES.len() {
            self.over[i] += other.over[i];
            self.under[i] += other.under[i];
        }
        self.btts += other.btts;
        self.home_goals += other.home_goals;
        self.away_goals += other.away_goals;
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct HalfTally {
    over: [u64; FIRST_HALF_LINES.len()],
    under: [u64; FIRST_HALF_LINES.len()],
}

impl HalfTally {
    fn record(&mut self, home: u32, away: u32) {
        let total = (home + away) as f64;
        for (i, line) in FIRST_HALF_LINES.iter().enumerate() {
            if total > *line {
                self.over[i] += 1;
            }
            if total < *line {
                self.under[i] += 1;
            }
        }
    }

    fn merge(mut self, other: HalfTally) -> HalfTally {
        for i in 0..FIRST_HALF_LINES.len() {
            self.over[i] += other.over[i];
            self.under[i] += other.under[i];
        }
        self
    }
}

/// Per-chunk RNG seed. Mixing the stream and chunk index in keeps the two
/// simulation passes and all chunks on disjoint, reproducible streams.
fn chunk_seed(base: u64, stream: u64, chunk: u64) -> u64 {
    let mut z = base
        ^ stream.rotate_left(32)
        ^ chunk.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn tally_pass<T>(
    model: &ScoringModel,
    iterations: usize,
    base_seed: u64,
    stream: u64,
    record: impl Fn(&mut T, u32, u32) + Sync,
    merge: impl Fn(T, T) -> T + Sync + Send,
) -> T
where
    T: Default + Send,
{
    let chunks = iterations.div_ceil(CHUNK_SIZE);
    (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * CHUNK_SIZE;
            let len = CHUNK_SIZE.min(iterations - start);
            let mut rng = StdRng::seed_from_u64(chunk_seed(base_seed, stream, chunk as u64));
            let (home, away) = model.sample_goals(len, &mut rng);
            let mut tally = T::default();
            for (h, a) in home.iter().zip(&away) {
                record(&mut tally, *h, *a);
            }
            tally
        })
        .reduce(T::default, merge)
}

fn line_key(prefix: &str, line: f64) -> String {
    format!("{prefix}_{}_{}", line.trunc() as u32, 5)
}

/// Draws N independent (home, away) goal pairs from `model` plus an
/// independent first-half pass, and tallies outcome and market frequencies
/// into probabilities. Pure function of (model, iterations, seed).
pub fn run_simulation(
    model: &ScoringModel,
    requested_iterations: u32,
    seed: u64,
    cfg: &EngineConfig,
) -> SimulationOutcome {
    let iterations = requested_iterations.max(cfg.min_iterations);
    let iterations_clamped = iterations != requested_iterations;
    if iterations_clamped {
        warn!(
            requested = requested_iterations,
            effective = iterations,
            "iteration count below professional minimum, raising"
        );
    }

    let (home_rate, away_rate) = model.rates();
    debug!(home_rate, away_rate, iterations, seed, "running simulation");

    let n = iterations as usize;
    let tally = tally_pass(
        model,
        n,
        seed,
        STREAM_FULL_TIME,
        Tally::record,
        Tally::merge,
    );
    let half_model = model.scaled(cfg.first_half_share);
    let half = tally_pass(
        &half_model,
        n,
        seed,
        STREAM_FIRST_HALF,
        HalfTally::record,
        HalfTally::merge,
    );

    let denom = n as f64;
    let mut goal_markets = BTreeMap::new();
    for (i, line) in GOAL_LINES.iter().enumerate() {
        goal_markets.insert(line_key("over", *line), tally.over[i] as f64 / denom);
        goal_markets.insert(line_key("under", *line), tally.under[i] as f64 / denom);
    }

    let mut first_half = BTreeMap::new();
    for (i, line) in FIRST_HALF_LINES.iter().enumerate() {
        first_half.insert(line_key("over", *line), half.over[i] as f64 / denom);
        first_half.insert(line_key("under", *line), half.under[i] as f64 / denom);
    }

    SimulationOutcome {
        probabilities: MarketProbabilities {
            match_outcomes: MatchOutcomeProbs {
                home_win: tally.home_wins as f64 / denom,
                draw: tally.draws as f64 / denom,
                away_win: tally.away_wins as f64 / denom,
            },
            goal_markets,
            btts: YesNoProbs {
                yes: tally.btts as f64 / denom,
                no: (n as u64 - tally.btts) as f64 / denom,
            },
            first_half,
        },
        avg_home_goals: tally.home_goals as f64 / denom,
        avg_away_goals: tally.away_goals as f64 / denom,
        avg_total_goals: (tally.home_goals + tally.away_goals) as f64 / denom,
        requested_iterations,
        iterations,
        iterations_clamped,
    }
}
