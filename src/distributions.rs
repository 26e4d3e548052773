use rand::Rng;
use rand_distr::{Distribution, Gamma, Poisson};
use serde::{Deserialize, Serialize};

use crate::engine::EngineError;

/// Scoring means are never allowed below this after boosts are applied.
pub const RATE_FLOOR: f64 = 0.1;

/// Fallback scoring rate when a side has no usable history.
pub const DEFAULT_POISSON_RATE: f64 = 1.5;

/// Fallback negative binomial parameters when estimation is not possible.
pub const DEFAULT_NB_PARAMS: NbParams = NbParams {
    shape: 2.0,
    p: 0.5,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    Poisson,
    NegativeBinomial,
}

impl DistributionKind {
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "poisson" => Ok(Self::Poisson),
            "negative_binomial" => Ok(Self::NegativeBinomial),
            other => Err(EngineError::InvalidConfiguration(format!(
                "distribution type must be 'poisson' or 'negative_binomial', got '{other}'"
            ))),
        }
    }
}

/// Negative binomial (shape, success probability) pair. Mean is
/// `shape * (1 - p) / p`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NbParams {
    pub shape: f64,
    pub p: f64,
}

impl NbParams {
    pub fn mean(&self) -> f64 {
        self.shape * (1.0 - self.p) / self.p
    }

    /// Shifts the mean by `boost` and refits `p`, keeping the shape fixed.
    pub fn boosted(&self, boost: f64) -> NbParams {
        let mean = (self.mean() + boost).max(RATE_FLOOR);
        NbParams {
            shape: self.shape,
            p: self.shape / (self.shape + mean),
        }
    }
}

/// The closed set of scoring distributions the simulator knows how to draw
/// from. Parameters stored here already include boosts and the rate floor.
#[derive(Debug, Clone, Copy)]
pub enum ScoringModel {
    Poisson { home_rate: f64, away_rate: f64 },
    NegativeBinomial { home: NbParams, away: NbParams },
}

impl ScoringModel {
    pub fn poisson(home_rate: f64, away_rate: f64, home_boost: f64, away_boost: f64) -> Self {
        Self::Poisson {
            home_rate: (home_rate + home_boost).max(RATE_FLOOR),
            away_rate: (away_rate + away_boost).max(RATE_FLOOR),
        }
    }

    pub fn negative_binomial(
        home: NbParams,
        away: NbParams,
        home_boost: f64,
        away_boost: f64,
    ) -> Self {
        Self::NegativeBinomial {
            home: home.boosted(home_boost),
            away: away.boosted(away_boost),
        }
    }

    pub fn kind(&self) -> DistributionKind {
        match self {
            Self::Poisson { .. } => DistributionKind::Poisson,
            Self::NegativeBinomial { .. } => DistributionKind::NegativeBinomial,
        }
    }

    /// Expected goals per side under this model.
    pub fn rates(&self) -> (f64, f64) {
        match self {
            Self::Poisson {
                home_rate,
                away_rate,
            } => (*home_rate, *away_rate),
            Self::NegativeBinomial { home, away } => (home.mean(), away.mean()),
        }
    }

    /// Same distribution family with both means scaled by `share`, used for
    /// the independent first-half simulation.
    pub fn scaled(&self, share: f64) -> Self {
        match self {
            Self::Poisson {
                home_rate,
                away_rate,
            } => Self::Poisson {
                home_rate: (home_rate * share).max(RATE_FLOOR),
                away_rate: (away_rate * share).max(RATE_FLOOR),
            },
            Self::NegativeBinomial { home, away } => {
                let rescale = |params: &NbParams| {
                    let mean = (params.mean() * share).max(RATE_FLOOR);
                    NbParams {
                        shape: params.shape,
                        p: params.shape / (params.shape + mean),
                    }
                };
                Self::NegativeBinomial {
                    home: rescale(home),
                    away: rescale(away),
                }
            }
        }
    }

    /// Draws `n` independent goal counts per side. Home and away draws are
    /// independent of each other and across match instances.
    pub fn sample_goals<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> (Vec<u32>, Vec<u32>) {
        match self {
            Self::Poisson {
                home_rate,
                away_rate,
            } => (
                sample_poisson(*home_rate, n, rng),
                sample_poisson(*away_rate, n, rng),
            ),
            Self::NegativeBinomial { home, away } => (
                sample_negative_binomial(*home, n, rng),
                sample_negative_binomial(*away, n, rng),
            ),
        }
    }
}

fn sample_poisson<R: Rng + ?Sized>(rate: f64, n: usize, rng: &mut R) -> Vec<u32> {
    // Rates are floored at construction, so this only fails on non-finite input.
    let Ok(dist) = Poisson::new(rate) else {
        return vec![0; n];
    };
    (0..n).map(|_| dist.sample(rng) as u32).collect()
}

fn sample_negative_binomial<R: Rng + ?Sized>(params: NbParams, n: usize, rng: &mut R) -> Vec<u32> {
    // NB(shape, p) is a Gamma-Poisson mixture: lambda ~ Gamma(shape, (1-p)/p),
    // goals ~ Poisson(lambda).
    let scale = (1.0 - params.p) / params.p;
    let Ok(gamma) = Gamma::new(params.shape, scale) else {
        return vec![0; n];
    };
    (0..n)
        .map(|_| {
            let lambda: f64 = gamma.sample(rng);
            if lambda > 0.0 {
                match Poisson::new(lambda) {
                    Ok(dist) => dist.sample(rng) as u32,
                    Err(_) => 0,
                }
            } else {
                0
            }
        })
        .collect()
}

/// Method-of-moments Poisson rate: the sample mean, or the default when the
/// sample is empty.
pub fn estimate_poisson_rate(goals: &[u32]) -> f64 {
    if goals.is_empty() {
        return DEFAULT_POISSON_RATE;
    }
    goals.iter().map(|&g| g as f64).sum::<f64>() / goals.len() as f64
}

/// Method-of-moments negative binomial fit. Falls back to the defaults when
/// the sample is empty or not over-dispersed (variance must exceed the mean).
pub fn estimate_nb_params(goals: &[u32]) -> NbParams {
    if goals.is_empty() {
        return DEFAULT_NB_PARAMS;
    }
    let (mean, variance) = mean_variance(goals);
    if variance <= mean || mean <= 0.0 {
        return DEFAULT_NB_PARAMS;
    }

    let p = mean / variance;
    let shape = mean * p / (1.0 - p);

    NbParams {
        shape: shape.max(0.1),
        p: p.clamp(0.01, 0.99),
    }
}

/// Picks negative binomial when the sample shows clear over-dispersion
/// (variance above 1.2x the mean); Poisson otherwise, and always Poisson for
/// fewer than 3 samples.
pub fn recommend_distribution(goals: &[u32]) -> DistributionKind {
    if goals.len() < 3 {
        return DistributionKind::Poisson;
    }
    let (mean, variance) = mean_variance(goals);
    if variance > mean * 1.2 {
        DistributionKind::NegativeBinomial
    } else {
        DistributionKind::Poisson
    }
}

/// Sample mean and population variance.
fn mean_variance(goals: &[u32]) -> (f64, f64) {
    let n = goals.len() as f64;
    let mean = goals.iter().map(|&g| g as f64).sum::<f64>() / n;
    let variance = goals
        .iter()
        .map(|&g| {
            let d = g as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    (mean, variance)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn poisson_rate_defaults_without_data() {
        assert_eq!(estimate_poisson_rate(&[]), DEFAULT_POISSON_RATE);
    }

    #[test]
    fn poisson_rate_is_sample_mean() {
        let rate = estimate_poisson_rate(&[0, 1, 2, 3]);
        assert!((rate - 1.5).abs() < 1e-12);
    }

    #[test]
    fn nb_estimation_falls_back_when_not_overdispersed() {
        // Constant sample: variance 0, well below the mean.
        let params = estimate_nb_params(&[2, 2, 2, 2]);
        assert_eq!(params.shape, DEFAULT_NB_PARAMS.shape);
        assert_eq!(params.p, DEFAULT_NB_PARAMS.p);

        let empty = estimate_nb_params(&[]);
        assert_eq!(empty.p, DEFAULT_NB_PARAMS.p);
    }

    #[test]
    fn nb_estimation_preserves_sample_mean() {
        // Over-dispersed sample: mean 2.5, population variance 3.75.
        let goals = [0, 1, 1, 2, 2, 3, 5, 6];
        let (mean, variance) = {
            let n = goals.len() as f64;
            let m = goals.iter().map(|&g| g as f64).sum::<f64>() / n;
            let v = goals
                .iter()
                .map(|&g| (g as f64 - m).powi(2))
                .sum::<f64>()
                / n;
            (m, v)
        };
        assert!(variance > mean);

        let params = estimate_nb_params(&goals);
        assert!(params.p > 0.0 && params.p < 1.0);
        assert!(params.shape >= 0.1);
        // Method of moments recovers the sample mean exactly when unclamped.
        assert!((params.mean() - mean).abs() < 1e-9);
    }

    #[test]
    fn recommendation_requires_three_samples() {
        assert_eq!(recommend_distribution(&[0, 9]), DistributionKind::Poisson);
    }

    #[test]
    fn recommendation_detects_overdispersion() {
        assert_eq!(
            recommend_distribution(&[0, 0, 1, 5, 6]),
            DistributionKind::NegativeBinomial
        );
        assert_eq!(
            recommend_distribution(&[1, 1, 2, 2, 1]),
            DistributionKind::Poisson
        );
    }

    #[test]
    fn boost_shifts_nb_mean_with_fixed_shape() {
        let base = NbParams { shape: 2.0, p: 0.5 };
        let boosted = base.boosted(0.3);
        assert_eq!(boosted.shape, base.shape);
        assert!((boosted.mean() - (base.mean() + 0.3)).abs() < 1e-9);
    }

    #[test]
    fn rates_are_floored_after_boosts() {
        let model = ScoringModel::poisson(0.5, 0.5, -2.0, -2.0);
        let (home, away) = model.rates();
        assert_eq!(home, RATE_FLOOR);
        assert_eq!(away, RATE_FLOOR);

        let nb = ScoringModel::negative_binomial(DEFAULT_NB_PARAMS, DEFAULT_NB_PARAMS, -9.0, -9.0);
        let (home, away) = nb.rates();
        assert!((home - RATE_FLOOR).abs() < 1e-9);
        assert!((away - RATE_FLOOR).abs() < 1e-9);
    }

    #[test]
    fn scaled_model_halves_the_means() {
        let model = ScoringModel::poisson(1.8, 1.2, 0.0, 0.0);
        let (home, away) = model.scaled(0.45).rates();
        assert!((home - 1.8 * 0.45).abs() < 1e-9);
        assert!((away - 1.2 * 0.45).abs() < 1e-9);

        let nb = ScoringModel::negative_binomial(DEFAULT_NB_PARAMS, DEFAULT_NB_PARAMS, 0.0, 0.0);
        let (home, _) = nb.scaled(0.45).rates();
        assert!((home - DEFAULT_NB_PARAMS.mean() * 0.45).abs() < 1e-9);
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let model = ScoringModel::poisson(1.8, 1.2, 0.0, 0.0);
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        assert_eq!(model.sample_goals(256, &mut a), model.sample_goals(256, &mut b));
    }

    #[test]
    fn sample_mean_tracks_the_configured_rate() {
        let mut rng = StdRng::seed_from_u64(42);
        let model = ScoringModel::poisson(2.1, 0.9, 0.0, 0.0);
        let (home, away) = model.sample_goals(50_000, &mut rng);
        let mean = |v: &[u32]| v.iter().map(|&g| g as f64).sum::<f64>() / v.len() as f64;
        assert!((mean(&home) - 2.1).abs() < 0.05);
        assert!((mean(&away) - 0.9).abs() < 0.05);

        let nb = ScoringModel::negative_binomial(DEFAULT_NB_PARAMS, DEFAULT_NB_PARAMS, 0.5, 0.0);
        let (nb_home, nb_away) = nb.sample_goals(50_000, &mut rng);
        assert!((mean(&nb_home) - 2.5).abs() < 0.1);
        assert!((mean(&nb_away) - 2.0).abs() < 0.1);
    }

    #[test]
    fn unknown_distribution_type_is_rejected() {
        assert!(DistributionKind::parse("poisson").is_ok());
        assert!(DistributionKind::parse("Negative_Binomial").is_ok());
        let err = DistributionKind::parse("weibull").unwrap_err();
        assert!(err.to_string().contains("weibull"));
    }
}
