/// Immutable engine configuration.
///
/// One value is built per engine instance and never mutated afterwards, so
/// several engines with different settings can run side by side.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Industry benchmark RPS; forecasts at or below it count as professional grade.
    pub rps_benchmark: f64,
    /// Fraction of full Kelly actually staked.
    pub kelly_multiplier: f64,
    /// Hard cap on the recommended stake, as a fraction of bankroll.
    pub max_stake_fraction: f64,
    /// Opportunities sized below this fraction are discarded as noise.
    pub min_stake_fraction: f64,
    /// Minimum calibrated-vs-implied edge for a market to qualify.
    pub min_edge: f64,
    /// Requests below this iteration count are raised to it, not rejected.
    pub min_iterations: u32,
    /// Iteration count at which the iteration confidence factor saturates.
    pub optimal_iterations: u32,
    /// Weight of rate balance in the calibration factor.
    pub balance_weight: f64,
    /// Weight of the iteration factor in the calibration factor.
    pub iteration_weight: f64,
    /// Calibration factor bounds.
    pub calibration_floor: f64,
    pub calibration_cap: f64,
    /// Confidence score cap.
    pub confidence_cap: f64,
    /// Goals added to the home side's rate before simulation.
    pub home_advantage: f64,
    /// Share of each side's full-time mean used for the first-half simulation.
    pub first_half_share: f64,
    /// Bankroll assumed when the caller does not supply one.
    pub default_bankroll: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rps_benchmark: 0.2012,
            kelly_multiplier: 0.25,
            max_stake_fraction: 0.025,
            min_stake_fraction: 0.005,
            min_edge: 0.02,
            min_iterations: 1_000,
            optimal_iterations: 100_000,
            balance_weight: 0.7,
            iteration_weight: 0.3,
            calibration_floor: 0.75,
            calibration_cap: 0.95,
            confidence_cap: 0.95,
            home_advantage: 0.20,
            first_half_share: 0.45,
            default_bankroll: 1_000.0,
        }
    }
}
