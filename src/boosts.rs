use serde::Serialize;

use crate::types::{BoostSettings, HistoricalMatch};

/// How many recent fixtures in the side's venue role are inspected.
pub const STREAK_WINDOW: usize = 6;
/// Streaks only count once the lookback window holds this many fixtures.
pub const STREAK_MIN_MATCHES: usize = 5;

const UNBEATEN_STEP: f64 = 0.02;
const UNBEATEN_CAP: f64 = 0.10;
const LOSING_STEP: f64 = 0.024;
const LOSING_CAP: f64 = 0.12;

/// Additive rate adjustments fed into the scoring model.
///
/// Asymmetric on purpose: the fixed home advantage only ever enters
/// `home_boost`. `home_boost`/`away_boost` are the totals the model consumes.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Boosts {
    pub home_advantage: f64,
    pub home_streak_boost: f64,
    pub away_streak_boost: f64,
    pub home_boost: f64,
    pub away_boost: f64,
}

#[derive(Debug, Clone, Copy)]
enum Venue {
    Home,
    Away,
}

fn result_pair(fixture: &HistoricalMatch, venue: Venue) -> (u32, u32) {
    match venue {
        Venue::Home => (fixture.home_score_ft, fixture.away_score_ft),
        Venue::Away => (fixture.away_score_ft, fixture.home_score_ft),
    }
}

/// Consecutive fixtures from the most recent backwards where the side did
/// not lose, stopping at the first break.
fn unbeaten_streak(recent: &[HistoricalMatch], venue: Venue) -> usize {
    recent
        .iter()
        .take_while(|m| {
            let (own, opp) = result_pair(m, venue);
            own >= opp
        })
        .count()
}

/// Consecutive losses from the most recent fixture backwards.
fn losing_streak(recent: &[HistoricalMatch], venue: Venue) -> usize {
    recent
        .iter()
        .take_while(|m| {
            let (own, opp) = result_pair(m, venue);
            own < opp
        })
        .count()
}

/// Streak contribution for one side. The two streak classes are mutually
/// exclusive; unbeaten takes precedence when both would qualify.
fn streak_boost(recent: &[HistoricalMatch], venue: Venue) -> f64 {
    let window = &recent[..recent.len().min(STREAK_WINDOW)];
    if window.len() < STREAK_MIN_MATCHES {
        return 0.0;
    }

    let unbeaten = unbeaten_streak(window, venue);
    let losing = losing_streak(window, venue);

    if unbeaten >= STREAK_MIN_MATCHES {
        (unbeaten as f64 * UNBEATEN_STEP).min(UNBEATEN_CAP)
    } else if losing >= STREAK_MIN_MATCHES {
        (losing as f64 * LOSING_STEP).min(LOSING_CAP)
    } else {
        0.0
    }
}

/// Derives the full boost record from recent venue-role form and the caller's
/// boost settings. `home_recent`/`away_recent` are newest-first.
pub fn compute_boosts(
    home_recent: &[HistoricalMatch],
    away_recent: &[HistoricalMatch],
    settings: &BoostSettings,
    default_home_advantage: f64,
) -> Boosts {
    let home_advantage = settings.home_advantage.unwrap_or(default_home_advantage);
    let home_streak_boost = streak_boost(home_recent, Venue::Home);
    let away_streak_boost = streak_boost(away_recent, Venue::Away);

    Boosts {
        home_advantage,
        home_streak_boost,
        away_streak_boost,
        home_boost: home_advantage + home_streak_boost + settings.custom_home_boost,
        away_boost: away_streak_boost + settings.custom_away_boost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(home: u32, away: u32) -> HistoricalMatch {
        HistoricalMatch {
            home_score_ft: home,
            away_score_ft: away,
        }
    }

    #[test]
    fn unbeaten_run_earns_capped_boost() {
        // Five straight home results without defeat (draws count).
        let recent = vec![m(2, 0), m(1, 1), m(3, 1), m(0, 0), m(2, 1)];
        let boosts = compute_boosts(&recent, &[], &BoostSettings::default(), 0.20);
        assert!((boosts.home_streak_boost - 0.10).abs() < 1e-12);
        assert!((boosts.home_boost - 0.30).abs() < 1e-12);
        assert_eq!(boosts.away_streak_boost, 0.0);
        assert_eq!(boosts.away_boost, 0.0);
    }

    #[test]
    fn streak_stops_at_first_break() {
        // Loss in slot 2 cuts the streak to 2, below the minimum.
        let recent = vec![m(2, 0), m(1, 0), m(0, 1), m(3, 0), m(2, 0), m(1, 0)];
        let boosts = compute_boosts(&recent, &[], &BoostSettings::default(), 0.20);
        assert_eq!(boosts.home_streak_boost, 0.0);
    }

    #[test]
    fn short_window_earns_nothing() {
        let recent = vec![m(2, 0), m(1, 0), m(3, 0), m(2, 1)];
        let boosts = compute_boosts(&recent, &[], &BoostSettings::default(), 0.20);
        assert_eq!(boosts.home_streak_boost, 0.0);
    }

    #[test]
    fn losing_streak_uses_its_own_scale() {
        // Away side lost six straight in its away role.
        let recent = vec![m(2, 0), m(3, 1), m(1, 0), m(2, 1), m(4, 0), m(1, 0)];
        let boosts = compute_boosts(&[], &recent, &BoostSettings::default(), 0.20);
        assert!((boosts.away_streak_boost - 0.12).abs() < 1e-12);
    }

    #[test]
    fn window_is_capped_at_six_fixtures() {
        // Seventh fixture (a heavy loss) must not break the streak count.
        let mut recent = vec![m(1, 0); 6];
        recent.push(m(0, 5));
        let boosts = compute_boosts(&recent, &[], &BoostSettings::default(), 0.20);
        assert!((boosts.home_streak_boost - 0.10).abs() < 1e-12);
    }

    #[test]
    fn custom_boosts_and_advantage_override_are_additive() {
        let settings = BoostSettings {
            home_advantage: Some(0.10),
            custom_home_boost: 0.05,
            custom_away_boost: 0.07,
        };
        let boosts = compute_boosts(&[], &[], &settings, 0.20);
        assert!((boosts.home_advantage - 0.10).abs() < 1e-12);
        assert!((boosts.home_boost - 0.15).abs() < 1e-12);
        assert!((boosts.away_boost - 0.07).abs() < 1e-12);
    }
}
