//! Projection of the expected corner count over the rest of the window.
//!
//! Every model works on the same clock: `remaining = total - elapsed`,
//! floored at zero. A closed window projects nothing regardless of model.
//!
//! Models implemented:
//! - **FixedAverage**: league (or team-weighted) average spread evenly over
//!   the window
//! - **BlendedObserved**: theoretical projection mixed with the in-match
//!   rate, trusting the observed rate more as the clock runs
//! - **SegmentedSchedule**: per-minute base rate scaled by a time-of-window
//!   multiplier table

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::schedule::{BlendSchedule, SegmentSchedule};
use crate::error::{EngineError, EngineResult};
use crate::models::{MatchState, TeamAverages};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum RateModel {
    FixedAverage {
        average_per_match: f64,
    },
    BlendedObserved {
        /// Corners per match used for the theoretical projection.
        league_average: f64,
        blend: BlendSchedule,
        /// Applied in order to the observed projection.
        manual_multipliers: Vec<f64>,
    },
    SegmentedSchedule {
        base_rate_per_minute: f64,
        segments: SegmentSchedule,
    },
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Expected number of further corners in the remaining window.
pub fn estimate_lambda(state: &MatchState, model: &RateModel) -> EngineResult<f64> {
    if state.minutes_total == 0 {
        return Err(EngineError::config("minutes_total must be positive"));
    }
    validate_model(model)?;

    let remaining = state.remaining_minutes();
    if remaining == 0 {
        debug!(
            elapsed = state.minutes_elapsed,
            total = state.minutes_total,
            "Window closed, projecting zero corners"
        );
        return Ok(0.0);
    }

    let lambda = match model {
        RateModel::FixedAverage { average_per_match } => {
            theoretical_projection(*average_per_match, state.minutes_total, remaining)
        }
        RateModel::BlendedObserved {
            league_average,
            blend,
            manual_multipliers,
        } => {
            let theoretical =
                theoretical_projection(*league_average, state.minutes_total, remaining);
            let observed = observed_projection(state, remaining)
                * manual_multipliers.iter().product::<f64>();
            let w = blend.weight_at(state.minutes_elapsed);
            debug!(
                theoretical,
                observed,
                weight = w,
                "Blending theoretical and observed projections"
            );
            (1.0 - w) * theoretical + w * observed
        }
        RateModel::SegmentedSchedule {
            base_rate_per_minute,
            segments,
        } => {
            let weighted_minutes = segments
                .integrate(state.minutes_elapsed, state.minutes_total)
                .map_err(|minute| {
                    EngineError::config(format!("no segment covers minute {minute}"))
                })?;
            base_rate_per_minute * weighted_minutes
        }
    };

    debug!(remaining, lambda, "Projected remaining corners");
    Ok(lambda.max(0.0))
}

/// Weighted match average from team splits: the mean of total corners won
/// and total corners conceded by both sides.
pub fn weighted_match_average(teams: &TeamAverages) -> f64 {
    let won = teams.home_for + teams.away_for;
    let conceded = teams.home_against + teams.away_against;
    (won + conceded) / 2.0
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn theoretical_projection(average_per_match: f64, minutes_total: u32, remaining: u32) -> f64 {
    average_per_match / minutes_total as f64 * remaining as f64
}

fn observed_projection(state: &MatchState, remaining: u32) -> f64 {
    if state.minutes_elapsed == 0 {
        return 0.0;
    }
    let per_minute = state.events_so_far as f64 / state.minutes_elapsed as f64;
    per_minute * remaining as f64
}

fn validate_model(model: &RateModel) -> EngineResult<()> {
    match model {
        RateModel::FixedAverage { average_per_match } => {
            positive("average_per_match", *average_per_match)
        }
        RateModel::BlendedObserved {
            league_average,
            blend,
            manual_multipliers,
        } => {
            positive("league_average", *league_average)?;
            blend.validate()?;
            for (i, m) in manual_multipliers.iter().enumerate() {
                if !m.is_finite() || *m < 0.0 {
                    return Err(EngineError::config(format!(
                        "manual multiplier #{i} must be a non-negative number, got {m}"
                    )));
                }
            }
            Ok(())
        }
        RateModel::SegmentedSchedule {
            base_rate_per_minute,
            segments,
        } => {
            if !base_rate_per_minute.is_finite() || *base_rate_per_minute < 0.0 {
                return Err(EngineError::config(format!(
                    "base_rate_per_minute must be a non-negative number, got {base_rate_per_minute}"
                )));
            }
            segments.validate()
        }
    }
}

fn positive(name: &str, v: f64) -> EngineResult<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(EngineError::config(format!("{name} must be positive, got {v}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::schedule::{BlendStep, Segment};
    use approx::assert_relative_eq;

    fn state(elapsed: u32, total: u32, events: u32) -> MatchState {
        MatchState {
            minutes_elapsed: elapsed,
            minutes_total: total,
            events_so_far: events,
        }
    }

    fn blended(multipliers: Vec<f64>) -> RateModel {
        RateModel::BlendedObserved {
            league_average: 10.0,
            blend: BlendSchedule::default(),
            manual_multipliers: multipliers,
        }
    }

    #[test]
    fn fixed_average_sixty_minutes_in() {
        let model = RateModel::FixedAverage {
            average_per_match: 10.0,
        };
        let lambda = estimate_lambda(&state(60, 95, 4), &model).unwrap();
        // 10 / 95 * 35
        assert_relative_eq!(lambda, 3.684_210_526, epsilon = 1e-6);
    }

    #[test]
    fn closed_window_projects_zero_for_every_model() {
        let models = [
            RateModel::FixedAverage {
                average_per_match: 10.0,
            },
            blended(vec![1.4]),
            RateModel::SegmentedSchedule {
                base_rate_per_minute: 0.2,
                segments: SegmentSchedule::default(),
            },
        ];
        for model in &models {
            assert_eq!(estimate_lambda(&state(95, 95, 7), model).unwrap(), 0.0);
            assert_eq!(estimate_lambda(&state(110, 95, 7), model).unwrap(), 0.0);
        }
    }

    #[test]
    fn zero_length_window_is_a_configuration_error() {
        let model = RateModel::FixedAverage {
            average_per_match: 10.0,
        };
        let err = estimate_lambda(&state(0, 0, 0), &model).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }

    #[test]
    fn non_positive_average_is_rejected() {
        let model = RateModel::FixedAverage {
            average_per_match: 0.0,
        };
        assert!(estimate_lambda(&state(10, 95, 1), &model).is_err());
        let model = RateModel::FixedAverage {
            average_per_match: f64::NAN,
        };
        assert!(estimate_lambda(&state(10, 95, 1), &model).is_err());
    }

    #[test]
    fn blended_mixes_theoretical_and_observed() {
        // 60', 4 corners: observed 4/60*35 = 2.333, theoretical 3.684, w = 0.70
        let lambda = estimate_lambda(&state(60, 95, 4), &blended(vec![1.0, 1.0])).unwrap();
        let theoretical = 10.0 / 95.0 * 35.0;
        let observed = 4.0 / 60.0 * 35.0;
        assert_relative_eq!(lambda, 0.3 * theoretical + 0.7 * observed, epsilon = 1e-9);
    }

    #[test]
    fn blended_applies_every_manual_multiplier_to_observed_only() {
        let base = estimate_lambda(&state(60, 95, 4), &blended(vec![])).unwrap();
        let boosted = estimate_lambda(&state(60, 95, 4), &blended(vec![1.2, 1.0, 1.5])).unwrap();
        let observed = 4.0 / 60.0 * 35.0;
        assert_relative_eq!(boosted - base, 0.7 * observed * (1.8 - 1.0), epsilon = 1e-9);
    }

    #[test]
    fn blended_at_kickoff_uses_theoretical_share_only() {
        // No minutes played: observed rate is zero, not a division by zero
        let lambda = estimate_lambda(&state(0, 95, 0), &blended(vec![1.4])).unwrap();
        assert_relative_eq!(lambda, 0.65 * 10.0, epsilon = 1e-9);
    }

    #[test]
    fn blended_rejects_negative_multiplier() {
        let err = estimate_lambda(&state(30, 95, 3), &blended(vec![1.0, -0.5])).unwrap_err();
        assert!(err.to_string().contains("multiplier #1"));
    }

    #[test]
    fn blended_accepts_single_step_schedule() {
        let model = RateModel::BlendedObserved {
            league_average: 10.0,
            blend: BlendSchedule::new(vec![BlendStep {
                from_minute: 0,
                weight: 0.5,
            }])
            .unwrap(),
            manual_multipliers: vec![],
        };
        let lambda = estimate_lambda(&state(30, 95, 3), &model).unwrap();
        let expected = 0.5 * (10.0 / 95.0 * 65.0) + 0.5 * (3.0 / 30.0 * 65.0);
        assert_relative_eq!(lambda, expected, epsilon = 1e-9);
    }

    #[test]
    fn blended_rejects_decreasing_schedule_loaded_from_json() {
        // Deserialisation skips the constructor, so the estimator re-checks
        let blend: BlendSchedule = serde_json::from_str(
            r#"[{"from_minute":0,"weight":0.8},{"from_minute":45,"weight":0.2}]"#,
        )
        .unwrap();
        let model = RateModel::BlendedObserved {
            league_average: 10.0,
            blend,
            manual_multipliers: vec![],
        };
        let err = estimate_lambda(&state(30, 95, 3), &model).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }

    #[test]
    fn segmented_sums_base_rate_times_multiplier() {
        let segments = SegmentSchedule::new(vec![
            Segment {
                start: 0,
                end: 45,
                multiplier: 1.0,
            },
            Segment {
                start: 45,
                end: 95,
                multiplier: 2.0,
            },
        ])
        .unwrap();
        let model = RateModel::SegmentedSchedule {
            base_rate_per_minute: 0.1,
            segments,
        };
        // minutes 40..45 at 1.0, 45..95 at 2.0 → 5 + 100 = 105 weighted minutes
        let lambda = estimate_lambda(&state(40, 95, 3), &model).unwrap();
        assert_relative_eq!(lambda, 10.5, epsilon = 1e-9);
    }

    #[test]
    fn segmented_with_uniform_multiplier_matches_fixed_average() {
        let segments = SegmentSchedule::new(vec![Segment {
            start: 0,
            end: 95,
            multiplier: 1.0,
        }])
        .unwrap();
        let seg = RateModel::SegmentedSchedule {
            base_rate_per_minute: 10.0 / 95.0,
            segments,
        };
        let fixed = RateModel::FixedAverage {
            average_per_match: 10.0,
        };
        let s = state(37, 95, 2);
        assert_relative_eq!(
            estimate_lambda(&s, &seg).unwrap(),
            estimate_lambda(&s, &fixed).unwrap(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn segmented_uncovered_minute_is_a_configuration_error() {
        let segments = SegmentSchedule::new(vec![Segment {
            start: 0,
            end: 90,
            multiplier: 1.0,
        }])
        .unwrap();
        let model = RateModel::SegmentedSchedule {
            base_rate_per_minute: 0.1,
            segments,
        };
        let err = estimate_lambda(&state(60, 95, 3), &model).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidConfiguration("no segment covers minute 90".into())
        );
    }

    #[test]
    fn weighted_average_from_team_splits() {
        let teams = TeamAverages {
            home_for: 5.89,
            home_against: 2.95,
            away_for: 4.00,
            away_against: 4.68,
        };
        // (9.89 + 7.63) / 2
        assert_relative_eq!(weighted_match_average(&teams), 8.76, epsilon = 1e-9);
    }

    #[test]
    fn rate_model_deserializes_from_tagged_json() {
        let json = r#"{"model":"fixed_average","average_per_match":9.5}"#;
        let model: RateModel = serde_json::from_str(json).unwrap();
        assert_eq!(
            model,
            RateModel::FixedAverage {
                average_per_match: 9.5
            }
        );
    }
}
