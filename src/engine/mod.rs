pub mod distribution;
pub mod kelly;
pub mod market;
pub mod rate;
pub mod schedule;
pub mod veto;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::{BettingLine, Evaluation, LineKind, MatchState, Pace, TeamAverages};
use crate::settings::Settings;

pub use rate::RateModel;

/// Which rate model the caller wants; missing values come from settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum RateSelection {
    Fixed {
        #[serde(default)]
        average_per_match: Option<f64>,
        #[serde(default)]
        teams: Option<TeamAverages>,
    },
    Blended {
        #[serde(default)]
        league_average: Option<f64>,
        #[serde(default)]
        teams: Option<TeamAverages>,
    },
    Segmented {
        #[serde(default)]
        base_rate_per_minute: Option<f64>,
    },
}

impl Default for RateSelection {
    fn default() -> Self {
        RateSelection::Fixed {
            average_per_match: None,
            teams: None,
        }
    }
}

/// One evaluation as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub state: MatchState,
    pub line: BettingLine,
    #[serde(default)]
    pub rate: RateSelection,
    #[serde(default)]
    pub pace: Option<Pace>,
    pub bankroll: f64,
    /// Overrides the settings Kelly multiplier.
    #[serde(default)]
    pub kelly_fraction: Option<f64>,
}

impl EvaluationRequest {
    /// Check caller inputs and classify the line.
    pub fn validate(&self) -> EngineResult<LineKind> {
        let kind = self.line.validate()?;
        if !self.bankroll.is_finite() || self.bankroll < 0.0 {
            return Err(EngineError::input(format!(
                "bankroll must be a non-negative amount, got {}",
                self.bankroll
            )));
        }
        if let Some(k) = self.kelly_fraction {
            if !(k > 0.0 && k <= 1.0) {
                return Err(EngineError::input(format!(
                    "kelly_fraction must be in (0, 1], got {k}"
                )));
            }
        }
        Ok(kind)
    }
}

/// Turn a caller's rate selection into a concrete model.
pub fn resolve_rate_model(
    selection: &RateSelection,
    pace: Option<Pace>,
    settings: &Settings,
) -> EngineResult<RateModel> {
    let average = |explicit: Option<f64>, teams: &Option<TeamAverages>| -> EngineResult<f64> {
        match (explicit, teams) {
            (Some(a), _) => Ok(a),
            (None, Some(t)) => {
                t.validate()?;
                Ok(rate::weighted_match_average(t))
            }
            (None, None) => Ok(settings.league_average),
        }
    };

    Ok(match selection {
        RateSelection::Fixed {
            average_per_match,
            teams,
        } => RateModel::FixedAverage {
            average_per_match: average(*average_per_match, teams)?,
        },
        RateSelection::Blended {
            league_average,
            teams,
        } => RateModel::BlendedObserved {
            league_average: average(*league_average, teams)?,
            blend: settings.blend.clone(),
            manual_multipliers: settings.manual_multipliers(pace),
        },
        RateSelection::Segmented {
            base_rate_per_minute,
        } => RateModel::SegmentedSchedule {
            base_rate_per_minute: base_rate_per_minute
                .unwrap_or_else(|| settings.base_rate_per_minute()),
            segments: settings.segments.clone(),
        },
    })
}

/// Run the full pipeline: rate, distribution, veto, market.
pub fn evaluate(request: &EvaluationRequest, settings: &Settings) -> EngineResult<Evaluation> {
    let line_kind = request.validate()?;
    let model = resolve_rate_model(&request.rate, request.pace, settings)?;

    let state = &request.state;
    let lambda = rate::estimate_lambda(state, &model)?;
    let probabilities = distribution::evaluate(
        request.line.threshold,
        state.events_so_far,
        lambda,
        &settings.distribution,
    )?;
    debug!(
        lambda,
        p_over = probabilities.p_over,
        p_under = probabilities.p_under,
        p_push = probabilities.p_push,
        "Outcome probabilities"
    );

    let veto_reasons = veto::check(state, &request.line, request.pace, &settings.veto);
    let result = if veto_reasons.is_empty() {
        market::evaluate_market(
            &probabilities,
            &request.line,
            request.bankroll,
            request.kelly_fraction.unwrap_or(settings.kelly_fraction),
            settings.min_edge,
        )
    } else {
        debug!(?veto_reasons, "Veto fired, skipping stake sizing");
        market::vetoed(&probabilities, &request.line)
    };

    info!(
        minute = state.minutes_elapsed,
        corners = state.events_so_far,
        line = request.line.threshold,
        ev_over = result.ev_over,
        recommendation = %result.recommendation,
        "Evaluated corner line"
    );

    let remaining_minutes = state.remaining_minutes();
    let rate_per_minute = if remaining_minutes > 0 {
        lambda / f64::from(remaining_minutes)
    } else {
        0.0
    };

    Ok(Evaluation {
        remaining_minutes,
        lambda,
        line_kind,
        probabilities,
        rate_per_minute,
        projected_total: f64::from(state.events_so_far) + lambda,
        corners_needed: distribution::corners_needed(
            request.line.threshold,
            state.events_so_far,
        ),
        result,
        veto_reasons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::distribution::CountDistribution;
    use crate::models::{Recommendation, VetoReason};
    use approx::assert_relative_eq;

    fn poisson_settings() -> Settings {
        Settings {
            distribution: CountDistribution::Poisson,
            ..Settings::default()
        }
    }

    fn request(elapsed: u32, corners: u32, threshold: f64, odds_over: f64) -> EvaluationRequest {
        EvaluationRequest {
            state: MatchState {
                minutes_elapsed: elapsed,
                minutes_total: 95,
                events_so_far: corners,
            },
            line: BettingLine {
                threshold,
                odds_over,
                odds_under: Some(1.90),
            },
            rate: RateSelection::Fixed {
                average_per_match: Some(10.0),
                teams: None,
            },
            pace: None,
            bankroll: 1000.0,
            kelly_fraction: Some(0.5),
        }
    }

    #[test]
    fn fixed_average_half_line_end_to_end() {
        let e = evaluate(&request(60, 4, 8.5, 1.90), &poisson_settings()).unwrap();
        assert_eq!(e.remaining_minutes, 35);
        assert_relative_eq!(e.lambda, 3.684_210_526, epsilon = 1e-6);
        assert_eq!(e.line_kind, LineKind::Half);
        assert_relative_eq!(e.probabilities.p_over, 0.309_734_209_739, epsilon = 1e-9);
        assert_eq!(e.probabilities.p_push, 0.0);
        // Under at 1.90: 0.690 · 0.9 − 0.310 = 0.311
        assert_eq!(e.result.recommendation, Recommendation::BetUnder);
        assert!(e.result.stake_fraction > 0.0);
        assert!(e.veto_reasons.is_empty());
    }

    #[test]
    fn long_over_price_flips_to_over() {
        let e = evaluate(&request(60, 4, 8.5, 4.50), &poisson_settings()).unwrap();
        // 0.3097 · 3.5 − 0.6903 = 0.3938
        let expected = 0.309_734_209_739 * 3.5 - 0.690_265_790_261;
        assert_relative_eq!(e.result.ev_over, expected, epsilon = 1e-9);
        assert_eq!(e.result.recommendation, Recommendation::BetOver);
    }

    #[test]
    fn team_splits_replace_league_average() {
        let mut req = request(0, 0, 8.5, 1.9);
        req.rate = RateSelection::Fixed {
            average_per_match: None,
            teams: Some(TeamAverages {
                home_for: 5.89,
                home_against: 2.95,
                away_for: 4.00,
                away_against: 4.68,
            }),
        };
        let e = evaluate(&req, &poisson_settings()).unwrap();
        assert_relative_eq!(e.lambda, 8.76, epsilon = 1e-9);
    }

    #[test]
    fn blended_model_uses_pace_multiplier() {
        let mut req = request(60, 4, 8.5, 1.9);
        req.rate = RateSelection::Blended {
            league_average: None,
            teams: None,
        };
        let normal = evaluate(&req, &poisson_settings()).unwrap().lambda;
        req.pace = Some(Pace::VeryHigh);
        let fast = evaluate(&req, &poisson_settings()).unwrap().lambda;
        let observed = 4.0 / 60.0 * 35.0;
        assert_relative_eq!(fast - normal, 0.70 * observed * 0.40, epsilon = 1e-9);
    }

    #[test]
    fn segmented_model_defaults_to_league_rate() {
        let mut req = request(60, 4, 8.5, 1.9);
        req.rate = RateSelection::Segmented {
            base_rate_per_minute: None,
        };
        let e = evaluate(&req, &poisson_settings()).unwrap();
        // minutes 60..80 at 1.05, 80..95 at 1.20
        let expected = 10.0 / 95.0 * (20.0 * 1.05 + 15.0 * 1.20);
        assert_relative_eq!(e.lambda, expected, epsilon = 1e-9);
    }

    #[test]
    fn veto_short_circuits_stake() {
        let mut req = request(60, 2, 9.5, 5.0);
        req.pace = Some(Pace::VerySlow);
        let e = evaluate(&req, &poisson_settings()).unwrap();
        assert_eq!(e.veto_reasons, vec![VetoReason::SlowPaceHighLine]);
        assert_eq!(e.result.recommendation, Recommendation::Vetoed);
        assert_eq!(e.result.stake_amount, 0.0);
    }

    #[test]
    fn full_time_whole_line_resolves_under() {
        let e = evaluate(&request(95, 6, 8.0, 1.9), &poisson_settings()).unwrap();
        assert_eq!(e.lambda, 0.0);
        assert_eq!(e.probabilities.p_under, 1.0);
    }

    #[test]
    fn full_time_on_the_line_is_push() {
        let e = evaluate(&request(95, 8, 8.0, 1.9), &poisson_settings()).unwrap();
        assert_eq!(e.probabilities.p_push, 1.0);
        assert_eq!(e.result.recommendation, Recommendation::NoBet);
    }

    #[test]
    fn invalid_inputs_reject_the_evaluation() {
        let mut req = request(60, 4, 8.25, 1.9);
        assert!(matches!(evaluate(&req, &poisson_settings()), Err(EngineError::InvalidInput(_))));

        req.line.threshold = 8.5;
        req.bankroll = -1.0;
        assert!(matches!(evaluate(&req, &poisson_settings()), Err(EngineError::InvalidInput(_))));

        req.bankroll = 100.0;
        req.kelly_fraction = Some(1.5);
        assert!(matches!(evaluate(&req, &poisson_settings()), Err(EngineError::InvalidInput(_))));

        req.kelly_fraction = None;
        req.state.minutes_total = 0;
        assert!(matches!(
            evaluate(&req, &poisson_settings()),
            Err(EngineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn projection_outputs_accompany_the_probabilities() {
        let e = evaluate(&request(60, 4, 8.5, 1.90), &poisson_settings()).unwrap();
        assert_relative_eq!(e.rate_per_minute, 10.0 / 95.0, epsilon = 1e-12);
        assert_relative_eq!(e.projected_total, 4.0 + 10.0 / 95.0 * 35.0, epsilon = 1e-12);
        assert_eq!(e.corners_needed, 5);

        // Whole line 8 with 9 taken: over already won
        let e = evaluate(&request(70, 9, 8.0, 1.90), &poisson_settings()).unwrap();
        assert_eq!(e.corners_needed, 0);

        let e = evaluate(&request(95, 6, 8.5, 1.90), &poisson_settings()).unwrap();
        assert_eq!(e.rate_per_minute, 0.0);
        assert_eq!(e.projected_total, 6.0);
        assert_eq!(e.corners_needed, 3);
    }

    #[test]
    fn lines_above_the_cap_are_rejected_not_evaluated() {
        for threshold in [4_294_967_300.0, 1e9, 40.5] {
            let req = request(60, 0, threshold, 1.9);
            assert!(matches!(
                evaluate(&req, &poisson_settings()),
                Err(EngineError::InvalidInput(_))
            ));
        }
        let e = evaluate(&request(60, 0, 40.0, 1.9), &poisson_settings()).unwrap();
        assert_relative_eq!(e.probabilities.total(), 1.0, epsilon = 1e-9);
        assert_eq!(e.corners_needed, 41);
    }

    #[test]
    fn segmented_model_follows_the_request_window() {
        let mut req = request(30, 2, 4.5, 1.9);
        req.rate = RateSelection::Segmented {
            base_rate_per_minute: Some(0.1),
        };

        // A 45-minute half sits inside the default schedule
        req.state.minutes_total = 45;
        let e = evaluate(&req, &poisson_settings()).unwrap();
        assert_relative_eq!(e.lambda, 0.1 * 15.0, epsilon = 1e-9);

        // Extra time runs past the last segment
        req.state.minutes_elapsed = 100;
        req.state.minutes_total = 120;
        let err = evaluate(&req, &poisson_settings()).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidConfiguration("no segment covers minute 100".into())
        );
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let raw = r#"{
            "state": {"minutes_elapsed": 60, "minutes_total": 95, "events_so_far": 4},
            "line": {"threshold": 8.5, "odds_over": 1.9},
            "bankroll": 1000.0
        }"#;
        let req: EvaluationRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.rate, RateSelection::default());
        assert_eq!(req.line.odds_under, None);
        assert!(req.pace.is_none());
    }
}
