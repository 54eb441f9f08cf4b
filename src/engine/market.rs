//! EV, stake sizing and the bet/no-bet decision for one line.

use super::kelly::{expected_value, kelly_stake};
use crate::models::{BettingLine, EvaluationResult, OutcomeProbabilities, Recommendation};

/// Minimum EV a side must clear before it is recommended.
pub const DEFAULT_MIN_EDGE: f64 = 0.05;

/// Price both sides of a line and pick one.
///
/// A side is recommended when its EV exceeds `min_edge` and is strictly
/// greater than the other side's. The stake is sized for that side only.
/// Odds at or below 1.0 give a zero stake rather than an error.
pub fn evaluate_market(
    probs: &OutcomeProbabilities,
    line: &BettingLine,
    bankroll: f64,
    kelly_fraction: f64,
    min_edge: f64,
) -> EvaluationResult {
    let lose_over = lose_probability(probs.p_over, probs.p_push);
    let lose_under = lose_probability(probs.p_under, probs.p_push);

    let ev_over = expected_value(probs.p_over, lose_over, line.odds_over);
    let ev_under = line
        .odds_under
        .map(|odds| expected_value(probs.p_under, lose_under, odds));

    let recommendation = match ev_under {
        _ if ev_over > min_edge && ev_under.map_or(true, |u| ev_over > u) => {
            Recommendation::BetOver
        }
        Some(u) if u > min_edge && u > ev_over => Recommendation::BetUnder,
        _ => Recommendation::NoBet,
    };

    let stake_fraction = match (recommendation, line.odds_under) {
        (Recommendation::BetOver, _) => {
            kelly_stake(probs.p_over, lose_over, line.odds_over, kelly_fraction)
        }
        (Recommendation::BetUnder, Some(odds)) => {
            kelly_stake(probs.p_under, lose_under, odds, kelly_fraction)
        }
        _ => 0.0,
    };

    EvaluationResult {
        ev_over,
        ev_under,
        stake_fraction,
        stake_amount: stake_fraction * bankroll.max(0.0),
        recommendation,
    }
}

/// Result for a line blocked by a veto guard: EVs are still reported, no
/// stake is sized.
pub fn vetoed(probs: &OutcomeProbabilities, line: &BettingLine) -> EvaluationResult {
    let ev_over = expected_value(
        probs.p_over,
        lose_probability(probs.p_over, probs.p_push),
        line.odds_over,
    );
    let ev_under = line.odds_under.map(|odds| {
        expected_value(
            probs.p_under,
            lose_probability(probs.p_under, probs.p_push),
            odds,
        )
    });
    EvaluationResult {
        ev_over,
        ev_under,
        stake_fraction: 0.0,
        stake_amount: 0.0,
        recommendation: Recommendation::Vetoed,
    }
}

/// A push refunds the stake, so it is neither a win nor a loss.
fn lose_probability(p_side: f64, p_push: f64) -> f64 {
    (1.0 - p_side - p_push).clamp(0.0, 1.0)
}
