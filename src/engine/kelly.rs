/// Kelly Criterion stake sizing for decimal odds with a push outcome.
///
/// The Kelly formula sizes a bet to maximise the expected logarithm of wealth,
/// which balances risk and reward optimally over the long run.
///
/// With a refundable push the formula becomes:
///   f* = (b·p − q) / b
/// where
///   b  = net odds received on the bet (decimal odds − 1)
///   p  = probability the bet wins
///   q  = probability the bet loses (1 − p − p_push; a push refunds the stake)
///
/// We apply a *fractional* Kelly multiplier (0 < multiplier ≤ 1) to reduce
/// variance at the cost of slightly lower expected growth.

/// Calculate the Kelly stake fraction.
///
/// # Arguments
/// * `p_win`          – Probability that the bet wins (0.0–1.0).
/// * `p_lose`         – Probability that the bet loses (0.0–1.0).
/// * `odds`           – Decimal odds offered for the side.
/// * `kelly_fraction` – Fractional Kelly multiplier (0.0–1.0).
///
/// # Returns
/// The fraction of bankroll to stake (0.0–1.0). Returns `0.0` when there is
/// no edge or when the odds leave no profit (`odds <= 1`).
pub fn kelly_stake(p_win: f64, p_lose: f64, odds: f64, kelly_fraction: f64) -> f64 {
    debug_assert!((0.0..=1.0).contains(&p_win), "p_win out of range");
    debug_assert!((0.0..=1.0).contains(&p_lose), "p_lose out of range");

    let b = odds - 1.0;
    if !(b > 0.0) {
        return 0.0;
    }

    let f = (b * p_win - p_lose) / b;

    if f <= 0.0 {
        return 0.0; // no edge
    }

    // Apply fractional Kelly and clamp to [0, 1]
    (f * kelly_fraction).clamp(0.0, 1.0)
}

/// Expected profit per unit staked.
///
/// EV = p_win · (odds − 1) − p_lose
///
/// A push returns the stake and contributes nothing.
pub fn expected_value(p_win: f64, p_lose: f64, odds: f64) -> f64 {
    p_win * (odds - 1.0) - p_lose
}
