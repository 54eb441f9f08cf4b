//! Counting distributions for the remaining-corner total and their
//! settlement against a line.
//!
//! Probabilities are built by recurrence in log space, so large counts or
//! rates never overflow a factorial. Anything non-finite degenerates to 0.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{LineKind, OutcomeProbabilities};

/// Distribution family for the number of further corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum CountDistribution {
    Poisson,
    /// Gamma-Poisson mixture with mean `lambda` and shape `dispersion`.
    /// Larger dispersion means less overdispersion; infinity is Poisson.
    NegativeBinomial { dispersion: f64 },
}

impl Default for CountDistribution {
    fn default() -> Self {
        CountDistribution::NegativeBinomial { dispersion: 3.0 }
    }
}

impl CountDistribution {
    pub fn validate(&self) -> EngineResult<()> {
        match self {
            CountDistribution::Poisson => Ok(()),
            CountDistribution::NegativeBinomial { dispersion } => {
                if dispersion.is_finite() && *dispersion > 0.0 {
                    Ok(())
                } else {
                    Err(EngineError::config(format!(
                        "negative binomial dispersion must be positive, got {dispersion}"
                    )))
                }
            }
        }
    }

    /// ln P(0), ln of the per-step rate and the NB shape, or `None` when
    /// the distribution collapses to a delta at zero.
    fn log_recurrence(&self, lambda: f64) -> Option<(f64, f64, Option<f64>)> {
        if !(lambda.is_finite() && lambda > 0.0) {
            return None;
        }
        Some(match *self {
            CountDistribution::Poisson => (-lambda, lambda.ln(), None),
            CountDistribution::NegativeBinomial { dispersion: r } => (
                -r * (lambda / r).ln_1p(),
                (lambda / (r + lambda)).ln(),
                Some(r),
            ),
        })
    }

    /// P(X = k) for k in `0..=max_k`.
    pub fn pmf_table(&self, lambda: f64, max_k: u32) -> Vec<f64> {
        let mut out = vec![0.0; max_k as usize + 1];
        let Some((ln_p0, ln_rate, shape)) = self.log_recurrence(lambda) else {
            // Delta at zero
            out[0] = 1.0;
            return out;
        };

        let mut ln_p = ln_p0;
        out[0] = finite_exp(ln_p);
        for (k, slot) in out.iter_mut().enumerate().skip(1) {
            ln_p += ln_step(ln_rate, shape, k as f64);
            *slot = finite_exp(ln_p);
        }
        out
    }

    /// P(X = k); zero for negative k.
    ///
    /// Walks the recurrence without storing it and stops once the terms are
    /// past the mode and below the smallest positive `f64`.
    pub fn pmf(&self, k: i64, lambda: f64) -> f64 {
        let Ok(k) = u32::try_from(k) else {
            return 0.0;
        };
        let Some((ln_p0, ln_rate, shape)) = self.log_recurrence(lambda) else {
            return if k == 0 { 1.0 } else { 0.0 };
        };

        let mut ln_p = ln_p0;
        for i in 1..=k {
            let step = ln_step(ln_rate, shape, i as f64);
            ln_p += step;
            if step < 0.0 && ln_p < LN_UNDERFLOW {
                return 0.0;
            }
        }
        finite_exp(ln_p)
    }

    /// P(X <= k); zero for negative k.
    pub fn cdf(&self, k: i64, lambda: f64) -> f64 {
        let Ok(k) = u32::try_from(k) else {
            return 0.0;
        };
        let Some((ln_p0, ln_rate, shape)) = self.log_recurrence(lambda) else {
            return 1.0;
        };

        let mut ln_p = ln_p0;
        let mut total = finite_exp(ln_p);
        for i in 1..=k {
            let step = ln_step(ln_rate, shape, i as f64);
            ln_p += step;
            // Past the mode every later term is smaller still
            if step < 0.0 && ln_p < LN_UNDERFLOW {
                break;
            }
            total += finite_exp(ln_p);
        }
        total.clamp(0.0, 1.0)
    }
}

/// Below this, `exp` rounds to zero.
const LN_UNDERFLOW: f64 = -746.0;

/// ln P(k) − ln P(k − 1). Once negative it stays negative.
fn ln_step(ln_rate: f64, shape: Option<f64>, k: f64) -> f64 {
    ln_rate
        + match shape {
            None => -k.ln(),
            Some(r) => ((k - 1.0 + r) / k).ln(),
        }
}

fn finite_exp(ln_p: f64) -> f64 {
    let p = ln_p.exp();
    if p.is_finite() {
        p
    } else {
        0.0
    }
}

/// Further corners the over still needs, zero once it is already won.
pub fn corners_needed(threshold: f64, current_count: u32) -> u32 {
    let target = threshold.floor() as i64 + 1 - i64::from(current_count);
    u32::try_from(target.max(0)).unwrap_or(u32::MAX)
}

/// Settle a line against the distribution of further corners.
///
/// # Arguments
/// * `threshold`     – Bookmaker line, whole or `.5`.
/// * `current_count` – Corners already taken.
/// * `lambda`        – Expected further corners.
/// * `dist`          – Distribution family.
pub fn evaluate(
    threshold: f64,
    current_count: u32,
    lambda: f64,
    dist: &CountDistribution,
) -> EngineResult<OutcomeProbabilities> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(EngineError::input(format!(
            "lambda must be a non-negative number, got {lambda}"
        )));
    }
    let kind = LineKind::of(threshold)?;
    dist.validate()?;

    let count = current_count as f64;
    if kind == LineKind::Whole {
        if count > threshold {
            return Ok(OutcomeProbabilities::OVER);
        }
        if count == threshold {
            // Push already locked in; further corners cannot change it
            return Ok(OutcomeProbabilities::PUSH);
        }
    }

    let target = corners_needed(threshold, current_count);
    if target == 0 {
        return Ok(OutcomeProbabilities::OVER);
    }

    // The line is capped, so the table stays small
    let table = dist.pmf_table(lambda, target);
    let target = target as usize;
    let p_under: f64 = table[..target].iter().sum();
    let p_push = match kind {
        LineKind::Half => 0.0,
        LineKind::Whole => table[target],
    };
    let p_under = if p_under.is_nan() { 0.0 } else { p_under };
    let p_push = if p_push.is_nan() { 0.0 } else { p_push };

    Ok(OutcomeProbabilities::from_under_push(p_under, p_push))
}
