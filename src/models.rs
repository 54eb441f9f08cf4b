use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Snapshot of the match clock and corner count at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    pub minutes_elapsed: u32,
    /// Length of the window being priced (95 for a full match with stoppage,
    /// 45 for a half).
    pub minutes_total: u32,
    /// Corners already taken inside the window.
    pub events_so_far: u32,
}

impl MatchState {
    /// Minutes left in the window; floors at zero when the clock has run past
    /// `minutes_total`.
    pub fn remaining_minutes(&self) -> u32 {
        self.minutes_total.saturating_sub(self.minutes_elapsed)
    }
}

/// Per-team corner averages used to derive a weighted match average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamAverages {
    /// Corners won per match by the home side
    pub home_for: f64,
    /// Corners conceded per match by the home side
    pub home_against: f64,
    pub away_for: f64,
    pub away_against: f64,
}

impl TeamAverages {
    pub fn validate(&self) -> EngineResult<()> {
        for (name, v) in [
            ("home_for", self.home_for),
            ("home_against", self.home_against),
            ("away_for", self.away_for),
            ("away_against", self.away_against),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(EngineError::input(format!(
                    "team average {name} must be a non-negative number, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Caller's qualitative reading of the match tempo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    VerySlow,
    Normal,
    High,
    VeryHigh,
}

impl std::str::FromStr for Pace {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "very_slow" => Ok(Pace::VerySlow),
            "normal" => Ok(Pace::Normal),
            "high" => Ok(Pace::High),
            "very_high" => Ok(Pace::VeryHigh),
            other => Err(EngineError::input(format!("unknown pace '{other}'"))),
        }
    }
}

/// Highest line accepted. Live corner totals never get near it.
pub const MAX_THRESHOLD: f64 = 40.0;

/// Whether a threshold can push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// X.5 line, settles over or under only.
    Half,
    /// Integer ("Asian") line, refunds on an exact landing.
    Whole,
}

impl LineKind {
    /// Classify a threshold. Only whole numbers and `.5` fractions are
    /// accepted; quarter lines and other fractions are rejected.
    pub fn of(threshold: f64) -> EngineResult<LineKind> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(EngineError::input(format!(
                "threshold must be a positive number, got {threshold}"
            )));
        }
        if threshold > MAX_THRESHOLD {
            return Err(EngineError::input(format!(
                "threshold {threshold} is above the {MAX_THRESHOLD} limit"
            )));
        }
        let frac = threshold - threshold.floor();
        if frac == 0.0 {
            Ok(LineKind::Whole)
        } else if (frac - 0.5).abs() < 1e-9 {
            Ok(LineKind::Half)
        } else {
            Err(EngineError::input(format!(
                "threshold must be a whole number or end in .5, got {threshold}"
            )))
        }
    }
}

/// Bookmaker line with decimal odds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BettingLine {
    pub threshold: f64,
    pub odds_over: f64,
    /// Absent for over-only markets.
    #[serde(default)]
    pub odds_under: Option<f64>,
}

impl BettingLine {
    pub fn validate(&self) -> EngineResult<LineKind> {
        let kind = LineKind::of(self.threshold)?;
        if !self.odds_over.is_finite() || self.odds_over <= 1.0 {
            return Err(EngineError::input(format!(
                "odds_over must be greater than 1.0, got {}",
                self.odds_over
            )));
        }
        if let Some(u) = self.odds_under {
            if !u.is_finite() || u <= 1.0 {
                return Err(EngineError::input(format!(
                    "odds_under must be greater than 1.0, got {u}"
                )));
            }
        }
        Ok(kind)
    }
}

/// Settlement probabilities for one line. Always sums to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeProbabilities {
    pub p_over: f64,
    pub p_under: f64,
    pub p_push: f64,
}

impl OutcomeProbabilities {
    pub const OVER: OutcomeProbabilities = OutcomeProbabilities {
        p_over: 1.0,
        p_under: 0.0,
        p_push: 0.0,
    };

    pub const PUSH: OutcomeProbabilities = OutcomeProbabilities {
        p_over: 0.0,
        p_under: 0.0,
        p_push: 1.0,
    };

    /// Build a triple from the under and push masses, clamping each into
    /// [0, 1] and assigning the remainder to over.
    pub fn from_under_push(p_under: f64, p_push: f64) -> Self {
        let p_under = p_under.clamp(0.0, 1.0);
        let p_push = p_push.clamp(0.0, 1.0 - p_under);
        let p_over = (1.0 - p_under - p_push).clamp(0.0, 1.0);
        OutcomeProbabilities {
            p_over,
            p_under,
            p_push,
        }
    }

    pub fn total(&self) -> f64 {
        self.p_over + self.p_under + self.p_push
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    BetOver,
    BetUnder,
    NoBet,
    Vetoed,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Recommendation::BetOver => "BET OVER",
            Recommendation::BetUnder => "BET UNDER",
            Recommendation::NoBet => "NO BET",
            Recommendation::Vetoed => "VETOED",
        };
        f.write_str(s)
    }
}

/// Market verdict for one line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub ev_over: f64,
    /// `None` when the market offered no under price.
    pub ev_under: Option<f64>,
    /// Fraction of bankroll to stake on the recommended side.
    pub stake_fraction: f64,
    /// `stake_fraction * bankroll`, in the caller's currency unit.
    pub stake_amount: f64,
    pub recommendation: Recommendation,
}

/// Situational guard that blocks a bet regardless of EV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VetoReason {
    /// Very slow declared pace against a high line.
    SlowPaceHighLine,
    /// Too little time left to cover the gap to the line.
    InsufficientTime,
}

impl std::fmt::Display for VetoReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VetoReason::SlowPaceHighLine => "very slow pace for a high line",
            VetoReason::InsufficientTime => "not enough useful time left",
        };
        f.write_str(s)
    }
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub remaining_minutes: u32,
    /// Expected corners over the remaining window.
    pub lambda: f64,
    pub line_kind: LineKind,
    pub probabilities: OutcomeProbabilities,
    /// Average corners per minute over the remaining window; 0 once it
    /// has closed.
    pub rate_per_minute: f64,
    /// Corners so far plus `lambda`.
    pub projected_total: f64,
    /// Further corners the over needs; 0 when it is already won.
    pub corners_needed: u32,
    pub result: EvaluationResult,
    pub veto_reasons: Vec<VetoReason>,
}
