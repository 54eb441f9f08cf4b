//! Read-only engine tuning, loaded once at start-up.
//!
//! Every field has a default, so a settings file only needs the values it
//! overrides:
//!
//! ```json
//! {
//!   "distribution": { "family": "poisson" },
//!   "blend": [{ "from_minute": 0, "weight": 0.4 }, { "from_minute": 60, "weight": 0.8 }],
//!   "veto": { "min_useful_minutes": 10 }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::distribution::CountDistribution;
use crate::engine::market::DEFAULT_MIN_EDGE;
use crate::engine::schedule::{BlendSchedule, SegmentSchedule};
use crate::engine::veto::VetoSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::Pace;

/// Multiplier applied to the observed projection for each declared pace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaceMultipliers {
    pub very_slow: f64,
    pub normal: f64,
    pub high: f64,
    pub very_high: f64,
}

impl Default for PaceMultipliers {
    fn default() -> Self {
        PaceMultipliers {
            very_slow: 0.65,
            normal: 1.00,
            high: 1.20,
            very_high: 1.40,
        }
    }
}

impl PaceMultipliers {
    pub fn for_pace(&self, pace: Pace) -> f64 {
        match pace {
            Pace::VerySlow => self.very_slow,
            Pace::Normal => self.normal,
            Pace::High => self.high,
            Pace::VeryHigh => self.very_high,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Window length in minutes, stoppage time included.
    pub minutes_total: u32,
    /// Corners per match used when the caller supplies no average.
    pub league_average: f64,
    pub distribution: CountDistribution,
    pub blend: BlendSchedule,
    pub pace_multipliers: PaceMultipliers,
    /// Fixed multiplier applied after the pace multiplier.
    pub fluidity_multiplier: f64,
    pub segments: SegmentSchedule,
    /// Per-minute base rate for the segmented model; defaults to
    /// `league_average / minutes_total`.
    pub base_rate_per_minute: Option<f64>,
    pub veto: VetoSettings,
    pub min_edge: f64,
    pub kelly_fraction: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            minutes_total: 95,
            league_average: 10.0,
            distribution: CountDistribution::default(),
            blend: BlendSchedule::default(),
            pace_multipliers: PaceMultipliers::default(),
            fluidity_multiplier: 1.0,
            segments: SegmentSchedule::default(),
            base_rate_per_minute: None,
            veto: VetoSettings::default(),
            min_edge: DEFAULT_MIN_EDGE,
            kelly_fraction: 0.5,
        }
    }
}

impl Settings {
    /// Load from a JSON file, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let settings = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read settings file {}", p.display()))?;
                Settings::from_json(&raw)
                    .with_context(|| format!("Failed to parse settings file {}", p.display()))?
            }
            None => Settings::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Settings> {
        serde_json::from_str(raw)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.minutes_total == 0 {
            return Err(EngineError::config("minutes_total must be positive"));
        }
        if !self.league_average.is_finite() || self.league_average <= 0.0 {
            return Err(EngineError::config("league_average must be positive"));
        }
        self.distribution.validate()?;
        self.blend.validate()?;
        self.segments.validate()?;

        let last = self.segments.segments().last().map(|s| s.end).unwrap_or(0);
        if self.segments.segments()[0].start != 0 || last < self.minutes_total {
            return Err(EngineError::config(format!(
                "segment schedule must cover minutes 0..{}",
                self.minutes_total
            )));
        }

        let pace = &self.pace_multipliers;
        for (name, v) in [
            ("very_slow", pace.very_slow),
            ("normal", pace.normal),
            ("high", pace.high),
            ("very_high", pace.very_high),
            ("fluidity_multiplier", self.fluidity_multiplier),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(EngineError::config(format!(
                    "multiplier {name} must be a non-negative number, got {v}"
                )));
            }
        }
        if let Some(rate) = self.base_rate_per_minute {
            if !rate.is_finite() || rate < 0.0 {
                return Err(EngineError::config("base_rate_per_minute must be non-negative"));
            }
        }
        if !self.min_edge.is_finite() {
            return Err(EngineError::config("min_edge must be a number"));
        }
        if !(self.kelly_fraction > 0.0 && self.kelly_fraction <= 1.0) {
            return Err(EngineError::config("kelly_fraction must be in (0, 1]"));
        }
        Ok(())
    }

    pub fn base_rate_per_minute(&self) -> f64 {
        self.base_rate_per_minute
            .unwrap_or(self.league_average / self.minutes_total as f64)
    }

    /// Manual multipliers for the blended model, in application order.
    pub fn manual_multipliers(&self, pace: Option<Pace>) -> Vec<f64> {
        let pace = self.pace_multipliers.for_pace(pace.unwrap_or(Pace::Normal));
        vec![pace, self.fluidity_multiplier]
    }
}
