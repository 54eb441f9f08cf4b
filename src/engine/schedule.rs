//! Lookup tables that drive the rate estimator.
//!
//! Both tables are plain data so they can be tuned from the settings file
//! and tested without touching the estimator.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// One step of the observed-rate blend weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendStep {
    /// First elapsed minute this weight applies to.
    pub from_minute: u32,
    /// Weight given to the observed projection, in [0, 1].
    pub weight: f64,
}

impl BlendStep {
    pub const fn new(from_minute: u32, weight: f64) -> Self {
        BlendStep {
            from_minute,
            weight,
        }
    }
}

/// Step function mapping elapsed minutes to the observed-rate weight.
///
/// The weight for minute `m` is that of the last step with
/// `from_minute <= m`, or 0 before the first step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlendSchedule {
    steps: Vec<BlendStep>,
}

impl BlendSchedule {
    pub fn new(steps: Vec<BlendStep>) -> EngineResult<Self> {
        let schedule = BlendSchedule { steps };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn steps(&self) -> &[BlendStep] {
        &self.steps
    }

    /// Steps must be strictly increasing in minute and non-decreasing in
    /// weight, with every weight inside [0, 1].
    pub fn validate(&self) -> EngineResult<()> {
        let mut prev: Option<BlendStep> = None;
        for step in &self.steps {
            if !(0.0..=1.0).contains(&step.weight) {
                return Err(EngineError::config(format!(
                    "blend weight {} at minute {} is outside [0, 1]",
                    step.weight, step.from_minute
                )));
            }
            if let Some(p) = prev {
                if step.from_minute <= p.from_minute {
                    return Err(EngineError::config(format!(
                        "blend steps must be strictly increasing in minute ({} after {})",
                        step.from_minute, p.from_minute
                    )));
                }
                if step.weight < p.weight {
                    return Err(EngineError::config(format!(
                        "blend weight drops from {} to {} at minute {}",
                        p.weight, step.weight, step.from_minute
                    )));
                }
            }
            prev = Some(*step);
        }
        Ok(())
    }

    pub fn weight_at(&self, minute: u32) -> f64 {
        self.steps
            .iter()
            .take_while(|s| s.from_minute <= minute)
            .last()
            .map(|s| s.weight)
            .unwrap_or(0.0)
    }
}

impl Default for BlendSchedule {
    fn default() -> Self {
        BlendSchedule {
            steps: vec![
                BlendStep::new(0, 0.35),
                BlendStep::new(30, 0.55),
                BlendStep::new(55, 0.70),
                BlendStep::new(70, 0.85),
            ],
        }
    }
}

/// Half-open minute range `[start, end)` with a rate multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: u32,
    pub end: u32,
    pub multiplier: f64,
}

impl Segment {
    pub const fn new(start: u32, end: u32, multiplier: f64) -> Self {
        Segment {
            start,
            end,
            multiplier,
        }
    }

    fn contains(&self, minute: u32) -> bool {
        self.start <= minute && minute < self.end
    }
}

/// Time-of-window multiplier schedule.
///
/// Minute index `m` stands for the interval `[m, m + 1)`. Segments are kept
/// sorted and contiguous; construction rejects overlaps and gaps between
/// consecutive segments. Coverage of a particular window is checked by the
/// estimator, which reports any minute no segment contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentSchedule {
    segments: Vec<Segment>,
}

impl SegmentSchedule {
    pub fn new(segments: Vec<Segment>) -> EngineResult<Self> {
        let schedule = SegmentSchedule { segments };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.segments.is_empty() {
            return Err(EngineError::config("segment schedule is empty"));
        }
        for seg in &self.segments {
            if seg.end <= seg.start {
                return Err(EngineError::config(format!(
                    "segment [{}, {}) is empty or reversed",
                    seg.start, seg.end
                )));
            }
            if !seg.multiplier.is_finite() || seg.multiplier < 0.0 {
                return Err(EngineError::config(format!(
                    "segment [{}, {}) has invalid multiplier {}",
                    seg.start, seg.end, seg.multiplier
                )));
            }
        }
        for pair in self.segments.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if b.start != a.end {
                let what = if b.start < a.end { "overlaps" } else { "leaves a gap after" };
                return Err(EngineError::config(format!(
                    "segment [{}, {}) {} [{}, {})",
                    b.start, b.end, what, a.start, a.end
                )));
            }
        }
        Ok(())
    }

    pub fn multiplier_at(&self, minute: u32) -> Option<f64> {
        self.segments
            .iter()
            .find(|s| s.contains(minute))
            .map(|s| s.multiplier)
    }

    /// Sum of multipliers over the minutes `[from, to)`, or the first
    /// uncovered minute.
    pub fn integrate(&self, from: u32, to: u32) -> Result<f64, u32> {
        let mut total = 0.0;
        for seg in &self.segments {
            let lo = seg.start.max(from);
            let hi = seg.end.min(to);
            if hi > lo {
                total += seg.multiplier * (hi - lo) as f64;
            }
        }
        if from < to {
            let first = self.segments.first().map(|s| s.start).unwrap_or(u32::MAX);
            let last = self.segments.last().map(|s| s.end).unwrap_or(0);
            if from < first {
                return Err(from);
            }
            if to > last {
                return Err(last.max(from));
            }
        }
        Ok(total)
    }
}

impl Default for SegmentSchedule {
    /// Quiet opening, steady middle, a dip after the restart and a late push
    /// through stoppage time, over a 95-minute window.
    fn default() -> Self {
        SegmentSchedule {
            segments: vec![
                Segment::new(0, 15, 0.85),
                Segment::new(15, 45, 1.00),
                Segment::new(45, 60, 0.95),
                Segment::new(60, 80, 1.05),
                Segment::new(80, 95, 1.20),
            ],
        }
    }
}
