//! Situational guards that block a bet before any pricing is trusted.
//!
//! Guards look only at the clock, the count, the line and the declared pace.
//! They never see a probability.

use serde::{Deserialize, Serialize};

use crate::models::{BettingLine, MatchState, Pace, VetoReason};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VetoSettings {
    /// Lines at or above this are too high for a very slow match.
    pub slow_pace_max_line: f64,
    /// Below this many minutes left, large gaps to the line are blocked.
    pub min_useful_minutes: u32,
    /// Gap between line and current count that needs useful time to close.
    pub max_late_gap: f64,
}

impl Default for VetoSettings {
    fn default() -> Self {
        VetoSettings {
            slow_pace_max_line: 7.5,
            min_useful_minutes: 15,
            max_late_gap: 4.0,
        }
    }
}

/// Run every guard; an empty result means the line may be bet.
pub fn check(
    state: &MatchState,
    line: &BettingLine,
    pace: Option<Pace>,
    settings: &VetoSettings,
) -> Vec<VetoReason> {
    let mut reasons = Vec::new();

    if pace == Some(Pace::VerySlow) && line.threshold >= settings.slow_pace_max_line {
        reasons.push(VetoReason::SlowPaceHighLine);
    }

    let gap = line.threshold - state.events_so_far as f64;
    if state.remaining_minutes() < settings.min_useful_minutes && gap >= settings.max_late_gap {
        reasons.push(VetoReason::InsufficientTime);
    }

    reasons
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(elapsed: u32, events: u32) -> MatchState {
        MatchState {
            minutes_elapsed: elapsed,
            minutes_total: 95,
            events_so_far: events,
        }
    }

    fn line(threshold: f64) -> BettingLine {
        BettingLine {
            threshold,
            odds_over: 1.9,
            odds_under: Some(1.9),
        }
    }

    #[test]
    fn slow_pace_blocks_high_line_only() {
        let s = VetoSettings::default();
        let r = check(&state(30, 2), &line(7.5), Some(Pace::VerySlow), &s);
        assert_eq!(r, vec![VetoReason::SlowPaceHighLine]);
        assert!(check(&state(30, 2), &line(7.0), Some(Pace::VerySlow), &s).is_empty());
        assert!(check(&state(30, 2), &line(9.5), Some(Pace::Normal), &s).is_empty());
        assert!(check(&state(30, 2), &line(9.5), None, &s).is_empty());
    }

    #[test]
    fn late_large_gap_is_blocked() {
        let s = VetoSettings::default();
        // 81', 14 left, needs 4.5 more
        let r = check(&state(81, 4), &line(8.5), None, &s);
        assert_eq!(r, vec![VetoReason::InsufficientTime]);
        // Exactly 15 minutes left is enough
        assert!(check(&state(80, 4), &line(8.5), None, &s).is_empty());
        // Small gap late is fine
        assert!(check(&state(88, 6), &line(8.5), None, &s).is_empty());
    }

    #[test]
    fn both_guards_can_fire_together() {
        let s = VetoSettings::default();
        let r = check(&state(85, 3), &line(9.5), Some(Pace::VerySlow), &s);
        assert_eq!(
            r,
            vec![VetoReason::SlowPaceHighLine, VetoReason::InsufficientTime]
        );
    }

    #[test]
    fn thresholds_are_configurable() {
        let s = VetoSettings {
            slow_pace_max_line: 10.0,
            min_useful_minutes: 30,
            max_late_gap: 2.0,
        };
        assert!(check(&state(30, 2), &line(9.5), Some(Pace::VerySlow), &s).is_empty());
        assert_eq!(
            check(&state(70, 6), &line(8.5), None, &s),
            vec![VetoReason::InsufficientTime]
        );
    }
}
