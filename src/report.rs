//! Plain-text rendering of an evaluation for the CLI.

use std::fmt;

use crate::engine::EvaluationRequest;
use crate::models::{Evaluation, LineKind, Recommendation};

pub fn render(request: &EvaluationRequest, eval: &Evaluation) -> String {
    Report { request, eval }.to_string()
}

struct Report<'a> {
    request: &'a EvaluationRequest,
    eval: &'a Evaluation,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = &self.request.state;
        let line = self.request.line.threshold;
        let eval = self.eval;
        let p = &eval.probabilities;
        let r = &eval.result;
        let kind = match eval.line_kind {
            LineKind::Half => "half line",
            LineKind::Whole => "whole line",
        };

        writeln!(
            f,
            "Minute {}/{} · {} corners · line {line} ({kind})",
            state.minutes_elapsed, state.minutes_total, state.events_so_far
        )?;
        writeln!(
            f,
            "Remaining {} min · {:.4} corners/min · projected {:.2} more",
            eval.remaining_minutes, eval.rate_per_minute, eval.lambda
        )?;
        writeln!(
            f,
            "Projected final {:.2} · {} more needed for the over",
            eval.projected_total, eval.corners_needed
        )?;
        writeln!(f)?;
        writeln!(f, "  Over {line:<6} {:>6}", percent(p.p_over))?;
        writeln!(f, "  Under {line:<5} {:>6}", percent(p.p_under))?;
        match eval.line_kind {
            LineKind::Whole => writeln!(f, "  Push         {:>6}", percent(p.p_push))?,
            LineKind::Half => writeln!(f, "  Push            n/a")?,
        }
        writeln!(f)?;
        writeln!(f, "  EV over  {:+.4}", r.ev_over)?;
        match r.ev_under {
            Some(ev) => writeln!(f, "  EV under {:+.4}", ev)?,
            None => writeln!(f, "  EV under    n/a")?,
        }
        writeln!(f)?;

        match r.recommendation {
            Recommendation::BetOver | Recommendation::BetUnder => writeln!(
                f,
                "{} {line} · stake {:.2} ({:.1}% of bankroll)",
                r.recommendation,
                r.stake_amount,
                r.stake_fraction * 100.0
            ),
            Recommendation::NoBet => {
                let best = r.ev_under.map_or(r.ev_over, |u| u.max(r.ev_over));
                writeln!(f, "NO BET · best EV {best:+.4}")
            }
            Recommendation::Vetoed => {
                writeln!(f, "VETOED")?;
                for reason in &eval.veto_reasons {
                    writeln!(f, "  • {reason}")?;
                }
                Ok(())
            }
        }
    }
}

/// Probability as a percentage with one decimal.
pub fn percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}
