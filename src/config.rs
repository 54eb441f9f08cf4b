use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::engine::{EvaluationRequest, RateSelection};
use crate::models::{BettingLine, MatchState, Pace, TeamAverages};
use crate::settings::Settings;

/// In-play corner over/under evaluator
#[derive(Parser, Debug, Clone)]
#[command(name = "corner-ev", version, about)]
pub struct Config {
    /// JSON settings file (tuning tables, distribution, veto thresholds)
    #[arg(long, env = "CORNER_EV_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Evaluate one line and print the result
    Evaluate(EvaluateArgs),
    /// Serve evaluations over HTTP
    Serve(ServeArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// League (or team-weighted) average spread evenly over the window
    Fixed,
    /// Theoretical rate blended with the observed in-match rate
    Blended,
    /// Per-minute base rate scaled by the time-segment schedule
    Segmented,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Minutes played so far
    #[arg(long)]
    pub minute: u32,

    /// Window length in minutes (defaults to the settings value, 95)
    #[arg(long)]
    pub total_minutes: Option<u32>,

    /// Corners taken so far
    #[arg(long)]
    pub corners: u32,

    /// Over/under line, whole or .5 (e.g. 8.0 or 8.5)
    #[arg(long)]
    pub line: f64,

    /// Decimal odds for the over
    #[arg(long)]
    pub odds_over: f64,

    /// Decimal odds for the under (omit for an over-only market)
    #[arg(long)]
    pub odds_under: Option<f64>,

    /// Rate model used to project the remaining corners
    #[arg(long, value_enum, default_value = "fixed")]
    pub model: ModelKind,

    /// Corners per match for the fixed and blended models
    #[arg(long)]
    pub league_average: Option<f64>,

    /// Per-minute base rate for the segmented model
    #[arg(long)]
    pub base_rate: Option<f64>,

    /// Declared match pace: very-slow, normal, high, very-high
    #[arg(long)]
    pub pace: Option<Pace>,

    /// Home side corners won per match
    #[arg(long, requires_all = ["home_against", "away_for", "away_against"])]
    pub home_for: Option<f64>,

    /// Home side corners conceded per match
    #[arg(long)]
    pub home_against: Option<f64>,

    /// Away side corners won per match
    #[arg(long)]
    pub away_for: Option<f64>,

    /// Away side corners conceded per match
    #[arg(long)]
    pub away_against: Option<f64>,

    /// Bankroll in your currency unit
    #[arg(long, default_value = "1000.0")]
    pub bankroll: f64,

    /// Fractional Kelly multiplier (0.0–1.0]; defaults to the settings value
    #[arg(long)]
    pub kelly_fraction: Option<f64>,

    /// Print the evaluation as JSON instead of a report
    #[arg(long, default_value = "false")]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Listen address
    #[arg(long, env = "CORNER_EV_ADDR", default_value = "0.0.0.0:8080")]
    pub addr: String,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Command::Evaluate(args) = &self.command {
            args.validate()?;
        }
        Ok(())
    }
}

impl EvaluateArgs {
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(k) = self.kelly_fraction {
            if !(k > 0.0 && k <= 1.0) {
                anyhow::bail!("kelly_fraction must be between 0.0 (exclusive) and 1.0");
            }
        }
        if !self.bankroll.is_finite() || self.bankroll < 0.0 {
            anyhow::bail!("bankroll must be a non-negative amount, got {}", self.bankroll);
        }
        let team_fields = [self.home_for, self.home_against, self.away_for, self.away_against];
        let given = team_fields.iter().filter(|v| v.is_some()).count();
        if given != 0 && given != team_fields.len() {
            anyhow::bail!(
                "team averages need all of --home-for, --home-against, --away-for, --away-against"
            );
        }
        if given != 0 && self.model == ModelKind::Segmented {
            anyhow::bail!("team averages do not apply to the segmented model");
        }
        Ok(())
    }

    fn teams(&self) -> Option<TeamAverages> {
        Some(TeamAverages {
            home_for: self.home_for?,
            home_against: self.home_against?,
            away_for: self.away_for?,
            away_against: self.away_against?,
        })
    }

    /// Build the engine request, filling the window length from settings.
    pub fn to_request(&self, settings: &Settings) -> EvaluationRequest {
        let rate = match self.model {
            ModelKind::Fixed => RateSelection::Fixed {
                average_per_match: self.league_average,
                teams: self.teams(),
            },
            ModelKind::Blended => RateSelection::Blended {
                league_average: self.league_average,
                teams: self.teams(),
            },
            ModelKind::Segmented => RateSelection::Segmented {
                base_rate_per_minute: self.base_rate,
            },
        };
        EvaluationRequest {
            state: MatchState {
                minutes_elapsed: self.minute,
                minutes_total: self.total_minutes.unwrap_or(settings.minutes_total),
                events_so_far: self.corners,
            },
            line: BettingLine {
                threshold: self.line,
                odds_over: self.odds_over,
                odds_under: self.odds_under,
            },
            rate,
            pace: self.pace,
            bankroll: self.bankroll,
            kelly_fraction: self.kelly_fraction,
        }
    }
}
