//! corner-ev - in-play corner over/under pricing.
//!
//! ## Pipeline
//!
//! - **Rate**: elapsed time, observed corners and team strength → expected
//!   corners for the rest of the window
//! - **Distribution**: Poisson or Negative-Binomial settlement of the line
//!   into over/under/push probabilities
//! - **Market**: EV per side, fractional-Kelly stake and a recommendation,
//!   unless a veto guard blocks the bet
//!
//! Every evaluation is a pure function of its request and the read-only
//! [`Settings`]. The binary wraps it in a CLI and an HTTP service.

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod report;
pub mod service;
pub mod settings;

pub use engine::{evaluate, EvaluationRequest, RateModel, RateSelection};
pub use error::{EngineError, EngineResult};
pub use models::{
    BettingLine, Evaluation, EvaluationResult, MatchState, OutcomeProbabilities, Recommendation,
};
pub use settings::Settings;
