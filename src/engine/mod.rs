//! The deferred-acceptance matching engine.
//!
//! ## Design principles
//!
//! 1. **Caller-driven**: progress happens only when the caller invokes
//!    [`MatchingEngine::step`]; every step is synchronous and atomic
//! 2. **Determinism**: given fixed preference tables, a run replays
//!    identically — the only randomness lives in instance generation
//! 3. **Structured reporting**: each step returns tagged events for the
//!    presentation layer instead of touching any rendering state
//! 4. **Validate before mutate**: `start` rejects malformed preference
//!    data without committing any run state

pub mod deferred_acceptance;

pub use deferred_acceptance::{EngineError, MatchingEngine, StepReport};
