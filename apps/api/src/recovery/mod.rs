// Automatic recovery for failed generation calls.
//
// orchestrator → decision engine (one reasoning call) → action set → replay.

pub mod actions;
pub mod decision;
pub mod orchestrator;
pub mod prompts;

pub use decision::DecisionEngine;
pub use orchestrator::{BoxFuture, Replay, RetryOrchestrator};
