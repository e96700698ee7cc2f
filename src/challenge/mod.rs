//! Human-verification handling
//!
//! This module detects verification challenges on the current page and
//! suspends the crawl until an operator reports them solved. Challenges are
//! never solved automatically.

mod gate;
mod signal;

pub use gate::{ChallengeGate, GateOutcome, GateState, CHALLENGE_SELECTORS, CHALLENGE_TEXT};
pub use signal::{ChannelSignal, ClearanceSignal, ConsoleSignal};
