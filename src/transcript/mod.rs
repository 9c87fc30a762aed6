//! Transcript assembly from utterance events

mod aggregator;
mod message;

pub use aggregator::{Transcript, TranscriptAggregator, TranscriptEntry};
pub use message::{Message, Role};
