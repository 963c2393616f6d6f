//! Citewise Context
//!
//! Query-time half of the system:
//! - Context assembly from retrieved chunks
//! - Prompt contract and strict response parsing
//! - Grounded answer synthesis with bounded retry
//! - The cancellable query pipeline

pub mod assembler;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod synthesizer;

pub use assembler::assemble;
pub use parser::{parse_response, ParseFailure, ParseOutcome};
pub use pipeline::{cancel_channel, CancelSignal, ResearchPipeline};
pub use synthesizer::{SynthesisOptions, Synthesizer};
