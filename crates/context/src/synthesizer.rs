//! Answer Synthesizer - grounded, schema-validated answers
//!
//! Sends the prompt contract to the language model and validates the reply
//! into a [`ResearchAnswer`]. A malformed reply is retried a bounded number
//! of times with a corrective notice before failing with
//! [`AppError::SchemaParse`].
//!
//! The synthesizer does not check that the model's claims are actually
//! supported by the context; it relies on the prompt constraint.

use crate::parser::{parse_response, ParseOutcome};
use crate::prompt::{build_prompt, corrective_prompt};
use citewise_common::config::LlmConfig;
use citewise_common::errors::{AppError, Result};
use citewise_common::llm::LanguageModel;
use citewise_common::metrics;
use citewise_common::models::ResearchAnswer;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Synthesis options
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// Corrective re-prompts allowed after the first malformed reply
    pub schema_retries: u32,

    /// Deadline for each model call
    pub timeout: Duration,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            schema_retries: 1,
            timeout: Duration::from_secs(120),
        }
    }
}

impl From<&LlmConfig> for SynthesisOptions {
    fn from(config: &LlmConfig) -> Self {
        Self {
            schema_retries: config.schema_retries,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Synthesizer for generating answers
pub struct Synthesizer {
    model: Arc<dyn LanguageModel>,
    options: SynthesisOptions,
}

impl Synthesizer {
    pub fn new(model: Arc<dyn LanguageModel>, options: SynthesisOptions) -> Self {
        Self { model, options }
    }

    pub fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    /// Answer `question` from the assembled `context`.
    ///
    /// A blank context yields the insufficient-evidence answer without
    /// calling the model.
    #[instrument(skip(self, question, context), fields(model = %self.model.model_name(), context_chars = context.len()))]
    pub async fn synthesize(&self, question: &str, context: &str) -> Result<ResearchAnswer> {
        if context.trim().is_empty() {
            info!("No context retrieved, returning insufficient-evidence answer");
            metrics::record_insufficient_evidence();
            return Ok(ResearchAnswer::insufficient_evidence());
        }

        let base = build_prompt(question, context);
        let max_attempts = self.options.schema_retries.saturating_add(1);
        let mut prompt = base.clone();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let started = Instant::now();
            let raw = self.invoke(&prompt).await?;

            match parse_response(&raw) {
                ParseOutcome::Valid(answer) => {
                    metrics::record_synthesis_attempt(
                        started.elapsed().as_secs_f64(),
                        self.model.model_name(),
                        true,
                    );
                    if answer.is_insufficient() {
                        metrics::record_insufficient_evidence();
                    }
                    debug!(attempt, "Response parsed");
                    return Ok(answer);
                }
                ParseOutcome::Failure(failure) => {
                    metrics::record_synthesis_attempt(
                        started.elapsed().as_secs_f64(),
                        self.model.model_name(),
                        false,
                    );
                    warn!(
                        attempt,
                        max_attempts,
                        violation = %failure.violation,
                        "Model response did not match the answer schema"
                    );

                    if attempt >= max_attempts {
                        return Err(AppError::SchemaParse {
                            raw: failure.raw,
                            violation: failure.violation,
                            attempts: attempt,
                        });
                    }
                    prompt = corrective_prompt(&base, &failure.violation);
                }
            }
        }
    }

    /// One model call under the configured deadline
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let timeout = self.options.timeout;
        match tokio::time::timeout(timeout, self.model.invoke(prompt)).await {
            Err(_) => Err(AppError::ModelTimeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(e)) if e.is_model_failure() => Err(e),
            Ok(Err(e)) => Err(AppError::ModelInvocation { message: e.to_string() }),
        }
    }
}
