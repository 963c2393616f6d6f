//! Query pipeline: retrieve, assemble, synthesize
//!
//! Stages run in sequence. A cancel signal is checked at every stage
//! boundary and raced against the retrieval and model calls; a cancelled
//! query drops whatever context it had built.

use crate::assembler::assemble;
use crate::synthesizer::Synthesizer;
use citewise_common::errors::{AppError, Result};
use citewise_common::models::ResearchAnswer;
use citewise_search::Retriever;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

/// Receiving side of a cancellation flag; `true` means cancel
pub type CancelSignal = watch::Receiver<bool>;

/// Create a cancel handle and the signal to pass into a query
pub fn cancel_channel() -> (watch::Sender<bool>, CancelSignal) {
    watch::channel(false)
}

fn ensure_active(signal: &CancelSignal, stage: &str) -> Result<()> {
    if *signal.borrow() {
        debug!(stage, "Query cancelled at stage boundary");
        return Err(AppError::Cancelled {
            stage: stage.to_string(),
        });
    }
    Ok(())
}

/// Resolves once cancellation is requested. A dropped sender never cancels.
async fn cancelled(signal: &mut CancelSignal) {
    let requested = signal.wait_for(|cancel| *cancel).await.is_ok();
    if !requested {
        std::future::pending::<()>().await;
    }
}

/// End-to-end research question answering
pub struct ResearchPipeline {
    retriever: Arc<dyn Retriever>,
    synthesizer: Synthesizer,
    top_k: usize,
}

impl ResearchPipeline {
    pub fn new(retriever: Arc<dyn Retriever>, synthesizer: Synthesizer, top_k: usize) -> Self {
        Self {
            retriever,
            synthesizer,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer `question` from the corpus
    pub async fn run_query(&self, question: &str) -> Result<ResearchAnswer> {
        let (_cancel, signal) = cancel_channel();
        self.run_query_with_cancel(question, signal).await
    }

    /// Answer `question`, giving up with [`AppError::Cancelled`] once `signal` flips
    #[instrument(skip(self, question, signal), fields(top_k = self.top_k))]
    pub async fn run_query_with_cancel(&self, question: &str, mut signal: CancelSignal) -> Result<ResearchAnswer> {
        ensure_active(&signal, "retrieval")?;
        let context = tokio::select! {
            biased;
            _ = cancelled(&mut signal) => {
                return Err(AppError::Cancelled { stage: "retrieval".to_string() });
            }
            result = self.retriever.retrieve(question, self.top_k) => result?,
        };

        ensure_active(&signal, "assembly")?;
        let assembled = assemble(&context);
        let sources = context.len();
        drop(context);

        ensure_active(&signal, "synthesis")?;
        let answer = tokio::select! {
            biased;
            _ = cancelled(&mut signal) => {
                return Err(AppError::Cancelled { stage: "synthesis".to_string() });
            }
            result = self.synthesizer.synthesize(question, &assembled) => result?,
        };

        info!(
            sources,
            evidence = answer.evidence.len(),
            insufficient = answer.is_insufficient(),
            "Query answered"
        );
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesizer::SynthesisOptions;
    use citewise_common::llm::LanguageModel;
    use citewise_common::models::RetrievedContext;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct EmptyRetriever;

    #[async_trait::async_trait]
    impl Retriever for EmptyRetriever {
        async fn retrieve(&self, _query: &str, _k: usize) -> Result<RetrievedContext> {
            Ok(RetrievedContext::empty())
        }
    }

    struct CountingModel(AtomicUsize);

    #[async_trait::async_trait]
    impl LanguageModel for CountingModel {
        async fn invoke(&self, _prompt: &str) -> Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(String::new())
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    fn pipeline(model: Arc<CountingModel>) -> ResearchPipeline {
        ResearchPipeline::new(
            Arc::new(EmptyRetriever),
            Synthesizer::new(model, SynthesisOptions::default()),
            4,
        )
    }

    #[tokio::test]
    async fn test_empty_retrieval_is_insufficient() {
        let model = Arc::new(CountingModel(AtomicUsize::new(0)));
        let answer = pipeline(model.clone()).run_query("anything").await.unwrap();

        assert!(answer.is_insufficient());
        assert!(answer.evidence.is_empty());
        assert_eq!(model.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_precancelled_query_never_retrieves() {
        let model = Arc::new(CountingModel(AtomicUsize::new(0)));
        let (cancel, signal) = cancel_channel();
        cancel.send(true).unwrap();

        let err = pipeline(model)
            .run_query_with_cancel("q", signal)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Cancelled { ref stage } if stage == "retrieval"));
    }

    #[tokio::test]
    async fn test_dropped_sender_does_not_cancel() {
        let model = Arc::new(CountingModel(AtomicUsize::new(0)));
        let (cancel, signal) = cancel_channel();
        drop(cancel);

        let answer = tokio::time::timeout(
            Duration::from_secs(5),
            pipeline(model).run_query_with_cancel("q", signal),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(answer.is_insufficient());
    }
}
