//! End-to-end query pipeline tests with in-process fakes.

use citewise_common::embeddings::{Embedder, HashEmbedder};
use citewise_common::errors::{AppError, Result};
use citewise_common::llm::LanguageModel;
use citewise_common::models::{Chunk, ChunkMetadata, INSUFFICIENT_EVIDENCE};
use citewise_context::prompt::FORMAT_CORRECTION;
use citewise_context::{cancel_channel, ResearchPipeline, SynthesisOptions, Synthesizer};
use citewise_search::{BuildOptions, CorpusIndex, IndexHandle, VectorRetriever};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers only from the `[Source: ..]` blocks in its prompt
struct GroundedModel;

impl GroundedModel {
    fn sources(prompt: &str) -> Vec<(String, String)> {
        let Some(start) = prompt.find("Context:\n") else {
            return Vec::new();
        };
        let rest = &prompt[start + "Context:\n".len()..];
        let end = rest.find("\n\nQuestion:\n").unwrap_or(rest.len());

        rest[..end]
            .split("\n\n")
            .filter_map(|block| {
                let block = block.strip_prefix("[Source: ")?;
                let (name, text) = block.split_once("]\n")?;
                Some((name.to_string(), text.to_string()))
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl LanguageModel for GroundedModel {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let sources = Self::sources(prompt);
        if sources.is_empty() {
            return Ok(INSUFFICIENT_EVIDENCE.to_string());
        }

        let evidence: serde_json::Map<String, serde_json::Value> = sources
            .iter()
            .map(|(name, text)| (name.clone(), serde_json::Value::String(text.clone())))
            .collect();
        let references: Vec<&String> = sources.iter().map(|(name, _)| name).collect();

        Ok(serde_json::json!({
            "answer": sources[0].1,
            "key_points": sources.iter().map(|(_, t)| t).collect::<Vec<_>>(),
            "evidence": evidence,
            "limitations": "Limited to the retrieved passages.",
            "references": references,
        })
        .to_string())
    }

    fn model_name(&self) -> &str {
        "grounded-fake"
    }
}

/// Always returns the same reply and counts prompts
struct FixedModel {
    reply: String,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl FixedModel {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new("{}")
        }
    }
}

#[async_trait::async_trait]
impl LanguageModel for FixedModel {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

struct FailingModel;

#[async_trait::async_trait]
impl LanguageModel for FailingModel {
    async fn invoke(&self, _prompt: &str) -> Result<String> {
        Err(AppError::Internal {
            message: "connection refused".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

fn chunk(paper: &str, text: &str) -> Chunk {
    Chunk::new(
        text.to_string(),
        0,
        ChunkMetadata {
            paper_name: paper.to_string(),
            source_document_id: format!("/corpus/{}", paper),
        },
    )
}

async fn corpus(embedder: &dyn Embedder) -> CorpusIndex {
    CorpusIndex::build(
        "research_papers",
        vec![
            chunk(
                "DeepfakeCNN2021.pdf",
                "We train a ResNet-based classifier on face crops to detect deepfake videos with CNN features.",
            ),
            chunk(
                "SoilMoisture2019.pdf",
                "Capacitive sensors measured soil moisture in alpine meadows over three seasons.",
            ),
        ],
        embedder,
        &BuildOptions::default(),
    )
    .await
    .unwrap()
}

async fn pipeline_with(model: Arc<dyn LanguageModel>, options: SynthesisOptions) -> ResearchPipeline {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(1024));
    let index = corpus(embedder.as_ref()).await;
    let retriever = VectorRetriever::new(Arc::new(IndexHandle::new(index)), embedder, Duration::from_secs(5));
    ResearchPipeline::new(Arc::new(retriever), Synthesizer::new(model, options), 4)
}

#[tokio::test]
async fn test_deepfake_question_cites_source_paper() {
    let pipeline = pipeline_with(Arc::new(GroundedModel), SynthesisOptions::default()).await;

    let answer = pipeline
        .run_query("What CNN architectures are used for deepfake detection?")
        .await
        .unwrap();

    assert!(answer.evidence.contains_key("DeepfakeCNN2021.pdf"));
    assert!(answer.references.iter().any(|r| r == "DeepfakeCNN2021.pdf"));
    assert!(answer.key_points.iter().any(|p| p.contains("ResNet-based classifier")));

    let everything = serde_json::to_string(&answer).unwrap();
    assert!(!everything.contains("GAN"));
}

#[tokio::test]
async fn test_empty_index_yields_insufficient_answer() {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(64));
    let index = CorpusIndex::empty("research_papers", embedder.model_name(), 64);
    let retriever = VectorRetriever::new(Arc::new(IndexHandle::new(index)), embedder, Duration::from_secs(5));
    let model = Arc::new(FixedModel::new("unused"));
    let pipeline = ResearchPipeline::new(
        Arc::new(retriever),
        Synthesizer::new(model.clone(), SynthesisOptions::default()),
        4,
    );

    let answer = pipeline.run_query("anything").await.unwrap();

    assert_eq!(answer.answer, INSUFFICIENT_EVIDENCE);
    assert!(answer.evidence.is_empty());
    assert!(model.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_truncated_json_fails_after_one_retry() {
    let model = Arc::new(FixedModel::new(r#"{"answer": "ResNet", "key_points": ["CNN"#));
    let pipeline = pipeline_with(model.clone(), SynthesisOptions::default()).await;

    let err = pipeline.run_query("What CNN architectures?").await.unwrap_err();

    match err {
        AppError::SchemaParse { raw, attempts, .. } => {
            assert_eq!(attempts, 2);
            assert!(raw.starts_with(r#"{"answer": "ResNet""#));
        }
        other => panic!("expected SchemaParse, got {:?}", other),
    }

    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains(FORMAT_CORRECTION));
}

#[tokio::test]
async fn test_model_timeout_is_distinguishable() {
    let model = Arc::new(FixedModel::slow(Duration::from_secs(3600)));
    let options = SynthesisOptions {
        timeout: Duration::from_millis(20),
        ..SynthesisOptions::default()
    };
    let pipeline = pipeline_with(model, options).await;

    let err = pipeline.run_query("deepfake").await.unwrap_err();
    assert!(matches!(err, AppError::ModelTimeout { timeout_ms: 20 }));
    assert!(err.is_model_failure());
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_model_error_becomes_invocation_error() {
    let pipeline = pipeline_with(Arc::new(FailingModel), SynthesisOptions::default()).await;

    let err = pipeline.run_query("deepfake").await.unwrap_err();
    assert!(matches!(err, AppError::ModelInvocation { .. }));
}

#[tokio::test]
async fn test_cancel_during_synthesis() {
    let model = Arc::new(FixedModel::slow(Duration::from_secs(3600)));
    let pipeline = pipeline_with(model, SynthesisOptions::default()).await;
    let (cancel, signal) = cancel_channel();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        let _ = cancel.send(true);
    });

    let err = tokio::time::timeout(Duration::from_secs(5), pipeline.run_query_with_cancel("deepfake", signal))
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, AppError::Cancelled { ref stage } if stage == "synthesis"));
}
