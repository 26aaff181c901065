use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::chroma::ContextRetriever;
use crate::util::{FileError, FileReader};

use super::parser::{self, EvaluationResult, ParseError};
use super::{prompts, LlmError, TextGenerator};

/// Passages requested from the context store per evaluation
pub const TOP_K: usize = 5;

/// Retrieval queries are capped to keep request sizes reasonable
const MAX_QUERY_CHARS: usize = 1000;

/// Errors that terminate a pipeline run
#[derive(Debug)]
pub enum PipelineError {
    /// A source document could not be loaded; not retried, bad input is not
    /// transient
    InputUnreadable(String),

    /// One of the two load-bearing LLM calls failed
    Llm(LlmError),

    /// Stage-2 output could not be parsed into a trustworthy result
    Parse(ParseError),
}

impl PipelineError {
    /// Short classification label persisted with failed jobs
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InputUnreadable(_) => "input_unreadable",
            PipelineError::Llm(LlmError::QuotaExceeded(_)) => "provider_quota_exceeded",
            PipelineError::Llm(LlmError::SafetyBlocked) => "provider_safety_blocked",
            PipelineError::Llm(LlmError::EmptyResponse) => "provider_empty_response",
            PipelineError::Llm(LlmError::Provider(_)) => "provider_error",
            PipelineError::Parse(_) => "result_unparsable",
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InputUnreadable(detail) => {
                write!(f, "failed to read input document: {}", detail)
            }
            PipelineError::Llm(e) => write!(f, "{}", e),
            PipelineError::Parse(e) => write!(f, "failed to parse evaluation result: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<LlmError> for PipelineError {
    fn from(e: LlmError) -> Self {
        PipelineError::Llm(e)
    }
}

impl From<ParseError> for PipelineError {
    fn from(e: ParseError) -> Self {
        PipelineError::Parse(e)
    }
}

/// Orchestrates one evaluation: document loading, stage-1 analysis, context
/// retrieval, stage-2 evaluation, result parsing.
pub struct EvaluationPipeline {
    file_reader: FileReader,
    generator: Arc<dyn TextGenerator>,
    retriever: Arc<dyn ContextRetriever>,
}

impl EvaluationPipeline {
    pub fn new(
        file_reader: FileReader,
        generator: Arc<dyn TextGenerator>,
        retriever: Arc<dyn ContextRetriever>,
    ) -> Self {
        Self {
            file_reader,
            generator,
            retriever,
        }
    }

    /// Run the full evaluation. Stages execute strictly in order; only the
    /// retrieval step may fail without aborting the run.
    pub async fn run(
        &self,
        cv_path: &str,
        report_path: &str,
    ) -> Result<EvaluationResult, PipelineError> {
        info!("Starting evaluation pipeline: cv={}, report={}", cv_path, report_path);

        let cv = self.load_document(cv_path)?;
        let report = self.load_document(report_path)?;
        info!("Loaded documents: cv={} chars, report={} chars", cv.len(), report.len());

        let stage1 = self
            .generator
            .generate(&prompts::stage1_analysis(&cv, &report))
            .await?;
        info!("Stage 1 analysis completed");

        let context = self.retrieve_context(&cv, &report).await;

        let stage2 = self
            .generator
            .generate(&prompts::stage2_evaluation(&stage1, &context, &cv, &report))
            .await?;
        info!("Stage 2 evaluation completed");

        let result = parser::parse(&stage2)?;
        info!("Evaluation pipeline completed successfully");
        Ok(result)
    }

    fn load_document(&self, path: &str) -> Result<String, PipelineError> {
        self.file_reader.read(path).map_err(|e: FileError| {
            PipelineError::InputUnreadable(format!("{}: {}", path, e))
        })
    }

    /// Query the guideline store; any failure or empty result falls back to
    /// the built-in default context so stage 2 always receives grounding text.
    async fn retrieve_context(&self, cv: &str, report: &str) -> Vec<String> {
        let query = build_query(cv, report);

        match self.retriever.query(&query, TOP_K).await {
            Ok(passages) if !passages.is_empty() => {
                info!("Retrieved {} context passages", passages.len());
                passages
            }
            Ok(_) => {
                warn!("Context store returned no passages, using default context");
                default_context()
            }
            Err(e) => {
                warn!("Context retrieval failed, using default context: {}", e);
                default_context()
            }
        }
    }
}

fn build_query(cv: &str, report: &str) -> String {
    let combined = format!("{} {}", cv, report);
    if combined.chars().count() <= MAX_QUERY_CHARS {
        combined
    } else {
        combined.chars().take(MAX_QUERY_CHARS).collect()
    }
}

/// Minimal grounding used when the context store is unavailable: one passage
/// for CV assessment and one for project assessment.
fn default_context() -> Vec<String> {
    vec![
        "CV assessment guideline: judge experience level (junior 0-2 years, \
         mid-level 2-5 years, senior 5+ years), technical skill proficiency, \
         and how directly the listed skills match the project's requirements."
            .to_string(),
        "Project assessment guideline: score code quality, architecture and \
         separation of concerns, working functionality, and technical \
         implementation including database integration, testing, and \
         deployment readiness on a 0-10 scale."
            .to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Write;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::chroma::RetrievalError;

    use super::*;

    const STAGE2_OK: &str = r#"Evaluation complete: {
        "cv_match_rate": 0.82,
        "cv_feedback": "strong backend skills",
        "project_score": 7.0,
        "project_feedback": "well structured",
        "overall_summary": "recommended"
    }"#;

    /// Generator fed a script of responses; records every prompt it receives
    struct ScriptedGenerator {
        responses: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<Result<String, LlmError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn recorded_prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyResponse))
        }
    }

    enum RetrieverScript {
        Passages(Vec<String>),
        Empty,
        Fail,
    }

    struct ScriptedRetriever(RetrieverScript);

    #[async_trait]
    impl ContextRetriever for ScriptedRetriever {
        async fn query(&self, _text: &str, _k: usize) -> Result<Vec<String>, RetrievalError> {
            match &self.0 {
                RetrieverScript::Passages(p) => Ok(p.clone()),
                RetrieverScript::Empty => Ok(Vec::new()),
                RetrieverScript::Fail => {
                    Err(RetrievalError::Unavailable("connection refused".to_string()))
                }
            }
        }
    }

    fn temp_doc(name: &str, content: &str) -> String {
        let path = std::env::temp_dir().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn pipeline(
        generator: Arc<ScriptedGenerator>,
        retriever: RetrieverScript,
    ) -> EvaluationPipeline {
        EvaluationPipeline::new(
            FileReader::new(),
            generator,
            Arc::new(ScriptedRetriever(retriever)),
        )
    }

    #[tokio::test]
    async fn full_run_produces_parsed_result() {
        let cv = temp_doc("pipeline_ok_cv.txt", "Software Engineer, 3 years, Go/Python/React");
        let report = temp_doc("pipeline_ok_report.txt", "Built REST API with Go, PostgreSQL, Docker");

        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok("stage one analysis".to_string()),
            Ok(STAGE2_OK.to_string()),
        ]));
        let p = pipeline(
            generator.clone(),
            RetrieverScript::Passages(vec!["scoring rubric passage".to_string()]),
        );

        let result = p.run(&cv, &report).await.unwrap();
        assert_eq!(result.cv_match_rate, 0.82);
        assert_eq!(result.project_score, 7.0);

        let prompts = generator.recorded_prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Software Engineer, 3 years"));
        assert!(prompts[1].contains("stage one analysis"));
        assert!(prompts[1].contains("scoring rubric passage"));
    }

    #[tokio::test]
    async fn retrieval_failure_falls_back_to_default_context() {
        let cv = temp_doc("pipeline_fallback_cv.txt", "cv text");
        let report = temp_doc("pipeline_fallback_report.txt", "report text");

        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok("analysis".to_string()),
            Ok(STAGE2_OK.to_string()),
        ]));
        let p = pipeline(generator.clone(), RetrieverScript::Fail);

        let result = p.run(&cv, &report).await.unwrap();
        assert_eq!(result.cv_match_rate, 0.82);

        // Stage 2 still ran, grounded in both default passages
        let prompts = generator.recorded_prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("CV assessment guideline"));
        assert!(prompts[1].contains("Project assessment guideline"));
    }

    #[tokio::test]
    async fn empty_retrieval_also_uses_default_context() {
        let cv = temp_doc("pipeline_empty_cv.txt", "cv text");
        let report = temp_doc("pipeline_empty_report.txt", "report text");

        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok("analysis".to_string()),
            Ok(STAGE2_OK.to_string()),
        ]));
        let p = pipeline(generator.clone(), RetrieverScript::Empty);

        p.run(&cv, &report).await.unwrap();
        assert!(generator.recorded_prompts()[1].contains("CV assessment guideline"));
    }

    #[tokio::test]
    async fn unreadable_input_fails_before_any_llm_call() {
        let report = temp_doc("pipeline_missing_report.txt", "report text");

        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let p = pipeline(generator.clone(), RetrieverScript::Empty);

        let err = p.run("/nonexistent/cv.txt", &report).await.unwrap_err();
        assert_eq!(err.kind(), "input_unreadable");
        assert!(generator.recorded_prompts().is_empty());
    }

    #[tokio::test]
    async fn stage1_quota_failure_is_fatal() {
        let cv = temp_doc("pipeline_quota_cv.txt", "cv text");
        let report = temp_doc("pipeline_quota_report.txt", "report text");

        let generator = Arc::new(ScriptedGenerator::new(vec![Err(
            LlmError::QuotaExceeded("429".to_string()),
        )]));
        let p = pipeline(generator.clone(), RetrieverScript::Empty);

        let err = p.run(&cv, &report).await.unwrap_err();
        assert_eq!(err.kind(), "provider_quota_exceeded");
        assert_eq!(generator.recorded_prompts().len(), 1);
    }

    #[tokio::test]
    async fn unparsable_stage2_output_is_fatal() {
        let cv = temp_doc("pipeline_parse_cv.txt", "cv text");
        let report = temp_doc("pipeline_parse_report.txt", "report text");

        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok("analysis".to_string()),
            Ok("I cannot produce a score today.".to_string()),
        ]));
        let p = pipeline(generator, RetrieverScript::Empty);

        let err = p.run(&cv, &report).await.unwrap_err();
        assert_eq!(err.kind(), "result_unparsable");
    }

    #[test]
    fn query_is_truncated_to_limit() {
        let long = "x".repeat(2000);
        let query = build_query(&long, "tail");
        assert_eq!(query.chars().count(), 1000);
    }

    #[test]
    fn default_context_has_cv_and_project_passages() {
        let context = default_context();
        assert!(context.len() >= 2);
        assert!(context[0].contains("CV assessment"));
        assert!(context[1].contains("Project assessment"));
    }
}
