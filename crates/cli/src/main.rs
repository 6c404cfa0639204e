//! reviewgate CLI - rubric-based screening of research papers.

use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use reviewgate_core::{ReviewId, Rubric};
use reviewgate_quality::{load_rubric, BatchSummary, DocumentAnswers, ReportedVerdict, ReviewEngine, ReviewOutcome};
use reviewgate_storage::{JsonStorage, ReviewFilter, SheetExporter, Storage, StoredReview};
use reviewgate_ai::{ChatCompletionClient, DocumentReviewer, LlmClient, LlmConfig, ResponseScorer, ReviewedDocument};

#[derive(Parser)]
#[command(name = "reviewgate")]
#[command(about = "Rubric-based paper screening", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Storage path for review data
    #[arg(short, long, global = true, default_value = ".reviewgate")]
    storage: PathBuf,

    /// Rubric definition (YAML)
    #[arg(short, long, global = true, default_value = "config/review_data.yaml")]
    rubric: PathBuf,
}

#[derive(clap::Args)]
struct LlmArgs {
    /// LLM server URL
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    url: String,
    /// Model name
    #[arg(long, default_value = "deepseek-r1-distill-qwen-7b")]
    model: String,
    /// Sampling temperature
    #[arg(long, default_value = "0.7")]
    temperature: f32,
    /// Completion token limit
    #[arg(long)]
    max_tokens: Option<i64>,
    /// Request timeout in seconds
    #[arg(long, default_value = "300")]
    timeout: u64,
}

impl LlmArgs {
    fn config(&self) -> LlmConfig {
        LlmConfig {
            base_url: self.url.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_secs: self.timeout,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the rubric and show its limits
    Validate,
    /// Print the analysis prompt for the rubric
    Prompt,
    /// Score a batch of answers (JSON)
    Score {
        /// Answers file: [{"document_id": ..., "answers": {...}}]
        answers: PathBuf,
        /// Save the results
        #[arg(long)]
        store: bool,
        /// Print outcomes as JSON
        #[arg(long)]
        json: bool,
    },
    /// Score a saved LLM response
    Ingest {
        /// Response text file
        response: PathBuf,
        /// Document id (defaults to the file name)
        #[arg(long)]
        document: Option<String>,
    },
    /// Review document text files through the LLM
    Review {
        /// Document text files
        #[arg(required = true)]
        documents: Vec<PathBuf>,
        #[command(flatten)]
        llm: LlmArgs,
    },
    /// Check that the LLM server is reachable
    CheckLlm {
        #[command(flatten)]
        llm: LlmArgs,
    },
    /// List stored reviews
    List {
        /// Filter by verdict (accept, reject, indeterminate)
        #[arg(long)]
        verdict: Option<String>,
    },
    /// Show one stored review
    Show {
        /// Review ID
        id: String,
        /// Also print the raw LLM response
        #[arg(long)]
        response: bool,
    },
    /// Delete a stored review
    Delete {
        /// Review ID
        id: String,
    },
    /// Show verdict counts
    Summary,
    /// List accepted reviews with missing extraction fields
    Missing,
    /// Export the QA and DE sheets as CSV
    Export {
        /// Output directory
        #[arg(long, default_value = "output")]
        out_dir: PathBuf,
    },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate => {
            let rubric = open_rubric(&cli.rubric)?;
            println!("Rubric: {}", cli.rubric.display());
            println!("  Questions: {}", rubric.questions().len());
            for question in rubric.questions() {
                let marker = if rubric.is_excluded(question.id().as_str()) { " (excluded)" } else { "" };
                println!(
                    "    {} max {}{} - {}",
                    question.id(),
                    question.scores().max(),
                    marker,
                    question.question()
                );
            }
            println!("  Extraction fields: {}", rubric.data_extraction_fields().len());
            println!("  Cutoff score: {}", rubric.cutoff_score());
            println!("  Max possible score: {}", rubric.max_possible_score());
            if !rubric.cutoff_reachable() {
                println!("  WARNING: cutoff is unreachable; every document will be rejected");
            }
        }
        Commands::Prompt => {
            let rubric = open_rubric(&cli.rubric)?;
            println!("{}", reviewgate_ai::analysis_prompt(&rubric));
        }
        Commands::Score { answers, store, json } => {
            let engine = ReviewEngine::new(open_rubric(&cli.rubric)?);
            let text = std::fs::read_to_string(&answers)
                .with_context(|| format!("Failed to read {}", answers.display()))?;
            let documents: Vec<DocumentAnswers> = serde_json::from_str(&text)
                .with_context(|| format!("Invalid answers file {}", answers.display()))?;

            let outcomes = engine.review_concurrently(documents).await?;
            let summary = BatchSummary::from_outcomes(&outcomes);

            if json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                for outcome in &outcomes {
                    print_outcome(outcome);
                }
                print_summary(&summary);
            }

            if store {
                let mut storage = JsonStorage::new(&cli.storage).await?;
                for outcome in outcomes {
                    storage.save_review(&StoredReview::new(outcome)).await?;
                }
                storage.commit("Score answers batch").await?;
                info!("Stored {} reviews in {}", summary.documents, cli.storage.display());
            }
        }
        Commands::Ingest { response, document } => {
            let engine = ReviewEngine::new(open_rubric(&cli.rubric)?);
            let scorer = ResponseScorer::new(engine)?;
            let text = std::fs::read_to_string(&response)
                .with_context(|| format!("Failed to read {}", response.display()))?;
            let document = document.unwrap_or_else(|| file_name(&response));

            let reviewed = scorer.review_response(document, text);
            print_outcome(&reviewed.outcome);

            let mut storage = JsonStorage::new(&cli.storage).await?;
            let id = store_reviewed(&mut storage, reviewed).await?;
            storage.commit("Ingest response").await?;
            println!("Stored review {}", id);
        }
        Commands::Review { documents, llm } => {
            let engine = ReviewEngine::new(open_rubric(&cli.rubric)?);
            let reviewer = DocumentReviewer::new(engine, ChatCompletionClient::new(llm.config())?)?;
            let mut storage = JsonStorage::new(&cli.storage).await?;

            let run = review_documents(&reviewer, &mut storage, &documents).await;
            print_summary(&run.summary);
            if !run.skipped.is_empty() {
                println!("  Skipped (counted as indeterminate): {}", run.skipped.len());
                for (path, reason) in &run.skipped {
                    println!("    {}: {}", path.display(), reason);
                }
            }
        }
        Commands::CheckLlm { llm } => {
            let client = ChatCompletionClient::new(llm.config())?;
            let status = client.health_check().await?;
            if !status.reachable {
                println!("LLM server at {} is not reachable", llm.url);
                anyhow::bail!("LLM server unavailable");
            }
            println!("LLM server at {} is reachable", llm.url);
            println!("  Models: {}", status.models.join(", "));
            if status.model_available {
                println!("  Model {} is available", llm.model);
            } else {
                println!("  Model {} is NOT loaded", llm.model);
            }
        }
        Commands::List { verdict } => {
            let storage = JsonStorage::new(&cli.storage).await?;
            let filter = ReviewFilter {
                verdict: verdict
                    .map(|v| v.parse::<ReportedVerdict>().map_err(anyhow::Error::msg))
                    .transpose()?
                    .map(|v| vec![v]),
                ..Default::default()
            };
            let reviews = storage.list_reviews(&filter).await?;

            println!("Reviews ({})", reviews.len());
            for review in reviews {
                println!(
                    "  {} | {} | {} | {}",
                    review.id,
                    review.verdict(),
                    format_total(&review.outcome),
                    review.display_title(),
                );
            }
        }
        Commands::Show { id, response } => {
            let storage = JsonStorage::new(&cli.storage).await?;
            let id: ReviewId = id.parse().context("Invalid review ID")?;
            let Some(review) = storage.load_review(id).await? else {
                println!("Review not found");
                return Ok(());
            };

            println!("Review: {}", review.id);
            println!("  Document: {}", review.document_id);
            println!("  Title: {}", review.display_title());
            println!("  Verdict: {}", review.verdict());
            println!("  Score: {}", format_total(&review.outcome));
            if let Some(error) = review.outcome.error() {
                println!("  Error: {}", error);
            }
            if let Some(record) = review.outcome.record() {
                for (question, score) in record.answers().iter() {
                    println!("    {}: {}", question, score);
                }
            }
            for (key, value) in &review.extracted {
                println!("  {}: {}", key, value);
            }
            println!("  Reviewed: {}", review.reviewed_at);

            if response {
                match &review.response_file {
                    Some(file) => match storage.load_response(file).await? {
                        Some(text) => println!("\n{}", text),
                        None => println!("Response file {} is missing", file),
                    },
                    None => println!("No response saved"),
                }
            }
        }
        Commands::Delete { id } => {
            let mut storage = JsonStorage::new(&cli.storage).await?;
            let id: ReviewId = id.parse().context("Invalid review ID")?;
            storage.delete_review(id).await?;
            storage.commit("Delete review").await?;
            println!("Deleted review {}", id);
        }
        Commands::Summary => {
            let storage = JsonStorage::new(&cli.storage).await?;
            let reviews = storage.list_reviews(&ReviewFilter::default()).await?;
            print_summary(&BatchSummary::from_outcomes(reviews.iter().map(|r| &r.outcome)));
        }
        Commands::Missing => {
            let rubric = open_rubric(&cli.rubric)?;
            let storage = JsonStorage::new(&cli.storage).await?;

            let mut incomplete = 0;
            for review in rescored_reviews(&storage, &rubric).await? {
                if !review.outcome.is_accepted() {
                    continue;
                }
                let missing = review.missing_fields(&rubric);
                if missing.is_empty() {
                    continue;
                }
                incomplete += 1;
                println!("{} ({})", review.display_title(), review.id);
                println!("  Missing: {}", missing.join(", "));
            }
            if incomplete == 0 {
                println!("All accepted reviews have every extraction field");
            }
        }
        Commands::Export { out_dir } => {
            let rubric = open_rubric(&cli.rubric)?;
            let storage = JsonStorage::new(&cli.storage).await?;
            let reviews = rescored_reviews(&storage, &rubric).await?;
            let sheets = SheetExporter::new(&rubric).export_to_dir(&reviews, &out_dir)?;
            println!("QA sheet: {} ({} rows)", sheets.quality_sheet.display(), sheets.quality_rows);
            println!("DE sheet: {} ({} rows)", sheets.extraction_sheet.display(), sheets.extraction_rows);
        }
    }

    Ok(())
}

fn open_rubric(path: &Path) -> Result<Rubric> {
    load_rubric(path).with_context(|| format!("Cannot use rubric {}", path.display()))
}

/// Every stored review, scored again against `rubric`.
///
/// Review files can be edited by hand or written under another rubric, so
/// their recorded totals and verdicts are not trusted for output.
async fn rescored_reviews<S: Storage>(storage: &S, rubric: &Rubric) -> Result<Vec<StoredReview>> {
    let mut reviews = storage.list_reviews(&ReviewFilter::default()).await?;
    let changed = reviews.iter_mut().map(|r| r.rescore(rubric)).filter(|&changed| changed).count();
    if changed > 0 {
        warn!("{} stored review(s) re-scored with a different outcome", changed);
    }
    Ok(reviews)
}

/// Result of running documents through the LLM.
struct ReviewRun {
    summary: BatchSummary,
    skipped: Vec<(PathBuf, String)>,
}

/// Review and store each document on its own commit.
///
/// A document that cannot be read, reviewed or stored is skipped and counted
/// as indeterminate; its staged writes are rolled back.
async fn review_documents<C: LlmClient, S: Storage>(
    reviewer: &DocumentReviewer<C>,
    storage: &mut S,
    documents: &[PathBuf],
) -> ReviewRun {
    let mut run = ReviewRun {
        summary: BatchSummary::default(),
        skipped: Vec::new(),
    };

    for path in documents {
        match review_one(reviewer, storage, path).await {
            Ok(verdict) => run.summary.record(verdict),
            Err(e) => {
                warn!("Skipping {}: {:#}", path.display(), e);
                if let Err(rollback) = storage.rollback().await {
                    warn!("Rollback failed: {}", rollback);
                }
                run.summary.record(ReportedVerdict::Indeterminate);
                run.skipped.push((path.clone(), format!("{:#}", e)));
            }
        }
    }
    run
}

async fn review_one<C: LlmClient, S: Storage>(
    reviewer: &DocumentReviewer<C>,
    storage: &mut S,
    path: &Path,
) -> Result<ReportedVerdict> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let reviewed = reviewer.review_text(file_name(path), &text).await?;
    print_outcome(&reviewed.outcome);

    let verdict = reviewed.outcome.verdict();
    let document = reviewed.outcome.document_id().clone();
    store_reviewed(storage, reviewed).await?;
    storage.commit(&format!("Review {}", document)).await?;
    Ok(verdict)
}

async fn store_reviewed<S: Storage>(storage: &mut S, reviewed: ReviewedDocument) -> Result<ReviewId> {
    let ReviewedDocument { outcome, extracted, title, raw_response } = reviewed;
    let mut review = StoredReview::new(outcome).with_extracted(extracted);
    if let Some(title) = title {
        review = review.with_title(title);
    }
    review.response_file = Some(storage.save_response(review.id, &raw_response).await?);
    storage.save_review(&review).await?;
    Ok(review.id)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_total(outcome: &ReviewOutcome) -> String {
    match outcome.record() {
        Some(record) => format!("{} / {}", record.total_score(), record.max_possible_score()),
        None => "-".to_string(),
    }
}

fn print_outcome(outcome: &ReviewOutcome) {
    match outcome.error() {
        Some(error) => println!("{}: {} ({})", outcome.document_id(), outcome.verdict(), error),
        None => println!("{}: {} ({})", outcome.document_id(), outcome.verdict(), format_total(outcome)),
    }
}

fn print_summary(summary: &BatchSummary) {
    println!("Documents: {}", summary.documents);
    println!("  Accepted: {}", summary.accepted);
    println!("  Rejected: {}", summary.rejected);
    println!("  Indeterminate: {}", summary.indeterminate);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_review_flags() {
        let cli = Cli::try_parse_from([
            "reviewgate", "review", "a.txt", "b.txt", "--model", "qwen", "--max-tokens", "512",
        ])
        .unwrap();
        let Commands::Review { documents, llm } = cli.command else {
            panic!("expected review command");
        };
        assert_eq!(documents.len(), 2);
        let config = llm.config();
        assert_eq!(config.model, "qwen");
        assert_eq!(config.max_tokens, Some(512));
        assert_eq!(config.base_url, LlmConfig::default().base_url);
        assert_eq!(cli.storage, PathBuf::from(".reviewgate"));
    }

    #[test]
    fn test_review_requires_documents() {
        assert!(Cli::try_parse_from(["reviewgate", "review"]).is_err());
    }

    #[test]
    fn test_global_flags_after_command() {
        let cli = Cli::try_parse_from(["reviewgate", "list", "--storage", "/tmp/x", "--verdict", "accept"]).unwrap();
        assert_eq!(cli.storage, PathBuf::from("/tmp/x"));
        assert!(matches!(cli.command, Commands::List { verdict: Some(_) }));
    }

    struct ScriptedClient;

    #[async_trait::async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(&self, prompt: &str) -> Result<String> {
            if prompt.ends_with("offline") {
                anyhow::bail!("connection refused");
            }
            Ok("QE1: ok\nQE1 Score: 1\nQE2: ok\nQE2 Score: 1\n".to_string())
        }

        async fn health_check(&self) -> Result<reviewgate_ai::ApiStatus> {
            Ok(reviewgate_ai::ApiStatus {
                reachable: true,
                models: Vec::new(),
                model_available: true,
            })
        }
    }

    const RUBRIC: &str = r#"
quality_assessment_questions:
  - id: QE1
    question: Sound method?
    scores: [0.0, 1.0]
  - id: QE2
    question: Clear results?
    scores: [0.0, 1.0]
cutoff_score: 2.0
"#;

    #[tokio::test]
    async fn test_review_counts_skipped_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "paper text").unwrap();
        std::fs::write(dir.path().join("b.txt"), "offline").unwrap();
        let documents = vec![
            dir.path().join("a.txt"),
            dir.path().join("b.txt"),
            dir.path().join("missing.txt"),
        ];

        let engine = ReviewEngine::new(reviewgate_quality::load_rubric_str(RUBRIC).unwrap());
        let reviewer = DocumentReviewer::new(engine, ScriptedClient).unwrap();
        let mut storage = JsonStorage::new(dir.path().join("store")).await.unwrap();

        let run = review_documents(&reviewer, &mut storage, &documents).await;
        assert_eq!(run.summary.documents, 3);
        assert_eq!(run.summary.accepted, 1);
        assert_eq!(run.summary.indeterminate, 2);
        let skipped: Vec<_> = run.skipped.iter().map(|(p, _)| file_name(p)).collect();
        assert_eq!(skipped, vec!["b.txt", "missing.txt"]);

        assert_eq!(storage.pending_changes(), 0);
        let stored = storage.list_reviews(&ReviewFilter::default()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].document_id.as_str(), "a.txt");
        assert!(stored[0].response_file.is_some());
    }

    #[tokio::test]
    async fn test_stored_verdicts_follow_current_rubric() {
        let dir = tempfile::tempdir().unwrap();
        let lenient = reviewgate_quality::load_rubric_str(&RUBRIC.replace("cutoff_score: 2.0", "cutoff_score: 1.0")).unwrap();
        let strict = reviewgate_quality::load_rubric_str(RUBRIC).unwrap();

        let answers = reviewgate_core::Answers::new().with("QE1", 1.0).with("QE2", 0.0);
        let outcome = ReviewEngine::new(lenient).review_outcome(DocumentAnswers::new("a.txt", answers));
        assert!(outcome.is_accepted());

        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        let review = StoredReview::new(outcome)
            .with_extracted([("TITLE".to_string(), "Robots".to_string())].into_iter().collect());
        storage.save_review(&review).await.unwrap();
        storage.commit("Store").await.unwrap();

        let reviews = rescored_reviews(&storage, &strict).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].verdict(), ReportedVerdict::Reject);
        assert!(reviews[0].extracted.is_empty());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(Path::new("papers/lei2021.txt")), "lei2021.txt");
    }
}
