use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local};
use log::{info, warn};
use serde::Serialize;

use crate::error::SgptError;
use crate::handler::PromptHandler;
use crate::render::Printer;

const SEPARATOR_WIDTH: usize = 80;
const SUMMARY_QUESTION_CHARS: usize = 50;

/// File format of saved batch results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
    Md,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Md => "md",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = SgptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" => Ok(OutputFormat::Txt),
            "json" => Ok(OutputFormat::Json),
            "md" => Ok(OutputFormat::Md),
            other => Err(SgptError::Usage(format!(
                "Unsupported output format \"{other}\", expected txt, json or md"
            ))),
        }
    }
}

/// Outcome of one question.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub question: String,
    pub answer: String,
    /// Empty when the question succeeded
    pub error: String,
    pub timestamp: DateTime<Local>,
}

impl BatchResult {
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: JsonMetadata,
    results: &'a [BatchResult],
}

#[derive(Serialize)]
struct JsonMetadata {
    generated_at: DateTime<Local>,
    #[serde(flatten)]
    summary: BatchSummary,
}

/// Runs a list of questions through one handler and collects the results.
#[derive(Debug)]
pub struct BatchProcessor {
    output_path: PathBuf,
    results: Vec<BatchResult>,
}

impl BatchProcessor {
    /// `output_path` defaults to `batch_results_<timestamp>` in the working
    /// directory. Its extension is replaced by the output format's.
    pub fn new(output_path: Option<PathBuf>) -> Self {
        let output_path = output_path.unwrap_or_else(|| {
            PathBuf::from(format!(
                "batch_results_{}",
                Local::now().format("%Y%m%d_%H%M%S")
            ))
        });
        Self {
            output_path,
            results: Vec::new(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn results(&self) -> &[BatchResult] {
        &self.results
    }

    pub fn add_result(&mut self, question: &str, outcome: Result<String, SgptError>) {
        let (answer, error) = match outcome {
            Ok(answer) => (answer, String::new()),
            Err(err) => (String::new(), err.to_string()),
        };
        self.results.push(BatchResult {
            question: question.to_string(),
            answer,
            error,
            timestamp: Local::now(),
        });
    }

    /// Sends every question in order. A failed question is recorded and the
    /// batch goes on.
    pub async fn process(
        &mut self,
        questions: &[String],
        handler: &mut dyn PromptHandler,
        printer: &dyn Printer,
    ) {
        let total = questions.len();
        for (idx, question) in questions.iter().enumerate() {
            printer.notice(&format!("Processing question {}/{total}...", idx + 1));
            let outcome = handler.handle(question).await;
            if let Err(err) = &outcome {
                warn!("batch question {} failed: {err}", idx + 1);
            }
            self.add_result(question, outcome);
        }
    }

    pub fn summary(&self) -> BatchSummary {
        let failed = self.results.iter().filter(|r| r.is_error()).count();
        BatchSummary {
            total: self.results.len(),
            success: self.results.len() - failed,
            failed,
        }
    }

    pub fn print_summary(&self, printer: &dyn Printer) {
        let summary = self.summary();
        printer.notice("Batch processing finished.");
        printer.notice(&format!(
            "Total: {} | Success: {} | Failed: {}",
            summary.total, summary.success, summary.failed
        ));
        if summary.failed == 0 {
            return;
        }
        printer.notice("Failed questions:");
        for (idx, result) in self.results.iter().enumerate() {
            if result.is_error() {
                let short: String = result.question.chars().take(SUMMARY_QUESTION_CHARS).collect();
                printer.notice(&format!("  {}. {short}...", idx + 1));
                printer.notice(&format!("     Error: {}", result.error));
            }
        }
    }

    /// Writes the results and returns the path written.
    pub fn save(&self, format: OutputFormat) -> Result<PathBuf, SgptError> {
        let path = self.output_path.with_extension(format.extension());
        let contents = match format {
            OutputFormat::Txt => self.render_txt(),
            OutputFormat::Json => self.render_json()?,
            OutputFormat::Md => self.render_md(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        info!("saved {} batch results to {}", self.results.len(), path.display());
        Ok(path)
    }

    fn render_txt(&self) -> String {
        let summary = self.summary();
        let rule = "=".repeat(SEPARATOR_WIDTH);
        let mut out = String::new();
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Batch results");
        let _ = writeln!(out, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "Total questions: {}", summary.total);
        let _ = writeln!(out, "Succeeded: {}", summary.success);
        let _ = writeln!(out, "Failed: {}", summary.failed);
        let _ = writeln!(out, "{rule}\n");
        for (idx, result) in self.results.iter().enumerate() {
            let _ = writeln!(out, "\n{rule}\nQuestion #{}\n{rule}\n", idx + 1);
            let _ = writeln!(out, "[Question]\n{}\n", result.question);
            if result.is_error() {
                let _ = writeln!(out, "[Error]\n{}\n", result.error);
            } else {
                let _ = writeln!(out, "[Answer]\n{}\n", result.answer);
            }
            let _ = writeln!(out, "Time: {}", result.timestamp.to_rfc3339());
        }
        out
    }

    fn render_json(&self) -> Result<String, SgptError> {
        let report = JsonReport {
            metadata: JsonMetadata {
                generated_at: Local::now(),
                summary: self.summary(),
            },
            results: &self.results,
        };
        serde_json::to_string_pretty(&report)
            .map_err(|err| SgptError::MalformedInput(err.to_string()))
    }

    fn render_md(&self) -> String {
        let summary = self.summary();
        let mut out = String::new();
        let _ = writeln!(out, "# Batch results\n");
        let _ = writeln!(
            out,
            "**Generated:** {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "**Total questions:** {}\n", summary.total);
        let _ = writeln!(out, "**Succeeded:** {}\n", summary.success);
        let _ = writeln!(out, "**Failed:** {}\n", summary.failed);
        let _ = writeln!(out, "---\n");
        for (idx, result) in self.results.iter().enumerate() {
            let _ = writeln!(out, "## Question #{}\n", idx + 1);
            let _ = writeln!(out, "**Question:**\n\n```\n{}\n```\n", result.question);
            if result.is_error() {
                let _ = writeln!(out, "**Error:**\n\n```\n{}\n```\n", result.error);
            } else {
                let _ = writeln!(out, "**Answer:**\n\n{}\n", result.answer);
            }
            let _ = writeln!(out, "*Time: {}*\n", result.timestamp.to_rfc3339());
            let _ = writeln!(out, "---\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chat::CompletionParams;
    use crate::handler::{Completer, DefaultHandler};
    use crate::role::Role;
    use crate::testing::{RecordingPrinter, ScriptedClient};

    async fn run_three_with_second_failing(output: PathBuf) -> (BatchProcessor, RecordingPrinter) {
        let client = ScriptedClient::with_results([
            Ok("four".to_string()),
            Err("rate limited".to_string()),
            Ok("paris".to_string()),
        ]);
        let printer = RecordingPrinter::default();
        let completer = Completer::new(
            Arc::new(client),
            CompletionParams::new("gpt-4o"),
            Arc::new(printer.clone()),
        );
        let mut handler = DefaultHandler::new(completer, Role::new("ShellGPT", "Answer.", None));
        let questions = vec![
            "2+2?".to_string(),
            "why?".to_string(),
            "capital of France?".to_string(),
        ];
        let mut processor = BatchProcessor::new(Some(output));
        processor.process(&questions, &mut handler, &printer).await;
        (processor, printer)
    }

    #[tokio::test]
    async fn failed_question_is_recorded_and_batch_continues() {
        let dir = tempfile::tempdir().unwrap();
        let (processor, printer) = run_three_with_second_failing(dir.path().join("out")).await;

        let results = processor.results();
        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().filter(|r| !r.error.is_empty()).count(), 1);
        assert!(results[1].error.contains("rate limited"));
        assert_eq!(results[2].answer, "paris");
        assert_eq!(
            processor.summary(),
            BatchSummary {
                total: 3,
                success: 2,
                failed: 1
            }
        );
        assert!(printer
            .lines()
            .contains(&"notice: Processing question 3/3...".to_string()));
    }

    #[tokio::test]
    async fn saves_json_report_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let (processor, _) = run_three_with_second_failing(dir.path().join("out.txt")).await;

        let path = processor.save(OutputFormat::Json).unwrap();
        assert_eq!(path, dir.path().join("out.json"));
        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(report["metadata"]["total"], 3);
        assert_eq!(report["metadata"]["failed"], 1);
        assert_eq!(report["results"][0]["answer"], "four");
        assert_eq!(report["results"][0]["error"], "");
    }

    #[tokio::test]
    async fn saves_text_and_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let (processor, printer) = run_three_with_second_failing(dir.path().join("out")).await;

        let txt = fs::read_to_string(processor.save(OutputFormat::Txt).unwrap()).unwrap();
        assert!(txt.contains("Question #2"));
        assert!(txt.contains("[Error]"));
        assert!(txt.contains("[Answer]\nparis"));

        let md = fs::read_to_string(processor.save(OutputFormat::Md).unwrap()).unwrap();
        assert!(md.contains("## Question #3"));
        assert!(md.contains("**Failed:** 1"));

        processor.print_summary(&printer);
        assert!(printer
            .lines()
            .contains(&"notice: Total: 3 | Success: 2 | Failed: 1".to_string()));
    }

    #[test]
    fn default_output_path_is_timestamped() {
        let processor = BatchProcessor::new(None);
        let name = processor.output_path().to_string_lossy().into_owned();
        assert!(name.starts_with("batch_results_"));
        assert_eq!(name.len(), "batch_results_20240101_120000".len());
    }

    #[test]
    fn parses_output_format_names() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!(matches!(
            "pdf".parse::<OutputFormat>(),
            Err(SgptError::Usage(_))
        ));
    }
}
