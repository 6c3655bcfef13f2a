//! The per-URL loop: fetch → prompt → classify → parse → record.
//!
//! URLs are processed one at a time in input order. Whatever goes wrong for a
//! URL ends up as an error marker in that URL's row; only a missing input
//! aborts the batch, and it does so before the first URL.

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::classifier::{Classifier, Model};
use crate::error::{InputError, RowError};
use crate::fetcher::ContentFetcher;
use crate::prompt;
use crate::response::{self, ClassificationResult};

/// Everything one run needs, already decoded.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub taxonomy: Vec<String>,
    pub template: String,
    pub model: Model,
    pub urls: Vec<String>,
}

impl BatchInput {
    /// Batch-level preconditions.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.taxonomy.is_empty() {
            return Err(InputError::MissingCodes);
        }
        if self.template.is_empty() {
            return Err(InputError::MissingTemplate);
        }
        if self.urls.is_empty() {
            return Err(InputError::MissingUrls);
        }
        Ok(())
    }
}

/// One input URL and its three codes (or error marker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRow {
    pub url: String,
    pub result: ClassificationResult,
    /// Set when `result` holds an error marker rather than model output.
    pub error: Option<RowError>,
}

impl BatchRow {
    pub fn from_outcome(url: &str, outcome: Result<ClassificationResult, RowError>) -> Self {
        match outcome {
            Ok(result) => Self {
                url: url.to_string(),
                result,
                error: None,
            },
            Err(e) => Self {
                url: url.to_string(),
                result: ClassificationResult::error(&e),
                error: Some(e),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Append-only trace, one `Processing: <url>` line per URL.
#[derive(Debug, Clone, Default)]
pub struct ProgressLog {
    lines: Vec<String>,
}

impl ProgressLog {
    pub fn record(&mut self, url: &str) {
        self.lines.push(format!("Processing: {}", url));
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

pub struct BatchReport {
    pub rows: Vec<BatchRow>,
    pub progress: ProgressLog,
    pub model: Model,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn error_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_error()).count()
    }
}

/// Classify every URL in order. Fails only on missing inputs.
pub async fn run_batch(
    fetcher: &ContentFetcher,
    classifier: &dyn Classifier,
    input: &BatchInput,
) -> Result<BatchReport, InputError> {
    input.validate()?;

    let started_at = Utc::now();
    let total = input.urls.len();
    let pb = progress_bar(total);
    let mut rows = Vec::with_capacity(total);
    let mut progress = ProgressLog::default();

    info!(urls = total, model = %input.model, "Starting classification batch");

    for url in &input.urls {
        progress.record(url);
        pb.set_message(url.clone());
        info!(url = %url, "Processing");

        let outcome = classify_url(fetcher, classifier, input, url).await;
        if let Err(e) = &outcome {
            warn!(url = %url, error = %e, "URL failed");
        }
        rows.push(BatchRow::from_outcome(url, outcome));
        pb.inc(1);
    }

    pb.finish_and_clear();

    let report = BatchReport {
        rows,
        progress,
        model: input.model,
        started_at,
        finished_at: Utc::now(),
    };
    info!(
        "Classified {} URLs ({} ok, {} errors)",
        total,
        total - report.error_count(),
        report.error_count()
    );
    Ok(report)
}

async fn classify_url(
    fetcher: &ContentFetcher,
    classifier: &dyn Classifier,
    input: &BatchInput,
    url: &str,
) -> Result<ClassificationResult, RowError> {
    let fetched = fetcher.fetch(url).await.ok_or(RowError::Fetch)?;
    info!(url = %url, tier = fetched.tier, chars = fetched.text.chars().count(), "Extracted");

    let prompt = prompt::build(&input.taxonomy, &input.template, &fetched.text);
    let raw = classifier.classify(input.model, &prompt).await?;
    Ok(response::parse(&raw))
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40} {pos}/{len} (eta {eta}) {wide_msg}",
    )
    .map(|s| s.progress_chars("=> "))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use anyhow::Result;
    use async_trait::async_trait;

    use super::*;
    use crate::error::ClassifyError;
    use crate::fetcher::FetchStrategy;
    use crate::prompt::Prompt;

    /// Serves markup per URL; unknown URLs fail.
    struct Pages(HashMap<String, String>);

    #[async_trait]
    impl FetchStrategy for Pages {
        fn name(&self) -> &'static str {
            "pages"
        }

        async fn fetch_markup(&self, url: &str) -> Result<String> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no route to {}", url))
        }
    }

    /// Replies with queued outputs in order and records every prompt.
    struct Scripted {
        replies: Mutex<Vec<Result<String, ClassifyError>>>,
        seen: Mutex<Vec<(Model, Prompt)>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, ClassifyError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Classifier for Scripted {
        async fn classify(&self, model: Model, prompt: &Prompt) -> Result<String, ClassifyError> {
            self.seen.lock().unwrap().push((model, prompt.clone()));
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn article(words: &str) -> String {
        format!("<html><body><article><p>{}</p></article></body></html>", words)
    }

    fn fetcher(pages: &[(&str, String)]) -> ContentFetcher {
        let map = pages
            .iter()
            .map(|(u, m)| (u.to_string(), m.clone()))
            .collect();
        ContentFetcher::new(vec![Box::new(Pages(map))])
    }

    fn input(urls: &[&str]) -> BatchInput {
        BatchInput {
            taxonomy: vec!["Retail".into(), "SaaS".into(), "Hardware".into()],
            template: "Classify into: {codes}".into(),
            model: Model::Gpt4o,
            urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn single_url_scenario() {
        let fetcher = fetcher(&[(
            "http://example.com",
            article("Subscription software for shops."),
        )]);
        let classifier = Scripted::new(vec![Ok("SaaS\nRetail\n".into())]);

        let report = run_batch(&fetcher, &classifier, &input(&["http://example.com"]))
            .await
            .unwrap();

        assert_eq!(report.rows.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.url, "http://example.com");
        assert_eq!(row.result.slots(), ["SaaS", "Retail", ""]);

        let seen = classifier.seen.lock().unwrap();
        let (model, prompt) = &seen[0];
        assert_eq!(*model, Model::Gpt4o);
        assert_eq!(prompt.system, "Classify into: Retail\nSaaS\nHardware");
        assert!(prompt.user.contains("Subscription software for shops."));
        assert!(prompt.user.ends_with("Top 3 classifications:"));
    }

    #[tokio::test]
    async fn fetch_failure_is_recorded_and_loop_continues() {
        let fetcher = fetcher(&[("http://ok.example", article("Hardware store."))]);
        let classifier = Scripted::new(vec![Ok("Hardware".into())]);

        let report = run_batch(
            &fetcher,
            &classifier,
            &input(&["http://down.example", "http://ok.example"]),
        )
        .await
        .unwrap();

        assert_eq!(
            report.rows[0].result.slots(),
            ["ERROR: Unable to fetch content", "", ""]
        );
        assert_eq!(report.rows[0].error, Some(RowError::Fetch));
        assert_eq!(report.rows[1].result.slots(), ["Hardware", "", ""]);
        // the failed URL never reached the model
        assert_eq!(classifier.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn classify_failure_is_recorded_and_loop_continues() {
        let fetcher = fetcher(&[
            ("http://a.example", article("Alpha.")),
            ("http://b.example", article("Beta.")),
        ]);
        let classifier = Scripted::new(vec![
            Err(ClassifyError::Api("429 Too Many Requests: slow down".into())),
            Ok("Retail\nSaaS\nHardware\nExtra".into()),
        ]);

        let report = run_batch(
            &fetcher,
            &classifier,
            &input(&["http://a.example", "http://b.example"]),
        )
        .await
        .unwrap();

        assert_eq!(
            report.rows[0].result.slots(),
            ["ERROR: API error: 429 Too Many Requests: slow down", "", ""]
        );
        assert_eq!(report.rows[1].result.slots(), ["Retail", "SaaS", "Hardware"]);
        assert_eq!(report.error_count(), 1);
    }

    #[tokio::test]
    async fn rows_match_inputs_in_order() {
        let urls = [
            "http://1.example",
            "http://2.example",
            "http://1.example",
            "http://missing.example",
            "http://3.example",
        ];
        let fetcher = fetcher(&[
            ("http://1.example", article("One.")),
            ("http://2.example", article("Two.")),
            ("http://3.example", article("Three.")),
        ]);
        let classifier = Scripted::new(Vec::new());

        let report = run_batch(&fetcher, &classifier, &input(&urls)).await.unwrap();

        let got: Vec<&str> = report.rows.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(got, urls);
        for row in &report.rows {
            let [first, second, third] = row.result.slots();
            if row.is_error() {
                assert!(first.starts_with("ERROR: "));
                assert!(second.is_empty() && third.is_empty());
            }
        }
    }

    #[tokio::test]
    async fn progress_log_has_one_line_per_url() {
        let fetcher = fetcher(&[]);
        let classifier = Scripted::new(Vec::new());

        let urls = ["http://a.example", "http://b.example"];
        let report = run_batch(&fetcher, &classifier, &input(&urls)).await.unwrap();

        assert_eq!(
            report.progress.render(),
            "Processing: http://a.example\nProcessing: http://b.example"
        );
        assert_eq!(report.progress.len(), report.rows.len());
        assert!(report.finished_at >= report.started_at);
    }

    #[tokio::test]
    async fn empty_taxonomy_aborts_before_any_url() {
        let fetcher = fetcher(&[("http://example.com", article("Text."))]);
        let classifier = Scripted::new(vec![Ok("SaaS".into())]);
        let mut input = input(&["http://example.com"]);
        input.taxonomy.clear();

        let err = run_batch(&fetcher, &classifier, &input).await.err().unwrap();
        assert!(matches!(err, InputError::MissingCodes));
        assert!(classifier.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_template_or_urls() {
        let mut no_template = input(&["http://example.com"]);
        no_template.template.clear();
        assert!(matches!(no_template.validate(), Err(InputError::MissingTemplate)));

        let no_urls = input(&[]);
        assert!(matches!(no_urls.validate(), Err(InputError::MissingUrls)));

        assert!(input(&["http://example.com"]).validate().is_ok());
    }

    #[tokio::test]
    async fn model_line_starting_with_error_is_not_a_failure() {
        let fetcher = fetcher(&[("http://example.com", article("Diagnostics tooling."))]);
        let classifier = Scripted::new(vec![Ok("ERROR: Monitoring\nSaaS".into())]);

        let report = run_batch(&fetcher, &classifier, &input(&["http://example.com"]))
            .await
            .unwrap();

        let row = &report.rows[0];
        assert_eq!(row.result.slots(), ["ERROR: Monitoring", "SaaS", ""]);
        assert!(!row.is_error());
        assert_eq!(report.error_count(), 0);
    }
}
