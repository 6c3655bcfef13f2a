mod batch;
mod classifier;
mod error;
mod extract;
mod fetcher;
mod inputs;
mod prompt;
mod report;
mod response;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;

use batch::BatchInput;
use classifier::{Model, OpenAiClassifier};
use fetcher::ContentFetcher;
use settings::Settings;

#[derive(Parser)]
#[command(name = "site_classifier", about = "Classify websites into taxonomy codes with an LLM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every URL in a list and export the results as CSV
    Run {
        /// Class code file (CSV, codes in the first column)
        #[arg(short, long)]
        codes: PathBuf,
        /// Prompt template (.txt); `{codes}` is replaced by the code list
        #[arg(short, long)]
        prompt: PathBuf,
        /// URL list (CSV, one column of URLs)
        #[arg(short, long)]
        urls: PathBuf,
        /// Model to classify with
        #[arg(short, long, value_enum, default_value_t = Model::default())]
        model: Model,
        /// Output file name (".csv" is appended when missing)
        #[arg(short, long, default_value = report::DEFAULT_FILE_STEM)]
        out: String,
        /// Print the top-1 code distribution
        #[arg(short, long)]
        summary: bool,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        rows: usize,
    },
    /// Fetch one URL through the fallback chain and print the extracted text
    Fetch { url: String },
    /// List supported models
    Models,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            codes,
            prompt,
            urls,
            model,
            out,
            summary,
            rows,
        } => {
            let input = BatchInput {
                taxonomy: inputs::load_codes(&codes)?,
                template: inputs::load_template(&prompt)?,
                model,
                urls: inputs::load_urls(&urls)?,
            };
            input.validate()?;

            let settings = Settings::load()?;
            if settings.openai_api_key.is_none() {
                warn!("OPENAI_API_KEY not set; every model call will fail");
            }
            let classifier = OpenAiClassifier::new(
                settings.openai_api_key.clone(),
                settings.openai_base_url.clone(),
                settings.model_timeout(),
            )?;
            let fetcher = ContentFetcher::from_settings(&settings)?;

            println!("Classifying {} URLs with {}...", input.urls.len(), model);
            let run = batch::run_batch(&fetcher, &classifier, &input).await?;

            let path = report::csv_file_name(&out);
            let csv = report::to_csv(&run.rows)?;
            std::fs::write(&path, csv).with_context(|| format!("Failed to write {}", path))?;

            if !run.progress.is_empty() {
                println!("\n{}\n", run.progress.render());
            }
            report::print_table(&run.rows, rows);
            if summary {
                match report::top1_distribution(&run.rows) {
                    Some(dist) => {
                        println!();
                        report::print_distribution(&dist);
                    }
                    None => println!("\nNo top-1 codes to summarize."),
                }
            }

            println!(
                "\nProcessed {} URLs ({} errors) with {} -> {}",
                run.progress.len(),
                run.error_count(),
                run.model,
                path
            );
            println!(
                "Run: {} .. {}",
                run.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
                run.finished_at.format("%H:%M:%S UTC")
            );
            Ok(())
        }
        Commands::Fetch { url } => {
            let settings = Settings::load()?;
            let fetcher = ContentFetcher::from_settings(&settings)?;
            match fetcher.fetch(&url).await {
                Some(fetched) => {
                    println!(
                        "[{}] {} chars\n\n{}",
                        fetched.tier,
                        fetched.text.chars().count(),
                        fetched.text
                    );
                }
                None => println!("{}", error::RowError::Fetch),
            }
            Ok(())
        }
        Commands::Models => {
            for m in Model::all() {
                let marker = if m == Model::default() { " (default)" } else { "" };
                println!("{:<16} {}{}", m.id(), m.label(), marker);
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
