use chrono::NaiveDate;
use clap::Parser;
use rt_core::{normalize, NewsTracker, Result, ResultTable};
use rt_crew::{RegulatoryTracker, TrackerConfig, DEFAULT_TOPIC};
use rt_scrappers::RegulatorSite;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

const MAX_CELL_WIDTH: usize = 60;

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Track regulator press releases with an agent pipeline", long_about = None)]
pub struct Cli {
    #[arg(long, default_value = "openai", help = "Model to use for inference. Available models: openai (default), dummy")]
    model: String,
    #[arg(long, default_value = rt_inference::DEFAULT_MODEL_NAME)]
    model_name: String,
    #[arg(long, default_value = rt_inference::DEFAULT_BASE_URL)]
    api_base: String,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, default_value_t = 0.1)]
    temperature: f64,
    /// Ignore updates published before this date (YYYY-MM-DD)
    #[arg(long, default_value = "2025-03-01", value_parser = parse_date)]
    since: NaiveDate,
    #[arg(long, default_value_t = rt_crew::delegation::DEFAULT_MAX_DELEGATIONS)]
    max_delegations: u32,
    #[arg(long, default_value_t = rt_crew::agent::DEFAULT_MAX_ITER)]
    max_iter: usize,
    /// Point the tracker at another host serving the same site layout
    #[arg(long)]
    site_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the web UI
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,
    },
    /// Run the pipeline once and print the table
    Track {
        #[arg(default_value = DEFAULT_TOPIC)]
        topic: String,
        /// Also write the table as CSV
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    fn inference_config(&self) -> rt_inference::Config {
        rt_inference::Config {
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            model_name: self.model_name.clone(),
            base_url: self.api_base.clone(),
            temperature: self.temperature,
            ..rt_inference::Config::default()
        }
    }

    fn tracker_config(&self) -> TrackerConfig {
        let site = match &self.site_url {
            Some(url) => RegulatorSite::default().with_base_url(url),
            None => RegulatorSite::default(),
        };
        TrackerConfig {
            site,
            since: self.since,
            max_delegations: self.max_delegations,
            max_iter: self.max_iter,
        }
    }
}

fn clip(cell: &str) -> String {
    let cell = cell.replace('\n', " ");
    if cell.chars().count() <= MAX_CELL_WIDTH {
        return cell;
    }
    let mut clipped: String = cell.chars().take(MAX_CELL_WIDTH - 3).collect();
    clipped.push_str("...");
    clipped
}

/// Plain-text rendering with columns padded to their widest (clipped) cell.
fn format_table(table: &ResultTable) -> String {
    let header: Vec<String> = table.columns().iter().map(|c| clip(c)).collect();
    let rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.iter().map(|c| clip(c)).collect())
        .collect();

    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = line(&header);
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &rows {
        out.push('\n');
        out.push_str(&line(row));
    }
    out
}

async fn track(tracker: &RegulatoryTracker, topic: &str, output: Option<PathBuf>) -> Result<()> {
    let crew_output = tracker.track(topic).await?;
    for (i, task) in crew_output.tasks_output.iter().enumerate() {
        info!("📝 Task {} ({}): {}", i + 1, task.agent, task.summary());
        for record in &task.delegations {
            info!("🤝 Delegated to {}: {:?}", record.coworker, record.outcome);
        }
    }
    let usage = &crew_output.token_usage;
    info!(
        "🪙 Token usage: {} prompt, {} completion, {} total over {} requests",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens, usage.successful_requests
    );

    let outcome = normalize(&crew_output.raw_output());
    if let Some(warning) = &outcome.warning {
        warn!("⚠️ {}", warning);
        println!("{}", crew_output.raw);
        return Ok(());
    }

    println!("{}", format_table(&outcome.table));
    if let Some(path) = output {
        tokio::fs::write(&path, outcome.table.to_csv()?).await?;
        info!("💾 Wrote {} rows to {}", outcome.table.len(), path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    rt_crew::logging::init_logging();
    let cli = Cli::parse();

    let inference = rt_inference::models::create_model(Some(cli.inference_config())).await?;
    info!("🧠 Inference model initialized successfully (using {})", inference.name());

    let config = cli.tracker_config();
    info!("🏛️ Tracking {} since {}", config.site.name, config.since);
    let tracker = RegulatoryTracker::new(inference, config)?;

    match cli.command {
        Commands::Serve { addr } => {
            let state = rt_web::AppState::new(Arc::new(tracker));
            rt_web::serve(state, &addr).await?;
        }
        Commands::Track { topic, output } => {
            track(&tracker, &topic, output).await?;
        }
    }

    Ok(())
}
