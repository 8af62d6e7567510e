use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use clipsmith::{
    AnthropicClient, AnthropicConfig, AnthropicScorer, ClipPipeline, ClipReport, ClipSummary,
    EmbeddingClient, EmbeddingClientConfig, HashingEmbedder, PipelineConfig, Role,
    parse_transcript_file,
};

#[derive(Parser)]
#[command(name = "clipsmith")]
#[command(author, version, about = "Highlight clip reconstruction and scoring pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct, score and rank highlight clips from a transcript
    Rank {
        /// Input transcript file (JSON segments)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the ranked clips (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Output file for a human-readable summary (text)
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Pipeline configuration file (JSON); missing fields use defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of clips to keep
        #[arg(long)]
        top_n: Option<usize>,

        /// Minimum clip duration in seconds
        #[arg(long)]
        min_duration: Option<f64>,

        /// Maximum clip duration in seconds
        #[arg(long)]
        max_duration: Option<f64>,

        /// Top units considered per narrative role
        #[arg(long)]
        reorder_k: Option<usize>,

        /// Score clips with Claude (needs ANTHROPIC_API_KEY)
        #[arg(long)]
        llm: bool,

        /// Semantic dedup backend
        #[arg(long, value_enum, default_value = "hashing")]
        dedup: DedupBackend,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show how a transcript splits and scores without building clips
    Analyze {
        /// Input transcript file (JSON segments)
        #[arg(short, long)]
        input: PathBuf,

        /// Pipeline configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DedupBackend {
    /// No semantic dedup
    Off,
    /// Local feature-hashing embeddings
    Hashing,
    /// OpenAI-compatible embeddings endpoint (EMBEDDING_API_KEY)
    Remote,
}

/// CLI overrides applied on top of the config file
struct Overrides {
    top_n: Option<usize>,
    min_duration: Option<f64>,
    max_duration: Option<f64>,
    reorder_k: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Rank {
            input,
            output,
            summary,
            config,
            top_n,
            min_duration,
            max_duration,
            reorder_k,
            llm,
            dedup,
            verbose,
        } => {
            setup_logging(verbose);
            let overrides = Overrides {
                top_n,
                min_duration,
                max_duration,
                reorder_k,
            };
            rank_clips(input, output, summary, config, overrides, llm, dedup).await
        }
        Commands::Analyze {
            input,
            config,
            verbose,
        } => {
            setup_logging(verbose);
            analyze_transcript(input, config)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(path: Option<PathBuf>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            info!("Loading config from {:?}", path);
            PipelineConfig::from_file(&path)
        }
        None => Ok(PipelineConfig::default()),
    }
}

async fn rank_clips(
    input: PathBuf,
    output: PathBuf,
    summary: Option<PathBuf>,
    config_path: Option<PathBuf>,
    overrides: Overrides,
    llm: bool,
    dedup: DedupBackend,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(top_n) = overrides.top_n {
        config.top_n = top_n;
    }
    if let Some(min_duration) = overrides.min_duration {
        config.min_duration = min_duration;
    }
    if let Some(max_duration) = overrides.max_duration {
        config.max_duration = max_duration;
    }
    if let Some(reorder_k) = overrides.reorder_k {
        config.reorder_k = reorder_k;
    }

    let mut pipeline = ClipPipeline::new(config).context("Invalid pipeline configuration")?;

    if llm {
        let client = AnthropicClient::new(AnthropicConfig::from_env()?);
        info!("Competitive scoring with {}", client.model());
        pipeline = pipeline.with_scorer(Arc::new(AnthropicScorer::new(client)));
    }

    pipeline = match dedup {
        DedupBackend::Off => pipeline,
        DedupBackend::Hashing => pipeline.with_embedder(Arc::new(HashingEmbedder::default())),
        DedupBackend::Remote => {
            let client = EmbeddingClient::new(EmbeddingClientConfig::from_env()?);
            pipeline.with_embedder(Arc::new(client))
        }
    };

    info!("Loading transcript from {:?}", input);
    let transcript = parse_transcript_file(&input).context("Failed to parse input transcript")?;
    info!(
        "Loaded {} segments spanning {:.1}s",
        transcript.segments.len(),
        transcript.duration()
    );

    let report = ClipReport::from_report(pipeline.run(&transcript).await);

    report.write_json(&output)?;
    info!("Output written to {:?}", output);

    if let Some(summary_path) = summary {
        ClipSummary::new(&report).write_file(&summary_path)?;
        info!("Summary written to {:?}", summary_path);
    }

    info!(
        "Complete: {} clips (run {}{})",
        report.clips.len(),
        report.metadata.run_id,
        if report.metadata.degraded { ", degraded" } else { "" }
    );

    Ok(())
}

fn analyze_transcript(input: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let pipeline = ClipPipeline::new(config).context("Invalid pipeline configuration")?;

    info!("Analyzing transcript from {:?}", input);
    let transcript = parse_transcript_file(&input).context("Failed to parse input transcript")?;
    let units = pipeline.build_units(&transcript);

    println!("Transcript Analysis");
    println!("==================");
    println!("Segments: {}", transcript.segments.len());
    println!("Atomic units: {}", units.len());
    println!("Duration: {:.1}s", transcript.duration());
    println!();

    if units.is_empty() {
        return Ok(());
    }

    let n = units.len() as f64;
    let mean = |f: fn(&clipsmith::models::DimensionScores) -> f64| {
        units.iter().map(|u| f(&u.scores_or_neutral())).sum::<f64>() / n
    };

    println!("Average Dimension Scores");
    println!("------------------------");
    println!("Hook: {:.2}", mean(|s| s.hook));
    println!("Emotional charge: {:.2}", mean(|s| s.emotional_charge));
    println!("Claim strength: {:.2}", mean(|s| s.claim_strength));
    println!("Identity trigger: {:.2}", mean(|s| s.identity_trigger));
    println!("Energy: {:.2}", mean(|s| s.energy));
    println!("Delivery intensity: {:.2}", mean(|s| s.delivery_intensity));
    println!();

    println!("Top Units per Role");
    println!("------------------");
    for role in [Role::Hook, Role::Context, Role::Punchline, Role::Claim] {
        let mut ranked: Vec<_> = units
            .iter()
            .map(|u| (role.score(&u.scores_or_neutral()), u))
            .collect();
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        println!("{:?}:", role);
        for (score, unit) in ranked.into_iter().take(3) {
            println!(
                "  [{}] {:.2} @ {:.1}s: {}",
                unit.index, score, unit.start, unit.text
            );
        }
    }

    Ok(())
}
