//! CLI binary for sift.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sift::planner::is_multi_hop;
use sift::session::ResearchReply;
use sift::{
    Generator, MemorySessionStore, ModeRequest, ModeRouter, OpenAiGenerator, PipelineOutcome,
    ResearchPipeline, ResearchService, SiftConfig,
};
use tracing_subscriber::EnvFilter;

/// Sift: multi-source web research from the command line.
#[derive(Parser)]
#[command(name = "sift", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true, env = "SIFT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Research a question and print the evidence set.
    Ask {
        question: String,

        /// Research mode: auto, simple or pro.
        #[arg(short, long, default_value = "auto")]
        mode: ModeRequest,

        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show how a question would be planned.
    Plan { question: String },

    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sift=info,sift_search=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = SiftConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Ask {
            question,
            mode,
            json,
        } => run_ask(config, &question, mode, json).await,
        Command::Plan { question } => run_plan(config, &question).await,
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn run_ask(config: SiftConfig, question: &str, mode: ModeRequest, json: bool) -> anyhow::Result<()> {
    let generator: Arc<dyn Generator> = Arc::new(OpenAiGenerator::new(&config.generation)?);
    let cascade = Arc::new(sift::ProviderCascade::from_config(&config.search)?);
    let pipeline = Arc::new(ResearchPipeline::new(cascade, Arc::clone(&generator), &config));
    let service = ResearchService::new(
        pipeline,
        ModeRouter::new(generator),
        Arc::new(MemorySessionStore::new()),
        config.pipeline.history_window,
    );

    let reply = service.research(None, question, mode).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        print_reply(&reply);
    }
    Ok(())
}

fn print_reply(reply: &ResearchReply) {
    let diagnostics = reply.outcome.diagnostics();
    println!("Mode: {}", reply.mode);
    for step in &diagnostics.reasoning_steps {
        println!("  - {step}");
    }
    println!();

    match &reply.outcome {
        PipelineOutcome::NoInformation(_) => {
            println!("No relevant information found.");
        }
        PipelineOutcome::Evidence(set) => {
            for (i, source) in set.display.iter().enumerate() {
                println!("[{}] {} ({:.2})", i + 1, source.title, source.credibility);
                println!("    {}", source.url);
            }
            if let Some(verdict) = &set.verdict {
                println!();
                println!("Verification: {verdict}");
            }
        }
    }
    println!();
    println!(
        "{} collected, {} unique, {} selected from {} domains in {} ms",
        diagnostics.candidates_collected,
        diagnostics.candidates_unique,
        diagnostics.selected,
        diagnostics.unique_domains,
        diagnostics.elapsed_ms
    );
}

async fn run_plan(config: SiftConfig, question: &str) -> anyhow::Result<()> {
    println!("Multi-hop: {}", is_multi_hop(question));
    let generator: Arc<dyn Generator> = Arc::new(OpenAiGenerator::new(&config.generation)?);
    let plan = sift::planner::QueryPlanner::new(generator).plan(question).await;
    if plan.multi_hop && !plan.decomposed {
        println!("Decomposition unavailable, searching the original question.");
    }
    for sub_query in &plan.sub_queries {
        println!("{}. {}", sub_query.index + 1, sub_query.text);
    }
    Ok(())
}
