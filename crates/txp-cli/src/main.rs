//! txparity entry point.
//!
//! This file is intentionally thin: it loads env config, sets up tracing,
//! builds the concrete feeds, and hands them to the coordinator. All
//! comparison logic lives in txp-engine; all IO in txp-feed.

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use txp_config::{RunConfig, RunMode, Transport};
use txp_core::SourceId;
use txp_feed::{EventFeed, EventFilter, HttpPollFeed, WsFeed};
use txp_runner::{CoordinatorConfig, RunCoordinator, RunOutcome, RunRecord};

#[derive(Parser)]
#[command(name = "txparity")]
#[command(about = "Cross-validates event delivery across independent feed sources", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect events from every configured source and compare the sets
    Run {
        /// Per-source stop threshold (overrides TXP_TARGET_COUNT)
        #[arg(long)]
        target_count: Option<usize>,

        /// Warm-up gate quorum (overrides TXP_QUORUM)
        #[arg(long)]
        quorum: Option<usize>,

        /// Compare overlapping hash ranges instead of per-block sets
        #[arg(long, default_value_t = false)]
        flat: bool,

        /// Dump the full run record (accumulator + report) as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the effective configuration and exit
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist — production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Config => {
            let cfg = RunConfig::from_env()?;
            print_config(&cfg);
        }

        Commands::Run {
            target_count,
            quorum,
            flat,
            json,
        } => {
            let mut cfg = RunConfig::from_env()?;
            if let Some(t) = target_count {
                cfg.target_count = t;
            }
            if let Some(q) = quorum {
                cfg.quorum = q;
            }
            if flat {
                cfg.mode = RunMode::Flat;
            }

            let coordinator = RunCoordinator::new(CoordinatorConfig {
                filter: EventFilter {
                    address: cfg.contract_addr.clone(),
                    topic0: cfg.event_topic.clone(),
                },
                target_count: cfg.target_count,
                quorum: cfg.quorum,
                mode: cfg.mode,
            });

            let record = coordinator.run(build_feeds(&cfg)).await?;
            print_summary(&record);
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            std::process::exit(record.outcome.exit_code());
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn build_feeds(cfg: &RunConfig) -> Vec<Box<dyn EventFeed>> {
    cfg.sources
        .iter()
        .map(|s| -> Box<dyn EventFeed> {
            let label = SourceId::new(&s.label);
            match s.transport {
                Transport::WebSocket => Box::new(WsFeed::new(label, s.url.clone())),
                Transport::HttpPoll => Box::new(HttpPollFeed::new(
                    label,
                    s.url.clone(),
                    Duration::from_millis(cfg.poll_interval_ms),
                )),
            }
        })
        .collect()
}

fn print_config(cfg: &RunConfig) {
    for s in &cfg.sources {
        println!("source={} transport={:?} url={}", s.label, s.transport, s.url);
    }
    println!("contract_addr={}", cfg.contract_addr);
    println!(
        "event_topic={}",
        cfg.event_topic.as_deref().unwrap_or("(all)")
    );
    println!("target_count={}", cfg.target_count);
    println!("quorum={}", cfg.quorum);
    println!("poll_interval_ms={}", cfg.poll_interval_ms);
    println!("mode={:?}", cfg.mode);
}

fn print_summary(record: &RunRecord) {
    println!("run_id={}", record.run_id);
    println!("started_at_utc={}", record.started_at_utc.to_rfc3339());
    println!("finished_at_utc={}", record.finished_at_utc.to_rfc3339());
    for l in &record.listeners {
        println!(
            "source={} delivered={} malformed={} counted={}",
            l.source, l.delivered, l.malformed, l.counted
        );
    }
    match &record.outcome {
        RunOutcome::Compared { report } => {
            println!("consistent={}", report.consistent);
            for s in &report.sources {
                println!(
                    "source={} raw_size={} windowed_size={}",
                    s.source, s.raw_size, s.windowed_size
                );
            }
            for p in &report.pair_missing {
                println!(
                    "present_in={} missing_from={} missing={}",
                    p.present_in, p.missing_from, p.missing
                );
            }
            for d in &report.discrepancies {
                println!(
                    "discrepancy block={} hash={} present_in={} missing_from={}",
                    d.block.map(|b| b.to_string()).unwrap_or_else(|| "-".into()),
                    d.hash,
                    d.present_in,
                    d.missing_from
                );
            }
        }
        RunOutcome::InsufficientData { reason } => {
            println!("insufficient_data=true reason={reason}");
        }
    }
}
