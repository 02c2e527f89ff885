//! brandmem command-line entry point
//!
//! ```text
//! brandmem [SEED_FILE|-] [BRAND] [QUERY...]
//! ```
//!
//! Loads an optional seed file, prints per-brand counts and, when a query is
//! given, the context block the memory would inject for it. Configuration
//! comes from the environment (see `MemoryConfig::from_env`).

use anyhow::Context;
use brandmem_memory::{BrandMemorySystem, MemoryConfig, SeedBundle};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Positional arguments
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    seed: Option<PathBuf>,
    brand: Option<String>,
    query: Option<String>,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Self {
        let seed = args.next().filter(|s| s != "-").map(PathBuf::from);
        let brand = args.next();
        let rest: Vec<String> = args.collect();
        let query = (!rest.is_empty()).then(|| rest.join(" "));
        Self { seed, brand, query }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse(std::env::args().skip(1));

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = MemoryConfig::from_env();

    let memory = match &config.persist_dir {
        Some(dir) => {
            info!("Using persistent memory at {}", dir.display());
            BrandMemorySystem::open(config.clone())
                .await
                .context("failed to open persistent memory")?
        }
        None => BrandMemorySystem::in_memory(config.clone())
            .context("failed to create in-memory memory")?,
    };

    if let Some(path) = &args.seed {
        let bundle = SeedBundle::load(path)
            .with_context(|| format!("failed to load seed file {}", path.display()))?;
        let report = bundle.apply(&memory).await.context("failed to apply seed data")?;
        println!(
            "Seeded {} triplets, {} brand notes, {} shared notes",
            report.triplets, report.brand_notes, report.shared_notes
        );
        memory.flush().await?;
    }

    for (ns, stats) in memory.stats_all()? {
        println!(
            "{:<12} notes={} entities={} triplets={}",
            ns, stats.notes_cached, stats.graph_entities, stats.graph_triplets
        );
    }

    if let Some(query) = &args.query {
        let brand = match &args.brand {
            Some(raw) => config.validate_namespace(raw)?,
            None => config
                .brand_namespaces()
                .into_iter()
                .next()
                .context("no brand namespaces configured")?,
        };
        let context = memory.build_context_injection(query, &brand, None).await?;
        println!("\n[{}] {}\n{}", brand, query, context);
    }

    Ok(())
}
