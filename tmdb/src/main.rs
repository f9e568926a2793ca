use std::num::NonZeroUsize;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use actor_link_core::{
    max_edges_for_movie_hops, PathFinder, PathResult, SearchConfig, DEFAULT_CACHE_CAPACITY,
    DEFAULT_CONCURRENCY,
};
use actor_link_tmdb::logging::{self, LogFormat};
use actor_link_tmdb::{image_url, TmdbClient, TmdbConfig};

/// Find the shortest chain of shared movies between two people on TMDb.
#[derive(Debug, Parser)]
#[command(name = "actor-link", version)]
struct Cli {
    /// TMDb person id to start from
    source: u64,

    /// TMDb person id to reach
    target: u64,

    /// Maximum number of movies between the two people
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=8))]
    movie_hops: u32,

    /// Maximum path length in edges (overrides --movie-hops)
    #[arg(long)]
    max_edges: Option<u32>,

    /// Neighbor lookups in flight at once
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Adjacency cache capacity (people and movies combined)
    #[arg(
        long,
        default_value_t = DEFAULT_CACHE_CAPACITY,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    cache_capacity: usize,

    /// Give up after this many seconds (checked between search rounds)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Print node ids only, without fetching names and titles
    #[arg(long)]
    no_labels: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::initialize(&cli.log_level, LogFormat::from_env().unwrap_or(LogFormat::Pretty));

    let tmdb_config = TmdbConfig::from_env()?;
    let client = TmdbClient::new(&tmdb_config)?;

    let cache_capacity =
        NonZeroUsize::new(cli.cache_capacity).context("--cache-capacity must be at least 1")?;
    let max_edges = cli
        .max_edges
        .unwrap_or_else(|| max_edges_for_movie_hops(cli.movie_hops));
    let mut search_config = SearchConfig::default()
        .with_concurrency(cli.concurrency)
        .with_cache_capacity(cache_capacity)
        .with_max_edges(max_edges);
    if let Some(secs) = cli.timeout_secs {
        search_config = search_config.with_timeout(Duration::from_secs(secs));
    }

    let finder = PathFinder::new(Arc::new(client), search_config);
    let path = finder
        .find(cli.source, cli.target)
        .await
        .with_context(|| format!("searching from person {} to person {}", cli.source, cli.target))?;

    let Some(path) = path else {
        if cli.json {
            println!("{}", serde_json::json!({ "path": null, "max_edges": max_edges }));
        } else {
            println!("No path found within {} edges.", max_edges);
        }
        return Ok(ExitCode::from(1));
    };

    if cli.no_labels {
        print_ids(&path, cli.json)?;
    } else {
        print_labelled(&finder, &path, cli.json).await?;
    }

    let stats = finder.cache_stats();
    tracing::info!(
        entries = stats.entries,
        hits = stats.hits,
        misses = stats.misses,
        evictions = stats.evictions,
        "adjacency cache"
    );
    Ok(ExitCode::SUCCESS)
}

fn print_ids(path: &PathResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "path": path }))?);
    } else {
        let ids: Vec<String> = path.iter().map(|n| n.to_string()).collect();
        println!("{}", ids.join(" -> "));
    }
    Ok(())
}

async fn print_labelled(finder: &PathFinder, path: &PathResult, json: bool) -> anyhow::Result<()> {
    let steps = finder.describe(path).await.context("fetching names and titles")?;

    if json {
        let steps: Vec<serde_json::Value> = steps
            .iter()
            .map(|s| {
                serde_json::json!({
                    "node": s.node,
                    "label": s.label,
                    "image": image_url(s.image_path.as_deref(), "w185"),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "path": steps }))?);
    } else {
        let labels: Vec<&str> = steps.iter().map(|s| s.label.as_str()).collect();
        println!("{}", labels.join(" -> "));
        println!(
            "{} movie{} apart",
            path.movie_hops(),
            if path.movie_hops() == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_cache_capacity_rejected() {
        let err = Cli::try_parse_from(["actor-link", "1", "2", "--cache-capacity", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["actor-link", "1", "2"]).unwrap();
        assert_eq!(cli.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert_eq!(max_edges_for_movie_hops(cli.movie_hops), actor_link_core::DEFAULT_MAX_EDGES);
        assert!(cli.max_edges.is_none());
    }
}
