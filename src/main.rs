//! vecrank command-line interface.

use anyhow::{Context, Result, bail};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use vecrank::config::Settings;
use vecrank::error::RerankError;
use vecrank::lexical::{DocumentIndex, IndexOptions, analyze};
use vecrank::rerank::{
    CandidateMode, MEASURE_NAMES, Reranker, ScoredDoc, SetFormationPolicy, create_measure,
};
use vecrank::trec::{read_queries, save_run_file};
use vecrank::wordvec::{VectorSet, VocabClusterIndex, WordEmbeddings};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser)]
#[command(
    name = "vecrank",
    version = env!("CARGO_PKG_VERSION"),
    about = "Vector-set similarity reranking for lexical retrieval",
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom vecrank.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the lexical index from a document collection
    #[command(about = "Index a collection directory, one document per file")]
    Index {
        /// Collection directory to index
        path: PathBuf,

        /// Skip centroid storage even when enabled in config
        #[arg(long)]
        no_centroids: bool,

        /// Delete any existing index at index_path first
        #[arg(short, long)]
        force: bool,
    },

    /// Retrieve and rerank, writing a TREC run file
    #[command(about = "Run queries through retrieval + vector-set reranking")]
    Rerank {
        /// Query file, one id<TAB>text per line
        queries: PathBuf,

        /// Output run file
        #[arg(short, long, default_value = "run.txt")]
        output: PathBuf,
    },

    /// Show current configuration settings
    #[command(about = "Display the active merged configuration")]
    Config {
        /// Emit JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;
    Ok(settings)
}

fn candidate_mode(settings: &Settings) -> Result<CandidateMode> {
    match settings.rerank.candidate_source.as_str() {
        "stored" => Ok(CandidateMode::Stored {
            compressed: settings.indexing.compress,
        }),
        "live" => Ok(CandidateMode::LiveClustering {
            num_clusters: settings.indexing.num_clusters,
            seed: settings.rerank.clustering_seed,
        }),
        "vocab" => Ok(CandidateMode::VocabGrouping {
            policy: settings.rerank.set_formation,
        }),
        other => bail!("unknown candidate source '{other}' (expected stored, live, or vocab)"),
    }
}

fn run_index(settings: &Settings, path: &PathBuf, no_centroids: bool, force: bool) -> Result<()> {
    if force && settings.index_path.exists() {
        std::fs::remove_dir_all(&settings.index_path)
            .with_context(|| format!("removing {}", settings.index_path.display()))?;
    }
    let index = DocumentIndex::create(&settings.index_path)
        .with_context(|| format!("creating index at {}", settings.index_path.display()))?;

    let store_centroids = settings.indexing.store_centroids && !no_centroids;
    let embeddings = if store_centroids {
        Some(WordEmbeddings::load(&settings.embeddings.path)?)
    } else {
        None
    };

    let opts = IndexOptions {
        embeddings: embeddings.as_ref(),
        num_clusters: settings.indexing.num_clusters,
        compress: settings.indexing.compress,
        seed: settings.rerank.clustering_seed,
    };
    let count = index.index_collection(path, &opts)?;
    println!("Indexed {count} documents into {}", settings.index_path.display());
    Ok(())
}

fn run_rerank(settings: &Settings, queries_path: &PathBuf, output: &PathBuf) -> Result<()> {
    let index = Arc::new(
        DocumentIndex::open(&settings.index_path)
            .with_context(|| format!("opening index at {}", settings.index_path.display()))?,
    );
    let queries = read_queries(queries_path)?;
    let num_wanted = settings.retrieval.num_wanted;
    let fetch = num_wanted + settings.retrieval.rerank_slack;

    if !settings.rerank.enabled {
        info!("reranking disabled; emitting the lexical run unchanged");
        let mut results = Vec::with_capacity(queries.len());
        for query in &queries {
            let mut hits = index.top_docs(&query.text, fetch)?;
            hits.truncate(num_wanted);
            results.push((query.id.clone(), hits));
        }
        save_run_file(output, &results, &settings.retrieval.run_name)?;
        println!("Wrote {} query results to {}", results.len(), output.display());
        return Ok(());
    }

    let embeddings = WordEmbeddings::load(&settings.embeddings.path)?;
    let mode = candidate_mode(settings)?;

    let needs_vocab = matches!(
        mode,
        CandidateMode::VocabGrouping {
            policy: SetFormationPolicy::Cluster
        }
    );
    let vocab = if needs_vocab {
        if settings.embeddings.vocab_clusters == 0 {
            bail!("candidate source 'vocab' with the cluster policy requires embeddings.vocab_clusters > 0");
        }
        info!(
            clusters = settings.embeddings.vocab_clusters,
            "building vocabulary cluster index"
        );
        Some(VocabClusterIndex::build(
            &embeddings,
            settings.embeddings.vocab_clusters,
            settings.rerank.clustering_seed,
        )?)
    } else {
        None
    };

    let stats = settings
        .rerank
        .idf_weighting
        .then(|| Arc::clone(&index) as Arc<dyn vecrank::rerank::TermStats>);
    let measure = create_measure(&settings.rerank.measure, settings.rerank.idf_weighting, stats)
        .ok_or_else(|| RerankError::UnknownMeasure {
            name: settings.rerank.measure.clone(),
            known: MEASURE_NAMES.join(", "),
        })?;

    let reranker = Reranker::new(
        &embeddings,
        vocab.as_ref(),
        measure,
        mode,
        settings.rerank.text_weight,
    );

    let mut results: Vec<(String, Vec<ScoredDoc>)> = Vec::with_capacity(queries.len());
    for query in &queries {
        let hits = index.top_docs(&query.text, fetch)?;
        let terms = analyze(&query.text);
        let query_set = VectorSet::from_query(
            &query.id,
            terms.iter().map(String::as_str),
            &embeddings,
        );
        let ranked = reranker.rerank(&query_set, &hits, &*index, num_wanted)?;
        info!(query = %query.id, candidates = hits.len(), kept = ranked.len(), "query reranked");
        results.push((query.id.clone(), ranked));
    }

    save_run_file(output, &results, &settings.retrieval.run_name)?;
    println!("Wrote {} query results to {}", results.len(), output.display());
    Ok(())
}

fn run_config(settings: &Settings, json: bool) -> Result<()> {
    let rendered = if json {
        serde_json::to_string_pretty(settings).context("serializing configuration")?
    } else {
        toml::to_string_pretty(settings).context("serializing configuration")?
    };
    println!("{rendered}");
    Ok(())
}

/// Prints a failure to stderr. Pipeline errors carry a stable status code
/// and recovery hints; anything else falls back to the plain chain.
fn report_failure(err: &anyhow::Error) {
    match err.chain().find_map(|e| e.downcast_ref::<RerankError>()) {
        Some(rerank_err) => {
            eprintln!("Error [{}]: {err:#}", rerank_err.status_code());
            for hint in rerank_err.recovery_suggestions() {
                eprintln!("  hint: {hint}");
            }
        }
        None => eprintln!("Error: {err:#}"),
    }
}

fn main() {
    let cli = Cli::parse();
    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            report_failure(&e);
            std::process::exit(1);
        }
    };

    let default_level = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let result = match &cli.command {
        Commands::Index {
            path,
            no_centroids,
            force,
        } => run_index(&settings, path, *no_centroids, *force),
        Commands::Rerank { queries, output } => run_rerank(&settings, queries, output),
        Commands::Config { json } => run_config(&settings, *json),
    };

    if let Err(e) = result {
        report_failure(&e);
        std::process::exit(1);
    }
}
