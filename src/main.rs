use anyhow::{Context, Result};
use clap::Parser;
use textboids::{BoidsConfig, EmbeddingFormat, EmbeddingTable, RunStatus, TextualBoids, Word};
use tracing_subscriber::EnvFilter;

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// word2vec embedding file
    #[arg(long, required = true)]
    model_path: String,

    /// Read the embedding file as word2vec binary instead of text
    #[arg(long, default_value_t = false)]
    binary: bool,

    /// Only load the first N vectors
    #[arg(long)]
    limit: Option<usize>,

    #[arg(long, default_value = "boids.toml")]
    config: String,

    /// Overrides `run.iterations`
    #[arg(long)]
    iterations: Option<usize>,

    /// Overrides `run.seed`
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides `run.separator`
    #[arg(long)]
    separator: Option<String>,

    /// Starting words; the last one is the first agent
    #[arg(required = true, num_args = 1..)]
    words: Vec<Word>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("textboids=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = BoidsConfig::load(&args.config)?;
    if let Some(iterations) = args.iterations {
        config.run.iterations = iterations;
    }
    if let Some(seed) = args.seed {
        config.run.seed = Some(seed);
    }
    if let Some(separator) = args.separator {
        config.run.separator = separator;
    }

    let format = if args.binary {
        EmbeddingFormat::Binary
    } else {
        EmbeddingFormat::Text
    };
    tracing::info!(path = %args.model_path, ?format, "loading word vectors");
    let table = EmbeddingTable::load_word2vec(&args.model_path, format, args.limit)
        .context("Failed to load word vectors")?;

    for word in args.words.iter().filter(|w| !table.contains(w)) {
        tracing::warn!(word = %word, "initial word not in vocabulary, using zero vector");
    }

    let mut simulator = TextualBoids::new(table, &config);
    let outcome = simulator.run(&args.words, config.run.iterations);

    if let RunStatus::Failed { iteration, reason } = &outcome.status {
        tracing::warn!(
            iteration,
            error = %reason,
            words = outcome.text.len(),
            "simulation stopped early, printing partial text"
        );
    }
    tracing::info!(fallbacks = outcome.fallbacks, "final text");
    println!("{}", outcome.render(&config.run.separator));

    Ok(())
}
