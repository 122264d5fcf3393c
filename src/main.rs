use anvil_journal::config::{self, PipelineConfig};
use anvil_journal::i18n::{Catalog, Localize};
use anvil_journal::source::{self, HttpArticleSource};
use anvil_journal::upload::{AssetUploader, DirectoryUploader, HttpUploader};
use anvil_journal::{Article, TransformResult, Transformer, import_article, output};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "anvil-journal")]
#[command(about = "Turn World Anvil articles into journal-ready HTML")]
#[command(long_about = "\
Turn World Anvil articles into journal-ready HTML

Each article is assembled from its sections and relations, wrapped in the
journal layout, and sanitized: images get absolute URLs, references to other
articles become styled markers, and the display stylesheet is re-hosted next
to the output.

Output for an input named town.json:

  dist/
  ├── town.html                        # Journal HTML
  ├── town.json                        # {\"html\": ..., \"img\": ...}
  └── modules/world-anvil/assets/
      └── world-anvil.css              # Re-hosted stylesheet (with --css)

Run 'anvil-journal gen-config' to generate a documented anvil.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "anvil.toml", global = true)]
    config: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Display stylesheet to rewrite and re-host
    #[arg(long, global = true)]
    css: Option<PathBuf>,

    /// Language file for localized strings
    #[arg(long, global = true)]
    lang: Option<PathBuf>,

    /// Log pipeline progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transform an article JSON export
    Transform {
        /// Article JSON file
        input: PathBuf,
    },
    /// Fetch an article from the API and transform it
    Import {
        /// Article id
        id: String,
    },
    /// Parse an article and show what the pipeline will see
    Check {
        /// Article JSON file
        input: PathBuf,
    },
    /// Print a stock anvil.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Command::Transform { input } => {
            let config = config::load_config(&cli.config)?;
            let article = source::read_article(input)?;
            let transformer = build_transformer(&cli, config)?;
            let result = transformer.transform(&article).await?;
            transformer.flush().await;
            write_result(&cli.output, &file_stem(input), &article, &result)?;
        }
        Command::Import { id } => {
            let config = config::load_config(&cli.config)?;
            let source = HttpArticleSource::new(&config.source)?;
            let transformer = build_transformer(&cli, config)?;
            let (article, result) = import_article(&source, &transformer, id).await?;
            transformer.flush().await;
            write_result(&cli.output, &id_stem(id), &article, &result)?;
        }
        Command::Check { input } => {
            config::load_config(&cli.config)?;
            let article = source::read_article(input)?;
            println!("==> Checking {}", input.display());
            output::print_article_summary(&article);
            println!("==> Article is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise info for this crate, debug with `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "anvil_journal=debug,warn"
    } else {
        "anvil_journal=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_transformer(
    cli: &Cli,
    config: PipelineConfig,
) -> Result<Transformer, Box<dyn std::error::Error>> {
    let localizer: Arc<dyn Localize> = match &cli.lang {
        Some(path) => Arc::new(Catalog::load(path)?),
        None => Arc::new(Catalog::english()),
    };
    let uploader: Arc<dyn AssetUploader> = match &config.upload.endpoint {
        Some(endpoint) => Arc::new(HttpUploader::new(endpoint.clone())),
        None => Arc::new(DirectoryUploader::new(cli.output.clone())),
    };

    let transformer = Transformer::new(config, localizer, uploader)?;
    Ok(match &cli.css {
        Some(path) => transformer.with_stylesheet(std::fs::read_to_string(path)?),
        None => transformer,
    })
}

fn write_result(
    output_dir: &Path,
    stem: &str,
    article: &Article,
    result: &TransformResult,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(output_dir)?;
    let html_path = output_dir.join(format!("{stem}.html"));
    std::fs::write(&html_path, &result.html)?;
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(output_dir.join(format!("{stem}.json")), json)?;
    output::print_transform_output(article, result, &html_path);
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "article".to_string())
}

/// File stem for an article id. Anything but ASCII letters, digits, `-` and
/// `_` becomes `_`, so the stem cannot leave the output directory.
fn id_stem(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "article".to_string()
    } else {
        stem
    }
}
