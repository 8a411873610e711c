use clap::{Parser, Subcommand};
use inkfolio::aggregate::{self, SelectKey};
use inkfolio::config::{self, SiteConfig};
use inkfolio::generate;
use inkfolio::output;
use inkfolio::pipeline::{Pipeline, PipelineError};
use inkfolio::source::ExportSource;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive; overrides `-v`/`-q`.
const LOG_ENV: &str = "INKFOLIO_LOG";

fn version_string() -> &'static str {
    let on_tag = env!("INKFOLIO_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("INKFOLIO_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "inkfolio")]
#[command(about = "Static blog generator for a document-database workspace export")]
#[command(long_about = "\
Static blog generator for a document-database workspace export

An exporter writes a snapshot of the workspace to disk; inkfolio filters it
by visibility, builds listings and post pages, and writes a plain HTML site.

Content structure:

  content/
  ├── config.toml                  # Site config (optional, overrides stock defaults)
  ├── posts.json                   # Post metadata, one entry per database row
  ├── records/                     # Post bodies, one record map per post id
  │   └── 8a1f…c2.json
  └── assets/                      # Static assets (favicon, images) → copied to output root

Visibility (configurable under [filter.list] and [filter.detail]):
  Listings:    status Public, any type
  Post pages:  status Public or PublicOnDetail, type Post, Paper or Page

Run 'inkfolio gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory (workspace snapshot)
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Clone)]
struct TopArgs {
    /// Show only the N most used
    #[arg(long)]
    top: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// List visible posts, newest first
    List {
        /// Use the detail policy (everything reachable by URL)
        #[arg(long)]
        detail: bool,
        /// Only posts whose title contains this text (case-insensitive)
        #[arg(long)]
        search: Option<String>,
        /// Only posts in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Resolve one slug the way its post page would
    Show {
        slug: String,
    },
    /// Tag usage across listed posts
    Tags(TopArgs),
    /// Category usage across listed posts
    Categories(TopArgs),
    /// Generate the HTML site
    Build {
        /// Rewrite every page even when unchanged
        #[arg(long)]
        no_cache: bool,
    },
    /// Validate config and snapshot without building
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // Everything except gen-config reads the content directory.
    let load = || -> Result<(SiteConfig, Pipeline<ExportSource>), config::ConfigError> {
        let site_config = config::load_config(&cli.source)?;
        let pipeline = Pipeline::new(ExportSource::new(&cli.source), site_config.policies());
        Ok((site_config, pipeline))
    };

    match cli.command {
        Command::List {
            detail,
            search,
            category,
        } => {
            let (site_config, mut pipeline) = load()?;
            let posts = if detail {
                pipeline.detail_posts()?
            } else {
                pipeline.list_posts()?
            };
            let category = category.filter(|c| *c != site_config.listing.all_category_label);
            let matched = aggregate::search_posts(
                &posts,
                search.as_deref().unwrap_or(""),
                category.as_deref(),
            );
            output::print_post_list(&matched);
        }
        Command::Show { slug } => {
            let (_, mut pipeline) = load()?;
            match pipeline.build_detail(&slug) {
                Ok(detail) => output::print_post_detail(&detail),
                Err(PipelineError::PostNotFound(slug)) => {
                    return Err(format!("no post found for slug: {slug}").into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Tags(args) => {
            let (_, mut pipeline) = load()?;
            let posts = pipeline.list_posts()?;
            let counts = aggregate::select_items(SelectKey::Tags, &posts);
            output::print_counts("Tags", &aggregate::ranked(&counts, args.top));
        }
        Command::Categories(args) => {
            let (_, mut pipeline) = load()?;
            let posts = pipeline.list_posts()?;
            let counts = aggregate::select_items(SelectKey::Categories, &posts);
            output::print_counts("Categories", &aggregate::ranked(&counts, args.top));
        }
        Command::Build { no_cache } => {
            let (site_config, mut pipeline) = load()?;
            println!(
                "==> Building {} \u{2192} {}",
                cli.source.display(),
                cli.output.display()
            );
            let result = generate::generate(
                &mut pipeline,
                &site_config,
                &cli.source,
                &cli.output,
                !no_cache,
            )?;
            output::print_generate_output(&result);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let (_, mut pipeline) = load()?;
            let report = pipeline.check()?;
            output::print_check_output(&report);
            if !report.is_ok() {
                return Err(format!(
                    "{} duplicate slug(s); only the first post for each gets a page",
                    report.duplicates.len()
                )
                .into());
            }
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `INKFOLIO_LOG` wins; otherwise `-v` is debug, `-q` is error, default warn.
fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
