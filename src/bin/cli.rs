//! wikimirror CLI
//!
//! Capture a wiki into a local store and query it, or the live site, with
//! the same commands.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use wikimirror::{
    error::Result,
    models::{Config, PageFilter},
    orm::Wiki,
    pipeline,
    source::{LiveSource, LocalSource, Source},
};

/// wikimirror - Wikidot wiki mirror
#[derive(Parser, Debug)]
#[command(
    name = "wikimirror",
    version,
    about = "Mirror a Wikidot wiki into SQLite and read it back"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Wiki to work on, overrides the configured site
    #[arg(long)]
    site: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    login: Login,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Login {
    /// Account used for authenticated requests
    #[arg(long, global = true, requires = "password")]
    user: Option<String>,

    #[arg(long, global = true, requires = "user")]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture the whole wiki into the local store
    Capture {
        /// Store path, overrides the configured one
        #[arg(long)]
        store: Option<PathBuf>,

        /// Also capture forum categories, threads and posts
        #[arg(long)]
        forums: bool,

        /// Also capture overrides, titles and licensed images
        #[arg(long)]
        metadata: bool,

        /// Also capture page source text
        #[arg(long)]
        source_text: bool,
    },

    /// List pages matching filters such as `tag=scp rating=>20 order=title`
    List {
        filters: Vec<String>,

        /// Read from a captured store instead of the live site
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Show one page
    Page {
        name: String,

        /// Read from a captured store instead of the live site
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Validate the configuration
    Validate,
}

/// Initialize logging with the given default level.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn live_source(config: &Config, login: &Login) -> Result<Arc<dyn Source>> {
    let source = LiveSource::new(config)?;
    if let (Some(user), Some(password)) = (&login.user, &login.password) {
        source.login(user, password).await?;
    }
    Ok(Arc::new(source))
}

async fn open_source(
    config: &Config,
    login: &Login,
    store: Option<PathBuf>,
) -> Result<Arc<dyn Source>> {
    match store {
        Some(path) => {
            log::info!("Reading capture at {}", path.display());
            Ok(Arc::new(LocalSource::open(&path, config.site.clone()).await?))
        }
        None => live_source(config, login).await,
    }
}

async fn show_page(wiki: &Wiki, name: &str) -> Result<()> {
    let page = wiki.page(name);
    let history = page.history().await?;
    let tags = page.tags().await?;
    let authors = page
        .authors()
        .await?
        .into_iter()
        .map(|credit| format!("{} ({:?})", credit.user, credit.role))
        .collect::<Vec<_>>();

    println!("{}", page.url());
    println!("  id:        {}", page.id().await?);
    println!("  title:     {}", page.title().await?);
    println!("  authors:   {}", authors.join(", "));
    println!("  rating:    {:+}", page.rating().await?);
    println!("  revisions: {}", history.len());
    println!(
        "  tags:      {}",
        tags.iter().cloned().collect::<Vec<_>>().join(" ")
    );
    println!("  comments:  {}", page.comments().await?.len());
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::default(),
    };
    if let Some(site) = &cli.site {
        config = config.with_site(site);
    }

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    init_logging(&level);

    match loaded {
        Ok(_) => log::info!("Loaded configuration from {}", cli.config.display()),
        Err(e) => log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        ),
    }

    match cli.command {
        Command::Capture {
            store,
            forums,
            metadata,
            source_text,
        } => {
            if let Some(path) = store {
                config.store.path = path;
            }
            config.capture.forums |= forums;
            config.capture.metadata |= metadata;
            config.capture.source_text |= source_text;
            config.validate()?;

            let source = live_source(&config, &cli.login).await?;
            pipeline::run_capture(&config, source).await?;
        }

        Command::List { filters, store } => {
            let filter = PageFilter::parse(filters.iter().map(String::as_str))?;
            let wiki = Wiki::new(open_source(&config, &cli.login, store).await?);
            let pages = wiki.list_pages(&filter).await?;
            for page in &pages {
                println!("{}", page.url());
            }
            log::info!("{} pages", pages.len());
        }

        Command::Page { name, store } => {
            let wiki = Wiki::new(open_source(&config, &cli.login, store).await?);
            show_page(&wiki, &name).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK for {}", config.site);
        }
    }

    Ok(())
}
