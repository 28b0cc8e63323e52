mod cache;
mod config;
mod contact;
mod error;
mod logging;
mod pager;
mod query;
mod remote;
mod tasks;
mod ui;
mod view;

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use cache::ContactCache;
use config::Config;
use logging::LogConfig;
use remote::http::HttpContactSource;
use remote::worker::FetchWorker;
use ui::app::{App, Route};
use view::{visible_contacts, ViewMode};

#[derive(Parser, Debug)]
#[command(name = "cbrowse", version, about = "Browse a paginated contact API and a local task list")]
struct Cli {
    /// Configuration file (defaults to <config dir>/cbrowse/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the contact browser directly
    Contacts {
        #[arg(value_enum, default_value_t = ViewArg::All)]
        view: ViewArg,
    },
    /// Open the task list
    Tasks,
    /// Fetch contacts and print them as tab-separated lines
    Query(QueryArgs),
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Search term sent to the server
    #[arg(long)]
    search: Option<String>,

    #[arg(long, value_enum, default_value_t = ViewArg::All)]
    view: ViewArg,

    /// Keep only contacts at even positions
    #[arg(long, default_value_t = false)]
    even: bool,

    /// Maximum number of pages to fetch
    #[arg(long, default_value_t = 1)]
    pages: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ViewArg {
    All,
    Us,
}

impl From<ViewArg> for ViewMode {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::All => ViewMode::All,
            ViewArg::Us => ViewMode::Us,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    if let Some(Command::Query(args)) = cli.command {
        logging::init_logging(&LogConfig::from_verbosity(cli.verbose))?;
        log_config(&config);
        return handle_query(args, &config);
    }

    let log_file = match &config.log_file {
        Some(path) => path.clone(),
        None => config::default_log_file()?,
    };
    logging::init_logging(&LogConfig::from_verbosity(cli.verbose).with_log_file(Some(log_file)))?;
    log_config(&config);

    let route = match cli.command {
        Some(Command::Contacts { view }) => Route::Contacts(view.into()),
        Some(Command::Tasks) => Route::Tasks,
        _ => Route::Home,
    };

    let source = HttpContactSource::new(config.request_timeout)?;
    let worker = FetchWorker::spawn(Box::new(source))?;
    let mut app = App::new(&config, worker);
    app.navigate(route);
    app.run()?;

    Ok(())
}

fn log_config(config: &Config) {
    match &config.config_path {
        Some(path) => tracing::info!(path = %path.display(), "loaded configuration"),
        None => tracing::info!("using built-in configuration"),
    }
    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }
}

fn handle_query(args: QueryArgs, config: &Config) -> Result<()> {
    if args.pages == 0 {
        bail!("--pages must be at least 1");
    }

    let source = HttpContactSource::new(config.request_timeout)?;
    let mut cache = ContactCache::new(config.endpoint.as_str());
    let search = args.search.as_deref().unwrap_or("");

    let mut request = cache.reset(search);
    let mut fetched = 0;
    while let Some(current) = request.take() {
        cache.apply(remote::execute(&source, current));
        if let Some(err) = cache.last_error() {
            return Err(anyhow!("{}: {}", err.kind(), err));
        }
        fetched += 1;
        if fetched < args.pages {
            request = cache.load_more();
        }
    }
    if let Some(err) = cache.last_error() {
        return Err(anyhow!("{}: {}", err.kind(), err));
    }

    let contacts = visible_contacts(cache.contacts(), args.view.into(), args.even, &config.country);

    // Header line, then id<TAB>phone<TAB>country
    println!("Found {} contact(s)", contacts.len());
    for contact in contacts {
        println!("{}\t{}\t{}", contact.id, contact.phone, contact.country.name);
    }

    Ok(())
}
