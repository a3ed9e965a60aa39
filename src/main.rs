use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use harmonic_history::catalog::{CatalogAdapter, SlidingWindowLimiter, SpotifyClient};
use harmonic_history::config::{AppConfig, CliConfig, FileConfig};
use harmonic_history::enrichment::{EnrichedPlaylistTrack, EnrichedStream};
use harmonic_history::matching::{CompatibilityQuery, Matchable, Selector};
use harmonic_history::pipeline;
use harmonic_history::table_store::{SqliteTableStore, TableName};
use harmonic_history::wheel::{HarmonicWheel, Relation};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "harmonic-history", version)]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding the streaming history export documents.
    #[clap(long, value_parser = parse_path)]
    pub history_dir: Option<PathBuf>,

    /// Path to the SQLite file tables are persisted in.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Playlist id, URI or link to enrich. Can be repeated.
    #[clap(long = "playlist")]
    pub playlists: Vec<String>,

    #[clap(long)]
    pub client_id: Option<String>,

    #[clap(long)]
    pub client_secret: Option<String>,

    /// Pre-issued catalog access token, used instead of client credentials.
    #[clap(long)]
    pub access_token: Option<String>,

    /// Only enrich the first N rows of each table.
    #[clap(long)]
    pub max_items: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalizes the history, enriches streams and playlists and saves all tables.
    Ingest,

    /// Prints tracks that mix well with a reference track.
    Match(MatchArgs),

    /// Lists the saved tables.
    Tables,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MatchTable {
    StreamsFeatures,
    NoSkip,
    PlaylistFeatures,
}

impl MatchTable {
    fn table_name(self) -> TableName {
        match self {
            MatchTable::StreamsFeatures => TableName::StreamsFeatures,
            MatchTable::NoSkip => TableName::NoSkip,
            MatchTable::PlaylistFeatures => TableName::PlaylistFeatures,
        }
    }
}

#[derive(Args, Debug)]
struct MatchArgs {
    /// Reference track id or URI.
    #[clap(long)]
    pub id: Option<String>,

    /// Reference track position in the deduplicated table.
    #[clap(long)]
    pub index: Option<usize>,

    /// Pick the reference track at random.
    #[clap(long)]
    pub random: bool,

    /// Seed for the random pick.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Allowed BPM distance from the reference tempo.
    #[clap(long, default_value_t = 10.0)]
    pub tempo_range: f64,

    /// Wheel relations to include. Can be repeated, defaults to same key.
    #[clap(long = "relation", value_enum)]
    pub relations: Vec<Relation>,

    /// Leave the reference track out of the results.
    #[clap(long)]
    pub exclude_reference: bool,

    #[clap(long, value_enum, default_value = "playlist-features")]
    pub table: MatchTable,
}

fn cli_config(args: &CliArgs) -> CliConfig {
    CliConfig {
        history_dir: args.history_dir.clone(),
        db_path: args.db_path.clone(),
        playlists: args.playlists.clone(),
        client_id: args.client_id.clone(),
        client_secret: args.client_secret.clone(),
        access_token: args.access_token.clone(),
        max_items: args.max_items,
    }
}

fn run_ingest(config: &AppConfig, store: &SqliteTableStore) -> Result<()> {
    let Some(client_config) = config.catalog.client_config() else {
        bail!("Catalog credentials are required: set access_token or client_id and client_secret");
    };
    let client = SpotifyClient::new(client_config).context("Failed to create catalog client")?;
    let adapter = CatalogAdapter::new(
        client,
        SlidingWindowLimiter::new(config.rate_limit.clone()),
        config.retry.clone(),
    )
    .with_page_size(config.catalog.page_size);

    let report = pipeline::ingest(
        &adapter,
        HarmonicWheel::load(),
        store,
        &config.history_dir,
        &config.playlists,
        &config.enrichment,
    )?;

    println!("all_streams        {}", report.all_streams);
    println!("streams            {}", report.streams);
    println!("podcasts           {}", report.podcasts);
    println!("streams_features   {}", report.streams_features);
    println!("no_skip            {}", report.no_skip);
    println!("playlist_features  {}", report.playlist_features);
    println!("wheel              {}", report.wheel);
    if report.history.skipped > 0 {
        println!("skipped records    {}", report.history.skipped);
    }
    Ok(())
}

fn print_matches<R>(
    store: &SqliteTableStore,
    table: TableName,
    query: &CompatibilityQuery,
    seed: Option<u64>,
) -> Result<()>
where
    R: Matchable + Clone + DeserializeOwned + Display,
{
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let result = pipeline::query_table::<R>(store, HarmonicWheel::load(), table, query, &mut rng)?;

    println!("Reference: {}", result.reference);
    if result.candidates.is_empty() {
        println!("No compatible tracks.");
    }
    for candidate in &result.candidates {
        println!("  {}", candidate);
    }
    Ok(())
}

fn run_match(args: &MatchArgs, store: &SqliteTableStore) -> Result<()> {
    let selector = Selector::from_flags(args.id.as_deref(), args.index, args.random)?;
    let mut query = CompatibilityQuery::with_selector(selector);
    query.tempo_tolerance = args.tempo_range;
    query.exclude_reference = args.exclude_reference;
    if !args.relations.is_empty() {
        query.relations = args.relations.clone();
    }

    let table = args.table.table_name();
    match args.table {
        MatchTable::PlaylistFeatures => {
            print_matches::<EnrichedPlaylistTrack>(store, table, &query, args.seed)
        }
        MatchTable::StreamsFeatures | MatchTable::NoSkip => {
            print_matches::<EnrichedStream>(store, table, &query, args.seed)
        }
    }
}

fn run_tables(store: &SqliteTableStore) -> Result<()> {
    let tables = store.list_tables()?;
    if tables.is_empty() {
        println!("No tables saved yet.");
    }
    for table in tables {
        let saved_at = chrono::DateTime::from_timestamp(table.saved_at, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| table.saved_at.to_string());
        println!(
            "{:<18} {:<24} {:>8} rows  {}",
            table.name, table.kind, table.row_count, saved_at
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(&cli_config(&cli_args), file_config)?;

    info!("Opening table store at {:?}...", config.db_path);
    let store = SqliteTableStore::open(&config.db_path)?;

    match &cli_args.command {
        Command::Ingest => run_ingest(&config, &store),
        Command::Match(args) => run_match(args, &store),
        Command::Tables => run_tables(&store),
    }
}
