use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use diesel::connection::set_default_instrumentation;
use tracing_subscriber::fmt::format::FmtSpan;

use taxomap::callback::{self, CallbackCounts, CallbackPayload};
use taxomap::database;
use taxomap::errors::Error;
use taxomap::ingest::{self, filename, IngestRequest, JsonIngestPayload};
use taxomap::mapping::orchestrator;
use taxomap::mapping::semantic::HttpSemanticMatcher;
use taxomap::models::enums::LoadKind;
use taxomap::models::load::LoadDetails;
use taxomap::promotion;

/// Taxonomy mapping engine: ingest, version, map, and promote healthcare
/// profession taxonomies.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a taxonomy load
    #[command(subcommand)]
    Ingest(IngestCommand),

    /// Version engine operations
    #[command(subcommand)]
    Version(VersionCommand),

    /// Run the mapping cascade for a taxonomy pair
    Map(MapArgs),

    /// Sync the production mapping projection
    Promote,

    /// Send a test callback to a URL, without touching the database
    CallbackTest(CallbackTestArgs),
}

#[derive(clap::Subcommand)]
enum IngestCommand {
    /// Ingest a file named per the `(Master|Customer) <owner> <taxonomy> [text].<ext>` convention
    File(IngestFileArgs),

    /// Ingest the explicit JSON payload shape (§6)
    Json(IngestJsonArgs),
}

#[derive(Args)]
struct IngestFileArgs {
    /// Path to the CSV file; its filename is parsed per the naming convention
    path: PathBuf,

    /// Whether this load replaces the taxonomy's active node set or only adds to it
    #[arg(long, value_enum, default_value = "new")]
    kind: CliLoadKind,

    /// URL to POST the load-close callback to, if any (§6)
    #[arg(long)]
    callback_url: Option<String>,
}

#[derive(Args)]
struct IngestJsonArgs {
    /// Path to a file containing the JSON ingest payload
    path: PathBuf,

    #[arg(long, value_enum, default_value = "new")]
    kind: CliLoadKind,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliLoadKind {
    New,
    Update,
}

impl From<CliLoadKind> for LoadKind {
    fn from(kind: CliLoadKind) -> LoadKind {
        match kind {
            CliLoadKind::New => LoadKind::New,
            CliLoadKind::Update => LoadKind::Update,
        }
    }
}

#[derive(clap::Subcommand)]
enum VersionCommand {
    /// Print the currently open version for a taxonomy
    Show { taxonomy_id: uuid::Uuid },
}

#[derive(Args)]
struct MapArgs {
    master_taxonomy_id: uuid::Uuid,
    customer_taxonomy_id: uuid::Uuid,
}

#[derive(Args)]
struct CallbackTestArgs {
    url: String,
}

/// Reads a CSV file and the bronze rows it implies. Each tagged header (§4.2)
/// contributes a layout tag keyed by its un-tagged name; untagged columns
/// (e.g. a source id column) are dropped from both the layout and the rows.
fn read_csv_rows(path: &PathBuf) -> Result<(Vec<taxomap::layout::HeaderTag>, Vec<ingest::IngestRow>), Error> {
    let mut reader = csv::Reader::from_path(path)?;
    let header_row: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut layout_tags = Vec::new();
    let mut columns: Vec<(usize, String)> = Vec::new();
    for (index, header) in header_row.iter().enumerate() {
        if let Ok(tag) = taxomap::layout::parse_header(header) {
            columns.push((index, taxomap::layout::tag_name(&tag).to_string()));
            layout_tags.push(tag);
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells: Vec<(String, String)> =
            columns.iter().map(|(index, name)| (name.clone(), record.get(*index).unwrap_or_default().to_string())).collect();
        rows.push(ingest::IngestRow { cells });
    }
    Ok((layout_tags, rows))
}

fn run_ingest_file(pool: &database::PgPool, path: PathBuf, load_kind: LoadKind, callback_url: Option<String>) -> Result<(), Error> {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
    let parsed = filename::parse(&name)?;
    let (layout_tags, rows) = read_csv_rows(&path)?;

    let request = IngestRequest {
        owner_id: parsed.owner_id,
        taxonomy_kind: parsed.taxonomy_kind,
        taxonomy_id: parsed.taxonomy_id,
        load_kind,
        layout_tags,
        rows,
        details: LoadDetails {
            input_format: Some("csv".to_string()),
            source_url: Some(path.display().to_string()),
            callback_url: callback_url.clone(),
            ..Default::default()
        },
    };

    let mut conn = pool.get()?;
    let outcome = ingest::run(&mut conn, request)?;
    tracing::info!(load_id = %outcome.load_id, taxonomy_id = %outcome.taxonomy_id, status = %outcome.status, "load finished");

    if let Some(callback_url) = callback_url {
        let payload = CallbackPayload::new(None, outcome.load_id, outcome.status, CallbackCounts::from(outcome.counts), outcome.taxonomy_id);
        callback::deliver(&callback_url, &payload);
    }
    Ok(())
}

fn run_ingest_json(pool: &database::PgPool, path: PathBuf, load_kind: LoadKind) -> Result<(), Error> {
    let body = std::fs::read_to_string(&path)?;
    let payload: JsonIngestPayload = serde_json::from_str(&body)?;
    let callback_url = payload.callback_url.clone();
    let request_id = payload.request_id.clone();
    let request = payload.into_request(load_kind)?;

    let mut conn = pool.get()?;
    let outcome = ingest::run(&mut conn, request)?;
    tracing::info!(load_id = %outcome.load_id, taxonomy_id = %outcome.taxonomy_id, status = %outcome.status, "load finished");

    if let Some(callback_url) = callback_url {
        let payload = CallbackPayload::new(request_id, outcome.load_id, outcome.status, CallbackCounts::from(outcome.counts), outcome.taxonomy_id);
        callback::deliver(&callback_url, &payload);
    }
    Ok(())
}

fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_level(false)
        .init();

    set_default_instrumentation(database::simple_logger).expect("failed to set up database instrumentation");

    let cli = Cli::parse();
    let pool = database::get_pool()?;

    match cli.command {
        Commands::Ingest(IngestCommand::File(args)) => run_ingest_file(&pool, args.path, args.kind.into(), args.callback_url)?,
        Commands::Ingest(IngestCommand::Json(args)) => run_ingest_json(&pool, args.path, args.kind.into())?,

        Commands::Version(VersionCommand::Show { taxonomy_id }) => {
            let mut conn = pool.get()?;
            let version = taxomap::versioning::current_version(&mut conn, taxonomy_id)?;
            tracing::info!(taxonomy_id = %taxonomy_id, version = version.version_number, "current open version");
        }

        Commands::Map(args) => {
            let mut conn = pool.get()?;
            let matcher = HttpSemanticMatcher::from_env();
            let counts = orchestrator::run_for_taxonomy(&mut conn, args.master_taxonomy_id, args.customer_taxonomy_id, &matcher)?;
            tracing::info!(mapped = counts.mapped, unmapped = counts.unmapped, "mapping cascade finished");
        }

        Commands::Promote => {
            let mut conn = pool.get()?;
            let counts = promotion::sync(&mut conn)?;
            tracing::info!(inserted = counts.inserted, deleted = counts.deleted, "production projection synced");
        }

        Commands::CallbackTest(args) => {
            let payload = CallbackPayload::new(
                Some("callback-test".to_string()),
                uuid::Uuid::new_v4(),
                taxomap::models::enums::LoadStatus::Completed,
                CallbackCounts { completed: 1, failed: 0, skipped: 0 },
                uuid::Uuid::new_v4(),
            );
            callback::deliver(&args.url, &payload);
        }
    }

    Ok(())
}
