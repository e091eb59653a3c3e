mod input;
mod server;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rmcp::{ServiceExt, transport::stdio};
use sympto_core::{CycleAnalysis, chart_data, day_listing, phase_report, prediction_report};
use sympto_store::{Config, Store};

use crate::input::ObservationInput;

#[derive(Parser)]
#[command(name = "sympto", about = "Sympto-thermal cycle tracker CLI and MCP server")]
struct Cli {
    /// User id (defaults to [profile] user in sympto.toml)
    #[arg(long, global = true)]
    user: Option<i64>,

    /// Number of most recent observed days to analyze
    #[arg(long, global = true)]
    window: Option<usize>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record or update the observation for one day
    Record(RecordArgs),

    /// List recorded days, newest first
    Show,

    /// Delete the record for a date
    Delete {
        /// Date, YYYY-MM-DD
        date: String,
    },

    /// Classify the analysis window day by day
    Analyze {
        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the current cycle phase with recommendations
    Phase,

    /// Show ovulation, fertile days and the next-ovulation estimate
    Predict,

    /// Show phase spans and chart markers
    Timeline {
        /// Print chart data as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export records to a JSON file
    Export {
        /// Output file path
        path: PathBuf,
    },

    /// Import records from a JSON file
    Import {
        /// Input file path
        path: PathBuf,
    },

    /// Start MCP server on stdio transport
    Serve,
}

#[derive(Args)]
struct RecordArgs {
    /// Date, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    date: Option<String>,
    /// Basal body temperature in °C ('.' or ',' decimal separator)
    #[arg(long, short)]
    temperature: Option<String>,
    /// Cervical mucus: dry, moist, wet
    #[arg(long)]
    mucus: Option<String>,
    /// Menstruation: none, light, medium, heavy, spotting
    #[arg(long)]
    menstruation: Option<String>,
    /// Cervix position: 1-4 or high-open, high-closed, low-open, low-closed
    #[arg(long)]
    cervix: Option<String>,
    /// Free-text note
    #[arg(long)]
    note: Option<String>,
    /// Abdominal pain or bloating
    #[arg(long)]
    abdominal_pain: bool,
    /// Breast tenderness
    #[arg(long)]
    breast_tenderness: bool,
    /// Intercourse
    #[arg(long)]
    intercourse: bool,
    /// Replace the whole record instead of merging into it
    #[arg(long)]
    replace: bool,
}

impl RecordArgs {
    fn input(&self) -> ObservationInput {
        let flag = |set: bool| set.then_some(true);
        ObservationInput {
            date: self.date.clone(),
            temperature: self.temperature.clone(),
            mucus: self.mucus.clone(),
            menstruation: self.menstruation.clone(),
            cervix: self.cervix.clone(),
            note: self.note.clone(),
            abdominal_pain: flag(self.abdominal_pain),
            breast_tenderness: flag(self.breast_tenderness),
            intercourse: flag(self.intercourse),
        }
    }
}

/// Store plus the settings resolved from config and flags.
struct Session {
    store: Store,
    config: Config,
    user: i64,
    window: usize,
}

impl Session {
    fn analysis(&self) -> Result<CycleAnalysis> {
        self.store
            .analyze_user(self.user, self.window)
            .context("failed to analyze records")
    }
}

fn open_session(cli: &Cli) -> Result<Session> {
    let dir = sympto_store::data_dir();
    let config = Config::load(&dir).context("failed to load config")?;
    let store = sympto_store::open_in_dir(&dir)
        .with_context(|| format!("failed to open store in {}", dir.display()))?;
    let user = cli.user.unwrap_or(config.profile.user);
    let window = cli.window.unwrap_or(config.analysis.window);
    tracing::debug!(dir = %dir.display(), user, window, "session opened");
    Ok(Session {
        store,
        config,
        user,
        window,
    })
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Record(args) => cmd_record(&cli, args),
        Commands::Show => cmd_show(&cli),
        Commands::Delete { date } => cmd_delete(&cli, date),
        Commands::Analyze { json } => cmd_analyze(&cli, *json),
        Commands::Phase => cmd_phase(&cli),
        Commands::Predict => cmd_predict(&cli),
        Commands::Timeline { json } => cmd_timeline(&cli, *json),
        Commands::Export { path } => cmd_export(&cli, path),
        Commands::Import { path } => cmd_import(&cli, path),
        Commands::Serve => cmd_serve(&cli).await,
    }
}

async fn cmd_serve(cli: &Cli) -> Result<()> {
    let mut session = open_session(cli)?;
    // Tool calls without user/window fall back to these
    session.config.profile.user = session.user;
    session.config.analysis.window = session.window;
    tracing::info!(user = session.user, window = session.window, "starting MCP server");

    let server = server::SymptoServer::new(session.store, session.config);
    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;
    service.waiting().await?;
    Ok(())
}

fn cmd_record(cli: &Cli, args: &RecordArgs) -> Result<()> {
    let session = open_session(cli)?;
    let obs = args
        .input()
        .into_observation(&session.config.input)
        .context("invalid observation")?;

    let saved = if args.replace {
        session.store.upsert_record(session.user, &obs)?;
        obs
    } else {
        session.store.apply_patch(session.user, &obs)?
    };

    println!("recorded {} for user {}", saved.date, session.user);
    if let Some(t) = &saved.temperature {
        println!("  temperature: {t}");
    }
    println!("records: {}", session.store.record_count(session.user)?);
    Ok(())
}

fn cmd_show(cli: &Cli) -> Result<()> {
    let session = open_session(cli)?;
    let analysis = session.analysis()?;
    if analysis.days.is_empty() {
        println!("(no records)");
    } else {
        print!("{}", day_listing(&analysis.days));
    }
    Ok(())
}

fn cmd_delete(cli: &Cli, date: &str) -> Result<()> {
    let session = open_session(cli)?;
    let deleted = session
        .store
        .delete_record(session.user, date)
        .context("failed to delete record")?;
    if deleted {
        println!("deleted {date}");
    } else {
        println!("no record for {date}");
    }
    Ok(())
}

fn cmd_analyze(cli: &Cli, json: bool) -> Result<()> {
    let session = open_session(cli)?;
    let analysis = session.analysis()?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&analysis).context("failed to serialize analysis")?
        );
        return Ok(());
    }

    println!("status: {:?}", analysis.status);
    if let Some(k) = analysis.ovulation_index {
        println!("ovulation index: {k}");
    }
    for day in &analysis.days {
        let temp = day
            .temperature
            .map(|t| format!("{t:.2}"))
            .unwrap_or_else(|| "-".to_string());
        let fertile = if day.is_fertile { "fertile" } else { "" };
        println!(
            "{}  {:>3}  {:>6}  {:<10} {}",
            day.date,
            day.day_number,
            temp,
            day.phase.label(),
            fertile
        );
    }
    Ok(())
}

fn cmd_phase(cli: &Cli) -> Result<()> {
    let session = open_session(cli)?;
    print!("{}", phase_report(&session.analysis()?));
    Ok(())
}

fn cmd_predict(cli: &Cli) -> Result<()> {
    let session = open_session(cli)?;
    let report = prediction_report(&session.analysis()?);
    println!("{}", report.trim_end());
    Ok(())
}

fn cmd_timeline(cli: &Cli, json: bool) -> Result<()> {
    let session = open_session(cli)?;
    let chart = chart_data(&session.analysis()?.days);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&chart).context("failed to serialize chart")?
        );
        return Ok(());
    }

    if chart.spans.is_empty() {
        println!("(no records)");
        return Ok(());
    }
    for span in &chart.spans {
        println!(
            "{} .. {}  {:<10} {} day(s)",
            span.start,
            span.end,
            span.phase.label(),
            span.days
        );
    }
    for marker in &chart.markers {
        println!(
            "  {} {:.2}  {:?}",
            marker.date, marker.temperature, marker.kind
        );
    }
    if let Some((lo, hi)) = chart.y_range {
        println!("range: {lo:.2} - {hi:.2}");
    }
    Ok(())
}

fn cmd_export(cli: &Cli, path: &Path) -> Result<()> {
    let session = open_session(cli)?;
    session
        .store
        .export_json_file(session.user, path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!(
        "exported {} records to {}",
        session.store.record_count(session.user)?,
        path.display()
    );
    Ok(())
}

fn cmd_import(cli: &Cli, path: &Path) -> Result<()> {
    let session = open_session(cli)?;
    let imported = session
        .store
        .import_json_file(session.user, path)
        .context("failed to import JSON")?;

    println!(
        "imported {imported} records from {}. records={}",
        path.display(),
        session.store.record_count(session.user)?
    );
    Ok(())
}
