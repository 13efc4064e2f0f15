use clap::{Args, Parser, Subcommand, ValueEnum};
use phaseplan::logging::{LogLevel, init_logging};
use phaseplan::{
    ConfigError, DurationUnit, PersistenceError, Phase, PhaseStore, ProjectId, Resolution,
    Schedule, ScheduleRun, SchedulerConfig, SqlitePhaseStore, load_phases_from_csv,
    load_phases_from_json,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Debug, Parser)]
#[command(
    name = "phaseplan",
    version,
    about = "Lay out project phases on a dependency-aware timeline"
)]
struct Cli {
    /// Log level (overrides PHASEPLAN_LOG).
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Schedule the phases stored in a JSON or CSV file.
    Schedule {
        path: PathBuf,
        /// Input format; inferred from the file extension when omitted.
        #[arg(long, value_enum)]
        format: Option<InputFormat>,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Schedule the phases of one project stored in a SQLite database.
    ScheduleDb {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        project: ProjectId,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Import phases from a file into a project in a SQLite database.
    Import {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        project: ProjectId,
        path: PathBuf,
        #[arg(long, value_enum)]
        format: Option<InputFormat>,
    },
}

#[derive(Debug, Args)]
struct LayoutArgs {
    /// TOML scheduler configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Duration unit; overrides the configuration file.
    #[arg(long, value_enum)]
    units: Option<UnitArg>,
    /// Hours per day for work-day units; overrides the configuration file.
    #[arg(long)]
    hours_per_day: Option<u32>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum UnitArg {
    Hours,
    Days,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn infer_format(path: &Path, explicit: Option<InputFormat>) -> InputFormat {
    explicit.unwrap_or_else(|| {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => InputFormat::Csv,
            _ => InputFormat::Json,
        }
    })
}

fn load_file(path: &Path, format: Option<InputFormat>) -> Result<Vec<Phase>, CliError> {
    let phases = match infer_format(path, format) {
        InputFormat::Json => load_phases_from_json(path)?,
        InputFormat::Csv => load_phases_from_csv(path)?,
    };
    Ok(phases)
}

fn scheduler_config(args: &LayoutArgs) -> Result<SchedulerConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => phaseplan::config::load_from_path(path)?,
        None => SchedulerConfig::default(),
    };
    match args.units {
        Some(UnitArg::Hours) => config.duration_unit = DurationUnit::Hours,
        Some(UnitArg::Days) if !matches!(config.duration_unit, DurationUnit::WorkDays { .. }) => {
            config.duration_unit = DurationUnit::work_days();
        }
        Some(UnitArg::Days) | None => {}
    }
    if let Some(hours) = args.hours_per_day {
        match &mut config.duration_unit {
            DurationUnit::WorkDays { hours_per_day } => *hours_per_day = hours,
            DurationUnit::Hours => warn!("--hours-per-day has no effect when units are hours"),
        }
    }
    config.validate()?;
    Ok(config)
}

fn render_line<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::from("|");
    for (ci, cell) in cells.enumerate() {
        let pad = widths[ci].saturating_sub(cell.chars().count());
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(pad));
        out.push_str(" |");
    }
    out
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_line(&widths, headers.iter().copied()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_line(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_run(run: &ScheduleRun) -> String {
    let rows: Vec<Vec<String>> = run
        .items
        .iter()
        .map(|item| {
            vec![
                item.number.clone(),
                item.title.clone(),
                item.start_offset.to_string(),
                item.duration.to_string(),
                item.end_offset.to_string(),
                item.slack.to_string(),
            ]
        })
        .collect();
    let mut out = render_table(
        &["number", "title", "start", "duration", "end", "slack"],
        &rows,
    );
    match run.horizon() {
        0 => out.push_str(&format!("{} phases, timeline empty\n", run.items.len())),
        horizon => out.push_str(&format!(
            "{} phases, timeline 1..{} {}\n",
            run.items.len(),
            horizon,
            run.unit.label()
        )),
    }
    if let Resolution::Cyclic(report) = &run.resolution {
        out.push_str(&format!("warning: {report}; layout is best effort\n"));
    }
    for diagnostic in &run.diagnostics {
        out.push_str(&format!("note: {diagnostic}\n"));
    }
    out
}

fn print_run(phases: &[Phase], layout: &LayoutArgs) -> Result<(), CliError> {
    let config = scheduler_config(layout)?;
    let run = Schedule::new(config).compute(phases);
    match layout.output {
        OutputFormat::Table => print!("{}", render_run(&run)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&run)?),
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Schedule {
            path,
            format,
            layout,
        } => {
            let phases = load_file(&path, format)?;
            print_run(&phases, &layout)
        }
        Command::ScheduleDb {
            db,
            project,
            layout,
        } => {
            let store = SqlitePhaseStore::new(&db)?;
            let phases = store.load_phases(project)?;
            print_run(&phases, &layout)
        }
        Command::Import {
            db,
            project,
            path,
            format,
        } => {
            let phases = load_file(&path, format)?;
            let store = SqlitePhaseStore::new(&db)?;
            let count = store.import_phases(project, &phases)?.len();
            info!(project, count, "import finished");
            println!("Imported {count} phases into project {project}.");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
