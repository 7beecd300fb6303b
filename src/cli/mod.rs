#![forbid(unsafe_code)]

use std::io::Read as _;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{CommandFactory as _, Parser, Subcommand};
use serde::Serialize;

use crate::board::color::text_color_for_bg;
use crate::board::engine::{aggregate_progress, classify};
use crate::board::model::{self, Task};
use crate::board::schedule::{self, MonthGrid, day_overlay, marked_dates};
use crate::config;
use crate::output::table::{Align, Table};
use crate::tui;

#[derive(Debug, Parser)]
#[command(
    name = "pmtui",
    version,
    about = "Project task board: TUI session plus derived views over a tasks document"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Open the interactive board (also the default with no subcommand)
    Board,
    Status(StatusArgs),
    Progress(ProgressArgs),
    Calendar(CalendarArgs),
    Palette(PaletteArgs),
    Config(ConfigArgs),
    Completion(CompletionArgs),
    Version,
}

/// Classify a tasks JSON document into past-due / in-progress / done.
#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Reference date (YYYY-MM-DD, default today)
    #[arg(short = 'd', long = "date")]
    pub date: Option<String>,
    /// Output in JSON format
    #[arg(long = "json")]
    pub json: bool,
    /// Output as CSV
    #[arg(long = "csv")]
    pub csv: bool,
    /// Tasks JSON file ('-' or absent reads stdin)
    pub file: Option<PathBuf>,
}

/// Aggregate progress across a tasks JSON document.
#[derive(Debug, Parser)]
pub struct ProgressArgs {
    #[arg(long = "json")]
    pub json: bool,
    pub file: Option<PathBuf>,
}

/// Day-by-day deadline overlay for one month.
#[derive(Debug, Parser)]
pub struct CalendarArgs {
    /// Month to render (YYYY-MM, default current month)
    #[arg(short = 'm', long = "month")]
    pub month: Option<String>,
    /// Task chips per day before collapsing into "+N"
    #[arg(long = "cap")]
    pub cap: Option<usize>,
    pub file: Option<PathBuf>,
}

/// Print the resolved department color registry.
#[derive(Debug, Parser)]
pub struct PaletteArgs {
    #[arg(long = "json")]
    pub json: bool,
    #[arg(long = "csv")]
    pub csv: bool,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    List,
    Set(ConfigSetArgs),
    Get(ConfigGetArgs),
}

#[derive(Debug, Parser)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Parser)]
pub struct ConfigGetArgs {
    pub key: String,
}

#[derive(Debug, Parser)]
pub struct CompletionArgs {
    pub shell: clap_complete::Shell,
}

pub fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.cmd {
        None | Some(Commands::Board) => cmd_board(),
        Some(Commands::Status(args)) => cmd_status(&args),
        Some(Commands::Progress(args)) => cmd_progress(&args),
        Some(Commands::Calendar(args)) => cmd_calendar(&args),
        Some(Commands::Palette(args)) => cmd_palette(&args),
        Some(Commands::Config(args)) => match args.cmd {
            ConfigCmd::List => {
                print!("{}", config::list_resolved_toml()?);
                Ok(ExitCode::SUCCESS)
            }
            ConfigCmd::Set(set) => {
                config::set_value_string(&set.key, &set.value)?;
                println!("Set {} = {}", set.key, set.value);
                Ok(ExitCode::SUCCESS)
            }
            ConfigCmd::Get(get) => {
                let val = config::get_value_string(&get.key)?;
                match val {
                    Some(v) => {
                        println!("{v}");
                        Ok(ExitCode::SUCCESS)
                    }
                    None => anyhow::bail!(
                        "configuration key '{}' not found - use 'pmtui config list' to see available keys",
                        get.key
                    ),
                }
            }
        },
        Some(Commands::Completion(args)) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "pmtui", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Version) => {
            println!("pmtui {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn cmd_board() -> anyhow::Result<ExitCode> {
    if !tui::is_tty() {
        anyhow::bail!("the board needs a terminal; use the status/calendar subcommands in scripts");
    }
    let cfg = config::load()?;
    tui::app::run(cfg)?;
    Ok(ExitCode::SUCCESS)
}

fn read_tasks(file: Option<&PathBuf>) -> anyhow::Result<Vec<Task>> {
    let raw = match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read tasks from stdin")?;
            buf
        }
    };
    let tasks: Vec<Task> =
        serde_json::from_str(&raw).context("failed to parse tasks JSON document")?;
    Ok(tasks)
}

fn reference_date(arg: Option<&str>) -> anyhow::Result<time::Date> {
    match arg {
        Some(s) => Ok(model::parse_date(s)?),
        None => Ok(model::today()),
    }
}

fn cmd_status(args: &StatusArgs) -> anyhow::Result<ExitCode> {
    let tasks = read_tasks(args.file.as_ref())?;
    let reference = reference_date(args.date.as_deref())?;
    let buckets = classify(&tasks, reference);

    if args.json {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Out<'a> {
            reference: String,
            past_due: Vec<&'a Task>,
            in_progress: Vec<&'a Task>,
            done: Vec<&'a Task>,
        }
        let out = Out {
            reference: model::format_date(reference),
            past_due: buckets.past_due,
            in_progress: buckets.in_progress,
            done: buckets.done,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut table = Table::new(["STATUS", "TASK", "DEPARTMENT", "DEADLINE", "PROGRESS"])
        .align(4, Align::Right);
    let mut push = |status: &str, bucket: &[&Task]| {
        for task in bucket {
            table.row([
                status.to_owned(),
                task.name.clone(),
                task.departments.first().cloned().unwrap_or_default(),
                model::format_date(task.deadline),
                format!("{}%", task.progress),
            ]);
        }
    };
    push("past due", &buckets.past_due);
    push("in progress", &buckets.in_progress);
    push("done", &buckets.done);

    if args.csv {
        table.print_csv()?;
    } else {
        table.print()?;
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_progress(args: &ProgressArgs) -> anyhow::Result<ExitCode> {
    let tasks = read_tasks(args.file.as_ref())?;
    let progress = aggregate_progress(&tasks);

    if args.json {
        println!(
            "{}",
            serde_json::json!({ "tasks": tasks.len(), "progress": progress })
        );
    } else {
        println!("{progress}%");
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_calendar(args: &CalendarArgs) -> anyhow::Result<ExitCode> {
    let tasks = read_tasks(args.file.as_ref())?;
    let (year, month) = match args.month.as_deref() {
        Some(m) => schedule::parse_month(m)?,
        None => {
            let today = model::today();
            (today.year(), today.month())
        }
    };
    let cfg = config::load()?;
    let cap = args.cap.unwrap_or(cfg.ui.day_task_cap).max(1);

    let grid = MonthGrid::new(year, month)?;
    let marks = marked_dates(&tasks);
    println!("{month} {year}");
    for week in &grid.weeks {
        for date in week.iter().flatten() {
            if !marks.contains_key(date) {
                continue;
            }
            let overlay = day_overlay(&tasks, *date, cap);
            let mut chips: Vec<String> = overlay
                .visible
                .iter()
                .map(|t| {
                    let dept = t
                        .departments
                        .first()
                        .map_or("General", String::as_str);
                    format!("{} - {dept}", t.name)
                })
                .collect();
            if overlay.hidden > 0 {
                chips.push(format!("+{}", overlay.hidden));
            }
            println!("  {}  {}", model::format_date(*date), chips.join(" | "));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_palette(args: &PaletteArgs) -> anyhow::Result<ExitCode> {
    let cfg = config::load()?;
    let palette = cfg.departments.palette();

    if args.json {
        let entries: Vec<serde_json::Value> = palette
            .departments()
            .map(|name| {
                let bg = palette.color_of(name).unwrap_or(palette.fallback());
                serde_json::json!({
                    "department": name,
                    "background": bg,
                    "text": text_color_for_bg(bg),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut table = Table::new(["DEPARTMENT", "BACKGROUND", "TEXT"]);
    for name in palette.departments() {
        let bg = palette.color_of(name).unwrap_or(palette.fallback());
        table.row([name, bg, text_color_for_bg(bg)]);
    }
    if args.csv {
        table.print_csv()?;
    } else {
        table.print()?;
    }
    Ok(ExitCode::SUCCESS)
}
