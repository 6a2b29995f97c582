mod controller;
mod diagnostics;
mod florence;
mod fraction;
mod logging;
mod time_provider;
mod ui;
mod zone;

use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result, bail};
use chrono::{Local, Utc};
use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};

use crate::controller::{ClockController, WidgetSnapshot};
use crate::florence::{DEFAULT_RESOLUTION, MAX_RESOLUTION, encode};
use crate::time_provider::{TICK_INTERVAL, TimeSourceKind, select_source};
use crate::zone::detect::LocalZoneHint;
use crate::zone::table::{TableSource, load_or_fallback};

#[derive(Parser, Debug)]
#[command(
    name = "florence",
    version,
    about = "Universal Florence Hexadecimal Mean Time clock and converter"
)]
struct Cli {
    /// CSV timezone table (abbreviation,full name,offset); defaults to the built-in table
    #[arg(long, global = true)]
    timezones: Option<PathBuf>,

    /// Local zone as an IANA name ("Europe/Rome"), a zone name, or a full date
    /// string such as "Fri Oct 16 2026 14:00:00 GMT+0200 (Central European Summer Time)";
    /// defaults to the system timezone
    #[arg(long, global = true)]
    local_zone: Option<String>,

    /// Use this instant (milliseconds since the Unix epoch) instead of the system clock
    #[arg(long, global = true, allow_hyphen_values = true)]
    at_millis: Option<i64>,

    #[arg(long)]
    diagnostics: bool,

    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current Florence time
    Now {
        #[arg(long, default_value_t = DEFAULT_RESOLUTION)]
        resolution: usize,

        #[arg(long)]
        no_trailing_zeroes: bool,

        /// Keep printing every tick until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// Apply one widget edit and print every derived widget value
    Convert(ConvertArgs),
    /// List the timezone table
    Zones,
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("edit")
        .args(["hex", "hex_slider", "time", "minute_slider"])
        .multiple(false)
))]
struct ConvertArgs {
    /// Hex time as typed into the text field, e.g. ".8c"
    #[arg(long)]
    hex: Option<String>,

    /// Hex slider position, 0-255
    #[arg(long)]
    hex_slider: Option<u8>,

    /// Universal time as HH:MM
    #[arg(long)]
    time: Option<String>,

    /// Five-minute slider position, 0-287
    #[arg(long)]
    minute_slider: Option<u16>,

    /// Timezone index, abbreviation or full name
    #[arg(long)]
    zone: Option<String>,

    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let hint = detect_local_zone(cli.local_zone.as_deref())?;
    log::info!("detected local zone {}", hint.describe());
    let table_source = TableSource::from_option(cli.timezones);
    let time_kind = match cli.at_millis {
        Some(unix_millis) => TimeSourceKind::Fixed(unix_millis),
        None => TimeSourceKind::System,
    };
    let selected = select_source(time_kind)?;

    if cli.diagnostics {
        let loaded = load_or_fallback(&table_source);
        return diagnostics::run_diagnostics(&selected, &table_source, loaded, &hint);
    }

    match cli.command {
        None => ui::app::run_gui(selected, table_source, hint),
        Some(Command::Now {
            resolution,
            no_trailing_zeroes,
            watch,
        }) => {
            if resolution == 0 || resolution > MAX_RESOLUTION {
                bail!("--resolution must be between 1 and {MAX_RESOLUTION}");
            }
            let mut stdout = io::stdout();
            loop {
                let sample = selected.source.now()?;
                let text = encode(sample.day_fraction(), resolution, !no_trailing_zeroes);
                if !watch {
                    writeln!(stdout, "{text}")?;
                    return Ok(());
                }
                write!(stdout, "\r{text}")?;
                stdout.flush()?;
                thread::sleep(TICK_INTERVAL);
            }
        }
        Some(Command::Convert(args)) => {
            let loaded = load_or_fallback(&table_source);
            let mut controller = ClockController::with_hint(loaded.table, &hint);
            let snapshot = run_convert(&mut controller, &args)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_snapshot(&snapshot);
            }
            Ok(())
        }
        Some(Command::Zones) => {
            let loaded = load_or_fallback(&table_source);
            let default_index = hint.resolve_default_index(&loaded.table);
            for (index, entry) in loaded.table.entries().iter().enumerate() {
                let marker = if index == default_index { '*' } else { ' ' };
                println!("{marker}{index:>3}  {}", entry.label());
            }
            Ok(())
        }
    }
}

fn detect_local_zone(local_zone: Option<&str>) -> Result<LocalZoneHint> {
    let now = Utc::now();
    let Some(raw) = local_zone else {
        let system_zone = match iana_time_zone::get_timezone() {
            Ok(zone) => {
                log::debug!("system timezone is {zone}");
                Some(zone)
            }
            Err(err) => {
                log::warn!("cannot read system timezone: {err}");
                None
            }
        };
        return Ok(LocalZoneHint::detect_system(now, system_zone.as_deref()));
    };

    if let Ok(hint) = LocalZoneHint::from_iana(raw, now) {
        return Ok(hint);
    }
    if raw.contains("GMT") {
        return LocalZoneHint::parse(raw).context("invalid --local-zone date string");
    }
    Ok(LocalZoneHint::from_datetime(&Local::now(), Some(raw)))
}

fn run_convert(controller: &mut ClockController, args: &ConvertArgs) -> Result<WidgetSnapshot> {
    if let Some(zone) = args.zone.as_deref() {
        let index = controller.table().find(zone)?;
        controller.on_timezone_select(index)?;
    }

    if let Some(raw) = args.hex.as_deref() {
        controller
            .on_hex_text_edit(raw)
            .with_context(|| format!("rejected hex input '{raw}'"))?;
    } else if let Some(raw) = args.hex_slider {
        controller.on_hex_slider_drag(raw)?;
    } else if let Some(raw) = args.time.as_deref() {
        controller
            .on_time_widget_edit(raw)
            .with_context(|| format!("rejected time input '{raw}'"))?;
    } else if let Some(raw) = args.minute_slider {
        controller.on_minute_slider_drag(raw)?;
    }
    Ok(controller.snapshot())
}

fn print_snapshot(snapshot: &WidgetSnapshot) {
    println!("Hex time:      {}", snapshot.hex_text);
    println!("Hex slider:    {}", snapshot.hex_slider);
    println!("Time (UTC):    {}", snapshot.time_text);
    println!("Minute slider: {}", snapshot.minute_slider);
    println!(
        "Timezone:      [{}] {}",
        snapshot.timezone_index, snapshot.timezone_label
    );
}
