//! propwash-run: drive the propeller engine from the command line.
//!
//! Usage:
//!   propwash-run run --scenario crash-stop --steps 1800 --output frames.csv
//!   propwash-run sweep --config prop.json --rpm-min 0 --rpm-max 150 --points 31 --output sweep.csv
//!   propwash-run grid --output seawater_grid.json --size 43
//!   propwash-run default-config --output prop.json

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

use propwash_core::enums::ScenarioId;
use propwash_core::{PropwashError, Result};
use propwash_sim::logger::{CsvLogger, FrameLogger};
use propwash_sim::scenario::{rpm_sweep, run_scenario, Scenario};
use propwash_sim::SimConfig;
use propwash_water::grid::write_grid;
use propwash_water::{GridAxes, PropertyGrid, SeawaterFormula};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    init_logging(parse_flag(&args[2..], "--log-level").as_deref());

    let result = match args[1].as_str() {
        "run" => cmd_run(&args[2..]),
        "sweep" => cmd_sweep(&args[2..]),
        "grid" => cmd_grid(&args[2..]),
        "default-config" => cmd_default_config(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(if e.is_fatal() { 2 } else { 1 });
    }
}

fn print_usage() {
    eprintln!(
        "propwash-run: propeller hydrodynamics driver\n\
         \n\
         Commands:\n\
         \n\
         run            Run a scripted scenario and export one CSV row per tick\n\
         \n\
           --config <path>     Configuration JSON (optional, default: built-in)\n\
           --scenario <name>   bollard | acceleration | crash-stop\n\
           --steps <N>         Number of ticks (default: 30 s at the tick rate)\n\
           --output <path>     Output CSV file\n\
           --seed <N>          Enable the inflow disturbance with this seed\n\
         \n\
         sweep          Evaluate evenly spaced shaft speeds\n\
         \n\
           --config <path>     Configuration JSON (optional)\n\
           --rpm-min <x>       Lowest shaft speed\n\
           --rpm-max <x>       Highest shaft speed\n\
           --points <N>        Number of speeds (default: 21)\n\
           --output <path>     Output CSV file\n\
         \n\
         grid           Tabulate the seawater formula into a grid file\n\
         \n\
           --output <path>     Output JSON file\n\
           --size <N>          Temperature and salinity nodes (default: 43 x 22)\n\
         \n\
         default-config Write the built-in configuration as JSON\n\
         \n\
           --output <path>     Output file (default: stdout)\n\
         \n\
         All commands accept --log-level <off|error|warn|info|debug|trace>;\n\
         RUST_LOG is used when it is absent.\n"
    );
}

/// Initialize env_logger. An explicit level wins over `RUST_LOG`, which
/// accepts the full filter syntax (`propwash_sim=debug,warn`).
fn init_logging(level: Option<&str>) {
    logging_builder(level, Env::default().default_filter_or("info")).init();
    log::debug!("Logging initialized (max level {})", log::max_level());
}

fn logging_builder(level: Option<&str>, env: Env) -> Builder {
    let explicit = level.and_then(|l| l.parse::<LevelFilter>().ok());
    let mut builder = match explicit {
        Some(log_level) => {
            let mut builder = Builder::new();
            builder.filter_level(log_level);
            builder
        }
        None => Builder::from_env(env),
    };

    builder
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:5} {}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                record.args()
            )
        });
    builder
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_number<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>> {
    match parse_flag(args, flag) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| PropwashError::invalid(flag, format!("not a number: {raw}"))),
    }
}

fn require<T>(value: Option<T>, flag: &str) -> Result<T> {
    value.ok_or_else(|| PropwashError::invalid(flag, "is required"))
}

fn load_config(args: &[String]) -> Result<SimConfig> {
    match parse_flag(args, "--config") {
        Some(path) => SimConfig::load(Path::new(&path)),
        None => {
            log::info!("No --config given, using the built-in configuration");
            Ok(SimConfig::default())
        }
    }
}

/// CSV frame logger, created only after the engine's inputs have loaded.
fn csv_logger(path: &Path) -> Result<Box<dyn FrameLogger>> {
    Ok(Box::new(CsvLogger::create(path)?))
}

// --- Run command ---

fn cmd_run(args: &[String]) -> Result<()> {
    let config = load_config(args)?;
    let name = require(parse_flag(args, "--scenario"), "--scenario")?;
    let id = ScenarioId::from_name(&name)
        .ok_or_else(|| PropwashError::invalid("--scenario", format!("unknown scenario {name}")))?;
    let output = PathBuf::from(require(parse_flag(args, "--output"), "--output")?);
    let steps = parse_number::<u64>(args, "--steps")?.unwrap_or(30 * config.tick_rate_hz as u64);

    let mut settings = config.scenario;
    if let Some(seed) = parse_number::<u64>(args, "--seed")? {
        settings = settings.with_seed(seed);
    }

    let mut engine = config.build_engine_with(|| csv_logger(&output))?;
    let mut inputs = config.initial_inputs()?;
    let mut scenario = Scenario::build(id, &settings);

    eprintln!("Running {id:?} for {steps} steps...");
    let summary = run_scenario(&mut engine, &mut inputs, &mut scenario, steps, config.dt());
    engine.flush_logger()?;

    eprintln!("  Peak thrust:     {:.1} kN", summary.max_thrust_n / 1e3);
    eprintln!("  Min thrust:      {:.1} kN", summary.min_thrust_n / 1e3);
    eprintln!("  Peak torque:     {:.1} kN·m", summary.max_torque_nm / 1e3);
    eprintln!("  Peak power:      {:.1} kW", summary.max_shaft_power_w / 1e3);
    eprintln!("  Min sigma:       {:.3}", summary.min_sigma);
    eprintln!("  Cavitating:      {} / {} steps", summary.cavitating_steps, summary.steps);
    if summary.anomaly_steps > 0 || summary.out_of_domain_steps > 0 {
        eprintln!(
            "  Flagged:         {} anomalous, {} out of domain",
            summary.anomaly_steps, summary.out_of_domain_steps
        );
    }
    eprintln!("Written {}", output.display());
    Ok(())
}

// --- Sweep command ---

fn cmd_sweep(args: &[String]) -> Result<()> {
    let config = load_config(args)?;
    let rpm_min = require(parse_number::<f64>(args, "--rpm-min")?, "--rpm-min")?;
    let rpm_max = require(parse_number::<f64>(args, "--rpm-max")?, "--rpm-max")?;
    let points = parse_number::<usize>(args, "--points")?.unwrap_or(21);
    let output = PathBuf::from(require(parse_flag(args, "--output"), "--output")?);

    let mut engine = config.build_engine_with(|| csv_logger(&output))?;
    let inputs = config.initial_inputs()?;
    let frames = rpm_sweep(&mut engine, &inputs, rpm_min, rpm_max, points, config.dt())?;
    engine.flush_logger()?;

    if let Some(onset) = frames.iter().find(|f| f.cavitation_risk) {
        eprintln!(
            "Cavitation risk from tip speed {:.1} m/s (sigma {:.3})",
            onset.vtip_m_s, onset.sigma
        );
    }
    eprintln!("Written {} sweep points to {}", frames.len(), output.display());
    Ok(())
}

// --- Grid command ---

fn cmd_grid(args: &[String]) -> Result<()> {
    let output = PathBuf::from(require(parse_flag(args, "--output"), "--output")?);
    let axes = match parse_number::<usize>(args, "--size")? {
        Some(n) => GridAxes::with_resolution(n),
        None => GridAxes::default(),
    };

    eprintln!(
        "Tabulating {} x {} x {} grid...",
        axes.temperature.count, axes.salinity.count, axes.pressure.count
    );
    let grid = PropertyGrid::tabulate(&SeawaterFormula, axes)?;
    write_grid(&grid, &output)?;
    eprintln!("Written {}", output.display());
    Ok(())
}

// --- Default config command ---

fn cmd_default_config(args: &[String]) -> Result<()> {
    let json = SimConfig::default().to_json_pretty()?;
    match parse_flag(args, "--output") {
        Some(path) => {
            std::fs::write(&path, json)?;
            eprintln!("Written {path}");
        }
        None => println!("{json}"),
    }
    Ok(())
}
