use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::time::{Duration, Instant};
use clap::Parser;
use env_logger::Env;
use hierlib::config::HierarchyConfig;
use hierlib::error::SimError;
use hierlib::io::get_reader;
use hierlib::memory::{MemoryPort, NullRam, WriterRam};
use hierlib::simulator::{SimulationReport, Simulator};
use log::info;

#[derive(Parser, Debug)]
#[command(about = String::from("Replays a memory reference trace through a cache hierarchy, printing every access which reaches main memory"))]
struct Args {
    /// Trace file, one `<kind> <hex-address>[,<length>]` reference per line. Reads stdin if absent.
    trace: Option<String>,

    /// JSON hierarchy configuration. Uses the Nehalem preset if absent.
    #[arg(short, long)]
    config: Option<String>,

    /// Split references into one access per byte rather than one per block
    #[arg(short, long)]
    repeat: bool,

    /// Don't print memory events
    #[arg(short, long)]
    quiet: bool,

    /// Print the JSON report to stderr once the trace is done
    #[arg(long)]
    report: bool,

    /// Print timings to stderr
    #[arg(short, long)]
    performance: bool,
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| format!("Couldn't open the config file at path {path}: {e}"))?;
            HierarchyConfig::from_json(&text).map_err(|e| format!("Couldn't parse the config file: {e}"))?
        }
        None => HierarchyConfig::nehalem(),
    };
    config.repeat_accesses |= args.repeat;
    info!("Simulating hierarchy {config:?}");

    let trace: Box<dyn BufRead> = match &args.trace {
        Some(path) => {
            let file = File::open(path).map_err(|e| format!("Couldn't open the trace file at path {path}: {e}"))?;
            Box::new(get_reader(file)?)
        }
        None => Box::new(io::stdin().lock()),
    };

    let (report, simulation_time) = if args.quiet {
        run(&config, NullRam, trace, |_| Ok(()))?
    } else {
        let ram = WriterRam::new(BufWriter::new(io::stdout().lock()));
        run(&config, ram, trace, |ram| ram.into_inner().map(|_| ()))?
    };

    if args.report {
        eprintln!("{}", serde_json::to_string_pretty(&report).map_err(|e| format!("Couldn't serialise the report {e}"))?);
    }
    if args.performance {
        let total_time = start.elapsed();
        eprintln!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        eprintln!("Total execution time (includes configuration, trace loading, and output): {}s", total_time.as_nanos() as f64 / 1e9);
    }
    io::stderr().flush().map_err(|e| e.to_string())?;
    Ok(())
}

/// Replays the trace, then hands the memory sink to `finish` so buffered output can be flushed
fn run<M, F>(config: &HierarchyConfig, ram: M, trace: Box<dyn BufRead>, finish: F) -> Result<(SimulationReport, Duration), String>
where
    M: MemoryPort,
    F: FnOnce(M) -> Result<(), SimError>,
{
    let mut simulator = Simulator::new(config, ram).map_err(|e| format!("Invalid configuration: {e}"))?;
    let report = simulator.simulate(trace).map_err(|e| format!("Simulation aborted: {e}"))?;
    let simulation_time = *simulator.get_execution_time();
    finish(simulator.into_hierarchy().into_ram()).map_err(|e| format!("Couldn't flush memory events: {e}"))?;
    Ok((report, simulation_time))
}
