extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate nonlinear;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use failure::Error;
use std::str::FromStr;
use std::sync::PoisonError;

use nonlinear::{transforms, Config, Engine, Scheduler, SchedulerEvent, Snapshot};

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_number<T: FromStr>(s: &str, err: &str) -> Result<(), String> {
    match T::from_str(s) {
        Ok(_) => Ok(()),
        Err(_) => Err(err.to_string()),
    }
}

const WIDTH: &str = "width";
const HEIGHT: &str = "height";
const THREADS: &str = "threads";
const FPS: &str = "fps";
const ITERS: &str = "iters";
const AUTO: &str = "auto";
const FUNC: &str = "func";
const STATUS_COLORS: &str = "status-colors";
const TRIP_COLORS: &str = "trip-colors";
const TICKS: &str = "ticks";
const INSPECT: &str = "inspect";
const LIST: &str = "list";

fn args<'a>() -> ArgMatches<'a> {
    let threads_help = format!(
        "Number of worker threads per tick; 1 runs each tick on the calling thread \
         (this machine has {} cpus)",
        num_cpus::get()
    );

    App::new("nonlinear")
        .version("0.1.0")
        .about("Iterates a grid of numbers under a map until every cell reaches 0, 1, or a cycle")
        .arg(
            Arg::with_name(WIDTH)
                .long(WIDTH)
                .takes_value(true)
                .default_value("852")
                .validator(|s| validate_number::<usize>(&s, "Could not parse grid width"))
                .help("Width of the cell grid"),
        )
        .arg(
            Arg::with_name(HEIGHT)
                .long(HEIGHT)
                .takes_value(true)
                .default_value("480")
                .validator(|s| validate_number::<usize>(&s, "Could not parse grid height"))
                .help("Height of the cell grid"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("4")
                .validator(|s| validate_number::<usize>(&s, "Could not parse thread count"))
                .help(&threads_help),
        )
        .arg(
            Arg::with_name(FPS)
                .long(FPS)
                .short("f")
                .takes_value(true)
                .default_value("30")
                .validator(|s| validate_number::<u32>(&s, "Could not parse ticks per second"))
                .help("Ticks per second in automatic mode"),
        )
        .arg(
            Arg::with_name(ITERS)
                .long(ITERS)
                .short("i")
                .takes_value(true)
                .default_value("0")
                .validator(|s| validate_number::<usize>(&s, "Could not parse iteration cap"))
                .help("Maximum number of ticks in automatic mode (0 to disable)"),
        )
        .arg(
            Arg::with_name(AUTO)
                .long(AUTO)
                .short("a")
                .help("Tick automatically instead of on request; runs until finished or capped"),
        )
        .arg(
            Arg::with_name(FUNC)
                .long(FUNC)
                .takes_value(true)
                .default_value(transforms::DEFAULT_TRANSFORM)
                .help("The map to iterate (see --list)"),
        )
        .arg(
            Arg::with_name(STATUS_COLORS)
                .long(STATUS_COLORS)
                .help("Renderer hint: color cells by status"),
        )
        .arg(
            Arg::with_name(TRIP_COLORS)
                .long(TRIP_COLORS)
                .help("Renderer hint: color cells by trip length"),
        )
        .arg(
            Arg::with_name(TICKS)
                .long(TICKS)
                .short("n")
                .takes_value(true)
                .default_value("100")
                .validator(|s| validate_number::<usize>(&s, "Could not parse tick count"))
                .help("Ticks to request in manual mode"),
        )
        .arg(
            Arg::with_name(INSPECT)
                .long(INSPECT)
                .takes_value(true)
                .validator(|s| validate_pair::<usize>(&s, ',', "Could not parse cell coordinate"))
                .help("Print details of the cell at COLUMN,ROW"),
        )
        .arg(
            Arg::with_name(LIST)
                .long(LIST)
                .short("l")
                .help("List the available maps and exit"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str, fallback: T) -> T {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .unwrap_or(fallback)
}

fn config(matches: &ArgMatches) -> Config {
    let defaults = Config::default();
    Config {
        width: value(matches, WIDTH, defaults.width),
        height: value(matches, HEIGHT, defaults.height),
        threads: value(matches, THREADS, defaults.threads),
        ticks_per_second: value(matches, FPS, defaults.ticks_per_second),
        max_iterations: value(matches, ITERS, defaults.max_iterations),
        automatic: matches.is_present(AUTO),
        transform: matches
            .value_of(FUNC)
            .map(str::to_string)
            .unwrap_or(defaults.transform),
        status_colors: matches.is_present(STATUS_COLORS),
        trip_length_colors: matches.is_present(TRIP_COLORS),
    }
}

fn run_manual(config: Config, ticks: usize) -> Snapshot {
    let mut engine = Engine::new(config);
    for _ in 0..ticks {
        match engine.request_tick() {
            Some(ref outcome) if outcome.is_terminal() => break,
            Some(_) => {}
            None => break,
        }
    }
    engine.snapshot()
}

fn run_automatic(config: Config) -> Result<Snapshot, Error> {
    let config = config.sanitized();
    let rate = config.ticks_per_second;
    let engine = Engine::new(config).into_shared();
    let scheduler = Scheduler::start(engine.clone(), rate)?;
    loop {
        match scheduler.events().recv() {
            Ok(SchedulerEvent::Ticked(report)) => debug!(
                "tick {}: max {} min {} ({} faults)",
                report.iteration, report.max, report.min, report.faults
            ),
            Ok(SchedulerEvent::Finished(outcome)) => {
                debug!("finished: {:?}", outcome);
                break;
            }
            Err(_) => bail!("scheduler stopped before the run finished"),
        }
    }
    scheduler.stop();
    let snapshot = engine.lock().unwrap_or_else(PoisonError::into_inner).snapshot();
    Ok(snapshot)
}

fn print_summary(s: &Snapshot, inspect: Option<(usize, usize)>) {
    println!(
        "Process Status: {} | Max Threads: {} | Running Threads: {} | Finished: {}",
        s.process_status, s.threads, s.running_workers, s.all_settled
    );
    println!(
        "Function: {} | Iteration: {} | Average Time: {:.3}ms | Average Thread Time: {:.3}ms \
         | Max: {} Min: {}",
        s.transform,
        s.iteration,
        s.average_tick_ms,
        s.average_worker_ms,
        s.current_max,
        s.current_min
    );
    println!(
        "Cells: {} incomplete, {} zero, {} one, {} cycle | Longest Trip: {}",
        s.counts.incomplete, s.counts.zero, s.counts.one, s.counts.cycle, s.current_max_orbit
    );
    if let Some((column, row)) = inspect {
        match s.cell_at(column, row) {
            Some(c) => println!(
                "Cell Info; Pos: ({}, {}) | Value: {} | Status: {} | Orbit: {:?} \
                 | Orbit Period: {} | Values Count: {}",
                column, row, c.value, c.status, c.orbit, c.orbit_period, c.history_len
            ),
            None => eprintln!("No cell at ({}, {})", column, row),
        }
    }
}

fn list_transforms() {
    for t in transforms::all() {
        println!("{:<16}{}", t.name, t.label);
    }
}

fn main() {
    env_logger::init();
    let matches = args();

    if matches.is_present(LIST) {
        list_transforms();
        return;
    }

    let config = config(&matches);
    let ticks = value(&matches, TICKS, 100);
    let inspect = matches.value_of(INSPECT).and_then(|s| parse_pair(s, ','));

    let result = if config.automatic {
        run_automatic(config)
    } else {
        Ok(run_manual(config, ticks))
    };

    match result {
        Err(e) => {
            eprintln!("Run failure: {}", e);
            std::process::exit(1);
        }
        Ok(snapshot) => print_summary(&snapshot, inspect),
    }
}
