use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use covid_tracker::api::{DownloadStates, HttpTransport, RemoteClient};
use covid_tracker::bus::Bus;
use covid_tracker::config::AppConfig;
use covid_tracker::engine::Engine;
use covid_tracker::models::{Category, CountryTimeseriesPoint, DownloadState};
use covid_tracker::stats;
use covid_tracker::storage::{CacheStore, Preferences};
use num_format::{Locale, ToFormattedString};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "covid-tracker",
    version,
    about = "Fetch, cache & summarize COVID-19 case statistics"
)]
struct Cli {
    /// JSON config file (API URLs, cache and seed directories).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the cache directory.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
    /// Read-only directory with bundled cache entries.
    #[arg(long, global = true)]
    seed_dir: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// World totals.
    World,
    /// Countries sorted by confirmed cases.
    Countries(CountriesArgs),
    /// Daily changes for one country.
    Country(CountryArgs),
    /// Print the last successful update label.
    LastUpdate,
}

#[derive(Args, Debug)]
struct CountriesArgs {
    /// Only show countries whose name contains this text (case-insensitive).
    #[arg(short, long)]
    search: Option<String>,
    /// Show at most this many rows.
    #[arg(short, long)]
    top: Option<usize>,
}

#[derive(Args, Debug)]
struct CountryArgs {
    /// ISO 3166 alpha-2 code, e.g. DE
    code: String,
    /// Print monthly totals instead of daily changes.
    #[arg(long, default_value_t = false)]
    monthly: bool,
}

const WAIT: Duration = Duration::from_secs(60);

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    }
    .with_env();
    if let Some(dir) = cli.cache_dir {
        cfg.cache_dir = dir;
    }
    if cli.seed_dir.is_some() {
        cfg.seed_dir = cli.seed_dir;
    }

    let mut bus = Bus::new();
    let states = DownloadStates::new(bus.publisher());
    let transport = HttpTransport::new(cfg.api.timeout_secs)?;
    let client = RemoteClient::new(transport, cfg.api.clone(), states);
    let engine = Engine::new(
        client,
        CacheStore::new(&cfg.cache_dir, cfg.seed_dir.clone()),
        Preferences::new(&cfg.cache_dir),
        bus.publisher(),
    );

    match cli.cmd {
        Command::World => cmd_world(&engine, &mut bus),
        Command::Countries(args) => cmd_countries(&engine, &mut bus, args),
        Command::Country(args) => cmd_country(&engine, &mut bus, args),
        Command::LastUpdate => {
            println!("{}", engine.last_update_string());
            Ok(())
        }
    }
}

fn fmt_n(n: i64) -> String {
    n.to_formatted_string(&Locale::en)
}

fn fmt_delta(n: i64) -> String {
    if n > 0 {
        format!("+{}", fmt_n(n))
    } else {
        fmt_n(n)
    }
}

fn status_line(engine: &Engine<HttpTransport>, state: DownloadState) -> String {
    let label = engine.last_update_string();
    if state == DownloadState::Cancelled {
        stats::degraded_label(&label)
    } else {
        label
    }
}

fn cmd_world(engine: &Engine<HttpTransport>, bus: &mut Bus) -> Result<()> {
    let latest = Rc::new(RefCell::new(None));
    let slot = latest.clone();
    bus.on_global(move |g| *slot.borrow_mut() = Some(*g));

    let worker = engine.request_global_statistics();
    let state = engine.settle(bus, Category::Global, worker, WAIT);

    println!("{}", status_line(engine, state));
    match *latest.borrow() {
        Some(g) => {
            println!("Confirmed: {}", fmt_n(g.confirmed));
            println!("Recovered: {}", fmt_n(g.recovered));
            println!("Deaths:    {}", fmt_n(g.deaths));
        }
        None => eprintln!("No world statistics available."),
    }
    Ok(())
}

fn cmd_countries(
    engine: &Engine<HttpTransport>,
    bus: &mut Bus,
    args: CountriesArgs,
) -> Result<()> {
    let latest = Rc::new(RefCell::new(Vec::new()));
    let slot = latest.clone();
    bus.on_countries(move |list| *slot.borrow_mut() = list.to_vec());

    let worker = engine.request_countries_leaderboard();
    let state = engine.settle(bus, Category::LatestCountries, worker, WAIT);

    println!("{}", status_line(engine, state));
    let mut rows = stats::sorted_leaderboard(&latest.borrow());
    if let Some(q) = &args.search {
        rows = stats::filter_by_name(&rows, q);
    }
    if let Some(n) = args.top {
        rows.truncate(n);
    }
    if rows.is_empty() {
        eprintln!("No country statistics available.");
    }
    for r in rows {
        println!(
            "{:<3} {:<32} {:>14} {:>14} {:>12}",
            r.flag,
            r.country_region,
            fmt_n(r.confirmed),
            fmt_n(r.recovered),
            fmt_n(r.deaths)
        );
    }
    Ok(())
}

fn cmd_country(engine: &Engine<HttpTransport>, bus: &mut Bus, args: CountryArgs) -> Result<()> {
    let code = args.code.trim().to_ascii_uppercase();
    let latest: Rc<RefCell<Vec<CountryTimeseriesPoint>>> = Rc::new(RefCell::new(Vec::new()));
    let slot = latest.clone();
    let wanted = code.clone();
    bus.on_timeseries(move |c, points| {
        if c == wanted {
            *slot.borrow_mut() = points.to_vec();
        }
    });

    let worker = engine.request_country_timeseries(&code);
    let state = engine.settle(bus, Category::CountryTimeseries, worker, WAIT);

    println!("{} {}", stats::flag_for(&code), status_line(engine, state));
    let points = latest.borrow();
    if points.is_empty() {
        eprintln!("No history available for {}.", code);
        return Ok(());
    }
    if args.monthly {
        for m in stats::monthly_totals(&points) {
            println!(
                "{:04}-{:02} {:>14} {:>14} {:>12}",
                m.year,
                m.month,
                fmt_n(m.confirmed),
                fmt_n(m.recovered),
                fmt_n(m.deaths)
            );
        }
    } else {
        for p in points.iter() {
            println!(
                "{} {:>14} {:>14} {:>12}",
                p.date.format("%d.%m.%y"),
                fmt_delta(p.confirmed),
                fmt_delta(p.recovered),
                fmt_delta(p.deaths)
            );
        }
    }
    Ok(())
}
