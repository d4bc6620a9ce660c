//! covid_tracker
//!
//! Fetches COVID-19 case statistics (world totals, per-country totals and
//! per-country history), keeps a local JSON cache, derives daily deltas and
//! publishes results on a typed bus. Pairs with the `covid-tracker` CLI.
//!
//! ### Features
//! - Cache-first loading: stale data is published immediately, fresh data follows
//! - Flag emoji, leaderboard sorting and name search for countries
//! - Cumulative → daily delta conversion and monthly totals for a country
//! - Silent degradation: failures only show up as a `Cancelled` download state
//!
//! ### Example
//! ```no_run
//! use covid_tracker::api::{DownloadStates, HttpTransport, RemoteClient};
//! use covid_tracker::bus::Bus;
//! use covid_tracker::config::AppConfig;
//! use covid_tracker::engine::Engine;
//! use covid_tracker::storage::{CacheStore, Preferences};
//! use std::time::Duration;
//!
//! let cfg = AppConfig::default();
//! let mut bus = Bus::new();
//! bus.on_global(|g| println!("confirmed: {}", g.confirmed));
//!
//! let states = DownloadStates::new(bus.publisher());
//! let transport = HttpTransport::new(cfg.api.timeout_secs)?;
//! let client = RemoteClient::new(transport, cfg.api.clone(), states);
//! let engine = Engine::new(
//!     client,
//!     CacheStore::new(&cfg.cache_dir, cfg.seed_dir.clone()),
//!     Preferences::new(&cfg.cache_dir),
//!     bus.publisher(),
//! );
//! engine.request_global_statistics();
//! bus.pump_timeout(Duration::from_secs(5));
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod bus;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod stats;
pub mod storage;

pub use api::{DownloadStates, HttpTransport, RemoteClient, Transport};
pub use bus::{Bus, Publisher, Subscription, Topic, Update};
pub use engine::Engine;
pub use models::{
    Category, CountryStatisticsView, CountryTimeseriesPoint, DownloadState, GlobalStatistics,
};
