//! Reconciliation engine: cache first, then network, then write-through.
//!
//! Each `refresh_*` runs both phases on the calling thread, so the cached
//! publication (if any) is always queued before the network one. The
//! `request_*` wrappers run a refresh on a background thread and return
//! immediately; results reach consumers through the bus.
use crate::api::{RemoteClient, Transport};
use crate::bus::{Bus, Publisher, Update};
use crate::error::FetchError;
use crate::models::{
    Category, CountryStatisticsView, CountryTimeseriesPoint, DownloadState, GlobalStatistics,
};
use crate::stats;
use crate::storage::{
    COUNTRIES_STATISTICS_KEY, CacheStore, Preferences, WORLD_STATISTICS_KEY, timeseries_key,
};
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const LAST_UPDATE_PREFIX: &str = "Last update";
const LAST_UPDATE_FORMAT: &str = "%d.%m.%y %I:%M";

/// Human readable label stored after a successful world fetch.
pub fn last_update_label(at: DateTime<Local>) -> String {
    format!("{} {}", LAST_UPDATE_PREFIX, at.format(LAST_UPDATE_FORMAT))
}

struct Inner<T: Transport> {
    client: RemoteClient<T>,
    cache: CacheStore,
    prefs: Preferences,
    publisher: Publisher,
}

/// Cheap to clone; clones share the client, cache and publisher.
pub struct Engine<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for Engine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> Engine<T> {
    pub fn new(
        client: RemoteClient<T>,
        cache: CacheStore,
        prefs: Preferences,
        publisher: Publisher,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                cache,
                prefs,
                publisher,
            }),
        }
    }

    pub fn state(&self, category: Category) -> DownloadState {
        self.inner.client.states().get(category)
    }

    /// Persisted last-update label; empty if no world fetch ever succeeded.
    pub fn last_update_string(&self) -> String {
        self.inner.prefs.last_update()
    }

    pub fn refresh_global(&self) -> Result<GlobalStatistics, FetchError> {
        let inner = &self.inner;
        if let Some(cached) = inner.cache.load::<GlobalStatistics>(WORLD_STATISTICS_KEY) {
            inner.publisher.publish(Update::GlobalUpdated(cached));
        }

        let fresh = inner.client.fetch_global()?;
        inner.prefs.set_last_update(&last_update_label(Local::now()));
        inner.publisher.publish(Update::GlobalUpdated(fresh));
        inner.cache.save(WORLD_STATISTICS_KEY, &fresh);
        Ok(fresh)
    }

    /// Publishes rows in upstream order; sort with
    /// [`stats::sorted_leaderboard`] before display.
    pub fn refresh_countries(&self) -> Result<Vec<CountryStatisticsView>, FetchError> {
        let inner = &self.inner;
        if let Some(cached) = inner
            .cache
            .load::<Vec<CountryStatisticsView>>(COUNTRIES_STATISTICS_KEY)
        {
            inner.publisher.publish(Update::CountriesUpdated(cached));
        }

        let raw = inner.client.fetch_latest_countries()?;
        let views = stats::country_views(&raw);
        inner.publisher.publish(Update::CountriesUpdated(views.clone()));
        inner.cache.save(COUNTRIES_STATISTICS_KEY, &views);
        Ok(views)
    }

    pub fn refresh_country_timeseries(
        &self,
        country_code: &str,
    ) -> Result<Vec<CountryTimeseriesPoint>, FetchError> {
        let inner = &self.inner;
        let key = timeseries_key(country_code);
        if let Some(cached) = inner.cache.load::<Vec<CountryTimeseriesPoint>>(&key) {
            inner.publisher.publish(Update::TimeseriesUpdated {
                country_code: country_code.to_string(),
                points: cached,
            });
        }

        let raw = inner.client.fetch_country_timeseries(country_code)?;
        let points = stats::daily_timeseries(&raw);
        inner.publisher.publish(Update::TimeseriesUpdated {
            country_code: country_code.to_string(),
            points: points.clone(),
        });
        inner.cache.save(&key, &points);
        Ok(points)
    }
}

impl<T: Transport + 'static> Engine<T> {
    /// Refresh world totals in the background. Returns `None` without doing
    /// anything if a world fetch is already in flight.
    pub fn request_global_statistics(&self) -> Option<JoinHandle<()>> {
        self.spawn(Category::Global, |engine| {
            let _ = engine.refresh_global();
        })
    }

    pub fn request_countries_leaderboard(&self) -> Option<JoinHandle<()>> {
        self.spawn(Category::LatestCountries, |engine| {
            let _ = engine.refresh_countries();
        })
    }

    pub fn request_country_timeseries(&self, country_code: &str) -> Option<JoinHandle<()>> {
        let code = country_code.to_string();
        self.spawn(Category::CountryTimeseries, move |engine| {
            let _ = engine.refresh_country_timeseries(&code);
        })
    }

    /// Block until the refresh behind `worker` is over and every update it
    /// queued has been delivered on `bus`, then return the category state.
    ///
    /// With no worker (the request was skipped because one was already in
    /// flight) this waits up to `timeout` for that fetch to reach a terminal
    /// state instead.
    pub fn settle(
        &self,
        bus: &mut Bus,
        category: Category,
        worker: Option<JoinHandle<()>>,
        timeout: Duration,
    ) -> DownloadState {
        match worker {
            Some(handle) => {
                if handle.join().is_err() {
                    log::warn!("{} refresh panicked", category.name());
                }
            }
            None => {
                bus.pump_until(timeout, |u| {
                    matches!(u, Update::StateChanged { category: c, state }
                        if *c == category && state.is_terminal())
                });
            }
        }
        // the data publication follows the terminal state
        bus.pump();
        self.state(category)
    }

    // The in-flight check is advisory: two callers racing past it both
    // refresh, which is harmless since refreshes are idempotent.
    fn spawn(
        &self,
        category: Category,
        job: impl FnOnce(Engine<T>) + Send + 'static,
    ) -> Option<JoinHandle<()>> {
        if self.state(category) == DownloadState::Started {
            log::debug!("{} already in flight, skipping", category.name());
            return None;
        }
        let engine = self.clone();
        Some(thread::spawn(move || job(engine)))
    }
}
