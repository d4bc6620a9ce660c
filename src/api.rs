//! Blocking client for the JHU-mirror COVID-19 statistics API.
//!
//! Three endpoints are used: `brief` (world totals), `latest` (per-country
//! totals) and `timeseries` (per-country history). Every call makes exactly
//! one attempt and reports its progress through [`DownloadStates`], which
//! publishes each transition on the update bus.
//!
//! ### Notes
//! - On any failure the category flips to `Cancelled`. The engine drops the
//!   `Err` and keeps whatever it published last; the error kind only shows
//!   up in logs and tests.
//! - HTTP goes through [`Transport`]; [`HttpTransport`] is the real one.
//!
//! Typical usage:
//! ```no_run
//! # use covid_tracker::api::{DownloadStates, HttpTransport, RemoteClient};
//! # use covid_tracker::bus::Bus;
//! # use covid_tracker::config::ApiConfig;
//! let bus = Bus::new();
//! let states = DownloadStates::new(bus.publisher());
//! let client = RemoteClient::new(HttpTransport::new(30)?, ApiConfig::default(), states);
//! let world = client.fetch_global();
//! # Ok::<(), anyhow::Error>(())
//! ```
use crate::bus::{Publisher, Update};
use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::models::{
    Category, CountryStatisticsRaw, CountryTimeseriesRaw, DownloadState, GlobalStatistics,
};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Raw GET. Returns the body bytes of a 2xx response.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<u8>, FetchError>;
}

/// `reqwest` based transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64) -> Result<Self, FetchError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs)) // total request timeout
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(5))
            .user_agent(concat!("covid-tracker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<u8>, FetchError> {
        let resp = self.http.get(url).query(query).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(resp.bytes()?.to_vec())
    }
}

/// Per-category download state, shared between the client and anyone who
/// wants to peek at it. Only [`RemoteClient`] writes to it.
#[derive(Debug, Clone)]
pub struct DownloadStates {
    inner: Arc<Mutex<HashMap<Category, DownloadState>>>,
    publisher: Publisher,
}

impl DownloadStates {
    pub fn new(publisher: Publisher) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            publisher,
        }
    }

    pub fn get(&self, category: Category) -> DownloadState {
        match self.inner.lock() {
            Ok(map) => map.get(&category).copied().unwrap_or_default(),
            Err(poisoned) => poisoned.into_inner().get(&category).copied().unwrap_or_default(),
        }
    }

    fn set(&self, category: Category, state: DownloadState) {
        {
            let mut map = match self.inner.lock() {
                Ok(m) => m,
                Err(poisoned) => poisoned.into_inner(),
            };
            map.insert(category, state);
        }
        log::debug!("{} -> {:?}", category.name(), state);
        self.publisher.publish(Update::StateChanged { category, state });
    }
}

pub struct RemoteClient<T: Transport> {
    transport: T,
    config: ApiConfig,
    states: DownloadStates,
}

impl<T: Transport> RemoteClient<T> {
    pub fn new(transport: T, config: ApiConfig, states: DownloadStates) -> Self {
        Self {
            transport,
            config,
            states,
        }
    }

    pub fn states(&self) -> &DownloadStates {
        &self.states
    }

    pub fn fetch_global(&self) -> Result<GlobalStatistics, FetchError> {
        self.fetch(Category::Global, &self.config.brief_url, &[])
    }

    pub fn fetch_latest_countries(&self) -> Result<Vec<CountryStatisticsRaw>, FetchError> {
        self.fetch(
            Category::LatestCountries,
            &self.config.latest_url,
            &[("onlyCountries", "true")],
        )
    }

    pub fn fetch_country_timeseries(
        &self,
        country_code: &str,
    ) -> Result<Vec<CountryTimeseriesRaw>, FetchError> {
        self.fetch(
            Category::CountryTimeseries,
            &self.config.timeseries_url,
            &[("iso2", country_code), ("onlyCountries", "true")],
        )
    }

    /// One GET + decode, bracketed by `Started` and `Finished`/`Cancelled`.
    pub fn fetch<R: DeserializeOwned>(
        &self,
        category: Category,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<R, FetchError> {
        self.states.set(category, DownloadState::Started);
        match self.get_json(url, query) {
            Ok(value) => {
                log::info!("fetched {} from {}", category.name(), url);
                self.states.set(category, DownloadState::Finished);
                Ok(value)
            }
            Err(e) => {
                log::warn!("fetching {} from {} failed: {}", category.name(), url, e);
                self.states.set(category, DownloadState::Cancelled);
                Err(e)
            }
        }
    }

    fn get_json<R: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<R, FetchError> {
        let body = self.transport.get(url, query)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(FetchError::EmptyResponse);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}
