use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// World totals as returned by the brief endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStatistics {
    pub confirmed: i64,
    pub recovered: i64,
    pub deaths: i64,
}

/// Geographic position attached to every country record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCode {
    pub iso2: String,
    pub iso3: String,
}

/// Raw entry from the latest-countries endpoint.
///
/// The API uses lowercase keys (`countryregion`, `lastupdate`, `countrycode`);
/// `countrycode` is missing for a handful of territories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryStatisticsRaw {
    #[serde(rename = "countryregion")]
    pub country_region: String,
    #[serde(rename = "lastupdate")]
    pub last_update: String,
    pub location: Location,
    #[serde(rename = "countrycode", default)]
    pub country_code: Option<CountryCode>,
    pub confirmed: i64,
    pub deaths: i64,
    pub recovered: i64,
}

/// Leaderboard row derived from [`CountryStatisticsRaw`]; this is what gets
/// cached and published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryStatisticsView {
    pub flag: String,
    #[serde(rename = "countryregion")]
    pub country_region: String,
    /// ISO2 code, empty when the upstream record had none.
    #[serde(rename = "countrycode")]
    pub country_code: String,
    pub confirmed: i64,
    pub deaths: i64,
    pub recovered: i64,
}

/// Cumulative totals for one day inside a time series payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub confirmed: i64,
    pub recovered: i64,
    pub deaths: i64,
}

/// Raw entry from the timeseries endpoint. Keys of `timeseries` are dates
/// formatted `MM/DD/YY` (month and day may be unpadded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryTimeseriesRaw {
    #[serde(rename = "countryregion")]
    pub country_region: String,
    #[serde(rename = "lastupdate")]
    pub last_update: String,
    pub location: Location,
    #[serde(rename = "countrycode", default)]
    pub country_code: Option<CountryCode>,
    pub timeseries: BTreeMap<String, DailyTotals>,
}

/// One day of a country's history. Holds cumulative totals right after
/// flattening and daily deltas once published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryTimeseriesPoint {
    pub date: NaiveDate,
    pub confirmed: i64,
    pub recovered: i64,
    pub deaths: i64,
}

/// Sum of daily deltas for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    pub year: i32,
    pub month: u32,
    pub confirmed: i64,
    pub recovered: i64,
    pub deaths: i64,
}

/// The three statistic families the pipeline serves. Each has its own
/// download state and state-changed topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Global,
    LatestCountries,
    CountryTimeseries,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Global,
        Category::LatestCountries,
        Category::CountryTimeseries,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Global => "global",
            Category::LatestCountries => "latest-countries",
            Category::CountryTimeseries => "country-timeseries",
        }
    }
}

/// Lifecycle of the most recent request in a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DownloadState {
    #[default]
    None,
    Started,
    Finished,
    Cancelled,
}

impl DownloadState {
    /// `Finished` or `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadState::Finished | DownloadState::Cancelled)
    }
}
