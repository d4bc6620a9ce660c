//! Pure derivations applied to freshly fetched records.
//!
//! Nothing in here touches the network, the disk, or the bus, so every
//! function is deterministic and safe to call repeatedly on the same input.
use crate::models::{
    CountryStatisticsRaw, CountryStatisticsView, CountryTimeseriesPoint, CountryTimeseriesRaw,
    MonthlyTotals,
};
use chrono::{Datelike, NaiveDate};

/// Offset from an ASCII capital letter to its regional indicator symbol
/// (`0x1F1E6 - 'A'`).
pub const REGIONAL_INDICATOR_OFFSET: u32 = 127_397;

/// Date format used as keys in timeseries payloads.
pub const TIMESERIES_DATE_FORMAT: &str = "%m/%d/%y";

const WARNING_GLYPH: char = '\u{26a0}';

/// Flag emoji for an ISO2 code, e.g. `"US"` → `"🇺🇸"`.
///
/// Characters whose shifted code point is not a valid `char` are skipped.
pub fn flag_for(iso2: &str) -> String {
    iso2.chars()
        .filter_map(|c| char::from_u32(REGIONAL_INDICATOR_OFFSET + c as u32))
        .collect()
}

/// Build leaderboard rows, keeping the upstream order.
pub fn country_views(raw: &[CountryStatisticsRaw]) -> Vec<CountryStatisticsView> {
    raw.iter()
        .map(|item| {
            let iso2 = item
                .country_code
                .as_ref()
                .map(|c| c.iso2.as_str())
                .unwrap_or("");
            CountryStatisticsView {
                flag: flag_for(iso2),
                country_region: item.country_region.clone(),
                country_code: iso2.to_string(),
                confirmed: item.confirmed,
                deaths: item.deaths,
                recovered: item.recovered,
            }
        })
        .collect()
}

/// Stable sort by confirmed cases, highest first. Ties keep input order.
pub fn sorted_leaderboard(views: &[CountryStatisticsView]) -> Vec<CountryStatisticsView> {
    let mut out = views.to_vec();
    out.sort_by(|a, b| b.confirmed.cmp(&a.confirmed));
    out
}

/// Case-insensitive substring match on the country name. An empty query
/// matches everything.
pub fn filter_by_name(views: &[CountryStatisticsView], query: &str) -> Vec<CountryStatisticsView> {
    let needle = query.trim().to_lowercase();
    views
        .iter()
        .filter(|v| needle.is_empty() || v.country_region.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

pub fn parse_timeseries_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), TIMESERIES_DATE_FORMAT).ok()
}

/// Flatten every record's `timeseries` map into cumulative points sorted
/// newest first. Entries whose date does not parse are dropped.
pub fn flatten_timeseries(raw: &[CountryTimeseriesRaw]) -> Vec<CountryTimeseriesPoint> {
    let mut points: Vec<CountryTimeseriesPoint> = raw
        .iter()
        .flat_map(|record| record.timeseries.iter())
        .filter_map(|(key, totals)| match parse_timeseries_date(key) {
            Some(date) => Some(CountryTimeseriesPoint {
                date,
                confirmed: totals.confirmed,
                recovered: totals.recovered,
                deaths: totals.deaths,
            }),
            None => {
                log::debug!("dropping timeseries entry with bad date {:?}", key);
                None
            }
        })
        .collect();
    points.sort_by(|a, b| b.date.cmp(&a.date));
    points
}

/// Turn newest-first cumulative totals into daily deltas in place. The
/// oldest point keeps its cumulative value. Negative deltas are kept.
pub fn to_daily_deltas(points: &mut [CountryTimeseriesPoint]) {
    for i in 0..points.len().saturating_sub(1) {
        let older = points[i + 1];
        let p = &mut points[i];
        p.confirmed = p.confirmed.saturating_sub(older.confirmed);
        p.recovered = p.recovered.saturating_sub(older.recovered);
        p.deaths = p.deaths.saturating_sub(older.deaths);
    }
}

/// Full timeseries pipeline: flatten, sort, convert to deltas.
pub fn daily_timeseries(raw: &[CountryTimeseriesRaw]) -> Vec<CountryTimeseriesPoint> {
    let mut points = flatten_timeseries(raw);
    to_daily_deltas(&mut points);
    points
}

/// Sum daily deltas per calendar month, oldest month first.
pub fn monthly_totals(points: &[CountryTimeseriesPoint]) -> Vec<MonthlyTotals> {
    let mut out: Vec<MonthlyTotals> = Vec::new();
    let mut ordered = points.to_vec();
    ordered.sort_by_key(|p| p.date);
    for p in ordered {
        let (year, month) = (p.date.year(), p.date.month());
        match out.last_mut() {
            Some(m) if m.year == year && m.month == month => {
                m.confirmed = m.confirmed.saturating_add(p.confirmed);
                m.recovered = m.recovered.saturating_add(p.recovered);
                m.deaths = m.deaths.saturating_add(p.deaths);
            }
            _ => out.push(MonthlyTotals {
                year,
                month,
                confirmed: p.confirmed,
                recovered: p.recovered,
                deaths: p.deaths,
            }),
        }
    }
    out
}

/// Label shown next to stale data after a failed refresh.
pub fn degraded_label(last_update: &str) -> String {
    format!("{} {}", WARNING_GLYPH, last_update)
}
