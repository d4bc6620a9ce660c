use chrono::NaiveDate;
use covid_tracker::models::{
    CountryCode, CountryStatisticsRaw, CountryStatisticsView, CountryTimeseriesRaw, DailyTotals,
    Location,
};
use covid_tracker::stats;
use std::collections::BTreeMap;

fn raw_country(name: &str, iso2: Option<&str>, confirmed: i64) -> CountryStatisticsRaw {
    CountryStatisticsRaw {
        country_region: name.into(),
        last_update: "2020-06-01T03:33:14.002Z".into(),
        location: Location { lat: 0.0, lng: 0.0 },
        country_code: iso2.map(|c| CountryCode {
            iso2: c.into(),
            iso3: String::new(),
        }),
        confirmed,
        deaths: 0,
        recovered: 0,
    }
}

fn view(name: &str, confirmed: i64) -> CountryStatisticsView {
    CountryStatisticsView {
        flag: String::new(),
        country_region: name.into(),
        country_code: String::new(),
        confirmed,
        deaths: 0,
        recovered: 0,
    }
}

fn totals(confirmed: i64, recovered: i64, deaths: i64) -> DailyTotals {
    DailyTotals {
        confirmed,
        recovered,
        deaths,
    }
}

fn raw_series(entries: &[(&str, DailyTotals)]) -> CountryTimeseriesRaw {
    CountryTimeseriesRaw {
        country_region: "Germany".into(),
        last_update: "2020-06-01T03:33:14.002Z".into(),
        location: Location { lat: 51.0, lng: 9.0 },
        country_code: Some(CountryCode {
            iso2: "DE".into(),
            iso3: "DEU".into(),
        }),
        timeseries: entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect::<BTreeMap<_, _>>(),
    }
}

#[test]
fn views_carry_flag_and_code() {
    let raw = vec![
        raw_country("US", Some("US"), 10),
        raw_country("Diamond Princess", None, 5),
    ];
    let views = stats::country_views(&raw);
    assert_eq!(views[0].flag, "\u{1F1FA}\u{1F1F8}");
    assert_eq!(views[0].country_code, "US");
    assert_eq!(views[1].flag, "");
    assert_eq!(views[1].country_code, "");
    // upstream order is kept
    assert_eq!(views[0].country_region, "US");
}

#[test]
fn leaderboard_is_descending_and_stable() {
    let views = vec![
        view("Alpha", 5),
        view("Bravo", 50),
        view("Charlie", 20),
        view("Delta", 20),
    ];
    let sorted = stats::sorted_leaderboard(&views);
    let names: Vec<&str> = sorted.iter().map(|v| v.country_region.as_str()).collect();
    assert_eq!(names, vec!["Bravo", "Charlie", "Delta", "Alpha"]);

    // sorting again changes nothing
    assert_eq!(stats::sorted_leaderboard(&sorted), sorted);
}

#[test]
fn name_filter_ignores_case() {
    let views = vec![view("Germany", 1), view("Niger", 2), view("France", 3)];
    let hits = stats::filter_by_name(&views, "GER");
    let names: Vec<&str> = hits.iter().map(|v| v.country_region.as_str()).collect();
    assert_eq!(names, vec!["Germany", "Niger"]);
    assert_eq!(stats::filter_by_name(&views, "").len(), 3);
}

#[test]
fn timeseries_is_newest_first_with_daily_deltas() {
    let raw = vec![raw_series(&[
        ("3/1/20", totals(50, 5, 1)),
        ("3/3/20", totals(100, 20, 4)),
        ("3/2/20", totals(80, 10, 2)),
    ])];
    let points = stats::daily_timeseries(&raw);

    let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2020, 3, 3).unwrap(),
            NaiveDate::from_ymd_opt(2020, 3, 2).unwrap(),
            NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
        ]
    );
    let confirmed: Vec<i64> = points.iter().map(|p| p.confirmed).collect();
    assert_eq!(confirmed, vec![20, 30, 50]);
    let recovered: Vec<i64> = points.iter().map(|p| p.recovered).collect();
    assert_eq!(recovered, vec![10, 5, 5]);
    let deaths: Vec<i64> = points.iter().map(|p| p.deaths).collect();
    assert_eq!(deaths, vec![2, 1, 1]);
}

#[test]
fn malformed_dates_are_dropped() {
    let raw = vec![raw_series(&[
        ("3/1/20", totals(50, 0, 0)),
        ("not-a-date", totals(999, 0, 0)),
        ("3/2/20", totals(80, 0, 0)),
    ])];
    let points = stats::daily_timeseries(&raw);
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].confirmed, 30);
    assert_eq!(points[1].confirmed, 50);
}

#[test]
fn records_are_flattened_together() {
    let raw = vec![
        raw_series(&[("3/1/20", totals(1, 0, 0))]),
        raw_series(&[("3/2/20", totals(4, 0, 0))]),
    ];
    let points = stats::daily_timeseries(&raw);
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].confirmed, 3);
}

#[test]
fn pipeline_is_idempotent() {
    let raw = vec![raw_series(&[
        ("5/30/20", totals(182_000, 160_000, 8_500)),
        ("5/31/20", totals(183_000, 164_000, 8_600)),
        ("5/29/20", totals(181_500, 159_000, 8_450)),
    ])];
    assert_eq!(stats::daily_timeseries(&raw), stats::daily_timeseries(&raw));

    let countries = vec![raw_country("US", Some("US"), 10), raw_country("DE", Some("DE"), 10)];
    let a = stats::sorted_leaderboard(&stats::country_views(&countries));
    let b = stats::sorted_leaderboard(&stats::country_views(&countries));
    assert_eq!(a, b);
}

#[test]
fn empty_input_yields_empty_series() {
    assert!(stats::daily_timeseries(&[]).is_empty());
    assert!(stats::monthly_totals(&[]).is_empty());
}
