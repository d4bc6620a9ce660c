use chrono::NaiveDate;
use covid_tracker::models::{CountryStatisticsView, CountryTimeseriesPoint, GlobalStatistics};
use covid_tracker::storage::{
    COUNTRIES_STATISTICS_KEY, CacheStore, WORLD_STATISTICS_KEY, timeseries_key,
};
use std::fs;
use tempfile::tempdir;

fn sample_views() -> Vec<CountryStatisticsView> {
    vec![
        CountryStatisticsView {
            flag: "\u{1F1E9}\u{1F1EA}".into(),
            country_region: "Germany".into(),
            country_code: "DE".into(),
            confirmed: 183_494,
            deaths: 8_605,
            recovered: 164_245,
        },
        CountryStatisticsView {
            flag: String::new(),
            country_region: "Diamond Princess".into(),
            country_code: String::new(),
            confirmed: 712,
            deaths: 13,
            recovered: 651,
        },
    ]
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempdir().unwrap();
    let store = CacheStore::new(dir.path(), None);

    let world = GlobalStatistics {
        confirmed: 10,
        recovered: 5,
        deaths: 1,
    };
    store.save(WORLD_STATISTICS_KEY, &world);
    let loaded: GlobalStatistics = store.load(WORLD_STATISTICS_KEY).unwrap();
    assert_eq!(loaded, world);

    let views = sample_views();
    store.save(COUNTRIES_STATISTICS_KEY, &views);
    let loaded: Vec<CountryStatisticsView> = store.load(COUNTRIES_STATISTICS_KEY).unwrap();
    assert_eq!(loaded, views);

    // a second save/load cycle gives the same value again
    store.save(COUNTRIES_STATISTICS_KEY, &loaded);
    let again: Vec<CountryStatisticsView> = store.load(COUNTRIES_STATISTICS_KEY).unwrap();
    assert_eq!(again, views);
}

#[test]
fn timeseries_round_trip_per_country() {
    let dir = tempdir().unwrap();
    let store = CacheStore::new(dir.path(), None);
    let points = vec![CountryTimeseriesPoint {
        date: NaiveDate::from_ymd_opt(2020, 5, 31).unwrap(),
        confirmed: 286,
        recovered: 590,
        deaths: 10,
    }];
    store.save(&timeseries_key("DE"), &points);

    let de: Vec<CountryTimeseriesPoint> = store.load(&timeseries_key("DE")).unwrap();
    assert_eq!(de, points);
    assert!(store.load::<Vec<CountryTimeseriesPoint>>(&timeseries_key("US")).is_none());
}

#[test]
fn seed_entry_is_copied_into_cache() {
    let cache = tempdir().unwrap();
    let seed = tempdir().unwrap();
    fs::write(
        seed.path().join(WORLD_STATISTICS_KEY),
        r#"{"confirmed":3,"recovered":2,"deaths":1}"#,
    )
    .unwrap();

    let store = CacheStore::new(cache.path(), Some(seed.path().to_path_buf()));
    let loaded: GlobalStatistics = store.load(WORLD_STATISTICS_KEY).unwrap();
    assert_eq!(loaded.confirmed, 3);
    assert!(cache.path().join(WORLD_STATISTICS_KEY).exists());

    // cache entry wins over the seed once present
    store.save(
        WORLD_STATISTICS_KEY,
        &GlobalStatistics {
            confirmed: 9,
            recovered: 0,
            deaths: 0,
        },
    );
    let loaded: GlobalStatistics = store.load(WORLD_STATISTICS_KEY).unwrap();
    assert_eq!(loaded.confirmed, 9);
}

#[test]
fn corrupt_entry_reads_as_absent() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(COUNTRIES_STATISTICS_KEY), "[{\"flag\":").unwrap();
    let store = CacheStore::new(dir.path(), None);
    assert!(store.load::<Vec<CountryStatisticsView>>(COUNTRIES_STATISTICS_KEY).is_none());
}

#[test]
fn save_into_unwritable_location_is_swallowed() {
    let dir = tempdir().unwrap();
    // a regular file where the cache directory should be
    let blocker = dir.path().join("cache");
    fs::write(&blocker, "x").unwrap();
    let store = CacheStore::new(&blocker, None);

    store.save(WORLD_STATISTICS_KEY, &sample_views());
    assert!(store.try_save(WORLD_STATISTICS_KEY, &sample_views()).is_err());
    assert!(store.load::<Vec<CountryStatisticsView>>(WORLD_STATISTICS_KEY).is_none());
}
