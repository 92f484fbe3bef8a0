use chrono::{TimeDelta, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dashframe::{reshape_with, wind_rose, Aggregator, Geofence, Grouping, LatLon, Observation};

/// A week of five-minute weather readings.
fn readings() -> Vec<Observation> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..2016)
        .map(|i| {
            let i = i as f64;
            Observation::new()
                .with("t", start + TimeDelta::minutes(5 * i as i64))
                .with("temp_f", 60.0 + (i / 50.0).sin() * 10.0)
                .with("wind_degrees", (i * 7.0) % 360.0)
                .with("wind_mph", (i / 30.0).cos().abs() * 12.0)
                .with("latitude", 29.0 + (i % 100.0) / 100.0)
                .with("longitude", -95.0 - (i % 70.0) / 100.0)
        })
        .collect()
}

fn bench_reshape(c: &mut Criterion) {
    let records = readings();
    c.bench_function("reshape_hourly_mean", |b| {
        b.iter(|| {
            reshape_with(black_box(&records))
                .group_key("t")
                .value_key("temp_f")
                .grouping(Grouping::Resample(TimeDelta::hours(1)))
                .aggregator(Aggregator::Mean)
                .call()
        })
    });
    c.bench_function("wind_rose", |b| {
        b.iter(|| wind_rose(black_box(&records), "wind_degrees", "wind_mph"))
    });
    let fence = Geofence::km(LatLon(29.5, -95.3), 40.0);
    c.bench_function("geofence_select", |b| {
        b.iter(|| fence.select(black_box(&records), "latitude", "longitude").len())
    });
}

criterion_group!(benches, bench_reshape);
criterion_main!(benches);
