use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use eventwatch_cache::{detect, merge, GroupedEvent, GroupedEventsResponse, StatusRecord};

fn groups(channels: usize) -> GroupedEventsResponse {
    let events = (0..channels)
        .flat_map(|c| {
            (0..3).map(move |a| GroupedEvent::new(format!("arn:ch:{c}"), format!("alarm-{c}-{a}")))
        })
        .collect();
    GroupedEventsResponse {
        down: events,
        ..Default::default()
    }
}

fn records(channels: usize, state: &str) -> Vec<StatusRecord> {
    (0..channels)
        .map(|c| {
            StatusRecord::new(
                format!("arn:ch:{c}"),
                format!(r#"{{"idle_state":"{state}","pipeline":{c}}}"#),
            )
        })
        .collect()
}

/// Benchmark merging the three feeds
fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for channels in [10usize, 100, 1000].iter() {
        let grouped = groups(*channels);
        let idle = records(*channels, "IDLE");
        let running = records(*channels / 2, "ACTIVE");

        group.bench_with_input(BenchmarkId::from_parameter(channels), channels, |b, _| {
            b.iter(|| {
                merge(
                    black_box(grouped.clone()),
                    black_box(idle.clone()),
                    black_box(running.clone()),
                )
            });
        });
    }
    group.finish();
}

/// Benchmark change detection when nothing changed (every key is checked)
fn bench_detect_unchanged(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_unchanged");

    for channels in [10usize, 100, 1000].iter() {
        let events = merge(groups(*channels), records(*channels, "IDLE"), Vec::new())
            .snapshot
            .events;
        let previous = events.clone();

        group.bench_with_input(BenchmarkId::from_parameter(channels), channels, |b, _| {
            b.iter(|| detect(black_box(&events), black_box(&previous)));
        });
    }
    group.finish();
}

/// Benchmark change detection when one alarm cleared
fn bench_detect_alarm_cleared(c: &mut Criterion) {
    let previous = merge(groups(100), records(100, "IDLE"), Vec::new())
        .snapshot
        .events;
    let current = previous[1..].to_vec();

    c.bench_function("detect_alarm_cleared", |b| {
        b.iter(|| detect(black_box(&current), black_box(&previous)));
    });
}

criterion_group!(
    benches,
    bench_merge,
    bench_detect_unchanged,
    bench_detect_alarm_cleared
);
criterion_main!(benches);
