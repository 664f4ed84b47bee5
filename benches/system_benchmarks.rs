use battery_guardian::{
    metrics::{BatteryInfo, CpuInfo, FnProvider, MemoryInfo, SystemCollector},
    monitor::{AlertZone, BatterySample, NotifierState, Thresholds},
    Guardian, LogNotifier, MetricCategory, MetricProvider, MetricValue, MonitorConfig,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::time::Duration;

/// Benchmark zone classification and latch transitions
fn bench_classification(c: &mut Criterion) {
    let thresholds = Thresholds::default();

    c.bench_function("classify_zone", |b| {
        b.iter(|| {
            for percent in 0..=100u8 {
                black_box(AlertZone::classify(
                    BatterySample::new(percent, percent % 2 == 0),
                    black_box(thresholds),
                ));
            }
        })
    });

    c.bench_function("latch_full_discharge_cycle", |b| {
        b.iter(|| {
            let mut state = NotifierState::default();
            let mut alerts = 0;
            for percent in (0..=100u8).rev().chain(0..=100u8) {
                let charging = percent < 100 && alerts % 2 == 1;
                let zone = AlertZone::classify(BatterySample::new(percent, charging), thresholds);
                if state.advance(zone).is_some() {
                    alerts += 1;
                }
            }
            black_box(alerts)
        })
    });
}

/// A running engine with every category populated
fn populated_guardian(rt: &tokio::runtime::Runtime) -> Guardian {
    let providers: Vec<(MetricCategory, Arc<dyn MetricProvider>)> = vec![
        (
            MetricCategory::Battery,
            Arc::new(FnProvider::new(|| async {
                Ok(MetricValue::Battery(BatteryInfo {
                    has_battery: true,
                    percent: 64,
                    status: "Discharging".to_string(),
                    ..Default::default()
                }))
            })),
        ),
        (
            MetricCategory::Memory,
            Arc::new(FnProvider::new(|| async {
                Ok(MetricValue::Memory(MemoryInfo {
                    total_bytes: 16 * 1024 * 1024 * 1024,
                    ..Default::default()
                }))
            })),
        ),
        (
            MetricCategory::Cpu,
            Arc::new(FnProvider::new(|| async {
                Ok(MetricValue::Cpu(CpuInfo {
                    brand: "Bench CPU".to_string(),
                    cores: 8,
                    core_usage: vec![12.5; 8],
                    ..Default::default()
                }))
            })),
        ),
    ];

    rt.block_on(async {
        let guardian = Guardian::builder(MonitorConfig::default())
            .sink(Arc::new(LogNotifier))
            .providers(providers)
            .build()
            .expect("Should build guardian");
        guardian.start().await.expect("Should start polling");
        tokio::time::sleep(Duration::from_millis(50)).await;
        guardian.stop().await;
        guardian
    })
}

/// Benchmark snapshot reads, which never wait on a fetch
fn bench_snapshot_reads(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Should create tokio runtime");
    let guardian = populated_guardian(&rt);

    c.bench_function("snapshot_read_all", |b| b.iter(|| black_box(guardian.snapshot())));

    c.bench_function("snapshot_read_one", |b| {
        b.iter(|| black_box(guardian.source(black_box(MetricCategory::Battery))))
    });

    let snapshot = guardian.snapshot();
    c.bench_function("snapshot_json_serialization", |b| {
        b.iter(|| serde_json::to_string(&snapshot).expect("Should serialize"))
    });
}

/// Benchmark host collection per category
fn bench_host_collection(c: &mut Criterion) {
    let mut collector = SystemCollector::new();

    for category in [
        MetricCategory::Battery,
        MetricCategory::Memory,
        MetricCategory::Time,
    ] {
        c.bench_with_input(
            BenchmarkId::new("collect", category),
            &category,
            |b, &category| b.iter(|| black_box(collector.collect(category).is_ok())),
        );
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .sample_size(50);
    targets = bench_classification, bench_snapshot_reads, bench_host_collection
}

criterion_main!(benches);
