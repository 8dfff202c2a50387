use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hierlib::config::HierarchyConfig;
use hierlib::memory::NullRam;
use hierlib::simulator::Simulator;
use hierlib::util::{sequential_trace, trace_reader};

/// Replays synthetic sweeps through the Nehalem preset
pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Nehalem");

    // Strides chosen to hit in L1, spill into L2, and conflict all the way down to L3
    let cases = [
        ("l1 resident", sequential_trace('L', 0, 256, 0x40, "8")),
        ("l2 resident", sequential_trace('S', 0, 16_384, 0x40, "8")),
        ("l3 conflicts", sequential_trace('L', 0, 4096, 0x80_0000, "8")),
    ];
    for (name, trace) in cases.iter() {
        let config = HierarchyConfig::nehalem();
        group.bench_with_input(BenchmarkId::new("Sweep", name), trace, |bench, trace| {
            bench.iter(|| {
                let mut simulator = Simulator::new(&config, NullRam).unwrap();
                simulator.simulate(trace_reader(trace)).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = criterion_benchmark
);
criterion_main!(benches);
