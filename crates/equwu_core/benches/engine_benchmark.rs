//! Engine benchmarks
//!
//! Measures the per-block cost the output callback pays on top of the
//! filters: parameter snapshot and change detection.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use equwu_core::{EqProcessor, ParameterId, ParameterStore};

fn prepared(buffer_size: usize) -> EqProcessor {
    let params = Arc::new(ParameterStore::new());
    params.set(ParameterId::LowCutSlope, 3.0);
    params.set(ParameterId::HighCutSlope, 3.0);
    params.set(ParameterId::HighCutFreq, 12000.0);

    let mut processor = EqProcessor::new(params);
    processor.prepare_to_play(48000.0, buffer_size).unwrap();
    processor
}

fn benchmark_processor(c: &mut Criterion) {
    let mut group = c.benchmark_group("eq_processor");

    // Typical buffer sizes used in real-time audio
    for buffer_size in [64, 128, 256, 512, 1024] {
        let mut buffer: Vec<f32> = (0..buffer_size * 2)
            .map(|i| (i as f32 * 0.001).sin())
            .collect();

        group.throughput(Throughput::Elements(buffer_size as u64));

        group.bench_function(format!("steady_{}_frames", buffer_size), |b| {
            let mut processor = prepared(buffer_size);
            b.iter(|| processor.process_interleaved(black_box(&mut buffer)));
        });

        group.bench_function(format!("automated_{}_frames", buffer_size), |b| {
            let mut processor = prepared(buffer_size);
            let params = Arc::clone(processor.params());
            let mut gain = -24.0_f32;

            b.iter(|| {
                // A parameter moves every block, forcing a redesign
                params.set(ParameterId::PeakGain, gain);
                gain = if gain >= 24.0 { -24.0 } else { gain + 0.5 };
                processor.process_interleaved(black_box(&mut buffer));
            });
        });
    }

    group.finish();
}

fn benchmark_snapshot(c: &mut Criterion) {
    let params = ParameterStore::new();

    c.bench_function("parameter_snapshot", |b| {
        b.iter(|| black_box(params.chain_settings()))
    });
}

criterion_group!(benches, benchmark_processor, benchmark_snapshot);
criterion_main!(benches);
