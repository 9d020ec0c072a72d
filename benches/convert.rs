use criterion::{criterion_group, criterion_main, Criterion};
use edgefirst_edge::{FrameProcessor, Operation, StrategyKind};

pub fn benchmark_strategies(c: &mut Criterion) {
    let dims = [(320, 240), (640, 480), (960, 540), (1920, 1080)];

    for kind in [StrategyKind::Approximate, StrategyKind::Gradient] {
        let processor = FrameProcessor::new(kind);
        for op in [Operation::Grayscale, Operation::Edges] {
            let mut group = c.benchmark_group(format!("{:?}/{}", kind, op));
            for dim in dims.iter() {
                let frame: Vec<u8> = (0..dim.0 * dim.1 * 4).map(|i| (i * 7 % 256) as u8).collect();
                group.bench_with_input(format!("{}x{}", dim.0, dim.1), &frame, |b, frame| {
                    b.iter(|| {
                        let mut handle = edgefirst_edge::bridge::SliceFrame(frame);
                        processor.process(Some(&mut handle), dim.0 as i32, dim.1 as i32, op)
                    })
                });
            }
            group.finish();
        }
    }
}

criterion_group!(benches, benchmark_strategies);
criterion_main!(benches);
