use busmate_route::{Criterion as RankBy, FixedClock, RouteAnalyzer};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

const NOW: i64 = 1_735_700_000;

fn synthetic_routes(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            let steps: Vec<Value> = (0..6)
                .map(|s| {
                    if s % 2 == 0 {
                        json!({
                            "travel_mode": "WALKING",
                            "distance": { "text": "", "value": 100 + (i * 7 + s) % 400 }
                        })
                    } else {
                        json!({
                            "travel_mode": "TRANSIT",
                            "distance": { "text": "", "value": 3000 },
                            "transit_details": {
                                "line": { "short_name": format!("{}", 10 + s) },
                                "departure_time": { "text": "", "value": NOW + (s as i64) * 300 }
                            }
                        })
                    }
                })
                .collect();
            json!({
                "legs": [{
                    "duration": { "text": "", "value": 900 + (i * 37) % 3600 },
                    "steps": steps
                }]
            })
        })
        .collect()
}

fn bench_analyze(c: &mut Criterion) {
    let analyzer = RouteAnalyzer::with_clock(FixedClock::at_timestamp(NOW));
    let mut group = c.benchmark_group("analyze");

    for size in [5usize, 50, 500] {
        let routes = synthetic_routes(size);
        group.bench_function(format!("shortest_time_{}", size), |b| {
            b.iter(|| analyzer.analyze(black_box(&routes), RankBy::ShortestTime))
        });
        group.bench_function(format!("fewest_transfers_{}", size), |b| {
            b.iter(|| analyzer.analyze(black_box(&routes), RankBy::FewestTransfers))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_analyze);
criterion_main!(benches);
