// SPDX-License-Identifier: MPL-2.0
use std::time::Duration;

extern crate criterion;
use self::criterion::*;

use bundle_resolver::capability::Requirement;
use bundle_resolver::module::Module;
use bundle_resolver::reduce::{reduce, Candidate};
use bundle_resolver::{Version, VersionRange};

/// `names` symbolic names with `versions` versions each,
/// every version satisfying a sliding window of requirements.
fn candidates(names: u64, versions: u64) -> Vec<Candidate> {
    let requirements: Vec<Requirement> = (0..versions + 8)
        .map(|i| Requirement::package(format!("com.acme.p{}", i), VersionRange::full()))
        .collect();
    let mut candidates = Vec::new();
    for n in 0..names {
        for v in 0..versions {
            let width = (v % 5 + 1) as usize;
            let start = (v * 7 % versions) as usize;
            candidates.push(Candidate::new(
                Module::new(format!("module{}", n), Version::new(1, v, 0)),
                requirements[start..start + width].iter().cloned(),
            ));
        }
    }
    candidates
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce");
    group.measurement_time(Duration::from_secs(10));

    for (names, versions) in [(10, 10), (50, 20), (20, 100)] {
        let input = candidates(names, versions);
        group.bench_function(format!("{}x{}", names, versions), |b| {
            b.iter(|| reduce(black_box(input.clone())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reduce);
criterion_main!(benches);
