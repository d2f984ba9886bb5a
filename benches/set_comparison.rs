use core::hash::BuildHasher;
use core::hash::Hash;
use core::hint::black_box;

use cellar_hash::HashSet as CellarHashSet;
use criterion::AxisScale;
use criterion::BatchSize;
use criterion::Criterion;
use criterion::PlotConfiguration;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use hashbrown::HashSet as HashbrownHashSet;
use rand::Rng;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand_distr::Zipf;
use siphasher::sip::SipHasher;

#[derive(Clone, Copy, Default)]
struct SipBuildHasher;

impl BuildHasher for SipBuildHasher {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new()
    }
}

trait TestKey: Clone + Hash + Eq {
    fn new(key: u64) -> Self;
}

impl TestKey for u64 {
    fn new(key: u64) -> Self {
        black_box(key)
    }
}

#[derive(Clone, Hash, PartialEq, Eq)]
struct StringKey(String);

impl TestKey for StringKey {
    fn new(key: u64) -> Self {
        black_box(Self(format!("key_{:016X}", key)))
    }
}

const SIZES: &[usize] = &[
    (1 << 10),
    (1 << 12),
    (1 << 14),
    (1 << 16),
    (1 << 18),
];

fn cellar_set<K: TestKey>(capacity: usize) -> CellarHashSet<K, SipBuildHasher> {
    CellarHashSet::with_capacity_and_hasher(capacity, SipBuildHasher)
}

fn hashbrown_set<K: TestKey>(capacity: usize) -> HashbrownHashSet<K, SipBuildHasher> {
    HashbrownHashSet::with_capacity_and_hasher(capacity, SipBuildHasher)
}

fn random_keys<K: TestKey>(count: usize) -> Vec<K> {
    let mut rng = OsRng;
    (0..count)
        .map(|_| K::new(rng.try_next_u64().unwrap()))
        .collect()
}

fn bench_insert_random<K: TestKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!(
        "insert_random_{}",
        core::any::type_name::<K>()
    ));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter().copied() {
        let keys = random_keys::<K>(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("cellar_hash/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut set = cellar_set::<K>(0);
                    for key in keys {
                        black_box(set.insert(key));
                    }
                    black_box(set)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut set = hashbrown_set::<K>(0);
                    for key in keys {
                        black_box(set.insert(key));
                    }
                    black_box(set)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_find_hit_miss<K: TestKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!(
        "find_hit_miss_{}",
        core::any::type_name::<K>()
    ));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter().copied() {
        let hits = (0..size as u64 * 2).step_by(2).map(K::new).collect::<Vec<K>>();
        let mut probes = (0..size as u64 * 2).map(K::new).collect::<Vec<K>>();
        probes.shuffle(&mut SmallRng::from_os_rng());

        let mut cellar = cellar_set::<K>(size);
        cellar.extend(hits.iter().cloned());
        let mut hashbrown = hashbrown_set::<K>(size);
        hashbrown.extend(hits.iter().cloned());

        group.throughput(Throughput::Elements(probes.len() as u64));
        group.bench_function(format!("cellar_hash/{size}"), |b| {
            b.iter(|| {
                for probe in &probes {
                    black_box(cellar.contains(probe));
                }
            })
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                for probe in &probes {
                    black_box(hashbrown.contains(probe));
                }
            })
        });
    }

    group.finish();
}

fn bench_remove<K: TestKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("remove_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter().copied() {
        let keys = random_keys::<K>(size);
        let mut cellar = cellar_set::<K>(size);
        cellar.extend(keys.iter().cloned());
        let mut hashbrown = hashbrown_set::<K>(size);
        hashbrown.extend(keys.iter().cloned());

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("cellar_hash/{size}"), |b| {
            b.iter_batched(
                || {
                    let mut keys = keys.clone();
                    keys.shuffle(&mut SmallRng::from_os_rng());
                    (cellar.clone(), keys)
                },
                |(mut set, keys)| {
                    for key in &keys {
                        black_box(set.remove(key));
                    }
                    black_box(set)
                },
                BatchSize::LargeInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || {
                    let mut keys = keys.clone();
                    keys.shuffle(&mut SmallRng::from_os_rng());
                    (hashbrown.clone(), keys)
                },
                |(mut set, keys)| {
                    for key in &keys {
                        black_box(set.remove(key));
                    }
                    black_box(set)
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_iteration<K: TestKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("iteration_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter().copied() {
        let keys = random_keys::<K>(size);
        let mut cellar = cellar_set::<K>(0);
        cellar.extend(keys.iter().cloned());
        let mut hashbrown = hashbrown_set::<K>(0);
        hashbrown.extend(keys.iter().cloned());

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("cellar_hash/{size}"), |b| {
            b.iter(|| {
                for key in cellar.iter() {
                    black_box(key);
                }
            })
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                for key in hashbrown.iter() {
                    black_box(key);
                }
            })
        });
    }

    group.finish();
}

#[derive(Clone, Copy)]
enum Operation {
    Insert(u64),
    Remove(u64),
    Find(u64),
}

fn bench_mixed_zipf<K: TestKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("mixed_zipf_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    const KEY_SPACE_MULTIPLIER: f32 = 2.0;

    for size in SIZES[..=MAX_SIZE].iter().copied() {
        let mut rng = SmallRng::from_os_rng();
        let op_distr = Zipf::new(3.0, 1.0).unwrap();
        let key_distr = Zipf::new(size as f32 * KEY_SPACE_MULTIPLIER - 1.0, 1.0).unwrap();

        let operations = (0..size * 3)
            .map(|_| {
                let op_choice: f32 = rng.sample(op_distr);
                let key = rng.sample(key_distr) as u64;
                if op_choice <= 1.0 {
                    Operation::Find(key)
                } else if op_choice <= 2.0 {
                    Operation::Insert(key)
                } else {
                    Operation::Remove(key)
                }
            })
            .collect::<Vec<Operation>>();

        group.throughput(Throughput::Elements(operations.len() as u64));
        group.bench_function(format!("cellar_hash/{size}"), |b| {
            b.iter(|| {
                let mut set = cellar_set::<K>(0);
                for operation in &operations {
                    match *operation {
                        Operation::Insert(key) => black_box(set.insert(K::new(key))),
                        Operation::Remove(key) => black_box(set.remove(&K::new(key))),
                        Operation::Find(key) => black_box(set.contains(&K::new(key))),
                    };
                }
                black_box(set)
            })
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                let mut set = hashbrown_set::<K>(0);
                for operation in &operations {
                    match *operation {
                        Operation::Insert(key) => black_box(set.insert(K::new(key))),
                        Operation::Remove(key) => black_box(set.remove(&K::new(key))),
                        Operation::Find(key) => black_box(set.contains(&K::new(key))),
                    };
                }
                black_box(set)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_random::<u64, 4>,
    bench_insert_random::<StringKey, 3>,
    bench_find_hit_miss::<u64, 4>,
    bench_find_hit_miss::<StringKey, 3>,
    bench_remove::<u64, 3>,
    bench_remove::<StringKey, 2>,
    bench_iteration::<u64, 4>,
    bench_iteration::<StringKey, 3>,
    bench_mixed_zipf::<u64, 4>,
    bench_mixed_zipf::<StringKey, 3>,
);

criterion_main!(benches);
