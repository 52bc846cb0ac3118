// benches/benchmarks.rs — Performance benchmarks (criterion)
//
// What matters for interactive use:
//   1. Cache hit: re-read + compare when nothing changed (every poll)
//   2. Reload: compile + construct after an edit
//   3. Iteration: one re-evaluation of a script against a prepared environment

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hotloop::cache::{DynamicCodeCache, MemoryProvider};
use hotloop::explore::{ExploratoryLoop, LoopSession, ScriptedConsole, Setup};
use hotloop::infra::config::EngineConfig;
use hotloop::script::{compile, create_engine};

// ─── Helpers ────────────────────────────────────────────────────────────────

/// A unit with N small functions, so compile time is measurable.
fn unit_source(functions: usize) -> String {
    let mut source = String::from("fn init() { #{ calls: 0 } }\n");
    for i in 0..functions {
        source.push_str(&format!(
            "fn f{i}(x) {{ let y = x * {i}; if y > 100 {{ y - 1 }} else {{ y + 1 }} }}\n"
        ));
    }
    source.push_str("fn run() { this.calls += 1; this.calls }\n");
    source
}

fn cache_for(source: &str) -> (DynamicCodeCache<MemoryProvider>, MemoryProvider) {
    let provider = MemoryProvider::new();
    provider.set("unit.rhai", source);
    let cache = DynamicCodeCache::new(
        Rc::new(create_engine(&EngineConfig::default())),
        provider.clone(),
    );
    (cache, provider)
}

// ─── Benchmark: Cache ───────────────────────────────────────────────────────

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");

    for size in [10, 200] {
        let source = unit_source(size);

        group.bench_function(format!("hit_{size}_fns"), |b| {
            let (mut cache, _provider) = cache_for(&source);
            let mut unit = cache.open("unit.rhai").expect("open unit");
            cache.get_instance(&mut unit).expect("first load");
            b.iter(|| black_box(cache.get_instance(&mut unit).expect("cache hit")));
        });

        group.bench_function(format!("reload_{size}_fns"), |b| {
            let (mut cache, provider) = cache_for(&source);
            let mut unit = cache.open("unit.rhai").expect("open unit");
            let edited = format!("{source}// edited\n");
            let mut flip = false;
            b.iter(|| {
                flip = !flip;
                provider.set("unit.rhai", if flip { edited.as_str() } else { source.as_str() });
                black_box(cache.get_instance(&mut unit).expect("reload"))
            });
        });
    }

    group.bench_function("call_method", |b| {
        let (mut cache, _provider) = cache_for(&unit_source(10));
        let mut unit = cache.open("unit.rhai").expect("open unit");
        let instance = cache.get_instance(&mut unit).expect("load");
        b.iter(|| black_box(instance.call("run", ()).expect("call run")));
    });

    group.finish();
}

// ─── Benchmark: Compile ─────────────────────────────────────────────────────

fn bench_compile(c: &mut Criterion) {
    let engine = create_engine(&EngineConfig::default());
    let source = unit_source(50);
    c.bench_function("compile_50_fns", |b| {
        b.iter(|| black_box(compile(&engine, "unit.rhai", black_box(&source)).expect("compile")))
    });
}

// ─── Benchmark: Exploratory iteration ───────────────────────────────────────

fn bench_iteration(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("explore.rhai");
    std::fs::write(&path, "let sum = 0;\nfor r in rows { sum += r; }\nsum\n").expect("write script");

    let engine = create_engine(&EngineConfig::default());
    let lp = ExploratoryLoop::new(
        &path,
        Rc::new(LoopSession::new()),
        Rc::new(ScriptedConsole::new(["exit"])),
    );
    lp.start(
        &engine,
        Setup::block(|env| {
            env.set(
                "rows",
                rhai::Dynamic::from_array((0..1000_i64).map(rhai::Dynamic::from).collect()),
            );
            Ok(())
        }),
    )
    .expect("setup");

    c.bench_function("iterate_sum_1000_rows", |b| {
        b.iter(|| black_box(lp.iterate(&engine)))
    });
}

criterion_group!(benches, bench_cache, bench_compile, bench_iteration);
criterion_main!(benches);
