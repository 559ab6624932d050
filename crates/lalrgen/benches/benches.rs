use criterion::{criterion_group, criterion_main, Criterion};
use lalrgen::{grammar::Grammar, Config};
use std::{env, path::PathBuf};

criterion_main!(benches);
criterion_group!(benches, bench_small, bench_json, bench_parse);

fn bench_small(c: &mut Criterion) {
    bench_generate(c, "ccdd");
    bench_generate(c, "arithmetic");
    bench_generate(c, "nullable");
}

fn bench_json(c: &mut Criterion) {
    bench_generate(c, "json");
}

fn load(grammar_name: &str) -> Grammar {
    let project_root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .expect("missing environment variable: `CARGO_MANIFEST_DIR'");
    Grammar::from_file(
        &project_root.join(format!("tests/{}.grammar", grammar_name)),
        None,
    )
    .unwrap()
}

fn bench_generate(c: &mut Criterion, grammar_name: &str) {
    let grammar = load(grammar_name);

    let mut group = c.benchmark_group(grammar_name);
    group.bench_function("Canonical", |b| {
        b.iter(|| Config::new().use_canonical().generate(&grammar));
    });
    group.bench_function("LALR", |b| {
        b.iter(|| Config::new().use_lalr().generate(&grammar));
    });
    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let grammar = load("arithmetic");
    let generated = Config::new().use_lalr().generate(&grammar).unwrap();

    let mut tokens = vec!["id"];
    for _ in 0..200 {
        tokens.extend(["+", "(", "id", "*", "id", ")"]);
    }

    c.bench_function("parse/arithmetic", |b| {
        b.iter(|| generated.parse(&grammar, &tokens));
    });
}
