//! Benchmarks for stack definition, rendering and asset hashing.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use s3_athena_workflow::core::environment::Environment;
use s3_athena_workflow::core::{assets, definition, parser, resolver, synth};

const CONFIG: &str = r#"
version: "1.0"
name: s3-athena-workflow
base_name: athena_tests
tags:
  environment: dev
  repository_url: https://github.com/san99tiago/aws-cdk-simple-s3-athena-workflow
  source: aws-cdk-simple-s3-athena-workflow
  owner: Santiago Garcia Arango
"#;

fn sample_asset(rows: usize) -> (tempfile::TempDir, assets::AssetFingerprint) {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("sample_data");
    std::fs::create_dir(&data).unwrap();
    let mut csv = String::from("price,owner,title,reviews,color,availability,datetime,views,url\n");
    for i in 0..rows {
        csv.push_str(&format!(
            "{}.99,owner{},Item {},4.{},red,In Stock,2024-01-01 00:00:00,{},https://example.com/p/{}\n",
            i % 100,
            i,
            i,
            i % 10,
            i * 3,
            i
        ));
    }
    std::fs::write(data.join("products.csv"), csv).unwrap();
    let fp = assets::fingerprint(dir.path(), "sample_data").unwrap();
    (dir, fp)
}

fn bench_parse_config(c: &mut Criterion) {
    c.bench_function("parse_and_validate_config", |b| {
        b.iter(|| {
            let config = parser::parse_config(black_box(CONFIG)).unwrap();
            black_box(parser::validate_config(&config));
        });
    });
}

fn bench_define_stack(c: &mut Criterion) {
    let config = parser::parse_config(CONFIG).unwrap();
    let (_dir, asset) = sample_asset(10);
    let env = Environment::agnostic();
    c.bench_function("define_and_resolve_stack", |b| {
        b.iter(|| {
            let graph = definition::define_stack(black_box(&config), &env, &asset).unwrap();
            black_box(resolver::resolve(&graph).unwrap());
        });
    });
}

fn bench_render_template(c: &mut Criterion) {
    let config = parser::parse_config(CONFIG).unwrap();
    let (_dir, asset) = sample_asset(10);
    let graph = definition::define_stack(&config, &Environment::agnostic(), &asset).unwrap();
    c.bench_function("render_template_json", |b| {
        b.iter(|| {
            let template = synth::render_template(black_box(&graph));
            black_box(synth::to_json(&template).unwrap());
        });
    });
}

fn bench_asset_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("asset_fingerprint");
    for rows in [100, 10_000] {
        let (dir, _) = sample_asset(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &dir, |b, dir| {
            b.iter(|| {
                black_box(assets::fingerprint(black_box(dir.path()), "sample_data").unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_parse_config,
    bench_define_stack,
    bench_render_template,
    bench_asset_fingerprint
);
criterion_main!(benches);
