//! Token-matching benchmarks for the core grammars and splitter.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use csp_core::grammar::{HashSource, HostSource, Nonce};
use csp_core::splitter;
use csp_core::url::Url;

const HEADER: &str = "default-src 'self'; script-src 'self' 'nonce-abc123' \
    'sha256-LXEWQrcmsEQBYnyp+6wy9chTD7GQPMTbAiWHF5IaSIE=' https://cdn.example.com/static/; \
    style-src 'self' 'unsafe-inline'; img-src * data:; connect-src wss://api.example.com:8443; \
    frame-ancestors 'none'; upgrade-insecure-requests";

fn bench_splitter(c: &mut Criterion) {
    c.bench_function("split_policy", |b| {
        b.iter(|| {
            let tokens = splitter::split_policy(black_box(HEADER));
            black_box(tokens);
        });
    });

    let list = format!("{HEADER}, img-src 'self', sandbox allow-scripts");
    c.bench_function("split_list", |b| {
        b.iter(|| {
            let slots = splitter::split_list(black_box(&list));
            black_box(slots);
        });
    });
}

fn bench_grammars(c: &mut Criterion) {
    let mut group = c.benchmark_group("grammar");

    group.bench_function("host_source", |b| {
        b.iter(|| {
            let host = HostSource::parse(black_box("https://*.cdn.example.com:8443/static/js/"));
            black_box(host);
        });
    });

    group.bench_function("hash_source", |b| {
        b.iter(|| {
            let hash = HashSource::parse(black_box(
                "'sha256-LXEWQrcmsEQBYnyp+6wy9chTD7GQPMTbAiWHF5IaSIE='",
            ));
            black_box(hash);
        });
    });

    group.bench_function("nonce", |b| {
        b.iter(|| {
            let nonce = Nonce::parse(black_box("'nonce-dGhpcyBpcyBhIG5vbmNl'"));
            black_box(nonce);
        });
    });

    group.finish();
}

fn bench_url(c: &mut Criterion) {
    let mut group = c.benchmark_group("url");

    group.bench_function("network", |b| {
        b.iter(|| {
            let url = Url::parse(black_box("https://sub.example.com:8443/a/b/c.js"));
            black_box(url);
        });
    });

    group.bench_function("opaque", |b| {
        b.iter(|| {
            let url = Url::parse(black_box("data:image/png;base64,iVBORw0KGgo="));
            black_box(url);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_splitter, bench_grammars, bench_url);
criterion_main!(benches);
