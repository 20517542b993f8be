use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use strata_engine::{StyledText, discover};
use strata_syntax::TextFormat;
mod common;

fn run(content: &str, format: TextFormat) {
    let mut text = StyledText::new(content);
    let meta = discover(&mut text).with_text_format(format).perform();
    std::hint::black_box(meta);
}

fn bench_structured(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery");
    group.sample_size(10);

    for records in [100, 1_000] {
        let content = common::generate_json_content(records);
        group.bench_with_input(BenchmarkId::new("json", records), &content, |b, content| {
            b.iter(|| run(std::hint::black_box(content), TextFormat::Json));
        });
    }

    let logs = common::generate_log_content(1_000);
    group.bench_function("log_lines", |b| {
        b.iter(|| run(std::hint::black_box(&logs), TextFormat::Log));
    });

    let markdown = common::generate_markdown_content(200);
    group.bench_function("markdown", |b| {
        b.iter(|| run(std::hint::black_box(&markdown), TextFormat::Markdown));
    });

    group.finish();
}

fn bench_garbage(c: &mut Criterion) {
    let mut group = c.benchmark_group("garbage");
    group.sample_size(10);

    // Scanning stops at the garbage limit, so both sizes should cost the
    // same.
    for len in [10_000, 1_000_000] {
        let content = common::generate_garbage(len);
        group.bench_with_input(BenchmarkId::new("cutoff", len), &content, |b, content| {
            b.iter(|| run(std::hint::black_box(content), TextFormat::Unknown));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_structured, bench_garbage);
criterion_main!(benches);
