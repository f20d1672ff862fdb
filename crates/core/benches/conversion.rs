use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use telegraph_core::{Converter, Policy};

fn article(paragraphs: usize) -> String {
    let mut html = String::from("<h1>Benchmark article</h1>");
    for i in 0..paragraphs {
        html.push_str(&format!(
            r#"<div class="section"><h2>Section {i}</h2><p>Paragraph {i} with <b>bold</b>, <i>italic</i> and a <a href="https://example.com/{i}" target="_blank">link</a>.</p><figure><img src="/file/{i}.jpg" alt="figure {i}"><figcaption>Caption &amp; credit</figcaption></figure><script>track({i})</script></div>"#
        ));
    }
    html
}

fn bench_html_to_nodes(c: &mut Criterion) {
    let small = article(10);
    let large = article(500);
    let converter = Converter::with_policy(Policy::telegraph());

    let mut group = c.benchmark_group("html_to_nodes");

    group.bench_with_input(BenchmarkId::new("small", "10 sections"), &small, |b, html| {
        b.iter(|| converter.html_to_content_tree(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("large", "500 sections"), &large, |b, html| {
        b.iter(|| converter.html_to_content_tree(black_box(html)))
    });

    group.finish();
}

fn bench_nodes_to_html(c: &mut Criterion) {
    let converter = Converter::new();
    let nodes = converter.html_to_content_tree(&article(500)).unwrap();

    c.bench_function("nodes_to_html", |b| {
        b.iter(|| converter.content_tree_to_html(black_box(&nodes)))
    });
}

fn bench_codec(c: &mut Criterion) {
    let converter = Converter::new();
    let nodes = converter.html_to_content_tree(&article(500)).unwrap();
    let json = converter.encode_content_tree(&nodes).unwrap();

    c.bench_function("encode", |b| b.iter(|| converter.encode_content_tree(black_box(&nodes))));
    c.bench_function("decode", |b| b.iter(|| converter.decode_content_tree(black_box(&json))));
}

criterion_group!(benches, bench_html_to_nodes, bench_nodes_to_html, bench_codec);
criterion_main!(benches);
