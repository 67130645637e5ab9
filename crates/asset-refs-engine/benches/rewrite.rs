use asset_refs_engine::{
    Asset, ExportedReferenceLedger, InMemoryAssetStore, PictureTagRenderer, ReferenceProcessor,
    markup::Fragment,
};
use criterion::{Criterion, criterion_group, criterion_main};

fn generate_article(images: usize) -> String {
    let mut content = String::from("<article><h1>Benchmark</h1>");
    for i in 0..images {
        content.push_str(&format!(
            "<p>Paragraph {i} with some prose around the figure.</p>\
             <p><img data-fileEntryId=\"{}\" src=\"/img/{i}\" alt=\"figure {i}\"/></p>",
            i % 50
        ));
    }
    content.push_str("</article>");
    content
}

fn bench_rewrite(c: &mut Criterion) {
    let store: InMemoryAssetStore = (0..50)
        .map(|id| Asset::new(id, format!("image-{id}.png"), "image/png"))
        .collect();
    let renderer = PictureTagRenderer::default();
    let processor = ReferenceProcessor::new(&store, &renderer);
    let content = generate_article(500);

    let mut group = c.benchmark_group("rewrite");
    group.sample_size(20);

    group.bench_function("parse_and_serialize", |b| {
        b.iter(|| {
            let fragment = Fragment::parse(std::hint::black_box(&content)).unwrap();
            std::hint::black_box(fragment.to_html());
        });
    });

    group.bench_function("export", |b| {
        b.iter(|| {
            let mut ledger = ExportedReferenceLedger::new();
            let out = processor
                .replace_export_references(std::hint::black_box(&content), &mut ledger)
                .unwrap();
            std::hint::black_box(out);
        });
    });

    group.bench_function("render", |b| {
        b.iter(|| {
            let out = processor
                .render_references(std::hint::black_box(&content))
                .unwrap();
            std::hint::black_box(out);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_rewrite);
criterion_main!(benches);
