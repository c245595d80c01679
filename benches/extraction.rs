use case_analyst::extractor::clean_text;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn paginated_document(pages: usize) -> String {
    (1..=pages)
        .map(|page| {
            format!(
                "Section {page}  of the\tagreement sets out the obligations of both parties.\n\
                 The   tenant shall maintain the premises in good repair.\n\n\n{page}\n"
            )
        })
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let document = paginated_document(2000);
    c.bench_function("cleanup", |b| b.iter(|| clean_text(black_box(&document))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
