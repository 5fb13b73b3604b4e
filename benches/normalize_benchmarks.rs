//! Performance benchmarks for contact preparation.
//!
//! These benchmarks measure the per-contact work done before any browser call:
//! - Phone normalization and fan-out for single and multi-number fields
//! - Template rendering with and without unresolved placeholders
//! - Content resolution across a whole contact list

use bulk_dispatch::dispatch::resolve_content;
use bulk_dispatch::template;
use bulk_dispatch::{Contact, ContactNormalizer, CountryCode, DispatchJob};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn sample_contacts(count: usize) -> Vec<Contact> {
    (0..count)
        .map(|i| {
            let phone = if i % 3 == 0 {
                format!("98765{:05}, 87654{:05}", i, i)
            } else {
                format!("+91 98765 {:05}", i)
            };
            Contact::new(phone, format!("Customer {}", i))
                .with_field("id", format!("OUT-{}", i))
                .with_field("courier", "BlueDart")
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let normalizer = ContactNormalizer::new(CountryCode::default());
    let mut group = c.benchmark_group("normalize");

    group.bench_function("single_number", |b| {
        b.iter(|| normalizer.identifiers(black_box("+91 98765-43210")))
    });

    group.bench_function("multi_number_field", |b| {
        b.iter(|| normalizer.identifiers(black_box("9876543210, 8765432109, 12345, 09876543210")))
    });

    for size in [20usize, 200, 2000] {
        let contacts = sample_contacts(size);
        group.bench_with_input(BenchmarkId::new("expand", size), &contacts, |b, contacts| {
            b.iter(|| {
                contacts
                    .iter()
                    .map(|c| normalizer.expand(c).targets.len())
                    .sum::<usize>()
            })
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let contact = Contact::new("9876543210", "Asha")
        .with_field("id", "OUT-1")
        .with_field("courier", "BlueDart");
    let mut group = c.benchmark_group("template");

    group.bench_function("resolved", |b| {
        b.iter(|| {
            template::render_for(
                black_box("Hi {name}, order {id} shipped via {courier}."),
                &contact,
            )
        })
    });

    group.bench_function("unresolved", |b| {
        b.iter(|| template::render_for(black_box("Hi {name}, track at {tracking_url}"), &contact))
    });

    group.finish();
}

fn bench_resolve_content(c: &mut Criterion) {
    let contacts = sample_contacts(500);
    let job = DispatchJob::new(contacts.clone()).with_template("Hi {name}, order {id} shipped");

    c.bench_function("resolve_content_500", |b| {
        b.iter(|| {
            contacts
                .iter()
                .filter(|contact| !resolve_content(&job, contact).is_empty())
                .count()
        })
    });
}

criterion_group!(benches, bench_normalize, bench_render, bench_resolve_content);
criterion_main!(benches);
