use criterion::{Criterion, criterion_group, criterion_main};
use skydb_core::{
    ContentLink, DataKey, EntryLink, Hash, Keypair,
    link::{self, PathMode},
};
use std::hint::black_box;

fn bench_link_codec(c: &mut Criterion) {
    let content = ContentLink::new(Hash::new(b"bench"));
    let entry = EntryLink::new(Keypair::derive(b"bench").public_key(), &DataKey::from("k"));
    let content_str = content.to_string();
    let entry_str = entry.to_string();
    let url = format!("https://{}.portal.example/index.html", content.to_base32());

    let mut group = c.benchmark_group("link_codec");

    group.bench_function("format_content", |b| {
        let raw = content.to_bytes();
        b.iter(|| link::format(black_box(&raw)).unwrap());
    });

    group.bench_function("decode_entry", |b| {
        b.iter(|| link::decode(black_box(&entry_str)).unwrap());
    });

    group.bench_function("parse_with_path", |b| {
        let input = format!("sia://{content_str}/x/y");
        b.iter(|| link::parse_as(black_box(&input), PathMode::IncludePath).unwrap());
    });

    group.bench_function("parse_subdomain_url", |b| {
        b.iter(|| link::parse(black_box(&url)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_link_codec);
criterion_main!(benches);
