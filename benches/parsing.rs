use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;

use mailtree::{Message, ParserConfig};

fn fixture(name: &str) -> Vec<u8> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read(path).unwrap()
}

fn bench_parse_fixtures(c: &mut Criterion) {
    let config = ParserConfig::default();
    for name in ["envelope.eml", "international.eml"] {
        let data = fixture(name);
        c.bench_function(&format!("parse_{name}"), |b| {
            b.iter(|| Message::parse(&data, &config).unwrap())
        });
    }
}

fn bench_large_attachment(c: &mut Criterion) {
    use base64::Engine;

    let payload = vec![0xA5u8; 2 * 1024 * 1024];
    let encoded = base64::engine::general_purpose::STANDARD.encode(&payload);
    let mut raw = String::from(
        "From: bench@example.com\r\nSubject: large\r\nContent-Type: multipart/mixed; boundary=b\r\n\r\n--b\r\nContent-Type: text/plain\r\n\r\nsee attached\r\n--b\r\nContent-Type: application/octet-stream\r\nContent-Transfer-Encoding: base64\r\n\r\n",
    );
    for line in encoded.as_bytes().chunks(76) {
        raw.push_str(std::str::from_utf8(line).unwrap());
        raw.push_str("\r\n");
    }
    raw.push_str("--b--\r\n");

    let config = ParserConfig::default();
    c.bench_function("parse_2mb_base64_attachment", |b| {
        b.iter(|| {
            let msg = Message::parse(raw.as_bytes(), &config).unwrap();
            msg.attachments().len()
        })
    });
}

fn bench_address_list(c: &mut Criterion) {
    let list: Vec<String> = (0..200)
        .map(|i| format!("\"User {i}\" <user{i}@example.com>"))
        .collect();
    let raw = list.join(", ");

    c.bench_function("parse_address_list_200", |b| {
        b.iter(|| mailtree::parser::address::parse_address_list(&raw))
    });
}

criterion_group!(
    benches,
    bench_parse_fixtures,
    bench_large_attachment,
    bench_address_list
);
criterion_main!(benches);
