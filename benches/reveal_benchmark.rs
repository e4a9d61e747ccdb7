//! Reveal benchmark: Measure per-tick and per-chunk costs.
//!
//! Target: tick well under 1µs so a 30ms period never competes with it.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use smoothstream::{RevealBuffer, RevealUnit, Utf8Decoder};

const REPLY: &str = "Tokens arrive in bursts. トークンは不規則に届く。👩‍👩‍👧 ";

fn reveal_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("reveal_tick");

    for unit in [RevealUnit::Char, RevealUnit::Grapheme] {
        group.bench_with_input(BenchmarkId::from_parameter(format!("{unit:?}")), &unit, |b, &unit| {
            let mut reveal = RevealBuffer::with_unit(unit);
            b.iter(|| {
                if !reveal.is_revealing() {
                    reveal.reset();
                    reveal.append(REPLY);
                }
                black_box(reveal.tick());
            });
        });
    }

    group.finish();
}

fn reveal_append_burst(c: &mut Criterion) {
    let burst = REPLY.repeat(64);

    c.bench_function("reveal_append_burst", |b| {
        let mut reveal = RevealBuffer::new();
        b.iter(|| {
            reveal.reset();
            black_box(reveal.append(black_box(&burst)));
        });
    });
}

fn utf8_decode_split(c: &mut Criterion) {
    let bytes = REPLY.repeat(16).into_bytes();

    c.bench_function("utf8_decode_7_byte_chunks", |b| {
        b.iter(|| {
            let mut decoder = Utf8Decoder::new();
            let mut out = String::with_capacity(bytes.len());
            for chunk in bytes.chunks(7) {
                out.push_str(&decoder.decode(chunk));
            }
            out.push_str(&decoder.finish());
            black_box(out)
        });
    });
}

criterion_group!(benches, reveal_tick, reveal_append_burst, utf8_decode_split);
criterion_main!(benches);
