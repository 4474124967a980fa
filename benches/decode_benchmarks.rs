//! VP9 decode performance benchmarks
//!
//! Frame-level tile decode (single and multi-threaded), the bool decoder
//! and inverse transforms.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use zvd_vp9::codec::vp9::range_coder::RangeDecoder;
use zvd_vp9::codec::vp9::range_encoder::RangeEncoder;
use zvd_vp9::codec::vp9::tables::{
    Partition, PredictionMode, TxSize, TxType, INTRA_MODE_TREE, PARTITION_TREE,
};
use zvd_vp9::codec::vp9::tile::TileInfo;
use zvd_vp9::codec::vp9::transform::inverse_transform_add;
use zvd_vp9::codec::vp9::{
    DecoderConfig, FrameBuffer, FrameContext, FrameHeader, FrameInput, Vp9TileDecoder,
};

/// Key frame data made of skipped 64x64 DC blocks
fn flat_key_frame(header: &FrameHeader, fc: &FrameContext) -> Vec<u8> {
    let dc = PredictionMode::DcPred as u8;
    let (tile_cols, mi_rows, mi_cols) = (header.tile_cols(), header.mi_rows(), header.mi_cols());
    let mut out = Vec::new();

    for col in 0..tile_cols {
        let tile = TileInfo::new(mi_rows, mi_cols, 0, col, 0, header.tile_cols_log2);
        let mut enc = RangeEncoder::new();
        for mi_row in (tile.mi_row_start..tile.mi_row_end).step_by(8) {
            for mi_col in (tile.mi_col_start..tile.mi_col_end).step_by(8) {
                let skip_ctx = (mi_row > 0) as usize + (mi_col > tile.mi_col_start) as usize;
                enc.write_tree(&PARTITION_TREE, &fc.kf_partition_probs[12], Partition::None as u8);
                enc.write_bool(true, fc.skip_probs[skip_ctx]);
                enc.write_tree(&INTRA_MODE_TREE, &fc.kf_y_mode_probs[0][0], dc);
                enc.write_tree(&INTRA_MODE_TREE, &fc.kf_uv_mode_probs[0], dc);
            }
        }
        let data = enc.finish();
        if col + 1 < tile_cols {
            out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        }
        out.extend_from_slice(&data);
    }
    out
}

/// Benchmark whole-frame tile decode at several thread counts
fn bench_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("vp9_frame_decode");
    let header = FrameHeader {
        width: 1920,
        height: 1088,
        tile_cols_log2: 2,
        ..Default::default()
    };
    let fc = FrameContext::default();
    let data = flat_key_frame(&header, &fc);
    group.throughput(Throughput::Elements((header.width * header.height) as u64));

    for &threads in &[1usize, 2, 4] {
        let mut decoder = Vp9TileDecoder::new(DecoderConfig {
            max_threads: threads,
        })
        .unwrap();
        let mut frame = FrameBuffer::for_header(&header);

        group.bench_with_input(BenchmarkId::new("threads", threads), &threads, |b, _| {
            b.iter(|| {
                let output = decoder
                    .decode_tiles(&FrameInput::new(&header, &fc), black_box(&data), &mut frame)
                    .unwrap();
                black_box(output.end_offset)
            });
        });
    }

    group.finish();
}

/// Benchmark reading bools from the range decoder
fn bench_range_decoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("vp9_range_decoder");
    let symbols = 100_000;

    let mut enc = RangeEncoder::new();
    for i in 0..symbols {
        enc.write_bool(i % 7 == 0, 200);
    }
    let data = enc.finish();
    group.throughput(Throughput::Elements(symbols as u64));

    group.bench_function("read_bool", |b| {
        b.iter(|| {
            let mut r = RangeDecoder::new(black_box(&data)).unwrap();
            let mut ones = 0u32;
            for _ in 0..symbols {
                ones += r.read_bool(200) as u32;
            }
            black_box(ones)
        });
    });

    group.finish();
}

/// Benchmark inverse transforms of dense blocks
fn bench_inverse_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("vp9_inverse_transform");

    for &tx_size in &[TxSize::Tx4x4, TxSize::Tx8x8, TxSize::Tx16x16, TxSize::Tx32x32] {
        let n = 4 << tx_size as usize;
        let coeffs: Vec<i32> = (0..n * n).map(|i| ((i * 37) % 61) as i32 - 30).collect();
        let mut dest = vec![128u16; n * n];

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", n, n)),
            &tx_size,
            |b, &tx_size| {
                b.iter(|| {
                    inverse_transform_add(
                        black_box(&coeffs),
                        &mut dest,
                        n,
                        tx_size,
                        TxType::DctDct,
                        n * n,
                        false,
                        8,
                    );
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_decode,
    bench_range_decoder,
    bench_inverse_transform
);
criterion_main!(benches);
