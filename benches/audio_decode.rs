//! Benchmarks for the audio decode path
//!
//! Measures packet handling overhead around the decoder:
//! - Decode into the fixed PCM buffer and forward to the renderer
//! - Codec session creation and teardown for stereo and 5.1 layouts
//!
//! Platform: Cross-platform (scripted decoder, CI-safe)

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use moonlight_interop::test_utils::ScriptedDecoderFactory;
use moonlight_interop::{
    AudioConfiguration, AudioPipeline, AudioRenderer, CodecSession, MultistreamDecoder,
    OpusMultistreamConfig, Result,
};
use std::hint::black_box;

/// Decoder that always produces a full frame of silence.
struct FullFrameDecoder;

impl MultistreamDecoder for FullFrameDecoder {
    fn decode(&mut self, _packet: &[u8], pcm: &mut [i16], frame_size: usize) -> i32 {
        pcm.fill(0);
        frame_size as i32
    }
}

/// Renderer that consumes PCM without storing it.
struct DiscardingRenderer;

impl AudioRenderer for DiscardingRenderer {
    fn initialize(&mut self, _: AudioConfiguration) -> i32 {
        0
    }
    fn start(&mut self) {}
    fn stop(&mut self) {}
    fn cleanup(&mut self) {}
    fn handle_frame(&mut self, pcm: &[u8]) {
        black_box(pcm);
    }
}

fn bench_decode_and_play(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_and_play");

    for (name, configuration, opus) in [
        ("stereo", AudioConfiguration::Stereo, OpusMultistreamConfig::stereo()),
        ("surround51", AudioConfiguration::Surround51, OpusMultistreamConfig::surround51()),
    ] {
        let factory = |_: &OpusMultistreamConfig| -> Result<Box<dyn MultistreamDecoder>> {
            Ok(Box::new(FullFrameDecoder))
        };
        let mut pipeline = AudioPipeline::new(Box::new(DiscardingRenderer), Box::new(factory));
        if let Err(e) = pipeline.init(configuration, &opus, 0) {
            panic!("Failed to initialize {name} pipeline: {e}");
        }

        let packet = [0xFCu8; 120];
        group.throughput(Throughput::Bytes(pipeline.pcm_buffer_len().unwrap_or(0) as u64));
        group.bench_function(name, |b| {
            b.iter(|| black_box(pipeline.decode_and_play_sample(black_box(&packet))))
        });
    }

    group.finish();
}

fn bench_codec_session_lifecycle(c: &mut Criterion) {
    let factory = ScriptedDecoderFactory::new(Vec::new());
    let config = OpusMultistreamConfig::surround51();

    c.bench_function("codec_session_create_destroy", |b| {
        let mut session = CodecSession::new();
        b.iter(|| {
            let created = session.create(&factory, black_box(&config));
            session.destroy();
            black_box(created)
        })
    });
}

criterion_group!(benches, bench_decode_and_play, bench_codec_session_lifecycle);
criterion_main!(benches);
