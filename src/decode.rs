//! Default audio decoder: container bytes → mono 16 kHz `f32` PCM.
//!
//! This is the one CPU-heavy collaborator the crate ships itself. It uses
//! Symphonia to probe and decode whatever container/codec the voice
//! attachment arrived in, downmixes to mono, and resamples with rubato when
//! the source rate differs from the recognizer's expected rate.
//!
//! Error handling policy for the decode loop:
//! - corrupt frames (`DecodeError`) are skipped — common with some codecs
//! - IO errors are treated as end-of-stream (the input is a finite buffer)
//! - anything else is fatal and surfaces as [`Error::Decode`]

use std::io::Cursor;

use async_trait::async_trait;
use rubato::{Resampler, SincFixedIn, WindowFunction};
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::engine::AudioDecoder;
use crate::error::{Error, Result};

/// The recognizer's expected mono sample rate (Hz).
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Source frames fed to rubato per `process()` call.
const RESAMPLE_BLOCK_FRAMES: usize = 2048;

/// Decodes in-memory audio bytes with Symphonia.
///
/// Decoding runs on the blocking thread pool so a large attachment never
/// stalls the async executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioDecoder for SymphoniaDecoder {
    async fn decode(&self, bytes: Vec<u8>) -> Result<Vec<f32>> {
        tokio::task::spawn_blocking(move || decode_bytes(bytes))
            .await
            .map_err(|_| Error::Decode("decode task panicked".to_owned()))?
    }
}

/// Decode a complete byte buffer into mono PCM at [`TARGET_SAMPLE_RATE`].
pub fn decode_bytes(bytes: Vec<u8>) -> Result<Vec<f32>> {
    let mss_opts = MediaSourceStreamOptions {
        // Symphonia expects a power-of-two buffer > 32KiB for good probing behavior.
        buffer_len: 256 * 1024,
    };
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), mss_opts);

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| Error::Decode(format!("failed to probe audio container: {err}")))?;
    let mut format = probed.format;

    // Track selection policy: first track that looks decodable and has a
    // known sample rate (required for resampling decisions).
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
        .cloned()
        .ok_or_else(|| Error::Decode("no decodable audio track found".to_owned()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|err| Error::Decode(format!("failed to create decoder: {err}")))?;

    let mut pipeline = PcmPipeline::new();
    let mut out = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(_)) => break,
            Err(err) => return Err(Error::Decode(format!("failed reading packet: {err}"))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => pipeline.push_decoded(&decoded, &mut out)?,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(SymphoniaError::IoError(_)) => break,
            Err(err) => return Err(Error::Decode(format!("decoder failure: {err}"))),
        }
    }

    pipeline.finish(&mut out)?;

    if out.is_empty() {
        return Err(Error::Decode("input contained no decodable audio".to_owned()));
    }
    Ok(out)
}

/// A small stateful pipeline that turns decoded Symphonia buffers into mono
/// samples at [`TARGET_SAMPLE_RATE`].
struct PcmPipeline {
    // Scratch buffer for interleaved f32 copies of decoded packets.
    sample_buf: Option<SampleBuffer<f32>>,

    // Lazily initialized; only needed when the source rate differs from the target.
    resampler: Option<SincFixedIn<f32>>,

    // Mono source samples awaiting a full resampler input block.
    pending: Vec<f32>,
}

impl PcmPipeline {
    fn new() -> Self {
        Self {
            sample_buf: None,
            resampler: None,
            pending: Vec::new(),
        }
    }

    /// Push one decoded buffer; append mono target-rate samples to `out`.
    fn push_decoded(&mut self, decoded: &AudioBufferRef<'_>, out: &mut Vec<f32>) -> Result<()> {
        let spec = *decoded.spec();
        let channels = spec.channels.count();
        if channels == 0 {
            return Err(Error::Decode("decoded audio had zero channels".to_owned()));
        }

        if self.sample_buf.is_none() {
            let capacity = decoded.capacity() as u64;
            self.sample_buf = Some(SampleBuffer::<f32>::new(capacity, spec));
        }
        let Some(sample_buf) = self.sample_buf.as_mut() else {
            return Err(Error::Decode("sample buffer not initialized".to_owned()));
        };
        sample_buf.copy_interleaved_ref(decoded.clone());

        let mono = downmix_to_mono(sample_buf.samples(), channels);

        // Fast path: already at the target sample rate.
        if spec.rate == TARGET_SAMPLE_RATE {
            out.extend_from_slice(&mono);
            return Ok(());
        }

        self.ensure_resampler(spec.rate)?;
        self.pending.extend_from_slice(&mono);
        self.drain_full_blocks(out)
    }

    /// Flush whatever is still buffered at end-of-stream.
    ///
    /// No-op when resampling was never needed. rubato only accepts exact
    /// block sizes, so the trailing remainder is zero-padded.
    fn finish(&mut self, out: &mut Vec<f32>) -> Result<()> {
        if self.resampler.is_none() || self.pending.is_empty() {
            return Ok(());
        }

        let rem = self.pending.len() % RESAMPLE_BLOCK_FRAMES;
        if rem != 0 {
            self.pending
                .resize(self.pending.len() + (RESAMPLE_BLOCK_FRAMES - rem), 0.0);
        }
        self.drain_full_blocks(out)
    }

    fn ensure_resampler(&mut self, src_rate: u32) -> Result<()> {
        if self.resampler.is_some() {
            return Ok(());
        }

        let resampler = SincFixedIn::<f32>::new(
            TARGET_SAMPLE_RATE as f64 / src_rate as f64,
            2.0,
            rubato::SincInterpolationParameters {
                sinc_len: 256,
                f_cutoff: 0.95,
                interpolation: rubato::SincInterpolationType::Linear,
                oversampling_factor: 256,
                window: WindowFunction::BlackmanHarris2,
            },
            RESAMPLE_BLOCK_FRAMES,
            1, // mono
        )
        .map_err(|err| Error::Decode(format!("failed to init resampler: {err}")))?;

        self.resampler = Some(resampler);
        Ok(())
    }

    fn drain_full_blocks(&mut self, out: &mut Vec<f32>) -> Result<()> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Err(Error::Decode("resampler not initialized".to_owned()));
        };

        while self.pending.len() >= RESAMPLE_BLOCK_FRAMES {
            let block: Vec<f32> = self.pending.drain(..RESAMPLE_BLOCK_FRAMES).collect();
            let mut resampled = resampler
                .process(&[block], None)
                .map_err(|err| Error::Decode(format!("resampler process failed: {err}")))?;

            if resampled.len() != 1 {
                return Err(Error::Decode("expected mono output from resampler".to_owned()));
            }
            out.append(&mut resampled[0]);
        }

        Ok(())
    }
}

/// Downmix interleaved samples into mono by averaging channels.
fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }

    let frames = interleaved.len() / channels;
    let mut mono = Vec::with_capacity(frames);
    for frame in 0..frames {
        let base = frame * channels;
        let sum: f32 = interleaved[base..base + channels].iter().sum();
        mono.push(sum / channels as f32);
    }
    mono
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal PCM16 mono WAV file in memory.
    fn wav_bytes(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut bytes = Vec::with_capacity(44 + data_len as usize);

        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");

        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
        bytes.extend_from_slice(&2u16.to_le_bytes()); // block align
        bytes.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn downmix_single_channel_is_identity() {
        let input = vec![0.0, 1.0, -1.0];
        assert_eq!(downmix_to_mono(&input, 1), input);
    }

    #[test]
    fn downmix_averages_channels() {
        // Two frames of stereo: (L=1, R=3), (L=-1, R=1) => mono: 2, 0
        let interleaved = vec![1.0, 3.0, -1.0, 1.0];
        assert_eq!(downmix_to_mono(&interleaved, 2), vec![2.0, 0.0]);
    }

    #[test]
    fn finish_is_noop_without_resampler() -> anyhow::Result<()> {
        let mut pipeline = PcmPipeline::new();
        let mut out = Vec::new();
        pipeline.finish(&mut out)?;
        assert!(out.is_empty());
        Ok(())
    }

    #[test]
    fn decodes_wav_at_target_rate_without_resampling() -> anyhow::Result<()> {
        let samples: Vec<i16> = (0..1600)
            .map(|i| ((i as f32 * 0.05).sin() * 8192.0) as i16)
            .collect();
        let bytes = wav_bytes(TARGET_SAMPLE_RATE, &samples);

        let pcm = decode_bytes(bytes)?;
        assert_eq!(pcm.len(), samples.len());

        // Spot-check quantization round-trip on one obviously nonzero sample.
        let expected = samples[100] as f32 / 32768.0;
        assert!((pcm[100] - expected).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn resamples_non_target_rate_input() -> anyhow::Result<()> {
        let samples: Vec<i16> = (0..1600)
            .map(|i| ((i as f32 * 0.1).sin() * 8192.0) as i16)
            .collect();
        let bytes = wav_bytes(8_000, &samples);

        // 8 kHz → 16 kHz doubles the frame count; the final block is
        // zero-padded so the exact length depends on the resampler.
        let pcm = decode_bytes(bytes)?;
        assert!(pcm.len() > samples.len());
        Ok(())
    }

    #[test]
    fn garbage_input_is_a_decode_error() {
        let result = decode_bytes(vec![0u8; 64]);
        assert!(matches!(result, Err(Error::Decode(_))));
    }
}
