// Decode module - container probing and PCM decoding via symphonia
//
// Decodes at whatever sample rate the stream carries; nothing is resampled.
// Multi-channel audio is mixed down to mono by averaging each frame.

use std::fs::File;
use std::io::{Cursor, ErrorKind};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::{AudioSource, Waveform};
use crate::error::ExtractionError;

/// Decode an audio source into a mono waveform at its native sample rate
pub fn decode(source: &AudioSource) -> Result<Waveform, ExtractionError> {
    let label = source.describe();
    let media = open(source)?;

    let mut hint = Hint::new();
    if let Some(ext) = source.extension_hint() {
        hint.with_extension(&ext);
    }

    let stream = MediaSourceStream::new(media, Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| decode_error(&label, err))?;
    let mut format = probed.format;

    let (track_id, codec_params) = {
        let track = format
            .tracks()
            .iter()
            .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| ExtractionError::Decode {
                reason: format!("{}: no audio track found", label),
            })?;
        (track.id, track.codec_params.clone())
    };

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|err| match err {
            SymphoniaError::Unsupported(what) => ExtractionError::UnsupportedCodec {
                reason: format!("{}: {}", label, what),
            },
            other => decode_error(&label, other),
        })?;

    let mut sample_rate = codec_params.sample_rate;
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut mono = Vec::new();
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err)) if err.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(decode_error(&label, err)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(_)) | Err(SymphoniaError::IoError(_)) => {
                skipped_packets += 1;
                continue;
            }
            Err(err) => return Err(decode_error(&label, err)),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        sample_rate.get_or_insert(spec.rate);

        let required = decoded.capacity() * channels;
        if sample_buf
            .as_ref()
            .map(|buf| buf.capacity() < required)
            .unwrap_or(true)
        {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }

        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            mono.extend(downmix(buf.samples(), channels));
        }
    }

    if skipped_packets > 0 {
        tracing::debug!(
            "[Decode] {}: skipped {} undecodable packets",
            label,
            skipped_packets
        );
    }

    let sample_rate = sample_rate.ok_or_else(|| ExtractionError::Decode {
        reason: format!("{}: stream does not declare a sample rate", label),
    })?;

    tracing::debug!(
        "[Decode] {}: {} mono samples at {} Hz",
        label,
        mono.len(),
        sample_rate
    );

    Waveform::new(mono, sample_rate)
}

/// Average interleaved frames down to a single channel
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn open(source: &AudioSource) -> Result<Box<dyn MediaSource>, ExtractionError> {
    match source {
        AudioSource::Path(path) => {
            let file = File::open(path).map_err(|err| ExtractionError::SourceUnreadable {
                source: path.display().to_string(),
                reason: err.to_string(),
            })?;
            Ok(Box::new(file))
        }
        AudioSource::Bytes { data, .. } => Ok(Box::new(Cursor::new(data.clone()))),
    }
}

fn decode_error(label: &str, err: SymphoniaError) -> ExtractionError {
    ExtractionError::Decode {
        reason: format!("{}: {}", label, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{wav_bytes, SyntheticPattern, SyntheticSpec};

    #[test]
    fn test_downmix_averages_channels() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix(&stereo, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_downmix_mono_is_identity() {
        let mono = [0.1, -0.2, 0.3];
        assert_eq!(downmix(&mono, 1), mono.to_vec());
    }

    #[test]
    fn test_decode_wav_bytes_keeps_native_rate() {
        let spec = SyntheticSpec::new(SyntheticPattern::Sine, 440.0);
        let bytes = wav_bytes(&spec.render(16_000, 0.25), 16_000, 1).unwrap();

        let waveform = decode(&AudioSource::bytes(bytes, Some("wav"))).unwrap();
        assert_eq!(waveform.sample_rate(), 16_000);
        assert_eq!(waveform.samples().len(), 4_000);
    }

    #[test]
    fn test_decode_stereo_wav_mixes_to_mono() {
        let frames = 1_000;
        let mut interleaved = Vec::with_capacity(frames * 2);
        for _ in 0..frames {
            interleaved.push(0.5);
            interleaved.push(-0.5);
        }
        let bytes = wav_bytes(&interleaved, 8_000, 2).unwrap();

        let waveform = decode(&AudioSource::bytes(bytes, Some("wav"))).unwrap();
        assert_eq!(waveform.samples().len(), frames);
        assert!(waveform.samples().iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let garbage: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 251) as u8).collect();
        let result = decode(&AudioSource::bytes(garbage, Some("wav")));
        assert!(matches!(result, Err(ExtractionError::Decode { .. })));
    }

    #[test]
    fn test_decode_missing_file_is_unreadable() {
        let result = decode(&AudioSource::path("/nonexistent/clip.ogg"));
        assert!(matches!(
            result,
            Err(ExtractionError::SourceUnreadable { .. })
        ));
    }
}
