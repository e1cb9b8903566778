//! Audio decoding using symphonia
//!
//! Decodes audio files to interleaved 16-bit PCM at the source sample rate and
//! channel layout. No resampling happens here: the separation backend does its
//! own, and the staged file should carry exactly what the caller handed in.

use crate::error::{Result, StemsplitError};
use crate::types::{AudioBuffer, AudioFormat};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, trace};

/// Maximum file size we'll attempt to decode (2GB)
/// Prevents OOM on extremely large files
const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Decode an audio file to an interleaved i16 AudioBuffer
pub fn decode(path: &Path) -> Result<AudioBuffer> {
    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StemsplitError::FileNotFound(path.to_path_buf()),
        _ => StemsplitError::decode_error(path, format!("Failed to read file metadata: {}", e)),
    })?;

    if metadata.len() > MAX_FILE_SIZE {
        return Err(StemsplitError::decode_error(
            path,
            format!(
                "File too large ({:.1} GB). Maximum supported size is 2 GB.",
                metadata.len() as f64 / (1024.0 * 1024.0 * 1024.0)
            ),
        ));
    }

    if !AudioFormat::is_supported_path(path) {
        return Err(StemsplitError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: path
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_else(|| "no extension".to_string()),
        });
    }

    let file = std::fs::File::open(path)
        .map_err(|e| StemsplitError::decode_error(path, format!("Failed to open file: {}", e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Provide a hint based on file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| StemsplitError::decode_error(path, format!("Failed to probe format: {}", e)))?;

    let mut format = probed.format;

    // Find the first audio track
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| StemsplitError::decode_error(path, "No audio tracks found"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut sample_rate = codec_params.sample_rate.unwrap_or(44100);
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);

    debug!(
        "Decoding: {} @ {}Hz, {} channels",
        path.display(),
        sample_rate,
        channels
    );

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| StemsplitError::decode_error(path, format!("Failed to create decoder: {}", e)))?;

    let mut all_samples: Vec<i16> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break; // End of stream
            }
            Err(e) => {
                return Err(StemsplitError::decode_error(
                    path,
                    format!("Failed to read packet: {}", e),
                ));
            }
        };

        // Skip packets from other tracks
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                // Skip corrupted frames
                trace!("Skipping corrupted frame: {}", e);
                continue;
            }
            Err(e) => {
                return Err(StemsplitError::decode_error(path, format!("Decode error: {}", e)));
            }
        };

        // The decoded spec is authoritative when the container omitted it
        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count();

        let mut sample_buf = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        all_samples.extend_from_slice(sample_buf.samples());
    }

    let channels = u16::try_from(channels)
        .map_err(|_| StemsplitError::decode_error(path, format!("Unsupported channel count {}", channels)))?;

    let buffer = AudioBuffer::new(sample_rate, channels, all_samples);
    if buffer.is_empty() {
        return Err(StemsplitError::decode_error(path, "File contains no audio samples"));
    }

    debug!(
        "Decoded {} frames ({:.2}s)",
        buffer.frames(),
        buffer.duration()
    );

    Ok(buffer)
}
