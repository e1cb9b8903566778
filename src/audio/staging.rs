//! Writing in-memory audio to disk so an external process can read it

use crate::error::{Result, StemsplitError};
use crate::types::AudioBuffer;
use std::path::Path;
use tracing::debug;

/// Write a buffer as a 16-bit PCM WAV file
pub fn write_wav(path: &Path, audio: &AudioBuffer) -> Result<()> {
    if audio.channels == 0 || audio.sample_rate == 0 {
        return Err(StemsplitError::StagingError {
            path: path.to_path_buf(),
            reason: format!(
                "Invalid audio layout ({} channels @ {}Hz)",
                audio.channels, audio.sample_rate
            ),
        });
    }

    let spec = hound::WavSpec {
        channels: audio.channels,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let staging_error = |e: hound::Error| StemsplitError::StagingError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(staging_error)?;
    for sample in &audio.samples {
        writer.write_sample(*sample).map_err(staging_error)?;
    }
    writer.finalize().map_err(staging_error)?;

    debug!(
        "Staged {} frames to {}",
        audio.frames(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_wav_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("staged.wav");
        let audio = AudioBuffer::new(48000, 2, vec![1, -1, 2, -2, 3, -3]);
        write_wav(&path, &audio).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 48000);
        assert_eq!(spec.bits_per_sample, 16);
        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, audio.samples);
    }

    #[test]
    fn test_write_wav_rejects_zero_channels() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.wav");
        let audio = AudioBuffer::new(44100, 0, vec![]);
        assert!(matches!(
            write_wav(&path, &audio),
            Err(StemsplitError::StagingError { .. })
        ));
    }
}
