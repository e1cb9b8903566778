//! Single-job separation pipeline
//!
//! Validate the request, stage the waveform under a fresh identity, run the
//! backend once, then discover the stems by identity. Every failure comes back
//! as a [`JobOutcome::Failed`] message instead of an error.

use super::backend::{Invocation, SeparatorBackend, DEFAULT_NORMALIZATION};
use super::collector::collect_outputs;
use super::params::{FamilyParams, SeparationRequest};
use crate::audio;
use crate::error::{Result, StemsplitError};
use crate::naming::JobId;
use crate::types::{AudioBuffer, JobOutcome, OutputFormat};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs separation jobs against one output directory
///
/// Stateless between calls: the only thing jobs share is the output
/// directory, and identities keep their artifacts apart.
#[derive(Clone)]
pub struct JobRunner {
    backend: Arc<dyn SeparatorBackend>,
    output_dir: PathBuf,
    normalization: String,
}

impl JobRunner {
    pub fn new(backend: Arc<dyn SeparatorBackend>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            output_dir: output_dir.into(),
            normalization: DEFAULT_NORMALIZATION.to_string(),
        }
    }

    pub fn with_normalization(mut self, normalization: impl Into<String>) -> Self {
        self.normalization = normalization.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn normalization(&self) -> &str {
        &self.normalization
    }

    pub fn backend(&self) -> &Arc<dyn SeparatorBackend> {
        &self.backend
    }

    /// Run one job and return at most the family's expected number of stems
    pub fn run(&self, audio: &AudioBuffer, request: &SeparationRequest) -> JobOutcome {
        match self.try_run(audio, request) {
            Ok(mut stems) => {
                let expected = request.family().expected_stems();
                if stems.len() < expected {
                    warn!(
                        "{} job produced {} of {} expected stems",
                        request.family(),
                        stems.len(),
                        expected
                    );
                }
                stems.truncate(expected);
                JobOutcome::Stems { paths: stems }
            }
            Err(e) => {
                if e.is_validation() {
                    warn!("Rejected {} job: {}", request.family(), e);
                } else {
                    warn!("{} job failed: {}", request.family(), e);
                }
                JobOutcome::failed(e.to_string())
            }
        }
    }

    fn try_run(&self, audio: &AudioBuffer, request: &SeparationRequest) -> Result<Vec<PathBuf>> {
        // Validation happens before anything touches the disk
        let built = request.build()?;

        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| StemsplitError::output_error(&self.output_dir, e))?;

        let id = JobId::generate_unique(&self.output_dir);
        let staged = self.output_dir.join(id.staging_file_name());
        audio::write_wav(&staged, audio)?;
        debug!("Job {} staged at {}", id, staged.display());

        let invocation = Invocation {
            input: staged,
            model: built.model,
            output_dir: self.output_dir.clone(),
            output_format: built.output_format,
            normalization: self.normalization.clone(),
            flags: built.flags,
        };

        info!(
            "Job {}: {} with {} via {}",
            id,
            request.family(),
            invocation.model,
            self.backend.name()
        );
        self.backend.run(&invocation)?;

        collect_outputs(&self.output_dir, &id)
    }

    /// Roformer: `model_key` is an alias from the Roformer table
    pub fn roformer(
        &self,
        audio: &AudioBuffer,
        model_key: &str,
        output_format: OutputFormat,
        overlap: u32,
        segment_size: u32,
    ) -> JobOutcome {
        let request = SeparationRequest::new(
            model_key,
            output_format,
            FamilyParams::Roformer {
                overlap,
                segment_size,
            },
        );
        self.run(audio, &request)
    }

    pub fn mdxc(
        &self,
        audio: &AudioBuffer,
        model: &str,
        output_format: OutputFormat,
        segment_size: u32,
        overlap: u32,
        denoise: bool,
    ) -> JobOutcome {
        let request = SeparationRequest::new(
            model,
            output_format,
            FamilyParams::Mdxc {
                segment_size,
                overlap,
                denoise,
            },
        );
        self.run(audio, &request)
    }

    pub fn mdxnet(
        &self,
        audio: &AudioBuffer,
        model: &str,
        output_format: OutputFormat,
        segment_size: u32,
        overlap: f64,
        denoise: bool,
    ) -> JobOutcome {
        let request = SeparationRequest::new(
            model,
            output_format,
            FamilyParams::MdxNet {
                segment_size,
                overlap,
                denoise,
            },
        );
        self.run(audio, &request)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn vr_arch(
        &self,
        audio: &AudioBuffer,
        model: &str,
        output_format: OutputFormat,
        window_size: u32,
        aggression: i32,
        tta: bool,
        high_end_process: bool,
    ) -> JobOutcome {
        let request = SeparationRequest::new(
            model,
            output_format,
            FamilyParams::VrArch {
                window_size,
                aggression,
                tta,
                high_end_process,
            },
        );
        self.run(audio, &request)
    }

    /// Demucs returns up to four stems
    pub fn demucs(
        &self,
        audio: &AudioBuffer,
        model: &str,
        output_format: OutputFormat,
        shifts: u32,
        overlap: f64,
    ) -> JobOutcome {
        let request = SeparationRequest::new(
            model,
            output_format,
            FamilyParams::Demucs { shifts, overlap },
        );
        self.run(audio, &request)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::FakeBackend;
    use super::*;
    use tempfile::TempDir;

    fn tone() -> AudioBuffer {
        AudioBuffer::new(44100, 2, vec![0, 0, 100, -100, 200, -200])
    }

    #[test]
    fn test_roformer_two_stems() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FakeBackend::producing(vec!["Vocals", "Instrumental"]));
        let runner = JobRunner::new(backend.clone(), dir.path());

        let outcome = runner.roformer(&tone(), "BS-Roformer-Viperx-1297.ckpt", OutputFormat::Wav, 4, 256);
        let stems = outcome.stems();
        assert_eq!(stems.len(), 2);
        assert!(stems[0].to_string_lossy().contains("(Instrumental)"));
        assert!(stems[1].to_string_lossy().contains("(Vocals)"));

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls[0].model, "model_bs_roformer_ep_317_sdr_12.9755.ckpt");
        assert_eq!(calls[0].normalization, "0.9");
        assert_eq!(calls[0].flags, vec!["--mdxc_overlap=4", "--mdxc_segment_size=256"]);
        assert!(calls[0].input.exists(), "staged input should be on disk");
    }

    #[test]
    fn test_unknown_alias_never_invokes_backend() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FakeBackend::producing(vec!["Vocals"]));
        let runner = JobRunner::new(backend.clone(), dir.path());

        let outcome = runner.roformer(&tone(), "Made-Up-Roformer", OutputFormat::Wav, 4, 256);
        match outcome {
            JobOutcome::Failed { message } => assert!(message.contains("Made-Up-Roformer")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(backend.call_count(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0, "nothing staged");
    }

    #[test]
    fn test_backend_failure_is_single_diagnostic() {
        let dir = TempDir::new().unwrap();
        let runner = JobRunner::new(Arc::new(FakeBackend::failing()), dir.path());

        let outcome = runner.mdxc(&tone(), "MDX23C_D1581.ckpt", OutputFormat::Flac, 256, 8, true);
        match outcome {
            JobOutcome::Failed { message } => {
                assert!(message.contains("exited with exit status: 1"));
                assert!(message.contains("fake failure"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_truncates_to_expected_stems() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FakeBackend::producing(vec!["A", "B", "C"]));
        let runner = JobRunner::new(backend, dir.path());

        let outcome = runner.vr_arch(&tone(), "1_HP-UVR.pth", OutputFormat::Wav, 320, 5, true, false);
        assert_eq!(outcome.stems().len(), 2);
    }

    #[test]
    fn test_demucs_four_and_partial() {
        let dir = TempDir::new().unwrap();
        let runner = JobRunner::new(
            Arc::new(FakeBackend::producing(vec!["Vocals", "Drums", "Bass", "Other"])),
            dir.path(),
        );
        let outcome = runner.demucs(&tone(), "htdemucs.yaml", OutputFormat::Wav, 2, 0.25);
        let names: Vec<String> = outcome
            .stems()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 4);
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);

        let partial = JobRunner::new(Arc::new(FakeBackend::producing(vec!["Vocals", "Drums"])), dir.path());
        let outcome = partial.demucs(&tone(), "htdemucs.yaml", OutputFormat::Wav, 2, 0.25);
        assert!(!outcome.is_failed());
        assert_eq!(outcome.stems().len(), 2);
    }

    #[test]
    fn test_jobs_do_not_see_each_other() {
        let dir = TempDir::new().unwrap();
        let runner = JobRunner::new(Arc::new(FakeBackend::producing(vec!["Vocals", "Instrumental"])), dir.path());

        let first = runner.mdxnet(&tone(), "Kim_Vocal_2.onnx", OutputFormat::Wav, 256, 0.25, false);
        let second = runner.mdxnet(&tone(), "Kim_Vocal_2.onnx", OutputFormat::Wav, 256, 0.25, false);
        assert_eq!(first.stems().len(), 2);
        assert_eq!(second.stems().len(), 2);
        for path in second.stems() {
            assert!(!first.stems().contains(path));
        }
    }

    #[test]
    fn test_custom_normalization_forwarded() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FakeBackend::producing(vec!["Vocals"]));
        let runner = JobRunner::new(backend.clone(), dir.path()).with_normalization("0.5");
        runner.demucs(&tone(), "htdemucs.yaml", OutputFormat::Wav, 1, 0.5);
        assert_eq!(backend.calls.lock().unwrap()[0].normalization, "0.5");
    }
}
