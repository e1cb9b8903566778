//! Per-family tuning parameters and the flags they map to
//!
//! Values are forwarded exactly as given. Range checks belong to whoever
//! collects the values; the separation executable validates what it receives.

use super::family::BackendFamily;
use crate::error::Result;
use crate::types::OutputFormat;
use serde::{Deserialize, Serialize};

/// Tuning values for one job, tagged by family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "kebab-case")]
pub enum FamilyParams {
    Roformer {
        overlap: u32,
        segment_size: u32,
    },
    Mdxc {
        segment_size: u32,
        overlap: u32,
        denoise: bool,
    },
    MdxNet {
        segment_size: u32,
        overlap: f64,
        denoise: bool,
    },
    VrArch {
        window_size: u32,
        aggression: i32,
        tta: bool,
        high_end_process: bool,
    },
    Demucs {
        shifts: u32,
        overlap: f64,
    },
}

impl FamilyParams {
    pub fn family(&self) -> BackendFamily {
        match self {
            FamilyParams::Roformer { .. } => BackendFamily::Roformer,
            FamilyParams::Mdxc { .. } => BackendFamily::Mdxc,
            FamilyParams::MdxNet { .. } => BackendFamily::MdxNet,
            FamilyParams::VrArch { .. } => BackendFamily::VrArch,
            FamilyParams::Demucs { .. } => BackendFamily::Demucs,
        }
    }

    /// Family-specific flags, in the order the executable documents them
    ///
    /// Toggles that are off are left out entirely rather than passed as false.
    pub fn to_flags(&self) -> Vec<String> {
        match self {
            FamilyParams::Roformer {
                overlap,
                segment_size,
            } => vec![
                format!("--mdxc_overlap={}", overlap),
                format!("--mdxc_segment_size={}", segment_size),
            ],
            FamilyParams::Mdxc {
                segment_size,
                overlap,
                denoise,
            } => {
                let mut flags = vec![
                    format!("--mdxc_segment_size={}", segment_size),
                    format!("--mdxc_overlap={}", overlap),
                ];
                if *denoise {
                    flags.push("--mdx_enable_denoise".to_string());
                }
                flags
            }
            FamilyParams::MdxNet {
                segment_size,
                overlap,
                denoise,
            } => {
                let mut flags = vec![
                    format!("--mdx_segment_size={}", segment_size),
                    format!("--mdx_overlap={}", overlap),
                ];
                if *denoise {
                    flags.push("--mdx_enable_denoise".to_string());
                }
                flags
            }
            FamilyParams::VrArch {
                window_size,
                aggression,
                tta,
                high_end_process,
            } => {
                let mut flags = vec![
                    format!("--vr_window_size={}", window_size),
                    format!("--vr_aggression={}", aggression),
                ];
                if *tta {
                    flags.push("--vr_enable_tta".to_string());
                }
                if *high_end_process {
                    flags.push("--vr_high_end_process".to_string());
                }
                flags
            }
            FamilyParams::Demucs { shifts, overlap } => vec![
                format!("--demucs_shifts={}", shifts),
                format!("--demucs_overlap={}", overlap),
            ],
        }
    }
}

/// Everything needed to run one separation, before any file is touched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparationRequest {
    /// Model as selected by the user (alias for Roformer)
    pub model: String,
    pub output_format: OutputFormat,
    pub params: FamilyParams,
}

impl SeparationRequest {
    pub fn new(model: impl Into<String>, output_format: OutputFormat, params: FamilyParams) -> Self {
        Self {
            model: model.into(),
            output_format,
            params,
        }
    }

    pub fn family(&self) -> BackendFamily {
        self.params.family()
    }

    /// Validate the request and produce the model filename and flag list
    pub fn build(&self) -> Result<BuiltParams> {
        let model = self.family().resolve_model(&self.model)?;
        Ok(BuiltParams {
            model,
            output_format: self.output_format,
            flags: self.params.to_flags(),
        })
    }
}

/// A validated request, ready to hand to the separation backend
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltParams {
    /// Model filename understood by the executable
    pub model: String,
    pub output_format: OutputFormat,
    pub flags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roformer_flags() {
        let params = FamilyParams::Roformer {
            overlap: 4,
            segment_size: 256,
        };
        assert_eq!(
            params.to_flags(),
            vec!["--mdxc_overlap=4", "--mdxc_segment_size=256"]
        );
    }

    #[test]
    fn test_mdxc_denoise_conditional() {
        let on = FamilyParams::Mdxc {
            segment_size: 256,
            overlap: 8,
            denoise: true,
        };
        assert_eq!(
            on.to_flags(),
            vec!["--mdxc_segment_size=256", "--mdxc_overlap=8", "--mdx_enable_denoise"]
        );

        let off = FamilyParams::Mdxc {
            segment_size: 256,
            overlap: 8,
            denoise: false,
        };
        assert_eq!(off.to_flags(), vec!["--mdxc_segment_size=256", "--mdxc_overlap=8"]);
    }

    #[test]
    fn test_mdxnet_uses_own_flag_names() {
        let params = FamilyParams::MdxNet {
            segment_size: 512,
            overlap: 0.25,
            denoise: false,
        };
        assert_eq!(params.to_flags(), vec!["--mdx_segment_size=512", "--mdx_overlap=0.25"]);
    }

    #[test]
    fn test_vr_arch_toggles() {
        let base = |tta, high_end_process| FamilyParams::VrArch {
            window_size: 320,
            aggression: 5,
            tta,
            high_end_process,
        };
        assert_eq!(
            base(false, false).to_flags(),
            vec!["--vr_window_size=320", "--vr_aggression=5"]
        );
        assert_eq!(
            base(true, false).to_flags(),
            vec!["--vr_window_size=320", "--vr_aggression=5", "--vr_enable_tta"]
        );
        assert_eq!(
            base(false, true).to_flags(),
            vec!["--vr_window_size=320", "--vr_aggression=5", "--vr_high_end_process"]
        );
        assert_eq!(base(true, true).to_flags().len(), 4);
    }

    #[test]
    fn test_demucs_flags() {
        let params = FamilyParams::Demucs {
            shifts: 2,
            overlap: 0.75,
        };
        assert_eq!(params.to_flags(), vec!["--demucs_shifts=2", "--demucs_overlap=0.75"]);
    }

    #[test]
    fn test_out_of_range_values_forwarded() {
        let params = FamilyParams::VrArch {
            window_size: 7,
            aggression: -300,
            tta: false,
            high_end_process: false,
        };
        assert_eq!(
            params.to_flags(),
            vec!["--vr_window_size=7", "--vr_aggression=-300"]
        );
    }

    #[test]
    fn test_build_resolves_roformer_alias() {
        let request = SeparationRequest::new(
            "BS-Roformer-Viperx-1297.ckpt",
            OutputFormat::Flac,
            FamilyParams::Roformer {
                overlap: 2,
                segment_size: 32,
            },
        );
        let built = request.build().unwrap();
        assert_eq!(built.model, "model_bs_roformer_ep_317_sdr_12.9755.ckpt");
        assert_eq!(built.output_format, OutputFormat::Flac);
        assert_eq!(built.flags.len(), 2);
    }

    #[test]
    fn test_build_rejects_unknown_alias() {
        let request = SeparationRequest::new(
            "not-a-roformer",
            OutputFormat::Wav,
            FamilyParams::Roformer {
                overlap: 4,
                segment_size: 256,
            },
        );
        assert!(request.build().unwrap_err().is_validation());
    }
}
