//! Separation backend families and their model catalogs
//!
//! Every family is served by the same external executable, but each one
//! expects its own tuning flags and yields its own number of stems.

use crate::error::{Result, StemsplitError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roformer display aliases and the checkpoint each one maps to
pub const ROFORMER_MODELS: &[(&str, &str)] = &[
    ("BS-Roformer-Viperx-1297.ckpt", "model_bs_roformer_ep_317_sdr_12.9755.ckpt"),
    ("BS-Roformer-Viperx-1296.ckpt", "model_bs_roformer_ep_368_sdr_12.9628.ckpt"),
    ("BS-Roformer-Viperx-1053.ckpt", "model_bs_roformer_ep_937_sdr_10.5309.ckpt"),
    ("Mel-Roformer-Viperx-1143.ckpt", "model_mel_band_roformer_ep_3005_sdr_11.4360.ckpt"),
    ("BS-Roformer-De-Reverb-Anvuew", "deverb_bs_roformer_8_384dim_10depth.ckpt"),
    ("Mel-Roformer-Crowd-Aufr33-Viperx", "mel_band_roformer_crowd_aufr33_viperx_sdr_8.7144.ckpt"),
    ("Mel-Roformer-Denoise-Aufr33", "denoise_mel_band_roformer_aufr33_sdr_27.9959.ckpt"),
    ("Mel-Roformer-Denoise-Aufr33-Aggr", "denoise_mel_band_roformer_aufr33_aggr_sdr_27.9768.ckpt"),
    ("Mel-Roformer-Karaoke-Aufr33-Viperx", "mel_band_roformer_karaoke_aufr33_viperx_sdr_10.1956.ckpt"),
];

pub const MDXC_MODELS: &[&str] = &[
    "MDX23C_D1581.ckpt",
    "MDX23C-8KFFT-InstVoc_HQ.ckpt",
    "MDX23C-8KFFT-InstVoc_HQ_2.ckpt",
];

pub const MDXNET_MODELS: &[&str] = &[
    "UVR-MDX-NET-Inst_full_292.onnx",
    "UVR-MDX-NET_Inst_187_beta.onnx",
    "UVR-MDX-NET_Inst_82_beta.onnx",
    "UVR-MDX-NET_Inst_90_beta.onnx",
    "UVR-MDX-NET_Main_340.onnx",
    "UVR-MDX-NET_Main_390.onnx",
    "UVR-MDX-NET_Main_406.onnx",
    "UVR-MDX-NET_Main_427.onnx",
    "UVR-MDX-NET_Main_438.onnx",
    "UVR-MDX-NET-Inst_HQ_1.onnx",
    "UVR-MDX-NET-Inst_HQ_2.onnx",
    "UVR-MDX-NET-Inst_HQ_3.onnx",
    "UVR-MDX-NET-Inst_HQ_4.onnx",
    "UVR_MDXNET_Main.onnx",
    "UVR-MDX-NET-Inst_Main.onnx",
    "UVR_MDXNET_1_9703.onnx",
    "UVR_MDXNET_2_9682.onnx",
    "UVR_MDXNET_3_9662.onnx",
    "UVR-MDX-NET-Inst_1.onnx",
    "UVR-MDX-NET-Inst_2.onnx",
    "UVR-MDX-NET-Inst_3.onnx",
    "UVR_MDXNET_KARA.onnx",
    "UVR_MDXNET_KARA_2.onnx",
    "UVR_MDXNET_9482.onnx",
    "UVR-MDX-NET-Voc_FT.onnx",
    "Kim_Vocal_1.onnx",
    "Kim_Vocal_2.onnx",
    "Kim_Inst.onnx",
    "Reverb_HQ_By_FoxJoy.onnx",
    "UVR-MDX-NET_Crowd_HQ_1.onnx",
    "kuielab_a_vocals.onnx",
    "kuielab_a_other.onnx",
    "kuielab_a_bass.onnx",
    "kuielab_a_drums.onnx",
    "kuielab_b_vocals.onnx",
    "kuielab_b_other.onnx",
    "kuielab_b_bass.onnx",
    "kuielab_b_drums.onnx",
];

pub const VRARCH_MODELS: &[&str] = &[
    "1_HP-UVR.pth",
    "2_HP-UVR.pth",
    "3_HP-Vocal-UVR.pth",
    "4_HP-Vocal-UVR.pth",
    "5_HP-Karaoke-UVR.pth",
    "6_HP-Karaoke-UVR.pth",
    "7_HP2-UVR.pth",
    "8_HP2-UVR.pth",
    "9_HP2-UVR.pth",
    "10_SP-UVR-2B-32000-1.pth",
    "11_SP-UVR-2B-32000-2.pth",
    "12_SP-UVR-3B-44100.pth",
    "13_SP-UVR-4B-44100-1.pth",
    "14_SP-UVR-4B-44100-2.pth",
    "15_SP-UVR-MID-44100-1.pth",
    "16_SP-UVR-MID-44100-2.pth",
    "17_HP-Wind_Inst-UVR.pth",
    "UVR-De-Echo-Aggressive.pth",
    "UVR-De-Echo-Normal.pth",
    "UVR-DeEcho-DeReverb.pth",
    "UVR-DeNoise-Lite.pth",
    "UVR-DeNoise.pth",
    "UVR-BVE-4B_SN-44100-1.pth",
    "MGM_HIGHEND_v4.pth",
    "MGM_LOWEND_A_v4.pth",
    "MGM_LOWEND_B_v4.pth",
    "MGM_MAIN_v4.pth",
];

pub const DEMUCS_MODELS: &[&str] = &["htdemucs_ft.yaml", "htdemucs.yaml", "hdemucs_mmi.yaml"];

/// The five supported separation approaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendFamily {
    Roformer,
    Mdxc,
    MdxNet,
    VrArch,
    Demucs,
}

impl BackendFamily {
    pub const ALL: [BackendFamily; 5] = [
        BackendFamily::Roformer,
        BackendFamily::Mdxc,
        BackendFamily::MdxNet,
        BackendFamily::VrArch,
        BackendFamily::Demucs,
    ];

    /// Human-readable family name
    pub fn name(self) -> &'static str {
        match self {
            BackendFamily::Roformer => "Roformer",
            BackendFamily::Mdxc => "MDXC",
            BackendFamily::MdxNet => "MDX-NET",
            BackendFamily::VrArch => "VR-Arch",
            BackendFamily::Demucs => "Demucs",
        }
    }

    /// Name used on the command line
    pub fn slug(self) -> &'static str {
        match self {
            BackendFamily::Roformer => "roformer",
            BackendFamily::Mdxc => "mdxc",
            BackendFamily::MdxNet => "mdxnet",
            BackendFamily::VrArch => "vr-arch",
            BackendFamily::Demucs => "demucs",
        }
    }

    /// Maximum number of stems a job of this family returns
    pub fn expected_stems(self) -> usize {
        match self {
            BackendFamily::Demucs => 4,
            _ => 2,
        }
    }

    /// Known model names, as a user would select them
    pub fn catalog(self) -> Vec<&'static str> {
        match self {
            BackendFamily::Roformer => ROFORMER_MODELS.iter().map(|(alias, _)| *alias).collect(),
            BackendFamily::Mdxc => MDXC_MODELS.to_vec(),
            BackendFamily::MdxNet => MDXNET_MODELS.to_vec(),
            BackendFamily::VrArch => VRARCH_MODELS.to_vec(),
            BackendFamily::Demucs => DEMUCS_MODELS.to_vec(),
        }
    }

    /// Resolve a user-selected model into the filename passed to the backend
    ///
    /// Roformer models are chosen by alias and must exist in the alias table.
    /// Other families take the filename as given: the catalog is advisory and
    /// the external tool decides whether it knows the model.
    pub fn resolve_model(self, model: &str) -> Result<String> {
        match self {
            BackendFamily::Roformer => ROFORMER_MODELS
                .iter()
                .find(|(alias, _)| *alias == model)
                .map(|(_, file)| file.to_string())
                .ok_or_else(|| self.invalid_model(model)),
            _ if model.trim().is_empty() => Err(self.invalid_model(model)),
            _ => Ok(model.to_string()),
        }
    }

    fn invalid_model(self, model: &str) -> StemsplitError {
        StemsplitError::InvalidModel {
            family: self.name(),
            family_slug: self.slug(),
            model: model.to_string(),
        }
    }
}

impl fmt::Display for BackendFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendFamily {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        BackendFamily::ALL
            .into_iter()
            .find(|family| family.slug() == wanted || family.name().to_lowercase() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown family '{}' (expected roformer, mdxc, mdxnet, vr-arch or demucs)",
                    s
                )
            })
    }
}
